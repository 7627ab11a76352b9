use crate::{Direction, Error, SERIAL_TAG, serial_tag};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

/// A square of the grid, addressed by 0-indexed column (`x`) and row (`y`).
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(try_from = "WireCell", into = "WireCell")]
pub struct Cell {
  pub x: usize,
  pub y: usize,
}

impl Cell {
  pub fn new(x: usize, y: usize) -> Self {
    Self { x, y }
  }

  /// The canonical id of this cell, usable as a map key.
  pub fn position_id(&self) -> PositionId {
    PositionId { x: self.x, y: self.y }
  }
}

impl Display for Cell {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{},{}", self.x, self.y)
  }
}

#[derive(Serialize, Deserialize)]
struct WireCell {
  #[serde(default = "serial_tag")]
  serialized: u8,
  x: usize,
  y: usize,
}

impl From<Cell> for WireCell {
  fn from(cell: Cell) -> Self {
    Self {
      serialized: SERIAL_TAG,
      x: cell.x,
      y: cell.y,
    }
  }
}

impl TryFrom<WireCell> for Cell {
  type Error = Error;
  fn try_from(wire: WireCell) -> Result<Self, Error> {
    if wire.serialized != SERIAL_TAG {
      return Err(Error::UnsupportedSerializedTag(wire.serialized));
    }
    Ok(Self {
      x: wire.x,
      y: wire.y,
    })
  }
}

/// A cell address in its string form `"x,y"`. Serializes as that string, so
/// player values and metadata can be keyed by it in JSON maps.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PositionId {
  x: usize,
  y: usize,
}

impl PositionId {
  pub fn cell(&self) -> Cell {
    Cell {
      x: self.x,
      y: self.y,
    }
  }
}

impl From<Cell> for PositionId {
  fn from(cell: Cell) -> Self {
    cell.position_id()
  }
}

/// Ordered in reading order: top to bottom, then left to right.
impl Ord for PositionId {
  fn cmp(&self, other: &Self) -> Ordering {
    (self.y, self.x).cmp(&(other.y, other.x))
  }
}

impl PartialOrd for PositionId {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Display for PositionId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{},{}", self.x, self.y)
  }
}

impl FromStr for PositionId {
  type Err = Error;
  fn from_str(s: &str) -> Result<Self, Error> {
    let invalid = || Error::InvalidPositionId(s.to_string());
    let (x, y) = s.split_once(',').ok_or_else(invalid)?;
    Ok(Self {
      x: x.parse().map_err(|_| invalid())?,
      y: y.parse().map_err(|_| invalid())?,
    })
  }
}

impl From<PositionId> for String {
  fn from(id: PositionId) -> Self {
    id.to_string()
  }
}

impl TryFrom<String> for PositionId {
  type Error = Error;
  fn try_from(s: String) -> Result<Self, Error> {
    s.parse()
  }
}

/// An entry id in its string form `"{human_index}-{direction}"`, e.g.
/// `"4-down"`. Serializes as that string, so clues and entry metadata can be
/// keyed by it in JSON maps.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId {
  human_index: u32,
  direction: Direction,
}

impl EntryId {
  pub fn new(human_index: u32, direction: Direction) -> Result<Self, Error> {
    if human_index < 1 {
      return Err(Error::HumanIndexOutOfRange(human_index));
    }
    Ok(Self {
      human_index,
      direction,
    })
  }

  pub fn human_index(&self) -> u32 {
    self.human_index
  }

  pub fn direction(&self) -> Direction {
    self.direction
  }
}

/// Ordered the way entries are listed and cycled: all across entries before
/// all down entries, ascending human index within each direction.
impl Ord for EntryId {
  fn cmp(&self, other: &Self) -> Ordering {
    (self.direction, self.human_index).cmp(&(other.direction, other.human_index))
  }
}

impl PartialOrd for EntryId {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Display for EntryId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}-{}", self.human_index, self.direction)
  }
}

impl FromStr for EntryId {
  type Err = Error;
  fn from_str(s: &str) -> Result<Self, Error> {
    let invalid = || Error::InvalidEntryId(s.to_string());
    let (index, direction) = s.split_once('-').ok_or_else(invalid)?;
    let human_index: u32 = index.parse().map_err(|_| invalid())?;
    let direction = match direction {
      "across" => Direction::Across,
      "down" => Direction::Down,
      _ => return Err(invalid()),
    };
    Self::new(human_index, direction).map_err(|_| invalid())
  }
}

impl From<EntryId> for String {
  fn from(id: EntryId) -> Self {
    id.to_string()
  }
}

impl TryFrom<String> for EntryId {
  type Error = Error;
  fn try_from(s: String) -> Result<Self, Error> {
    s.parse()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn position_id_round_trips_through_its_string_form() {
    let id = Cell::new(3, 7).position_id();
    assert_eq!(id.to_string(), "3,7");
    assert_eq!("3,7".parse::<PositionId>().unwrap(), id);
    assert_eq!(id.cell(), Cell::new(3, 7));
  }

  #[test]
  fn position_id_rejects_malformed_strings() {
    for s in ["", "3", "3,", ",7", "3;7", "a,b", "3,7,1"] {
      assert!(s.parse::<PositionId>().is_err(), "{s:?} should not parse");
    }
  }

  #[test]
  fn position_ids_sort_in_reading_order() {
    let mut ids = vec![
      Cell::new(2, 1).position_id(),
      Cell::new(0, 2).position_id(),
      Cell::new(1, 0).position_id(),
      Cell::new(0, 1).position_id(),
    ];
    ids.sort();
    let strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    assert_eq!(strings, ["1,0", "0,1", "2,1", "0,2"]);
  }

  #[test]
  fn entry_id_round_trips_through_its_string_form() {
    let id = EntryId::new(4, Direction::Down).unwrap();
    assert_eq!(id.to_string(), "4-down");
    assert_eq!("4-down".parse::<EntryId>().unwrap(), id);
  }

  #[test]
  fn entry_id_rejects_malformed_strings() {
    for s in ["", "4", "down", "4-sideways", "0-across", "-down", "x-down"] {
      assert!(s.parse::<EntryId>().is_err(), "{s:?} should not parse");
    }
  }

  #[test]
  fn entry_ids_sort_across_before_down() {
    let mut ids = vec![
      EntryId::new(2, Direction::Down).unwrap(),
      EntryId::new(5, Direction::Across).unwrap(),
      EntryId::new(1, Direction::Down).unwrap(),
      EntryId::new(1, Direction::Across).unwrap(),
    ];
    ids.sort();
    let strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    assert_eq!(strings, ["1-across", "5-across", "1-down", "2-down"]);
  }

  #[test]
  fn cell_serializes_with_a_version_tag() {
    let json = serde_json::to_string(&Cell::new(1, 2)).unwrap();
    assert_eq!(json, r#"{"serialized":1,"x":1,"y":2}"#);
    let cell: Cell = serde_json::from_str(&json).unwrap();
    assert_eq!(cell, Cell::new(1, 2));
    assert!(serde_json::from_str::<Cell>(r#"{"serialized":9,"x":1,"y":2}"#).is_err());
  }
}
