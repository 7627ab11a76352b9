use crate::Direction::{Across, Down};
use crate::{Cell, Direction, EntryId, EntryValue, Error, SERIAL_TAG, serial_tag};
use serde::{Deserialize, Serialize};

/// One word of the puzzle: a horizontal or vertical run of at least two
/// published cells, with its id, its span and its published characters.
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(try_from = "WireEntry", into = "WireEntry")]
pub struct Entry {
  pub id: EntryId,
  pub start: Cell,
  pub end: Cell,
  pub value: EntryValue,
  pub length: usize,
  pub direction: Direction,
  pub human_index: u32,
}

impl Entry {
  /// Builds an entry from its id, span and published characters. The span
  /// must lie on one row (across) or one column (down), cover at least two
  /// cells, and match the value length.
  pub fn new(id: EntryId, start: Cell, end: Cell, value: EntryValue) -> Result<Self, Error> {
    let direction = id.direction();
    let length = match direction {
      Across => {
        if start.y != end.y || end.x < start.x {
          return Err(Error::MalformedEntry(id));
        }
        end.x - start.x + 1
      }
      Down => {
        if start.x != end.x || end.y < start.y {
          return Err(Error::MalformedEntry(id));
        }
        end.y - start.y + 1
      }
    };
    if length < 2 || value.len() != length {
      return Err(Error::MalformedEntry(id));
    }
    Ok(Self {
      id,
      start,
      end,
      value,
      length,
      direction,
      human_index: id.human_index(),
    })
  }

  /// Whether the given cell lies on this entry's span.
  pub fn contains(&self, cell: Cell) -> bool {
    match self.direction {
      Across => cell.y == self.start.y && cell.x >= self.start.x && cell.x <= self.end.x,
      Down => cell.x == self.start.x && cell.y >= self.start.y && cell.y <= self.end.y,
    }
  }

  /// The cells of this entry, first to last.
  pub fn cells(&self) -> Vec<Cell> {
    match self.direction {
      Across => (self.start.x..=self.end.x)
        .map(|x| Cell::new(x, self.start.y))
        .collect(),
      Down => (self.start.y..=self.end.y)
        .map(|y| Cell::new(self.start.x, y))
        .collect(),
    }
  }
}

#[derive(Serialize, Deserialize)]
struct WireEntry {
  #[serde(default = "serial_tag")]
  serialized: u8,
  id: EntryId,
  start: Cell,
  end: Cell,
  value: EntryValue,
  length: usize,
  direction: Direction,
  human_index: u32,
}

impl From<Entry> for WireEntry {
  fn from(entry: Entry) -> Self {
    Self {
      serialized: SERIAL_TAG,
      id: entry.id,
      start: entry.start,
      end: entry.end,
      value: entry.value,
      length: entry.length,
      direction: entry.direction,
      human_index: entry.human_index,
    }
  }
}

impl TryFrom<WireEntry> for Entry {
  type Error = Error;
  fn try_from(wire: WireEntry) -> Result<Self, Error> {
    if wire.serialized != SERIAL_TAG {
      return Err(Error::UnsupportedSerializedTag(wire.serialized));
    }
    let entry = Entry::new(wire.id, wire.start, wire.end, wire.value)?;
    if entry.length != wire.length
      || entry.direction != wire.direction
      || entry.human_index != wire.human_index
    {
      return Err(Error::MalformedEntry(wire.id));
    }
    Ok(entry)
  }
}

/// All the entries of a puzzle, across and down.
#[derive(Debug, Eq, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct EntrySet {
  pub across: Vec<Entry>,
  pub down: Vec<Entry>,
}

impl EntrySet {
  /// Iterates in canonical order: every across entry, then every down entry.
  pub fn iter(&self) -> impl Iterator<Item = &Entry> {
    self.across.iter().chain(self.down.iter())
  }

  pub fn get(&self, id: EntryId) -> Option<&Entry> {
    self.iter().find(|entry| entry.id == id)
  }

  pub fn len(&self) -> usize {
    self.across.len() + self.down.len()
  }

  pub fn is_empty(&self) -> bool {
    self.across.is_empty() && self.down.is_empty()
  }
}
