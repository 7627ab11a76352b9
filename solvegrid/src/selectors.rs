//! Read-only queries over a [SolverState]. Nothing here mutates; the engine
//! and UIs both lean on these to answer "what is where" questions.
//!
//! Lookups that feed focus movement skip revealed cells (a revealed cell is
//! never a useful landing spot); the plain previous/next cell walks do not.

use crate::Direction::{Across, Down};
use crate::{Cell, Direction, Entry, EntryClue, EntryId, EntryValue, Error, PositionValue, SolverState};

/// Fails with the offending coordinate if the cell is outside the grid.
pub fn check_bounds(state: &SolverState, cell: Cell) -> Result<(), Error> {
  if cell.x >= state.dimensions.width {
    return Err(Error::XOutOfBounds {
      x: cell.x,
      width: state.dimensions.width,
    });
  }
  if cell.y >= state.dimensions.height {
    return Err(Error::YOutOfBounds {
      y: cell.y,
      height: state.dimensions.height,
    });
  }
  Ok(())
}

/// The published character at the given cell, if the cell is part of the
/// puzzle.
pub fn published_value(state: &SolverState, cell: Cell) -> Option<&PositionValue> {
  state
    .values
    .get(&cell.position_id())
    .filter(|value| !value.is_empty())
}

pub fn cell_has_published_value(state: &SolverState, cell: Cell) -> bool {
  published_value(state, cell).is_some()
}

/// What the player has written at the given cell; empty if nothing.
pub fn player_value(state: &SolverState, cell: Cell) -> PositionValue {
  state
    .player_values
    .get(&cell.position_id())
    .cloned()
    .unwrap_or_default()
}

pub fn cell_has_player_value(state: &SolverState, cell: Cell) -> bool {
  !player_value(state, cell).is_empty()
}

/// Whether the cell's solution is on display, directly or via its entry.
pub fn cell_is_revealed(state: &SolverState, cell: Cell) -> bool {
  state
    .values_metadata
    .get(&cell.position_id())
    .is_some_and(|metadata| metadata.is_revealed())
}

/// The number printed in the given cell, shared by every entry starting
/// there. `None` for cells that start no entry.
pub fn cell_human_index(state: &SolverState, cell: Cell) -> Option<u32> {
  state
    .entries
    .iter()
    .find(|entry| entry.start == cell)
    .map(|entry| entry.human_index)
}

/// The entries covering the given cell, across before down. At most one per
/// direction.
pub fn cell_entries<'a>(state: &'a SolverState, cell: Cell) -> Vec<&'a Entry> {
  state
    .entries
    .iter()
    .filter(|entry| entry.contains(cell))
    .collect()
}

pub fn entry(state: &SolverState, id: EntryId) -> Result<&Entry, Error> {
  state.entries.get(id).ok_or(Error::UnknownEntry(id))
}

/// The clue for the given entry; empty if the puzzle has none.
pub fn entry_clue(state: &SolverState, id: EntryId) -> EntryClue {
  state.clues.get(&id).cloned().unwrap_or_default()
}

/// The published characters of the given entry.
pub fn entry_value(state: &SolverState, id: EntryId) -> Result<EntryValue, Error> {
  Ok(entry(state, id)?.value.clone())
}

/// Whether the player has solved the given entry: every cell matches its
/// published character exactly.
pub fn entry_is_complete(state: &SolverState, entry: &Entry) -> bool {
  entry
    .cells()
    .iter()
    .zip(entry.value.values())
    .all(|(&cell, published)| player_value(state, cell) == *published)
}

/// Whether the player has solved the whole puzzle: every published cell
/// matches, whether or not an entry covers it.
pub fn crossword_is_complete(state: &SolverState) -> bool {
  state
    .values
    .iter()
    .all(|(id, published)| player_value(state, id.cell()) == *published)
}

/// Whether every cell of the entry holds some player value, right or wrong.
pub fn all_cells_have_player_values(state: &SolverState, entry: &Entry) -> bool {
  entry
    .cells()
    .iter()
    .all(|&cell| cell_has_player_value(state, cell))
}

/// The cell before the given one within the entry; `None` at the start.
/// Fails if the cell is not covered by the entry.
pub fn entry_previous_cell(entry: &Entry, cell: Cell) -> Result<Option<Cell>, Error> {
  let index = entry_cell_index(entry, cell)?;
  Ok(index.checked_sub(1).map(|i| entry.cells()[i]))
}

/// The cell after the given one within the entry; `None` at the end.
/// Fails if the cell is not covered by the entry.
pub fn entry_next_cell(entry: &Entry, cell: Cell) -> Result<Option<Cell>, Error> {
  let cells = entry.cells();
  let index = entry_cell_index(entry, cell)?;
  Ok(cells.get(index + 1).copied())
}

fn entry_cell_index(entry: &Entry, cell: Cell) -> Result<usize, Error> {
  entry
    .cells()
    .iter()
    .position(|&c| c == cell)
    .ok_or(Error::CellNotInEntry {
      cell: cell.position_id(),
      entry: entry.id,
    })
}

/// Every entry in navigation order: across entries by index, then down
/// entries by index.
pub fn sorted_entries(state: &SolverState) -> Vec<&Entry> {
  let mut entries: Vec<&Entry> = state.entries.iter().collect();
  entries.sort_by_key(|entry| entry.id);
  entries
}

/// The entry before the given one in navigation order, wrapping from the
/// first to the last.
pub fn previous_entry(state: &SolverState, entry: &Entry) -> Result<Entry, Error> {
  let entries = sorted_entries(state);
  let index = entry_list_index(&entries, entry)?;
  let previous = if index == 0 { entries.len() - 1 } else { index - 1 };
  Ok(entries[previous].clone())
}

/// The entry after the given one in navigation order, wrapping from the
/// last to the first.
pub fn next_entry(state: &SolverState, entry: &Entry) -> Result<Entry, Error> {
  let entries = sorted_entries(state);
  let index = entry_list_index(&entries, entry)?;
  Ok(entries[(index + 1) % entries.len()].clone())
}

/// The closest entry before the given one that still has an unfilled cell,
/// wrapping around. `None` when no other entry qualifies.
pub fn previous_incomplete_entry(
  state: &SolverState,
  entry: &Entry,
) -> Result<Option<Entry>, Error> {
  let entries = incomplete_entries_and_self(state, entry);
  if entries.len() == 1 {
    return Ok(None);
  }
  let index = entry_list_index(&entries, entry)?;
  let previous = if index == 0 { entries.len() - 1 } else { index - 1 };
  Ok(Some(entries[previous].clone()))
}

/// The closest entry after the given one that still has an unfilled cell,
/// wrapping around. `None` when no other entry qualifies.
pub fn next_incomplete_entry(state: &SolverState, entry: &Entry) -> Result<Option<Entry>, Error> {
  let entries = incomplete_entries_and_self(state, entry);
  if entries.len() == 1 {
    return Ok(None);
  }
  let index = entry_list_index(&entries, entry)?;
  Ok(Some(entries[(index + 1) % entries.len()].clone()))
}

/// Entries with an unfilled cell, plus the given entry itself so it can
/// anchor the search.
fn incomplete_entries_and_self<'a>(state: &'a SolverState, entry: &Entry) -> Vec<&'a Entry> {
  sorted_entries(state)
    .into_iter()
    .filter(|e| e.id == entry.id || !all_cells_have_player_values(state, e))
    .collect()
}

fn entry_list_index(entries: &[&Entry], entry: &Entry) -> Result<usize, Error> {
  entries
    .iter()
    .position(|e| e.id == entry.id)
    .ok_or(Error::UnknownEntry(entry.id))
}

/// The first cell of the entry with no player value, skipping revealed
/// cells. `None` when the entry is fully filled.
pub fn entry_first_cell_without_player_values(state: &SolverState, entry: &Entry) -> Option<Cell> {
  entry
    .cells()
    .into_iter()
    .find(|&cell| !cell_has_player_value(state, cell) && !cell_is_revealed(state, cell))
}

/// The last cell of the entry holding a player value, skipping revealed
/// cells. `None` when the entry is empty.
pub fn entry_last_cell_with_player_values(state: &SolverState, entry: &Entry) -> Option<Cell> {
  entry
    .cells()
    .into_iter()
    .rev()
    .find(|&cell| cell_has_player_value(state, cell) && !cell_is_revealed(state, cell))
}

/// The closest unfilled cell before the given one within the entry.
pub fn entry_previous_cell_without_player_values(
  state: &SolverState,
  entry: &Entry,
  cell: Cell,
) -> Result<Option<Cell>, Error> {
  let cells = entry.cells();
  let index = entry_cell_index(entry, cell)?;
  Ok(
    cells[..index]
      .iter()
      .rev()
      .find(|&&c| !cell_has_player_value(state, c))
      .copied(),
  )
}

/// The closest unfilled cell after the given one within the entry.
pub fn entry_next_cell_without_player_values(
  state: &SolverState,
  entry: &Entry,
  cell: Cell,
) -> Result<Option<Cell>, Error> {
  let cells = entry.cells();
  let index = entry_cell_index(entry, cell)?;
  Ok(
    cells[index + 1..]
      .iter()
      .find(|&&c| !cell_has_player_value(state, c))
      .copied(),
  )
}

/// The closest published, unrevealed cell before the given one on its row
/// (`Across`) or column (`Down`), regardless of entries.
pub fn previous_cell_in_same_line(
  state: &SolverState,
  cell: Cell,
  direction: Direction,
) -> Option<Cell> {
  line_cells(state, cell, direction)
    .into_iter()
    .take_while(|&c| c != cell)
    .filter(|&c| cell_has_published_value(state, c) && !cell_is_revealed(state, c))
    .last()
}

/// The closest published, unrevealed cell after the given one on its row
/// (`Across`) or column (`Down`), regardless of entries.
pub fn next_cell_in_same_line(
  state: &SolverState,
  cell: Cell,
  direction: Direction,
) -> Option<Cell> {
  line_cells(state, cell, direction)
    .into_iter()
    .skip_while(|&c| c != cell)
    .skip(1)
    .find(|&c| cell_has_published_value(state, c) && !cell_is_revealed(state, c))
}

fn line_cells(state: &SolverState, cell: Cell, direction: Direction) -> Vec<Cell> {
  match direction {
    Across => (0..state.dimensions.width)
      .map(|x| Cell::new(x, cell.y))
      .collect(),
    Down => (0..state.dimensions.height)
      .map(|y| Cell::new(cell.x, y))
      .collect(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::solver;
  use crate::PositionValue;

  // 1-across CAT, 2-down TAR, 3-across TAR, 1-down CAT; (1,1) is black.
  fn state() -> SolverState {
    solver(&["CAT", "A.A", "TAR"])
  }

  fn write(state: &mut SolverState, x: usize, y: usize, value: &str) {
    state
      .player_values
      .insert(Cell::new(x, y).position_id(), PositionValue::new(value).unwrap());
  }

  #[test]
  fn value_lookups_default_to_empty() {
    let mut state = state();
    assert_eq!(published_value(&state, Cell::new(0, 0)).unwrap().as_str(), "C");
    assert!(published_value(&state, Cell::new(1, 1)).is_none());
    assert!(player_value(&state, Cell::new(0, 0)).is_empty());

    write(&mut state, 0, 0, "X");
    assert_eq!(player_value(&state, Cell::new(0, 0)).as_str(), "X");
    assert!(cell_has_player_value(&state, Cell::new(0, 0)));
    assert!(!cell_has_player_value(&state, Cell::new(1, 0)));
  }

  #[test]
  fn human_indexes_sit_on_entry_starts() {
    let state = state();
    assert_eq!(cell_human_index(&state, Cell::new(0, 0)), Some(1));
    assert_eq!(cell_human_index(&state, Cell::new(2, 0)), Some(2));
    assert_eq!(cell_human_index(&state, Cell::new(0, 2)), Some(3));
    assert_eq!(cell_human_index(&state, Cell::new(1, 0)), None);
  }

  #[test]
  fn cell_entries_lists_across_before_down() {
    let state = state();
    let ids: Vec<String> = cell_entries(&state, Cell::new(0, 0))
      .iter()
      .map(|entry| entry.id.to_string())
      .collect();
    assert_eq!(ids, ["1-across", "1-down"]);
    assert_eq!(cell_entries(&state, Cell::new(1, 0)).len(), 1);
    assert!(cell_entries(&state, Cell::new(1, 1)).is_empty());
  }

  #[test]
  fn unknown_entries_are_an_error() {
    let state = state();
    assert!(entry(&state, "1-across".parse().unwrap()).is_ok());
    assert!(matches!(
      entry(&state, "9-down".parse().unwrap()),
      Err(Error::UnknownEntry(_))
    ));
  }

  #[test]
  fn cells_walk_within_their_entry_only() {
    let state = state();
    let across = entry(&state, "1-across".parse().unwrap()).unwrap();
    assert_eq!(
      entry_next_cell(across, Cell::new(0, 0)).unwrap(),
      Some(Cell::new(1, 0))
    );
    assert_eq!(entry_next_cell(across, Cell::new(2, 0)).unwrap(), None);
    assert_eq!(entry_previous_cell(across, Cell::new(0, 0)).unwrap(), None);
    assert!(matches!(
      entry_next_cell(across, Cell::new(0, 2)),
      Err(Error::CellNotInEntry { .. })
    ));
  }

  #[test]
  fn entry_navigation_wraps_in_canonical_order() {
    let state = state();
    let ids: Vec<String> = sorted_entries(&state)
      .iter()
      .map(|entry| entry.id.to_string())
      .collect();
    assert_eq!(ids, ["1-across", "3-across", "1-down", "2-down"]);

    let first = entry(&state, "1-across".parse().unwrap()).unwrap().clone();
    let last = entry(&state, "2-down".parse().unwrap()).unwrap().clone();
    assert_eq!(next_entry(&state, &last).unwrap().id, first.id);
    assert_eq!(previous_entry(&state, &first).unwrap().id, last.id);
  }

  #[test]
  fn incomplete_entry_navigation_skips_filled_entries() {
    let mut state = state();
    // fill 3-across completely (wrong letters still count as filled)
    write(&mut state, 0, 2, "X");
    write(&mut state, 1, 2, "X");
    write(&mut state, 2, 2, "X");

    let first = entry(&state, "1-across".parse().unwrap()).unwrap().clone();
    let next = next_incomplete_entry(&state, &first).unwrap().unwrap();
    assert_eq!(next.id.to_string(), "1-down");
  }

  #[test]
  fn the_only_incomplete_entry_has_no_neighbour() {
    let mut state = solver(&["CAT"]);
    write(&mut state, 0, 0, "C");
    let entry = entry(&state, "1-across".parse().unwrap()).unwrap().clone();
    assert_eq!(next_incomplete_entry(&state, &entry).unwrap(), None);
    assert_eq!(previous_incomplete_entry(&state, &entry).unwrap(), None);
  }

  #[test]
  fn completion_requires_exact_matches() {
    let mut state = solver(&["CAT"]);
    let entry = state.entries.across[0].clone();
    assert!(!entry_is_complete(&state, &entry));

    write(&mut state, 0, 0, "C");
    write(&mut state, 1, 0, "A");
    write(&mut state, 2, 0, "X");
    assert!(!entry_is_complete(&state, &entry));
    assert!(all_cells_have_player_values(&state, &entry));

    write(&mut state, 2, 0, "T");
    assert!(entry_is_complete(&state, &entry));
    assert!(crossword_is_complete(&state));
  }

  #[test]
  fn completion_counts_published_cells_outside_any_entry() {
    // (2,2) is published but isolated, so no entry covers it
    let mut state = solver(&["CAT", "...", "..X"]);
    write(&mut state, 0, 0, "C");
    write(&mut state, 1, 0, "A");
    write(&mut state, 2, 0, "T");
    assert!(entry_is_complete(&state, &state.entries.across[0]));
    assert!(!crossword_is_complete(&state));

    write(&mut state, 2, 2, "X");
    assert!(crossword_is_complete(&state));
  }

  #[test]
  fn empty_cell_lookups_skip_revealed_cells() {
    let mut state = state();
    let across = state.entries.across[0].clone();
    write(&mut state, 0, 0, "C");

    assert_eq!(
      entry_first_cell_without_player_values(&state, &across),
      Some(Cell::new(1, 0))
    );
    assert_eq!(
      entry_last_cell_with_player_values(&state, &across),
      Some(Cell::new(0, 0))
    );

    // reveal (1,0): it stops being a landing spot
    if let Some(metadata) = state.values_metadata.get_mut(&Cell::new(1, 0).position_id()) {
      metadata.show_cell_value = true;
    }
    assert_eq!(
      entry_first_cell_without_player_values(&state, &across),
      Some(Cell::new(2, 0))
    );

    // the plain unfilled-cell walk does not skip revealed cells
    assert_eq!(
      entry_next_cell_without_player_values(&state, &across, Cell::new(0, 0)).unwrap(),
      Some(Cell::new(1, 0))
    );
  }

  #[test]
  fn same_line_lookups_jump_over_black_cells() {
    let state = state();
    // row 1 is A.A: the next published cell east of (0,1) is (2,1)
    assert_eq!(
      next_cell_in_same_line(&state, Cell::new(0, 1), Across),
      Some(Cell::new(2, 1))
    );
    assert_eq!(
      previous_cell_in_same_line(&state, Cell::new(2, 1), Across),
      Some(Cell::new(0, 1))
    );
    assert_eq!(previous_cell_in_same_line(&state, Cell::new(0, 1), Across), None);
    assert_eq!(
      previous_cell_in_same_line(&state, Cell::new(0, 1), Down),
      Some(Cell::new(0, 0))
    );
    assert_eq!(
      next_cell_in_same_line(&state, Cell::new(0, 1), Down),
      Some(Cell::new(0, 2))
    );
  }

  #[test]
  fn out_of_bounds_coordinates_are_named() {
    let state = solver(&["CAT"]);
    assert!(check_bounds(&state, Cell::new(2, 0)).is_ok());
    assert!(matches!(
      check_bounds(&state, Cell::new(3, 0)),
      Err(Error::XOutOfBounds { x: 3, width: 3 })
    ));
    assert!(matches!(
      check_bounds(&state, Cell::new(0, 1)),
      Err(Error::YOutOfBounds { y: 1, height: 1 })
    ));
  }
}
