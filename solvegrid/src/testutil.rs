//! Fixtures shared by the unit tests.

use crate::{
  Cell, Dimensions, Event, GridModel, InitPayload, PositionValue, ProgressSnapshot, SolverState,
  reduce,
};
use std::collections::BTreeMap;

/// Builds a grid from rows of characters, `.` marking a black cell.
pub(crate) fn grid(rows: &[&str]) -> GridModel {
  let height = rows.len();
  let width = rows.first().map_or(0, |row| row.chars().count());
  let mut values = BTreeMap::new();
  for (y, row) in rows.iter().enumerate() {
    for (x, c) in row.chars().enumerate() {
      if c != '.' {
        values.insert(Cell::new(x, y).position_id(), PositionValue::from_char(c));
      }
    }
  }
  GridModel::new(Dimensions { width, height }, values)
}

/// A freshly initialized, non-strict solving state for the given rows.
pub(crate) fn solver(rows: &[&str]) -> SolverState {
  let model = grid(rows);
  let entries = model.derive_entries().unwrap();
  let payload = InitPayload {
    uuid: "test".to_string(),
    strict_mode: false,
    dimensions: model.dimensions,
    has_revealed_any: false,
    has_revealed_all: false,
    progress: ProgressSnapshot::default(),
    values: model.values,
    entries,
    clues: BTreeMap::new(),
  };
  reduce(&SolverState::placeholder(), &Event::Initialize(payload)).unwrap()
}
