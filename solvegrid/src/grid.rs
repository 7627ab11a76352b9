use crate::Direction::{Across, Down};
use crate::{Cell, Direction, Entry, EntryId, EntrySet, EntryValue, Error, PositionId, PositionValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The width and height of a grid, in cells.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct Dimensions {
  pub width: usize,
  pub height: usize,
}

/// The published side of a puzzle: its dimensions and the solution character
/// of every non-black cell. Cells absent from `values` are black.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct GridModel {
  pub dimensions: Dimensions,
  pub values: BTreeMap<PositionId, PositionValue>,
}

impl GridModel {
  pub fn new(dimensions: Dimensions, values: BTreeMap<PositionId, PositionValue>) -> Self {
    Self { dimensions, values }
  }

  /// Fails with the offending coordinate if the cell is outside the grid.
  pub fn check_bounds(&self, cell: Cell) -> Result<(), Error> {
    if cell.x >= self.dimensions.width {
      return Err(Error::XOutOfBounds {
        x: cell.x,
        width: self.dimensions.width,
      });
    }
    if cell.y >= self.dimensions.height {
      return Err(Error::YOutOfBounds {
        y: cell.y,
        height: self.dimensions.height,
      });
    }
    Ok(())
  }

  /// The published character at the given cell, if any.
  pub fn published_value(&self, cell: Cell) -> Option<&PositionValue> {
    self
      .values
      .get(&cell.position_id())
      .filter(|value| !value.is_empty())
  }

  pub fn has_published_value(&self, cell: Cell) -> bool {
    self.published_value(cell).is_some()
  }

  /// Derives every entry of the grid: each maximal horizontal and vertical
  /// run of published cells longer than one, numbered in reading order of
  /// their start cells. A start cell shared by an across and a down run
  /// yields one number for both.
  pub fn derive_entries(&self) -> Result<EntrySet, Error> {
    let across_runs = self.runs(Across);
    let down_runs = self.runs(Down);

    let mut starts = BTreeSet::new();
    for (start, _) in across_runs.iter().chain(down_runs.iter()) {
      starts.insert(start.position_id());
    }
    let human_indexes: BTreeMap<PositionId, u32> =
      starts.into_iter().zip(1u32..).collect();

    let mut entries = EntrySet::default();
    for (runs, direction) in [(across_runs, Across), (down_runs, Down)] {
      for (start, end) in runs {
        let index = human_indexes[&start.position_id()];
        let id = EntryId::new(index, direction)?;
        let value = self.run_value(start, end, direction)?;
        let list = match direction {
          Across => &mut entries.across,
          Down => &mut entries.down,
        };
        list.push(Entry::new(id, start, end, value)?);
      }
    }
    Ok(entries)
  }

  /// Every maximal run of published cells in the given direction, as
  /// (start, end) pairs, runs of length one excluded.
  fn runs(&self, direction: Direction) -> Vec<(Cell, Cell)> {
    let Dimensions { width, height } = self.dimensions;
    let (lines, line_length) = match direction {
      Across => (height, width),
      Down => (width, height),
    };

    let cell_at = |line: usize, offset: usize| match direction {
      Across => Cell::new(offset, line),
      Down => Cell::new(line, offset),
    };

    let mut runs = Vec::new();
    for line in 0..lines {
      let mut offset = 0;
      while offset < line_length {
        if !self.has_published_value(cell_at(line, offset)) {
          offset += 1;
          continue;
        }
        let start = offset;
        while offset + 1 < line_length && self.has_published_value(cell_at(line, offset + 1)) {
          offset += 1;
        }
        if offset > start {
          runs.push((cell_at(line, start), cell_at(line, offset)));
        }
        offset += 1;
      }
    }
    runs
  }

  fn run_value(&self, start: Cell, end: Cell, direction: Direction) -> Result<EntryValue, Error> {
    let cells: Vec<Cell> = match direction {
      Across => (start.x..=end.x).map(|x| Cell::new(x, start.y)).collect(),
      Down => (start.y..=end.y).map(|y| Cell::new(start.x, y)).collect(),
    };
    let mut values = Vec::with_capacity(cells.len());
    for cell in cells {
      let value = self
        .published_value(cell)
        .ok_or(Error::MissingPublishedValue(cell.position_id()))?;
      values.push(value.clone());
    }
    Ok(EntryValue::new(values))
  }
}
