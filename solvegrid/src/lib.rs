//! This crate is the solving side of a crossword app: it tracks what a player
//! has filled in, where their focus is, and what each square should look like.
//! It provides no UI itself, but see `solvetui` for an example of how you can
//! use it to produce a crossword app.
//!
//! The heart of the crate is [reduce]: a pure transition function that takes
//! the previous [SolverState] and an [Event] and returns the next state,
//! including a full recompute of the derived per-cell and per-entry metadata.
//! [Registry] wraps it for multi-puzzle hosts, with progress merged across
//! devices by [merge_progress] and written out through a [ThrottledWriter].

use Direction::{Across, Down};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::Not;
use thiserror::Error as ThisError;

mod cell;
mod engine;
mod entry;
mod grid;
mod merge;
mod persist;
mod registry;
pub mod selectors;
mod state;
#[cfg(test)]
pub(crate) mod testutil;
mod value;

pub use cell::{Cell, EntryId, PositionId};
pub use engine::reduce;
pub use entry::{Entry, EntrySet};
pub use grid::{Dimensions, GridModel};
pub use merge::{PlayerActions, ProgressSnapshot, merge_progress};
pub use persist::{MemoryStore, ProgressStore, ThrottledWriter, WRITE_WINDOW};
pub use registry::{EventEnvelope, InitArgs, Registry};
pub use state::{
  EditingMode, EntryMetadata, Event, InitPayload, Mode, Precedence, SolverState, ValueMetadata,
};
pub use value::{EntryClue, EntryValue, PositionValue, PositionValueMetadata, now_ms};

/// The version tag carried by every serialized record this crate exchanges.
pub(crate) const SERIAL_TAG: u8 = 1;

pub(crate) fn serial_tag() -> u8 {
  SERIAL_TAG
}

/// The two crossword directions: `Across` and `Down`
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Across,
  Down,
}

impl Not for Direction {
  type Output = Self;
  fn not(self) -> Self {
    match self {
      Across => Down,
      Down => Across,
    }
  }
}

impl Display for Direction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Across => write!(f, "across"),
      Down => write!(f, "down"),
    }
  }
}

/// The errors that may be produced by functions in this crate.
#[derive(Debug, ThisError)]
pub enum Error {
  /// An x coordinate outside the grid width.
  #[error("x {x} is out of bounds for width {width}")]
  XOutOfBounds { x: usize, width: usize },
  /// A y coordinate outside the grid height.
  #[error("y {y} is out of bounds for height {height}")]
  YOutOfBounds { y: usize, height: usize },
  /// A position value longer than a single character.
  #[error("{0:?} is not a single character or empty")]
  ValueTooLong(String),
  /// A value metadata record without a positive timestamp.
  #[error("value metadata requires a positive timestamp")]
  MissingTimestamp,
  /// A string that does not parse as `"x,y"`.
  #[error("{0:?} is not a valid position id")]
  InvalidPositionId(String),
  /// A string that does not parse as `"{{index}}-{{direction}}"`.
  #[error("{0:?} is not a valid entry id")]
  InvalidEntryId(String),
  /// A human index below 1.
  #[error("human index {0} is out of range, indices start at 1")]
  HumanIndexOutOfRange(u32),
  /// An entry whose geometry, length and value disagree.
  #[error("entry {0} has inconsistent geometry")]
  MalformedEntry(EntryId),
  /// An entry id that is not part of the puzzle.
  #[error("could not find entry {0}")]
  UnknownEntry(EntryId),
  /// A cell that is not covered by the given entry.
  #[error("cell {cell} is not in entry {entry}")]
  CellNotInEntry { cell: PositionId, entry: EntryId },
  /// A cell that should carry a published value but does not.
  #[error("no published value at {0}")]
  MissingPublishedValue(PositionId),
  /// A cell that should carry value metadata but does not.
  #[error("no value metadata at {0}")]
  MissingValueMetadata(PositionId),
  /// A cell that no entry covers.
  #[error("no entry covers cell {0}")]
  NoEntryAtCell(PositionId),
  /// A puzzle whose grid contains no entry at all.
  #[error("the puzzle has no entries")]
  NoEntries,
  /// A serialized record with a version tag this crate does not understand.
  #[error("unsupported serialized tag {0}")]
  UnsupportedSerializedTag(u8),
}
