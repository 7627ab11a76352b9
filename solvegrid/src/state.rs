use crate::Direction::Across;
use crate::{
  Cell, Dimensions, Entry, EntryClue, EntryId, EntrySet, EntryValue, PlayerActions, PositionId,
  PositionValue, PositionValueMetadata, ProgressSnapshot,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The overall activity a state machine is driving. Only solving exists
/// today; the field is kept so snapshots stay self-describing.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  #[default]
  Solve,
}

/// How typing interacts with already-filled cells.
///
/// `Overwrite` moves through every cell of the entry; `Empty` skips to empty
/// cells. Arrow movement and clicks switch to `Overwrite`, entry navigation
/// switches to `Empty`.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditingMode {
  Overwrite,
  Empty,
}

/// Which end of an entry to prefer when focusing it without an empty cell
/// to land on.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precedence {
  Start,
  End,
}

/// Everything the engine needs to (re)build a puzzle's state: the published
/// side plus the player's merged progress.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InitPayload {
  pub uuid: String,
  pub strict_mode: bool,
  pub dimensions: Dimensions,
  pub has_revealed_any: bool,
  pub has_revealed_all: bool,
  pub progress: ProgressSnapshot,
  pub values: BTreeMap<PositionId, PositionValue>,
  pub entries: EntrySet,
  pub clues: BTreeMap<EntryId, EntryClue>,
}

/// Every transition the engine understands. One event, one state change.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
  /// Replaces the state wholesale with a freshly built one.
  Initialize(InitPayload),
  /// Refreshes the published side and progress while keeping focus and
  /// derived metadata.
  ReInitialize(InitPayload),
  Left {
    is_user_action: bool,
    allow_same_line_jump: bool,
  },
  Right {
    is_user_action: bool,
    allow_same_line_jump: bool,
  },
  Up {
    is_user_action: bool,
    allow_same_line_jump: bool,
  },
  Down {
    is_user_action: bool,
    allow_same_line_jump: bool,
  },
  CellClick {
    cell: Cell,
  },
  Character {
    value: PositionValue,
  },
  Delete,
  EntryNext {
    incomplete_entries_only: bool,
  },
  EntryPrevious {
    incomplete_entries_only: bool,
    precedence: Precedence,
  },
  EntryFocus {
    entry_id: EntryId,
  },
  IntersectionEntrySwitch,
  ValidateEntryNoStreak,
  ValidateAllNoStreak,
  RevealEntryNoStreak,
  RevealAllNoStreak,
  ClearEntry,
  ClearAll,
}

/// What one cell should look like, recomputed after every transition.
/// The six `show_*` flags are monotonic: once a check or reveal has shown
/// something, later transitions never hide it.
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct ValueMetadata {
  pub cell: Cell,
  pub cell_focus: bool,
  pub cell_error: bool,
  pub entry_focus: bool,
  pub entry_across_error: bool,
  pub entry_down_error: bool,
  pub human_index: Option<u32>,
  pub value_published: PositionValue,
  pub value_player: PositionValue,
  pub show_cell_value: bool,
  pub show_cell_success: bool,
  pub show_cell_error: bool,
  pub show_cell_value_because_entry: bool,
  pub show_cell_success_because_entry: bool,
  pub show_cell_error_because_entry: bool,
}

impl ValueMetadata {
  /// Whether the cell's solution is on display, directly or through its
  /// entry. Revealed cells are skipped by focus movement and never cleared.
  pub fn is_revealed(&self) -> bool {
    self.show_cell_value || self.show_cell_value_because_entry
  }
}

/// What one entry looks like as a whole, recomputed after every transition.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
  pub entry: Entry,
  pub entry_focus: bool,
  pub entry_error: bool,
  pub all_cells_have_player_values: bool,
  pub is_complete: bool,
  pub clue: EntryClue,
  pub value: EntryValue,
}

/// The complete solving state of one puzzle: the published side, the
/// player's progress, the focus, and every derived view of them.
///
/// The `previous_*`/`next_*`/`*_in_same_line` fields are cached navigation
/// targets for the focused cell and entry; movement events consult them
/// instead of re-deriving neighbours.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SolverState {
  pub initialized: bool,
  pub uuid: String,
  pub mode: Mode,
  pub editing_mode: EditingMode,
  pub is_complete: bool,
  pub is_at_intersection: bool,
  pub strict_mode: bool,
  pub dimensions: Dimensions,
  pub has_revealed_any: bool,
  pub has_revealed_all: bool,

  pub player_values: BTreeMap<PositionId, PositionValue>,
  pub player_values_metadata: BTreeMap<PositionId, PositionValueMetadata>,
  pub player_actions: PlayerActions,

  pub values: BTreeMap<PositionId, PositionValue>,
  pub values_metadata: BTreeMap<PositionId, ValueMetadata>,
  pub entries: EntrySet,
  pub entries_metadata: BTreeMap<EntryId, EntryMetadata>,
  pub clues: BTreeMap<EntryId, EntryClue>,

  pub focused_cell: Cell,
  pub focused_entry: Entry,
  pub previous_cell_in_entry: Option<Cell>,
  pub next_cell_in_entry: Option<Cell>,
  pub previous_empty_cell_in_entry: Option<Cell>,
  pub next_empty_cell_in_entry: Option<Cell>,
  pub north_cell_in_same_line: Option<Cell>,
  pub south_cell_in_same_line: Option<Cell>,
  pub east_cell_in_same_line: Option<Cell>,
  pub west_cell_in_same_line: Option<Cell>,
  pub previous_entry: Entry,
  pub next_entry: Entry,
  pub previous_incomplete_entry: Option<Entry>,
  pub next_incomplete_entry: Option<Entry>,
}

impl SolverState {
  /// The state a puzzle is in before its first `Initialize`: a 1x1 nothing
  /// with a dummy focused entry. Dispatching anything but an initialization
  /// against it fails, which the registry logs and swallows.
  pub fn placeholder() -> Self {
    let entry = placeholder_entry();
    Self {
      initialized: false,
      uuid: String::new(),
      mode: Mode::Solve,
      editing_mode: EditingMode::Overwrite,
      is_complete: false,
      is_at_intersection: false,
      strict_mode: true,
      dimensions: Dimensions {
        width: 1,
        height: 1,
      },
      has_revealed_any: false,
      has_revealed_all: false,
      player_values: BTreeMap::new(),
      player_values_metadata: BTreeMap::new(),
      player_actions: PlayerActions::default(),
      values: BTreeMap::new(),
      values_metadata: BTreeMap::new(),
      entries: EntrySet::default(),
      entries_metadata: BTreeMap::new(),
      clues: BTreeMap::new(),
      focused_cell: Cell::new(0, 0),
      focused_entry: entry.clone(),
      previous_cell_in_entry: None,
      next_cell_in_entry: None,
      previous_empty_cell_in_entry: None,
      next_empty_cell_in_entry: None,
      north_cell_in_same_line: None,
      south_cell_in_same_line: None,
      east_cell_in_same_line: None,
      west_cell_in_same_line: None,
      previous_entry: entry.clone(),
      next_entry: entry,
      previous_incomplete_entry: None,
      next_incomplete_entry: None,
    }
  }

  /// The slice of this state that persists and syncs across devices.
  pub fn progress_snapshot(&self) -> ProgressSnapshot {
    ProgressSnapshot {
      player_values: self.player_values.clone(),
      player_values_metadata: self.player_values_metadata.clone(),
      player_actions: self.player_actions.clone(),
    }
  }
}

/// A syntactically valid entry that belongs to no puzzle. Field literal
/// construction, since `Entry::new` has no reason to allow ids that match
/// nothing.
fn placeholder_entry() -> Entry {
  Entry {
    id: EntryId::new(1, Across).unwrap(),
    start: Cell::new(0, 0),
    end: Cell::new(1, 0),
    value: EntryValue::new(vec![PositionValue::empty(), PositionValue::empty()]),
    length: 2,
    direction: Across,
    human_index: 1,
  }
}
