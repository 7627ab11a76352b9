//! End-to-end solving scenarios through the public API: initialization from
//! raw published values, typing flows, reveals, merging progress from a
//! second device, and persistence through the registry.

use solvegrid::{
  Cell, Dimensions, EntryId, Event, EventEnvelope, InitArgs, MemoryStore, PositionId,
  PositionValue, PositionValueMetadata, ProgressSnapshot, ProgressStore, Registry, SolverState,
  now_ms,
};
use std::collections::BTreeMap;

fn values(rows: &[&str]) -> BTreeMap<PositionId, PositionValue> {
  let mut values = BTreeMap::new();
  for (y, row) in rows.iter().enumerate() {
    for (x, c) in row.chars().enumerate() {
      if c != '.' {
        values.insert(
          Cell::new(x, y).position_id(),
          PositionValue::from_char(c),
        );
      }
    }
  }
  values
}

fn init_args(uuid: &str, rows: &[&str]) -> InitArgs {
  InitArgs {
    uuid: uuid.to_string(),
    re_initialize: false,
    strict_mode: false,
    dimensions: Dimensions {
      width: rows.first().map_or(0, |row| row.chars().count()),
      height: rows.len(),
    },
    has_revealed_any: false,
    has_revealed_all: false,
    values: values(rows),
    entries: None,
    clues: BTreeMap::new(),
    server_progress: None,
  }
}

fn open(rows: &[&str]) -> Registry<MemoryStore> {
  let mut registry = Registry::new(MemoryStore::new());
  registry.initialize(init_args("puzzle", rows)).unwrap();
  registry
}

fn send(registry: &mut Registry<MemoryStore>, event: Event) {
  registry.dispatch(&EventEnvelope {
    uuid: "puzzle".to_string(),
    event,
  });
}

fn state<'a>(registry: &'a Registry<MemoryStore>) -> &'a SolverState {
  registry.get("puzzle").unwrap()
}

fn type_word(registry: &mut Registry<MemoryStore>, word: &str) {
  for c in word.chars() {
    send(
      registry,
      Event::Character {
        value: PositionValue::from_char(c),
      },
    );
  }
}

fn player(state: &SolverState, x: usize, y: usize) -> String {
  state
    .player_values
    .get(&Cell::new(x, y).position_id())
    .map(|value| value.as_str().to_string())
    .unwrap_or_default()
}

#[test]
fn a_single_row_puzzle_derives_one_entry_and_solves() {
  let mut registry = open(&["CAT"]);
  {
    let state = state(&registry);
    assert_eq!(state.entries.across.len(), 1);
    assert_eq!(state.entries.down.len(), 0);
    assert_eq!(state.focused_entry.id.to_string(), "1-across");
    assert_eq!(state.focused_entry.length, 3);
  }

  type_word(&mut registry, "cat");
  let state = state(&registry);
  assert!(state.is_complete);
  assert_eq!(player(state, 0, 0), "C");
  assert_eq!(player(state, 2, 0), "T");
}

#[test]
fn typing_a_wrong_letter_marks_the_cell_but_not_strictly_hidden_state() {
  let mut registry = open(&["CAT"]);
  type_word(&mut registry, "x");

  let state = state(&registry);
  let metadata = &state.values_metadata[&Cell::new(0, 0).position_id()];
  assert!(metadata.cell_error);
  // nothing is shown until the player asks for a check
  assert!(!metadata.show_cell_error);
  assert!(!metadata.show_cell_error_because_entry);
}

#[test]
fn strict_mode_ignores_checks_and_reveals() {
  let mut registry = Registry::new(MemoryStore::new());
  let mut args = init_args("puzzle", &["CAT"]);
  args.strict_mode = true;
  registry.initialize(args).unwrap();

  send(&mut registry, Event::RevealAllNoStreak);
  send(&mut registry, Event::ValidateAllNoStreak);

  let state = state(&registry);
  assert!(state.player_values.is_empty());
  assert!(state.player_actions.entry_reveals.is_empty());
  assert!(state.player_actions.entry_checks.is_empty());
  assert!(!state.has_revealed_any);
  assert!(!state.has_revealed_all);
}

#[test]
fn reveal_all_completes_the_puzzle_and_pins_every_cell() {
  let mut registry = open(&["CAT", "A.A", "TAR"]);
  send(&mut registry, Event::RevealAllNoStreak);

  {
    let state = state(&registry);
    assert!(state.has_revealed_all);
    assert!(state.is_complete);
    // every published cell now shows its value and resists clearing
    assert!(state.values_metadata.values().all(|m| m.is_revealed()));
  }

  send(&mut registry, Event::ClearAll);
  let state = state(&registry);
  assert!(state.is_complete);
}

#[test]
fn focus_never_lands_on_revealed_cells() {
  let mut registry = open(&["CAT"]);
  send(
    &mut registry,
    Event::CellClick {
      cell: Cell::new(1, 0),
    },
  );
  // reveal the focused entry's cells, then try to walk into them
  send(&mut registry, Event::RevealEntryNoStreak);
  send(
    &mut registry,
    Event::Left {
      is_user_action: true,
      allow_same_line_jump: true,
    },
  );

  // every cell of the row is revealed, so the focus cannot move
  let state = state(&registry);
  assert_eq!(state.focused_cell, Cell::new(1, 0));
}

#[test]
fn progress_from_another_device_merges_by_timestamp() {
  let mut registry = open(&["CAT"]);
  type_word(&mut registry, "x");
  let local_time = state(&registry).player_values_metadata[&Cell::new(0, 0).position_id()].time();

  // the server copy of (0,0) is newer, its copy of (1,0) is all it has
  let mut server = ProgressSnapshot::default();
  server.player_values.insert(
    Cell::new(0, 0).position_id(),
    PositionValue::new("C").unwrap(),
  );
  server.player_values_metadata.insert(
    Cell::new(0, 0).position_id(),
    PositionValueMetadata::new(local_time + 60_000).unwrap(),
  );
  server.player_values.insert(
    Cell::new(1, 0).position_id(),
    PositionValue::new("A").unwrap(),
  );
  server.player_values_metadata.insert(
    Cell::new(1, 0).position_id(),
    PositionValueMetadata::new(now_ms()).unwrap(),
  );

  let mut args = init_args("puzzle", &["CAT"]);
  args.re_initialize = true;
  args.server_progress = Some(server);
  registry.initialize(args).unwrap();

  let state = state(&registry);
  assert_eq!(player(state, 0, 0), "C");
  assert_eq!(player(state, 1, 0), "A");
}

#[test]
fn a_local_deletion_can_win_the_merge() {
  let mut registry = open(&["CAT"]);
  type_word(&mut registry, "c");
  send(
    &mut registry,
    Event::CellClick {
      cell: Cell::new(0, 0),
    },
  );
  send(&mut registry, Event::Delete);
  assert_eq!(player(state(&registry), 0, 0), "");

  // an older server value must not resurrect the deleted cell
  let mut server = ProgressSnapshot::default();
  server.player_values.insert(
    Cell::new(0, 0).position_id(),
    PositionValue::new("C").unwrap(),
  );
  server.player_values_metadata.insert(
    Cell::new(0, 0).position_id(),
    PositionValueMetadata::new(1).unwrap(),
  );

  let mut args = init_args("puzzle", &["CAT"]);
  args.re_initialize = true;
  args.server_progress = Some(server);
  registry.initialize(args).unwrap();

  assert_eq!(player(state(&registry), 0, 0), "");
}

#[test]
fn progress_survives_reopening_through_the_store() {
  let mut registry = open(&["CAT"]);
  type_word(&mut registry, "ca");
  registry.flush();

  let stored = registry.store().get("puzzle").unwrap();
  assert_eq!(
    stored.player_values[&Cell::new(0, 0).position_id()].as_str(),
    "C"
  );

  // a fresh registry over the same store picks the progress back up
  let mut store = MemoryStore::new();
  store.set("puzzle", &stored);
  let mut reopened = Registry::new(store);
  reopened.initialize(init_args("puzzle", &["CAT"])).unwrap();

  let state = reopened.get("puzzle").unwrap();
  assert_eq!(player(state, 0, 0), "C");
  assert_eq!(player(state, 1, 0), "A");
  assert_eq!(player(state, 2, 0), "");
}

#[test]
fn entry_focus_by_id_drives_clue_navigation() {
  let mut registry = open(&["CAT", "A.A", "TAR"]);
  let id: EntryId = "2-down".parse().unwrap();
  send(&mut registry, Event::EntryFocus { entry_id: id });

  let state = state(&registry);
  assert_eq!(state.focused_entry.id, id);
  assert_eq!(state.focused_cell, Cell::new(2, 0));
  assert!(state.entries_metadata[&id].entry_focus);
  assert_eq!(
    state
      .entries_metadata
      .values()
      .filter(|m| m.entry_focus)
      .count(),
    1
  );
}

#[test]
fn snapshots_round_trip_through_json_with_version_tags() {
  let mut registry = open(&["CAT"]);
  type_word(&mut registry, "ca");
  registry.flush();

  let snapshot = registry.store().get("puzzle").unwrap();
  let json = serde_json::to_string(&snapshot).unwrap();
  assert!(json.contains(r#""0,0""#));
  assert!(json.contains(r#""serialized":1"#));
  let back: ProgressSnapshot = serde_json::from_str(&json).unwrap();
  assert_eq!(back, snapshot);
}
