use crate::Direction::{Across, Down};
use crate::selectors;
use crate::{
  Cell, EditingMode, Entry, EntryClue, EntryId, EntryMetadata, EntryValue, Error, Event,
  InitPayload, Mode, PositionId, PositionValue, PositionValueMetadata, Precedence, SolverState,
  ValueMetadata, now_ms,
};
use std::collections::BTreeMap;

/// Applies one event to the given state and returns the next state, with all
/// derived metadata recomputed.
///
/// `reduce` is pure: it touches no clock state beyond timestamping written
/// values, and performs no I/O. On error the caller keeps `prev`; no partial
/// state ever escapes.
pub fn reduce(prev: &SolverState, event: &Event) -> Result<SolverState, Error> {
  let next = apply(prev, event)?;
  recompute(prev, next)
}

/// The base transition, before the recompute pass.
fn apply(prev: &SolverState, event: &Event) -> Result<SolverState, Error> {
  match event {
    Event::Initialize(payload) => initialize(prev, payload),
    Event::ReInitialize(payload) => re_initialize(prev, payload),

    Event::Left {
      is_user_action,
      allow_same_line_jump,
    } => step(prev, false, true, *is_user_action, *allow_same_line_jump),
    Event::Right {
      is_user_action,
      allow_same_line_jump,
    } => step(prev, true, true, *is_user_action, *allow_same_line_jump),
    Event::Up {
      is_user_action,
      allow_same_line_jump,
    } => step(prev, false, false, *is_user_action, *allow_same_line_jump),
    Event::Down {
      is_user_action,
      allow_same_line_jump,
    } => step(prev, true, false, *is_user_action, *allow_same_line_jump),

    Event::CellClick { cell } => {
      let mut next = prev.clone();
      next.editing_mode = EditingMode::Overwrite;
      if next.focused_cell != *cell {
        next = focus_on_cell(&next, *cell, None)?;
      } else {
        // clicking the focused cell switches direction
        next = reduce(&next, &Event::IntersectionEntrySwitch)?;
      }
      Ok(next)
    }

    Event::Character { value } => {
      let focused_cell = prev.focused_cell;
      let direction = prev.focused_entry.direction;
      let mut next = prev.clone();

      // first change focus to the next cell
      let empty_target = match next.editing_mode {
        EditingMode::Empty => next.next_empty_cell_in_entry,
        EditingMode::Overwrite => None,
      };
      if let Some(cell) = empty_target {
        next = focus_on_cell(&next, cell, None)?;
      } else if let Some(cell) = next.next_cell_in_entry {
        next = focus_on_cell(&next, cell, None)?;
      } else {
        let advance = match direction {
          Across => Event::Right {
            is_user_action: false,
            allow_same_line_jump: false,
          },
          Down => Event::Down {
            is_user_action: false,
            allow_same_line_jump: false,
          },
        };
        next = reduce(&next, &advance)?;
      }

      // if we did not move, go to the next entry
      if next.focused_cell == focused_cell {
        next = reduce(
          &next,
          &Event::EntryNext {
            incomplete_entries_only: false,
          },
        )?;
      }

      // the letter lands where the focus was
      write_player_value(&mut next, focused_cell, value.clone())?;
      Ok(next)
    }

    Event::Delete => {
      let focused_cell = prev.focused_cell;
      let retreat = match prev.focused_entry.direction {
        Across => Event::Left {
          is_user_action: true,
          allow_same_line_jump: false,
        },
        Down => Event::Up {
          is_user_action: true,
          allow_same_line_jump: false,
        },
      };
      let mut next = reduce(prev, &retreat)?;

      // if we did not move, go to the previous entry
      if next.focused_cell == focused_cell {
        next = reduce(
          &next,
          &Event::EntryPrevious {
            incomplete_entries_only: false,
            precedence: Precedence::End,
          },
        )?;
      }

      // an explicit empty value with a fresh timestamp, so the deletion
      // itself can win a later merge
      write_player_value(&mut next, focused_cell, PositionValue::empty())?;
      Ok(next)
    }

    Event::EntryNext {
      incomplete_entries_only,
    } => {
      let mut next = prev.clone();
      next.editing_mode = EditingMode::Empty;
      if let Some(entry) = next.next_incomplete_entry.clone() {
        next = focus_on_entry(&next, entry.id, true, Precedence::Start)?;
      } else if !incomplete_entries_only {
        let id = next.next_entry.id;
        next = focus_on_entry(&next, id, true, Precedence::Start)?;
      }
      Ok(next)
    }

    Event::EntryPrevious {
      incomplete_entries_only,
      precedence,
    } => {
      let mut next = prev.clone();
      next.editing_mode = EditingMode::Empty;
      if let Some(entry) = next.previous_incomplete_entry.clone() {
        next = focus_on_entry(&next, entry.id, true, *precedence)?;
      } else if !incomplete_entries_only {
        let id = next.previous_entry.id;
        next = focus_on_entry(&next, id, true, *precedence)?;
      }
      Ok(next)
    }

    Event::EntryFocus { entry_id } => {
      let mut next = prev.clone();
      next.editing_mode = EditingMode::Empty;
      focus_on_entry(&next, *entry_id, true, Precedence::Start)
    }

    Event::IntersectionEntrySwitch => {
      let mut next = prev.clone();
      let crossing = match next.focused_entry.direction {
        Across => &next.entries.down,
        Down => &next.entries.across,
      };
      let switched = crossing
        .iter()
        .find(|entry| entry.contains(next.focused_cell))
        .cloned();
      if let Some(entry) = switched {
        next.focused_entry = entry;
      }
      Ok(next)
    }

    Event::ValidateEntryNoStreak => {
      if prev.strict_mode {
        return Ok(prev.clone());
      }
      let mut next = prev.clone();
      next.has_revealed_any = true;
      let id = next.focused_entry.id;
      next.player_actions.record_entry_check(id);
      Ok(next)
    }

    Event::ValidateAllNoStreak => {
      if prev.strict_mode {
        return Ok(prev.clone());
      }
      let mut next = prev.clone();
      next.has_revealed_all = true;
      let ids: Vec<EntryId> = next.entries.iter().map(|entry| entry.id).collect();
      for id in ids {
        next.player_actions.record_entry_check(id);
      }
      Ok(next)
    }

    Event::RevealEntryNoStreak => {
      if prev.strict_mode {
        return Ok(prev.clone());
      }
      let mut next = prev.clone();
      next.has_revealed_any = true;
      let id = next.focused_entry.id;
      next.player_actions.record_entry_reveal(id);
      Ok(next)
    }

    Event::RevealAllNoStreak => {
      if prev.strict_mode {
        return Ok(prev.clone());
      }
      let mut next = prev.clone();
      next.has_revealed_all = true;
      let ids: Vec<EntryId> = next.entries.iter().map(|entry| entry.id).collect();
      for id in ids {
        next.player_actions.record_entry_reveal(id);
      }
      Ok(next)
    }

    Event::ClearEntry => {
      let mut next = prev.clone();
      let cells = next.focused_entry.cells();
      clear_player_cells(&mut next, &cells)?;
      Ok(next)
    }

    Event::ClearAll => {
      let mut next = prev.clone();
      let cells: Vec<Cell> = next.entries.iter().flat_map(|entry| entry.cells()).collect();
      clear_player_cells(&mut next, &cells)?;
      Ok(next)
    }
  }
}

/// Arrow movement. `forward` is right/down, `horizontal` distinguishes
/// left/right from up/down.
fn step(
  prev: &SolverState,
  forward: bool,
  horizontal: bool,
  is_user_action: bool,
  allow_same_line_jump: bool,
) -> Result<SolverState, Error> {
  let mut next = prev.clone();
  if is_user_action {
    next.editing_mode = EditingMode::Overwrite;
  }

  // moving against the focused entry's axis switches to the crossing entry
  let direction_change = match next.focused_entry.direction {
    Across => !horizontal,
    Down => horizontal,
  };
  if direction_change {
    next = reduce(&next, &Event::IntersectionEntrySwitch)?;
  }

  let focused_cell = next.focused_cell;
  let at_edge = if forward {
    next.focused_entry.end == focused_cell
  } else {
    next.focused_entry.start == focused_cell
  };
  let jump_line = at_edge || direction_change;

  if allow_same_line_jump && jump_line {
    let target = match (forward, horizontal) {
      (false, false) => next.north_cell_in_same_line,
      (true, false) => next.south_cell_in_same_line,
      (false, true) => next.west_cell_in_same_line,
      (true, true) => next.east_cell_in_same_line,
    };
    if let Some(cell) = target {
      next = focus_on_cell(&next, cell, None)?;
    }
    return Ok(next);
  }

  let empty_target = match next.editing_mode {
    EditingMode::Empty => {
      if forward {
        next.next_empty_cell_in_entry
      } else {
        next.previous_empty_cell_in_entry
      }
    }
    EditingMode::Overwrite => None,
  };
  let fallback = if forward {
    next.next_cell_in_entry
  } else {
    next.previous_cell_in_entry
  };

  if let Some(cell) = empty_target {
    next = focus_on_cell(&next, cell, None)?;
  } else if let Some(cell) = fallback {
    next = focus_on_cell(&next, cell, None)?;
  }
  // exhausted all options, stay where you are

  Ok(next)
}

/// Moves the focus to the given cell, resolving the focused entry. With an
/// entry id the entry in that id's direction wins; otherwise the entry in
/// the currently focused direction, falling back to the first covering
/// entry. Focusing a revealed cell is a silent no-op.
fn focus_on_cell(
  state: &SolverState,
  cell: Cell,
  entry_id: Option<EntryId>,
) -> Result<SolverState, Error> {
  selectors::check_bounds(state, cell)?;

  // only move to cells that have published values
  if !selectors::cell_has_published_value(state, cell) {
    return Err(Error::MissingPublishedValue(cell.position_id()));
  }

  // skip revealed cells
  if selectors::cell_is_revealed(state, cell) {
    return Ok(state.clone());
  }

  let cell_entries = selectors::cell_entries(state, cell);
  if cell_entries.is_empty() {
    return Err(Error::NoEntryAtCell(cell.position_id()));
  }

  let preferred = match entry_id {
    Some(id) => cell_entries
      .iter()
      .find(|entry| entry.direction == id.direction())
      .copied(),
    None => cell_entries
      .iter()
      .find(|entry| entry.direction == state.focused_entry.direction)
      .copied()
      .or_else(|| cell_entries.first().copied()),
  };
  let entry = preferred
    .ok_or(Error::NoEntryAtCell(cell.position_id()))?
    .clone();

  let mut next = state.clone();
  next.focused_cell = cell;
  next.focused_entry = entry;
  Ok(next)
}

/// Moves the focus onto the given entry. In `Empty` editing mode the landing
/// cell depends on `precedence`: the first unfilled cell, or the last filled
/// one. Without such a cell, the entry's start if
/// `focus_on_first_cell_if_no_empty`, else no move at all.
fn focus_on_entry(
  state: &SolverState,
  id: EntryId,
  focus_on_first_cell_if_no_empty: bool,
  precedence: Precedence,
) -> Result<SolverState, Error> {
  let entry = selectors::entry(state, id)?.clone();

  if state.editing_mode == EditingMode::Empty {
    let target = match precedence {
      Precedence::Start => selectors::entry_first_cell_without_player_values(state, &entry),
      Precedence::End => selectors::entry_last_cell_with_player_values(state, &entry),
    };
    if let Some(cell) = target {
      focus_on_cell(state, cell, Some(id))
    } else if focus_on_first_cell_if_no_empty {
      focus_on_cell(state, entry.start, Some(id))
    } else {
      Ok(state.clone())
    }
  } else {
    focus_on_cell(state, entry.start, Some(id))
  }
}

fn write_player_value(state: &mut SolverState, cell: Cell, value: PositionValue) -> Result<(), Error> {
  let id = cell.position_id();
  state.player_values.insert(id, value);
  state
    .player_values_metadata
    .insert(id, PositionValueMetadata::new(now_ms())?);
  Ok(())
}

/// Copies the published value into the player value for each given cell
/// that has one, with a fresh timestamp.
fn fill_player_cells_with_correct_values(
  state: &mut SolverState,
  cells: &[Cell],
) -> Result<(), Error> {
  let targets: Vec<(Cell, PositionValue)> = cells
    .iter()
    .filter_map(|&cell| selectors::published_value(state, cell).map(|value| (cell, value.clone())))
    .collect();
  for (cell, value) in targets {
    write_player_value(state, cell, value)?;
  }
  Ok(())
}

/// Writes an explicit empty value into each given cell, skipping revealed
/// cells and cells without a published value.
fn clear_player_cells(state: &mut SolverState, cells: &[Cell]) -> Result<(), Error> {
  let targets: Vec<Cell> = cells
    .iter()
    .copied()
    .filter(|&cell| !selectors::cell_is_revealed(state, cell))
    .filter(|&cell| selectors::cell_has_published_value(state, cell))
    .collect();
  for cell in targets {
    write_player_value(state, cell, PositionValue::empty())?;
  }
  Ok(())
}

/// Rebuilds the state from an initialization payload. The focus lands on
/// the first entry's first cell; metadata is seeded with placeholders for
/// the recompute pass to fill in.
fn initialize(prev: &SolverState, payload: &InitPayload) -> Result<SolverState, Error> {
  let mut next = prev.clone();
  next.initialized = true;
  next.uuid = payload.uuid.clone();
  next.mode = Mode::Solve;
  next.editing_mode = EditingMode::Overwrite;
  next.is_complete = false;
  next.strict_mode = payload.strict_mode;
  next.dimensions = payload.dimensions;
  next.has_revealed_any = payload.has_revealed_any;
  next.has_revealed_all = payload.has_revealed_all;
  next.player_values = payload.progress.player_values.clone();
  next.player_values_metadata = payload.progress.player_values_metadata.clone();
  next.player_actions = payload.progress.player_actions.clone();
  next.values = payload.values.clone();
  next.entries = payload.entries.clone();
  next.clues = payload.clues.clone();

  let mut values_metadata = BTreeMap::new();
  for (&id, published) in &next.values {
    if published.is_empty() {
      return Err(Error::MissingPublishedValue(id));
    }
    let player = next.player_values.get(&id).cloned().unwrap_or_default();
    values_metadata.insert(
      id,
      ValueMetadata {
        cell: id.cell(),
        cell_focus: false,
        cell_error: false,
        entry_focus: false,
        entry_across_error: false,
        entry_down_error: false,
        human_index: None,
        value_published: published.clone(),
        value_player: player,
        show_cell_value: false,
        show_cell_success: false,
        show_cell_error: false,
        show_cell_value_because_entry: false,
        show_cell_success_because_entry: false,
        show_cell_error_because_entry: false,
      },
    );
  }
  next.values_metadata = values_metadata;

  let mut entries_metadata = BTreeMap::new();
  for entry in next.entries.iter() {
    entries_metadata.insert(
      entry.id,
      EntryMetadata {
        entry: entry.clone(),
        entry_focus: false,
        entry_error: false,
        all_cells_have_player_values: false,
        is_complete: false,
        clue: EntryClue::default(),
        value: EntryValue::default(),
      },
    );
  }
  next.entries_metadata = entries_metadata;

  // focus on the first cell of the first entry
  let first = next.entries.iter().next().ok_or(Error::NoEntries)?.clone();
  next.focused_cell = first.start;
  next.focused_entry = first;
  Ok(next)
}

/// Refreshes the published side and progress while keeping the focus and
/// the derived metadata; the recompute pass brings those up to date.
fn re_initialize(prev: &SolverState, payload: &InitPayload) -> Result<SolverState, Error> {
  let mut next = prev.clone();
  next.initialized = true;
  next.uuid = payload.uuid.clone();
  next.strict_mode = payload.strict_mode;
  next.has_revealed_any = payload.has_revealed_any;
  next.has_revealed_all = payload.has_revealed_all;
  next.player_values = payload.progress.player_values.clone();
  next.player_values_metadata = payload.progress.player_values_metadata.clone();
  next.player_actions = payload.progress.player_actions.clone();
  next.values = payload.values.clone();
  next.entries = payload.entries.clone();
  next.clues = payload.clues.clone();
  Ok(next)
}

/// The post-transition pass: reveal fills, completion, intersection flag,
/// per-cell and per-entry metadata, and the cached navigation pointers
/// (recomputed only when the focus moved).
fn recompute(prev: &SolverState, mut next: SolverState) -> Result<SolverState, Error> {
  if !next.initialized {
    return Ok(next);
  }

  let focused_cell = next.focused_cell;
  let focused_entry = next.focused_entry.clone();
  let focus_change = !prev.initialized
    || prev.focused_cell != focused_cell
    || prev.focused_entry.id != focused_entry.id;

  // completion is judged before the reveal fill below, so an entry revealed
  // in this very transition still counts as in error this once
  let entries_with_errors: Vec<Entry> = next
    .entries
    .iter()
    .filter(|entry| !selectors::entry_is_complete(&next, entry))
    .cloned()
    .collect();

  // reveal player values
  let revealed_cells: Vec<Cell> = next
    .values
    .keys()
    .map(|id| id.cell())
    .filter(|&cell| {
      let id = cell.position_id();
      if next.player_actions.cell_reveals.contains(&id) {
        return true;
      }
      selectors::cell_entries(&next, cell)
        .iter()
        .any(|entry| next.player_actions.entry_reveals.contains(&entry.id))
    })
    .collect();
  fill_player_cells_with_correct_values(&mut next, &revealed_cells)?;

  next.is_complete = selectors::crossword_is_complete(&next);
  next.is_at_intersection = selectors::cell_entries(&next, focused_cell).len() > 1;

  let ids: Vec<PositionId> = next.values_metadata.keys().copied().collect();
  let mut values_metadata = BTreeMap::new();
  for id in ids {
    let old = next
      .values_metadata
      .get(&id)
      .ok_or(Error::MissingValueMetadata(id))?;
    let cell = id.cell();
    let published = next
      .values
      .get(&id)
      .filter(|value| !value.is_empty())
      .ok_or(Error::MissingPublishedValue(id))?
      .clone();
    let player = next.player_values.get(&id).cloned().unwrap_or_default();
    let entry_ids: Vec<EntryId> = selectors::cell_entries(&next, cell)
      .iter()
      .map(|entry| entry.id)
      .collect();

    let mut entry_across_error = entries_with_errors
      .iter()
      .any(|entry| entry.direction == Across && entry.contains(cell));
    let mut entry_down_error = entries_with_errors
      .iter()
      .any(|entry| entry.direction == Down && entry.contains(cell));

    // normalize entry errors
    if entry_across_error != entry_down_error {
      if entry_ids.len() == 2 {
        // a cell at an intersection: one of them is solved, show no error
        entry_across_error = false;
        entry_down_error = false;
      } else if entry_ids.len() == 1 {
        // a cell on one entry only: that one is in error
        entry_across_error = true;
        entry_down_error = true;
      }
    }

    let cell_checked = next.player_actions.cell_checks.contains(&id);
    let entry_checked = entry_ids
      .iter()
      .any(|entry_id| next.player_actions.entry_checks.contains(entry_id));
    let entry_revealed = entry_ids
      .iter()
      .any(|entry_id| next.player_actions.entry_reveals.contains(entry_id));

    // an empty player value never matches a published character
    let cell_error = player != published;

    values_metadata.insert(
      id,
      ValueMetadata {
        cell,
        cell_focus: cell == focused_cell,
        cell_error,
        entry_focus: focused_entry.contains(cell),
        entry_across_error,
        entry_down_error,
        human_index: selectors::cell_human_index(&next, cell),
        value_published: published,
        value_player: player,
        show_cell_value: old.show_cell_value
          || next.player_actions.cell_reveals.contains(&id),
        show_cell_success: old.show_cell_success || cell_checked,
        show_cell_error: old.show_cell_error || cell_checked,
        show_cell_value_because_entry: old.show_cell_value_because_entry || entry_revealed,
        show_cell_success_because_entry: old.show_cell_success_because_entry || entry_checked,
        show_cell_error_because_entry: old.show_cell_error_because_entry || entry_checked,
      },
    );
  }
  next.values_metadata = values_metadata;

  let mut entries_metadata = BTreeMap::new();
  for entry in next.entries.iter() {
    let is_complete = selectors::entry_is_complete(&next, entry);
    entries_metadata.insert(
      entry.id,
      EntryMetadata {
        entry: entry.clone(),
        entry_focus: focused_entry.id == entry.id,
        entry_error: !is_complete,
        all_cells_have_player_values: selectors::all_cells_have_player_values(&next, entry),
        is_complete,
        clue: selectors::entry_clue(&next, entry.id),
        value: selectors::entry_value(&next, entry.id)?,
      },
    );
  }
  next.entries_metadata = entries_metadata;

  if focus_change {
    next.previous_cell_in_entry = selectors::entry_previous_cell(&focused_entry, focused_cell)?;
    next.next_cell_in_entry = selectors::entry_next_cell(&focused_entry, focused_cell)?;
    next.previous_empty_cell_in_entry =
      selectors::entry_previous_cell_without_player_values(&next, &focused_entry, focused_cell)?;
    next.next_empty_cell_in_entry =
      selectors::entry_next_cell_without_player_values(&next, &focused_entry, focused_cell)?;
    next.north_cell_in_same_line = selectors::previous_cell_in_same_line(&next, focused_cell, Down);
    next.south_cell_in_same_line = selectors::next_cell_in_same_line(&next, focused_cell, Down);
    next.west_cell_in_same_line = selectors::previous_cell_in_same_line(&next, focused_cell, Across);
    next.east_cell_in_same_line = selectors::next_cell_in_same_line(&next, focused_cell, Across);
  } else {
    next.previous_cell_in_entry = prev.previous_cell_in_entry;
    next.next_cell_in_entry = prev.next_cell_in_entry;
    next.previous_empty_cell_in_entry = prev.previous_empty_cell_in_entry;
    next.next_empty_cell_in_entry = prev.next_empty_cell_in_entry;
    next.north_cell_in_same_line = prev.north_cell_in_same_line;
    next.south_cell_in_same_line = prev.south_cell_in_same_line;
    next.west_cell_in_same_line = prev.west_cell_in_same_line;
    next.east_cell_in_same_line = prev.east_cell_in_same_line;
  }

  next.previous_entry = selectors::previous_entry(&next, &focused_entry)?;
  next.next_entry = selectors::next_entry(&next, &focused_entry)?;
  next.previous_incomplete_entry = selectors::previous_incomplete_entry(&next, &focused_entry)?;
  next.next_incomplete_entry = selectors::next_incomplete_entry(&next, &focused_entry)?;

  Ok(next)
}
