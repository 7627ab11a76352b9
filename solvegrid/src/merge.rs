use crate::{EntryId, PositionId, PositionValue, PositionValueMetadata, now_ms};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const MS_PER_YEAR: u64 = 365 * 24 * 60 * 60 * 1000;

/// The timestamp given to a merged value whose winning side carried none:
/// one year in the past, so any freshly written value outranks it.
pub(crate) fn sentinel_time() -> u64 {
  now_ms().saturating_sub(MS_PER_YEAR).max(1)
}

/// The check and reveal history of one player, as four append-only id logs.
/// Logs never shrink; merging two histories unions them.
#[derive(Debug, Eq, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct PlayerActions {
  pub cell_checks: Vec<PositionId>,
  pub cell_reveals: Vec<PositionId>,
  pub entry_checks: Vec<EntryId>,
  pub entry_reveals: Vec<EntryId>,
}

impl PlayerActions {
  /// Unions two histories, keeping this side's order and appending the
  /// other side's unseen ids.
  pub fn union(mut self, other: &PlayerActions) -> PlayerActions {
    union_into(&mut self.cell_checks, &other.cell_checks);
    union_into(&mut self.cell_reveals, &other.cell_reveals);
    union_into(&mut self.entry_checks, &other.entry_checks);
    union_into(&mut self.entry_reveals, &other.entry_reveals);
    self
  }

  pub fn record_entry_check(&mut self, id: EntryId) {
    push_unique(&mut self.entry_checks, id);
  }

  pub fn record_entry_reveal(&mut self, id: EntryId) {
    push_unique(&mut self.entry_reveals, id);
  }
}

fn union_into<T: PartialEq + Copy>(into: &mut Vec<T>, from: &[T]) {
  for &id in from {
    push_unique(into, id);
  }
}

fn push_unique<T: PartialEq>(into: &mut Vec<T>, id: T) {
  if !into.contains(&id) {
    into.push(id);
  }
}

/// Everything one device knows about a player's progress on one puzzle.
#[derive(Debug, Eq, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
  pub player_values: BTreeMap<PositionId, PositionValue>,
  pub player_values_metadata: BTreeMap<PositionId, PositionValueMetadata>,
  pub player_actions: PlayerActions,
}

/// Reconciles the local snapshot with the server's copy, cell by cell.
///
/// For each position, the value whose metadata carries the larger timestamp
/// wins; a timed value beats an untimed one, and when neither side has a
/// timestamp the client value wins. The merged timestamp is the winning
/// side's, or the one-year-ago sentinel if it had none. Timestamps are
/// trusted as written, so a device with a skewed clock can win the merge.
/// Action logs are unioned, client order first.
pub fn merge_progress(
  client: Option<&ProgressSnapshot>,
  server: Option<&ProgressSnapshot>,
) -> ProgressSnapshot {
  let empty = ProgressSnapshot::default();
  let client = client.unwrap_or(&empty);
  let server = server.unwrap_or(&empty);

  let positions: BTreeSet<PositionId> = client
    .player_values
    .keys()
    .chain(server.player_values.keys())
    .copied()
    .collect();

  let mut merged = ProgressSnapshot::default();
  for id in positions {
    let client_value = client.player_values.get(&id);
    let server_value = server.player_values.get(&id);
    let client_time = client.player_values_metadata.get(&id).map(|m| m.time());
    let server_time = server.player_values_metadata.get(&id).map(|m| m.time());

    let (value, time) = match (client_value, server_value) {
      (Some(client_value), Some(server_value)) => match (client_time, server_time) {
        (Some(ct), Some(st)) if ct > st => (client_value, Some(ct)),
        (Some(_), Some(st)) => (server_value, Some(st)),
        (Some(ct), None) => (client_value, Some(ct)),
        (None, Some(st)) => (server_value, Some(st)),
        (None, None) => (client_value, None),
      },
      (Some(client_value), None) => (client_value, client_time),
      (None, Some(server_value)) => (server_value, server_time),
      (None, None) => continue,
    };

    merged.player_values.insert(id, value.clone());
    let time = time.unwrap_or_else(sentinel_time);
    if let Ok(metadata) = PositionValueMetadata::new(time) {
      merged.player_values_metadata.insert(id, metadata);
    }
  }

  merged.player_actions = client.player_actions.clone().union(&server.player_actions);
  merged
}
