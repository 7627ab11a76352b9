use crate::{
  Dimensions, EntryClue, EntryId, EntrySet, Error, Event, GridModel, InitPayload, PositionId,
  PositionValue, ProgressSnapshot, ProgressStore, SolverState, ThrottledWriter, merge_progress,
  reduce,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// An [Event] addressed to one puzzle.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
  pub uuid: String,
  pub event: Event,
}

/// Everything a host supplies to start (or refresh) solving one puzzle.
/// `entries` may be left out to have them derived from `values`;
/// `server_progress` is the other devices' snapshot to merge with whatever
/// this device already has.
#[derive(Debug, Clone)]
pub struct InitArgs {
  pub uuid: String,
  pub re_initialize: bool,
  pub strict_mode: bool,
  pub dimensions: Dimensions,
  pub has_revealed_any: bool,
  pub has_revealed_all: bool,
  pub values: BTreeMap<PositionId, PositionValue>,
  pub entries: Option<EntrySet>,
  pub clues: BTreeMap<EntryId, EntryClue>,
  pub server_progress: Option<ProgressSnapshot>,
}

/// Holds the [SolverState] of every open puzzle and routes events to the
/// engine. A failed transition is logged, with the triggering event
/// attached, and the puzzle keeps its prior state; solving continues.
/// Successful transitions feed the throttled progress writer.
pub struct Registry<S: ProgressStore> {
  states: HashMap<String, SolverState>,
  writer: ThrottledWriter<S>,
}

impl<S: ProgressStore> Registry<S> {
  pub fn new(store: S) -> Self {
    Self {
      states: HashMap::new(),
      writer: ThrottledWriter::new(store),
    }
  }

  pub fn get(&self, uuid: &str) -> Option<&SolverState> {
    self.states.get(uuid)
  }

  /// Builds the merged initialization payload and dispatches it. The client
  /// side of the merge is the live state if the puzzle is already open,
  /// else whatever the store has; published values that are empty strings
  /// are dropped before entries are derived.
  pub fn initialize(&mut self, args: InitArgs) -> Result<(), Error> {
    let values: BTreeMap<PositionId, PositionValue> = args
      .values
      .into_iter()
      .filter(|(_, value)| !value.is_empty())
      .collect();

    let entries = match args.entries {
      Some(entries) => entries,
      None => GridModel::new(args.dimensions, values.clone()).derive_entries()?,
    };

    let client = self
      .states
      .get(&args.uuid)
      .map(|state| state.progress_snapshot())
      .or_else(|| self.writer.store().get(&args.uuid));
    let progress = merge_progress(client.as_ref(), args.server_progress.as_ref());

    let payload = InitPayload {
      uuid: args.uuid.clone(),
      strict_mode: args.strict_mode,
      dimensions: args.dimensions,
      has_revealed_any: args.has_revealed_any,
      has_revealed_all: args.has_revealed_all,
      progress,
      values,
      entries,
      clues: args.clues,
    };
    let event = if args.re_initialize {
      Event::ReInitialize(payload)
    } else {
      Event::Initialize(payload)
    };
    self.dispatch(&EventEnvelope {
      uuid: args.uuid,
      event,
    });
    Ok(())
  }

  /// Routes one event to its puzzle's state machine.
  pub fn dispatch(&mut self, envelope: &EventEnvelope) {
    let prev = self
      .states
      .get(&envelope.uuid)
      .cloned()
      .unwrap_or_else(SolverState::placeholder);

    match reduce(&prev, &envelope.event) {
      Ok(next) => {
        if next.initialized {
          self.writer.offer(&envelope.uuid, next.progress_snapshot());
        }
        self.states.insert(envelope.uuid.clone(), next);
      }
      Err(error) => {
        log::error!(
          "transition failed for puzzle {}: {error}; event = {:?}",
          envelope.uuid,
          envelope.event
        );
      }
    }
  }

  /// Gives the throttled writer a chance to write a parked snapshot.
  pub fn poll(&mut self) {
    self.writer.poll();
  }

  /// Writes any parked snapshot immediately. For shutdown.
  pub fn flush(&mut self) {
    self.writer.flush();
  }

  pub fn store(&self) -> &S {
    self.writer.store()
  }
}
