use crate::ProgressSnapshot;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long the throttled writer waits between progress writes.
pub const WRITE_WINDOW: Duration = Duration::from_secs(5);

/// Where merged player progress lives between sessions, keyed by the
/// puzzle's uuid. Implementations decide the medium; the engine only ever
/// reads a snapshot at initialization and hands snapshots to the
/// [ThrottledWriter] after transitions.
pub trait ProgressStore {
  fn get(&self, uuid: &str) -> Option<ProgressSnapshot>;
  fn set(&mut self, uuid: &str, snapshot: &ProgressSnapshot);
}

/// A [ProgressStore] that keeps everything in memory. Useful for tests and
/// for hosts that sync progress some other way.
#[derive(Debug, Default)]
pub struct MemoryStore {
  snapshots: HashMap<String, ProgressSnapshot>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ProgressStore for MemoryStore {
  fn get(&self, uuid: &str) -> Option<ProgressSnapshot> {
    self.snapshots.get(uuid).cloned()
  }

  fn set(&mut self, uuid: &str, snapshot: &ProgressSnapshot) {
    self.snapshots.insert(uuid.to_string(), snapshot.clone());
  }
}

/// Writes snapshots through to a [ProgressStore] at most once per
/// [WRITE_WINDOW], with trailing-write semantics: a snapshot offered during
/// the quiet period is parked and the latest parked snapshot is written when
/// the window reopens (or on [flush](Self::flush)). Solving never waits on a
/// write.
#[derive(Debug)]
pub struct ThrottledWriter<S: ProgressStore> {
  store: S,
  window: Duration,
  last_write: Option<Instant>,
  pending: Option<(String, ProgressSnapshot)>,
}

impl<S: ProgressStore> ThrottledWriter<S> {
  pub fn new(store: S) -> Self {
    Self::with_window(store, WRITE_WINDOW)
  }

  pub fn with_window(store: S, window: Duration) -> Self {
    Self {
      store,
      window,
      last_write: None,
      pending: None,
    }
  }

  /// Offers a snapshot for writing. Written immediately when the window is
  /// open, parked (replacing any earlier parked snapshot) when it is not.
  pub fn offer(&mut self, uuid: &str, snapshot: ProgressSnapshot) {
    if self.window_open() {
      self.write(uuid, &snapshot);
      self.pending = None;
    } else {
      self.pending = Some((uuid.to_string(), snapshot));
    }
  }

  /// Writes the parked snapshot if the window has reopened. Hosts call this
  /// from their idle loop.
  pub fn poll(&mut self) {
    if self.window_open()
      && let Some((uuid, snapshot)) = self.pending.take()
    {
      self.write(&uuid, &snapshot);
    }
  }

  /// Writes the parked snapshot regardless of the window. For shutdown.
  pub fn flush(&mut self) {
    if let Some((uuid, snapshot)) = self.pending.take() {
      self.write(&uuid, &snapshot);
    }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  fn window_open(&self) -> bool {
    match self.last_write {
      None => true,
      Some(at) => at.elapsed() >= self.window,
    }
  }

  fn write(&mut self, uuid: &str, snapshot: &ProgressSnapshot) {
    self.store.set(uuid, snapshot);
    self.last_write = Some(Instant::now());
  }
}
