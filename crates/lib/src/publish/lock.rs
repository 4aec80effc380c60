//! Per-record mutual exclusion for publishes.
//!
//! A publish locks every literal it touches (the record's current literal and
//! the one it is renamed to) from `edit` until its release or `finish`
//! completes. Publishes of different records never wait on each other.
//! Literals are keyed in canonical form, so `1.0.0.0-beta.1` and `1.0.0.0b1`
//! share one lock.
//!
//! One registry serves one project. It also carries the project mutex that
//! serialises read-modify-write cycles on the project definition.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::version::UpdateVersion;

type Slots = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Shared registry of record locks. Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct RecordLocks {
  slots: Slots,
  project: Arc<Mutex<()>>,
}

/// Held while a publish is in flight; dropping it releases every literal it
/// covers.
#[derive(Debug)]
pub struct RecordGuard {
  keys: Vec<String>,
  guards: Vec<OwnedMutexGuard<()>>,
  slots: Slots,
}

impl RecordGuard {
  fn empty(keys: Vec<String>, slots: Slots) -> Self {
    Self {
      keys,
      guards: Vec::new(),
      slots,
    }
  }

  /// Canonical literals covered by this guard, sorted.
  pub fn keys(&self) -> &[String] {
    &self.keys
  }
}

impl Drop for RecordGuard {
  fn drop(&mut self) {
    self.guards.clear();

    // An entry only the registry references is unlocked and unawaited.
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    for key in &self.keys {
      if slots.get(key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
        slots.remove(key);
      }
    }
    debug!(records = ?self.keys, "released record lock");
  }
}

impl RecordLocks {
  pub fn new() -> Self {
    Self::default()
  }

  fn slot(&self, key: &str) -> Arc<AsyncMutex<()>> {
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    slots.entry(key.to_string()).or_default().clone()
  }

  /// Wait until every literal is free and lock them all.
  ///
  /// Keys are locked in sorted order so overlapping requests cannot deadlock.
  pub async fn acquire<I, S>(&self, literals: I) -> RecordGuard
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut guard = RecordGuard::empty(keys_for(literals), self.slots.clone());
    for key in guard.keys.clone() {
      let slot = self.slot(&key);
      guard.guards.push(slot.lock_owned().await);
    }
    debug!(records = ?guard.keys, "acquired record lock");
    guard
  }

  /// Lock every literal if none of them is held.
  pub fn try_acquire<I, S>(&self, literals: I) -> Option<RecordGuard>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut guard = RecordGuard::empty(keys_for(literals), self.slots.clone());
    for key in guard.keys.clone() {
      let slot = self.slot(&key);
      guard.guards.push(slot.try_lock_owned().ok()?);
    }
    debug!(records = ?guard.keys, "acquired record lock");
    Some(guard)
  }

  pub fn is_locked(&self, literal: &str) -> bool {
    let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    slots
      .get(&record_key(literal))
      .is_some_and(|slot| slot.try_lock().is_err())
  }

  /// Number of literals the registry currently tracks.
  pub fn tracked(&self) -> usize {
    self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  /// Exclusive access to the project definition for one load-modify-save.
  pub(crate) fn lock_project(&self) -> MutexGuard<'_, ()> {
    self.project.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Canonical lock key for a version literal.
pub fn record_key(literal: &str) -> String {
  UpdateVersion::parse(literal)
    .map(|v| v.render())
    .unwrap_or_else(|_| literal.to_string())
}

fn keys_for<I, S>(literals: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  literals
    .into_iter()
    .map(|l| record_key(l.as_ref()))
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}
