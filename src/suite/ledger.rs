//! Fixture ledger
//!
//! Run-scoped record of which module and class fixtures have run. It is
//! the only state shared between workers.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

/// State of one fixture within a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixtureState {
    /// Claimed by a worker, hook still running
    Running,
    Succeeded,
    Failed,
}

/// Fixture outcomes for a single run, keyed by fixture name
#[derive(Debug, Default)]
pub struct FixtureLedger {
    states: DashMap<String, FixtureState>,
}

impl FixtureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` for execution
    ///
    /// Returns `false` when the fixture was already claimed or recorded;
    /// only one caller can ever win a given key.
    pub fn claim(&self, key: &str) -> bool {
        match self.states.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(FixtureState::Running);
                true
            }
        }
    }

    pub fn record(&self, key: &str, succeeded: bool) {
        let state = if succeeded {
            FixtureState::Succeeded
        } else {
            FixtureState::Failed
        };
        debug!("Fixture {} -> {:?}", key, state);
        self.states.insert(key.to_string(), state);
    }

    pub fn state(&self, key: &str) -> Option<FixtureState> {
        self.states.get(key).map(|entry| *entry.value())
    }

    pub fn is_recorded(&self, key: &str) -> bool {
        self.states.contains_key(key)
    }

    pub fn has_failed(&self, key: &str) -> bool {
        self.state(key) == Some(FixtureState::Failed)
    }

    pub fn has_succeeded(&self, key: &str) -> bool {
        self.state(key) == Some(FixtureState::Succeeded)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
