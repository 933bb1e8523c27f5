//! Shared LLM-runtime slot
//!
//! Holds the settings the chat engine executes with. Reconfiguring builds a
//! complete [`RuntimeState`] and publishes it as a new snapshot behind a
//! single atomic pointer, so a reader sees either the old or the new
//! configuration and never a mix of the two.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::types::{BackendId, RuntimeState};

/// One published configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeSnapshot {
    /// Strictly increasing publish counter (0 for the initial state)
    pub version: u64,
    /// Backend the state was configured for
    pub backend: BackendId,
    #[serde(flatten)]
    pub state: RuntimeState,
}

/// Process-wide, atomically swapped runtime configuration
pub struct SharedRuntime {
    current: ArcSwap<RuntimeSnapshot>,
}

impl SharedRuntime {
    /// Start from the hosted-primary defaults at version 0
    pub fn new() -> Self {
        Self::with_state(BackendId::OpenAi, RuntimeState::default())
    }

    /// Start from a specific state at version 0
    pub fn with_state(backend: BackendId, state: RuntimeState) -> Self {
        Self {
            current: ArcSwap::from_pointee(RuntimeSnapshot {
                version: 0,
                backend,
                state,
            }),
        }
    }

    /// The current snapshot
    pub fn load(&self) -> Arc<RuntimeSnapshot> {
        self.current.load_full()
    }

    /// Replace the runtime state wholesale and return the new snapshot
    ///
    /// Concurrent publishers race last-write-wins, but versions stay unique
    /// and the stored snapshot always carries the highest one.
    pub fn publish(&self, backend: BackendId, state: RuntimeState) -> Arc<RuntimeSnapshot> {
        let mut published = None;
        self.current.rcu(|current| {
            let snapshot = Arc::new(RuntimeSnapshot {
                version: current.version + 1,
                backend,
                state: state.clone(),
            });
            published = Some(Arc::clone(&snapshot));
            snapshot
        });
        published.unwrap_or_else(|| self.load())
    }
}

impl Default for SharedRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRuntime")
            .field("current", &self.load())
            .finish()
    }
}
