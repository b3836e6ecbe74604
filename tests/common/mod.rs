//! Common test infrastructure shared across integration tests.
//!
//! This module provides:
//! - `ScriptedManual`: a manual entry provider replaying fixed answers
//! - `ScriptedRemote`: a remote dice source replaying fixed draws and counting calls
//! - `init_tracing`: a per-test tracing subscriber writing through the test harness
//!
//! # Usage
//!
//! From any integration test file:
//! ```ignore
//! #[path = "common/mod.rs"]
//! mod common;
//! use common::{ScriptedRemote, init_tracing};
//! ```

#![allow(dead_code)]

use std::collections::VecDeque;

use dice_engine::{DiceError, ManualDiceSource, RemoteDiceSource};
use parking_lot::Mutex;

/// Installs a DEBUG-level subscriber for the current test thread.
///
/// Keep the guard alive for the duration of the test.
#[must_use]
pub fn init_tracing() -> tracing::subscriber::DefaultGuard {
    tracing::subscriber::set_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish(),
    )
}

/// Manual entry that replays a script, then cancels.
#[derive(Debug, Default)]
pub struct ScriptedManual {
    entries: Mutex<VecDeque<Result<[u32; 2], DiceError>>>,
}

impl ScriptedManual {
    pub fn new(entries: impl IntoIterator<Item = Result<[u32; 2], DiceError>>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }
}

impl ManualDiceSource for ScriptedManual {
    fn enter_dice(&self) -> Result<[u32; 2], DiceError> {
        self.entries
            .lock()
            .pop_front()
            .unwrap_or(Err(DiceError::ManualEntryCancelled))
    }
}

/// Remote source that replays a script and counts the draws requested.
///
/// Once the script runs out every draw fails.
#[derive(Debug, Default)]
pub struct ScriptedRemote {
    draws: Mutex<VecDeque<Result<u32, DiceError>>>,
    calls: Mutex<usize>,
}

impl ScriptedRemote {
    pub fn new(draws: impl IntoIterator<Item = Result<u32, DiceError>>) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
            calls: Mutex::new(0),
        }
    }

    /// A source whose every draw fails.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl RemoteDiceSource for ScriptedRemote {
    fn draw_die(&self) -> Result<u32, DiceError> {
        *self.calls.lock() += 1;
        self.draws
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                Err(DiceError::RemoteFailure {
                    info: "service unavailable".to_owned(),
                })
            })
    }
}
