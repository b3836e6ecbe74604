//! Dice drawn one at a time from a remote true-random service.

use std::fmt;
use std::sync::Arc;

use crate::diagnostics::SeedReport;
use crate::die::is_face;
use crate::generator::{DiceGenerator, RawRoll, FAILED_DIE};
use crate::seed::Seed;
use crate::{DiceError, Variant};

/// A network collaborator returning one die per call.
///
/// Timeouts, batching and cancellation are the implementation's concern.
pub trait RemoteDiceSource: Send + Sync {
    /// Fetches one die in `1..=6`.
    ///
    /// # Errors
    /// [`DiceError::RemoteFailure`] when the service cannot supply a die.
    fn draw_die(&self) -> Result<u32, DiceError>;
}

/// Dice from a [`RemoteDiceSource`].
///
/// A failed draw becomes [`FAILED_DIE`]. When the first die fails the second is not
/// requested.
#[derive(Clone, Default)]
pub struct RemoteGenerator {
    source: Option<Arc<dyn RemoteDiceSource>>,
}

impl RemoteGenerator {
    /// A generator drawing from `source`.
    #[must_use]
    pub fn new(source: Arc<dyn RemoteDiceSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    fn draw(source: &dyn RemoteDiceSource) -> u32 {
        match source.draw_die() {
            Ok(die) => die,
            Err(err) => {
                tracing::warn!(error = %err, "remote dice source failed");
                FAILED_DIE
            }
        }
    }
}

impl fmt::Debug for RemoteGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteGenerator")
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

impl DiceGenerator for RemoteGenerator {
    fn variant(&self) -> Variant {
        Variant::Remote
    }

    fn install_seed(&mut self, _seed: &Seed) -> Result<(), DiceError> {
        Ok(())
    }

    fn roll(&mut self) -> Result<RawRoll, DiceError> {
        let Some(source) = self.source.as_deref() else {
            tracing::warn!("remote dice selected without a service");
            return Ok(RawRoll::failed(0));
        };
        let first = Self::draw(source);
        if !is_face(first) {
            return Ok(RawRoll::new([first, first], 1));
        }
        let second = Self::draw(source);
        Ok(RawRoll::new([first, second], 2))
    }

    fn seed_report(&self) -> SeedReport {
        SeedReport::NotApplicable
    }

    fn duplicate(&self) -> Result<Box<dyn DiceGenerator>, DiceError> {
        Ok(Box::new(self.clone()))
    }
}
