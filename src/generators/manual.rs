//! Dice typed in by the operator.

use std::fmt;
use std::sync::Arc;

use crate::diagnostics::SeedReport;
use crate::generator::{DiceGenerator, RawRoll};
use crate::seed::Seed;
use crate::{DiceError, Variant};

/// Interactive provider of manually entered dice.
///
/// Implementations prompt the operator and validate the entry themselves; the
/// context still range-checks the result.
pub trait ManualDiceSource: Send + Sync {
    /// Asks for one pair of dice.
    ///
    /// # Errors
    /// [`DiceError::ManualEntryCancelled`] when the operator dismisses the prompt.
    fn enter_dice(&self) -> Result<[u32; 2], DiceError>;
}

/// Dice supplied by a [`ManualDiceSource`].
#[derive(Clone, Default)]
pub struct ManualGenerator {
    source: Option<Arc<dyn ManualDiceSource>>,
}

impl ManualGenerator {
    /// A generator asking `source` for every roll.
    #[must_use]
    pub fn new(source: Arc<dyn ManualDiceSource>) -> Self {
        Self {
            source: Some(source),
        }
    }
}

impl fmt::Debug for ManualGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualGenerator")
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

impl DiceGenerator for ManualGenerator {
    fn variant(&self) -> Variant {
        Variant::Manual
    }

    fn install_seed(&mut self, _seed: &Seed) -> Result<(), DiceError> {
        Ok(())
    }

    fn roll(&mut self) -> Result<RawRoll, DiceError> {
        match &self.source {
            Some(source) => source.enter_dice().map(|dice| RawRoll::new(dice, 2)),
            None => {
                tracing::warn!("manual dice selected without an entry provider");
                Ok(RawRoll::failed(0))
            }
        }
    }

    fn seed_report(&self) -> SeedReport {
        SeedReport::NotApplicable
    }

    fn duplicate(&self) -> Result<Box<dyn DiceGenerator>, DiceError> {
        Ok(Box::new(self.clone()))
    }
}
