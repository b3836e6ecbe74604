//! The contract every die-generation algorithm implements.

use std::fmt;

use crate::diagnostics::SeedReport;
use crate::seed::Seed;
use crate::{DiceError, Variant};

/// Value a mechanism reports for a die it could not produce.
///
/// Any value outside `1..=6` is treated the same way by the context; this is the
/// one the built-in generators use.
pub const FAILED_DIE: u32 = 0;

/// The unvalidated output of one roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRoll {
    /// The two dice as produced; either may be out of range.
    pub dice: [u32; 2],
    /// How many dice this roll consumed from the source, added to the call counter.
    pub draws: u64,
}

impl RawRoll {
    /// A roll that consumed `draws` dice.
    #[must_use]
    pub const fn new(dice: [u32; 2], draws: u64) -> Self {
        Self { dice, draws }
    }

    /// A roll where both dice failed.
    #[must_use]
    pub const fn failed(draws: u64) -> Self {
        Self {
            dice: [FAILED_DIE, FAILED_DIE],
            draws,
        }
    }
}

/// One die-generation algorithm with its private state.
///
/// A [`DiceContext`](crate::DiceContext) owns one boxed generator per variant it has
/// used and dispatches to the active one.
pub trait DiceGenerator: fmt::Debug + Send {
    /// The variant this generator implements.
    fn variant(&self) -> Variant;

    /// Installs a seed. Generators without a seed accept and ignore it.
    ///
    /// # Errors
    /// - [`DiceError::InvalidConfiguration`] if the generator cannot be seeded yet;
    ///   its state is unchanged.
    /// - [`DiceError::SeedingFailure`] if seeding was attempted and left the
    ///   generator unusable.
    fn install_seed(&mut self, seed: &Seed) -> Result<(), DiceError>;

    /// Produces the next pair of dice without range validation.
    ///
    /// An `Err` means no pair could be produced at all; the context treats it like a
    /// malformed pair, except for [`DiceError::ManualEntryCancelled`], which is
    /// returned to the caller.
    fn roll(&mut self) -> Result<RawRoll, DiceError>;

    /// Describes the current seed for operator display.
    fn seed_report(&self) -> SeedReport;

    /// Releases any external resource. The generator's other state is kept, and
    /// closing twice is harmless.
    fn close(&mut self) {}

    /// Makes an independent copy, re-acquiring any external resource.
    fn duplicate(&self) -> Result<Box<dyn DiceGenerator>, DiceError>;
}
