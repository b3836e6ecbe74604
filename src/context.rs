//! The dice context: one independent random stream.
//!
//! A [`DiceContext`] owns one generator per variant it has used. Exactly one of them
//! is active; the others keep their state while dormant, except that switching away
//! from a variant releases its external resources (an open dice file).
//!
//! # Example
//!
//! ```
//! use dice_engine::{DiceContext, Variant};
//!
//! let mut ctx = DiceContext::new(Variant::Isaac);
//! ctx.install_seed(2024).unwrap();
//! let first: Vec<_> = (0..5).map(|_| ctx.roll().unwrap()).collect();
//!
//! ctx.install_seed(2024).unwrap();
//! let again: Vec<_> = (0..5).map(|_| ctx.roll().unwrap()).collect();
//! assert_eq!(first, again);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use num_bigint::BigUint;

use crate::diagnostics::{CounterReport, SeedReport};
use crate::die::is_face;
use crate::generator::DiceGenerator;
use crate::generators::bbs::{BbsFactors, BbsGenerator};
use crate::generators::file_replay::FileReplayGenerator;
use crate::generators::hash_chain::HashChainGenerator;
use crate::generators::isaac::IsaacGenerator;
use crate::generators::manual::{ManualDiceSource, ManualGenerator};
use crate::generators::remote::{RemoteDiceSource, RemoteGenerator};
use crate::generators::twister::TwisterGenerator;
use crate::seed::{acquire_system_seed, Seed, SystemSeed};
use crate::telemetry::{ViolationKind, ViolationObserver, ViolationSeverity};
use crate::{report_violation_to, DiceError, Variant};

/// A validated pair of dice, each in `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Roll([u8; 2]);

impl Roll {
    /// Validates a raw pair.
    #[must_use]
    pub fn from_raw(dice: [u32; 2]) -> Option<Self> {
        match dice {
            [a, b] if is_face(a) && is_face(b) => Some(Self([a as u8, b as u8])),
            _ => None,
        }
    }

    /// The two dice.
    #[must_use]
    pub const fn dice(&self) -> [u8; 2] {
        self.0
    }

    /// Whether both dice show the same face.
    #[must_use]
    pub const fn is_double(&self) -> bool {
        self.0[0] == self.0[1]
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0[0], self.0[1])
    }
}

fn violation_kind(err: &DiceError) -> ViolationKind {
    match err {
        DiceError::InvalidConfiguration { .. } => ViolationKind::Configuration,
        DiceError::SeedingFailure { .. } => ViolationKind::Seeding,
        DiceError::SourceExhausted { .. } | DiceError::Io { .. } => {
            ViolationKind::SourceExhausted
        }
        DiceError::RemoteFailure { .. } => ViolationKind::RemoteFailure,
        DiceError::MalformedRoll { .. } => ViolationKind::MalformedRoll,
        DiceError::ManualEntryCancelled => ViolationKind::InternalError,
    }
}

/// Mutable state for one independent dice stream.
///
/// Contexts are `Send` but are meant to be driven by one caller at a time; use one
/// context per concurrent stream.
pub struct DiceContext {
    active: Variant,
    slots: BTreeMap<Variant, Box<dyn DiceGenerator>>,
    /// Last seed installed; `None` until the first seeding.
    seed: Option<Seed>,
    /// Dice produced since the last reseed.
    calls: u64,
    observer: Option<Arc<dyn ViolationObserver>>,
    manual: Option<Arc<dyn ManualDiceSource>>,
    remote: Option<Arc<dyn RemoteDiceSource>>,
}

impl DiceContext {
    /// A context with `variant` active and nothing seeded.
    ///
    /// Native generators behave as if given their reference default seed until
    /// [`install_seed`](Self::install_seed) is called.
    #[must_use]
    pub fn new(variant: Variant) -> Self {
        let mut ctx = Self {
            active: variant,
            slots: BTreeMap::new(),
            seed: None,
            calls: 0,
            observer: None,
            manual: None,
            remote: None,
        };
        ctx.ensure_slot(variant);
        ctx
    }

    /// A context with `variant` active, seeded from system entropy.
    ///
    /// The returned flag is `true` when genuine entropy was used and `false` when the
    /// clock fallback was needed.
    ///
    /// # Errors
    /// Whatever [`install_seed`](Self::install_seed) reports, e.g. a BBS context
    /// without a modulus.
    pub fn with_system_seed(variant: Variant) -> Result<(Self, bool), DiceError> {
        let mut ctx = Self::new(variant);
        let system = ctx.acquire_system_seed()?;
        Ok((ctx, system.from_entropy))
    }

    /// Routes this context's violation reports to `observer` instead of `tracing`.
    #[must_use]
    pub fn with_violation_observer(mut self, observer: Arc<dyn ViolationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The active variant.
    #[must_use]
    pub fn active_variant(&self) -> Variant {
        self.active
    }

    /// The last installed seed.
    #[must_use]
    pub fn seed(&self) -> Option<&Seed> {
        self.seed.as_ref()
    }

    /// The low 32 bits of the last installed seed, or 0.
    #[must_use]
    pub fn native_seed(&self) -> u32 {
        self.seed.as_ref().map_or(0, Seed::low_word)
    }

    /// Dice produced since the last reseed.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls
    }

    fn new_generator(
        variant: Variant,
        seed: Option<&Seed>,
        manual: Option<&Arc<dyn ManualDiceSource>>,
        remote: Option<&Arc<dyn RemoteDiceSource>>,
    ) -> Box<dyn DiceGenerator> {
        match variant {
            Variant::Bbs => Box::new(BbsGenerator::new()),
            Variant::Isaac => Box::new(seed.map_or_else(IsaacGenerator::default, IsaacGenerator::new)),
            Variant::HashChain => {
                Box::new(seed.map_or_else(HashChainGenerator::default, HashChainGenerator::new))
            }
            Variant::Twister => {
                Box::new(seed.map_or_else(TwisterGenerator::default, TwisterGenerator::new))
            }
            Variant::Manual => Box::new(
                manual.map_or_else(ManualGenerator::default, |m| ManualGenerator::new(m.clone())),
            ),
            Variant::Remote => Box::new(
                remote.map_or_else(RemoteGenerator::default, |r| RemoteGenerator::new(r.clone())),
            ),
            Variant::FileReplay => Box::new(FileReplayGenerator::default()),
        }
    }

    fn ensure_slot(&mut self, variant: Variant) -> &mut Box<dyn DiceGenerator> {
        let Self {
            slots,
            seed,
            manual,
            remote,
            ..
        } = self;
        slots.entry(variant).or_insert_with(|| {
            tracing::trace!(%variant, "creating generator");
            Self::new_generator(variant, seed.as_ref(), manual.as_ref(), remote.as_ref())
        })
    }

    /// Makes `variant` active. Switching away releases the old generator's external
    /// resources; its other state is kept for when it is selected again.
    pub fn select_variant(&mut self, variant: Variant) {
        if variant != self.active {
            if let Some(old) = self.slots.get_mut(&self.active) {
                old.close();
            }
            tracing::debug!(from = %self.active, to = %variant, "dice generator selected");
            self.active = variant;
        }
        self.ensure_slot(variant);
    }

    /// Puts `generator` in the slot for its variant and returns the one it replaces.
    ///
    /// The active variant is unchanged.
    pub fn replace_generator(
        &mut self,
        generator: Box<dyn DiceGenerator>,
    ) -> Option<Box<dyn DiceGenerator>> {
        let mut old = self.slots.insert(generator.variant(), generator);
        if let Some(old) = old.as_mut() {
            old.close();
        }
        old
    }

    /// Uses `source` for manual entry and makes [`Variant::Manual`] active.
    pub fn use_manual_entry(&mut self, source: Arc<dyn ManualDiceSource>) {
        self.manual = Some(source.clone());
        self.replace_generator(Box::new(ManualGenerator::new(source)));
        self.select_variant(Variant::Manual);
    }

    /// Uses `source` for remote draws, makes [`Variant::Remote`] active and starts a
    /// new batch count.
    pub fn use_remote_source(&mut self, source: Arc<dyn RemoteDiceSource>) {
        self.remote = Some(source.clone());
        self.replace_generator(Box::new(RemoteGenerator::new(source)));
        self.select_variant(Variant::Remote);
        self.calls = 0;
    }

    /// Opens a dice file and makes [`Variant::FileReplay`] active.
    ///
    /// # Errors
    /// [`DiceError::Io`] if the file cannot be opened; the context is unchanged.
    pub fn open_dice_file(&mut self, path: impl AsRef<Path>) -> Result<(), DiceError> {
        let generator = FileReplayGenerator::open(path)?;
        self.install_file_replay(generator);
        Ok(())
    }

    /// Replays `bytes` as if read from a dice file named `label`.
    pub fn load_dice_sequence(&mut self, bytes: impl Into<Vec<u8>>, label: impl Into<String>) {
        self.install_file_replay(FileReplayGenerator::from_bytes(bytes, label));
    }

    fn install_file_replay(&mut self, generator: FileReplayGenerator) {
        self.replace_generator(Box::new(generator));
        self.select_variant(Variant::FileReplay);
        self.calls = 0;
    }

    /// Sets the BBS modulus from a decimal string and makes [`Variant::Bbs`] active.
    ///
    /// If a seed has been installed before, it is validated against the new modulus.
    ///
    /// # Errors
    /// - [`DiceError::InvalidConfiguration`] for a non-numeric or non-positive value;
    ///   the context is unchanged.
    /// - [`DiceError::SeedingFailure`] if the current seed is unusable with the new
    ///   modulus.
    pub fn set_bbs_modulus(&mut self, modulus: &str) -> Result<(), DiceError> {
        let mut generator = BbsGenerator::new();
        generator.set_modulus(modulus)?;
        self.install_bbs(generator)
    }

    /// Sets the BBS modulus from two candidate prime factors and makes
    /// [`Variant::Bbs`] active. Returns the factors actually used.
    ///
    /// # Errors
    /// As for [`set_bbs_modulus`](Self::set_bbs_modulus).
    pub fn set_bbs_factors(&mut self, p: &str, q: &str) -> Result<BbsFactors, DiceError> {
        let mut generator = BbsGenerator::new();
        let factors = generator.set_factors(p, q)?;
        self.install_bbs(generator)?;
        Ok(factors)
    }

    fn install_bbs(&mut self, generator: BbsGenerator) -> Result<(), DiceError> {
        self.replace_generator(Box::new(generator));
        self.select_variant(Variant::Bbs);
        match self.seed.clone() {
            Some(seed) => self.apply_seed(seed),
            None => Ok(()),
        }
    }

    /// Seeds the active generator with a 32-bit value and resets the call counter.
    ///
    /// # Errors
    /// - [`DiceError::InvalidConfiguration`] if the active generator cannot take a seed
    ///   yet (BBS without a modulus); nothing changes.
    /// - [`DiceError::SeedingFailure`] if BBS found no usable seed; the generator
    ///   refuses to roll until reseeded.
    pub fn install_seed(&mut self, seed: u32) -> Result<(), DiceError> {
        self.apply_seed(Seed::Native(seed))
    }

    /// Seeds the active generator with a value of any width.
    ///
    /// # Errors
    /// As for [`install_seed`](Self::install_seed).
    pub fn install_seed_extended(&mut self, seed: BigUint) -> Result<(), DiceError> {
        self.apply_seed(Seed::Wide(seed))
    }

    /// Seeds the active generator from a non-negative decimal string.
    ///
    /// # Errors
    /// [`DiceError::InvalidConfiguration`] for a malformed string, otherwise as for
    /// [`install_seed`](Self::install_seed).
    pub fn install_seed_decimal(&mut self, seed: &str) -> Result<(), DiceError> {
        self.apply_seed(Seed::parse_decimal(seed)?)
    }

    /// Seeds the active generator from system entropy, falling back to the clock.
    ///
    /// # Errors
    /// As for [`install_seed`](Self::install_seed).
    pub fn acquire_system_seed(&mut self) -> Result<SystemSeed, DiceError> {
        let system = acquire_system_seed();
        tracing::info!(from_entropy = system.from_entropy, "installing system seed");
        self.apply_seed(system.seed.clone())?;
        Ok(system)
    }

    /// Installs any [`Seed`].
    ///
    /// # Errors
    /// As for [`install_seed`](Self::install_seed).
    pub fn apply_seed(&mut self, seed: Seed) -> Result<(), DiceError> {
        let active = self.active;
        let result = self.ensure_slot(active).install_seed(&seed);
        match &result {
            Err(err @ DiceError::InvalidConfiguration { .. }) => {
                tracing::debug!(%active, error = %err, "seed rejected");
                return result;
            }
            Err(err) => {
                report_violation_to!(
                    self.observer,
                    variant = active;
                    ViolationSeverity::Error,
                    violation_kind(err),
                    "{}",
                    err
                );
            }
            Ok(()) => tracing::debug!(%active, "seed installed"),
        }
        self.seed = Some(seed);
        self.calls = 0;
        result
    }

    /// One attempt with the active generator; counts the dice it consumed.
    fn roll_once(&mut self) -> Result<Roll, DiceError> {
        let variant = self.active;
        let raw = self.ensure_slot(variant).roll()?;
        self.calls += raw.draws;
        Roll::from_raw(raw.dice).ok_or(DiceError::MalformedRoll {
            variant,
            dice: raw.dice,
        })
    }

    /// Rolls two dice.
    ///
    /// If the active generator fails or produces a die outside `1..=6`, the failure is
    /// reported, the Twister becomes the active variant and the roll is retried once.
    ///
    /// # Errors
    /// - [`DiceError::ManualEntryCancelled`] if the operator dismissed manual entry.
    /// - [`DiceError::MalformedRoll`] if the Twister fallback also failed.
    pub fn roll(&mut self) -> Result<Roll, DiceError> {
        let failed = self.active;
        let err = match self.roll_once() {
            Ok(roll) => return Ok(roll),
            Err(DiceError::ManualEntryCancelled) => return Err(DiceError::ManualEntryCancelled),
            Err(err) => err,
        };
        if !matches!(err, DiceError::MalformedRoll { .. }) {
            report_violation_to!(
                self.observer,
                variant = failed;
                ViolationSeverity::Warning,
                violation_kind(&err),
                "{}",
                err
            );
        }
        report_violation_to!(
            self.observer,
            variant = failed;
            ViolationSeverity::Error,
            ViolationKind::MalformedRoll,
            "dice generator isn't working ({}), falling back to {}",
            err,
            Variant::Twister.name()
        );
        self.select_variant(Variant::Twister);

        match self.roll_once() {
            Ok(roll) => Ok(roll),
            Err(err) => {
                report_violation_to!(
                    self.observer,
                    variant = Variant::Twister;
                    ViolationSeverity::Critical,
                    ViolationKind::MalformedRoll,
                    "fallback generator failed as well: {}",
                    err
                );
                Err(match err {
                    malformed @ DiceError::MalformedRoll { .. } => malformed,
                    _ => DiceError::MalformedRoll {
                        variant: Variant::Twister,
                        dice: [0, 0],
                    },
                })
            }
        }
    }

    /// Describes the active generator's seed.
    #[must_use]
    pub fn report_seed(&self) -> SeedReport {
        self.slots
            .get(&self.active)
            .map_or(SeedReport::NotApplicable, |generator| generator.seed_report())
    }

    /// The call counter phrased for the active variant, or `None` for the Twister and
    /// manual entry.
    #[must_use]
    pub fn report_counter(&self) -> Option<CounterReport> {
        CounterReport::for_variant(self.active, self.calls)
    }

    /// An independent copy of this context.
    ///
    /// Every generator is deep-copied; an open dice file is re-opened at the same
    /// position. Manual and remote collaborators are shared.
    ///
    /// # Errors
    /// [`DiceError::Io`] if a dice file cannot be re-opened.
    pub fn duplicate(&self) -> Result<Self, DiceError> {
        let slots = self
            .slots
            .iter()
            .map(|(variant, generator)| Ok((*variant, generator.duplicate()?)))
            .collect::<Result<BTreeMap<_, _>, DiceError>>()?;
        Ok(Self {
            active: self.active,
            slots,
            seed: self.seed.clone(),
            calls: self.calls,
            observer: self.observer.clone(),
            manual: self.manual.clone(),
            remote: self.remote.clone(),
        })
    }

    /// Releases every resource held by the context.
    pub fn destroy(self) {
        tracing::debug!(generators = self.slots.len(), "dice context destroyed");
    }
}

impl Default for DiceContext {
    fn default() -> Self {
        Self::new(Variant::default())
    }
}

impl Drop for DiceContext {
    fn drop(&mut self) {
        for generator in self.slots.values_mut() {
            generator.close();
        }
    }
}

impl fmt::Debug for DiceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            active,
            slots,
            seed,
            calls,
            observer,
            manual,
            remote,
        } = self;

        f.debug_struct("DiceContext")
            .field("active", active)
            .field("slots", slots)
            .field("seed", seed)
            .field("calls", calls)
            .field("has_observer", &observer.is_some())
            .field("has_manual", &manual.is_some())
            .field("has_remote", &remote.is_some())
            .finish()
    }
}
