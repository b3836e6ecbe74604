//! Blum-Blum-Shub: squaring modulo a Blum integer.
//!
//! Each bit is the low bit of `seed = seed² mod m`. A die consumes one uniform trit
//! (see [`TritMachine`]) and one further bit: `die = trit + 3 * bit + 1`.
//!
//! The generator must be given a modulus before it accepts a seed. Every installed
//! seed is validated against short squaring cycles; a seed that cannot be fixed
//! within [`SEED_ATTEMPTS`] increments leaves the generator degraded (seed register
//! clamped to 0) until it is reseeded.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::diagnostics::SeedReport;
use crate::generator::{DiceGenerator, RawRoll};
use crate::prime::{is_good_prime, next_good_prime, short_decimal};
use crate::seed::{parse_positive, Seed};
use crate::telemetry::{InvariantChecker, InvariantViolation};
use crate::{debug_check_invariants, DiceError, Variant};

/// How many successive seeds are tried before seeding gives up.
pub const SEED_ATTEMPTS: u32 = 32;
/// Squarings applied before the cycle check starts.
pub const WARMUP_SQUARINGS: u32 = 8;
/// Minimum cycle length a seed's orbit must have.
pub const MIN_CYCLE: u32 = 16;

/// Draws one uniform ternary digit from a stream of uniform bits.
///
/// Five states; the machine starts at state 0 and returns to it after each trit.
/// Every state has a terminating edge, and any odd-length prefix leaves exactly two
/// bit patterns unterminated, so the three outputs stay exactly balanced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TritMachine {
    state: u8,
}

impl TritMachine {
    /// A machine at the start state.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: 0 }
    }

    /// Feeds one bit; returns the trit when the machine terminates.
    pub fn step(&mut self, bit: bool) -> Option<u32> {
        let (next, out) = match (self.state, bit) {
            (0, false) => (1, None),
            (0, true) => (2, None),
            (1, false) => (0, Some(0)),
            (1, true) => (3, None),
            (2, false) => (4, None),
            (2, true) => (0, Some(2)),
            (3, false) => (1, None),
            (3, true) => (0, Some(1)),
            (4, false) => (0, Some(1)),
            (4, true) => (2, None),
            _ => (0, None),
        };
        self.state = next;
        out
    }

    /// Runs a fresh machine, pulling bits from `next_bit` until it yields a trit.
    pub fn trit<F: FnMut() -> bool>(mut next_bit: F) -> u32 {
        let mut machine = Self::new();
        loop {
            if let Some(trit) = machine.step(next_bit()) {
                return trit;
            }
        }
    }
}

/// The two factors behind a configured modulus, after any substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BbsFactors {
    /// First factor.
    pub p: BigUint,
    /// Second factor, distinct from `p`.
    pub q: BigUint,
}

impl BbsFactors {
    /// Parses two decimal factors, replacing any that is not a good prime (or a `q`
    /// equal to `p`) with the next good prime above it.
    ///
    /// # Errors
    /// [`DiceError::InvalidConfiguration`] if either string is not a positive integer.
    pub fn parse(p: &str, q: &str) -> Result<Self, DiceError> {
        let mut first = parse_positive(p, "Blum factor")?;
        let mut second = parse_positive(q, "Blum factor")?;

        if !is_good_prime(&first) {
            first = next_good_prime(&first);
            tracing::warn!(
                factor = p.trim(),
                replacement = %first,
                "invalid Blum factor, using the next good prime instead"
            );
        }
        if !is_good_prime(&second) || second == first {
            second = next_good_prime(&second);
            if second == first {
                second = next_good_prime(&second);
            }
            tracing::warn!(
                factor = q.trim(),
                replacement = %second,
                "invalid Blum factor, using the next good prime instead"
            );
        }
        Ok(Self {
            p: first,
            q: second,
        })
    }

    /// The modulus `p * q`.
    #[must_use]
    pub fn modulus(&self) -> BigUint {
        &self.p * &self.q
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeedState {
    Unseeded,
    Ready,
    Degraded,
}

/// Blum-Blum-Shub dice.
#[derive(Debug, Clone)]
pub struct BbsGenerator {
    modulus: Option<BigUint>,
    seed: BigUint,
    state: SeedState,
}

impl BbsGenerator {
    /// A generator with no modulus and no seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            modulus: None,
            seed: BigUint::zero(),
            state: SeedState::Unseeded,
        }
    }

    /// The configured modulus.
    #[must_use]
    pub fn modulus(&self) -> Option<&BigUint> {
        self.modulus.as_ref()
    }

    /// The live seed register.
    #[must_use]
    pub fn seed(&self) -> &BigUint {
        &self.seed
    }

    /// Whether the last seeding failed and the generator refuses to roll.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.state == SeedState::Degraded
    }

    /// Sets the modulus from a decimal string. The seed must be installed again.
    ///
    /// # Errors
    /// [`DiceError::InvalidConfiguration`] for a non-numeric or non-positive value;
    /// the previous modulus is kept.
    pub fn set_modulus(&mut self, text: &str) -> Result<(), DiceError> {
        let modulus = parse_positive(text, "modulus")?;
        self.apply_modulus(modulus);
        Ok(())
    }

    /// Sets the modulus from two candidate factors and returns the factors used.
    ///
    /// # Errors
    /// [`DiceError::InvalidConfiguration`] if either factor is not a positive integer.
    pub fn set_factors(&mut self, p: &str, q: &str) -> Result<BbsFactors, DiceError> {
        let factors = BbsFactors::parse(p, q)?;
        self.apply_modulus(factors.modulus());
        Ok(factors)
    }

    fn apply_modulus(&mut self, modulus: BigUint) {
        tracing::debug!(modulus = %short_decimal(&modulus), "BBS modulus configured");
        self.modulus = Some(modulus);
        if self.state == SeedState::Ready {
            // The old orbit says nothing about the new modulus
            self.state = SeedState::Unseeded;
        }
    }

    #[inline]
    fn next_bit(seed: &mut BigUint, modulus: &BigUint) -> bool {
        *seed = seed.modpow(&BigUint::from(2u32), modulus);
        seed.bit(0)
    }

    fn next_die(seed: &mut BigUint, modulus: &BigUint) -> u32 {
        let trit = TritMachine::trit(|| Self::next_bit(seed, modulus));
        trit + u32::from(Self::next_bit(seed, modulus)) * 3 + 1
    }

    /// Whether `seed`'s orbit returns to itself within [`MIN_CYCLE`] squarings
    /// after the warm-up.
    fn has_short_cycle(seed: &BigUint, modulus: &BigUint) -> bool {
        let two = BigUint::from(2u32);
        let mut z = seed.clone();
        for _ in 0..WARMUP_SQUARINGS {
            z = z.modpow(&two, modulus);
        }
        let cycle = z.clone();
        (0..MIN_CYCLE).any(|_| {
            z = z.modpow(&two, modulus);
            z == cycle
        })
    }

    fn fail_seeding(&mut self, original: &BigUint, modulus: &BigUint) -> DiceError {
        tracing::error!(
            seed = %short_decimal(original),
            modulus = %short_decimal(modulus),
            "invalid seed and/or modulus for Blum-Blum-Shub; reset the seed or modulus before continuing"
        );
        self.seed = BigUint::zero();
        self.state = SeedState::Degraded;
        DiceError::SeedingFailure {
            seed: original.to_string(),
            modulus: modulus.to_string(),
        }
    }

    fn validate_seed(&mut self, candidate: BigUint) -> Result<(), DiceError> {
        let Some(modulus) = self.modulus.clone() else {
            return Err(DiceError::InvalidConfiguration {
                info: "the Blum-Blum-Shub modulus must be set before seeding".to_owned(),
            });
        };
        if candidate.is_zero() {
            return Err(self.fail_seeding(&candidate, &modulus));
        }

        let mut seed = candidate.clone();
        for attempt in 0..SEED_ATTEMPTS {
            if !Self::has_short_cycle(&seed, &modulus) {
                if attempt > 0 {
                    tracing::info!(
                        requested = %short_decimal(&candidate),
                        adopted = %short_decimal(&seed),
                        "seed adjusted to avoid a short Blum-Blum-Shub cycle"
                    );
                }
                self.seed = seed;
                self.state = SeedState::Ready;
                debug_check_invariants!(self);
                return Ok(());
            }
            seed += 1u32;
        }
        Err(self.fail_seeding(&candidate, &modulus))
    }

    fn usable(&self) -> bool {
        !(self.seed.is_zero() || self.seed.is_one())
    }
}

impl Default for BbsGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantChecker for BbsGenerator {
    fn check_invariants(&self) -> Result<(), InvariantViolation> {
        match self.state {
            SeedState::Ready if self.modulus.is_none() => Err(InvariantViolation::new(
                "BbsGenerator",
                "seeded without a modulus",
            )),
            SeedState::Degraded if !self.seed.is_zero() => Err(InvariantViolation::new(
                "BbsGenerator",
                "degraded generator must hold the zero seed",
            )
            .with_details(format!("seed = {}", short_decimal(&self.seed)))),
            _ => Ok(()),
        }
    }
}

impl DiceGenerator for BbsGenerator {
    fn variant(&self) -> Variant {
        Variant::Bbs
    }

    fn install_seed(&mut self, seed: &Seed) -> Result<(), DiceError> {
        self.validate_seed(seed.value())
    }

    fn roll(&mut self) -> Result<RawRoll, DiceError> {
        let Some(modulus) = self.modulus.as_ref() else {
            return Err(DiceError::InvalidConfiguration {
                info: "the Blum-Blum-Shub modulus is not set".to_owned(),
            });
        };
        if self.state != SeedState::Ready || !self.usable() {
            let modulus = modulus.clone();
            let seed = self.seed.clone();
            return Err(self.fail_seeding(&seed, &modulus));
        }
        let first = Self::next_die(&mut self.seed, modulus);
        let second = Self::next_die(&mut self.seed, modulus);
        Ok(RawRoll::new([first, second], 2))
    }

    fn seed_report(&self) -> SeedReport {
        SeedReport::Bbs {
            seed: self.seed.clone(),
            modulus: self.modulus.clone(),
        }
    }

    fn duplicate(&self) -> Result<Box<dyn DiceGenerator>, DiceError> {
        Ok(Box::new(self.clone()))
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_trit_machine_outputs_in_range(bits in prop::collection::vec(any::<bool>(), 1..128)) {
            let mut machine = TritMachine::new();
            let mut pending = 0u32;
            for bit in bits {
                pending += 1;
                if let Some(trit) = machine.step(bit) {
                    prop_assert!(trit < 3);
                    prop_assert!(pending >= 2);
                    prop_assert_eq!(machine, TritMachine::new());
                    pending = 0;
                }
            }
        }

        #[test]
        fn prop_seeded_generator_stays_valid(seed in 2u32..10_000) {
            let mut generator = BbsGenerator::new();
            generator.set_modulus("437").unwrap();
            if generator.install_seed(&Seed::Native(seed)).is_ok() {
                let roll = generator.roll().unwrap();
                prop_assert!(roll.dice.iter().all(|d| (1..=6).contains(d)));
            } else {
                prop_assert!(generator.is_degraded());
            }
        }
    }
}
