//! MT19937 Mersenne Twister.
//!
//! Native seeds use `init_genrand`; seeds wider than 32 bits are expanded into a
//! full 624-word key (least-significant word first, zero-padded or truncated) and
//! fed to `init_by_array`.

use std::fmt;

use num_bigint::BigUint;

use crate::diagnostics::SeedReport;
use crate::die::draw_face;
use crate::generator::{DiceGenerator, RawRoll};
use crate::rng::WordSource;
use crate::seed::{key_words, Seed};
use crate::{DiceError, Variant};

/// Degree of recurrence; also the key length used for wide seeds.
pub const STATE_WORDS: usize = 624;
const SHIFT_WORDS: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// Seed the reference implementation falls back to when never seeded.
pub const DEFAULT_SEED: u32 = 5489;

/// The raw MT19937 word generator.
#[derive(Clone, PartialEq, Eq)]
pub struct Mt19937 {
    state: [u32; STATE_WORDS],
    index: usize,
}

impl Mt19937 {
    /// Seeds from a single word.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        let mut state = [0u32; STATE_WORDS];
        state[0] = seed;
        for i in 1..STATE_WORDS {
            let prev = state[i - 1];
            state[i] = 1_812_433_253u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        Self {
            state,
            index: STATE_WORDS,
        }
    }

    /// Seeds from a key of any non-zero length.
    #[must_use]
    pub fn from_key(key: &[u32]) -> Self {
        let mut mt = Self::new(19_650_218);
        if key.is_empty() {
            return mt;
        }
        let s = &mut mt.state;
        let mut i = 1usize;
        let mut j = 0usize;
        for _ in 0..STATE_WORDS.max(key.len()) {
            let prev = s[i - 1];
            s[i] = (s[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_664_525))
                .wrapping_add(key[j])
                .wrapping_add(j as u32);
            i += 1;
            j += 1;
            if i >= STATE_WORDS {
                s[0] = s[STATE_WORDS - 1];
                i = 1;
            }
            if j >= key.len() {
                j = 0;
            }
        }
        for _ in 0..STATE_WORDS - 1 {
            let prev = s[i - 1];
            s[i] = (s[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_566_083_941))
                .wrapping_sub(i as u32);
            i += 1;
            if i >= STATE_WORDS {
                s[0] = s[STATE_WORDS - 1];
                i = 1;
            }
        }
        // MSB is 1, assuring a non-zero initial state
        s[0] = UPPER_MASK;
        mt
    }

    fn regenerate(&mut self) {
        for k in 0..STATE_WORDS {
            let y = (self.state[k] & UPPER_MASK) | (self.state[(k + 1) % STATE_WORDS] & LOWER_MASK);
            let mag = if y & 1 == 1 { MATRIX_A } else { 0 };
            self.state[k] = self.state[(k + SHIFT_WORDS) % STATE_WORDS] ^ (y >> 1) ^ mag;
        }
        self.index = 0;
    }

    /// Next tempered 32-bit output.
    pub fn next_word(&mut self) -> u32 {
        if self.index >= STATE_WORDS {
            self.regenerate();
        }
        let mut y = self.state[self.index];
        self.index += 1;
        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^= y >> 18;
        y
    }
}

impl Default for Mt19937 {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl fmt::Debug for Mt19937 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mt19937")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl WordSource for Mt19937 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }
}

/// The Twister die generator: MT19937 words through the die mapper.
#[derive(Debug, Clone)]
pub struct TwisterGenerator {
    mt: Mt19937,
    seed: BigUint,
}

impl TwisterGenerator {
    /// A generator seeded with `seed`.
    #[must_use]
    pub fn new(seed: &Seed) -> Self {
        let mut generator = Self {
            mt: Mt19937::default(),
            seed: BigUint::from(DEFAULT_SEED),
        };
        generator.reseed(seed);
        generator
    }

    fn reseed(&mut self, seed: &Seed) {
        self.mt = match seed.as_native() {
            Some(word) => Mt19937::new(word),
            None => Mt19937::from_key(&key_words(&seed.value(), STATE_WORDS)),
        };
        self.seed = seed.value();
    }
}

impl Default for TwisterGenerator {
    fn default() -> Self {
        Self::new(&Seed::Native(DEFAULT_SEED))
    }
}

impl DiceGenerator for TwisterGenerator {
    fn variant(&self) -> Variant {
        Variant::Twister
    }

    fn install_seed(&mut self, seed: &Seed) -> Result<(), DiceError> {
        self.reseed(seed);
        Ok(())
    }

    fn roll(&mut self) -> Result<RawRoll, DiceError> {
        let first = draw_face(&mut self.mt);
        let second = draw_face(&mut self.mt);
        Ok(RawRoll::new([first, second], 2))
    }

    fn seed_report(&self) -> SeedReport {
        SeedReport::Seed(self.seed.clone())
    }

    fn duplicate(&self) -> Result<Box<dyn DiceGenerator>, DiceError> {
        Ok(Box::new(self.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    // Reference outputs from mt19937ar.c
    #[test]
    fn test_default_seed_golden() {
        let mut mt = Mt19937::default();
        assert_eq!(mt.next_word(), 3_499_211_612);
        assert_eq!(mt.next_word(), 581_869_302);
        assert_eq!(mt.next_word(), 3_890_346_734);
    }

    #[test]
    fn test_init_by_array_golden() {
        let mut mt = Mt19937::from_key(&[0x123, 0x234, 0x345, 0x456]);
        let expected = [1_067_595_299u32, 955_945_823, 477_289_528, 4_107_218_783, 4_228_976_476];
        for &word in &expected {
            assert_eq!(mt.next_word(), word);
        }
    }

    #[test]
    fn test_state_survives_regeneration() {
        let mut a = Mt19937::new(1);
        let mut b = Mt19937::new(1);
        for _ in 0..(STATE_WORDS * 3) {
            assert_eq!(a.next_word(), b.next_word());
        }
    }

    #[test]
    fn test_native_seed_reproducible() {
        let mut a = TwisterGenerator::new(&Seed::Native(42));
        let mut b = TwisterGenerator::new(&Seed::Native(42));
        for _ in 0..100 {
            assert_eq!(a.roll().unwrap(), b.roll().unwrap());
        }
    }

    #[test]
    fn test_small_wide_seed_matches_native() {
        let mut native = TwisterGenerator::new(&Seed::Native(1234));
        let mut wide = TwisterGenerator::new(&Seed::Wide(BigUint::from(1234u32)));
        for _ in 0..20 {
            assert_eq!(native.roll().unwrap(), wide.roll().unwrap());
        }
    }

    #[test]
    fn test_wide_seed_uses_key_expansion() {
        let value = (BigUint::from(5u32) << 32u32) + 9u32;
        let mut generator = TwisterGenerator::new(&Seed::Wide(value.clone()));
        let mut expected = Mt19937::from_key(&key_words(&value, STATE_WORDS));

        let mut reference = Vec::new();
        while reference.len() < 2 {
            if let Some(face) = crate::die::face_from_word(expected.next_word()) {
                reference.push(face);
            }
        }
        assert_eq!(generator.roll().unwrap().dice.to_vec(), reference);
        assert_eq!(generator.seed_report(), SeedReport::Seed(value));
    }

    #[test]
    fn test_roll_counts_two_draws() {
        let mut generator = TwisterGenerator::default();
        let roll = generator.roll().unwrap();
        assert_eq!(roll.draws, 2);
        assert!(roll.dice.iter().all(|d| (1..=6).contains(d)));
    }
}
