//! Bob Jenkins' ISAAC stream generator (32-bit, 256-word state).
//!
//! A native seed is replicated into every word of the seed array. A seed wider than
//! 32 bits is exported least-significant word first into the seed array and the
//! remainder is zero-filled.

use std::fmt;

use num_bigint::BigUint;

use crate::diagnostics::SeedReport;
use crate::die::draw_face;
use crate::generator::{DiceGenerator, RawRoll};
use crate::rng::WordSource;
use crate::seed::{key_words, Seed};
use crate::{DiceError, Variant};

const RAND_SIZE_LEN: usize = 8;
/// Words in the state and in each batch of results.
pub const RAND_SIZE: usize = 1 << RAND_SIZE_LEN;
const GOLDEN_RATIO: u32 = 0x9e37_79b9;

/// The raw ISAAC word generator.
#[derive(Clone, PartialEq, Eq)]
pub struct IsaacRng {
    rsl: [u32; RAND_SIZE],
    mem: [u32; RAND_SIZE],
    a: u32,
    b: u32,
    c: u32,
    cnt: usize,
}

#[inline]
fn mix(s: &mut [u32; 8]) {
    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *s;
    a ^= b << 11;
    d = d.wrapping_add(a);
    b = b.wrapping_add(c);
    b ^= c >> 2;
    e = e.wrapping_add(b);
    c = c.wrapping_add(d);
    c ^= d << 8;
    f = f.wrapping_add(c);
    d = d.wrapping_add(e);
    d ^= e >> 16;
    g = g.wrapping_add(d);
    e = e.wrapping_add(f);
    e ^= f << 10;
    h = h.wrapping_add(e);
    f = f.wrapping_add(g);
    f ^= g >> 4;
    a = a.wrapping_add(f);
    g = g.wrapping_add(h);
    g ^= h << 8;
    b = b.wrapping_add(g);
    h = h.wrapping_add(a);
    h ^= a >> 9;
    c = c.wrapping_add(h);
    a = a.wrapping_add(b);
    *s = [a, b, c, d, e, f, g, h];
}

impl IsaacRng {
    /// Initialises the state from a full seed array (`randinit` with the flag set).
    #[must_use]
    pub fn from_seed_words(seed: [u32; RAND_SIZE]) -> Self {
        let mut rng = Self {
            rsl: seed,
            mem: [0; RAND_SIZE],
            a: 0,
            b: 0,
            c: 0,
            cnt: 0,
        };
        rng.init();
        rng
    }

    fn init(&mut self) {
        let mut s = [GOLDEN_RATIO; 8];
        for _ in 0..4 {
            mix(&mut s);
        }

        for pass in 0..2 {
            for i in (0..RAND_SIZE).step_by(8) {
                let source = if pass == 0 { &self.rsl } else { &self.mem };
                for (k, word) in s.iter_mut().enumerate() {
                    *word = word.wrapping_add(source[i + k]);
                }
                mix(&mut s);
                self.mem[i..i + 8].copy_from_slice(&s);
            }
        }

        self.isaac();
        self.cnt = RAND_SIZE;
    }

    /// Refills `rsl` with the next 256 results.
    fn isaac(&mut self) {
        self.c = self.c.wrapping_add(1);
        self.b = self.b.wrapping_add(self.c);
        for i in 0..RAND_SIZE {
            let x = self.mem[i];
            self.a = match i % 4 {
                0 => self.a ^ (self.a << 13),
                1 => self.a ^ (self.a >> 6),
                2 => self.a ^ (self.a << 2),
                _ => self.a ^ (self.a >> 16),
            };
            self.a = self.mem[(i + RAND_SIZE / 2) % RAND_SIZE].wrapping_add(self.a);
            let y = self.mem[((x >> 2) as usize) & (RAND_SIZE - 1)]
                .wrapping_add(self.a)
                .wrapping_add(self.b);
            self.mem[i] = y;
            self.b = self.mem[((y >> (RAND_SIZE_LEN + 2)) as usize) & (RAND_SIZE - 1)]
                .wrapping_add(x);
            self.rsl[i] = self.b;
        }
    }

    /// Next output word; results are consumed from the end of each batch.
    pub fn next_word(&mut self) -> u32 {
        if self.cnt == 0 {
            self.isaac();
            self.cnt = RAND_SIZE;
        }
        self.cnt -= 1;
        self.rsl[self.cnt]
    }
}

impl fmt::Debug for IsaacRng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsaacRng")
            .field("cnt", &self.cnt)
            .finish_non_exhaustive()
    }
}

impl WordSource for IsaacRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }
}

/// ISAAC dice.
#[derive(Debug, Clone)]
pub struct IsaacGenerator {
    rng: IsaacRng,
    seed: BigUint,
}

impl IsaacGenerator {
    /// A generator seeded with `seed`.
    #[must_use]
    pub fn new(seed: &Seed) -> Self {
        Self {
            rng: Self::keyed(seed),
            seed: seed.value(),
        }
    }

    fn keyed(seed: &Seed) -> IsaacRng {
        let words = match seed.as_native() {
            Some(word) => [word; RAND_SIZE],
            None => {
                let mut words = [0u32; RAND_SIZE];
                words.copy_from_slice(&key_words(&seed.value(), RAND_SIZE));
                words
            }
        };
        IsaacRng::from_seed_words(words)
    }
}

impl Default for IsaacGenerator {
    fn default() -> Self {
        Self::new(&Seed::default())
    }
}

impl DiceGenerator for IsaacGenerator {
    fn variant(&self) -> Variant {
        Variant::Isaac
    }

    fn install_seed(&mut self, seed: &Seed) -> Result<(), DiceError> {
        self.rng = Self::keyed(seed);
        self.seed = seed.value();
        Ok(())
    }

    fn roll(&mut self) -> Result<RawRoll, DiceError> {
        let first = draw_face(&mut self.rng);
        let second = draw_face(&mut self.rng);
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

    // Start of randvect.txt: the second batch after randinit(TRUE) over a zero seed.
    #[test]
    fn test_zero_seed_golden() {
        let mut rng = IsaacRng::from_seed_words([0; RAND_SIZE]);
        for _ in 0..RAND_SIZE {
            rng.next_word();
        }
        let top = rng.next_word();
        assert_eq!(
            rng.rsl[..8],
            [
                0xf650_e4c8,
                0xe448_e96d,
                0x98db_2fb4,
                0xf5fa_d54f,
                0x433f_1afb,
                0xedec_154a,
                0xd837_0487,
                0x46ca_4f9a
            ]
        );
        assert_eq!(top, rng.rsl[RAND_SIZE - 1]);
    }

    #[test]
    fn test_batches_are_consumed_in_reverse() {
        let mut rng = IsaacRng::from_seed_words([7; RAND_SIZE]);
        let batch = rng.rsl;
        for i in (0..RAND_SIZE).rev() {
            assert_eq!(rng.next_word(), batch[i]);
        }
        // The next call starts a fresh batch
        let next = rng.next_word();
        assert_eq!(next, rng.rsl[RAND_SIZE - 1]);
    }

    #[test]
    fn test_native_seed_replicated() {
        let mut generator = IsaacGenerator::new(&Seed::Native(99));
        let mut rng = IsaacRng::from_seed_words([99; RAND_SIZE]);
        let roll = generator.roll().unwrap();
        assert_eq!(roll.dice[0], draw_face(&mut rng));
        assert_eq!(roll.dice[1], draw_face(&mut rng));
    }

    #[test]
    fn test_wide_seed_least_significant_first() {
        let value = (BigUint::from(2u32) << 32u32) + 1u32;
        let mut generator = IsaacGenerator::new(&Seed::Wide(value));
        let mut words = [0u32; RAND_SIZE];
        words[0] = 1;
        words[1] = 2;
        let mut rng = IsaacRng::from_seed_words(words);
        let roll = generator.roll().unwrap();
        assert_eq!(roll.dice, [draw_face(&mut rng), draw_face(&mut rng)]);
    }

    #[test]
    fn test_reseed_restarts_sequence() {
        let mut generator = IsaacGenerator::new(&Seed::Native(5));
        let first: Vec<_> = (0..10).map(|_| generator.roll().unwrap()).collect();
        generator.install_seed(&Seed::Native(5)).unwrap();
        let second: Vec<_> = (0..10).map(|_| generator.roll().unwrap()).collect();
        assert_eq!(first, second);
        assert_eq!(generator.seed_report(), SeedReport::Seed(BigUint::from(5u32)));
    }
}
