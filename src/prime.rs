//! Probabilistic primality and Blum "good prime" selection for BBS moduli.
//!
//! A good prime is congruent to 3 modulo 4, at least 19, and passes
//! [`MILLER_RABIN_ROUNDS`] rounds of Miller-Rabin. Witnesses come from a PCG32
//! stream keyed on the candidate, so a given candidate always gets the same verdict.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};

use crate::rng::{Pcg32, WordSource};

/// Number of Miller-Rabin rounds used when validating factors.
pub const MILLER_RABIN_ROUNDS: u32 = 10;

/// Smallest acceptable BBS factor.
pub const MIN_GOOD_PRIME: u32 = 19;

const SMALL_PRIMES: [u32; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Returns `true` if `n` is probably prime after `rounds` Miller-Rabin rounds.
///
/// Composite numbers are rejected with error probability at most 4^-rounds.
#[must_use]
pub fn is_probable_prime(n: &BigUint, rounds: u32) -> bool {
    let two = BigUint::from(2u32);
    if *n < two {
        return false;
    }
    for &p in &SMALL_PRIMES {
        let p = BigUint::from(p);
        if *n == p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    let one = BigUint::one();
    let n_minus_one = n - &one;
    let shift = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> shift;

    let mut witnesses = Pcg32::seed_from_u64(n.iter_u64_digits().next().unwrap_or(0));
    // n > 97 here, so the witness range [2, n-2] is non-empty
    let span = n - BigUint::from(3u32);

    'rounds: for _ in 0..rounds {
        let a = random_below(&mut witnesses, &span) + &two;
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..shift {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'rounds;
            }
            if x == one {
                return false;
            }
        }
        return false;
    }
    true
}

/// Whether `x` is usable as a Blum-Blum-Shub factor.
#[must_use]
pub fn is_good_prime(x: &BigUint) -> bool {
    x.to_u32_digits().first().is_some_and(|low| low & 3 == 3)
        && *x >= BigUint::from(MIN_GOOD_PRIME)
        && is_probable_prime(x, MILLER_RABIN_ROUNDS)
}

/// Advances `x` by one at least once, then until it is a good prime.
///
/// Terminates because there are infinitely many primes congruent to 3 mod 4.
#[must_use]
pub fn next_good_prime(x: &BigUint) -> BigUint {
    let mut candidate = x + 1u32;
    while !is_good_prime(&candidate) {
        candidate += 1u32;
    }
    candidate
}

/// Uniform-ish value in `[0, bound)`; `bound` must be non-zero.
fn random_below<W: WordSource + ?Sized>(source: &mut W, bound: &BigUint) -> BigUint {
    // Draw 64 extra bits so the modulo bias is negligible
    let bytes = (bound.bits() / 8 + 9) as usize;
    let mut buf = vec![0u8; bytes];
    source.fill_bytes(&mut buf);
    BigUint::from_bytes_le(&buf).mod_floor(bound)
}

/// Best-effort decimal rendering of small values in log messages.
pub(crate) fn short_decimal(x: &BigUint) -> String {
    x.to_u64()
        .map_or_else(|| format!("{} bits", x.bits()), |v| v.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_small_primes_and_composites() {
        let primes = [2u64, 3, 5, 97, 101, 7919, 104_729];
        for p in primes {
            assert!(is_probable_prime(&big(p), MILLER_RABIN_ROUNDS), "{p}");
        }
        let composites = [0u64, 1, 4, 9, 561, 1105, 7917, 104_730];
        for c in composites {
            assert!(!is_probable_prime(&big(c), MILLER_RABIN_ROUNDS), "{c}");
        }
    }

    #[test]
    fn test_strong_pseudoprime_rejected() {
        // Strong pseudoprime to bases 2, 3, 5 and 7
        assert!(!is_probable_prime(
            &big(3_215_031_751),
            MILLER_RABIN_ROUNDS
        ));
        // Mersenne prime 2^61 - 1
        assert!(is_probable_prime(&big((1 << 61) - 1), MILLER_RABIN_ROUNDS));
    }

    #[test]
    fn test_good_prime_rules() {
        assert!(!is_good_prime(&big(7)), "below 19");
        assert!(is_good_prime(&big(19)));
        assert!(is_good_prime(&big(23)));
        assert!(!is_good_prime(&big(29)), "29 = 1 mod 4");
        assert!(!is_good_prime(&big(27)), "composite");
        assert!(!is_good_prime(&big(0)));
    }

    #[test]
    fn test_next_good_prime_advances() {
        assert_eq!(next_good_prime(&big(4)), big(19));
        assert_eq!(next_good_prime(&big(19)), big(23));
        assert_eq!(next_good_prime(&big(23)), big(31));
        assert_eq!(next_good_prime(&big(1000)), big(1019));
    }

    #[test]
    fn test_verdict_is_deterministic() {
        let n = "170141183460469231731687303715884105727".parse::<BigUint>().unwrap();
        assert!(is_probable_prime(&n, MILLER_RABIN_ROUNDS));
        assert!(is_probable_prime(&n, MILLER_RABIN_ROUNDS));
    }

    #[test]
    fn test_short_decimal() {
        assert_eq!(short_decimal(&big(437)), "437");
        assert_eq!(short_decimal(&(big(1) << 80u32)), "81 bits");
    }
}
