//! Seed values and system entropy acquisition.

use std::fmt;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use web_time::SystemTime;

use crate::DiceError;

/// Number of entropy bytes requested from the platform (512 bits).
pub const SYSTEM_ENTROPY_BYTES: usize = 64;

/// A seed for a native generator: a machine word or an arbitrary-precision value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Seed {
    /// A 32-bit seed.
    Native(u32),
    /// A seed of any width.
    Wide(BigUint),
}

impl Seed {
    /// Parses a non-negative decimal string.
    ///
    /// The result is always [`Seed::Wide`]. A value that fits in 32 bits still
    /// behaves exactly like the equal [`Seed::Native`] in every generator.
    pub fn parse_decimal(text: &str) -> Result<Self, DiceError> {
        parse_positive_or_zero(text, "seed").map(Self::Wide)
    }

    /// The full seed value.
    #[must_use]
    pub fn value(&self) -> BigUint {
        match self {
            Self::Native(n) => BigUint::from(*n),
            Self::Wide(n) => n.clone(),
        }
    }

    /// The value if it fits in 32 bits.
    #[must_use]
    pub fn as_native(&self) -> Option<u32> {
        match self {
            Self::Native(n) => Some(*n),
            Self::Wide(n) => n.to_u32(),
        }
    }

    /// The low 32 bits of the seed.
    #[must_use]
    pub fn low_word(&self) -> u32 {
        match self {
            Self::Native(n) => *n,
            Self::Wide(n) => n.iter_u32_digits().next().unwrap_or(0),
        }
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::Native(0)
    }
}

impl From<u32> for Seed {
    fn from(n: u32) -> Self {
        Self::Native(n)
    }
}

impl From<BigUint> for Seed {
    fn from(n: BigUint) -> Self {
        Self::Wide(n)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(n) => write!(f, "{}", n),
            Self::Wide(n) => write!(f, "{}", n),
        }
    }
}

/// Parses a decimal string into a big integer; `what` names the field in errors.
pub(crate) fn parse_positive_or_zero(text: &str, what: &str) -> Result<BigUint, DiceError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DiceError::InvalidConfiguration {
            info: format!("{} '{}' is not a non-negative decimal integer", what, text),
        });
    }
    BigUint::parse_bytes(trimmed.as_bytes(), 10).ok_or_else(|| DiceError::InvalidConfiguration {
        info: format!("{} '{}' is not a non-negative decimal integer", what, text),
    })
}

/// Parses a decimal string that must be strictly positive.
pub(crate) fn parse_positive(text: &str, what: &str) -> Result<BigUint, DiceError> {
    let value = parse_positive_or_zero(text, what)?;
    if value.is_zero() {
        return Err(DiceError::InvalidConfiguration {
            info: format!("{} must be positive", what),
        });
    }
    Ok(value)
}

/// Splits `value` into exactly `len` 32-bit key words, least-significant word first,
/// zero-padding or truncating as needed.
#[must_use]
pub fn key_words(value: &BigUint, len: usize) -> Vec<u32> {
    let mut words: Vec<u32> = value.iter_u32_digits().take(len).collect();
    words.resize(len, 0);
    words
}

/// The outcome of [`acquire_system_seed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSeed {
    /// The seed that was produced.
    pub seed: Seed,
    /// `true` if it came from the platform entropy source, `false` if it was
    /// derived from the clock.
    pub from_entropy: bool,
}

impl fmt::Display for SystemSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from_entropy {
            write!(f, "seeded from system entropy: {}", self.seed)
        } else {
            write!(f, "seeded from the clock: {}", self.seed)
        }
    }
}

/// Produces a fresh, non-reproducible seed.
///
/// Reads [`SYSTEM_ENTROPY_BYTES`] bytes from the platform entropy source and
/// returns them as a wide seed (sixteen 32-bit words, least significant first).
/// If the entropy source is unavailable, folds the microsecond wall clock into a
/// native seed instead.
#[must_use]
pub fn acquire_system_seed() -> SystemSeed {
    let mut buf = [0u8; SYSTEM_ENTROPY_BYTES];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => SystemSeed {
            seed: Seed::Wide(BigUint::from_bytes_le(&buf)),
            from_entropy: true,
        },
        Err(err) => {
            tracing::warn!(error = %err, "system entropy unavailable, seeding from the clock");
            SystemSeed {
                seed: Seed::Native(timestamp_seed()),
                from_entropy: false,
            }
        }
    }
}

/// A coarse 32-bit seed derived from the wall clock.
#[must_use]
pub fn timestamp_seed() -> u32 {
    let micros = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0);
    fold_timestamp(micros)
}

fn fold_timestamp(micros: u64) -> u32 {
    ((micros >> 32) ^ (micros & 0xffff_ffff)) as u32
}
