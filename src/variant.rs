//! The tag identifying which die-generation algorithm a context rolls with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DiceError;

/// One of the seven interchangeable die-generation algorithms.
///
/// Parsing accepts the operator-facing aliases case-insensitively:
///
/// ```
/// use dice_engine::Variant;
///
/// assert_eq!("mersenne".parse::<Variant>().unwrap(), Variant::Twister);
/// assert_eq!("BBS".parse::<Variant>().unwrap(), Variant::Bbs);
/// assert_eq!("random.org".parse::<Variant>().unwrap(), Variant::Remote);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Blum, Blum and Shub: squaring modulo a Blum integer.
    Bbs,
    /// ISAAC stream cipher.
    Isaac,
    /// MD5 hash chain over a 32-bit counter.
    HashChain,
    /// MT19937 Mersenne Twister.
    #[default]
    Twister,
    /// Dice entered by hand through an interactive collaborator.
    Manual,
    /// Dice drawn from a remote true-random service.
    Remote,
    /// Dice replayed from a file or byte sequence.
    FileReplay,
}

impl Variant {
    /// All variants, in their canonical order.
    pub const ALL: [Self; 7] = [
        Self::Bbs,
        Self::Isaac,
        Self::HashChain,
        Self::Twister,
        Self::Manual,
        Self::Remote,
        Self::FileReplay,
    ];

    /// Short operator-facing name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bbs => "Blum, Blum and Shub",
            Self::Isaac => "ISAAC",
            Self::HashChain => "MD5",
            Self::Twister => "Mersenne Twister",
            Self::Manual => "manual dice",
            Self::Remote => "www.random.org",
            Self::FileReplay => "read from file",
        }
    }

    /// One-line description suitable for a tooltip.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Bbs => "Blum, Blum and Shub's verifiably strong generator",
            Self::Isaac => {
                "Bob Jenkins' Indirection, Shift, Accumulate, Add and Count cryptographic generator"
            }
            Self::HashChain => "A generator based on the Message Digest 5 algorithm",
            Self::Twister => "Makoto Matsumoto and Takuji Nishimura's generator",
            Self::Manual => "Enter each dice roll by hand",
            Self::Remote => "The online non-deterministic generator from random.org",
            Self::FileReplay => "Dice loaded from a file",
        }
    }

    /// Whether rolls are a pure function of seed and call count.
    #[must_use]
    pub const fn is_reproducible(&self) -> bool {
        !matches!(self, Self::Manual | Self::Remote)
    }

    /// Whether the variant draws from a seeded internal generator.
    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(
            self,
            Self::Bbs | Self::Isaac | Self::HashChain | Self::Twister
        )
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let variant = match s.trim().to_ascii_lowercase().as_str() {
            "bbs" | "blumblumshub" | "blum-blum-shub" => Self::Bbs,
            "isaac" => Self::Isaac,
            "md5" | "hash_chain" | "hash-chain" => Self::HashChain,
            "mersenne" | "twister" | "mersenne-twister" | "mt19937" => Self::Twister,
            "manual" => Self::Manual,
            "random.org" | "randomorg" | "remote" => Self::Remote,
            "file" | "file_replay" | "file-replay" => Self::FileReplay,
            other => {
                return Err(DiceError::InvalidConfiguration {
                    info: format!("unknown dice generator '{}'", other),
                })
            }
        };
        Ok(variant)
    }
}
