//! Operator-facing renderings of the seed and call counter.
//!
//! The reports are data first; `Display` produces the sentence shown to the operator.
//!
//! ```
//! use dice_engine::{DiceContext, Variant};
//!
//! let mut ctx = DiceContext::new(Variant::HashChain);
//! ctx.install_seed(7).unwrap();
//! ctx.roll().unwrap();
//!
//! assert_eq!(ctx.report_counter().unwrap().to_string(), "Number of calls since last seed: 2.");
//! ```

use std::fmt;
use std::path::PathBuf;

use num_bigint::BigUint;

use crate::Variant;

/// What a generator can say about its seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedReport {
    /// Blum-Blum-Shub: the live seed register and the modulus.
    ///
    /// `modulus` is `None` until one has been configured.
    Bbs {
        /// Current seed register.
        seed: BigUint,
        /// Configured modulus.
        modulus: Option<BigUint>,
    },
    /// A generator identified by a single seed value.
    Seed(BigUint),
    /// Dice are replayed from this source.
    File(PathBuf),
    /// The variant has no seed.
    NotApplicable,
}

impl SeedReport {
    /// The seed value, if the report carries one.
    #[must_use]
    pub fn seed_value(&self) -> Option<&BigUint> {
        match self {
            Self::Bbs { seed, .. } | Self::Seed(seed) => Some(seed),
            Self::File(_) | Self::NotApplicable => None,
        }
    }
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bbs {
                seed,
                modulus: Some(modulus),
            } => write!(
                f,
                "The current seed is {}, and the modulus is {}.",
                seed, modulus
            ),
            Self::Bbs {
                seed,
                modulus: None,
            } => write!(f, "The current seed is {}, and no modulus is set.", seed),
            Self::Seed(seed) => write!(f, "The current seed is {}.", seed),
            Self::File(path) => write!(f, "Reading dice from file: {}", path.display()),
            Self::NotApplicable => {
                f.write_str("You cannot show the seed with this random number generator.")
            }
        }
    }
}

/// How the call counter is phrased for a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// Dice produced since the last reseed.
    CallsSinceSeed,
    /// Dice drawn from the remote service in the current session.
    RemoteBatch,
    /// Dice read from the current file.
    FileReads,
}

/// The call counter with its variant-specific phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterReport {
    /// The phrasing to use.
    pub kind: CounterKind,
    /// The counter value.
    pub count: u64,
}

impl CounterReport {
    /// The report for `variant`, or `None` when the variant keeps no meaningful count.
    #[must_use]
    pub const fn for_variant(variant: Variant, count: u64) -> Option<Self> {
        let kind = match variant {
            Variant::Bbs | Variant::Isaac | Variant::HashChain => CounterKind::CallsSinceSeed,
            Variant::Remote => CounterKind::RemoteBatch,
            Variant::FileReplay => CounterKind::FileReads,
            Variant::Twister | Variant::Manual => return None,
        };
        Some(Self { kind, count })
    }
}

impl fmt::Display for CounterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CounterKind::CallsSinceSeed => {
                write!(f, "Number of calls since last seed: {}.", self.count)
            }
            CounterKind::RemoteBatch => {
                write!(f, "Number of dice used in current batch: {}.", self.count)
            }
            CounterKind::FileReads => {
                write!(f, "Number of dice read from current file: {}.", self.count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_report_text() {
        let report = SeedReport::Bbs {
            seed: BigUint::from(5u32),
            modulus: Some(BigUint::from(437u32)),
        };
        assert_eq!(
            report.to_string(),
            "The current seed is 5, and the modulus is 437."
        );
        assert_eq!(
            SeedReport::Seed(BigUint::from(99u32)).to_string(),
            "The current seed is 99."
        );
        assert_eq!(
            SeedReport::File(PathBuf::from("dice.txt")).to_string(),
            "Reading dice from file: dice.txt"
        );
        assert!(SeedReport::NotApplicable.to_string().contains("cannot show"));
    }

    #[test]
    fn test_seed_value() {
        assert_eq!(
            SeedReport::Seed(BigUint::from(3u32)).seed_value(),
            Some(&BigUint::from(3u32))
        );
        assert_eq!(SeedReport::NotApplicable.seed_value(), None);
    }

    #[test]
    fn test_counter_phrasing() {
        let text = |variant| CounterReport::for_variant(variant, 4).map(|r| r.to_string());
        assert_eq!(
            text(Variant::Isaac).as_deref(),
            Some("Number of calls since last seed: 4.")
        );
        assert_eq!(
            text(Variant::Remote).as_deref(),
            Some("Number of dice used in current batch: 4.")
        );
        assert_eq!(
            text(Variant::FileReplay).as_deref(),
            Some("Number of dice read from current file: 4.")
        );
        assert_eq!(text(Variant::Manual), None);
        assert_eq!(text(Variant::Twister), None);
    }
}
