use std::error::Error;
use std::fmt;
use std::fmt::Display;

use crate::Variant;

/// This enum contains all error messages this library can return. Most API functions will generally return a [`Result<(), DiceError>`].
///
/// [`Result<(), DiceError>`]: std::result::Result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiceError {
    /// A seed, modulus, factor, variant name or file path was rejected while configuring a context.
    /// The previous state of the context is left unchanged.
    InvalidConfiguration {
        /// Further specifies why the configuration was invalid.
        info: String,
    },
    /// The Blum-Blum-Shub generator could not find a seed that avoids short cycles.
    ///
    /// The generator is clamped to the degenerate seed 0 and refuses to roll until it
    /// is reseeded or given a new modulus.
    SeedingFailure {
        /// The seed (decimal) that was being validated.
        seed: String,
        /// The modulus (decimal) in effect.
        modulus: String,
    },
    /// A dice file or in-memory dice sequence could not supply a die.
    ///
    /// This is distinct from reaching the end of the sequence, which rewinds silently.
    SourceExhausted {
        /// The file path or label of the backing sequence.
        source_name: String,
        /// A description of why no die could be read.
        reason: String,
    },
    /// The remote true-random collaborator failed to supply a die.
    RemoteFailure {
        /// A description of the remote failure.
        info: String,
    },
    /// A roll produced a die outside `1..=6`, even after falling back to the Twister.
    MalformedRoll {
        /// The variant that produced the malformed pair.
        variant: Variant,
        /// The raw pair as produced.
        dice: [u32; 2],
    },
    /// The interactive entry provider was dismissed without supplying dice.
    ManualEntryCancelled,
    /// Opening or positioning a dice file failed.
    Io {
        /// A description of the I/O failure.
        context: String,
    },
}

impl Display for DiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiceError::InvalidConfiguration { info } => {
                write!(f, "Invalid configuration: {}", info)
            }
            DiceError::SeedingFailure { seed, modulus } => {
                write!(
                    f,
                    "Invalid seed and/or modulus for the Blum, Blum and Shub generator (seed {}, modulus {}). \
                     Please reset the seed and/or modulus before continuing.",
                    seed, modulus
                )
            }
            DiceError::SourceExhausted {
                source_name,
                reason,
            } => {
                write!(f, "Cannot read dice from {}: {}", source_name, reason)
            }
            DiceError::RemoteFailure { info } => {
                write!(f, "Remote dice source failed: {}", info)
            }
            DiceError::MalformedRoll { variant, dice } => {
                write!(
                    f,
                    "The {} generator produced malformed dice {:?}",
                    variant, dice
                )
            }
            DiceError::ManualEntryCancelled => {
                write!(f, "Manual dice entry was cancelled.")
            }
            DiceError::Io { context } => {
                write!(f, "I/O error: {}", context)
            }
        }
    }
}

impl Error for DiceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_payload() {
        let err = DiceError::InvalidConfiguration {
            info: "modulus must be positive".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration: modulus must be positive"
        );

        let err = DiceError::MalformedRoll {
            variant: Variant::Manual,
            dice: [0, 7],
        };
        assert!(err.to_string().contains("[0, 7]"));
        assert!(err.to_string().contains("manual dice"));
    }

    #[test]
    fn test_seeding_failure_asks_for_reset() {
        let err = DiceError::SeedingFailure {
            seed: "0".to_owned(),
            modulus: "437".to_owned(),
        };
        let text = err.to_string();
        assert!(text.contains("modulus 437"));
        assert!(text.contains("reset the seed"));
    }

    #[test]
    fn test_is_std_error() {
        fn assert_error<E: Error + Send + Sync + 'static>(_: &E) {}
        assert_error(&DiceError::ManualEntryCancelled);
    }
}
