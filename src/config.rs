//! Declarative configuration for dice contexts.
//!
//! [`DiceConfig`] is the serializable form read from a settings file;
//! [`DiceContextBuilder`] turns it (or direct calls) into a ready [`DiceContext`].
//!
//! # Example
//!
//! ```
//! use dice_engine::{DiceContextBuilder, Variant};
//!
//! let mut ctx = DiceContextBuilder::new()
//!     .with_variant(Variant::Bbs)
//!     .with_bbs_factors("4", "4")?
//!     .with_seed(5u32)
//!     .build()?;
//!
//! assert_eq!(ctx.report_seed().to_string(), "The current seed is 5, and the modulus is 437.");
//! ctx.roll()?;
//! # Ok::<(), dice_engine::DiceError>(())
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::generators::manual::ManualDiceSource;
use crate::generators::remote::RemoteDiceSource;
use crate::seed::{parse_positive, Seed};
use crate::telemetry::ViolationObserver;
use crate::{DiceContext, DiceError, Variant};

/// Settings for one dice context, as stored by the host application.
///
/// Every field is optional in serialized form.
///
/// ```
/// use dice_engine::{DiceConfig, Variant};
///
/// let config: DiceConfig = serde_json::from_str(r#"{ "variant": "hash_chain", "seed": "12" }"#).unwrap();
/// assert_eq!(config.variant, Variant::HashChain);
/// assert_eq!(config.seed.as_deref(), Some("12"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiceConfig {
    /// The generator to use.
    pub variant: Variant,
    /// Decimal seed of any width; `None` seeds from system entropy.
    pub seed: Option<String>,
    /// BBS modulus as a decimal string.
    pub bbs_modulus: Option<String>,
    /// BBS candidate prime factors; an alternative to `bbs_modulus`.
    pub bbs_factors: Option<(String, String)>,
    /// File to replay dice from.
    pub dice_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BbsSetting {
    Modulus(String),
    Factors(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DiceSequence {
    File(PathBuf),
    Bytes { bytes: Vec<u8>, label: String },
}

/// Builds a [`DiceContext`] in one step.
///
/// Collaborators and dice sequences given for a variant other than the chosen one
/// stay in the context for later selection. A dice file given for another variant is
/// opened once to check it, then closed until [`Variant::FileReplay`] is selected.
#[must_use = "DiceContextBuilder must be consumed by calling build"]
#[derive(Default)]
pub struct DiceContextBuilder {
    variant: Variant,
    seed: Option<Seed>,
    bbs: Option<BbsSetting>,
    sequence: Option<DiceSequence>,
    manual: Option<Arc<dyn ManualDiceSource>>,
    remote: Option<Arc<dyn RemoteDiceSource>>,
    violation_observer: Option<Arc<dyn ViolationObserver>>,
}

impl fmt::Debug for DiceContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            variant,
            seed,
            bbs,
            sequence,
            manual,
            remote,
            violation_observer,
        } = self;

        f.debug_struct("DiceContextBuilder")
            .field("variant", variant)
            .field("seed", seed)
            .field("bbs", bbs)
            .field("sequence", sequence)
            .field("has_manual", &manual.is_some())
            .field("has_remote", &remote.is_some())
            .field("has_violation_observer", &violation_observer.is_some())
            .finish()
    }
}

impl DiceContextBuilder {
    /// A builder for a system-seeded Twister context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a stored configuration.
    ///
    /// # Errors
    /// [`DiceError::InvalidConfiguration`] for malformed numbers or for setting both
    /// a modulus and factors.
    pub fn from_config(config: &DiceConfig) -> Result<Self, DiceError> {
        let mut builder = Self::new().with_variant(config.variant);
        if let Some(seed) = &config.seed {
            builder = builder.with_seed_decimal(seed)?;
        }
        match (&config.bbs_modulus, &config.bbs_factors) {
            (Some(_), Some(_)) => {
                return Err(DiceError::InvalidConfiguration {
                    info: "set either bbs_modulus or bbs_factors, not both".to_owned(),
                })
            }
            (Some(modulus), None) => builder = builder.with_bbs_modulus(modulus)?,
            (None, Some((p, q))) => builder = builder.with_bbs_factors(p, q)?,
            (None, None) => {}
        }
        if let Some(path) = &config.dice_file {
            builder = builder.with_dice_file(path.clone());
        }
        Ok(builder)
    }

    /// The variant that will be active.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// A fixed seed, native or wide. Without one, native generators are seeded
    /// from system entropy.
    pub fn with_seed(mut self, seed: impl Into<Seed>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// A fixed seed given as a decimal string.
    ///
    /// # Errors
    /// [`DiceError::InvalidConfiguration`] if the string is not a non-negative integer.
    pub fn with_seed_decimal(mut self, seed: &str) -> Result<Self, DiceError> {
        self.seed = Some(Seed::parse_decimal(seed)?);
        Ok(self)
    }

    /// The BBS modulus.
    ///
    /// # Errors
    /// [`DiceError::InvalidConfiguration`] if `modulus` is not a positive integer.
    pub fn with_bbs_modulus(mut self, modulus: &str) -> Result<Self, DiceError> {
        parse_positive(modulus, "modulus")?;
        self.bbs = Some(BbsSetting::Modulus(modulus.to_owned()));
        Ok(self)
    }

    /// Two candidate BBS factors; invalid ones are replaced at build time.
    ///
    /// # Errors
    /// [`DiceError::InvalidConfiguration`] if either is not a positive integer.
    pub fn with_bbs_factors(mut self, p: &str, q: &str) -> Result<Self, DiceError> {
        parse_positive(p, "Blum factor")?;
        parse_positive(q, "Blum factor")?;
        self.bbs = Some(BbsSetting::Factors(p.to_owned(), q.to_owned()));
        Ok(self)
    }

    /// A dice file to replay.
    pub fn with_dice_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sequence = Some(DiceSequence::File(path.into()));
        self
    }

    /// An in-memory dice sequence to replay, named `label` in reports.
    pub fn with_dice_bytes(mut self, bytes: impl Into<Vec<u8>>, label: impl Into<String>) -> Self {
        self.sequence = Some(DiceSequence::Bytes {
            bytes: bytes.into(),
            label: label.into(),
        });
        self
    }

    /// The manual entry provider.
    pub fn with_manual_source(mut self, source: Arc<dyn ManualDiceSource>) -> Self {
        self.manual = Some(source);
        self
    }

    /// The remote dice service.
    pub fn with_remote_source(mut self, source: Arc<dyn RemoteDiceSource>) -> Self {
        self.remote = Some(source);
        self
    }

    /// Sets a custom observer for malfunctions reported by the context.
    pub fn with_violation_observer(mut self, observer: Arc<dyn ViolationObserver>) -> Self {
        self.violation_observer = Some(observer);
        self
    }

    fn missing(&self) -> Option<&'static str> {
        match self.variant {
            Variant::Bbs if self.bbs.is_none() => Some("a modulus or factor pair"),
            Variant::Manual if self.manual.is_none() => Some("a manual entry provider"),
            Variant::Remote if self.remote.is_none() => Some("a remote dice source"),
            Variant::FileReplay if self.sequence.is_none() => Some("a dice file"),
            _ => None,
        }
    }

    /// Creates the context.
    ///
    /// # Errors
    /// - [`DiceError::InvalidConfiguration`] if the chosen variant lacks what it needs.
    /// - [`DiceError::Io`] if the dice file cannot be opened.
    /// - [`DiceError::SeedingFailure`] if BBS finds no usable seed.
    pub fn build(self) -> Result<DiceContext, DiceError> {
        if let Some(what) = self.missing() {
            return Err(DiceError::InvalidConfiguration {
                info: format!("{} needs {}", self.variant, what),
            });
        }

        let mut ctx = DiceContext::new(self.variant);
        if let Some(observer) = self.violation_observer {
            ctx = ctx.with_violation_observer(observer);
        }
        if let Some(source) = self.manual {
            ctx.use_manual_entry(source);
        }
        if let Some(source) = self.remote {
            ctx.use_remote_source(source);
        }
        match self.bbs {
            Some(BbsSetting::Modulus(modulus)) => ctx.set_bbs_modulus(&modulus)?,
            Some(BbsSetting::Factors(p, q)) => {
                ctx.set_bbs_factors(&p, &q)?;
            }
            None => {}
        }
        match self.sequence {
            Some(DiceSequence::File(path)) => ctx.open_dice_file(path)?,
            Some(DiceSequence::Bytes { bytes, label }) => ctx.load_dice_sequence(bytes, label),
            None => {}
        }

        ctx.select_variant(self.variant);
        match self.seed {
            Some(seed) => ctx.apply_seed(seed)?,
            None if self.variant.is_native() => {
                ctx.acquire_system_seed()?;
            }
            None => {}
        }
        tracing::debug!(variant = %self.variant, "dice context built");
        Ok(ctx)
    }
}
