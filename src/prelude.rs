//! Convenient re-exports for common usage.
//!
//! ```rust
//! use dice_engine::prelude::*;
//!
//! let mut ctx = DiceContextBuilder::new()
//!     .with_variant(Variant::HashChain)
//!     .with_seed(11u32)
//!     .build()?;
//! let roll: Roll = ctx.roll()?;
//! assert_eq!(ctx.report_counter().map(|c| c.count), Some(2));
//! # let _ = roll;
//! # Ok::<(), DiceError>(())
//! ```

pub use crate::config::{DiceConfig, DiceContextBuilder};
pub use crate::context::{DiceContext, Roll};
pub use crate::diagnostics::{CounterReport, SeedReport};
pub use crate::error::DiceError;
pub use crate::generators::manual::ManualDiceSource;
pub use crate::generators::remote::RemoteDiceSource;
pub use crate::seed::Seed;
pub use crate::telemetry::{ViolationKind, ViolationObserver, ViolationSeverity};
pub use crate::variant::Variant;
pub use crate::DiceResult;
