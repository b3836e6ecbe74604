//! # Dice Engine
//!
//! Fair two-die randomness for board game turn loops.
//!
//! Seven interchangeable generators sit behind one contract: Blum-Blum-Shub, ISAAC,
//! an MD5 hash chain, the MT19937 Mersenne Twister, manual entry, a remote
//! true-random service and file replay. Every 32-bit generator is mapped to die
//! faces by rejection sampling, so each face has probability exactly 1/6. Seeds can
//! be machine words or arbitrary-precision integers.
//!
//! A [`DiceContext`] holds one independent stream. If a generator malfunctions the
//! context reports it, switches to the Twister and retries once.
//!
//! ```
//! use dice_engine::{DiceContext, Variant};
//!
//! let mut ctx = DiceContext::new(Variant::Twister);
//! ctx.install_seed(5489)?;
//! let roll = ctx.roll()?;
//! assert!(roll.dice().iter().all(|d| (1..=6).contains(d)));
//! # Ok::<(), dice_engine::DiceError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use config::{DiceConfig, DiceContextBuilder};
pub use context::{DiceContext, Roll};
pub use diagnostics::{CounterKind, CounterReport, SeedReport};
pub use error::DiceError;
pub use generator::{DiceGenerator, RawRoll, FAILED_DIE};
pub use generators::bbs::BbsFactors;
pub use generators::manual::ManualDiceSource;
pub use generators::remote::RemoteDiceSource;
pub use seed::{acquire_system_seed, Seed, SystemSeed};
pub use variant::Variant;

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod die;
#[doc(hidden)]
pub mod error;
pub mod generator;
pub mod prelude;
pub mod prime;
/// Word generator trait and the internal PCG32 used for primality witnesses.
pub mod rng;
pub mod seed;
pub mod telemetry;
pub mod variant;

/// The seven die-generation algorithms.
pub mod generators {
    pub mod bbs;
    pub mod file_replay;
    pub mod hash_chain;
    pub mod isaac;
    pub mod manual;
    pub mod remote;
    pub mod twister;
}

/// Convenience alias for results with [`DiceError`].
pub type DiceResult<T> = Result<T, DiceError>;
