//! Core state for forgebot: configuration, filesystem paths, and the
//! known-issue ledger.
//!
//! Everything persisted lives under `~/.forgebot/` (see [`paths`]) and is
//! written atomically so a crash mid-write never leaves a truncated file.

pub mod atomic;
pub mod config;
pub mod error;
pub mod ledger;
pub mod paths;

pub use config::Config;
pub use error::{CoreError, Result};
pub use ledger::{Ledger, LedgerEntry};
