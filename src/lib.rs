//! # estate-recovery
//!
//! Creditor recovery estimates for a multi-entity bankruptcy estate.
//!
//! Given an immutable ledger snapshot and a set of toggled restructuring
//! assumptions, this engine derives the adjusted balance sheet of each
//! exchange and recomputes its recovery percentage.
//!
//! ## Architecture
//!
//! - **core**: Snapshot tables, the fixed label vocabulary, loading
//! - **scenario**: Restructuring transforms, toggle selection, the composer
//! - **recovery**: Exchange breakdowns, recovery rates, silo overview
//! - **pricing**: Daily close-price lookup with an on-disk cache
//! - **config**: File and environment settings

pub mod config;
pub mod core;
pub mod pricing;
pub mod recovery;
pub mod scenario;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::snapshot::Snapshot;
    pub use crate::core::table::{Table, TableName};
    pub use crate::recovery::calculator::{compute_recovery, exchange_breakdown, ExchangeKey};
    pub use crate::recovery::report::{RecoveryRate, RecoveryReport};
    pub use crate::scenario::composer::{ScenarioComposer, ScenarioOutcome};
    pub use crate::scenario::selection::{ScenarioKey, Selection};
}
