use crate::core::labels::{
    RowClass, CATEGORY_A_TOTAL, CATEGORY_B_TOTAL, CUSTOMER_PAYABLES, ESTIMATED_PAYABLES,
    ESTIMATED_RECEIVABLES, LOCATED_ASSETS, STABLECOIN,
};
use crate::core::snapshot::Snapshot;
use crate::core::table::{TableError, TableName};
use crate::scenario::selection::ScenarioKey;
use crate::scenario::transforms::TransformError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A customer-facing exchange whose creditors are being estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExchangeKey {
    Dotcom,
    Us,
}

impl ExchangeKey {
    pub const ALL: [ExchangeKey; 2] = [ExchangeKey::Dotcom, ExchangeKey::Us];

    pub fn name(&self) -> &'static str {
        match self {
            ExchangeKey::Dotcom => "FTX.COM",
            ExchangeKey::Us => "FTX.US",
        }
    }

    pub fn crypto_table(&self) -> TableName {
        match self {
            ExchangeKey::Dotcom => TableName::IntlCrypto,
            ExchangeKey::Us => TableName::UsCrypto,
        }
    }

    pub fn related_party_table(&self) -> TableName {
        match self {
            ExchangeKey::Dotcom => TableName::IntlRelatedParty,
            ExchangeKey::Us => TableName::UsRelatedParty,
        }
    }

    /// Toggles that consolidate or net a silo into this exchange.
    pub fn consolidation_keys(&self) -> [ScenarioKey; 2] {
        match self {
            ExchangeKey::Dotcom => [ScenarioKey::Subcon, ScenarioKey::ClaimAlameda],
            ExchangeKey::Us => [ScenarioKey::SubconUs, ScenarioKey::ClaimAlameda],
        }
    }
}

impl fmt::Display for ExchangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors arising from recovery computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("liabilities of {exchange} sum to zero; recovery is undefined")]
    DivisionByZero { exchange: ExchangeKey },
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl From<TableError> for RecoveryError {
    fn from(err: TableError) -> Self {
        RecoveryError::Transform(err.into())
    }
}

/// A labelled amount on one side of a balance sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceLine {
    pub label: String,
    pub amount: Decimal,
}

impl BalanceLine {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// Asset and liability lines of one exchange, in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeBreakdown {
    pub exchange: ExchangeKey,
    pub assets: Vec<BalanceLine>,
    pub liabilities: Vec<BalanceLine>,
}

impl ExchangeBreakdown {
    pub fn total_assets(&self) -> Decimal {
        self.assets.iter().map(|l| l.amount).sum()
    }

    pub fn total_liabilities(&self) -> Decimal {
        self.liabilities.iter().map(|l| l.amount).sum()
    }

    /// Assets over liabilities, as a percentage.
    pub fn recovery_percent(&self) -> Result<Decimal, RecoveryError> {
        let liabilities = self.total_liabilities();
        if liabilities.is_zero() {
            return Err(RecoveryError::DivisionByZero {
                exchange: self.exchange,
            });
        }
        Ok(self.total_assets() / liabilities * Decimal::ONE_HUNDRED)
    }

    pub fn asset(&self, label: &str) -> Option<Decimal> {
        self.assets.iter().find(|l| l.label == label).map(|l| l.amount)
    }

    pub fn liability(&self, label: &str) -> Option<Decimal> {
        self.liabilities.iter().find(|l| l.label == label).map(|l| l.amount)
    }
}

pub const RECEIVABLES: &str = "Receivables";
pub const PAYABLES_CATEGORY_A: &str = "Customer Payables - Category A";
pub const PAYABLES_CATEGORY_B: &str = "Customer Payables - Category B";
pub const RELATED_PARTY_PAYABLES: &str = "Related Party Payables";

/// Reduce a snapshot to the balance sheet of one exchange.
///
/// Assets: stablecoin, both category totals, related-party receivables,
/// then any rows consolidation appended to the exchange ledger.
/// Liabilities: customer payables split by category, and related-party
/// payables.
pub fn exchange_breakdown(
    snapshot: &Snapshot,
    exchange: ExchangeKey,
) -> Result<ExchangeBreakdown, RecoveryError> {
    let ledger = snapshot.table(exchange.crypto_table());
    let related = snapshot.table(exchange.related_party_table());

    let mut assets = vec![
        BalanceLine::new(STABLECOIN, ledger.get(STABLECOIN, LOCATED_ASSETS)?),
        BalanceLine::new(CATEGORY_A_TOTAL, ledger.get(CATEGORY_A_TOTAL, LOCATED_ASSETS)?),
        BalanceLine::new(CATEGORY_B_TOTAL, ledger.get(CATEGORY_B_TOTAL, LOCATED_ASSETS)?),
        BalanceLine::new(RECEIVABLES, related.column_sum(ESTIMATED_RECEIVABLES)?),
    ];
    for (label, _) in ledger.rows() {
        if RowClass::of(label) == RowClass::Consolidated {
            assets.push(BalanceLine::new(label, ledger.get(label, LOCATED_ASSETS)?));
        }
    }

    let payables_a = ledger.sum_where(CUSTOMER_PAYABLES, |label| {
        matches!(RowClass::of(label), RowClass::Stablecoin | RowClass::CategoryA)
    })?;
    let payables_b =
        ledger.sum_where(CUSTOMER_PAYABLES, |label| RowClass::of(label) == RowClass::CategoryB)?;
    let liabilities = vec![
        BalanceLine::new(PAYABLES_CATEGORY_A, payables_a),
        BalanceLine::new(PAYABLES_CATEGORY_B, payables_b),
        BalanceLine::new(RELATED_PARTY_PAYABLES, related.column_sum(ESTIMATED_PAYABLES)?),
    ];

    Ok(ExchangeBreakdown {
        exchange,
        assets,
        liabilities,
    })
}

/// Recovery percentage of an exchange: total assets ÷ total liabilities × 100.
///
/// Fails with [`RecoveryError::DivisionByZero`] when liabilities sum to zero.
pub fn compute_recovery(snapshot: &Snapshot, exchange: ExchangeKey) -> Result<Decimal, RecoveryError> {
    exchange_breakdown(snapshot, exchange)?.recovery_percent()
}
