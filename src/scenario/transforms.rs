//! Restructuring rules, one function per rule.
//!
//! Every transform takes ownership of a snapshot copy and hands back the
//! adjusted copy. None of them read or write anything but their argument,
//! so the baseline held by the composer is never touched. Consolidation
//! reads every required amount before editing, so a missing row aborts
//! before any edit happens.

use crate::core::labels::{
    is_category_b_label, RowClass, Silo, CATEGORY_A_TOTAL, CATEGORY_B_TOTAL, ESTIMATED_PAYABLES,
    ESTIMATED_RECEIVABLES, LOCATED_ASSETS, QUANTITY, STABLECOIN, VENTURE_ROWS, WRS_ROWS,
};
use crate::core::snapshot::Snapshot;
use crate::core::table::{Table, TableError, TableName};
use crate::pricing::refresher::ClosePriceLookup;
use crate::pricing::source::PriceError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that abort a scenario computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("required row '{label}' is missing from table '{table}'")]
    MissingCategoryRow { table: TableName, label: String },
    #[error("required column '{column}' is missing from table '{table}'")]
    MissingColumn { table: TableName, column: String },
    #[error("division by zero: {0}")]
    DivisionByZero(String),
    #[error(transparent)]
    Table(TableError),
}

impl From<TableError> for TransformError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::MissingRow { table, label } => {
                TransformError::MissingCategoryRow { table, label }
            }
            TableError::MissingColumn { table, column } => {
                TransformError::MissingColumn { table, column }
            }
            other => TransformError::Table(other),
        }
    }
}

/// Zero every category B row, across all columns, in every table.
///
/// Idempotent: a second application finds only zeros.
pub fn zero_category_b(mut snapshot: Snapshot) -> Snapshot {
    for table in snapshot.tables_mut() {
        let zeroed = table.zero_rows_where(is_category_b_label);
        if zeroed > 0 {
            log::debug!("zeroed {zeroed} category B rows in '{}'", table.name());
        }
    }
    snapshot
}

/// Result of refreshing ticker rows from close prices.
#[derive(Debug, Clone)]
pub struct PriceInjection {
    pub snapshot: Snapshot,
    /// Tickers whose rows now carry a fresh price.
    pub updated: Vec<String>,
    /// Tickers that kept their prior amounts because the lookup failed.
    pub failures: Vec<PriceError>,
}

/// Reprice liquid ticker rows and re-aggregate `Crypto - Category A`.
///
/// Each ticker is looked up once. Its `Located Assets` become
/// `round(price * quantity / 1_000_000)` in every crypto ledger carrying
/// it. A failed lookup leaves that ticker's amounts as they were and does
/// not affect the other tickers.
pub fn inject_live_prices(
    mut snapshot: Snapshot,
    tickers: &[String],
    prices: &mut dyn ClosePriceLookup,
    date: NaiveDate,
) -> Result<PriceInjection, TransformError> {
    for name in TableName::CRYPTO_LEDGERS {
        require_ledger_shape(snapshot.table(name))?;
    }

    let per_million = Decimal::from(1_000_000);
    let mut updated = Vec::new();
    let mut failures = Vec::new();

    for ticker in tickers {
        let holders: Vec<TableName> = TableName::CRYPTO_LEDGERS
            .into_iter()
            .filter(|name| snapshot.table(*name).has_row(ticker))
            .collect();
        if holders.is_empty() {
            log::debug!("no ledger holds {ticker}, skipping price lookup");
            continue;
        }

        let price = match prices.close_price(ticker, date) {
            Ok(price) => price,
            Err(err) => {
                log::warn!("keeping prior amounts for {ticker}: {err}");
                failures.push(err);
                continue;
            }
        };

        for name in holders {
            let table = snapshot.table_mut(name);
            let quantity = table.get(ticker, QUANTITY)?;
            let located = (price * quantity / per_million).round();
            table.set(ticker, LOCATED_ASSETS, located)?;
        }
        updated.push(ticker.clone());
    }

    for name in TableName::CRYPTO_LEDGERS {
        let table = snapshot.table_mut(name);
        let total = table.sum_where(LOCATED_ASSETS, |label| {
            RowClass::of(label) == RowClass::CategoryA
        })?;
        table.set(CATEGORY_A_TOTAL, LOCATED_ASSETS, total)?;
    }

    Ok(PriceInjection {
        snapshot,
        updated,
        failures,
    })
}

fn require_ledger_shape(table: &Table) -> Result<(), TransformError> {
    for column in [QUANTITY, LOCATED_ASSETS] {
        if !table.has_column(column) {
            return Err(TransformError::MissingColumn {
                table: table.name(),
                column: column.to_string(),
            });
        }
    }
    if !table.has_row(CATEGORY_A_TOTAL) {
        return Err(TransformError::MissingCategoryRow {
            table: table.name(),
            label: CATEGORY_A_TOTAL.to_string(),
        });
    }
    Ok(())
}

/// SUBCON: substantively consolidate Alameda and Ventures into FTX.COM.
pub fn consolidate_alameda_ventures_dotcom(mut snapshot: Snapshot) -> Result<Snapshot, TransformError> {
    merge_alameda_ventures(&mut snapshot, |amount| amount)?;
    Ok(snapshot)
}

/// SUBCON_US: substantively consolidate the WRS topco into FTX.US.
pub fn consolidate_wrs(mut snapshot: Snapshot) -> Result<Snapshot, TransformError> {
    let wrs = Silo::Wrs.label();

    let cash = snapshot.table(TableName::Cash).column_sum(wrs)?;
    let assets = snapshot.table(TableName::Assets);
    let topco_rows = WRS_ROWS
        .into_iter()
        .map(|label| Ok((label, assets.get(label, wrs)?)))
        .collect::<Result<Vec<_>, TableError>>()?;

    let related = snapshot.table_mut(TableName::UsRelatedParty);
    related.zero_row(wrs)?;

    let ledger = snapshot.table_mut(TableName::UsCrypto);
    ledger.add(STABLECOIN, LOCATED_ASSETS, cash)?;
    for (label, amount) in topco_rows {
        ledger.upsert_add(label, LOCATED_ASSETS, amount)?;
    }
    log::debug!("consolidated WRS into FTX.US: cash {cash}");
    Ok(snapshot)
}

/// Total Alameda assets over total Alameda liabilities. Not capped.
pub fn alameda_multiplier(snapshot: &Snapshot) -> Result<Decimal, TransformError> {
    let alameda = Silo::Alameda.label();
    let assets = snapshot.table(TableName::Assets).column_sum(alameda)?;
    let liabilities = snapshot.table(TableName::Liabilities).column_sum(alameda)?;
    if liabilities.is_zero() {
        return Err(TransformError::DivisionByZero(
            "Alameda liabilities sum to zero".to_string(),
        ));
    }
    Ok(assets / liabilities)
}

/// CLAIM_ALAMEDA: merge Alameda and Ventures into FTX.COM at the Alameda
/// recovery multiplier instead of at face value.
///
/// Every contributed cell is scaled and rounded on its own before the
/// contributions are summed. The FTX.US related-party entry against
/// Alameda is netted: payable less receivable, receivable cleared. The
/// netted payable is not clamped, so a receivable larger than the payable
/// leaves it negative.
pub fn claim_against_alameda(mut snapshot: Snapshot) -> Result<Snapshot, TransformError> {
    let multiplier = alameda_multiplier(&snapshot)?;
    log::debug!("Alameda recovery multiplier {multiplier}");

    merge_alameda_ventures(&mut snapshot, |amount| (amount * multiplier).round())?;

    let alameda = Silo::Alameda.label();
    let related = snapshot.table_mut(TableName::UsRelatedParty);
    let receivable = related.get(alameda, ESTIMATED_RECEIVABLES)?;
    related.add(alameda, ESTIMATED_PAYABLES, -receivable)?;
    related.set(alameda, ESTIMATED_RECEIVABLES, Decimal::ZERO)?;
    Ok(snapshot)
}

/// Amounts headed for the FTX.COM ledger from the Alameda and Ventures silos.
#[derive(Debug, Default)]
struct SiloContribution {
    stablecoin: Decimal,
    category_a: Decimal,
    category_b: Decimal,
    ventures: Vec<(&'static str, Decimal)>,
}

fn merge_alameda_ventures<F>(snapshot: &mut Snapshot, contribute: F) -> Result<(), TransformError>
where
    F: Fn(Decimal) -> Decimal,
{
    let silos = [Silo::Alameda.label(), Silo::Ventures.label()];
    let mut merged = SiloContribution::default();

    let cash = snapshot.table(TableName::Cash);
    for silo in silos {
        for (label, _) in cash.rows() {
            merged.stablecoin += contribute(cash.get(label, silo)?);
        }
    }

    let alameda_ledger = snapshot.table(TableName::AlamedaCrypto);
    for (label, _) in alameda_ledger.rows() {
        let amount = contribute(alameda_ledger.get(label, LOCATED_ASSETS)?);
        match RowClass::of(label) {
            RowClass::Stablecoin => merged.stablecoin += amount,
            RowClass::CategoryA => merged.category_a += amount,
            RowClass::CategoryB => merged.category_b += amount,
            RowClass::Aggregate | RowClass::Consolidated => {}
        }
    }

    let investments = snapshot.table(TableName::Investments);
    for label in VENTURE_ROWS {
        let mut amount = Decimal::ZERO;
        for silo in silos {
            amount += contribute(investments.get(label, silo)?);
        }
        merged.ventures.push((label, amount));
    }

    let related = snapshot.table(TableName::IntlRelatedParty);
    for silo in silos {
        if !related.has_row(silo) {
            return Err(TransformError::MissingCategoryRow {
                table: TableName::IntlRelatedParty,
                label: silo.to_string(),
            });
        }
    }
    let ledger = snapshot.table(TableName::IntlCrypto);
    for label in [STABLECOIN, CATEGORY_A_TOTAL, CATEGORY_B_TOTAL] {
        if !ledger.has_row(label) {
            return Err(TransformError::MissingCategoryRow {
                table: TableName::IntlCrypto,
                label: label.to_string(),
            });
        }
    }

    let related = snapshot.table_mut(TableName::IntlRelatedParty);
    for silo in silos {
        related.zero_row(silo)?;
    }

    let ledger = snapshot.table_mut(TableName::IntlCrypto);
    ledger.add(STABLECOIN, LOCATED_ASSETS, merged.stablecoin)?;
    ledger.add(CATEGORY_A_TOTAL, LOCATED_ASSETS, merged.category_a)?;
    ledger.add(CATEGORY_B_TOTAL, LOCATED_ASSETS, merged.category_b)?;
    for (label, amount) in merged.ventures {
        ledger.upsert_add(label, LOCATED_ASSETS, amount)?;
    }
    log::debug!(
        "merged Alameda/Ventures into FTX.COM: stablecoin {}, category A {}, category B {}",
        merged.stablecoin,
        merged.category_a,
        merged.category_b
    );
    Ok(())
}
