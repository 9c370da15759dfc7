use crate::core::labels::Silo;
use crate::core::snapshot::Snapshot;
use crate::core::table::{Table, TableName};
use crate::recovery::calculator::{BalanceLine, RecoveryError};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Standalone balance sheet of one silo, before any consolidation.
#[derive(Debug, Clone, Serialize)]
pub struct SiloBalance {
    pub silo: Silo,
    pub cash: Decimal,
    pub assets: Vec<BalanceLine>,
    pub liabilities: Vec<BalanceLine>,
}

impl SiloBalance {
    pub fn total_assets(&self) -> Decimal {
        self.assets.iter().map(|l| l.amount).sum()
    }

    pub fn total_liabilities(&self) -> Decimal {
        self.liabilities.iter().map(|l| l.amount).sum()
    }

    /// Asset coverage of liabilities, `None` when the silo owes nothing.
    pub fn coverage(&self) -> Option<Decimal> {
        let liabilities = self.total_liabilities();
        (!liabilities.is_zero()).then(|| self.total_assets() / liabilities)
    }
}

/// Per-silo view of the `Assets`, `Liabilities` and `Cash` tables.
pub fn silo_overview(snapshot: &Snapshot) -> Result<Vec<SiloBalance>, RecoveryError> {
    let assets = snapshot.table(TableName::Assets);
    let liabilities = snapshot.table(TableName::Liabilities);
    let cash = snapshot.table(TableName::Cash);

    Silo::ALL
        .into_iter()
        .map(|silo| -> Result<SiloBalance, RecoveryError> {
            let column = silo.label();
            let lines = |table: &Table| {
                table
                    .rows()
                    .map(|(label, _)| Ok(BalanceLine::new(label, table.get(label, column)?)))
                    .collect::<Result<Vec<_>, RecoveryError>>()
            };
            Ok(SiloBalance {
                silo,
                cash: cash.column_sum(column)?,
                assets: lines(assets)?,
                liabilities: lines(liabilities)?,
            })
        })
        .collect()
}

/// Text rendering of a silo overview.
pub struct SiloOverview<'a>(pub &'a [SiloBalance]);

impl fmt::Display for SiloOverview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Silo Overview ($ in mm) ===")?;
        for balance in self.0 {
            writeln!(f, "\n--- {} ---", balance.silo)?;
            writeln!(f, "  Cash:              {}", balance.cash)?;
            writeln!(f, "  Total Assets:      {}", balance.total_assets())?;
            writeln!(f, "  Total Liabilities: {}", balance.total_liabilities())?;
            match balance.coverage() {
                Some(c) => writeln!(f, "  Coverage:          {:.2}x", c.round_dp(2))?,
                None => writeln!(f, "  Coverage:          N/A")?,
            }
        }
        Ok(())
    }
}
