//! Fixed label vocabulary shared by the snapshot tables.
//!
//! Row and column labels come straight from the workbook export, so they
//! are kept as plain string constants rather than enums. The only typed
//! vocabulary is the set of silos, which doubles as the column set of the
//! per-silo tables and the row set of the related-party ledgers.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const LOCATED_ASSETS: &str = "Located Assets";
pub const CUSTOMER_PAYABLES: &str = "Customer Payables";
pub const QUANTITY: &str = "Quantity";

pub const ESTIMATED_RECEIVABLES: &str = "Estimated Receivables";
pub const ESTIMATED_PAYABLES: &str = "Estimated Payables";

pub const STABLECOIN: &str = "Cash / Stablecoin";
pub const CATEGORY_A_TOTAL: &str = "Crypto - Category A";
pub const CATEGORY_B_TOTAL: &str = "Crypto - Category B";

pub const VENTURE_INVESTMENTS: &str = "Venture Investments";
pub const LIQUID_SECURITIES: &str = "Liquid Securities";
pub const CLAWBACKS: &str = "Clawbacks";
pub const RELATED_PARTY_RECEIVABLES: &str = "Related Party Receivables";
pub const SUBSIDIARY_SALES: &str = "Subsidiary Sales";

/// Category B constituents: low-liquidity tokens tied to the estate.
pub const CATEGORY_B_ASSETS: [&str; 6] = ["FTT", "MAPS", "SRM", "FIDA", "MEDIA", "All Other - Category B"];

/// Venture-linked rows merged into the international exchange on consolidation.
pub const VENTURE_ROWS: [&str; 3] = [VENTURE_INVESTMENTS, LIQUID_SECURITIES, CLAWBACKS];

/// WRS topco rows merged into the US exchange on consolidation.
pub const WRS_ROWS: [&str; 2] = [RELATED_PARTY_RECEIVABLES, SUBSIDIARY_SALES];

/// Tickers priced by the daily close-price refresh unless configured otherwise.
pub const DEFAULT_LIQUID_TICKERS: [&str; 15] = [
    "BTC", "ETH", "SOL", "XRP", "BNB", "MATIC", "TRX", "DOGE", "LINK", "SHIB", "UNI", "ALGO",
    "PAXG", "WBTC", "WETH",
];

/// How a crypto-ledger row contributes to the exchange balance sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Stablecoin,
    CategoryA,
    CategoryB,
    /// `Crypto - Category A` / `Crypto - Category B` totals.
    Aggregate,
    /// Rows appended by a consolidation transform.
    Consolidated,
}

impl RowClass {
    pub fn of(label: &str) -> Self {
        if label == STABLECOIN {
            RowClass::Stablecoin
        } else if label == CATEGORY_A_TOTAL || label == CATEGORY_B_TOTAL {
            RowClass::Aggregate
        } else if CATEGORY_B_ASSETS.contains(&label) {
            RowClass::CategoryB
        } else if VENTURE_ROWS.contains(&label) || WRS_ROWS.contains(&label) {
            RowClass::Consolidated
        } else {
            RowClass::CategoryA
        }
    }
}

/// Labels zeroed when Category B assets are subordinated.
pub fn is_category_b_label(label: &str) -> bool {
    label == CATEGORY_B_TOTAL || CATEGORY_B_ASSETS.contains(&label)
}

/// A legal entity of the estate with its own ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Silo {
    Dotcom,
    #[serde(rename = "WRS")]
    Wrs,
    Alameda,
    Ventures,
}

impl Silo {
    pub const ALL: [Silo; 4] = [Silo::Dotcom, Silo::Wrs, Silo::Alameda, Silo::Ventures];

    /// Column label in the per-silo tables, row label in the related-party ledgers.
    pub fn label(&self) -> &'static str {
        match self {
            Silo::Dotcom => "Dotcom",
            Silo::Wrs => "WRS",
            Silo::Alameda => "Alameda",
            Silo::Ventures => "Ventures",
        }
    }
}

impl fmt::Display for Silo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
