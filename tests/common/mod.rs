//! Shared estate fixture for the integration and property suites.
//!
//! FTX.COM matches the worked example: assets 100 / 50 / 20 / 5 against
//! liabilities 90 / 20 / 10. FTX.US holds 1,000 BTC carried at 40.

#![allow(dead_code)]

use chrono::NaiveDate;
use estate_recovery::core::labels::{
    CATEGORY_A_TOTAL, CATEGORY_B_TOTAL, CLAWBACKS, CUSTOMER_PAYABLES, ESTIMATED_PAYABLES,
    ESTIMATED_RECEIVABLES, LIQUID_SECURITIES, LOCATED_ASSETS, QUANTITY, RELATED_PARTY_RECEIVABLES,
    STABLECOIN, SUBSIDIARY_SALES, VENTURE_INVESTMENTS,
};
use estate_recovery::core::snapshot::Snapshot;
use estate_recovery::core::table::{Table, TableName};
use estate_recovery::pricing::refresher::ClosePriceLookup;
use estate_recovery::pricing::source::PriceError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

const SILOS: [&str; 4] = ["Dotcom", "WRS", "Alameda", "Ventures"];
const LEDGER: [&str; 3] = [QUANTITY, LOCATED_ASSETS, CUSTOMER_PAYABLES];
const RELATED: [&str; 2] = [ESTIMATED_RECEIVABLES, ESTIMATED_PAYABLES];

pub fn table(name: TableName, columns: &[&str], rows: &[(&str, [Decimal; 4])]) -> Table {
    Table::from_rows(
        name,
        columns.iter().map(|c| c.to_string()).collect(),
        rows.iter()
            .map(|(label, values)| (label.to_string(), values[..columns.len()].to_vec())),
    )
    .unwrap()
}

fn z() -> Decimal {
    Decimal::ZERO
}

pub fn estate() -> Snapshot {
    Snapshot::from_tables([
        table(
            TableName::Cash,
            &SILOS,
            &[
                ("Bank", [dec!(12), dec!(8), dec!(3), dec!(1)]),
                ("Exchange", [dec!(0), dec!(2), dec!(2), dec!(0)]),
            ],
        ),
        table(
            TableName::Assets,
            &SILOS,
            &[
                ("Crypto", [dec!(170), dec!(6), dec!(40), dec!(0)]),
                (RELATED_PARTY_RECEIVABLES, [dec!(0), dec!(7), dec!(0), dec!(0)]),
                (SUBSIDIARY_SALES, [dec!(0), dec!(4), dec!(10), dec!(0)]),
            ],
        ),
        table(
            TableName::Liabilities,
            &SILOS,
            &[("Customer Entitlements", [dec!(120), dec!(10), dec!(100), dec!(0)])],
        ),
        table(
            TableName::IntlCrypto,
            &LEDGER,
            &[
                (STABLECOIN, [z(), dec!(100), dec!(40), z()]),
                ("BTC", [dec!(600), dec!(30), dec!(30), z()]),
                ("ETH", [dec!(10000), dec!(20), dec!(20), z()]),
                (CATEGORY_A_TOTAL, [z(), dec!(50), z(), z()]),
                ("FTT", [z(), dec!(20), dec!(20), z()]),
                (CATEGORY_B_TOTAL, [z(), dec!(20), z(), z()]),
            ],
        ),
        table(
            TableName::UsCrypto,
            &LEDGER,
            &[
                (STABLECOIN, [z(), dec!(10), dec!(10), z()]),
                ("BTC", [dec!(1000), dec!(40), dec!(40), z()]),
                (CATEGORY_A_TOTAL, [z(), dec!(40), z(), z()]),
                (CATEGORY_B_TOTAL, [z(), z(), z(), z()]),
            ],
        ),
        table(
            TableName::IntlRelatedParty,
            &RELATED,
            &[
                ("Alameda", [dec!(5), dec!(10), z(), z()]),
                ("Ventures", [z(), z(), z(), z()]),
            ],
        ),
        table(
            TableName::UsRelatedParty,
            &RELATED,
            &[
                ("Alameda", [dec!(4), dec!(9), z(), z()]),
                ("WRS", [dec!(2), dec!(1), z(), z()]),
            ],
        ),
        table(
            TableName::AlamedaCrypto,
            &LEDGER,
            &[
                (STABLECOIN, [z(), dec!(8), z(), z()]),
                ("BTC", [dec!(200), dec!(12), z(), z()]),
                (CATEGORY_A_TOTAL, [z(), dec!(12), z(), z()]),
                ("SRM", [z(), dec!(6), z(), z()]),
                (CATEGORY_B_TOTAL, [z(), dec!(6), z(), z()]),
            ],
        ),
        table(
            TableName::Investments,
            &SILOS,
            &[
                (VENTURE_INVESTMENTS, [dec!(0), dec!(0), dec!(15), dec!(25)]),
                (LIQUID_SECURITIES, [dec!(0), dec!(0), dec!(3), dec!(0)]),
                (CLAWBACKS, [dec!(0), dec!(0), dec!(1), dec!(1)]),
            ],
        ),
    ])
    .unwrap()
}

pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

/// Close prices served from memory; unknown tickers fail.
#[derive(Default)]
pub struct FixedPrices {
    pub prices: HashMap<String, Decimal>,
    pub calls: usize,
}

impl FixedPrices {
    pub fn new(prices: &[(&str, Decimal)]) -> Self {
        Self {
            prices: prices.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
            calls: 0,
        }
    }
}

impl ClosePriceLookup for FixedPrices {
    fn close_price(&mut self, ticker: &str, _date: NaiveDate) -> Result<Decimal, PriceError> {
        self.calls += 1;
        self.prices
            .get(ticker)
            .copied()
            .ok_or_else(|| PriceError::FetchFailure {
                ticker: ticker.to_string(),
                reason: "connection timed out".into(),
            })
    }
}

pub fn located(snapshot: &Snapshot, name: TableName, row: &str) -> Decimal {
    snapshot.table(name).get(row, LOCATED_ASSETS).unwrap()
}
