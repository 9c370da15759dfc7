use crate::core::table::TableName;
use crate::recovery::calculator::{exchange_breakdown, ExchangeBreakdown, ExchangeKey, RecoveryError};
use crate::scenario::composer::{ScenarioOutcome, Transform};
use crate::scenario::selection::Selection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// A recovery figure as presented to a reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum RecoveryRate {
    /// Assets ÷ liabilities × 100, unrounded.
    Value(Decimal),
    /// No consolidation toggle applies to this exchange, so the raw
    /// balance sheet has no combined recovery figure.
    NotApplicable,
    /// The figure cannot be trusted: a price refresh failed or the
    /// liabilities are zero.
    Unavailable(String),
}

impl RecoveryRate {
    /// Rendered text. FTX.US is capped at 100% here and only here; the
    /// underlying value is left as computed.
    pub fn display_for(&self, exchange: ExchangeKey) -> String {
        match self {
            RecoveryRate::Value(pct) => {
                let shown = match exchange {
                    ExchangeKey::Us => (*pct).min(Decimal::ONE_HUNDRED),
                    ExchangeKey::Dotcom => *pct,
                };
                format!("{:.2}%", shown.round_dp(2))
            }
            RecoveryRate::NotApplicable => "N/A".to_string(),
            RecoveryRate::Unavailable(_) => "unavailable".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExchangeReport {
    pub exchange: ExchangeKey,
    pub breakdown: ExchangeBreakdown,
    pub rate: RecoveryRate,
    pub displayed: String,
}

/// Per-exchange breakdowns and recovery figures for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryReport {
    pub scenario: String,
    pub applied: Vec<Transform>,
    pub exchanges: Vec<ExchangeReport>,
    pub price_failures: Vec<String>,
}

impl RecoveryReport {
    /// Build the report for a composed scenario.
    ///
    /// A missing row in an exchange ledger aborts the whole report. Zero
    /// liabilities and failed price lookups only mark the affected
    /// figures unavailable; breakdowns are still produced. A failed ticker
    /// affects an exchange only if a ledger feeding it holds that ticker.
    pub fn build(outcome: &ScenarioOutcome, selection: &Selection) -> Result<Self, RecoveryError> {
        let price_failures: Vec<String> =
            outcome.price_failures.iter().map(|e| e.to_string()).collect();

        let mut exchanges = Vec::with_capacity(ExchangeKey::ALL.len());
        for exchange in ExchangeKey::ALL {
            let breakdown = exchange_breakdown(&outcome.snapshot, exchange)?;
            let relevant = exchange
                .consolidation_keys()
                .iter()
                .any(|key| selection.contains(*key));

            let ledgers = feeding_ledgers(exchange, &outcome.applied);
            let stale: Vec<&str> = outcome
                .price_failures
                .iter()
                .map(|e| e.ticker())
                .filter(|ticker| {
                    ledgers
                        .iter()
                        .any(|name| outcome.snapshot.table(*name).has_row(ticker))
                })
                .collect();

            let rate = if !relevant {
                RecoveryRate::NotApplicable
            } else if !stale.is_empty() {
                RecoveryRate::Unavailable(format!("price refresh failed for {}", stale.join(", ")))
            } else {
                match breakdown.recovery_percent() {
                    Ok(pct) => RecoveryRate::Value(pct),
                    Err(err @ RecoveryError::DivisionByZero { .. }) => {
                        RecoveryRate::Unavailable(err.to_string())
                    }
                    Err(err) => return Err(err),
                }
            };

            exchanges.push(ExchangeReport {
                exchange,
                displayed: rate.display_for(exchange),
                breakdown,
                rate,
            });
        }

        Ok(Self {
            scenario: selection.to_string(),
            applied: outcome.applied.clone(),
            exchanges,
            price_failures,
        })
    }

    pub fn exchange(&self, exchange: ExchangeKey) -> Option<&ExchangeReport> {
        self.exchanges.iter().find(|r| r.exchange == exchange)
    }
}

/// Crypto ledgers whose located amounts reach an exchange's balance sheet.
///
/// Alameda's ledger feeds FTX.COM only when a transform merged it in.
fn feeding_ledgers(exchange: ExchangeKey, applied: &[Transform]) -> Vec<TableName> {
    let mut ledgers = vec![exchange.crypto_table()];
    let alameda_merged = applied.iter().any(|t| {
        matches!(
            t,
            Transform::ConsolidateAlamedaVenturesDotcom | Transform::ClaimAgainstAlameda
        )
    });
    if exchange == ExchangeKey::Dotcom && alameda_merged {
        ledgers.push(TableName::AlamedaCrypto);
    }
    ledgers
}

impl fmt::Display for RecoveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Recovery Report ===")?;
        writeln!(f, "Scenario:   {}", self.scenario)?;
        if !self.applied.is_empty() {
            let steps: Vec<String> = self.applied.iter().map(|t| t.to_string()).collect();
            writeln!(f, "Applied:    {}", steps.join(" → "))?;
        }
        for failure in &self.price_failures {
            writeln!(f, "Warning:    {}", failure)?;
        }

        for report in &self.exchanges {
            let b = &report.breakdown;
            writeln!(f, "\n--- {} ($ in mm) ---", report.exchange)?;
            writeln!(f, "  Assets:")?;
            for line in &b.assets {
                writeln!(f, "    {:<34} {:>12}", line.label, line.amount)?;
            }
            writeln!(f, "    {:<34} {:>12}", "Total", b.total_assets())?;
            writeln!(f, "  Liabilities:")?;
            for line in &b.liabilities {
                writeln!(f, "    {:<34} {:>12}", line.label, line.amount)?;
            }
            writeln!(f, "    {:<34} {:>12}", "Total", b.total_liabilities())?;
            writeln!(f, "  Recovery:   {}", report.displayed)?;
            if let RecoveryRate::Unavailable(reason) = &report.rate {
                writeln!(f, "              ({})", reason)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_formats() {
        let rate = RecoveryRate::Value(dec!(145.8333));
        assert_eq!(rate.display_for(ExchangeKey::Dotcom), "145.83%");
        assert_eq!(RecoveryRate::Value(dec!(155)).display_for(ExchangeKey::Dotcom), "155.00%");
        assert_eq!(RecoveryRate::NotApplicable.display_for(ExchangeKey::Us), "N/A");
        assert_eq!(
            RecoveryRate::Unavailable("x".into()).display_for(ExchangeKey::Us),
            "unavailable"
        );
    }

    #[test]
    fn test_us_capped_only_at_display() {
        let rate = RecoveryRate::Value(dec!(123.4));
        assert_eq!(rate.display_for(ExchangeKey::Us), "100.00%");
        assert_eq!(rate.display_for(ExchangeKey::Dotcom), "123.40%");
        assert_eq!(rate, RecoveryRate::Value(dec!(123.4)));
    }

    #[test]
    fn test_alameda_ledger_feeds_dotcom_only_when_merged() {
        assert_eq!(feeding_ledgers(ExchangeKey::Dotcom, &[]), vec![TableName::IntlCrypto]);
        assert_eq!(
            feeding_ledgers(ExchangeKey::Dotcom, &[Transform::ClaimAgainstAlameda]),
            vec![TableName::IntlCrypto, TableName::AlamedaCrypto]
        );
        assert_eq!(
            feeding_ledgers(
                ExchangeKey::Us,
                &[Transform::ConsolidateAlamedaVenturesDotcom, Transform::ConsolidateWrs]
            ),
            vec![TableName::UsCrypto]
        );
    }

    #[test]
    fn test_rate_serialization() {
        let json = serde_json::to_string(&RecoveryRate::NotApplicable).unwrap();
        assert_eq!(json, r#"{"status":"not_applicable"}"#);
    }
}
