use crate::core::labels::DEFAULT_LIQUID_TICKERS;
use crate::core::snapshot::Snapshot;
use crate::pricing::refresher::{ClosePriceLookup, NoPriceSource};
use crate::pricing::source::PriceError;
use crate::scenario::selection::{AlamedaTreatment, ScenarioKey, Selection};
use crate::scenario::transforms::{self, TransformError};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of the scenario pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transform {
    InjectLivePrices,
    ClaimAgainstAlameda,
    ConsolidateAlamedaVenturesDotcom,
    ConsolidateWrs,
    ZeroCategoryB,
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transform::InjectLivePrices => "inject live prices",
            Transform::ClaimAgainstAlameda => "claim against Alameda",
            Transform::ConsolidateAlamedaVenturesDotcom => "consolidate Alameda + Ventures + Dotcom",
            Transform::ConsolidateWrs => "consolidate WRS",
            Transform::ZeroCategoryB => "zero category B",
        };
        f.write_str(name)
    }
}

/// The transforms a selection runs, in pipeline order.
///
/// The order is fixed and independent of the order keys were toggled:
/// prices first so consolidation reads fresh amounts, then the Alameda
/// treatment, then WRS, and category B zeroing last so it also clears
/// amounts the merges brought in. The Alameda step follows the
/// selection's tracked [`AlamedaTreatment`], so CLAIM_ALAMEDA is dropped
/// while SUBCON is on and comes back once SUBCON is switched off.
pub fn plan(selection: &Selection) -> Vec<Transform> {
    let mut steps = Vec::with_capacity(4);
    if selection.contains(ScenarioKey::CategoryAUpdate) {
        steps.push(Transform::InjectLivePrices);
    }
    match selection.alameda_treatment() {
        AlamedaTreatment::ClaimSelected => steps.push(Transform::ClaimAgainstAlameda),
        AlamedaTreatment::SubconSelected => steps.push(Transform::ConsolidateAlamedaVenturesDotcom),
        AlamedaTreatment::None => {}
    }
    if selection.contains(ScenarioKey::SubconUs) {
        steps.push(Transform::ConsolidateWrs);
    }
    if selection.contains(ScenarioKey::ZeroSam) {
        steps.push(Transform::ZeroCategoryB);
    }
    steps
}

/// An adjusted snapshot and how it was produced.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub snapshot: Snapshot,
    pub applied: Vec<Transform>,
    /// Tickers that kept baseline amounts because their price lookup failed.
    pub price_failures: Vec<PriceError>,
}

impl ScenarioOutcome {
    pub fn prices_complete(&self) -> bool {
        self.price_failures.is_empty()
    }
}

/// Evaluates scenarios against an immutable baseline.
///
/// Every call to [`compose`](Self::compose) starts from a fresh copy of
/// the baseline, so results depend only on the selection passed in.
pub struct ScenarioComposer<'a> {
    baseline: &'a Snapshot,
    prices: Option<&'a mut dyn ClosePriceLookup>,
    tickers: Vec<String>,
    as_of: NaiveDate,
}

impl<'a> ScenarioComposer<'a> {
    pub fn new(baseline: &'a Snapshot) -> Self {
        Self {
            baseline,
            prices: None,
            tickers: DEFAULT_LIQUID_TICKERS.iter().map(|t| t.to_string()).collect(),
            as_of: Utc::now().date_naive(),
        }
    }

    pub fn with_prices(mut self, prices: &'a mut dyn ClosePriceLookup) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn with_tickers(mut self, tickers: Vec<String>) -> Self {
        self.tickers = tickers;
        self
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn baseline(&self) -> &Snapshot {
        self.baseline
    }

    pub fn compose(&mut self, selection: &Selection) -> Result<ScenarioOutcome, TransformError> {
        let steps = plan(selection);
        let mut snapshot = self.baseline.clone();
        let mut price_failures = Vec::new();

        for step in &steps {
            log::debug!("applying {step}");
            snapshot = match step {
                Transform::InjectLivePrices => {
                    let mut unconfigured = NoPriceSource;
                    let prices: &mut dyn ClosePriceLookup = match self.prices.as_deref_mut() {
                        Some(prices) => prices,
                        None => &mut unconfigured,
                    };
                    let injected =
                        transforms::inject_live_prices(snapshot, &self.tickers, prices, self.as_of)?;
                    price_failures = injected.failures;
                    injected.snapshot
                }
                Transform::ClaimAgainstAlameda => transforms::claim_against_alameda(snapshot)?,
                Transform::ConsolidateAlamedaVenturesDotcom => {
                    transforms::consolidate_alameda_ventures_dotcom(snapshot)?
                }
                Transform::ConsolidateWrs => transforms::consolidate_wrs(snapshot)?,
                Transform::ZeroCategoryB => transforms::zero_category_b(snapshot),
            };
        }

        if selection.contains(ScenarioKey::ClaimAlameda)
            && !steps.contains(&Transform::ClaimAgainstAlameda)
        {
            log::info!("CLAIM_ALAMEDA suppressed: SUBCON consolidates Alameda instead");
        }
        log::info!(
            "composed scenario {selection} ({} transforms, {} price failures)",
            steps.len(),
            price_failures.len()
        );

        Ok(ScenarioOutcome {
            snapshot,
            applied: steps,
            price_failures,
        })
    }
}
