use chrono::{Duration as Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors arising from close-price lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price fetch for {ticker} failed: {reason}")]
    FetchFailure { ticker: String, reason: String },
    #[error("no price source configured for {ticker}")]
    NoSource { ticker: String },
}

impl PriceError {
    pub fn ticker(&self) -> &str {
        match self {
            PriceError::FetchFailure { ticker, .. } | PriceError::NoSource { ticker } => ticker,
        }
    }
}

/// A prior-day close as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct DayClose {
    pub close: Decimal,
    /// Fraction of the provider's request quota already used, if reported.
    pub rate_limit_usage: Option<f64>,
}

/// External daily close-price provider.
pub trait PriceSource {
    /// Close of the trading day before `date` for `ticker`, quoted in USD.
    fn day_close(&mut self, ticker: &str, date: NaiveDate) -> Result<DayClose, PriceError>;
}

#[derive(Deserialize)]
struct OpenCloseResponse {
    close: f64,
}

/// Blocking HTTP client against a Polygon-style open/close endpoint.
///
/// Every request is bounded by the client timeout.
pub struct HttpPriceSource {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpPriceSource {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PriceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("estate-recovery/0.1")
            .build()
            .map_err(|e| PriceError::FetchFailure {
                ticker: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, ticker: &str, day: NaiveDate) -> String {
        format!(
            "{}/v1/open-close/crypto/{}/USD/{}",
            self.base_url,
            ticker,
            day.format("%Y-%m-%d")
        )
    }
}

impl PriceSource for HttpPriceSource {
    fn day_close(&mut self, ticker: &str, date: NaiveDate) -> Result<DayClose, PriceError> {
        let failure = |reason: String| PriceError::FetchFailure {
            ticker: ticker.to_string(),
            reason,
        };
        let prior_day = date - Days::days(1);
        let mut request = self.client.get(self.url(ticker, prior_day)).query(&[("adjusted", "true")]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apiKey", key.as_str())]);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                failure("request timed out".to_string())
            } else {
                failure(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(format!("provider returned {status}")));
        }

        let rate_limit_usage = rate_limit_usage(
            header_number(response.headers(), "x-ratelimit-limit"),
            header_number(response.headers(), "x-ratelimit-remaining"),
        );

        let body: OpenCloseResponse = response
            .json()
            .map_err(|e| failure(format!("malformed response: {e}")))?;
        let close = close_to_decimal(body.close)
            .filter(|c| *c > Decimal::ZERO)
            .ok_or_else(|| failure(format!("invalid close price {}", body.close)))?;

        log::debug!("fetched {ticker} close for {prior_day}: {close}");
        Ok(DayClose {
            close,
            rate_limit_usage,
        })
    }
}

/// Decimal of the shortest text that round-trips `close`, so a quoted
/// `0.15` stays exactly `0.15` rather than its binary expansion.
fn close_to_decimal(close: f64) -> Option<Decimal> {
    if !close.is_finite() {
        return None;
    }
    close.to_string().parse().ok()
}

fn header_number(headers: &reqwest::header::HeaderMap, name: &str) -> Option<f64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Quota usage as a fraction: `(limit - remaining) / limit`.
pub fn rate_limit_usage(limit: Option<f64>, remaining: Option<f64>) -> Option<f64> {
    match (limit, remaining) {
        (Some(limit), Some(remaining)) if limit > 0.0 => {
            Some(((limit - remaining) / limit).clamp(0.0, 1.0))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use httpmock::{Method::GET, MockServer};
    use rust_decimal_macros::dec;

    #[test]
    fn test_rate_limit_usage() {
        assert_relative_eq!(rate_limit_usage(Some(100.0), Some(15.0)).unwrap(), 0.85);
        assert_relative_eq!(rate_limit_usage(Some(5.0), Some(5.0)).unwrap(), 0.0);
        assert_eq!(rate_limit_usage(Some(0.0), Some(0.0)), None);
        assert_eq!(rate_limit_usage(None, Some(3.0)), None);
    }

    #[test]
    fn test_url_targets_prior_day_endpoint() {
        let source =
            HttpPriceSource::new("https://api.example.com/", None, Duration::from_secs(1)).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(
            source.url("BTC", day),
            "https://api.example.com/v1/open-close/crypto/BTC/USD/2026-03-01"
        );
    }

    #[test]
    fn test_close_keeps_quoted_digits() {
        assert_eq!(close_to_decimal(0.15), Some(dec!(0.15)));
        assert_eq!(close_to_decimal(64250.5), Some(dec!(64250.5)));
        assert_eq!(close_to_decimal(f64::NAN), None);
    }

    fn source_for(server: &MockServer) -> HttpPriceSource {
        HttpPriceSource::new(server.base_url(), Some("k".into()), Duration::from_secs(2)).unwrap()
    }

    fn march(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_day_close_decodes_price_and_usage() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/open-close/crypto/DOGE/USD/2026-03-01")
                .query_param("adjusted", "true")
                .query_param("apiKey", "k");
            then.status(200)
                .header("x-ratelimit-limit", "100")
                .header("x-ratelimit-remaining", "10")
                .header("content-type", "application/json")
                .body(r#"{"symbol": "DOGE-USD", "close": 0.15}"#);
        });

        let close = source_for(&server).day_close("DOGE", march(2)).unwrap();
        mock.assert();
        assert_eq!(close.close, dec!(0.15));
        assert_relative_eq!(close.rate_limit_usage.unwrap(), 0.9);
    }

    #[test]
    fn test_day_close_without_usage_headers() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/open-close/crypto/BTC/USD/2026-03-01");
            then.status(200).body(r#"{"close": 64250.5}"#);
        });

        let close = source_for(&server).day_close("BTC", march(2)).unwrap();
        assert_eq!(close.close, dec!(64250.5));
        assert_eq!(close.rate_limit_usage, None);
    }

    #[test]
    fn test_error_status_is_fetch_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/open-close/crypto/LUNA/USD/2026-03-01");
            then.status(404).body(r#"{"status": "NOT_FOUND"}"#);
        });

        let err = source_for(&server).day_close("LUNA", march(2)).unwrap_err();
        match err {
            PriceError::FetchFailure { ticker, reason } => {
                assert_eq!(ticker, "LUNA");
                assert!(reason.contains("404"), "{reason}");
            }
            other => panic!("expected FetchFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_close_is_fetch_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/open-close/crypto/ETH/USD/2026-03-01");
            then.status(200).body(r#"{"open": 3100.0}"#);
        });

        let err = source_for(&server).day_close("ETH", march(2)).unwrap_err();
        assert!(
            matches!(&err, PriceError::FetchFailure { reason, .. } if reason.contains("malformed")),
            "{err:?}"
        );
    }

    #[test]
    fn test_non_positive_close_is_fetch_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/open-close/crypto/FTT/USD/2026-03-01");
            then.status(200).body(r#"{"close": 0}"#);
        });

        let err = source_for(&server).day_close("FTT", march(2)).unwrap_err();
        assert!(matches!(err, PriceError::FetchFailure { .. }));
    }

    #[test]
    fn test_unreachable_provider_fails_fast() {
        // Port 9 on localhost is discard; nothing should be listening.
        let mut source =
            HttpPriceSource::new("http://127.0.0.1:9", None, Duration::from_millis(200)).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let err = source.day_close("BTC", date).unwrap_err();
        assert_eq!(err.ticker(), "BTC");
        assert!(matches!(err, PriceError::FetchFailure { .. }));
    }
}
