use crate::pricing::cache::PriceCache;
use crate::pricing::source::{PriceError, PriceSource};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::thread;
use std::time::Duration;

/// Close-price lookup consumed by the live-price transform.
pub trait ClosePriceLookup {
    fn close_price(&mut self, ticker: &str, date: NaiveDate) -> Result<Decimal, PriceError>;
}

/// Cache-first close-price adapter over an external [`PriceSource`].
///
/// A cache hit never touches the network. A miss performs exactly one
/// request, records the price, and pauses when the provider reports quota
/// usage above `throttle_threshold`.
pub struct PriceRefresher<S> {
    source: S,
    cache: PriceCache,
    throttle_threshold: f64,
    throttle_pause: Duration,
    throttle_count: usize,
}

impl<S: PriceSource> PriceRefresher<S> {
    pub fn new(source: S, cache: PriceCache) -> Self {
        Self {
            source,
            cache,
            throttle_threshold: 0.8,
            throttle_pause: Duration::from_secs(1),
            throttle_count: 0,
        }
    }

    pub fn with_throttle(mut self, threshold: f64, pause: Duration) -> Self {
        self.throttle_threshold = threshold;
        self.throttle_pause = pause;
        self
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of times a lookup paused for the provider's rate limit.
    pub fn throttle_count(&self) -> usize {
        self.throttle_count
    }
}

impl<S: PriceSource> ClosePriceLookup for PriceRefresher<S> {
    fn close_price(&mut self, ticker: &str, date: NaiveDate) -> Result<Decimal, PriceError> {
        if let Some(price) = self.cache.get(ticker, date) {
            log::debug!("price cache hit for {ticker} on {date}");
            return Ok(price);
        }

        let day_close = self.source.day_close(ticker, date)?;
        if let Err(err) = self.cache.insert(ticker, date, day_close.close) {
            log::warn!("could not record {ticker} close in cache: {err}");
        }

        if let Some(usage) = day_close.rate_limit_usage {
            if usage > self.throttle_threshold {
                log::warn!(
                    "price provider quota {:.0}% used, pausing {:?}",
                    usage * 100.0,
                    self.throttle_pause
                );
                self.throttle_count += 1;
                thread::sleep(self.throttle_pause);
            }
        }
        Ok(day_close.close)
    }
}

/// Lookup used when no provider is configured: every ticker fails.
pub struct NoPriceSource;

impl ClosePriceLookup for NoPriceSource {
    fn close_price(&mut self, ticker: &str, _date: NaiveDate) -> Result<Decimal, PriceError> {
        Err(PriceError::NoSource {
            ticker: ticker.to_string(),
        })
    }
}
