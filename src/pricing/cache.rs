use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors arising from the persisted price cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("price cache '{path}' is unreadable: {reason}")]
    Corruption { path: String, reason: String },
    #[error("failed to write price cache '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize price cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only (ticker, calendar date) → close price cache.
///
/// Persisted as a JSON object keyed `"TICKER:YYYY-MM-DD"`. When backed by
/// a file, every new entry is written through before `insert` returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceCache {
    #[serde(with = "entries_serde")]
    entries: BTreeMap<(String, NaiveDate), Decimal>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

mod entries_serde {
    use super::*;
    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;

    pub fn serialize<S: serde::Serializer>(
        entries: &BTreeMap<(String, NaiveDate), Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for ((ticker, date), price) in entries {
            map.serialize_entry(&format!("{}:{}", ticker, date.format("%Y-%m-%d")), price)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<(String, NaiveDate), Decimal>, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = BTreeMap<(String, NaiveDate), Decimal>;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map with \"ticker:date\" keys")
            }
            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut map = BTreeMap::new();
                while let Some((key, value)) = access.next_entry::<String, Decimal>()? {
                    let (ticker, date) = key
                        .split_once(':')
                        .ok_or_else(|| de::Error::custom(format!("invalid key: {key}")))?;
                    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                        .map_err(|e| de::Error::custom(format!("invalid date in {key}: {e}")))?;
                    map.insert((ticker.to_string(), date), value);
                }
                Ok(map)
            }
        }
        deserializer.deserialize_map(V)
    }
}

impl PriceCache {
    /// An in-memory cache that is never persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the cache at `path`.
    ///
    /// A missing file yields an empty cache. An unreadable or corrupt file
    /// is logged and also treated as empty; the next insert rewrites it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("{err}; starting with an empty price cache");
                BTreeMap::new()
            }
        };
        log::debug!("price cache {} holds {} entries", path.display(), entries.len());
        Self {
            entries,
            path: Some(path),
        }
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<(String, NaiveDate), Decimal>, CacheError> {
        let corruption = |reason: String| CacheError::Corruption {
            path: path.display().to_string(),
            reason,
        };
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(corruption(e.to_string())),
        };
        let cache: PriceCache =
            serde_json::from_str(&content).map_err(|e| corruption(e.to_string()))?;
        Ok(cache.entries)
    }

    pub fn get(&self, ticker: &str, date: NaiveDate) -> Option<Decimal> {
        self.entries.get(&(ticker.to_string(), date)).copied()
    }

    /// Record a close price. Existing entries are never overwritten;
    /// returns whether the entry was new.
    pub fn insert(&mut self, ticker: &str, date: NaiveDate, price: Decimal) -> Result<bool, CacheError> {
        let key = (ticker.to_string(), date);
        if self.entries.contains_key(&key) {
            return Ok(false);
        }
        self.entries.insert(key, price);
        self.persist()?;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io = |source: std::io::Error| CacheError::Io {
            path: path.display().to_string(),
            source,
        };
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io)?;
        fs::rename(&tmp, path).map_err(io)?;
        Ok(())
    }
}
