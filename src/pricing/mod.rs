//! Daily close-price refresh with a persistent on-disk cache.

pub mod cache;
pub mod refresher;
pub mod source;
