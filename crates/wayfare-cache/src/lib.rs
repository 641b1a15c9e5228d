//! # Wayfare Cache
//!
//! Caching primitives for the CMS content pipeline:
//!
//! - [`Cache`] / [`InMemoryCache`]: serialized key/value store with TTLs
//! - [`TaggedCache`] / [`TagIndexedCache`]: tag index for selective purges
//! - [`RevalidatingCache`]: stale-while-revalidate over a tagged cache
//! - [`RequestMemo`]: single-flight memoization for one rendering pass
//!
//! ```
//! use wayfare_cache::{CachePolicy, Freshness, InMemoryCache, RevalidatingCache};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let cache = RevalidatingCache::new(Arc::new(InMemoryCache::new()));
//! let policy = CachePolicy::new("cms:page", Duration::from_secs(3600));
//!
//! let page = cache
//!     .get_or_revalidate("page:/about", &policy, || async { Ok::<_, String>("About".to_string()) })
//!     .await
//!     .unwrap();
//! assert_eq!(page.freshness, Freshness::Loaded);
//! # }
//! ```

#![warn(missing_docs)]

mod cache_trait;
mod error;
mod in_memory;
mod memo;
mod revalidate;
mod statistics;
mod tags;

pub use cache_trait::Cache;
pub use error::{CacheError, CacheResult};
pub use in_memory::InMemoryCache;
pub use memo::RequestMemo;
pub use revalidate::{CachePolicy, Cached, DEFAULT_SWEEP_INTERVAL, Freshness, RevalidatingCache};
pub use statistics::CacheStatistics;
pub use tags::{TagIndexedCache, TaggedCache};
