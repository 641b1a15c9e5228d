//! Process-local cache backend

use crate::cache_trait::Cache;
use crate::error::{CacheError, CacheResult};
use crate::statistics::CacheStatistics;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A serialized value and the instant it stops being served
#[derive(Debug)]
struct Slot {
	bytes: Vec<u8>,
	expires_at: Option<Instant>,
}

impl Slot {
	fn is_live(&self, now: Instant) -> bool {
		self.expires_at.is_none_or(|deadline| now < deadline)
	}
}

/// Cache backed by a `HashMap` behind a `tokio` `RwLock`.
///
/// Values are stored as JSON bytes, so a reader always gets its own copy.
/// Clones share the same store.
#[derive(Clone, Default)]
pub struct InMemoryCache {
	slots: Arc<RwLock<HashMap<String, Slot>>>,
	default_ttl: Option<Duration>,
	hits: Arc<AtomicU64>,
	misses: Arc<AtomicU64>,
}

impl std::fmt::Debug for InMemoryCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InMemoryCache")
			.field("default_ttl", &self.default_ttl)
			.finish_non_exhaustive()
	}
}

impl InMemoryCache {
	/// An empty cache whose entries live until deleted unless given a TTL
	///
	/// ```
	/// use wayfare_cache::{Cache, InMemoryCache};
	///
	/// # async fn example() {
	/// let cache = InMemoryCache::new();
	/// cache.set("greeting", &"hello", None).await.unwrap();
	///
	/// let hit: Option<String> = cache.get("greeting").await.unwrap();
	/// let miss: Option<String> = cache.get("farewell").await.unwrap();
	///
	/// let stats = cache.statistics().await;
	/// assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
	/// # }
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// TTL applied to entries stored without one
	pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
		self.default_ttl = Some(ttl);
		self
	}

	/// Current counters
	pub async fn statistics(&self) -> CacheStatistics {
		let slots = self.slots.read().await;
		CacheStatistics {
			hits: self.hits.load(Ordering::Relaxed),
			misses: self.misses.load(Ordering::Relaxed),
			entries: slots.len(),
			stored_bytes: slots.values().map(|slot| slot.bytes.len()).sum(),
		}
	}

	/// Stored keys in no particular order, expired ones included
	pub async fn keys(&self) -> Vec<String> {
		self.slots.read().await.keys().cloned().collect()
	}

	fn serialization_error(key: &str, source: serde_json::Error) -> CacheError {
		CacheError::Serialization {
			key: key.to_string(),
			source,
		}
	}
}

#[async_trait]
impl Cache for InMemoryCache {
	async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
	where
		T: DeserializeOwned + Send,
	{
		{
			let slots = self.slots.read().await;
			match slots.get(key) {
				Some(slot) if slot.is_live(Instant::now()) => {
					self.hits.fetch_add(1, Ordering::Relaxed);
					return serde_json::from_slice(&slot.bytes)
						.map(Some)
						.map_err(|source| Self::serialization_error(key, source));
				}
				None => {
					self.misses.fetch_add(1, Ordering::Relaxed);
					return Ok(None);
				}
				Some(_) => {}
			}
		}

		// Expired: drop the slot unless it was replaced after the read lock was released
		let mut slots = self.slots.write().await;
		if slots.get(key).is_some_and(|slot| !slot.is_live(Instant::now())) {
			slots.remove(key);
		}
		self.misses.fetch_add(1, Ordering::Relaxed);
		Ok(None)
	}

	async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
	where
		T: Serialize + Send + Sync,
	{
		let bytes = serde_json::to_vec(value).map_err(|source| Self::serialization_error(key, source))?;
		let slot = Slot {
			bytes,
			expires_at: ttl.or(self.default_ttl).map(|ttl| Instant::now() + ttl),
		};
		self.slots.write().await.insert(key.to_string(), slot);
		Ok(())
	}

	async fn delete(&self, key: &str) -> CacheResult<()> {
		self.slots.write().await.remove(key);
		Ok(())
	}

	async fn has_key(&self, key: &str) -> CacheResult<bool> {
		let now = Instant::now();
		Ok(self
			.slots
			.read()
			.await
			.get(key)
			.is_some_and(|slot| slot.is_live(now)))
	}

	async fn clear(&self) -> CacheResult<()> {
		self.slots.write().await.clear();
		Ok(())
	}

	async fn evict_expired(&self) -> CacheResult<Vec<String>> {
		let now = Instant::now();
		let mut slots = self.slots.write().await;
		let expired: Vec<String> = slots
			.iter()
			.filter(|(_, slot)| !slot.is_live(now))
			.map(|(key, _)| key.clone())
			.collect();
		for key in &expired {
			slots.remove(key);
		}
		Ok(expired)
	}
}
