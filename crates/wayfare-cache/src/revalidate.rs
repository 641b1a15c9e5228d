//! Stale-while-revalidate layer over a tagged cache
//!
//! An entry is *fresh* for its policy's TTL. After that it is *stale*: it is
//! still returned immediately, and the first reader to see it stale spawns a
//! background refresh. Readers never wait on a refresh. Failed loads are
//! never stored.

use crate::cache_trait::Cache;
use crate::tags::{TaggedCache, TagIndexedCache};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Freshness policy for one class of cached content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
	/// Tag attached to every entry stored under this policy
	pub tag: String,
	/// How long an entry is served without triggering a refresh
	pub ttl: Duration,
	/// How long past `ttl` a stale entry may still be served.
	/// `None` keeps stale entries until they are refreshed or invalidated.
	pub max_stale: Option<Duration>,
}

impl CachePolicy {
	/// Create a policy with the given tag and freshness window
	pub fn new(tag: impl Into<String>, ttl: Duration) -> Self {
		Self {
			tag: tag.into(),
			ttl,
			max_stale: None,
		}
	}

	/// Bound how long stale entries may be served
	pub fn with_max_stale(mut self, max_stale: Duration) -> Self {
		self.max_stale = Some(max_stale);
		self
	}

	fn hard_ttl(&self) -> Option<Duration> {
		self.max_stale.map(|stale| self.ttl + stale)
	}
}

/// How a value returned by [`RevalidatingCache::get_or_revalidate`] was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
	/// Served from cache within its TTL
	Fresh,
	/// Served from cache past its TTL; a background refresh was scheduled
	Stale,
	/// Not cached; loaded during this call
	Loaded,
}

/// A value together with how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
	/// The value
	pub value: T,
	/// How it was obtained
	pub freshness: Freshness,
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
	value: T,
	fresh_until: SystemTime,
}

/// Minimum time between two sweeps of expired entries
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Stale-while-revalidate cache
///
/// Expired entries are evicted on a cache miss at most once per sweep
/// interval, so keys that are never read again do not pile up.
pub struct RevalidatingCache<C: Cache + 'static> {
	tagged: Arc<TagIndexedCache<C>>,
	sweep_interval: Duration,
	last_sweep: Arc<Mutex<Instant>>,
	refreshing: Arc<Mutex<HashSet<String>>>,
	// Bumped on every invalidation of a tag; a load that started under an
	// older generation does not write its result back.
	generations: Arc<Mutex<HashMap<String, u64>>>,
}

impl<C: Cache + 'static> std::fmt::Debug for RevalidatingCache<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RevalidatingCache")
			.field("refreshing", &self.refreshing.lock().len())
			.finish_non_exhaustive()
	}
}

impl<C: Cache + 'static> Clone for RevalidatingCache<C> {
	fn clone(&self) -> Self {
		Self {
			tagged: Arc::clone(&self.tagged),
			sweep_interval: self.sweep_interval,
			last_sweep: Arc::clone(&self.last_sweep),
			refreshing: Arc::clone(&self.refreshing),
			generations: Arc::clone(&self.generations),
		}
	}
}

/// Removes a key from the in-flight refresh set when dropped, including on panic.
struct RefreshGuard {
	key: String,
	refreshing: Arc<Mutex<HashSet<String>>>,
}

impl Drop for RefreshGuard {
	fn drop(&mut self) {
		self.refreshing.lock().remove(&self.key);
	}
}

impl<C: Cache + 'static> RevalidatingCache<C> {
	/// Wrap a cache backend
	pub fn new(cache: Arc<C>) -> Self {
		Self {
			tagged: Arc::new(TagIndexedCache::new(cache)),
			sweep_interval: DEFAULT_SWEEP_INTERVAL,
			last_sweep: Arc::new(Mutex::new(Instant::now())),
			refreshing: Arc::new(Mutex::new(HashSet::new())),
			generations: Arc::new(Mutex::new(HashMap::new())),
		}
	}

	/// Change how often expired entries are swept
	pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
		self.sweep_interval = interval;
		self
	}

	/// The tagged cache underneath
	pub fn tagged(&self) -> &Arc<TagIndexedCache<C>> {
		&self.tagged
	}

	/// Return the cached value for `key`, loading it with `loader` on a miss.
	///
	/// A stale hit returns immediately and hands `loader` to a background
	/// task, unless a refresh for the same key is already running. Errors
	/// from `loader` are returned on a miss and logged on a background
	/// refresh; they are never cached.
	pub async fn get_or_revalidate<T, F, Fut, E>(
		&self,
		key: &str,
		policy: &CachePolicy,
		loader: F,
	) -> Result<Cached<T>, E>
	where
		T: Serialize + DeserializeOwned + Send + Sync + 'static,
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = Result<T, E>> + Send + 'static,
		E: std::fmt::Display + Send + 'static,
	{
		let lookup: crate::CacheResult<Option<Envelope<T>>> = self.tagged.get(key).await;
		let cached = match lookup {
			Ok(cached) => cached,
			Err(e) => {
				tracing::warn!(key, error = %e, "unreadable cache entry, treating as miss");
				None
			}
		};

		match cached {
			Some(envelope) if SystemTime::now() <= envelope.fresh_until => {
				tracing::debug!(key, "cache hit (fresh)");
				Ok(Cached {
					value: envelope.value,
					freshness: Freshness::Fresh,
				})
			}
			Some(envelope) => {
				tracing::debug!(key, "cache hit (stale), scheduling refresh");
				self.spawn_refresh(key, policy, loader);
				Ok(Cached {
					value: envelope.value,
					freshness: Freshness::Stale,
				})
			}
			None => {
				tracing::debug!(key, "cache miss");
				self.sweep_if_due().await;
				let generation = self.generation(&policy.tag);
				let value = loader().await?;
				let envelope = Envelope {
					value,
					fresh_until: SystemTime::now() + policy.ttl,
				};
				Self::store(&self.tagged, &self.generations, key, policy, generation, &envelope)
					.await;
				Ok(Cached {
					value: envelope.value,
					freshness: Freshness::Loaded,
				})
			}
		}
	}

	/// Purge every entry stored under `tag`
	pub async fn invalidate_tag(&self, tag: &str) -> crate::CacheResult<()> {
		*self.generations.lock().entry(tag.to_string()).or_insert(0) += 1;
		self.tagged.purge_tag(tag).await.map(|_| ())
	}

	/// Whether a background refresh for `key` is currently running
	pub fn is_refreshing(&self, key: &str) -> bool {
		self.refreshing.lock().contains(key)
	}

	async fn sweep_if_due(&self) {
		let due = {
			let mut last = self.last_sweep.lock();
			let due = last.elapsed() >= self.sweep_interval;
			if due {
				*last = Instant::now();
			}
			due
		};
		if !due {
			return;
		}
		if let Err(e) = self.tagged.evict_expired().await {
			tracing::warn!(error = %e, "sweeping expired cache entries failed");
		}
	}

	fn generation(&self, tag: &str) -> u64 {
		self.generations.lock().get(tag).copied().unwrap_or(0)
	}

	fn spawn_refresh<T, F, Fut, E>(&self, key: &str, policy: &CachePolicy, loader: F)
	where
		T: Serialize + DeserializeOwned + Send + Sync + 'static,
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = Result<T, E>> + Send + 'static,
		E: std::fmt::Display + Send + 'static,
	{
		if !self.refreshing.lock().insert(key.to_string()) {
			tracing::debug!(key, "refresh already in flight");
			return;
		}

		let guard = RefreshGuard {
			key: key.to_string(),
			refreshing: Arc::clone(&self.refreshing),
		};
		let tagged = Arc::clone(&self.tagged);
		let generations = Arc::clone(&self.generations);
		let generation = self.generation(&policy.tag);
		let policy = policy.clone();
		let key = key.to_string();

		tokio::spawn(async move {
			let _guard = guard;
			match loader().await {
				Ok(value) => {
					let envelope = Envelope {
						value,
						fresh_until: SystemTime::now() + policy.ttl,
					};
					Self::store(&tagged, &generations, &key, &policy, generation, &envelope).await;
					tracing::debug!(key = %key, "background refresh stored");
				}
				Err(e) => {
					tracing::warn!(key = %key, error = %e, "background refresh failed, keeping stale entry");
				}
			}
		});
	}

	async fn store<T>(
		tagged: &TagIndexedCache<C>,
		generations: &Mutex<HashMap<String, u64>>,
		key: &str,
		policy: &CachePolicy,
		generation: u64,
		envelope: &Envelope<T>,
	) where
		T: Serialize + Send + Sync,
	{
		let current = generations.lock().get(&policy.tag).copied().unwrap_or(0);
		if current != generation {
			tracing::debug!(key, tag = %policy.tag, "tag invalidated during load, not storing");
			return;
		}
		if let Err(e) = tagged
			.set_tagged(key, envelope, policy.hard_ttl(), &[policy.tag.as_str()])
			.await
		{
			tracing::warn!(key, error = %e, "failed to store cache entry");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::InMemoryCache;
	use rstest::rstest;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn counting_loader(
		calls: &Arc<AtomicUsize>,
		value: &'static str,
	) -> impl Send + 'static + FnOnce() -> std::future::Ready<Result<String, String>> {
		let calls = Arc::clone(calls);
		move || {
			calls.fetch_add(1, Ordering::SeqCst);
			std::future::ready(Ok(value.to_string()))
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_miss_then_fresh_hit() {
		// Arrange
		let cache = RevalidatingCache::new(Arc::new(InMemoryCache::new()));
		let policy = CachePolicy::new("cms:page", Duration::from_secs(60));
		let calls = Arc::new(AtomicUsize::new(0));

		// Act
		let first = cache
			.get_or_revalidate("k", &policy, counting_loader(&calls, "v1"))
			.await
			.unwrap();
		let second = cache
			.get_or_revalidate("k", &policy, counting_loader(&calls, "v2"))
			.await
			.unwrap();

		// Assert
		assert_eq!(first.freshness, Freshness::Loaded);
		assert_eq!(second.freshness, Freshness::Fresh);
		assert_eq!(second.value, "v1");
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_stale_hit_serves_old_value_and_refreshes() {
		// Arrange
		let cache = RevalidatingCache::new(Arc::new(InMemoryCache::new()));
		let short = CachePolicy::new("cms:package-list", Duration::from_millis(20));
		let long = CachePolicy::new("cms:package-list", Duration::from_secs(60));
		let calls = Arc::new(AtomicUsize::new(0));
		cache
			.get_or_revalidate("k", &short, counting_loader(&calls, "old"))
			.await
			.unwrap();
		tokio::time::sleep(Duration::from_millis(40)).await;

		// Act
		let stale = cache
			.get_or_revalidate("k", &long, counting_loader(&calls, "new"))
			.await
			.unwrap();
		for _ in 0..50 {
			if !cache.is_refreshing("k") {
				break;
			}
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
		let refreshed = cache
			.get_or_revalidate("k", &long, counting_loader(&calls, "newer"))
			.await
			.unwrap();

		// Assert
		assert_eq!(stale.freshness, Freshness::Stale);
		assert_eq!(stale.value, "old");
		assert_eq!(refreshed.freshness, Freshness::Fresh);
		assert_eq!(refreshed.value, "new");
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_miss_sweeps_entries_past_their_hard_ttl() {
		// Arrange
		let cache = RevalidatingCache::new(Arc::new(InMemoryCache::new()))
			.with_sweep_interval(Duration::ZERO);
		let policy = CachePolicy::new("cms:page", Duration::from_millis(5))
			.with_max_stale(Duration::from_millis(5));
		let calls = Arc::new(AtomicUsize::new(0));
		for i in 0..200 {
			cache
				.get_or_revalidate(&format!("page:/{i}"), &policy, counting_loader(&calls, "v"))
				.await
				.unwrap();
		}
		tokio::time::sleep(Duration::from_millis(50)).await;

		// Act
		cache
			.get_or_revalidate("page:/new", &policy, counting_loader(&calls, "v"))
			.await
			.unwrap();

		// Assert
		assert_eq!(cache.tagged().inner().statistics().await.entries, 1);
		assert_eq!(cache.tagged().tagged_keys("cms:page").await, vec!["page:/new"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_loader_error_is_not_cached() {
		let cache = RevalidatingCache::new(Arc::new(InMemoryCache::new()));
		let policy = CachePolicy::new("cms:package", Duration::from_secs(60));

		let failed: Result<Cached<String>, String> = cache
			.get_or_revalidate("k", &policy, || async { Err("boom".to_string()) })
			.await;
		let retried: Result<Cached<String>, String> = cache
			.get_or_revalidate("k", &policy, || async { Ok("ok".to_string()) })
			.await;

		assert_eq!(failed, Err("boom".to_string()));
		assert_eq!(retried.unwrap().freshness, Freshness::Loaded);
	}

	#[rstest]
	#[tokio::test]
	async fn test_invalidate_tag_only_purges_that_class() {
		// Arrange
		let cache = RevalidatingCache::new(Arc::new(InMemoryCache::new()));
		let pages = CachePolicy::new("cms:page", Duration::from_secs(60));
		let packages = CachePolicy::new("cms:package", Duration::from_secs(60));
		let calls = Arc::new(AtomicUsize::new(0));
		cache
			.get_or_revalidate("page", &pages, counting_loader(&calls, "p"))
			.await
			.unwrap();
		cache
			.get_or_revalidate("package", &packages, counting_loader(&calls, "k"))
			.await
			.unwrap();

		// Act
		cache.invalidate_tag("cms:page").await.unwrap();
		let page = cache
			.get_or_revalidate("page", &pages, counting_loader(&calls, "p2"))
			.await
			.unwrap();
		let package = cache
			.get_or_revalidate("package", &packages, counting_loader(&calls, "k2"))
			.await
			.unwrap();

		// Assert
		assert_eq!(page.freshness, Freshness::Loaded);
		assert_eq!(page.value, "p2");
		assert_eq!(package.freshness, Freshness::Fresh);
		assert_eq!(package.value, "k");
	}
}
