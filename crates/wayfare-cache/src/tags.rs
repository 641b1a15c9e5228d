//! Tag index over a [`Cache`]
//!
//! Every content class stores its entries under one tag, so purging a class
//! never touches entries of another.

use crate::cache_trait::Cache;
use crate::error::CacheResult;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// A cache whose entries can be purged by tag
///
/// ```
/// use wayfare_cache::{InMemoryCache, TagIndexedCache, TaggedCache};
/// use std::sync::Arc;
///
/// # async fn example() -> wayfare_cache::CacheResult<()> {
/// let cache = TagIndexedCache::new(Arc::new(InMemoryCache::new()));
/// cache.set_tagged("page:/about", &"About", None, &["cms:page"]).await?;
/// cache.set_tagged("package:bali", &"Bali", None, &["cms:package"]).await?;
///
/// assert_eq!(cache.purge_tag("cms:page").await?, 1);
///
/// let page: Option<String> = cache.get("page:/about").await?;
/// let package: Option<String> = cache.get("package:bali").await?;
/// assert_eq!((page, package), (None, Some("Bali".to_string())));
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TaggedCache: Send + Sync {
	/// Store `value` and file `key` under every tag in `tags`
	async fn set_tagged<T>(
		&self,
		key: &str,
		value: &T,
		ttl: Option<Duration>,
		tags: &[&str],
	) -> CacheResult<()>
	where
		T: Serialize + Send + Sync;

	/// Delete every entry filed under `tag`, returning how many were removed
	async fn purge_tag(&self, tag: &str) -> CacheResult<usize>;

	/// Keys currently filed under `tag`, sorted
	async fn tagged_keys(&self, tag: &str) -> Vec<String>;

	/// Read a value from the backend
	async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
	where
		T: DeserializeOwned + Send;

	/// Delete one entry and drop it from every tag
	async fn remove(&self, key: &str) -> CacheResult<()>;

	/// Evict expired entries from the backend and drop them from every tag,
	/// returning how many were evicted
	async fn evict_expired(&self) -> CacheResult<usize>;
}

/// Keys by tag and tags by key
#[derive(Debug, Default)]
struct TagIndex {
	by_tag: HashMap<String, BTreeSet<String>>,
	by_key: HashMap<String, BTreeSet<String>>,
}

impl TagIndex {
	fn link(&mut self, key: &str, tags: &[&str]) {
		let key_tags = self.by_key.entry(key.to_owned()).or_default();
		for &tag in tags {
			key_tags.insert(tag.to_owned());
			self.by_tag.entry(tag.to_owned()).or_default().insert(key.to_owned());
		}
	}

	fn unlink(&mut self, key: &str) {
		let Some(tags) = self.by_key.remove(key) else {
			return;
		};
		for tag in tags {
			let now_empty = self.by_tag.get_mut(&tag).is_some_and(|keys| {
				keys.remove(key);
				keys.is_empty()
			});
			if now_empty {
				self.by_tag.remove(&tag);
			}
		}
	}

	fn is_linked(&self, key: &str) -> bool {
		self.by_key.contains_key(key)
	}

	fn keys(&self, tag: &str) -> Vec<String> {
		self.by_tag
			.get(tag)
			.map(|keys| keys.iter().cloned().collect())
			.unwrap_or_default()
	}
}

/// [`TaggedCache`] over any [`Cache`] backend
pub struct TagIndexedCache<C: Cache> {
	store: Arc<C>,
	index: RwLock<TagIndex>,
}

impl<C: Cache + std::fmt::Debug> std::fmt::Debug for TagIndexedCache<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TagIndexedCache")
			.field("store", &self.store)
			.finish_non_exhaustive()
	}
}

impl<C: Cache> TagIndexedCache<C> {
	/// An empty index over `store`
	pub fn new(store: Arc<C>) -> Self {
		Self {
			store,
			index: RwLock::new(TagIndex::default()),
		}
	}

	/// The backend holding the values
	pub fn inner(&self) -> &Arc<C> {
		&self.store
	}
}

#[async_trait]
impl<C: Cache> TaggedCache for TagIndexedCache<C> {
	async fn set_tagged<T>(
		&self,
		key: &str,
		value: &T,
		ttl: Option<Duration>,
		tags: &[&str],
	) -> CacheResult<()>
	where
		T: Serialize + Send + Sync,
	{
		self.store.set(key, value, ttl).await?;
		self.index.write().await.link(key, tags);
		Ok(())
	}

	async fn purge_tag(&self, tag: &str) -> CacheResult<usize> {
		// The write lock is held across the deletes so a concurrent store
		// cannot file a key under `tag` halfway through.
		let mut index = self.index.write().await;
		let keys = index.keys(tag);
		for key in &keys {
			self.store.delete(key).await?;
			index.unlink(key);
		}
		tracing::debug!(tag, purged = keys.len(), "purged cache tag");
		Ok(keys.len())
	}

	async fn tagged_keys(&self, tag: &str) -> Vec<String> {
		self.index.read().await.keys(tag)
	}

	async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
	where
		T: DeserializeOwned + Send,
	{
		let value = self.store.get(key).await?;
		if value.is_none() && self.index.read().await.is_linked(key) {
			// The backend may have dropped an expired entry. Re-check under
			// the write lock so a concurrent store keeps its tags.
			let mut index = self.index.write().await;
			if !self.store.has_key(key).await? {
				index.unlink(key);
			}
		}
		Ok(value)
	}

	async fn remove(&self, key: &str) -> CacheResult<()> {
		self.store.delete(key).await?;
		self.index.write().await.unlink(key);
		Ok(())
	}

	async fn evict_expired(&self) -> CacheResult<usize> {
		let mut index = self.index.write().await;
		let evicted = self.store.evict_expired().await?;
		for key in &evicted {
			index.unlink(key);
		}
		if !evicted.is_empty() {
			tracing::debug!(evicted = evicted.len(), "evicted expired cache entries");
		}
		Ok(evicted.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::InMemoryCache;
	use rstest::{fixture, rstest};

	#[fixture]
	fn cache() -> TagIndexedCache<InMemoryCache> {
		TagIndexedCache::new(Arc::new(InMemoryCache::new()))
	}

	#[rstest]
	#[tokio::test]
	async fn test_purge_removes_only_that_tag(cache: TagIndexedCache<InMemoryCache>) {
		// Arrange
		cache.set_tagged("package:bali", &"Bali", None, &["cms:package"]).await.unwrap();
		cache.set_tagged("package:lisbon", &"Lisbon", None, &["cms:package"]).await.unwrap();
		cache.set_tagged("page:/", &"Home", None, &["cms:page"]).await.unwrap();

		// Act
		let purged = cache.purge_tag("cms:package").await.unwrap();

		// Assert
		assert_eq!(purged, 2);
		let bali: Option<String> = cache.get("package:bali").await.unwrap();
		let home: Option<String> = cache.get("page:/").await.unwrap();
		assert_eq!(bali, None);
		assert_eq!(home.as_deref(), Some("Home"));
		assert!(cache.tagged_keys("cms:package").await.is_empty());
		assert_eq!(cache.tagged_keys("cms:page").await, vec!["page:/"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_purging_a_shared_tag_unlinks_the_others(cache: TagIndexedCache<InMemoryCache>) {
		cache.set_tagged("a", &1, None, &["cms:page", "cms:all"]).await.unwrap();
		cache.set_tagged("b", &2, None, &["cms:package", "cms:all"]).await.unwrap();

		cache.purge_tag("cms:all").await.unwrap();

		assert!(cache.tagged_keys("cms:page").await.is_empty());
		assert!(cache.tagged_keys("cms:package").await.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_remove_unlinks_key(cache: TagIndexedCache<InMemoryCache>) {
		cache.set_tagged("a", &1, None, &["cms:page"]).await.unwrap();

		cache.remove("a").await.unwrap();

		let value: Option<u32> = cache.get("a").await.unwrap();
		assert_eq!(value, None);
		assert_eq!(cache.purge_tag("cms:page").await.unwrap(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_expired_entries_leave_the_index(cache: TagIndexedCache<InMemoryCache>) {
		// Arrange
		let ttl = Some(Duration::from_millis(10));
		cache.set_tagged("page:/a", &1, ttl, &["cms:page"]).await.unwrap();
		cache.set_tagged("page:/b", &2, ttl, &["cms:page"]).await.unwrap();
		cache.set_tagged("page:/c", &3, None, &["cms:page"]).await.unwrap();
		tokio::time::sleep(Duration::from_millis(30)).await;

		// Act
		let read: Option<u32> = cache.get("page:/a").await.unwrap();
		let evicted = cache.evict_expired().await.unwrap();

		// Assert
		assert_eq!(read, None);
		assert_eq!(evicted, 1);
		assert_eq!(cache.tagged_keys("cms:page").await, vec!["page:/c"]);
		assert_eq!(cache.inner().statistics().await.entries, 1);
	}
}
