//! Base cache trait

use crate::error::CacheResult;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

/// Base cache interface
///
/// Values are serialized on `set` and deserialized on `get`, so a value read
/// back is always an independent copy of what was stored.
#[async_trait]
pub trait Cache: Send + Sync {
	/// Get a value; `None` when absent or past its TTL
	async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
	where
		T: DeserializeOwned + Send;

	/// Store a value with an optional TTL
	async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
	where
		T: Serialize + Send + Sync;

	/// Delete a value
	async fn delete(&self, key: &str) -> CacheResult<()>;

	/// Check whether a live value exists for `key`
	async fn has_key(&self, key: &str) -> CacheResult<bool>;

	/// Remove every entry
	async fn clear(&self) -> CacheResult<()>;

	/// Remove entries past their TTL and return their keys.
	/// Backends that expire entries on their own keep the default.
	async fn evict_expired(&self) -> CacheResult<Vec<String>> {
		Ok(Vec::new())
	}
}
