//! Hit and size counters of a cache backend

/// Point-in-time counters reported by [`InMemoryCache::statistics`]
///
/// [`InMemoryCache::statistics`]: crate::InMemoryCache::statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
	/// Lookups that found a live entry
	pub hits: u64,
	/// Lookups that found nothing or only an expired entry
	pub misses: u64,
	/// Stored entries, expired ones included until they are swept
	pub entries: usize,
	/// Serialized size of every stored value
	pub stored_bytes: usize,
}

impl CacheStatistics {
	/// Every lookup counted so far
	pub fn lookups(&self) -> u64 {
		self.hits + self.misses
	}

	/// Share of lookups that were hits, `0.0` before the first lookup
	pub fn hit_rate(&self) -> f64 {
		match self.lookups() {
			0 => 0.0,
			lookups => self.hits as f64 / lookups as f64,
		}
	}
}
