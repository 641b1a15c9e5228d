//! Cache error types

use thiserror::Error;

/// Errors raised by cache backends
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CacheError {
	/// A value could not be serialized or deserialized
	#[error("Cache serialization error for key '{key}': {source}")]
	Serialization {
		/// Cache key being read or written
		key: String,
		/// Underlying serde error
		#[source]
		source: serde_json::Error,
	},
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
