//! Typed settings for the content pipeline

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;

/// Default CMS content API root
pub const DEFAULT_CMS_BASE_URL: &str = "https://cdn.builder.io/api/v3";
/// Default freshness window for pages, in seconds
pub const DEFAULT_PAGE_TTL_SECS: u64 = 3600;
/// Default freshness window for package lists, in seconds
pub const DEFAULT_PACKAGE_LIST_TTL_SECS: u64 = 300;
/// Default freshness window for single packages, in seconds
pub const DEFAULT_PACKAGE_TTL_SECS: u64 = 3600;
/// Default window past the TTL during which stale content is still served
pub const DEFAULT_MAX_STALE_SECS: u64 = 86_400;

/// Errors raised while building or validating settings
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Configuration source '{source_name}' failed: {error}")]
	Source {
		source_name: String,
		#[source]
		error: crate::sources::SourceError,
	},

	#[error("Invalid settings: {0}")]
	Deserialize(#[from] serde_json::Error),

	#[error("Invalid value for {field}: {message}")]
	Invalid { field: &'static str, message: String },
}

/// Result alias for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
	#[default]
	Development,
	Production,
}

impl Environment {
	/// Whether diagnostics must be hidden from end users
	pub fn is_production(self) -> bool {
		matches!(self, Self::Production)
	}
}

/// Complete pipeline settings
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub environment: Environment,
	pub cms: CmsSettings,
	pub cache: CacheSettings,
	pub logging: LoggingSettings,
}

impl Settings {
	/// Check cross-field constraints serde cannot express
	pub fn validate(&self) -> SettingsResult<()> {
		let parsed = url::Url::parse(&self.cms.base_url).map_err(|e| SettingsError::Invalid {
			field: "cms.base_url",
			message: e.to_string(),
		})?;
		if !matches!(parsed.scheme(), "http" | "https") {
			return Err(SettingsError::Invalid {
				field: "cms.base_url",
				message: format!("unsupported scheme '{}'", parsed.scheme()),
			});
		}
		if self.cms.timeout_secs == 0 {
			return Err(SettingsError::Invalid {
				field: "cms.timeout_secs",
				message: "must be greater than zero".to_string(),
			});
		}
		for (field, ttl) in [
			("cache.page_ttl_secs", self.cache.page_ttl_secs),
			("cache.package_list_ttl_secs", self.cache.package_list_ttl_secs),
			("cache.package_ttl_secs", self.cache.package_ttl_secs),
		] {
			if ttl == 0 {
				return Err(SettingsError::Invalid {
					field,
					message: "must be greater than zero".to_string(),
				});
			}
		}
		Ok(())
	}
}

/// CMS connection settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CmsSettings {
	#[serde(deserialize_with = "deserialize_secret")]
	pub api_key: Option<SecretString>,
	pub base_url: String,
	pub package_model: String,
	pub page_model: String,
	pub timeout_secs: u64,
}

impl CmsSettings {
	/// The API key, if one is configured and non-empty
	pub fn api_key(&self) -> Option<&str> {
		self.api_key
			.as_ref()
			.map(|key| key.expose_secret())
			.filter(|key| !key.trim().is_empty())
	}

	/// Request timeout
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}
}

impl Default for CmsSettings {
	fn default() -> Self {
		Self {
			api_key: None,
			base_url: DEFAULT_CMS_BASE_URL.to_string(),
			package_model: "travel-package".to_string(),
			page_model: "page".to_string(),
			timeout_secs: 10,
		}
	}
}

/// Per-content-class cache windows
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
	pub page_ttl_secs: u64,
	pub package_list_ttl_secs: u64,
	pub package_ttl_secs: u64,
	pub max_stale_secs: Option<u64>,
}

impl Default for CacheSettings {
	fn default() -> Self {
		Self {
			page_ttl_secs: DEFAULT_PAGE_TTL_SECS,
			package_list_ttl_secs: DEFAULT_PACKAGE_LIST_TTL_SECS,
			package_ttl_secs: DEFAULT_PACKAGE_TTL_SECS,
			max_stale_secs: Some(DEFAULT_MAX_STALE_SECS),
		}
	}
}

impl CacheSettings {
	pub fn page_ttl(&self) -> Duration {
		Duration::from_secs(self.page_ttl_secs)
	}

	pub fn package_list_ttl(&self) -> Duration {
		Duration::from_secs(self.package_list_ttl_secs)
	}

	pub fn package_ttl(&self) -> Duration {
		Duration::from_secs(self.package_ttl_secs)
	}

	pub fn max_stale(&self) -> Option<Duration> {
		self.max_stale_secs.map(Duration::from_secs)
	}
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Compact,
	Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// Filter directive used when `RUST_LOG` is unset
	pub level: String,
	pub format: LogFormat,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Compact,
		}
	}
}

// Environment sources infer numbers, so a numeric-looking key arrives as a number.
fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<Value>::deserialize(deserializer)?;
	match raw {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(s)) => Ok(Some(SecretString::from(s))),
		Some(Value::Number(n)) => Ok(Some(SecretString::from(n.to_string()))),
		Some(Value::Bool(b)) => Ok(Some(SecretString::from(b.to_string()))),
		Some(_) => Err(serde::de::Error::custom("api_key must be a string")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_defaults() {
		let settings = Settings::default();

		assert_eq!(settings.environment, Environment::Development);
		assert_eq!(settings.cache.page_ttl(), Duration::from_secs(3600));
		assert_eq!(settings.cache.package_list_ttl(), Duration::from_secs(300));
		assert_eq!(settings.cache.package_ttl(), Duration::from_secs(3600));
		assert!(settings.cms.api_key().is_none());
		assert!(settings.validate().is_ok());
	}

	#[rstest]
	fn test_api_key_is_redacted_in_debug() {
		let settings: Settings =
			serde_json::from_value(json!({ "cms": { "api_key": "super-secret-key" } })).unwrap();

		let debug = format!("{:?}", settings);

		assert!(!debug.contains("super-secret-key"));
		assert_eq!(settings.cms.api_key(), Some("super-secret-key"));
	}

	#[rstest]
	fn test_numeric_api_key_accepted() {
		let settings: Settings =
			serde_json::from_value(json!({ "cms": { "api_key": 12345 } })).unwrap();

		assert_eq!(settings.cms.api_key(), Some("12345"));
	}

	#[rstest]
	fn test_blank_api_key_counts_as_missing() {
		let settings: Settings =
			serde_json::from_value(json!({ "cms": { "api_key": "  " } })).unwrap();

		assert!(settings.cms.api_key().is_none());
	}

	#[rstest]
	#[case(json!({ "cms": { "base_url": "not a url" } }), "cms.base_url")]
	#[case(json!({ "cms": { "base_url": "ftp://cms.example.com" } }), "cms.base_url")]
	#[case(json!({ "cms": { "timeout_secs": 0 } }), "cms.timeout_secs")]
	#[case(json!({ "cache": { "page_ttl_secs": 0 } }), "cache.page_ttl_secs")]
	fn test_validate_rejects(#[case] raw: Value, #[case] expected_field: &str) {
		let settings: Settings = serde_json::from_value(raw).unwrap();

		let err = settings.validate().unwrap_err();

		match err {
			SettingsError::Invalid { field, .. } => assert_eq!(field, expected_field),
			other => panic!("unexpected error: {other}"),
		}
	}

	#[rstest]
	fn test_environment_parses_lowercase() {
		let settings: Settings =
			serde_json::from_value(json!({ "environment": "production" })).unwrap();

		assert!(settings.environment.is_production());
	}
}
