//! HTTP client for the CMS content API

use crate::query::Query;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use wayfare_cms::error::FetchError;
use wayfare_conf::CmsSettings;

/// Connection settings for [`CmsClient`]
#[non_exhaustive]
#[derive(Debug)]
pub struct ClientConfig {
	/// API base, e.g. `https://cdn.builder.io/api/v3`
	pub base_url: String,

	/// Public API key sent as the `apiKey` query parameter
	pub api_key: Option<SecretString>,

	/// Whole-request timeout
	pub timeout: Duration,
}

impl ClientConfig {
	/// Create a configuration without an API key
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			api_key: None,
			timeout: Duration::from_secs(10),
		}
	}

	/// Set the API key
	pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
		self.api_key = Some(SecretString::from(api_key.into()));
		self
	}

	/// Set the request timeout
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn from_settings(cms: &CmsSettings) -> Self {
		let config = Self::new(cms.base_url.clone()).with_timeout(cms.timeout());
		match cms.api_key() {
			Some(key) => config.with_api_key(key),
			None => config,
		}
	}
}

/// Response envelope. Content queries answer with `results`, the page
/// endpoint with `data`.
#[derive(Debug, Deserialize)]
struct ContentResponse {
	#[serde(default)]
	results: Option<Vec<Value>>,
	#[serde(default)]
	data: Option<Vec<Value>>,
}

/// Thin client issuing one GET per [`Query`]
pub struct CmsClient {
	config: ClientConfig,
	client: reqwest::Client,
}

impl std::fmt::Debug for CmsClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CmsClient")
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

impl CmsClient {
	/// Create a client; fails only if the TLS backend cannot be initialized
	pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
		let client = reqwest::Client::builder()
			.timeout(config.timeout)
			.build()
			.map_err(|e| FetchError::Network {
				endpoint: config.base_url.clone(),
				message: format!("failed to create client: {}", e),
			})?;

		Ok(Self { config, client })
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	fn api_key(&self) -> Result<&str, FetchError> {
		self.config
			.api_key
			.as_ref()
			.map(|key| key.expose_secret())
			.filter(|key| !key.trim().is_empty())
			.ok_or(FetchError::MissingApiKey)
	}

	fn build_url(&self, query: &Query, api_key: &str) -> Result<url::Url, FetchError> {
		let raw = format!(
			"{}/{}",
			self.config.base_url.trim_end_matches('/'),
			query.endpoint()
		);
		let mut url = url::Url::parse(&raw).map_err(|e| FetchError::Network {
			endpoint: query.endpoint(),
			message: format!("invalid CMS URL '{}': {}", raw, e),
		})?;
		{
			let mut pairs = url.query_pairs_mut();
			pairs.append_pair("apiKey", api_key);
			for (name, value) in query.params() {
				pairs.append_pair(name, value);
			}
		}
		Ok(url)
	}

	/// Send `query` and return the raw entries of the response envelope.
	///
	/// The API key is checked before anything is sent.
	pub async fn fetch(&self, query: &Query) -> Result<Vec<Value>, FetchError> {
		let api_key = self.api_key()?;
		let url = self.build_url(query, api_key)?;
		let endpoint = query.endpoint();

		tracing::info!(endpoint = %endpoint, key = %query.cache_key(), "requesting CMS content");

		let response = self.client.get(url).send().await.map_err(|e| {
			if e.is_timeout() {
				FetchError::Timeout {
					endpoint: endpoint.clone(),
				}
			} else {
				FetchError::Network {
					endpoint: endpoint.clone(),
					message: e.without_url().to_string(),
				}
			}
		})?;

		let status = response.status();
		if !status.is_success() {
			return Err(FetchError::Status {
				endpoint,
				status: status.as_u16(),
			});
		}

		let body: ContentResponse = response.json().await.map_err(|e| {
			if e.is_timeout() {
				FetchError::Timeout {
					endpoint: endpoint.clone(),
				}
			} else {
				FetchError::Decode {
					endpoint: endpoint.clone(),
					message: e.without_url().to_string(),
				}
			}
		})?;

		body.results.or(body.data).ok_or_else(|| FetchError::Decode {
			endpoint,
			message: "response has neither 'results' nor 'data'".to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_url_carries_key_and_sorted_params() {
		let client = CmsClient::new(ClientConfig::new("https://cms.example/api/v3/")).unwrap();
		let query = Query::new("travel-package")
			.param("limit", "2")
			.data_field("slug", "bali & lombok");

		let url = client.build_url(&query, "k3y").unwrap();

		assert_eq!(
			url.as_str(),
			"https://cms.example/api/v3/content/travel-package?apiKey=k3y&limit=2&query.data.slug=bali+%26+lombok"
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_key_fails_before_sending() {
		// Unroutable base: any attempt to connect would produce a network error
		let client = CmsClient::new(ClientConfig::new("http://127.0.0.1:9")).unwrap();

		let result = client.fetch(&Query::new("page")).await;

		assert_eq!(result, Err(FetchError::MissingApiKey));
	}

	#[rstest]
	#[tokio::test]
	async fn test_blank_key_counts_as_missing() {
		let config = ClientConfig::new("http://127.0.0.1:9").with_api_key("   ");
		let client = CmsClient::new(config).unwrap();

		let result = client.fetch(&Query::new("page")).await;

		assert_eq!(result, Err(FetchError::MissingApiKey));
	}

	#[rstest]
	fn test_debug_redacts_key() {
		let config = ClientConfig::new("https://cms.example").with_api_key("super-secret");

		let client = CmsClient::new(config).unwrap();

		assert!(!format!("{:?}", client).contains("super-secret"));
	}
}
