//! Cached content fetching and request-scoped de-duplication

use crate::client::{ClientConfig, CmsClient};
use crate::policy::{CachePolicies, ContentClass};
use crate::query::{Query, normalize_path};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use wayfare_cache::{CacheResult, CacheStatistics, InMemoryCache, RequestMemo, RevalidatingCache};
use wayfare_cms::blocks::PackageSource;
use wayfare_cms::error::{ContentError, ContentResult, FetchError};
use wayfare_cms::model::{ContentEntry, PackageData, PackageFilters, PackageList, PageData};
use wayfare_cms::schema::validate_as;
use wayfare_conf::Settings;

/// CMS model names queried for each kind of content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentModels {
	pub package: String,
	pub page: String,
}

impl Default for ContentModels {
	fn default() -> Self {
		Self {
			package: "travel-package".to_string(),
			page: "page".to_string(),
		}
	}
}

/// Fetches, caches and validates CMS content.
///
/// The cache holds raw response entries, so validation rules apply to
/// whatever is cached. Failures are never cached. Cloning is cheap; clones
/// share the cache.
#[derive(Clone)]
pub struct ContentFetcher {
	client: Arc<CmsClient>,
	cache: RevalidatingCache<InMemoryCache>,
	policies: Arc<CachePolicies>,
	models: Arc<ContentModels>,
}

impl std::fmt::Debug for ContentFetcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ContentFetcher")
			.field("client", &self.client)
			.field("policies", &self.policies)
			.field("models", &self.models)
			.finish_non_exhaustive()
	}
}

impl ContentFetcher {
	/// Create a fetcher with its own empty in-memory cache
	pub fn new(client: CmsClient, policies: CachePolicies, models: ContentModels) -> Self {
		Self {
			client: Arc::new(client),
			cache: RevalidatingCache::new(Arc::new(InMemoryCache::new())),
			policies: Arc::new(policies),
			models: Arc::new(models),
		}
	}

	pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
		let client = CmsClient::new(ClientConfig::from_settings(&settings.cms))?;
		let models = ContentModels {
			package: settings.cms.package_model.clone(),
			page: settings.cms.page_model.clone(),
		};
		Ok(Self::new(
			client,
			CachePolicies::from_settings(&settings.cache),
			models,
		))
	}

	/// Share an existing cache instead of the fetcher's own
	pub fn with_cache(mut self, cache: RevalidatingCache<InMemoryCache>) -> Self {
		self.cache = cache;
		self
	}

	pub fn cache(&self) -> &RevalidatingCache<InMemoryCache> {
		&self.cache
	}

	pub fn models(&self) -> &ContentModels {
		&self.models
	}

	/// Hit/miss counters of the shared content cache
	pub async fn cache_statistics(&self) -> CacheStatistics {
		self.cache.tagged().inner().statistics().await
	}

	/// Start a rendering pass
	pub fn scope(&self) -> RequestScope {
		RequestScope::new(self.clone())
	}

	fn cache_key(class: ContentClass, query: &Query) -> String {
		format!("{}:{}", class.name(), query.cache_key())
	}

	async fn load(&self, class: ContentClass, query: Query) -> ContentResult<Vec<Value>> {
		let key = Self::cache_key(class, &query);
		let span = tracing::info_span!("cms_fetch", class = class.name(), endpoint = %query.endpoint());

		async {
			let client = Arc::clone(&self.client);
			let loader = move || async move { client.fetch(&query).await };

			match self
				.cache
				.get_or_revalidate(&key, self.policies.policy(class), loader)
				.await
			{
				Ok(cached) => {
					tracing::debug!(key = %key, freshness = ?cached.freshness, entries = cached.value.len(), "content resolved");
					Ok(cached.value)
				}
				Err(e) => {
					tracing::error!(key = %key, error = %e, "CMS fetch failed");
					Err(e.into())
				}
			}
		}
		.instrument(span)
		.await
	}

	/// Packages matching `filters`.
	///
	/// Entries are validated one by one; invalid entries are left out and
	/// counted in [`PackageList::rejected`].
	pub async fn fetch_packages(&self, filters: &PackageFilters) -> ContentResult<PackageList> {
		let query = Query::packages(&self.models.package, filters);
		let raw = self.load(ContentClass::PackageList, query).await?;

		let mut list = PackageList::default();
		for (index, entry) in raw.iter().enumerate() {
			match validate_as::<ContentEntry<PackageData>>(entry) {
				Ok(valid) => list.packages.push(valid.data),
				Err(err) => {
					list.rejected += 1;
					tracing::warn!(index, path = %err.path, error = %err.message, "dropping invalid package entry");
				}
			}
		}
		if let Some(limit) = filters.limit {
			list.packages.truncate(limit as usize);
		}
		Ok(list)
	}

	/// The package published under `slug`; any invalid field fails the whole fetch
	pub async fn fetch_package_by_slug(
		&self,
		slug: &str,
	) -> ContentResult<ContentEntry<PackageData>> {
		let slug = slug.trim();
		if slug.is_empty() {
			return Err(self.not_found(&self.models.package, slug));
		}
		let query = Query::package_by_slug(&self.models.package, slug);
		let raw = self.load(ContentClass::Package, query).await?;
		let entry = raw
			.first()
			.ok_or_else(|| self.not_found(&self.models.package, slug))?;
		Ok(validate_as(entry)?)
	}

	/// The page targeting the URL `path`
	pub async fn fetch_page_by_path(&self, path: &str) -> ContentResult<ContentEntry<PageData>> {
		let path = normalize_path(path);
		let query = Query::page_by_path(&self.models.page, &path);
		let raw = self.load(ContentClass::Page, query).await?;
		let entry = raw
			.first()
			.ok_or_else(|| self.not_found(&self.models.page, &path))?;
		Ok(validate_as(entry)?)
	}

	fn not_found(&self, model: &str, key: &str) -> ContentError {
		ContentError::NotFound {
			model: model.to_string(),
			key: key.to_string(),
		}
	}

	/// Drop every cached entry of `class`
	pub async fn invalidate(&self, class: ContentClass) -> CacheResult<()> {
		tracing::info!(class = class.name(), tag = class.tag(), "invalidating cached content");
		self.cache.invalidate_tag(class.tag()).await
	}

	pub async fn invalidate_all(&self) -> CacheResult<()> {
		for class in ContentClass::ALL {
			self.invalidate(class).await?;
		}
		Ok(())
	}
}

/// Fetch results shared by everything rendered in one pass.
///
/// Identical requests made through the same scope, including concurrent
/// ones, resolve once; every caller gets a clone of the same result, errors
/// included. Drop the scope when the pass ends.
#[derive(Debug)]
pub struct RequestScope {
	fetcher: ContentFetcher,
	package_lists: RequestMemo<ContentResult<PackageList>>,
	packages: RequestMemo<ContentResult<ContentEntry<PackageData>>>,
	pages: RequestMemo<ContentResult<ContentEntry<PageData>>>,
}

impl RequestScope {
	pub fn new(fetcher: ContentFetcher) -> Self {
		Self {
			fetcher,
			package_lists: RequestMemo::new(),
			packages: RequestMemo::new(),
			pages: RequestMemo::new(),
		}
	}

	pub fn fetcher(&self) -> &ContentFetcher {
		&self.fetcher
	}

	/// Number of distinct requests made through this scope
	pub fn request_count(&self) -> usize {
		self.package_lists.len() + self.packages.len() + self.pages.len()
	}

	pub async fn fetch_packages(&self, filters: &PackageFilters) -> ContentResult<PackageList> {
		let key = Query::packages(&self.fetcher.models.package, filters).cache_key();
		self.package_lists
			.get_or_init(&key, || self.fetcher.fetch_packages(filters))
			.await
	}

	pub async fn fetch_package_by_slug(
		&self,
		slug: &str,
	) -> ContentResult<ContentEntry<PackageData>> {
		let key = Query::package_by_slug(&self.fetcher.models.package, slug.trim()).cache_key();
		self.packages
			.get_or_init(&key, || self.fetcher.fetch_package_by_slug(slug))
			.await
	}

	pub async fn fetch_page_by_path(&self, path: &str) -> ContentResult<ContentEntry<PageData>> {
		let key = Query::page_by_path(&self.fetcher.models.page, &normalize_path(path)).cache_key();
		self.pages
			.get_or_init(&key, || self.fetcher.fetch_page_by_path(path))
			.await
	}
}

#[async_trait]
impl PackageSource for RequestScope {
	async fn fetch_packages(&self, filters: &PackageFilters) -> ContentResult<PackageList> {
		RequestScope::fetch_packages(self, filters).await
	}
}
