//! CMS content queries and their cache keys

use std::collections::BTreeMap;
use wayfare_cms::model::PackageFilters;

/// A `GET {base}/content/{model}` request without credentials.
///
/// Parameters are kept sorted so that two queries built in a different
/// order produce the same [`cache_key`](Query::cache_key). The API key is
/// added by [`CmsClient`](crate::CmsClient) at send time and is never part
/// of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
	model: String,
	params: BTreeMap<String, String>,
}

impl Query {
	/// Query every entry of `model`
	pub fn new(model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			params: BTreeMap::new(),
		}
	}

	/// Add a query-string parameter, replacing an earlier value for `name`
	pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(name.into(), value.into());
		self
	}

	/// Filter on `data.<field>`
	pub fn data_field(self, field: &str, value: impl Into<String>) -> Self {
		self.param(format!("query.data.{}", field), value)
	}

	/// Package list filtered by tag and featured flag
	pub fn packages(model: &str, filters: &PackageFilters) -> Self {
		let mut query = Self::new(model);
		if let Some(tag) = &filters.tag {
			query = query.data_field("tags", tag.clone());
		}
		if let Some(featured) = filters.featured {
			query = query.data_field("featured", featured.to_string());
		}
		if let Some(limit) = filters.limit {
			query = query.param("limit", limit.to_string());
		}
		query
	}

	/// The single package whose `data.slug` is `slug`
	pub fn package_by_slug(model: &str, slug: &str) -> Self {
		Self::new(model)
			.data_field("slug", slug)
			.param("limit", "1")
	}

	/// The page targeting the URL path `path`
	pub fn page_by_path(model: &str, path: &str) -> Self {
		Self::new(model).param("url", path)
	}

	pub fn model(&self) -> &str {
		&self.model
	}

	pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
		self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Path relative to the API base, e.g. `content/page`
	pub fn endpoint(&self) -> String {
		format!("content/{}", self.model)
	}

	/// Endpoint plus the form-encoded, sorted parameters
	pub fn cache_key(&self) -> String {
		if self.params.is_empty() {
			return self.endpoint();
		}
		let mut encoded = url::form_urlencoded::Serializer::new(String::new());
		for (name, value) in self.params() {
			encoded.append_pair(name, value);
		}
		format!("{}?{}", self.endpoint(), encoded.finish())
	}
}

/// Page paths always start with a single `/`
pub(crate) fn normalize_path(path: &str) -> String {
	format!("/{}", path.trim().trim_start_matches('/'))
}
