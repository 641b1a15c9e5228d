//! Strict typed forms of CMS content
//!
//! Values of these types only come out of [`crate::schema`]; every field has
//! been checked, and defaults have been applied where a field is optional.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// One entry of a CMS model, with its content in `data`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry<D> {
	pub id: String,
	pub name: String,
	pub published_at: Option<DateTime<Utc>>,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
	pub data: D,
}

/// A bookable travel package
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageData {
	pub title: String,
	pub slug: String,
	pub price: f64,
	/// Defaults to `"USD"`
	pub currency: String,
	pub excerpt: Option<String>,
	/// Defaults to `false`
	pub featured: bool,
	pub tags: Vec<String>,
	pub images: Vec<Image>,
	pub body: Option<Vec<BlockSource>>,
}

impl PackageData {
	/// Default currency when the CMS omits one
	pub const DEFAULT_CURRENCY: &'static str = "USD";

	/// Site path of the package detail page
	pub fn href(&self) -> String {
		let slug: String = url::form_urlencoded::byte_serialize(self.slug.as_bytes()).collect();
		format!("/packages/{}", slug)
	}

	/// Display price with its currency, e.g. `USD 1200` or `EUR 99.50`
	pub fn display_price(&self) -> String {
		if self.price.fract() == 0.0 {
			format!("{} {:.0}", self.currency, self.price)
		} else {
			format!("{} {:.2}", self.currency, self.price)
		}
	}
}

/// A content page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageData {
	pub title: Option<String>,
	pub metadata: Option<PageMetadata>,
	pub blocks: Option<Vec<BlockSource>>,
	pub body: Option<Vec<BlockSource>>,
}

impl PageData {
	/// The blocks to render: `blocks` when present, otherwise `body`
	pub fn blocks_to_render(&self) -> Option<&[BlockSource]> {
		self.blocks.as_deref().or(self.body.as_deref())
	}

	/// Title for the document head, preferring the SEO title
	pub fn display_title(&self) -> Option<&str> {
		self.metadata
			.as_ref()
			.and_then(|meta| meta.title.as_deref())
			.or(self.title.as_deref())
	}
}

/// SEO metadata of a page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageMetadata {
	pub title: Option<String>,
	pub description: Option<String>,
	pub keywords: Vec<String>,
}

/// An image with an absolute `http(s)` URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
	pub url: String,
	pub alt: Option<String>,
	pub width: Option<u32>,
	pub height: Option<u32>,
}

impl Image {
	/// An image with only a URL
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			alt: None,
			width: None,
			height: None,
		}
	}
}

/// A validated block envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
	#[serde(rename = "type")]
	pub block_type: String,
	pub id: Option<String>,
	pub component: Component,
	pub responsive_styles: Option<Map<String, Value>>,
}

/// The component a block renders; `name` is the dispatch key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
	pub name: String,
	/// Defaults to an empty map
	pub options: Map<String, Value>,
}

/// An element of a `blocks`/`body` array that has not been validated as a
/// [`Block`] yet
///
/// Any JSON value is kept, objects or not. Block validation happens per
/// block at render time, so one malformed block degrades only itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BlockSource(Value);

impl BlockSource {
	/// Wrap a raw array element
	pub fn new(raw: Value) -> Self {
		Self(raw)
	}

	/// The raw element
	pub fn raw(&self) -> &Value {
		&self.0
	}

	/// The raw element, cloned
	pub fn to_value(&self) -> Value {
		self.0.clone()
	}

	/// `component.name`, when it is a string, without validating anything else
	pub fn declared_name(&self) -> Option<&str> {
		self.0
			.get("component")
			.and_then(|component| component.get("name"))
			.and_then(Value::as_str)
	}
}

/// Filters for a package list query
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PackageFilters {
	pub tag: Option<String>,
	pub featured: Option<bool>,
	pub limit: Option<u32>,
}

impl PackageFilters {
	/// No filters
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
		self.tag = Some(tag.into());
		self
	}

	pub fn with_featured(mut self, featured: bool) -> Self {
		self.featured = Some(featured);
		self
	}

	pub fn with_limit(mut self, limit: u32) -> Self {
		self.limit = Some(limit);
		self
	}
}

/// Result of a list fetch: the valid packages and how many entries were dropped
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackageList {
	pub packages: Vec<PackageData>,
	pub rejected: usize,
}
