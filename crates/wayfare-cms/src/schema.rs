//! Schema validation of raw CMS JSON
//!
//! Validation is total: a payload either becomes a fully typed value or a
//! [`ValidationError`] naming the first offending field. Optional fields use
//! documented defaults; required fields never do. A JSON `null` in an
//! optional field is treated as absent.
//!
//! ```
//! use serde_json::json;
//! use wayfare_cms::model::PackageData;
//! use wayfare_cms::schema::validate_as;
//!
//! let package: PackageData =
//!     validate_as(&json!({ "title": "Bali", "slug": "bali", "price": 10 })).unwrap();
//! assert_eq!(package.currency, "USD");
//!
//! let err = validate_as::<PackageData>(&json!({ "title": "Bali", "price": 10 })).unwrap_err();
//! assert_eq!(err.to_string(), "slug: missing required field");
//! ```

use crate::error::{FieldPath, ValidationError, ValidationResult};
use crate::image;
use crate::model::{
	Block, BlockSource, Component, ContentEntry, Image, PackageData, PageData, PageMetadata,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// A type that can be validated out of raw JSON
pub trait Schema: Sized {
	/// Validate `value`, reporting errors relative to `path`
	fn validate_at(value: &Value, path: &FieldPath) -> ValidationResult<Self>;
}

/// Validate `raw` as `T`, keeping `raw` on the error
pub fn validate_as<T: Schema>(raw: &Value) -> ValidationResult<T> {
	T::validate_at(raw, &FieldPath::root()).map_err(|err| err.with_raw(raw.clone()))
}

/// Top-level shapes accepted by [`validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
	/// A package model entry (`ContentEntry<PackageData>`)
	Package,
	/// A page model entry (`ContentEntry<PageData>`)
	Page,
	/// Bare package data
	PackageData,
}

/// Output of [`validate`]
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
	Package(ContentEntry<PackageData>),
	Page(ContentEntry<PageData>),
	PackageData(PackageData),
}

/// Validate `raw` as the given kind
pub fn validate(kind: SchemaKind, raw: &Value) -> ValidationResult<Validated> {
	match kind {
		SchemaKind::Package => validate_as(raw).map(Validated::Package),
		SchemaKind::Page => validate_as(raw).map(Validated::Page),
		SchemaKind::PackageData => validate_as(raw).map(Validated::PackageData),
	}
}

/// Field access over one JSON object, with path-aware errors
pub(crate) struct ObjectReader<'a> {
	map: &'a Map<String, Value>,
	path: FieldPath,
}

impl<'a> ObjectReader<'a> {
	pub(crate) fn new(value: &'a Value, path: &FieldPath) -> ValidationResult<Self> {
		match value {
			Value::Object(map) => Ok(Self::from_map(map, path)),
			other => Err(ValidationError::expected(path.clone(), "an object", other)),
		}
	}

	pub(crate) fn from_map(map: &'a Map<String, Value>, path: &FieldPath) -> Self {
		Self {
			map,
			path: path.clone(),
		}
	}

	pub(crate) fn path(&self, key: &str) -> FieldPath {
		self.path.field(key)
	}

	/// The value of `key`, with `null` read as absent
	pub(crate) fn get(&self, key: &str) -> Option<&'a Value> {
		self.map.get(key).filter(|value| !value.is_null())
	}

	pub(crate) fn required(&self, key: &str) -> ValidationResult<&'a Value> {
		self.get(key)
			.ok_or_else(|| ValidationError::missing(self.path(key)))
	}

	pub(crate) fn required_str(&self, key: &str) -> ValidationResult<String> {
		match self.required(key)? {
			Value::String(s) if s.trim().is_empty() => {
				Err(ValidationError::new(self.path(key), "must not be empty"))
			}
			Value::String(s) => Ok(s.clone()),
			other => Err(ValidationError::expected(self.path(key), "a string", other)),
		}
	}

	pub(crate) fn optional_str(&self, key: &str) -> ValidationResult<Option<String>> {
		match self.get(key) {
			None => Ok(None),
			Some(Value::String(s)) => Ok(Some(s.clone())),
			Some(other) => Err(ValidationError::expected(self.path(key), "a string", other)),
		}
	}

	pub(crate) fn optional_bool(&self, key: &str) -> ValidationResult<Option<bool>> {
		match self.get(key) {
			None => Ok(None),
			Some(Value::Bool(b)) => Ok(Some(*b)),
			Some(other) => Err(ValidationError::expected(self.path(key), "a boolean", other)),
		}
	}

	pub(crate) fn optional_f64(&self, key: &str) -> ValidationResult<Option<f64>> {
		match self.get(key) {
			None => Ok(None),
			Some(Value::Number(n)) => match n.as_f64() {
				Some(f) if f.is_finite() => Ok(Some(f)),
				_ => Err(ValidationError::new(self.path(key), "must be a finite number")),
			},
			Some(other) => Err(ValidationError::expected(self.path(key), "a number", other)),
		}
	}

	pub(crate) fn optional_u32(&self, key: &str) -> ValidationResult<Option<u32>> {
		match self.get(key) {
			None => Ok(None),
			Some(Value::Number(n)) => n
				.as_u64()
				.and_then(|v| u32::try_from(v).ok())
				.map(Some)
				.ok_or_else(|| {
					ValidationError::new(self.path(key), "must be a non-negative integer")
				}),
			Some(other) => Err(ValidationError::expected(self.path(key), "an integer", other)),
		}
	}

	pub(crate) fn optional_array(&self, key: &str) -> ValidationResult<Option<&'a Vec<Value>>> {
		match self.get(key) {
			None => Ok(None),
			Some(Value::Array(items)) => Ok(Some(items)),
			Some(other) => Err(ValidationError::expected(self.path(key), "an array", other)),
		}
	}

	pub(crate) fn optional_object(
		&self,
		key: &str,
	) -> ValidationResult<Option<&'a Map<String, Value>>> {
		match self.get(key) {
			None => Ok(None),
			Some(Value::Object(map)) => Ok(Some(map)),
			Some(other) => Err(ValidationError::expected(self.path(key), "an object", other)),
		}
	}

	fn optional_timestamp(&self, key: &str) -> ValidationResult<Option<DateTime<Utc>>> {
		match self.get(key) {
			None => Ok(None),
			Some(Value::Number(n)) => n
				.as_i64()
				.and_then(DateTime::<Utc>::from_timestamp_millis)
				.map(Some)
				.ok_or_else(|| {
					ValidationError::new(
						self.path(key),
						"must be an integer timestamp in milliseconds",
					)
				}),
			Some(other) => Err(ValidationError::expected(self.path(key), "a timestamp", other)),
		}
	}

	/// Validate every element of an optional array with `item`
	pub(crate) fn optional_list<T>(
		&self,
		key: &str,
		item: impl Fn(&'a Value, &FieldPath) -> ValidationResult<T>,
	) -> ValidationResult<Option<Vec<T>>> {
		let Some(items) = self.optional_array(key)? else {
			return Ok(None);
		};
		let base = self.path(key);
		items
			.iter()
			.enumerate()
			.map(|(i, value)| item(value, &base.index(i)))
			.collect::<ValidationResult<Vec<T>>>()
			.map(Some)
	}
}

fn string_item(value: &Value, path: &FieldPath) -> ValidationResult<String> {
	match value {
		Value::String(s) => Ok(s.clone()),
		other => Err(ValidationError::expected(path.clone(), "a string", other)),
	}
}

fn block_source_item(value: &Value, _path: &FieldPath) -> ValidationResult<BlockSource> {
	Ok(BlockSource::new(value.clone()))
}

impl<D: Schema> Schema for ContentEntry<D> {
	fn validate_at(value: &Value, path: &FieldPath) -> ValidationResult<Self> {
		let obj = ObjectReader::new(value, path)?;
		let id = obj.required_str("id")?;
		let name = obj.required_str("name")?;
		let published_at = obj.optional_timestamp("publishedAt")?;
		let created_at = obj.optional_timestamp("createdAt")?;
		let updated_at = obj.optional_timestamp("updatedAt")?;
		let data = D::validate_at(obj.required("data")?, &obj.path("data"))?;

		Ok(Self {
			id,
			name,
			published_at,
			created_at,
			updated_at,
			data,
		})
	}
}

impl Schema for PackageData {
	fn validate_at(value: &Value, path: &FieldPath) -> ValidationResult<Self> {
		let obj = ObjectReader::new(value, path)?;
		let title = obj.required_str("title")?;
		let slug = obj.required_str("slug")?;

		let price = obj
			.optional_f64("price")?
			.ok_or_else(|| ValidationError::missing(obj.path("price")))?;
		if price < 0.0 {
			return Err(ValidationError::new(obj.path("price"), "must not be negative"));
		}

		let currency = match obj.optional_str("currency")? {
			None => PackageData::DEFAULT_CURRENCY.to_string(),
			Some(code) if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => code,
			Some(_) => {
				return Err(ValidationError::new(
					obj.path("currency"),
					"must be a 3-letter currency code",
				));
			}
		};

		Ok(Self {
			title,
			slug,
			price,
			currency,
			excerpt: obj.optional_str("excerpt")?,
			featured: obj.optional_bool("featured")?.unwrap_or(false),
			tags: obj.optional_list("tags", string_item)?.unwrap_or_default(),
			images: obj
				.optional_list("images", Image::validate_at)?
				.unwrap_or_default(),
			body: obj.optional_list("body", block_source_item)?,
		})
	}
}

impl Schema for PageData {
	fn validate_at(value: &Value, path: &FieldPath) -> ValidationResult<Self> {
		let obj = ObjectReader::new(value, path)?;
		let metadata = match obj.get("metadata") {
			None => None,
			Some(meta) => Some(PageMetadata::validate_at(meta, &obj.path("metadata"))?),
		};

		Ok(Self {
			title: obj.optional_str("title")?,
			metadata,
			blocks: obj.optional_list("blocks", block_source_item)?,
			body: obj.optional_list("body", block_source_item)?,
		})
	}
}

impl Schema for PageMetadata {
	fn validate_at(value: &Value, path: &FieldPath) -> ValidationResult<Self> {
		let obj = ObjectReader::new(value, path)?;
		let keywords = match obj.get("keywords") {
			None => Vec::new(),
			Some(Value::String(s)) => s
				.split(',')
				.map(str::trim)
				.filter(|k| !k.is_empty())
				.map(str::to_string)
				.collect(),
			Some(Value::Array(_)) => obj.optional_list("keywords", string_item)?.unwrap_or_default(),
			Some(other) => {
				return Err(ValidationError::expected(
					obj.path("keywords"),
					"a string or an array of strings",
					other,
				));
			}
		};

		Ok(Self {
			title: obj.optional_str("title")?,
			description: obj.optional_str("description")?,
			keywords,
		})
	}
}

impl Schema for Image {
	fn validate_at(value: &Value, path: &FieldPath) -> ValidationResult<Self> {
		match value {
			Value::String(s) => image::normalize_str(s)
				.map(Image::new)
				.ok_or_else(|| ValidationError::new(path.clone(), "must be an absolute http(s) URL")),
			Value::Object(_) => {
				let obj = ObjectReader::new(value, path)?;
				let key = if obj.get("src").is_some() { "src" } else { "url" };
				let raw = obj.required_str(key)?;
				let url = image::normalize_str(&raw).ok_or_else(|| {
					ValidationError::new(obj.path(key), "must be an absolute http(s) URL")
				})?;

				Ok(Self {
					url,
					alt: obj.optional_str("alt")?,
					width: obj.optional_u32("width")?,
					height: obj.optional_u32("height")?,
				})
			}
			other => Err(ValidationError::expected(
				path.clone(),
				"an image URL or object",
				other,
			)),
		}
	}
}

impl Schema for Block {
	fn validate_at(value: &Value, path: &FieldPath) -> ValidationResult<Self> {
		let obj = ObjectReader::new(value, path)?;
		let type_key = if obj.get("@type").is_some() { "@type" } else { "type" };
		let block_type = obj.required_str(type_key)?;

		let component_path = obj.path("component");
		let component = ObjectReader::new(obj.required("component")?, &component_path)?;
		let name = component.required_str("name")?;
		let options = component.optional_object("options")?.cloned().unwrap_or_default();

		Ok(Self {
			block_type,
			id: obj.optional_str("id")?,
			component: Component { name, options },
			responsive_styles: obj.optional_object("responsiveStyles")?.cloned(),
		})
	}
}
