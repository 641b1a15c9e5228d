//! Configuration sources for the layered settings system
//!
//! Sources are merged in priority order
//! (environment variables > .env file > TOML file > defaults).
//! Keys are lowercase; `__` in an environment variable name separates
//! nesting levels, so `WAYFARE_CACHE__PAGE_TTL_SECS` sets `cache.page_ttl_secs`.

use indexmap::IndexMap;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;

/// Separator between nesting levels in flat (environment-style) keys
pub const NESTING_SEPARATOR: &str = "__";

/// One layer of settings
pub trait ConfigSource: Send + Sync {
	/// Read this layer as a flat map of top-level sections
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Merge order; layers with a higher value win
	fn priority(&self) -> u8;

	/// Human-readable origin, used in error messages
	fn description(&self) -> String;
}

/// Failure reading one settings layer
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("cannot read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid TOML in {path}: {source}")]
	Toml {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("malformed settings: {0}")]
	Parse(String),

	#[error("malformed .env file: {0}")]
	DotEnv(#[from] dotenv::Error),
}

/// Built-in defaults (lowest priority)
#[derive(Debug, Default)]
pub struct DefaultSource;

impl DefaultSource {
	/// Create the default source
	pub fn new() -> Self {
		Self
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let mut config = IndexMap::new();
		config.insert("environment".to_string(), json!("development"));
		config.insert(
			"cms".to_string(),
			json!({
				"base_url": crate::settings::DEFAULT_CMS_BASE_URL,
				"package_model": "travel-package",
				"page_model": "page",
				"timeout_secs": 10,
			}),
		);
		config.insert(
			"cache".to_string(),
			json!({
				"page_ttl_secs": crate::settings::DEFAULT_PAGE_TTL_SECS,
				"package_list_ttl_secs": crate::settings::DEFAULT_PACKAGE_LIST_TTL_SECS,
				"package_ttl_secs": crate::settings::DEFAULT_PACKAGE_TTL_SECS,
				"max_stale_secs": crate::settings::DEFAULT_MAX_STALE_SECS,
			}),
		);
		config.insert(
			"logging".to_string(),
			json!({ "level": "info", "format": "compact" }),
		);
		Ok(config)
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Built-in defaults".to_string()
	}
}

/// Settings read from a TOML file
#[derive(Debug)]
pub struct TomlFileSource {
	path: PathBuf,
	required: bool,
}

impl TomlFileSource {
	/// Create a source for the TOML file at `path`; a missing file is an error
	///
	/// # Examples
	///
	/// ```
	/// use wayfare_conf::sources::TomlFileSource;
	///
	/// let source = TomlFileSource::new("wayfare.toml").optional();
	/// // A missing wayfare.toml now loads as an empty layer
	/// ```
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}

	/// Treat a missing file as an empty layer
	pub fn optional(mut self) -> Self {
		self.required = false;
		self
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.required && !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
			path: self.path.clone(),
			source,
		})?;
		let table: toml::Table = toml::from_str(&content).map_err(|source| SourceError::Toml {
			path: self.path.clone(),
			source,
		})?;
		let value = serde_json::to_value(table).map_err(|e| SourceError::Parse(e.to_string()))?;

		match value {
			Value::Object(map) => Ok(map.into_iter().collect()),
			_ => Err(SourceError::Parse(format!(
				"{} does not contain a table",
				self.path.display()
			))),
		}
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Settings read from a `.env` file
#[derive(Debug)]
pub struct DotEnvSource {
	path: PathBuf,
	prefix: String,
}

impl DotEnvSource {
	/// Create a source for the `.env` file at `path`, keeping keys that start with `prefix`
	pub fn new(path: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			prefix: prefix.into(),
		}
	}
}

impl ConfigSource for DotEnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let mut config = IndexMap::new();
		for item in dotenv::from_path_iter(&self.path)? {
			let (key, value) = item?;
			insert_flat(&mut config, &self.prefix, &key, &value);
		}
		Ok(config)
	}

	fn priority(&self) -> u8 {
		75
	}

	fn description(&self) -> String {
		format!(".env file: {}", self.path.display())
	}
}

/// Settings read from prefixed process environment variables
#[derive(Debug)]
pub struct EnvSource {
	prefix: String,
}

impl EnvSource {
	/// Create a source reading variables that start with `prefix`
	///
	/// # Examples
	///
	/// ```
	/// use wayfare_conf::sources::EnvSource;
	///
	/// let source = EnvSource::new("WAYFARE_");
	/// // Only loads env vars starting with WAYFARE_
	/// ```
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let mut config = IndexMap::new();
		for (key, value) in std::env::vars() {
			insert_flat(&mut config, &self.prefix, &key, &value);
		}
		Ok(config)
	}

	fn priority(&self) -> u8 {
		100 // Highest priority
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

/// Insert a flat `PREFIX_SECTION__FIELD=value` pair as a nested value.
fn insert_flat(config: &mut IndexMap<String, Value>, prefix: &str, key: &str, raw: &str) {
	let Some(stripped) = key.strip_prefix(prefix) else {
		return;
	};
	let lower = stripped.to_lowercase();
	let mut segments = lower.split(NESTING_SEPARATOR).filter(|s| !s.is_empty());
	let Some(first) = segments.next() else {
		return;
	};
	let rest: Vec<&str> = segments.collect();
	let value = parse_scalar(raw);

	if rest.is_empty() {
		config.insert(first.to_string(), value);
		return;
	}

	let slot = config
		.entry(first.to_string())
		.or_insert_with(|| Value::Object(serde_json::Map::new()));
	insert_path(slot, &rest, value);
}

fn insert_path(slot: &mut Value, path: &[&str], value: Value) {
	if !slot.is_object() {
		*slot = Value::Object(serde_json::Map::new());
	}
	let Value::Object(map) = slot else {
		return;
	};
	match path {
		[] => {}
		[last] => {
			map.insert((*last).to_string(), value);
		}
		[head, tail @ ..] => {
			let child = map
				.entry((*head).to_string())
				.or_insert_with(|| Value::Object(serde_json::Map::new()));
			insert_path(child, tail, value);
		}
	}
}

/// Infer a JSON scalar from an environment string.
fn parse_scalar(raw: &str) -> Value {
	let trimmed = raw.trim();
	if let Ok(num) = trimmed.parse::<i64>() {
		return Value::Number(num.into());
	}
	match trimmed.to_lowercase().as_str() {
		"true" | "yes" | "on" => Value::Bool(true),
		"false" | "no" | "off" => Value::Bool(false),
		_ => Value::String(raw.to_string()),
	}
}

/// Deep-merge `overlay` into `base`; objects merge key by key, anything else replaces.
pub(crate) fn merge_value(base: &mut Value, overlay: Value) {
	match (base, overlay) {
		(Value::Object(base_map), Value::Object(overlay_map)) => {
			for (key, value) in overlay_map {
				match base_map.get_mut(&key) {
					Some(existing) => merge_value(existing, value),
					None => {
						base_map.insert(key, value);
					}
				}
			}
		}
		(base, overlay) => *base = overlay,
	}
}
