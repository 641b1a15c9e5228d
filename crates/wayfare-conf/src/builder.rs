//! Layered settings builder

use crate::settings::{Settings, SettingsError, SettingsResult};
use crate::sources::{ConfigSource, DefaultSource, DotEnvSource, EnvSource, TomlFileSource, merge_value};
use serde_json::Value;
use std::path::PathBuf;

/// Prefix for environment variables and `.env` keys
pub const ENV_PREFIX: &str = "WAYFARE_";

/// Builds [`Settings`] from a set of prioritized sources
///
/// # Examples
///
/// ```
/// use wayfare_conf::{SettingsBuilder, sources::DefaultSource};
///
/// let settings = SettingsBuilder::new()
///     .add_source(DefaultSource::new())
///     .build()
///     .unwrap();
/// assert_eq!(settings.cache.package_list_ttl_secs, 300);
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl std::fmt::Debug for SettingsBuilder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let sources: Vec<String> = self.sources.iter().map(|s| s.description()).collect();
		f.debug_struct("SettingsBuilder")
			.field("sources", &sources)
			.finish()
	}
}

impl SettingsBuilder {
	/// Create a builder with no sources
	pub fn new() -> Self {
		Self::default()
	}

	/// The standard layering: defaults, optional `wayfare.toml`, optional
	/// `.env`, then `WAYFARE_`-prefixed environment variables.
	pub fn standard(toml_path: Option<PathBuf>) -> Self {
		let toml_path = toml_path.unwrap_or_else(|| PathBuf::from("wayfare.toml"));
		Self::new()
			.add_source(DefaultSource::new())
			.add_source(TomlFileSource::new(toml_path).optional())
			.add_source(DotEnvSource::new(".env", ENV_PREFIX))
			.add_source(EnvSource::new(ENV_PREFIX))
	}

	/// Add a source; order of addition does not matter, priority does
	pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Merge every source and return the raw merged tree
	pub fn merged(&self) -> SettingsResult<Value> {
		let mut ordered: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| s.as_ref()).collect();
		ordered.sort_by_key(|source| source.priority());

		let mut merged = Value::Object(serde_json::Map::new());
		for source in ordered {
			let layer = source.load().map_err(|error| SettingsError::Source {
				source_name: source.description(),
				error,
			})?;
			let layer: serde_json::Map<String, Value> = layer.into_iter().collect();
			merge_value(&mut merged, Value::Object(layer));
		}
		Ok(merged)
	}

	/// Merge, deserialize and validate
	pub fn build(&self) -> SettingsResult<Settings> {
		let settings: Settings = serde_json::from_value(self.merged()?)?;
		settings.validate()?;
		Ok(settings)
	}
}
