//! Layered configuration for the Wayfare content pipeline
//!
//! Settings are assembled from prioritized sources:
//!
//! | Source | Priority |
//! |--------|----------|
//! | [`sources::DefaultSource`] | 0 |
//! | [`sources::TomlFileSource`] | 50 |
//! | [`sources::DotEnvSource`] | 75 |
//! | [`sources::EnvSource`] | 100 |
//!
//! ```
//! use wayfare_conf::SettingsBuilder;
//!
//! let settings = SettingsBuilder::standard(None).build().unwrap();
//! println!("page ttl: {:?}", settings.cache.page_ttl());
//! ```

pub mod builder;
pub mod settings;
pub mod sources;

pub use builder::{ENV_PREFIX, SettingsBuilder};
pub use settings::{
	CacheSettings, CmsSettings, Environment, LogFormat, LoggingSettings, Settings, SettingsError,
	SettingsResult,
};
pub use sources::{ConfigSource, SourceError};
