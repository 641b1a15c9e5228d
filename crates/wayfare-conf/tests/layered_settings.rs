//! Layering of defaults, TOML, .env and environment variables

use rstest::rstest;
use serial_test::serial;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use wayfare_conf::sources::{DefaultSource, DotEnvSource, EnvSource, TomlFileSource};
use wayfare_conf::{ConfigSource, Environment, LogFormat, SettingsBuilder, SettingsError};

fn toml_file(content: &str) -> NamedTempFile {
	let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
	file.write_all(content.as_bytes()).unwrap();
	file
}

struct EnvGuard(&'static [&'static str]);

impl Drop for EnvGuard {
	fn drop(&mut self) {
		for key in self.0 {
			// SAFETY: tests touching the environment are serialized
			unsafe { std::env::remove_var(key) };
		}
	}
}

fn set_env(pairs: &[(&'static str, &str)]) {
	for (key, value) in pairs {
		// SAFETY: tests touching the environment are serialized
		unsafe { std::env::set_var(key, value) };
	}
}

#[rstest]
#[serial]
fn test_toml_overrides_defaults() {
	// Arrange
	let file = toml_file(
		r#"
environment = "production"

[cms]
api_key = "from-toml"
package_model = "package"

[logging]
format = "json"
"#,
	);

	// Act
	let settings = SettingsBuilder::new()
		.add_source(DefaultSource::new())
		.add_source(TomlFileSource::new(file.path()))
		.build()
		.unwrap();

	// Assert
	assert_eq!(settings.environment, Environment::Production);
	assert_eq!(settings.cms.api_key(), Some("from-toml"));
	assert_eq!(settings.cms.package_model, "package");
	assert_eq!(settings.cms.page_model, "page");
	assert_eq!(settings.logging.format, LogFormat::Json);
	assert_eq!(settings.cache.page_ttl(), Duration::from_secs(3600));
}

#[rstest]
#[serial]
fn test_env_overrides_toml_ttls() {
	// Arrange
	let _guard = EnvGuard(&[
		"WAYFARE_CACHE__PAGE_TTL_SECS",
		"WAYFARE_CACHE__PACKAGE_LIST_TTL_SECS",
		"WAYFARE_CMS__API_KEY",
	]);
	set_env(&[
		("WAYFARE_CACHE__PAGE_TTL_SECS", "120"),
		("WAYFARE_CACHE__PACKAGE_LIST_TTL_SECS", "30"),
		("WAYFARE_CMS__API_KEY", "from-env"),
	]);
	let file = toml_file("[cache]\npage_ttl_secs = 600\npackage_ttl_secs = 900\n");

	// Act
	let settings = SettingsBuilder::new()
		.add_source(EnvSource::new("WAYFARE_"))
		.add_source(TomlFileSource::new(file.path()))
		.add_source(DefaultSource::new())
		.build()
		.unwrap();

	// Assert
	assert_eq!(settings.cache.page_ttl_secs, 120);
	assert_eq!(settings.cache.package_list_ttl_secs, 30);
	assert_eq!(settings.cache.package_ttl_secs, 900);
	assert_eq!(settings.cms.api_key(), Some("from-env"));
}

#[rstest]
#[serial]
fn test_dotenv_sits_between_toml_and_env() {
	// Arrange
	let _guard = EnvGuard(&["WAYFARE_CACHE__PACKAGE_TTL_SECS"]);
	set_env(&[("WAYFARE_CACHE__PACKAGE_TTL_SECS", "5")]);
	let dir = tempfile::tempdir().unwrap();
	let dotenv_path = dir.path().join(".env");
	std::fs::write(
		&dotenv_path,
		"WAYFARE_CACHE__PAGE_TTL_SECS=42\nWAYFARE_CACHE__PACKAGE_TTL_SECS=43\nUNRELATED=1\n",
	)
	.unwrap();
	let file = toml_file("[cache]\npage_ttl_secs = 600\n");

	// Act
	let settings = SettingsBuilder::new()
		.add_source(DefaultSource::new())
		.add_source(TomlFileSource::new(file.path()))
		.add_source(DotEnvSource::new(&dotenv_path, "WAYFARE_"))
		.add_source(EnvSource::new("WAYFARE_"))
		.build()
		.unwrap();

	// Assert
	assert_eq!(settings.cache.page_ttl_secs, 42);
	assert_eq!(settings.cache.package_ttl_secs, 5);
}

#[rstest]
fn test_missing_dotenv_is_empty() {
	let dir = tempfile::tempdir().unwrap();

	let layer = DotEnvSource::new(dir.path().join(".env"), "WAYFARE_")
		.load()
		.unwrap();

	assert!(layer.is_empty());
}

#[rstest]
fn test_optional_toml_missing_is_empty() {
	let dir = tempfile::tempdir().unwrap();

	let layer = TomlFileSource::new(dir.path().join("wayfare.toml"))
		.optional()
		.load()
		.unwrap();

	assert!(layer.is_empty());
}

#[rstest]
fn test_required_toml_missing_is_source_error() {
	let dir = tempfile::tempdir().unwrap();

	let result = SettingsBuilder::new()
		.add_source(TomlFileSource::new(dir.path().join("absent.toml")))
		.build();

	assert!(matches!(result, Err(SettingsError::Source { .. })));
}

#[rstest]
fn test_malformed_toml_is_source_error() {
	let file = toml_file("[cache\npage_ttl_secs = ");

	let result = SettingsBuilder::new()
		.add_source(TomlFileSource::new(file.path()))
		.build();

	assert!(matches!(result, Err(SettingsError::Source { .. })));
}

#[rstest]
fn test_wrong_type_is_deserialize_error() {
	let file = toml_file("[cache]\npage_ttl_secs = \"soon\"\n");

	let result = SettingsBuilder::new()
		.add_source(DefaultSource::new())
		.add_source(TomlFileSource::new(file.path()))
		.build();

	assert!(matches!(result, Err(SettingsError::Deserialize(_))));
}
