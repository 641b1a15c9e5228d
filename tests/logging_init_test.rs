//! Global subscriber installation. Kept in its own test binary because the
//! subscriber is process-wide.

use wayfare::LoggingError;
use wayfare::conf::{LogFormat, LoggingSettings};

#[test]
fn test_second_init_reports_already_initialized() {
	// Arrange
	let settings = LoggingSettings {
		level: "warn".to_string(),
		format: LogFormat::Json,
	};

	// Act
	let first = wayfare::logging::init(&settings);
	let second = wayfare::logging::init(&settings);

	// Assert
	assert!(first.is_ok());
	assert!(matches!(second, Err(LoggingError::AlreadyInitialized(_))));
}
