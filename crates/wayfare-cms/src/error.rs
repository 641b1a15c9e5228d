//! Error taxonomy of the content pipeline
//!
//! [`ValidationError`] and [`FetchError`] travel back to page assembly inside
//! a [`ContentError`]. [`UnapprovedBlockError`] and [`RenderError`] never leave
//! the block boundary: they become a [`FallbackCause`] on a fallback node.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Location of a field inside a JSON document, such as `data.images[1].url`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
	/// The document root
	pub fn root() -> Self {
		Self(String::new())
	}

	/// Path of a named field below this one
	pub fn field(&self, name: &str) -> Self {
		if self.0.is_empty() {
			Self(name.to_string())
		} else {
			Self(format!("{}.{}", self.0, name))
		}
	}

	/// Path of an array element below this one
	pub fn index(&self, index: usize) -> Self {
		Self(format!("{}[{}]", self.0, index))
	}

	/// Whether this is the document root
	pub fn is_root(&self) -> bool {
		self.0.is_empty()
	}

	/// The dotted path; empty for the root
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for FieldPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.0.is_empty() {
			f.write_str("(root)")
		} else {
			f.write_str(&self.0)
		}
	}
}

/// A payload that does not match its schema
///
/// `path` is the first offending field. `raw` is the unmodified input, kept
/// for diagnostics and never shown to end users in production.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{path}: {message}")]
pub struct ValidationError {
	/// First offending field
	pub path: FieldPath,
	/// What is wrong with it
	pub message: String,
	/// The complete input that was being validated
	pub raw: Option<Box<Value>>,
}

impl ValidationError {
	/// Create an error for the field at `path`
	pub fn new(path: FieldPath, message: impl Into<String>) -> Self {
		Self {
			path,
			message: message.into(),
			raw: None,
		}
	}

	/// Attach the raw input
	pub fn with_raw(mut self, raw: Value) -> Self {
		self.raw = Some(Box::new(raw));
		self
	}

	pub(crate) fn missing(path: FieldPath) -> Self {
		Self::new(path, "missing required field")
	}

	pub(crate) fn expected(path: FieldPath, what: &str, found: &Value) -> Self {
		Self::new(path, format!("expected {}, found {}", what, json_type(found)))
	}
}

pub(crate) fn json_type(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

/// Failure talking to the CMS
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
	/// No API key is configured
	#[error("CMS API key is not configured")]
	MissingApiKey,

	/// The request could not be sent or the connection failed
	#[error("network error requesting {endpoint}: {message}")]
	Network { endpoint: String, message: String },

	/// The request did not complete in time
	#[error("request to {endpoint} timed out")]
	Timeout { endpoint: String },

	/// The CMS answered with a non-success status
	#[error("{endpoint} returned HTTP {status}")]
	Status { endpoint: String, status: u16 },

	/// The response body is not the expected JSON envelope
	#[error("could not decode response from {endpoint}: {message}")]
	Decode { endpoint: String, message: String },
}

/// Why content for a page or package could not be produced
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContentError {
	/// The CMS returned an entry that failed validation
	#[error("invalid content: {0}")]
	Validation(#[from] ValidationError),

	/// The CMS could not be reached or answered with an error
	#[error(transparent)]
	Fetch(#[from] FetchError),

	/// The CMS has no entry for the requested key
	#[error("no {model} entry for '{key}'")]
	NotFound { model: String, key: String },
}

/// Result type for validation
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for content fetches
pub type ContentResult<T> = Result<T, ContentError>;

/// A block whose declared type is not in the approved set
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnapprovedBlockError {
	/// The declared `component.name` is not approved
	#[error("block type '{0}' is not approved")]
	NotApproved(String),

	/// The block envelope is malformed, so no type can be approved
	#[error("malformed block: {0}")]
	Malformed(ValidationError),
}

/// Failure inside an approved block's renderer
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
	/// The block's options do not match what the renderer needs
	#[error("invalid options: {0}")]
	InvalidOptions(#[from] ValidationError),

	/// The renderer completed without producing output
	#[error("renderer produced no output")]
	NoOutput,

	/// The renderer panicked
	#[error("renderer panicked: {0}")]
	Panicked(String),

	/// Any other renderer failure
	#[error("{0}")]
	Failed(String),
}

/// Why a block was replaced by the fallback node
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FallbackCause {
	/// The block is not approved
	#[error(transparent)]
	Unapproved(#[from] UnapprovedBlockError),

	/// The block is approved but no renderer is registered for it
	#[error("no renderer registered for approved block '{0}'")]
	MissingRenderer(String),

	/// The renderer failed or returned nothing
	#[error(transparent)]
	RenderFailed(#[from] RenderError),
}

impl FallbackCause {
	/// Short machine-readable name of the cause
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Unapproved(_) => "unapproved",
			Self::MissingRenderer(_) => "missing_renderer",
			Self::RenderFailed(_) => "render_failed",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_field_path_formatting() {
		let path = FieldPath::root().field("data").field("images").index(1).field("url");

		assert_eq!(path.to_string(), "data.images[1].url");
		assert_eq!(FieldPath::root().to_string(), "(root)");
		assert_eq!(FieldPath::root().index(2).to_string(), "[2]");
	}

	#[rstest]
	fn test_validation_error_message_includes_path() {
		let err = ValidationError::missing(FieldPath::root().field("data").field("slug"));

		assert_eq!(err.to_string(), "data.slug: missing required field");
	}

	#[rstest]
	#[case(FallbackCause::Unapproved(UnapprovedBlockError::NotApproved("Script".into())), "unapproved")]
	#[case(FallbackCause::MissingRenderer("Faq".into()), "missing_renderer")]
	#[case(FallbackCause::RenderFailed(RenderError::NoOutput), "render_failed")]
	fn test_fallback_cause_kind(#[case] cause: FallbackCause, #[case] kind: &str) {
		assert_eq!(cause.kind(), kind);
	}
}
