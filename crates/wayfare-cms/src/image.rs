//! Image normalization
//!
//! CMS exports carry images as bare strings or as objects with `src` or
//! `url`. Only absolute `http(s)` URLs with a host survive normalization:
//! relative paths, `javascript:` and `data:` URIs never do.

use serde_json::Value;
use wayfare_pages::{IntoView, View};

/// Normalize a single URL string
pub fn normalize_str(raw: &str) -> Option<String> {
	let trimmed = raw.trim();
	if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
		return None;
	}
	let parsed = url::Url::parse(trimmed).ok()?;
	parsed
		.host_str()
		.filter(|host| !host.is_empty())
		.map(|_| trimmed.to_string())
}

/// Normalize any raw image representation to its URL
///
/// Objects prefer `src` and fall back to `url` when `src` is absent.
///
/// ```
/// use serde_json::json;
/// use wayfare_cms::image::normalize;
///
/// assert_eq!(
///     normalize(Some(&json!({ "url": "https://img.example/a.jpg" }))).as_deref(),
///     Some("https://img.example/a.jpg"),
/// );
/// assert_eq!(normalize(Some(&json!("javascript:alert(1)"))), None);
/// assert_eq!(normalize(None), None);
/// ```
pub fn normalize(image: Option<&Value>) -> Option<String> {
	match image? {
		Value::String(s) => normalize_str(s),
		Value::Object(map) => {
			let candidate = map
				.get("src")
				.filter(|v| !v.is_null())
				.or_else(|| map.get("url"))?;
			candidate.as_str().and_then(normalize_str)
		}
		_ => None,
	}
}

/// The first image for which [`normalize`] succeeds, in order
pub fn get_first_valid<'a>(images: impl IntoIterator<Item = &'a Value>) -> Option<String> {
	images.into_iter().find_map(|image| normalize(Some(image)))
}

/// `alt` text of a raw image object, if any
pub fn alt_text(image: &Value) -> Option<&str> {
	image.get("alt").and_then(Value::as_str)
}

/// An `<img>` for a normalized URL
pub fn image_view(url: String, alt: Option<String>) -> View {
	View::element("img")
		.attr("src", url)
		.attr("alt", alt.unwrap_or_default())
		.attr("loading", "lazy")
		.into_view()
}

/// The explicit stand-in for an image that could not be normalized
pub fn placeholder() -> View {
	View::element("div")
		.attr("class", "image-placeholder")
		.attr("role", "img")
		.attr("aria-label", "Image unavailable")
		.child("Image unavailable")
		.into_view()
}

/// An `<img>` when `url` is present, otherwise the placeholder
pub fn image_or_placeholder(url: Option<String>, alt: Option<String>) -> View {
	match url {
		Some(url) => image_view(url, alt),
		None => placeholder(),
	}
}
