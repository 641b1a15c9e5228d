use super::{BlockRenderer, RenderContext, options_reader};
use crate::error::{RenderError, ValidationError};
use crate::image;
use async_trait::async_trait;
use serde_json::{Map, Value};
use wayfare_pages::{IntoView, View};

/// Page header with title, optional subtitle, image and call to action
#[derive(Debug, Clone, Copy, Default)]
pub struct HeroBlock;

/// Whether `url` is safe as a link target: absolute http(s) or a site path
pub(crate) fn is_safe_link(url: &str) -> bool {
	let url = url.trim();
	if url.starts_with('/') {
		return !url.starts_with("//") && !url.starts_with("/\\");
	}
	image::normalize_str(url).is_some()
}

#[async_trait]
impl BlockRenderer for HeroBlock {
	async fn render(
		&self,
		options: &Map<String, Value>,
		_ctx: &RenderContext<'_>,
	) -> Result<Option<View>, RenderError> {
		let opts = options_reader(options);
		let title = opts.required_str("title")?;
		let subtitle = opts.optional_str("subtitle")?;
		let cta_text = opts.optional_str("ctaText")?;
		let cta_url = opts.optional_str("ctaUrl")?;

		if let Some(url) = &cta_url
			&& !is_safe_link(url)
		{
			return Err(ValidationError::new(
				opts.path("ctaUrl"),
				"must be an absolute http(s) URL or a path starting with '/'",
			)
			.into());
		}

		let media = opts.get("image").map(|raw| {
			let alt = image::alt_text(raw).map(str::to_string).or_else(|| Some(title.clone()));
			image::image_or_placeholder(image::normalize(Some(raw)), alt)
		});

		let cta = match (cta_text, cta_url) {
			(Some(text), Some(url)) => Some(
				View::element("a")
					.attr("class", "hero__cta")
					.attr("href", url.trim().to_string())
					.child(text),
			),
			_ => None,
		};

		let content = View::element("div")
			.attr("class", "hero__content")
			.child(View::element("h1").child(title))
			.child(subtitle.map(|s| View::element("p").attr("class", "hero__subtitle").child(s)))
			.child(cta);

		Ok(Some(
			View::element("section")
				.attr("class", "hero")
				.child(media)
				.child(content)
				.into_view(),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::blocks::EmptyPackageSource;
	use crate::blocks::testing::{dev_ctx, options};
	use rstest::rstest;
	use serde_json::json;

	async fn render(value: Value) -> Result<Option<View>, RenderError> {
		let packages = EmptyPackageSource;
		HeroBlock.render(&options(value), &dev_ctx(&packages)).await
	}

	#[rstest]
	#[tokio::test]
	async fn test_full_hero() {
		// Act
		let view = render(json!({
			"title": "Island <hopping>",
			"subtitle": "Greece in spring",
			"image": { "src": "https://img.example/hero.jpg", "alt": "Santorini" },
			"ctaText": "See packages",
			"ctaUrl": "/packages"
		}))
		.await
		.unwrap()
		.unwrap();

		// Assert
		let html = view.render_to_string();
		assert!(html.contains("<h1>Island &lt;hopping&gt;</h1>"));
		assert!(html.contains("src=\"https://img.example/hero.jpg\""));
		assert!(html.contains("alt=\"Santorini\""));
		assert!(html.contains("<a class=\"hero__cta\" href=\"/packages\">See packages</a>"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_invalid_image_renders_placeholder() {
		let view = render(json!({ "title": "T", "image": "javascript:alert(1)" }))
			.await
			.unwrap()
			.unwrap();

		let html = view.render_to_string();
		assert!(html.contains("image-placeholder"));
		assert!(!html.contains("javascript:"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_title_is_invalid_options() {
		let err = render(json!({ "subtitle": "no title" })).await.unwrap_err();

		assert_eq!(err.to_string(), "invalid options: options.title: missing required field");
	}

	#[rstest]
	#[case("javascript:alert(1)")]
	#[case("//evil.example/phish")]
	#[case("packages")]
	#[tokio::test]
	async fn test_unsafe_cta_rejected(#[case] url: &str) {
		let result = render(json!({ "title": "T", "ctaText": "Go", "ctaUrl": url })).await;

		assert!(matches!(result, Err(RenderError::InvalidOptions(_))));
	}

	#[rstest]
	#[case("/contact", true)]
	#[case("https://wayfare.example/book", true)]
	#[case("//cdn.example", false)]
	#[case("mailto:hi@example.com", false)]
	fn test_is_safe_link(#[case] url: &str, #[case] safe: bool) {
		assert_eq!(is_safe_link(url), safe);
	}
}
