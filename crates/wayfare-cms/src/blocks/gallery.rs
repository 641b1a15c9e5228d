use super::{BlockRenderer, RenderContext, options_reader};
use crate::error::RenderError;
use crate::image;
use async_trait::async_trait;
use serde_json::{Map, Value};
use wayfare_pages::{IntoView, View};

/// Grid of images; entries that fail normalization show the placeholder
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageGalleryBlock;

#[async_trait]
impl BlockRenderer for ImageGalleryBlock {
	async fn render(
		&self,
		options: &Map<String, Value>,
		_ctx: &RenderContext<'_>,
	) -> Result<Option<View>, RenderError> {
		let opts = options_reader(options);
		let images = opts.optional_array("images")?.map(Vec::as_slice).unwrap_or_default();
		if images.is_empty() {
			return Ok(None);
		}

		let figures = images.iter().map(|raw| {
			let alt = image::alt_text(raw).map(str::to_string);
			View::element("figure")
				.attr("class", "gallery__item")
				.child(image::image_or_placeholder(image::normalize(Some(raw)), alt))
		});

		Ok(Some(
			View::element("div")
				.attr("class", "gallery")
				.children(figures)
				.into_view(),
		))
	}
}
