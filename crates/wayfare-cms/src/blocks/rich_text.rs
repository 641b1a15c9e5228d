use super::{BlockRenderer, RenderContext, options_reader};
use crate::error::RenderError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use wayfare_pages::{IntoView, View};

/// Plain text split into paragraphs on blank lines
///
/// The text is always escaped; markup in CMS text is shown, not interpreted.
#[derive(Debug, Clone, Copy, Default)]
pub struct RichTextBlock;

fn paragraphs(text: &str) -> Vec<String> {
	let mut out = Vec::new();
	let mut current: Vec<&str> = Vec::new();
	for line in text.lines() {
		if line.trim().is_empty() {
			if !current.is_empty() {
				out.push(current.join("\n"));
				current.clear();
			}
		} else {
			current.push(line.trim_end());
		}
	}
	if !current.is_empty() {
		out.push(current.join("\n"));
	}
	out
}

#[async_trait]
impl BlockRenderer for RichTextBlock {
	async fn render(
		&self,
		options: &Map<String, Value>,
		_ctx: &RenderContext<'_>,
	) -> Result<Option<View>, RenderError> {
		let text = options_reader(options).required_str("text")?;
		let paras = paragraphs(&text);
		if paras.is_empty() {
			return Ok(None);
		}

		Ok(Some(
			View::element("div")
				.attr("class", "rich-text")
				.children(paras.into_iter().map(|p| View::element("p").child(p)))
				.into_view(),
		))
	}
}
