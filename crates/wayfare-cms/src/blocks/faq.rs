use super::{BlockRenderer, RenderContext, options_reader};
use crate::error::{FieldPath, RenderError, ValidationResult};
use crate::schema::ObjectReader;
use async_trait::async_trait;
use serde_json::{Map, Value};
use wayfare_pages::{IntoView, View};

/// Questions and answers as expandable `<details>` elements
#[derive(Debug, Clone, Copy, Default)]
pub struct FaqBlock;

fn item(value: &Value, path: &FieldPath) -> ValidationResult<(String, String)> {
	let obj = ObjectReader::new(value, path)?;
	Ok((obj.required_str("question")?, obj.required_str("answer")?))
}

#[async_trait]
impl BlockRenderer for FaqBlock {
	async fn render(
		&self,
		options: &Map<String, Value>,
		_ctx: &RenderContext<'_>,
	) -> Result<Option<View>, RenderError> {
		let opts = options_reader(options);
		let title = opts.optional_str("title")?;
		let items = opts.optional_list("items", item)?.unwrap_or_default();
		if items.is_empty() {
			return Ok(None);
		}

		let entries = items.into_iter().map(|(question, answer)| {
			View::element("details")
				.attr("class", "faq__item")
				.child(View::element("summary").child(question))
				.child(View::element("p").child(answer))
		});

		Ok(Some(
			View::element("section")
				.attr("class", "faq")
				.child(title.map(|t| View::element("h2").child(t)))
				.children(entries)
				.into_view(),
		))
	}
}
