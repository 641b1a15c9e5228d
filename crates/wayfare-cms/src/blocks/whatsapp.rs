use super::{BlockRenderer, RenderContext, options_reader};
use crate::error::{RenderError, ValidationError, ValidationResult};
use crate::schema::ObjectReader;
use async_trait::async_trait;
use serde_json::{Map, Value};
use wayfare_pages::{IntoView, View};

const DEFAULT_LABEL: &str = "Chat with us on WhatsApp";

/// Click-to-chat link to a WhatsApp number
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatsAppCtaBlock;

/// Digits of a phone number written with an optional leading `+` and
/// space, dash, dot or parenthesis separators
fn phone_digits(opts: &ObjectReader<'_>) -> ValidationResult<String> {
	let raw = opts.required_str("phone")?;
	let trimmed = raw.trim();
	let body = trimmed.strip_prefix('+').unwrap_or(trimmed);

	let mut digits = String::with_capacity(body.len());
	for c in body.chars() {
		match c {
			'0'..='9' => digits.push(c),
			' ' | '-' | '.' | '(' | ')' => {}
			_ => {
				return Err(ValidationError::new(
					opts.path("phone"),
					"must contain only digits with an optional leading '+'",
				));
			}
		}
	}

	if !(6..=15).contains(&digits.len()) {
		return Err(ValidationError::new(
			opts.path("phone"),
			"must have between 6 and 15 digits",
		));
	}
	Ok(digits)
}

/// `wa.me` link with an optional prefilled message
pub fn whatsapp_link(digits: &str, message: Option<&str>) -> String {
	match message.filter(|m| !m.trim().is_empty()) {
		Some(message) => {
			let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
			// form encoding writes spaces as '+'; a literal '+' is already %2B
			format!("https://wa.me/{}?text={}", digits, encoded.replace('+', "%20"))
		}
		None => format!("https://wa.me/{}", digits),
	}
}

#[async_trait]
impl BlockRenderer for WhatsAppCtaBlock {
	async fn render(
		&self,
		options: &Map<String, Value>,
		_ctx: &RenderContext<'_>,
	) -> Result<Option<View>, RenderError> {
		let opts = options_reader(options);
		let digits = phone_digits(&opts)?;
		let message = opts.optional_str("message")?;
		let label = opts
			.optional_str("label")?
			.filter(|l| !l.trim().is_empty())
			.unwrap_or_else(|| DEFAULT_LABEL.to_string());

		Ok(Some(
			View::element("a")
				.attr("class", "whatsapp-cta")
				.attr("href", whatsapp_link(&digits, message.as_deref()))
				.attr("target", "_blank")
				.attr("rel", "noopener noreferrer")
				.child(label)
				.into_view(),
		))
	}
}
