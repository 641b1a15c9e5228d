//! HTML escaping

use std::fmt::{self, Write};

/// Replacement for a character that must not appear verbatim in HTML text or
/// a double-quoted attribute value
fn entity(c: char) -> Option<&'static str> {
	match c {
		'&' => Some("&amp;"),
		'<' => Some("&lt;"),
		'>' => Some("&gt;"),
		'"' => Some("&quot;"),
		'\'' => Some("&#x27;"),
		_ => None,
	}
}

/// Write `text` to `out` with HTML special characters escaped
pub fn write_escaped<W: Write + ?Sized>(out: &mut W, text: &str) -> fmt::Result {
	let mut written = 0;
	for (i, c) in text.char_indices() {
		if let Some(replacement) = entity(c) {
			out.write_str(&text[written..i])?;
			out.write_str(replacement)?;
			written = i + c.len_utf8();
		}
	}
	out.write_str(&text[written..])
}

/// Escape HTML special characters, quotes included
///
/// ```
/// use wayfare_pages::html::escape;
///
/// assert_eq!(escape("Bali & Lombok"), "Bali &amp; Lombok");
/// assert_eq!(escape("<a href='x'>"), "&lt;a href=&#x27;x&#x27;&gt;");
/// ```
pub fn escape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	// Writing to a String cannot fail
	let _ = write_escaped(&mut out, text);
	out
}
