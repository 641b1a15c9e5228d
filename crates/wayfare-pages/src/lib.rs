//! # Wayfare Pages
//!
//! A minimal server-side view tree. Block renderers build [`View`] values and
//! page templates turn them into HTML with [`View::render_to_string`].
//!
//! ```
//! use wayfare_pages::{IntoView, View};
//!
//! let view = View::element("p").child("Fish & chips").into_view();
//! assert_eq!(view.render_to_string(), "<p>Fish &amp; chips</p>");
//! ```

#![warn(missing_docs)]

pub mod html;
pub mod view;

pub use view::{ElementView, IntoView, View};
