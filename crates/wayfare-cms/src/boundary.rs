//! Per-block failure isolation
//!
//! Every failure of a single block (not approved, no renderer, error, panic,
//! or no output) produces the same fallback node shape. Development mode
//! adds an expandable diagnostic panel; production mode shows a generic
//! message with no internal text.

use crate::blocks::RenderMode;
use crate::error::{FallbackCause, RenderError};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use wayfare_pages::{IntoView, View};

/// Message shown in place of a failed block in production
pub const UNAVAILABLE_MESSAGE: &str = "This section is currently unavailable.";

/// Outcome of rendering one block
#[derive(Debug, Clone, PartialEq)]
pub enum NodeStatus {
	Rendered,
	Fallback(FallbackCause),
}

/// One entry of the rendered node list, in block order
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
	/// Declared `component.name`, when the block had one
	pub block: Option<String>,
	pub status: NodeStatus,
	pub view: View,
}

impl RenderNode {
	pub fn is_fallback(&self) -> bool {
		matches!(self.status, NodeStatus::Fallback(_))
	}

	/// Why this node is a fallback, if it is one
	pub fn cause(&self) -> Option<&FallbackCause> {
		match &self.status {
			NodeStatus::Fallback(cause) => Some(cause),
			NodeStatus::Rendered => None,
		}
	}
}

/// Run a render future, turning a panic into [`RenderError::Panicked`]
pub async fn isolate<F>(render: F) -> Result<Option<View>, RenderError>
where
	F: Future<Output = Result<Option<View>, RenderError>>,
{
	match AssertUnwindSafe(render).catch_unwind().await {
		Ok(outcome) => outcome,
		Err(payload) => Err(RenderError::Panicked(panic_message(payload.as_ref()))),
	}
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"non-string panic payload".to_string()
	}
}

/// The fallback view for a block named `name` that failed with `cause`
pub fn fallback_view(name: Option<&str>, cause: &FallbackCause, mode: RenderMode) -> View {
	let section = View::element("section")
		.attr("class", "block-fallback")
		.attr("role", "note");

	if !mode.shows_diagnostics() {
		return section
			.child(View::element("p").child(UNAVAILABLE_MESSAGE))
			.into_view();
	}

	let label = name.unwrap_or("(unnamed)").to_string();
	section
		.attr("data-block", label.clone())
		.child(
			View::element("details")
				.attr("class", "block-fallback__diagnostic")
				.child(View::element("summary").child(format!("Block \"{label}\" could not be rendered")))
				.child(
					View::element("p")
						.attr("class", "block-fallback__cause")
						.child(cause.kind()),
				)
				.child(View::element("pre").child(cause.to_string())),
		)
		.into_view()
}

/// Build the fallback node for a failed block and log it
pub fn fallback_node(name: Option<&str>, cause: FallbackCause, mode: RenderMode) -> RenderNode {
	tracing::warn!(
		block = name.unwrap_or("(unnamed)"),
		cause = cause.kind(),
		detail = %cause,
		"block degraded to fallback"
	);
	RenderNode {
		block: name.map(str::to_string),
		view: fallback_view(name, &cause, mode),
		status: NodeStatus::Fallback(cause),
	}
}
