//! View tree for server-side rendering

use crate::html::write_escaped;
use std::borrow::Cow;
use std::fmt;

/// Elements written without a closing tag
const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

/// Renderable content.
///
/// Tag and attribute names are `&'static str`, so only code chooses them.
/// Content can only reach text nodes and attribute values, and both are
/// escaped when rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
	/// An HTML element
	Element(ElementView),
	/// A text node
	Text(Cow<'static, str>),
	/// Several views without a wrapper element
	Fragment(Vec<View>),
	/// Renders nothing
	Empty,
}

/// An element under construction or in a finished tree
#[derive(Debug, Clone, PartialEq)]
pub struct ElementView {
	tag: &'static str,
	attrs: Vec<(&'static str, Cow<'static, str>)>,
	children: Vec<View>,
}

impl ElementView {
	/// Start an element with no attributes or children
	pub fn new(tag: &'static str) -> Self {
		Self {
			tag,
			attrs: Vec::new(),
			children: Vec::new(),
		}
	}

	/// Append an attribute
	pub fn attr(mut self, name: &'static str, value: impl Into<Cow<'static, str>>) -> Self {
		self.attrs.push((name, value.into()));
		self
	}

	/// Append a child
	pub fn child(mut self, child: impl IntoView) -> Self {
		self.children.push(child.into_view());
		self
	}

	/// Append several children in order
	pub fn children(mut self, children: impl IntoIterator<Item = impl IntoView>) -> Self {
		self.children.extend(children.into_iter().map(IntoView::into_view));
		self
	}

	fn is_void(&self) -> bool {
		VOID_ELEMENTS.contains(&self.tag)
	}
}

impl View {
	/// Start an element
	pub fn element(tag: &'static str) -> ElementView {
		ElementView::new(tag)
	}

	/// A text node
	pub fn text(content: impl Into<Cow<'static, str>>) -> Self {
		Self::Text(content.into())
	}

	/// Views without a wrapper element
	pub fn fragment(children: impl IntoIterator<Item = impl IntoView>) -> Self {
		Self::Fragment(children.into_iter().map(IntoView::into_view).collect())
	}

	/// A view that renders nothing
	pub fn empty() -> Self {
		Self::Empty
	}

	/// Whether rendering this view produces no output
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Empty => true,
			Self::Text(text) => text.is_empty(),
			Self::Fragment(children) => children.iter().all(Self::is_empty),
			Self::Element(_) => false,
		}
	}

	/// Render as HTML
	pub fn render_to_string(&self) -> String {
		self.to_string()
	}
}

impl fmt::Display for ElementView {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "<{}", self.tag)?;
		for (name, value) in &self.attrs {
			write!(f, " {}=\"", name)?;
			write_escaped(f, value)?;
			f.write_str("\"")?;
		}
		if self.is_void() {
			return f.write_str(" />");
		}
		f.write_str(">")?;
		for child in &self.children {
			write!(f, "{}", child)?;
		}
		write!(f, "</{}>", self.tag)
	}
}

impl fmt::Display for View {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Element(element) => fmt::Display::fmt(element, f),
			Self::Text(text) => write_escaped(f, text),
			Self::Fragment(children) => children.iter().try_for_each(|child| fmt::Display::fmt(child, f)),
			Self::Empty => Ok(()),
		}
	}
}

/// Conversion into a [`View`]
pub trait IntoView {
	/// Convert into a view
	fn into_view(self) -> View;
}

impl IntoView for View {
	fn into_view(self) -> View {
		self
	}
}

impl IntoView for ElementView {
	fn into_view(self) -> View {
		View::Element(self)
	}
}

impl IntoView for String {
	fn into_view(self) -> View {
		View::text(self)
	}
}

impl IntoView for &'static str {
	fn into_view(self) -> View {
		View::text(self)
	}
}

impl<T: IntoView> IntoView for Option<T> {
	fn into_view(self) -> View {
		self.map_or(View::Empty, IntoView::into_view)
	}
}

impl<T: IntoView> IntoView for Vec<T> {
	fn into_view(self) -> View {
		View::fragment(self)
	}
}
