//! Block allow-list and dispatch
//!
//! Only the block types named by [`BlockKind`] can ever be rendered. The
//! registry checks a block's declared `component.name` against that set
//! before any renderer runs; renderers can only be registered for a
//! [`BlockKind`], so no CMS data can add to the set.
//!
//! ```
//! use serde_json::json;
//! use wayfare_cms::blocks::{BlockRegistry, EmptyPackageSource, RenderContext, RenderMode};
//! use wayfare_cms::model::PageData;
//! use wayfare_cms::schema::validate_as;
//!
//! # async fn example() {
//! let page: PageData = validate_as(&json!({
//!     "blocks": [
//!         { "@type": "@builder.io/sdk:Element",
//!           "component": { "name": "RichText", "options": { "text": "Hello" } } },
//!         { "@type": "@builder.io/sdk:Element",
//!           "component": { "name": "CustomScript", "options": {} } }
//!     ]
//! }))
//! .unwrap();
//!
//! let registry = BlockRegistry::standard();
//! let ctx = RenderContext::new(RenderMode::Production, &EmptyPackageSource);
//! let nodes = registry.render_blocks(page.blocks_to_render(), &ctx).await;
//!
//! assert!(!nodes[0].is_fallback());
//! assert!(nodes[1].is_fallback());
//! # }
//! ```

mod faq;
mod gallery;
mod hero;
mod packages_grid;
mod rich_text;
mod whatsapp;

pub use faq::FaqBlock;
pub use gallery::ImageGalleryBlock;
pub use hero::HeroBlock;
pub use packages_grid::PackagesGridBlock;
pub use rich_text::RichTextBlock;
pub use whatsapp::WhatsAppCtaBlock;

use crate::boundary::{self, NodeStatus, RenderNode};
use crate::error::{
	ContentResult, FallbackCause, FieldPath, RenderError, UnapprovedBlockError,
};
use crate::model::{Block, BlockSource, PackageFilters, PackageList};
use crate::schema::{ObjectReader, Schema};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use wayfare_pages::View;

/// The approved block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
	Hero,
	RichText,
	PackagesGrid,
	ImageGallery,
	WhatsAppCta,
	Faq,
}

impl BlockKind {
	/// Every approved kind
	pub const ALL: [BlockKind; 6] = [
		Self::Hero,
		Self::RichText,
		Self::PackagesGrid,
		Self::ImageGallery,
		Self::WhatsAppCta,
		Self::Faq,
	];

	/// The `component.name` that selects this kind
	pub fn name(self) -> &'static str {
		match self {
			Self::Hero => "Hero",
			Self::RichText => "RichText",
			Self::PackagesGrid => "PackagesGrid",
			Self::ImageGallery => "ImageGallery",
			Self::WhatsAppCta => "WhatsAppCta",
			Self::Faq => "Faq",
		}
	}

	/// The approved kind named exactly `name`, if any
	///
	/// Matching is exact: case or whitespace variants are not approved.
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.name() == name)
	}
}

impl fmt::Display for BlockKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Whether fallback nodes may show diagnostic detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
	#[default]
	Development,
	Production,
}

impl RenderMode {
	pub fn shows_diagnostics(self) -> bool {
		matches!(self, Self::Development)
	}
}

/// Supplies package lists to blocks that show packages
#[async_trait]
pub trait PackageSource: Send + Sync {
	async fn fetch_packages(&self, filters: &PackageFilters) -> ContentResult<PackageList>;
}

/// A [`PackageSource`] with no packages
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyPackageSource;

#[async_trait]
impl PackageSource for EmptyPackageSource {
	async fn fetch_packages(&self, _filters: &PackageFilters) -> ContentResult<PackageList> {
		Ok(PackageList::default())
	}
}

/// Everything a renderer may use besides its options
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
	pub mode: RenderMode,
	pub packages: &'a dyn PackageSource,
}

impl<'a> RenderContext<'a> {
	pub fn new(mode: RenderMode, packages: &'a dyn PackageSource) -> Self {
		Self { mode, packages }
	}
}

impl fmt::Debug for RenderContext<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderContext")
			.field("mode", &self.mode)
			.finish_non_exhaustive()
	}
}

/// Renders one approved block type
///
/// `Ok(None)` means the renderer had nothing to show; the block then
/// degrades to the fallback node like any other failure.
#[async_trait]
pub trait BlockRenderer: Send + Sync {
	async fn render(
		&self,
		options: &Map<String, Value>,
		ctx: &RenderContext<'_>,
	) -> Result<Option<View>, RenderError>;
}

/// Options reader rooted at `options`, for renderers
pub(crate) fn options_reader(options: &Map<String, Value>) -> ObjectReader<'_> {
	ObjectReader::from_map(options, &FieldPath::root().field("options"))
}

/// Maps approved block kinds to their renderers
#[derive(Clone, Default)]
pub struct BlockRegistry {
	renderers: HashMap<BlockKind, Arc<dyn BlockRenderer>>,
}

impl fmt::Debug for BlockRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut kinds: Vec<&str> = self.renderers.keys().map(|kind| kind.name()).collect();
		kinds.sort_unstable();
		f.debug_struct("BlockRegistry")
			.field("renderers", &kinds)
			.finish()
	}
}

impl BlockRegistry {
	/// A registry with no renderers
	pub fn empty() -> Self {
		Self::default()
	}

	/// A registry with the built-in renderer for every approved kind
	pub fn standard() -> Self {
		Self::empty()
			.with(BlockKind::Hero, HeroBlock)
			.with(BlockKind::RichText, RichTextBlock)
			.with(BlockKind::PackagesGrid, PackagesGridBlock)
			.with(BlockKind::ImageGallery, ImageGalleryBlock)
			.with(BlockKind::WhatsAppCta, WhatsAppCtaBlock)
			.with(BlockKind::Faq, FaqBlock)
	}

	/// Register (or replace) the renderer for `kind`
	pub fn register(&mut self, kind: BlockKind, renderer: impl BlockRenderer + 'static) -> &mut Self {
		self.renderers.insert(kind, Arc::new(renderer));
		self
	}

	/// Builder form of [`register`](Self::register)
	pub fn with(mut self, kind: BlockKind, renderer: impl BlockRenderer + 'static) -> Self {
		self.register(kind, renderer);
		self
	}

	/// Remove the renderer for `kind`; the kind stays approved
	pub fn unregister(&mut self, kind: BlockKind) -> &mut Self {
		self.renderers.remove(&kind);
		self
	}

	pub fn has_renderer(&self, kind: BlockKind) -> bool {
		self.renderers.contains_key(&kind)
	}

	/// Render one block, degrading to a fallback node on any failure
	pub async fn render_block(&self, source: &BlockSource, ctx: &RenderContext<'_>) -> RenderNode {
		let raw = source.to_value();
		let block = match Block::validate_at(&raw, &FieldPath::root()) {
			Ok(block) => block,
			Err(err) => {
				let cause = UnapprovedBlockError::Malformed(err.with_raw(raw)).into();
				return boundary::fallback_node(source.declared_name(), cause, ctx.mode);
			}
		};
		let name = block.component.name.as_str();

		let Some(kind) = BlockKind::from_name(name) else {
			let cause = UnapprovedBlockError::NotApproved(name.to_string()).into();
			return boundary::fallback_node(Some(name), cause, ctx.mode);
		};

		let Some(renderer) = self.renderers.get(&kind) else {
			let cause = FallbackCause::MissingRenderer(name.to_string());
			return boundary::fallback_node(Some(name), cause, ctx.mode);
		};

		let outcome = boundary::isolate(renderer.render(&block.component.options, ctx)).await;
		match outcome {
			Ok(Some(view)) => {
				tracing::debug!(block = name, "block rendered");
				RenderNode {
					block: Some(name.to_string()),
					status: NodeStatus::Rendered,
					view,
				}
			}
			Ok(None) => boundary::fallback_node(Some(name), RenderError::NoOutput.into(), ctx.mode),
			Err(err) => boundary::fallback_node(Some(name), err.into(), ctx.mode),
		}
	}

	/// Render every block, in input order
	///
	/// Blocks render concurrently, so blocks that fetch the same data share
	/// one request through the context's package source.
	pub async fn render_blocks(
		&self,
		blocks: Option<&[BlockSource]>,
		ctx: &RenderContext<'_>,
	) -> Vec<RenderNode> {
		let Some(blocks) = blocks else {
			return Vec::new();
		};
		futures::future::join_all(blocks.iter().map(|block| self.render_block(block, ctx))).await
	}
}

#[cfg(test)]
pub(crate) mod testing {
	use super::*;
	use crate::error::ContentError;
	use crate::model::PackageData;
	use std::sync::Mutex;
	use std::sync::atomic::{AtomicUsize, Ordering};

	/// Package source returning a fixed outcome and counting calls
	pub(crate) struct StubPackages {
		outcome: ContentResult<PackageList>,
		calls: AtomicUsize,
		last_filters: Mutex<Option<PackageFilters>>,
	}

	impl StubPackages {
		pub(crate) fn ok(packages: Vec<PackageData>) -> Self {
			Self::with(Ok(PackageList {
				packages,
				rejected: 0,
			}))
		}

		pub(crate) fn failing(error: ContentError) -> Self {
			Self::with(Err(error))
		}

		fn with(outcome: ContentResult<PackageList>) -> Self {
			Self {
				outcome,
				calls: AtomicUsize::new(0),
				last_filters: Mutex::new(None),
			}
		}

		pub(crate) fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}

		pub(crate) fn last_filters(&self) -> Option<PackageFilters> {
			self.last_filters.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl PackageSource for StubPackages {
		async fn fetch_packages(&self, filters: &PackageFilters) -> ContentResult<PackageList> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			*self.last_filters.lock().unwrap() = Some(filters.clone());
			self.outcome.clone()
		}
	}

	pub(crate) fn package(slug: &str, price: f64) -> PackageData {
		PackageData {
			title: format!("Trip to {slug}"),
			slug: slug.to_string(),
			price,
			currency: "USD".to_string(),
			excerpt: Some(format!("All about {slug}")),
			featured: false,
			tags: vec![],
			images: vec![],
			body: None,
		}
	}

	pub(crate) fn options(value: Value) -> Map<String, Value> {
		match value {
			Value::Object(map) => map,
			_ => Map::new(),
		}
	}

	pub(crate) fn dev_ctx(packages: &dyn PackageSource) -> RenderContext<'_> {
		RenderContext::new(RenderMode::Development, packages)
	}
}
