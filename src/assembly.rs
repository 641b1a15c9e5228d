//! Page assembly
//!
//! Turns the outcome of fetching a top-level entity into a [`PageResponse`].
//! A failure on the entity itself makes the whole page [`PageStatus::NotFound`];
//! failures inside its blocks only degrade those blocks.

use std::sync::Arc;
use wayfare_cms::blocks::{BlockRegistry, RenderContext, RenderMode};
use wayfare_cms::boundary::RenderNode;
use wayfare_cms::error::{ContentError, FetchError};
use wayfare_cms::image;
use wayfare_cms::model::{ContentEntry, PackageData, PageData};
use wayfare_conf::Settings;
use wayfare_content::{ContentFetcher, RequestScope};
use wayfare_pages::{IntoView, View};

/// Title used for pages that could not be produced
pub const NOT_FOUND_TITLE: &str = "Page not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
	Ok,
	NotFound,
}

impl PageStatus {
	/// HTTP status code to answer with
	pub fn http_status(self) -> u16 {
		match self {
			Self::Ok => 200,
			Self::NotFound => 404,
		}
	}
}

/// A fully assembled page
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
	pub status: PageStatus,
	pub title: String,
	pub description: Option<String>,
	/// Rendered blocks in source order
	pub nodes: Vec<RenderNode>,
	/// The page body, including every node's view
	pub view: View,
}

impl PageResponse {
	pub fn render_to_string(&self) -> String {
		self.view.render_to_string()
	}

	/// Number of blocks that degraded to a fallback
	pub fn fallback_count(&self) -> usize {
		self.nodes.iter().filter(|node| node.is_fallback()).count()
	}
}

/// Builds package and content pages from CMS entries
#[derive(Debug, Clone)]
pub struct PageAssembler {
	fetcher: ContentFetcher,
	registry: Arc<BlockRegistry>,
	mode: RenderMode,
}

impl PageAssembler {
	pub fn new(fetcher: ContentFetcher, registry: BlockRegistry, mode: RenderMode) -> Self {
		Self {
			fetcher,
			registry: Arc::new(registry),
			mode,
		}
	}

	/// Assembler with the standard block set, rendering in production mode
	/// when the configured environment is production
	pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
		let mode = if settings.environment.is_production() {
			RenderMode::Production
		} else {
			RenderMode::Development
		};
		Ok(Self::new(
			ContentFetcher::from_settings(settings)?,
			BlockRegistry::standard(),
			mode,
		))
	}

	pub fn fetcher(&self) -> &ContentFetcher {
		&self.fetcher
	}

	pub fn mode(&self) -> RenderMode {
		self.mode
	}

	/// Detail page for the package published under `slug`
	pub async fn package_page(&self, slug: &str) -> PageResponse {
		let scope = self.fetcher.scope();
		match scope.fetch_package_by_slug(slug).await {
			Ok(entry) => self.render_package(entry, &scope).await,
			Err(err) => self.not_found("package", slug, &err),
		}
	}

	/// CMS-authored page targeting the URL `path`
	pub async fn content_page(&self, path: &str) -> PageResponse {
		let scope = self.fetcher.scope();
		match scope.fetch_page_by_path(path).await {
			Ok(entry) => self.render_page(entry, &scope).await,
			Err(err) => self.not_found("page", path, &err),
		}
	}

	async fn render_package(
		&self,
		entry: ContentEntry<PackageData>,
		scope: &RequestScope,
	) -> PageResponse {
		let ctx = RenderContext::new(self.mode, scope);
		let package = entry.data;
		let nodes = self.registry.render_blocks(package.body.as_deref(), &ctx).await;

		let hero_image = package.images.first();
		let media = image::image_or_placeholder(
			hero_image.map(|img| img.url.clone()),
			hero_image
				.and_then(|img| img.alt.clone())
				.or_else(|| Some(package.title.clone())),
		);

		let view = View::element("article")
			.attr("class", "package")
			.child(
				View::element("header")
					.attr("class", "package__header")
					.child(media)
					.child(View::element("h1").child(package.title.clone()))
					.child(
						View::element("p")
							.attr("class", "package__price")
							.child(package.display_price()),
					),
			)
			.child(
				package
					.excerpt
					.clone()
					.map(|excerpt| View::element("p").attr("class", "package__excerpt").child(excerpt)),
			)
			.children(nodes.iter().map(|node| node.view.clone()))
			.into_view();

		tracing::info!(slug = %package.slug, blocks = nodes.len(), "assembled package page");
		PageResponse {
			status: PageStatus::Ok,
			title: package.title,
			description: package.excerpt,
			nodes,
			view,
		}
	}

	async fn render_page(&self, entry: ContentEntry<PageData>, scope: &RequestScope) -> PageResponse {
		let ctx = RenderContext::new(self.mode, scope);
		let page = entry.data;
		let nodes = self.registry.render_blocks(page.blocks_to_render(), &ctx).await;

		let title = page
			.display_title()
			.map(str::to_string)
			.unwrap_or_else(|| entry.name.clone());
		let description = page.metadata.as_ref().and_then(|meta| meta.description.clone());

		let view = View::element("main")
			.attr("class", "page")
			.children(nodes.iter().map(|node| node.view.clone()))
			.into_view();

		tracing::info!(page = %entry.name, blocks = nodes.len(), "assembled content page");
		PageResponse {
			status: PageStatus::Ok,
			title,
			description,
			nodes,
			view,
		}
	}

	fn not_found(&self, kind: &str, key: &str, err: &ContentError) -> PageResponse {
		tracing::warn!(kind, key, error = %err, "top-level content unavailable");

		let diagnostic = self.mode.shows_diagnostics().then(|| {
			View::element("details")
				.attr("class", "page-diagnostic")
				.child(View::element("summary").child(format!("Could not load {} '{}'", kind, key)))
				.child(View::element("pre").child(err.to_string()))
		});

		let view = View::element("main")
			.attr("class", "page page--not-found")
			.child(View::element("h1").child(NOT_FOUND_TITLE))
			.child(diagnostic)
			.into_view();

		PageResponse {
			status: PageStatus::NotFound,
			title: NOT_FOUND_TITLE.to_string(),
			description: None,
			nodes: Vec::new(),
			view,
		}
	}
}
