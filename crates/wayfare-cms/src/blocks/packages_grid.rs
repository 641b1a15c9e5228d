use super::{BlockRenderer, RenderContext, options_reader};
use crate::error::{RenderError, ValidationError, ValidationResult};
use crate::image;
use crate::model::{PackageData, PackageFilters};
use async_trait::async_trait;
use serde_json::{Map, Value};
use wayfare_pages::{IntoView, View};

/// Cards shown when `limit` is not given
pub const DEFAULT_LIMIT: u32 = 6;
/// Largest accepted `limit`
pub const MAX_LIMIT: u32 = 24;

/// Grid of package cards fetched through the render context
///
/// Invalid options fail closed to the empty state; a failed fetch renders an
/// error card. Neither degrades the block to the fallback node.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackagesGridBlock;

#[derive(Debug, Clone, PartialEq)]
struct GridOptions {
	title: Option<String>,
	filters: PackageFilters,
}

fn parse_options(options: &Map<String, Value>) -> ValidationResult<GridOptions> {
	let opts = options_reader(options);
	let limit = opts.optional_u32("limit")?.unwrap_or(DEFAULT_LIMIT);
	if !(1..=MAX_LIMIT).contains(&limit) {
		return Err(ValidationError::new(
			opts.path("limit"),
			format!("must be between 1 and {MAX_LIMIT}"),
		));
	}

	let mut filters = PackageFilters::new().with_limit(limit);
	filters.tag = opts.optional_str("tag")?.filter(|tag| !tag.trim().is_empty());
	filters.featured = opts.optional_bool("featured")?;

	Ok(GridOptions {
		title: opts.optional_str("title")?,
		filters,
	})
}

fn card(package: &PackageData) -> View {
	let media = image::image_or_placeholder(
		package.images.first().map(|img| img.url.clone()),
		package
			.images
			.first()
			.and_then(|img| img.alt.clone())
			.or_else(|| Some(package.title.clone())),
	);

	View::element("article")
		.attr("class", "package-card")
		.child(
			View::element("a")
				.attr("href", package.href())
				.child(media)
				.child(View::element("h3").child(package.title.clone()))
				.child(
					package
						.excerpt
						.clone()
						.map(|excerpt| View::element("p").attr("class", "package-card__excerpt").child(excerpt)),
				)
				.child(
					View::element("p")
						.attr("class", "package-card__price")
						.child(package.display_price()),
				),
		)
		.into_view()
}

fn section(title: Option<String>, body: View) -> View {
	View::element("section")
		.attr("class", "packages-grid")
		.child(title.map(|t| View::element("h2").child(t)))
		.child(body)
		.into_view()
}

fn empty_state(title: Option<String>) -> View {
	section(
		title,
		View::element("p")
			.attr("class", "packages-grid__empty")
			.child("No packages to show right now.")
			.into_view(),
	)
}

fn error_card(title: Option<String>) -> View {
	section(
		title,
		View::element("div")
			.attr("class", "packages-grid__error")
			.attr("role", "alert")
			.child("Packages could not be loaded. Please try again later.")
			.into_view(),
	)
}

#[async_trait]
impl BlockRenderer for PackagesGridBlock {
	async fn render(
		&self,
		options: &Map<String, Value>,
		ctx: &RenderContext<'_>,
	) -> Result<Option<View>, RenderError> {
		let grid = match parse_options(options) {
			Ok(grid) => grid,
			Err(err) => {
				tracing::warn!(error = %err, "invalid PackagesGrid options, rendering empty state");
				return Ok(Some(empty_state(None)));
			}
		};

		let list = match ctx.packages.fetch_packages(&grid.filters).await {
			Ok(list) => list,
			Err(err) => {
				tracing::error!(error = %err, "PackagesGrid could not fetch packages");
				return Ok(Some(error_card(grid.title)));
			}
		};

		if list.packages.is_empty() {
			return Ok(Some(empty_state(grid.title)));
		}

		let limit = grid.filters.limit.unwrap_or(DEFAULT_LIMIT) as usize;
		let cards: Vec<View> = list.packages.iter().take(limit).map(card).collect();
		let body = View::element("div")
			.attr("class", "packages-grid__cards")
			.children(cards)
			.into_view();

		Ok(Some(section(grid.title, body)))
	}
}
