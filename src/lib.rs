//! # Wayfare
//!
//! CMS content validation and safe rendering for the Wayfare travel site.
//!
//! Travel packages and marketing pages arrive from a third-party CMS as
//! loosely-typed JSON. This crate ties the pipeline together:
//!
//! ```text
//! ContentFetcher → schema validation → BlockRegistry → isolation → PageAssembler
//! ```
//!
//! - [`cms`]: schema validation, image normalization, approved blocks and
//!   per-block isolation
//! - [`content`]: HTTP fetching, per-class caching, request scopes
//! - [`cache`]: cache backends, tags, stale-while-revalidate
//! - [`conf`]: layered settings
//! - [`pages`]: the `View` tree and HTML rendering
//! - [`assembly`]: top-level page outcomes
//! - [`logging`]: `tracing` subscriber setup
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use wayfare::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SettingsBuilder::standard(None).build()?;
//! wayfare::logging::init(&settings.logging)?;
//!
//! let assembler = PageAssembler::from_settings(&settings)?;
//! let page = assembler.package_page("bali-getaway").await;
//! println!("{} {}", page.status.http_status(), page.render_to_string());
//! # Ok(())
//! # }
//! ```

pub mod assembly;
pub mod logging;

pub use wayfare_cache as cache;
pub use wayfare_cms as cms;
pub use wayfare_conf as conf;
pub use wayfare_content as content;
pub use wayfare_pages as pages;

pub use assembly::{NOT_FOUND_TITLE, PageAssembler, PageResponse, PageStatus};
pub use logging::LoggingError;

pub mod prelude {
	//! Convenient re-exports of commonly used items

	pub use crate::assembly::{PageAssembler, PageResponse, PageStatus};
	pub use wayfare_cms::prelude::*;
	pub use wayfare_conf::{Settings, SettingsBuilder};
	pub use wayfare_content::{ContentClass, ContentFetcher, RequestScope};
	pub use wayfare_pages::{IntoView, View};
}
