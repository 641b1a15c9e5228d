//! # Wayfare CMS
//!
//! Validation and safe rendering of externally-authored CMS content.
//!
//! ## Architecture
//!
//! ```text
//! wayfare-cms
//! ├── schema    - raw JSON → strict typed content, or a path-bearing error
//! ├── image     - image URL normalization and placeholders
//! ├── blocks    - approved block set, registry and renderers
//! └── boundary  - per-block isolation and fallback nodes
//! ```
//!
//! Raw entries are validated with [`schema::validate_as`]. Page and package
//! bodies keep their blocks as unvalidated [`model::BlockSource`] values; the
//! [`blocks::BlockRegistry`] validates and allow-lists each block separately,
//! so one bad block degrades only itself.

#![warn(rustdoc::broken_intra_doc_links)]

pub mod blocks;
pub mod boundary;
pub mod error;
pub mod image;
pub mod model;
pub mod schema;

pub mod prelude {
	//! Convenient re-exports of commonly used items

	pub use crate::blocks::{
		BlockKind, BlockRegistry, BlockRenderer, EmptyPackageSource, PackageSource, RenderContext,
		RenderMode,
	};
	pub use crate::boundary::{NodeStatus, RenderNode};
	pub use crate::error::{
		ContentError, ContentResult, FallbackCause, FetchError, RenderError,
		UnapprovedBlockError, ValidationError, ValidationResult,
	};
	pub use crate::model::{
		Block, BlockSource, ContentEntry, Image, PackageData, PackageFilters, PackageList,
		PageData, PageMetadata,
	};
	pub use crate::schema::{Schema, SchemaKind, Validated, validate, validate_as};
}
