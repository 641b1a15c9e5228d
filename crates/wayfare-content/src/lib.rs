//! # Wayfare Content
//!
//! Fetches CMS content over HTTP, caches it per content class and validates
//! it on the way out.
//!
//! - [`CmsClient`]: one GET per [`Query`], API key attached at send time
//! - [`ContentFetcher`]: stale-while-revalidate cache in front of the
//!   client, with per-class TTLs and tag invalidation
//! - [`RequestScope`]: de-duplicates identical requests made while
//!   rendering one page; implements [`PackageSource`] for block renderers
//!
//! ```no_run
//! use wayfare_cms::model::PackageFilters;
//! use wayfare_conf::SettingsBuilder;
//! use wayfare_content::ContentFetcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SettingsBuilder::standard(None).build()?;
//! let fetcher = ContentFetcher::from_settings(&settings)?;
//!
//! let scope = fetcher.scope();
//! let list = scope.fetch_packages(&PackageFilters::default().with_tag("beach")).await?;
//! println!("{} packages, {} rejected", list.packages.len(), list.rejected);
//! # Ok(())
//! # }
//! ```
//!
//! [`PackageSource`]: wayfare_cms::blocks::PackageSource

pub mod client;
pub mod fetcher;
pub mod policy;
pub mod query;

pub use client::{ClientConfig, CmsClient};
pub use fetcher::{ContentFetcher, ContentModels, RequestScope};
pub use policy::{CachePolicies, ContentClass, UnknownContentClass};
pub use query::Query;
