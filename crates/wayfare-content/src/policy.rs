//! Content classes and their cache policies

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use wayfare_cache::CachePolicy;
use wayfare_conf::CacheSettings;

/// Kinds of CMS content with independent freshness windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentClass {
	Page,
	PackageList,
	Package,
}

impl ContentClass {
	pub const ALL: [ContentClass; 3] = [Self::Page, Self::PackageList, Self::Package];

	pub fn name(self) -> &'static str {
		match self {
			Self::Page => "page",
			Self::PackageList => "package-list",
			Self::Package => "package",
		}
	}

	/// Cache tag shared by every entry of this class
	pub fn tag(self) -> &'static str {
		match self {
			Self::Page => "cms:page",
			Self::PackageList => "cms:package-list",
			Self::Package => "cms:package",
		}
	}
}

impl fmt::Display for ContentClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown content class '{0}' (expected page, package-list or package)")]
pub struct UnknownContentClass(pub String);

impl FromStr for ContentClass {
	type Err = UnknownContentClass;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|class| class.name() == s)
			.ok_or_else(|| UnknownContentClass(s.to_string()))
	}
}

/// One [`CachePolicy`] per [`ContentClass`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicies {
	page: CachePolicy,
	package_list: CachePolicy,
	package: CachePolicy,
}

impl CachePolicies {
	pub fn from_settings(settings: &CacheSettings) -> Self {
		let policy = |class: ContentClass, ttl| {
			let policy = CachePolicy::new(class.tag(), ttl);
			match settings.max_stale() {
				Some(max_stale) => policy.with_max_stale(max_stale),
				None => policy,
			}
		};

		Self {
			page: policy(ContentClass::Page, settings.page_ttl()),
			package_list: policy(ContentClass::PackageList, settings.package_list_ttl()),
			package: policy(ContentClass::Package, settings.package_ttl()),
		}
	}

	pub fn policy(&self, class: ContentClass) -> &CachePolicy {
		match class {
			ContentClass::Page => &self.page,
			ContentClass::PackageList => &self.package_list,
			ContentClass::Package => &self.package,
		}
	}
}

impl Default for CachePolicies {
	fn default() -> Self {
		Self::from_settings(&CacheSettings::default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::time::Duration;

	#[rstest]
	#[case("page", ContentClass::Page)]
	#[case("package-list", ContentClass::PackageList)]
	#[case("package", ContentClass::Package)]
	fn test_parse_class(#[case] input: &str, #[case] expected: ContentClass) {
		assert_eq!(input.parse::<ContentClass>(), Ok(expected));
		assert_eq!(expected.to_string(), input);
	}

	#[rstest]
	fn test_parse_unknown_class() {
		let err = "packages".parse::<ContentClass>().unwrap_err();

		assert_eq!(err, UnknownContentClass("packages".to_string()));
	}

	#[rstest]
	fn test_default_policies_follow_settings_defaults() {
		let policies = CachePolicies::default();

		assert_eq!(policies.policy(ContentClass::Page).ttl, Duration::from_secs(3600));
		assert_eq!(
			policies.policy(ContentClass::PackageList).ttl,
			Duration::from_secs(300)
		);
		assert_eq!(policies.policy(ContentClass::Package).tag, "cms:package");
	}

	#[rstest]
	fn test_tags_are_distinct() {
		let tags: std::collections::HashSet<_> =
			ContentClass::ALL.iter().map(|class| class.tag()).collect();

		assert_eq!(tags.len(), ContentClass::ALL.len());
	}
}
