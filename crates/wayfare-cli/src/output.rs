//! Printable forms of command results

use serde_json::{Value, json};
use wayfare::cms::error::FallbackCause;
use wayfare::cms::model::PackageList;
use wayfare::{PageResponse, PageStatus};

/// Page summary with per-block outcomes and the rendered HTML
pub fn page_json(page: &PageResponse) -> Value {
	let blocks: Vec<Value> = page
		.nodes
		.iter()
		.map(|node| {
			json!({
				"block": node.block,
				"status": if node.is_fallback() { "fallback" } else { "rendered" },
				"cause": node.cause().map(FallbackCause::kind),
			})
		})
		.collect();

	json!({
		"status": page.status.http_status(),
		"found": page.status == PageStatus::Ok,
		"title": page.title,
		"description": page.description,
		"fallbacks": page.fallback_count(),
		"blocks": blocks,
		"html": page.render_to_string(),
	})
}

/// One tab-separated line per package, then a count line
pub fn package_list_text(list: &PackageList) -> String {
	let mut out = String::new();
	for package in &list.packages {
		out.push_str(&format!(
			"{}\t{}\t{}\n",
			package.slug,
			package.display_price(),
			package.title
		));
	}
	out.push_str(&format!(
		"{} packages ({} rejected)\n",
		list.packages.len(),
		list.rejected
	));
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use wayfare::cms::model::PackageData;
	use wayfare::cms::schema::validate_as;
	use wayfare::pages::View;

	#[rstest]
	fn test_package_list_text() {
		let package: PackageData =
			validate_as(&json!({ "title": "Bali", "slug": "bali", "price": 99.5, "currency": "EUR" }))
				.unwrap();
		let list = PackageList {
			packages: vec![package],
			rejected: 2,
		};

		assert_eq!(
			package_list_text(&list),
			"bali\tEUR 99.50\tBali\n1 packages (2 rejected)\n"
		);
	}

	#[rstest]
	fn test_not_found_page_json() {
		let page = PageResponse {
			status: PageStatus::NotFound,
			title: "Page not found".to_string(),
			description: None,
			nodes: Vec::new(),
			view: View::empty(),
		};

		let value = page_json(&page);

		assert_eq!(value["status"], 404);
		assert_eq!(value["found"], false);
		assert_eq!(value["blocks"], json!([]));
		assert_eq!(value["html"], "");
	}
}
