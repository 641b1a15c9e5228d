//! End-to-end page assembly against a mock CMS

use rstest::rstest;
use serde_json::{Value, json};
use wayfare::cms::blocks::{BlockRegistry, RenderMode};
use wayfare::cms::boundary::UNAVAILABLE_MESSAGE;
use wayfare::content::{CachePolicies, ClientConfig, CmsClient, ContentFetcher, ContentModels};
use wayfare::{NOT_FOUND_TITLE, PageAssembler, PageStatus};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PACKAGES_PATH: &str = "/api/v3/content/travel-package";
const PAGE_PATH: &str = "/api/v3/content/page";

fn assembler(server: &MockServer, mode: RenderMode) -> PageAssembler {
	let config = ClientConfig::new(format!("{}/api/v3", server.uri())).with_api_key("test-key");
	let fetcher = ContentFetcher::new(
		CmsClient::new(config).unwrap(),
		CachePolicies::default(),
		ContentModels::default(),
	);
	PageAssembler::new(fetcher, BlockRegistry::standard(), mode)
}

fn element(name: &str, options: Value) -> Value {
	json!({
		"@type": "@builder.io/sdk:Element",
		"component": { "name": name, "options": options }
	})
}

fn package(slug: &str, tags: &[&str]) -> Value {
	json!({
		"id": slug,
		"name": slug,
		"data": {
			"title": format!("Trip to {}", slug),
			"slug": slug,
			"price": 1450,
			"currency": "EUR",
			"excerpt": "Seven nights",
			"tags": tags,
			"images": [{ "src": "https://img.example/cover.jpg", "alt": "Beach at dusk" }]
		}
	})
}

#[rstest]
#[tokio::test]
async fn test_content_page_renders_blocks_and_shares_package_fetch() {
	// Arrange
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(PAGE_PATH))
		.and(query_param("url", "/deals"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"data": [{
				"id": "deals",
				"name": "Deals",
				"data": {
					"title": "Deals",
					"metadata": { "title": "Summer deals", "description": "Cheap trips" },
					"blocks": [
						element("Hero", json!({ "title": "Summer deals" })),
						element("PackagesGrid", json!({ "tag": "beach", "limit": 3 })),
						element("CustomWidget", json!({})),
						element("PackagesGrid", json!({ "tag": "beach", "limit": 3 })),
					]
				}
			}]
		})))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(PACKAGES_PATH))
		.and(query_param("query.data.tags", "beach"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"results": [package("bali", &["beach"]), package("krabi", &["beach"])]
		})))
		.expect(1)
		.mount(&server)
		.await;
	let assembler = assembler(&server, RenderMode::Production);

	// Act
	let page = assembler.content_page("deals").await;

	// Assert
	assert_eq!(page.status, PageStatus::Ok);
	assert_eq!(page.title, "Summer deals");
	assert_eq!(page.description.as_deref(), Some("Cheap trips"));
	assert_eq!(page.nodes.len(), 4);
	assert_eq!(page.fallback_count(), 1);
	let html = page.render_to_string();
	assert_eq!(html.matches("href=\"/packages/bali\"").count(), 2);
	assert!(html.contains(UNAVAILABLE_MESSAGE));
	assert!(!html.contains("CustomWidget"));
}

#[rstest]
#[tokio::test]
async fn test_package_page_shows_cover_and_price() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(PACKAGES_PATH))
		.and(query_param("query.data.slug", "bali"))
		.respond_with(
			ResponseTemplate::new(200).set_body_json(json!({ "results": [package("bali", &[])] })),
		)
		.mount(&server)
		.await;

	let page = assembler(&server, RenderMode::Production).package_page("bali").await;

	assert_eq!(page.status, PageStatus::Ok);
	assert_eq!(page.title, "Trip to bali");
	let html = page.render_to_string();
	assert!(html.contains("src=\"https://img.example/cover.jpg\""));
	assert!(html.contains("alt=\"Beach at dusk\""));
	assert!(html.contains("EUR 1450"));
}

#[rstest]
#[tokio::test]
async fn test_invalid_package_is_not_found_with_dev_diagnostic() {
	// Arrange
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(PACKAGES_PATH))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"results": [{ "id": "1", "name": "bali", "data": { "title": "Bali", "slug": "bali" } }]
		})))
		.mount(&server)
		.await;

	// Act
	let dev = assembler(&server, RenderMode::Development).package_page("bali").await;
	let prod = assembler(&server, RenderMode::Production).package_page("bali").await;

	// Assert
	assert_eq!(dev.status, PageStatus::NotFound);
	assert_eq!(dev.status.http_status(), 404);
	assert_eq!(dev.title, NOT_FOUND_TITLE);
	assert!(dev.render_to_string().contains("data.price: missing required field"));
	assert_eq!(prod.status, PageStatus::NotFound);
	assert!(!prod.render_to_string().contains("data.price"));
}

#[rstest]
#[tokio::test]
async fn test_cms_outage_is_not_found() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(PAGE_PATH))
		.respond_with(ResponseTemplate::new(502))
		.mount(&server)
		.await;

	let page = assembler(&server, RenderMode::Development).content_page("/").await;

	assert_eq!(page.status, PageStatus::NotFound);
	assert!(page.nodes.is_empty());
	assert!(page.render_to_string().contains("HTTP 502"));
}

#[rstest]
#[tokio::test]
async fn test_failed_packages_grid_keeps_page_ok() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(PAGE_PATH))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"data": [{
				"id": "home",
				"name": "Home",
				"data": { "blocks": [element("PackagesGrid", json!({}))] }
			}]
		})))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(PACKAGES_PATH))
		.respond_with(ResponseTemplate::new(500))
		.mount(&server)
		.await;

	let page = assembler(&server, RenderMode::Production).content_page("/").await;

	assert_eq!(page.status, PageStatus::Ok);
	assert_eq!(page.title, "Home");
	assert!(page.render_to_string().contains("packages-grid__error"));
}

#[rstest]
#[tokio::test]
async fn test_null_block_keeps_page_ok() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(PAGE_PATH))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"data": [{
				"id": "about",
				"name": "About",
				"data": {
					"blocks": [
						element("RichText", json!({ "text": "Who we are" })),
						null,
						element("RichText", json!({ "text": "Where we go" })),
					]
				}
			}]
		})))
		.mount(&server)
		.await;

	let page = assembler(&server, RenderMode::Production).content_page("/about").await;

	assert_eq!(page.status, PageStatus::Ok);
	assert_eq!(page.nodes.len(), 3);
	assert_eq!(page.fallback_count(), 1);
	let html = page.render_to_string();
	assert!(html.contains("Who we are"));
	assert!(html.contains("Where we go"));
}
