//! Property-based tests for schema validation

use proptest::prelude::*;
use serde_json::{Value, json};
use wayfare_cms::model::PackageData;
use wayfare_cms::schema::{SchemaKind, validate, validate_as};

fn arb_json() -> impl Strategy<Value = Value> {
	let leaf = prop_oneof![
		Just(Value::Null),
		any::<bool>().prop_map(Value::Bool),
		any::<i64>().prop_map(|n| json!(n)),
		"[a-z:/. ]{0,20}".prop_map(Value::String),
	];
	leaf.prop_recursive(3, 32, 4, |inner| {
		prop_oneof![
			prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
			prop::collection::hash_map("(title|slug|price|images|tags|data|id|name|[a-z]{1,5})", inner, 0..6)
				.prop_map(|map| Value::Object(map.into_iter().collect())),
		]
	})
}

proptest! {
	#[test]
	fn prop_validation_is_total_and_keeps_raw(raw in arb_json()) {
		// Act
		let outcome = validate(SchemaKind::Package, &raw);

		// Assert
		if let Err(err) = outcome {
			prop_assert_eq!(err.raw.as_deref(), Some(&raw));
			prop_assert!(!err.message.is_empty());
		}
	}

	#[test]
	fn prop_valid_minimal_packages_accepted(
		title in "[A-Za-z][A-Za-z ]{0,30}",
		slug in "[a-z][a-z0-9-]{0,30}",
		price in 0.0f64..100_000.0,
	) {
		let raw = json!({ "title": title.clone(), "slug": slug.clone(), "price": price });

		let package: PackageData = validate_as(&raw).unwrap();

		prop_assert_eq!(package.title, title);
		prop_assert_eq!(package.slug, slug);
		prop_assert_eq!(package.currency, "USD");
	}

	#[test]
	fn prop_negative_prices_rejected(price in -100_000.0f64..-0.001) {
		let raw = json!({ "title": "T", "slug": "t", "price": price });

		let err = validate_as::<PackageData>(&raw).unwrap_err();

		prop_assert_eq!(err.path.as_str(), "price");
	}

	#[test]
	fn prop_error_is_deterministic(raw in arb_json()) {
		let first = validate_as::<PackageData>(&raw).err().map(|e| e.to_string());
		let second = validate_as::<PackageData>(&raw).err().map(|e| e.to_string());

		prop_assert_eq!(first, second);
	}
}
