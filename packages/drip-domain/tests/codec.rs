use serde_json::{Value, json};

use drip_domain::{
	FlatMap, Scalar,
	codec::{self, LIST_PREFIXES},
	input, record_id,
};

fn sample_record() -> Value {
	json!({
		"bean": {
			"name": "Ethiopia Guji",
			"process": "Washed",
			"variety": "Heirloom",
			"region": "Guji",
			"roast_level": "Light",
			"roasted_days": 9,
			"altitude": "2100m",
			"flavor_notes": ["jasmine", "peach", "black tea"]
		},
		"brewing": {
			"brewer": "V60",
			"temperature": 93,
			"grind": { "setting": 22, "grinder": "C40" },
			"pours": [
				{ "start": 0, "end": 30, "water_added": 60 },
				{ "start": 30, "end": 60, "water_added": 140 }
			]
		},
		"evaluation": {
			"liking": 8,
			"jag": { "acidity": 4, "sweetness": 3 }
		}
	})
}

#[test]
fn flatten_spreads_nested_objects_and_lists() {
	let flat = codec::flatten(&sample_record());

	assert_eq!(flat.get("bean.name"), Some(&Scalar::from("Ethiopia Guji")));
	assert_eq!(flat.get("bean.flavor_notes"), Some(&Scalar::from("jasmine, peach, black tea")));
	assert_eq!(flat.get("brewing.grind.setting"), Some(&Scalar::from(22_i64)));
	assert_eq!(flat.get("brewing.pours.1.water_added"), Some(&Scalar::from(140_i64)));
	assert_eq!(flat.get("evaluation.jag.acidity"), Some(&Scalar::from(4_i64)));
	assert!(!flat.contains_key("brewing.pours"));
}

#[test]
fn flatten_keeps_null_and_collapses_mixed_lists() {
	let flat = codec::flatten(&json!({
		"evaluation": null,
		"scores": [1, 2, 3],
		"empty": [],
		"mixed": [{ "a": 1 }, 2],
		"nested": [[1, 2], [3]]
	}));

	assert_eq!(flat.get("evaluation"), Some(&Scalar::Null));
	assert_eq!(flat.get("scores"), Some(&Scalar::from("1, 2, 3")));
	assert_eq!(flat.get("empty"), Some(&Scalar::from("")));
	assert_eq!(flat.get("mixed"), Some(&Scalar::from(r#"[{"a":1},2]"#)));
	assert_eq!(flat.get("nested"), Some(&Scalar::from("[[1,2],[3]]")));
}

#[test]
fn flatten_of_already_flat_map_is_identity() {
	let flat = codec::flatten(&json!({ "bean.name": "Kenya AA", "evaluation.liking": 7 }));

	assert_eq!(flat.len(), 2);
	assert_eq!(flat.get("bean.name"), Some(&Scalar::from("Kenya AA")));
}

#[test]
fn flatten_accepts_non_object_roots() {
	let flat = codec::flatten(&json!("just text"));

	assert_eq!(flat.get(""), Some(&Scalar::from("just text")));
}

#[test]
fn pours_reconstruct_in_index_order() {
	let flat: FlatMap = serde_json::from_value(json!({
		"brewing.pours.0.start": 0,
		"brewing.pours.0.end": 30,
		"brewing.pours.0.water_added": 60,
		"brewing.pours.1.start": 30,
		"brewing.pours.1.end": 60,
		"brewing.pours.1.water_added": 140
	}))
	.expect("Failed to build flat map.");
	let pours = codec::reconstruct_list(&flat, "brewing.pours");

	assert_eq!(
		Value::Array(pours.into_iter().map(Value::Object).collect()),
		json!([
			{ "start": 0, "end": 30, "water_added": 60 },
			{ "start": 30, "end": 60, "water_added": 140 }
		])
	);
}

#[test]
fn list_indices_sort_numerically() {
	let mut flat = FlatMap::new();

	for index in [10_i64, 2, 9, 0, 1] {
		flat.insert(format!("brewing.pours.{index}.start"), Scalar::from(index));
	}

	let starts: Vec<Value> = codec::reconstruct_list(&flat, "brewing.pours")
		.into_iter()
		.filter_map(|pour| pour.get("start").cloned())
		.collect();

	assert_eq!(starts, vec![json!(0), json!(1), json!(2), json!(9), json!(10)]);
}

#[test]
fn missing_sub_fields_are_absent_not_errors() {
	let mut flat = FlatMap::new();

	flat.insert("brewing.pours.0.start".to_string(), Scalar::from(0_i64));
	flat.insert("brewing.pours.2.end".to_string(), Scalar::from(90_i64));

	let pours = codec::reconstruct_list(&flat, "brewing.pours");

	assert_eq!(pours.len(), 2);
	assert_eq!(Value::Object(pours[0].clone()), json!({ "start": 0 }));
	assert_eq!(Value::Object(pours[1].clone()), json!({ "end": 90 }));
	assert!(codec::reconstruct_list(&FlatMap::new(), "brewing.pours").is_empty());
}

#[test]
fn sections_round_trip_through_flatten() {
	let record = sample_record();
	let flat = codec::flatten(&record);

	for section in ["brewing", "evaluation"] {
		let rebuilt = codec::reconstruct_section(&flat, section, &LIST_PREFIXES)
			.unwrap_or_else(|| panic!("Expected section {section}."));

		assert_eq!(Some(&rebuilt), record.get(section), "Section {section} did not round trip.");
	}
}

#[test]
fn absent_section_reconstructs_to_none() {
	let flat = codec::flatten(&json!({ "bean": { "name": "Kenya AA" }, "evaluation": null }));

	assert_eq!(codec::reconstruct_section(&flat, "brewing", &LIST_PREFIXES), None);
	assert_eq!(codec::reconstruct_section(&flat, "evaluation", &LIST_PREFIXES), None);
}

#[test]
fn pours_summary_is_not_mistaken_for_a_pour() {
	let mut flat = codec::flatten(&sample_record());
	let summary = codec::pours_summary(&flat).expect("Expected pours summary.");

	assert_eq!(summary, "0-30:60; 30-60:140");

	flat.insert("brewing.pours_str".to_string(), Scalar::from(summary.clone()));

	let brewing = codec::reconstruct_section(&flat, "brewing", &LIST_PREFIXES)
		.expect("Expected brewing section.");

	assert_eq!(brewing["pours"].as_array().map(Vec::len), Some(2));
	assert_eq!(brewing["pours_str"], json!(summary));
}

#[test]
fn bean_text_follows_fixed_column_order() {
	let text = codec::bean_query_text(&sample_record());

	assert_eq!(
		text,
		"bean.name: Ethiopia Guji | bean.process: Washed | bean.variety: Heirloom | \
		 bean.region: Guji | bean.roast_level: Light | bean.roasted_days: 9 | \
		 bean.altitude: 2100m | bean.flavor_notes: jasmine, peach, black tea"
	);
}

#[test]
fn bean_text_skips_null_and_blank_fields() {
	let text = codec::bean_query_text(&json!({
		"bean": { "roast_level": "Medium", "name": "Colombia", "process": null, "region": "" }
	}));

	assert_eq!(text, "bean.name: Colombia | bean.roast_level: Medium");
}

#[test]
fn bean_text_accepts_dotted_keys() {
	let text = codec::bean_query_text(&json!({
		"bean.name": "Kenya AA",
		"bean.flavor_notes": ["citrus", "berry", "chocolate"]
	}));

	assert_eq!(text, "bean.name: Kenya AA | bean.flavor_notes: citrus, berry, chocolate");
}

#[test]
fn bean_text_is_empty_without_bean() {
	assert_eq!(codec::bean_query_text(&json!({})), "");
	assert_eq!(codec::bean_query_text(&json!({ "brewing": { "brewer": "V60" } })), "");
}

#[test]
fn fallback_text_renders_unknown_bean_fields() {
	let record = json!({ "bean": { "origin": { "country": "Kenya" }, "farm": "Gatomboya" } });

	assert_eq!(codec::bean_query_text(&record), "");
	assert_eq!(
		codec::bean_fallback_text(&record),
		"bean.farm: Gatomboya | bean.origin.country: Kenya"
	);
}

#[test]
fn record_id_prefers_explicit_seed() {
	let flat = codec::flatten(&json!({ "id": "brew-42", "bean": { "name": "Kenya AA" } }));

	assert_eq!(record_id::derive(&flat, "anything"), "brew-42");

	let flat = codec::flatten(&json!({ "uuid": 7, "bean": { "name": "Kenya AA" } }));

	assert_eq!(record_id::derive(&flat, "anything"), "7");
}

#[test]
fn record_id_is_stable_for_same_text() {
	let record = json!({ "bean": { "name": "Kenya AA", "process": "Washed" } });
	let flat = codec::flatten(&record);
	let text = codec::bean_query_text(&record);
	let first = record_id::derive(&flat, &text);
	let second = record_id::derive(&flat, &text);
	let other = record_id::derive(&flat, "bean.name: Kenya AA | bean.process: Natural");

	assert_eq!(first, second);
	assert_ne!(first, other);
	assert!(first.starts_with("Kenya AA-"));
	assert_eq!(first.len(), "Kenya AA-".len() + 12);
}

#[test]
fn record_id_without_seed_uses_row_prefix() {
	let flat = codec::flatten(&json!({ "bean": { "process": "Natural" } }));

	assert!(record_id::derive(&flat, "bean.process: Natural").starts_with("row-"));
}

#[test]
fn parse_records_accepts_all_supported_layouts() {
	let expected = vec![json!({ "id": 1 }), json!({ "id": 2 })];
	let as_array = r#"[{"id": 1}, {"id": 2}]"#;
	let as_lines = "{\"id\": 1}\n\n{\"id\": 2}\n";
	let as_pretty = "{\n  \"id\": 1\n}\n{\n  \"id\": 2\n}";

	for raw in [as_array, as_lines, as_pretty] {
		assert_eq!(input::parse_records(raw).expect("Failed to parse records."), expected);
	}

	assert!(input::parse_records("   ").expect("Blank input is valid.").is_empty());
}

#[test]
fn parse_records_reports_position_of_bad_json() {
	let err = input::parse_records("{\"id\": 1}\n{\"id\": }").expect_err("Expected parse error.");

	assert!(err.to_string().contains("line 2"), "Unexpected error: {err}");
}
