//! Normalized quality score for a recorded brew evaluation.

use serde_json::{Map, Value};

/// Category weight of `liking` (0-10 scale).
pub const LIKING_WEIGHT: f64 = 0.6;
/// Category weight of the JAG block (1-5 scale), independent of how many JAG keys are present.
pub const JAG_WEIGHT: f64 = 0.4;
pub const JAG_KEYS: [&str; 5] =
	["flavour_intensity", "acidity", "mouthfeel", "sweetness", "purchase_intent"];

/// Scores an evaluation block in `[0, 1]`.
///
/// Absent evaluations score `0.0`. Each category that yields a usable value contributes with its
/// weight, and the result is divided by the weights actually used, so a record with only `liking`
/// scores its normalized liking. Values that do not parse as numbers are skipped.
pub fn score(evaluation: Option<&Value>) -> f64 {
	let Some(Value::Object(evaluation)) = evaluation else { return 0.0 };
	let mut parts = Vec::with_capacity(2);

	if let Some(liking) = evaluation.get("liking").and_then(parse_number) {
		parts.push(((liking / 10.0).clamp(0.0, 1.0), LIKING_WEIGHT));
	}
	if let Some(Value::Object(jag)) = evaluation.get("jag")
		&& let Some(mean) = jag_mean(jag)
	{
		parts.push((mean, JAG_WEIGHT));
	}

	match parts.as_slice() {
		[] => 0.0,
		[(value, _)] => *value,
		_ => {
			let weights: f64 = parts.iter().map(|(_, weight)| weight).sum();
			let total: f64 = parts.iter().map(|(value, weight)| value * weight).sum();

			(total / weights).clamp(0.0, 1.0)
		},
	}
}

fn jag_mean(jag: &Map<String, Value>) -> Option<f64> {
	let values: Vec<f64> = JAG_KEYS
		.iter()
		.filter_map(|key| jag.get(*key))
		.filter_map(parse_number)
		.map(|value| ((value - 1.0) / 4.0).clamp(0.0, 1.0))
		.collect();

	if values.is_empty() {
		return None;
	}

	Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn parse_number(value: &Value) -> Option<f64> {
	let number = match value {
		Value::Number(number) => number.as_f64()?,
		Value::String(text) => text.trim().parse::<f64>().ok()?,
		_ => return None,
	};

	number.is_finite().then_some(number)
}
