//! Translation between nested brewing records and the flat, scalar-only metadata that vector
//! stores can index and filter on.
//!
//! Nested objects become dotted keys, lists of scalars collapse into one `", "`-joined string,
//! and lists of objects are spread over `key.<index>.<field>` keys. A list that mixes objects with
//! other values is kept as its JSON text and cannot be rebuilt.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub type FlatMap = BTreeMap<String, Scalar>;

/// Bean columns that make up the retrieval text, in render order.
pub const BEAN_COLUMNS: [&str; 8] = [
	"bean.name",
	"bean.process",
	"bean.variety",
	"bean.region",
	"bean.roast_level",
	"bean.roasted_days",
	"bean.altitude",
	"bean.flavor_notes",
];

/// Key prefixes known to hold an indexed list of objects.
pub const LIST_PREFIXES: [&str; 1] = ["brewing.pours"];

pub const POURS_PREFIX: &str = "brewing.pours";

const TEXT_SEPARATOR: &str = " | ";
const LIST_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
	Null,
	Bool(bool),
	Number(Number),
	String(String),
}
impl Scalar {
	/// Returns `None` for arrays and objects.
	pub fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Null => Some(Self::Null),
			Value::Bool(flag) => Some(Self::Bool(*flag)),
			Value::Number(number) => Some(Self::Number(number.clone())),
			Value::String(text) => Some(Self::String(text.clone())),
			Value::Array(_) | Value::Object(_) => None,
		}
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::Null => Value::Null,
			Self::Bool(flag) => Value::Bool(*flag),
			Self::Number(number) => Value::Number(number.clone()),
			Self::String(text) => Value::String(text.clone()),
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Null and blank strings carry no information for text rendering.
	pub fn is_blank(&self) -> bool {
		match self {
			Self::Null => true,
			Self::String(text) => text.trim().is_empty(),
			Self::Bool(_) | Self::Number(_) => false,
		}
	}
}
impl fmt::Display for Scalar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("null"),
			Self::Bool(flag) => write!(f, "{flag}"),
			Self::Number(number) => write!(f, "{number}"),
			Self::String(text) => f.write_str(text),
		}
	}
}
impl From<&str> for Scalar {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}
impl From<String> for Scalar {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}
impl From<i64> for Scalar {
	fn from(value: i64) -> Self {
		Self::Number(Number::from(value))
	}
}
impl From<bool> for Scalar {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

/// Flattens any JSON value. A non-object root is stored under the empty key.
pub fn flatten(record: &Value) -> FlatMap {
	let mut out = FlatMap::new();

	match record {
		Value::Object(map) => flatten_object(map, "", &mut out),
		other => flatten_value("", other, &mut out),
	}

	out
}

/// Rebuilds the objects stored under `prefix.<index>.<field>`, ordered by numeric index.
///
/// Indices do not need to be contiguous; each distinct index yields one object holding whatever
/// fields were found for it.
pub fn reconstruct_list(flat: &FlatMap, prefix: &str) -> Vec<Map<String, Value>> {
	let mut by_index: BTreeMap<usize, Map<String, Value>> = BTreeMap::new();

	for (key, scalar) in flat {
		let Some((index, field)) = split_list_key(key, prefix) else { continue };

		insert_path(by_index.entry(index).or_default(), field, scalar.to_value());
	}

	by_index.into_values().collect()
}

/// Rebuilds the nested object stored under `section.`, turning every known list prefix inside it
/// back into an array. Returns `None` when the section has no keys.
pub fn reconstruct_section(
	flat: &FlatMap,
	section: &str,
	list_prefixes: &[&str],
) -> Option<Value> {
	let needle = format!("{section}.");
	let lists: Vec<&str> =
		list_prefixes.iter().copied().filter(|prefix| prefix.starts_with(&needle)).collect();
	let mut out = Map::new();
	let mut found = false;

	for (key, scalar) in flat {
		let Some(rest) = key.strip_prefix(&needle) else { continue };

		found = true;

		if lists.iter().any(|prefix| split_list_key(key, prefix).is_some()) {
			continue;
		}

		insert_path(&mut out, rest, scalar.to_value());
	}

	for prefix in lists {
		let items = reconstruct_list(flat, prefix);

		if items.is_empty() {
			continue;
		}

		let relative = &prefix[needle.len()..];

		let items = items.into_iter().map(Value::Object).collect();

		insert_path(&mut out, relative, Value::Array(items));
	}

	found.then_some(Value::Object(out))
}

/// Renders the bean columns of a record as `"bean.<field>: <value>"` fragments joined by `" | "`.
///
/// Accepts nested records (`{"bean": {...}}`) as well as already-dotted ones.
pub fn bean_query_text(record: &Value) -> String {
	let flat = flatten(record);

	render_pairs(BEAN_COLUMNS.iter().filter_map(|column| {
		flat.get(*column).filter(|value| !value.is_blank()).map(|value| (*column, value))
	}))
}

/// Renders every non-blank `bean.` key in key order, for beans that carry none of the known
/// columns.
pub fn bean_fallback_text(record: &Value) -> String {
	let flat = flatten(record);

	render_pairs(
		flat.iter()
			.filter(|(key, value)| key.starts_with("bean.") && !value.is_blank())
			.map(|(key, value)| (key.as_str(), value)),
	)
}

/// Human-readable pour schedule, e.g. `"0-30:60; 30-60:140"`.
pub fn pours_summary(flat: &FlatMap) -> Option<String> {
	let pours = reconstruct_list(flat, POURS_PREFIX);

	if pours.is_empty() {
		return None;
	}

	let field = |pour: &Map<String, Value>, name: &str| match pour.get(name) {
		Some(Value::String(text)) => text.clone(),
		Some(Value::Null) | None => String::new(),
		Some(other) => other.to_string(),
	};
	let parts: Vec<String> = pours
		.iter()
		.map(|pour| {
			format!(
				"{}-{}:{}",
				field(pour, "start"),
				field(pour, "end"),
				field(pour, "water_added")
			)
		})
		.collect();

	Some(parts.join("; "))
}

fn flatten_object(map: &Map<String, Value>, parent: &str, out: &mut FlatMap) {
	for (key, value) in map {
		flatten_value(&join_path(parent, key), value, out);
	}
}

fn flatten_value(path: &str, value: &Value, out: &mut FlatMap) {
	match value {
		Value::Object(map) => flatten_object(map, path, out),
		Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) =>
			for (index, item) in items.iter().enumerate() {
				if let Value::Object(map) = item {
					flatten_object(map, &join_path(path, &index.to_string()), out);
				}
			},
		Value::Array(items) if items.iter().all(is_scalar) => {
			let joined: Vec<String> =
				items.iter().filter_map(Scalar::from_value).map(|item| item.to_string()).collect();

			out.insert(path.to_string(), Scalar::String(joined.join(LIST_SEPARATOR)));
		},
		Value::Array(_) => {
			out.insert(path.to_string(), Scalar::String(value.to_string()));
		},
		Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) =>
			if let Some(scalar) = Scalar::from_value(value) {
				out.insert(path.to_string(), scalar);
			},
	}
}

fn is_scalar(value: &Value) -> bool {
	!matches!(value, Value::Array(_) | Value::Object(_))
}

fn join_path(parent: &str, key: &str) -> String {
	if parent.is_empty() { key.to_string() } else { format!("{parent}.{key}") }
}

fn split_list_key<'a>(key: &'a str, prefix: &str) -> Option<(usize, &'a str)> {
	let rest = key.strip_prefix(prefix)?.strip_prefix('.')?;
	let (index, field) = rest.split_once('.')?;

	if index.is_empty() || !index.bytes().all(|byte| byte.is_ascii_digit()) || field.is_empty() {
		return None;
	}

	Some((index.parse().ok()?, field))
}

fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
	let mut current = target;
	let mut parts = path.split('.').peekable();

	while let Some(part) = parts.next() {
		if parts.peek().is_none() {
			current.insert(part.to_string(), value);

			return;
		}

		let next = current.entry(part.to_string()).or_insert_with(|| Value::Object(Map::new()));
		// A scalar already owns this path; the deeper key is dropped.
		let Value::Object(map) = next else { return };

		current = map;
	}
}

fn render_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a Scalar)>) -> String {
	let parts: Vec<String> = pairs.map(|(key, value)| format!("{key}: {value}")).collect();

	parts.join(TEXT_SEPARATOR)
}
