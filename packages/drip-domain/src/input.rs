use serde_json::{Deserializer, Value};

use crate::{Error, Result};

/// Parses brew records from a JSON value, a JSON array, JSON Lines, or pretty-printed JSON values
/// written back to back. Top-level arrays are expanded into their elements.
pub fn parse_records(raw: &str) -> Result<Vec<Value>> {
	let mut out = Vec::new();

	for value in Deserializer::from_str(raw).into_iter::<Value>() {
		let value = value.map_err(|err| Error::InvalidJson {
			line: err.line(),
			column: err.column(),
			source: err,
		})?;

		match value {
			Value::Array(items) => out.extend(items),
			other => out.push(other),
		}
	}

	Ok(out)
}
