use crate::codec::{FlatMap, Scalar};

const SEED_KEYS: [&str; 2] = ["id", "uuid"];
const NAME_KEY: &str = "bean.name";
const DIGEST_CHARS: usize = 12;

/// Derives a stable record id from a flattened record and its retrieval text.
///
/// An explicit top-level `id` or `uuid` is used verbatim. Otherwise the bean name, or `row`, is
/// suffixed with a short blake3 digest of the text, so re-ingesting the same record yields the
/// same id.
pub fn derive(flat: &FlatMap, text: &str) -> String {
	for key in SEED_KEYS {
		if let Some(seed) = flat.get(key).and_then(seed_text) {
			return seed;
		}
	}

	let digest = blake3::hash(text.as_bytes()).to_hex();
	let short = &digest.as_str()[..DIGEST_CHARS];

	match flat.get(NAME_KEY).and_then(seed_text) {
		Some(name) => format!("{name}-{short}"),
		None => format!("row-{short}"),
	}
}

fn seed_text(value: &Scalar) -> Option<String> {
	match value {
		Scalar::String(text) => {
			let trimmed = text.trim();

			(!trimmed.is_empty()).then(|| trimmed.to_string())
		},
		Scalar::Number(number) => Some(number.to_string()),
		Scalar::Null | Scalar::Bool(_) => None,
	}
}
