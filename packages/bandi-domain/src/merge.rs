use serde_json::{Map, Value};

/// Presentation keys intentionally kept current: they are rewritten on every
/// enrichment pass even in preserve mode.
pub const ALWAYS_REFRESH_KEYS: &[&str] = &["is_expired", "marketing_text"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
	/// Incoming keys fill gaps; existing values win except for
	/// [`ALWAYS_REFRESH_KEYS`].
	Preserve,
	/// Incoming keys overwrite unconditionally.
	Force,
}
impl MergeMode {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"preserve" => Some(Self::Preserve),
			"force" => Some(Self::Force),
			_ => None,
		}
	}
}

/// Combine a new enrichment result with previously stored attributes.
/// Idempotent: applying the same `incoming` twice in preserve mode yields the
/// same map as applying it once.
pub fn merge(
	existing: &Map<String, Value>,
	incoming: &Map<String, Value>,
	mode: MergeMode,
) -> Map<String, Value> {
	let mut merged = existing.clone();

	for (key, value) in incoming {
		let write = match mode {
			MergeMode::Force => true,
			MergeMode::Preserve =>
				!merged.contains_key(key)
					|| ALWAYS_REFRESH_KEYS.iter().any(|refresh| refresh == key),
		};

		if write {
			merged.insert(key.clone(), value.clone());
		}
	}

	merged
}

/// Stored attributes as a map. Anything other than a JSON object (including
/// the historical malformed blobs) reads as an empty attribute set.
pub fn attributes_map(value: &Value) -> Map<String, Value> {
	value.as_object().cloned().unwrap_or_default()
}
