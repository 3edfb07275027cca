use serde_json::{Map, Value};

/// Attribute fields included in free-text search alongside the title and the
/// marketing summary.
pub const SEARCH_ATTRIBUTE_KEYS: &[&str] = &["sintesi", "titolo_riassuntivo", "search_tags"];

/// Case-insensitive substring match across a record's display text.
pub fn text_matches(
	title: &str,
	marketing_summary: Option<&str>,
	attrs: &Map<String, Value>,
	needle: &str,
) -> bool {
	let needle = needle.trim().to_lowercase();

	if needle.is_empty() {
		return true;
	}
	if title.to_lowercase().contains(&needle) {
		return true;
	}
	if let Some(summary) = marketing_summary
		&& summary.to_lowercase().contains(&needle)
	{
		return true;
	}

	SEARCH_ATTRIBUTE_KEYS
		.iter()
		.filter_map(|key| attrs.get(*key))
		.any(|value| value_contains(value, &needle))
}

fn value_contains(value: &Value, needle: &str) -> bool {
	match value {
		Value::String(text) => text.to_lowercase().contains(needle),
		Value::Array(items) =>
			items.iter().filter_map(Value::as_str).any(|item| item.to_lowercase().contains(needle)),
		_ => false,
	}
}
