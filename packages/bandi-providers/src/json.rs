use serde_json::{Map, Value};

/// Extract the first well-formed JSON object or array from free text.
/// Providers wrap payloads in prose or code fences often enough that strict
/// parsing of the whole message is a losing game.
pub fn extract_json(text: &str) -> Option<Value> {
	let bytes = text.as_bytes();
	let mut start = 0;

	while let Some(offset) = text[start..].find(['{', '[']) {
		let open = start + offset;

		if let Some(end) = balanced_end(bytes, open)
			&& let Ok(value) = serde_json::from_str(&text[open..=end])
		{
			return Some(value);
		}

		start = open + 1;
	}

	None
}

/// Index of the byte closing the balanced JSON value opening at `open`,
/// string- and escape-aware.
fn balanced_end(bytes: &[u8], open: usize) -> Option<usize> {
	let mut depth = 0_usize;
	let mut in_string = false;
	let mut escaped = false;

	for (index, byte) in bytes.iter().enumerate().skip(open) {
		if in_string {
			if escaped {
				escaped = false;
			} else if *byte == b'\\' {
				escaped = true;
			} else if *byte == b'"' {
				in_string = false;
			}

			continue;
		}

		match byte {
			b'"' => in_string = true,
			b'{' | b'[' => depth += 1,
			b'}' | b']' => {
				depth = depth.checked_sub(1)?;

				if depth == 0 {
					return Some(index);
				}
			},
			_ => {},
		}
	}

	None
}

/// Reduce an extracted value to an attribute object. Some providers wrap the
/// object in a one-element array.
pub fn into_attribute_object(value: Value) -> Option<Map<String, Value>> {
	match value {
		Value::Object(map) => Some(map),
		Value::Array(items) => items.into_iter().find_map(|item| match item {
			Value::Object(map) => Some(map),
			_ => None,
		}),
		_ => None,
	}
}
