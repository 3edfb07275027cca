use serde_json::{Map, Value};
use time::{Date, OffsetDateTime, macros::format_description};

/// Attribute names checked, in order, when resolving a closing deadline.
pub const DEADLINE_KEYS: &[&str] = &["scadenza", "close_date", "data_chiusura"];
/// Attribute names checked, in order, when resolving an opening date.
pub const OPEN_DATE_KEYS: &[&str] = &["open_date", "data_apertura"];

/// Effective expiry flag used by the ranking key. An explicit `is_expired`
/// attribute wins; otherwise the resolved deadline is compared against
/// `today` (strictly before means expired). Unresolvable deadlines
/// ("A sportello", "N/A", free text) count as not expired.
pub fn effective_expired(attrs: &Map<String, Value>, today: Date) -> bool {
	if let Some(flag) = explicit_expired_flag(attrs) {
		return flag;
	}

	match resolve_deadline(attrs) {
		Some(deadline) => deadline < today,
		None => false,
	}
}

pub fn resolve_deadline(attrs: &Map<String, Value>) -> Option<Date> {
	DEADLINE_KEYS
		.iter()
		.filter_map(|key| attrs.get(*key))
		.filter_map(Value::as_str)
		.find_map(parse_date)
}

/// Opening date for recency ranking, falling back to the ingestion timestamp
/// when no attribute resolves.
pub fn resolve_open_date(attrs: &Map<String, Value>, ingested_at: OffsetDateTime) -> OffsetDateTime {
	OPEN_DATE_KEYS
		.iter()
		.filter_map(|key| attrs.get(*key))
		.filter_map(Value::as_str)
		.find_map(parse_date)
		.map(|date| date.midnight().assume_utc())
		.unwrap_or(ingested_at)
}

/// Enrichment output stores the flag as a bool or, from older provider
/// schemas, as the strings "true"/"false".
fn explicit_expired_flag(attrs: &Map<String, Value>) -> Option<bool> {
	match attrs.get("is_expired")? {
		Value::Bool(flag) => Some(*flag),
		Value::String(raw) =>
			if raw.eq_ignore_ascii_case("true") {
				Some(true)
			} else if raw.eq_ignore_ascii_case("false") {
				Some(false)
			} else {
				None
			},
		_ => None,
	}
}

/// Deadline strings are `YYYY-MM-DD`, sometimes with a time suffix; only the
/// date prefix is considered.
fn parse_date(raw: &str) -> Option<Date> {
	let trimmed = raw.trim();
	let prefix: String = trimmed.chars().take(10).collect();

	Date::parse(&prefix, format_description!("[year]-[month]-[day]")).ok()
}
