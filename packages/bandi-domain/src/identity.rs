/// Titles that ingestion collaborators emit when a source page exposes no
/// usable title. Records carrying one of these are eligible for title repair
/// on a later sighting of the same URL.
pub const TITLE_PLACEHOLDERS: &[&str] = &["Bando Senza Titolo", "No Title"];

/// Canonical form of a source URL used for identity hashing. Trivially
/// different spellings of the same location (scheme, `www.`, trailing slash,
/// case) collapse to one identity.
pub fn normalize_url(url: &str) -> String {
	let mut normalized = url.trim().to_lowercase();

	for scheme in ["https://", "http://"] {
		if let Some(rest) = normalized.strip_prefix(scheme) {
			normalized = rest.to_string();

			break;
		}
	}
	if let Some(rest) = normalized.strip_prefix("www.") {
		normalized = rest.to_string();
	}

	normalized.trim_end_matches('/').to_string()
}

/// Deduplication key: hex digest of the normalized URL.
pub fn identity_hash(url: &str) -> String {
	blake3::hash(normalize_url(url).as_bytes()).to_hex().to_string()
}

pub fn is_placeholder_title(title: &str) -> bool {
	let trimmed = title.trim();

	trimmed.is_empty() || TITLE_PLACEHOLDERS.iter().any(|placeholder| *placeholder == trimmed)
}
