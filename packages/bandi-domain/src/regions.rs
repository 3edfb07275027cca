use serde_json::{Map, Value};

/// Region list served when no record has been enriched yet.
pub const FALLBACK_REGIONS: &[&str] = &[
	"Nazionale",
	"Lombardia",
	"Lazio",
	"Campania",
	"Veneto",
	"Piemonte",
	"Emilia-Romagna",
	"Sicilia",
	"Toscana",
	"Puglia",
];

/// Some sources emit the upstream catalogue's Solr facet ids instead of
/// region names. Map the known ids to display names; unmapped numeric values
/// are dropped by the callers.
pub fn solr_region_name(id: &str) -> Option<&'static str> {
	let name = match id {
		"218" => "Abruzzo",
		"219" => "Basilicata",
		"220" => "Calabria",
		"221" => "Campania",
		"222" => "Emilia-Romagna",
		"223" => "Friuli-Venezia Giulia",
		"224" => "Lazio",
		"225" => "Liguria",
		"226" => "Lombardia",
		"227" => "Marche",
		"228" => "Molise",
		"229" => "Piemonte",
		"230" => "Puglia",
		"231" => "Sardegna",
		"232" => "Sicilia",
		"233" => "Toscana",
		"234" => "Trentino-Alto Adige",
		"235" => "Umbria",
		"236" => "Valle d'Aosta",
		"237" => "Veneto",
		"587" => "Estero",
		_ => return None,
	};

	Some(name)
}

/// Region filter predicate: exact element match against the `regions` list
/// (case-sensitive on the stored value), or case-insensitive equality with
/// the legacy single-valued `regione` field.
pub fn region_matches(attrs: &Map<String, Value>, target: &str) -> bool {
	let target = target.trim();

	if target.is_empty() {
		return true;
	}
	if let Some(regions) = attrs.get("regions").and_then(Value::as_array)
		&& regions.iter().filter_map(Value::as_str).any(|region| region == target)
	{
		return true;
	}

	attrs
		.get("regione")
		.and_then(Value::as_str)
		.map(|legacy| legacy.trim().eq_ignore_ascii_case(target))
		.unwrap_or(false)
}

/// Display names carried by one record's attributes: the `regions` list plus
/// the legacy `regione` value, Solr ids mapped, unmapped numeric ids dropped.
pub fn display_regions(attrs: &Map<String, Value>) -> Vec<String> {
	let mut names = Vec::new();

	match attrs.get("regions") {
		Some(Value::Array(values)) =>
			for value in values.iter().filter_map(Value::as_str) {
				push_display_name(&mut names, value);
			},
		Some(Value::String(value)) => push_display_name(&mut names, value),
		_ => {},
	}
	if let Some(legacy) = attrs.get("regione").and_then(Value::as_str) {
		push_display_name(&mut names, legacy);
	}

	names
}

fn push_display_name(names: &mut Vec<String>, raw: &str) {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return;
	}
	if let Some(mapped) = solr_region_name(trimmed) {
		names.push(mapped.to_string());
	} else if !trimmed.chars().all(|c| c.is_ascii_digit()) {
		names.push(trimmed.to_string());
	}
}
