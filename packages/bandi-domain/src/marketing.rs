use serde_json::{Map, Value};

/// Marketing summary projected from the attribute map for card display. The
/// enrichment provider's own `marketing_text` wins when present; otherwise a
/// line is composed from the structured attributes; a generic pitch is the
/// last resort so every enriched record has something to show.
pub fn marketing_summary(attrs: &Map<String, Value>) -> Option<String> {
	if attrs.is_empty() {
		return None;
	}
	if let Some(text) = attrs.get("marketing_text").and_then(Value::as_str)
		&& !text.trim().is_empty()
	{
		return Some(text.trim().to_string());
	}

	let mut parts = Vec::new();

	if let Some(amount) = numeric_attr(attrs, "financial_max") {
		parts.push(format!("Ottieni fino a {} per la tua impresa", format_currency(amount)));
	} else if let Some(amount) = numeric_attr(attrs, "financial_min") {
		parts.push(format!("Finanziamento a partire da {}", format_currency(amount)));
	}
	if let Some(form) = benefit_form(attrs) {
		parts.push(form.to_string());
	}
	if let Some(sector) = sector_names(attrs) {
		parts.push(format!("Ideale per: {sector}"));
	}
	if let Some(deadline) = deadline_label(attrs) {
		parts.push(format!("Scadenza: {deadline}"));
	}
	if let Some(region) = attrs.get("regione").and_then(Value::as_str).filter(|r| !r.is_empty()) {
		parts.push(region.to_string());
	}

	if parts.is_empty() {
		Some(
			"Opportunita' di finanziamento per PMI - Richiedi una consulenza gratuita per verificare i requisiti"
				.to_string(),
		)
	} else {
		Some(parts.join(" | "))
	}
}

pub fn format_currency(value: f64) -> String {
	if value >= 1_000_000.0 {
		format!("\u{20ac}{:.1}M", value / 1_000_000.0)
	} else if value >= 1_000.0 {
		format!("\u{20ac}{:.0}K", value / 1_000.0)
	} else {
		format!("\u{20ac}{value:.0}")
	}
}

fn numeric_attr(attrs: &Map<String, Value>, key: &str) -> Option<f64> {
	match attrs.get(key)? {
		Value::Number(number) => number.as_f64(),
		Value::String(raw) => raw.trim().parse().ok(),
		_ => None,
	}
}

fn benefit_form(attrs: &Map<String, Value>) -> Option<&'static str> {
	let raw = match attrs.get("forma_agevolazione")? {
		Value::String(form) => form.clone(),
		Value::Array(forms) => forms.first().and_then(Value::as_str)?.to_string(),
		_ => return None,
	};
	let lowered = raw.to_lowercase();

	if lowered.contains("fondo") || lowered.contains("perduto") {
		Some("Contributo a fondo perduto")
	} else if lowered.contains("garanzia") {
		Some("Garanzia statale inclusa")
	} else if lowered.contains("credito") || lowered.contains("fisc") {
		Some("Credito d'imposta")
	} else {
		None
	}
}

fn deadline_label(attrs: &Map<String, Value>) -> Option<String> {
	let raw = crate::expiry::DEADLINE_KEYS
		.iter()
		.filter_map(|key| attrs.get(*key))
		.filter_map(Value::as_str)
		.find(|value| !value.trim().is_empty() && !value.trim().eq_ignore_ascii_case("N/A"))?;

	Some(raw.trim().chars().take(10).collect())
}

/// Readable sector labels from ATECO codes: the leading two digits of each
/// code select a macro sector; at most two distinct sectors are named.
fn sector_names(attrs: &Map<String, Value>) -> Option<String> {
	let codes: Vec<String> = match attrs.get("ateco_codes")? {
		Value::String(raw) =>
			raw.replace(';', " ").replace(',', " ").split_whitespace().map(str::to_string).collect(),
		Value::Array(values) =>
			values.iter().filter_map(Value::as_str).map(str::to_string).collect(),
		_ => return None,
	};
	let mut sectors = Vec::new();

	for code in codes.iter().take(3) {
		let prefix: String = code.chars().take(2).collect();
		let Some(sector) = ateco_sector(&prefix) else {
			continue;
		};

		if !sectors.contains(&sector) {
			sectors.push(sector);
		}
	}

	if sectors.is_empty() { None } else { Some(sectors[..sectors.len().min(2)].join(", ")) }
}

fn ateco_sector(prefix: &str) -> Option<&'static str> {
	let sector = match prefix {
		"10" => "Alimentare",
		"13" => "Tessile",
		"16" => "Legno",
		"20" => "Chimica",
		"21" => "Farmaceutica",
		"25" => "Metalmeccanica",
		"26" => "Elettronica",
		"28" => "Macchinari",
		"29" => "Automotive",
		"41" => "Edilizia",
		"47" => "Commercio dettaglio",
		"52" => "Logistica",
		"55" => "Alloggio",
		"56" => "Ristorazione",
		"62" => "Software e IT",
		"63" => "Servizi informatici",
		"70" => "Consulenza aziendale",
		"72" => "Ricerca e sviluppo",
		"79" => "Turismo",
		"85" => "Istruzione",
		"86" => "Sanita'",
		"96" => "Servizi alla persona",
		_ => return None,
	};

	Some(sector)
}
