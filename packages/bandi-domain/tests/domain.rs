use serde_json::{Map, Value, json};
use time::macros::{date, datetime};

use bandi_domain::{expiry, identity, marketing, merge, regions, search, status::RecordStatus};

fn attrs(value: Value) -> Map<String, Value> {
	value.as_object().cloned().expect("Attributes fixture must be an object.")
}

#[test]
fn url_normalization_collapses_trivial_spellings() {
	let variants = [
		"https://www.incentivi.gov.it/it/catalogo/bando-1",
		"http://incentivi.gov.it/it/catalogo/bando-1",
		"HTTPS://WWW.INCENTIVI.GOV.IT/it/catalogo/bando-1/",
		"incentivi.gov.it/it/catalogo/bando-1//",
	];
	let expected = "incentivi.gov.it/it/catalogo/bando-1";

	for variant in variants {
		assert_eq!(identity::normalize_url(variant), expected, "variant: {variant}");
	}
}

#[test]
fn identity_hash_is_stable_across_spellings() {
	let first = identity::identity_hash("https://www.example.org/bandi/42/");
	let second = identity::identity_hash("example.org/bandi/42");

	assert_eq!(first, second);
	assert_ne!(first, identity::identity_hash("example.org/bandi/43"));
}

#[test]
fn placeholder_titles_are_recognized() {
	assert!(identity::is_placeholder_title("Bando Senza Titolo"));
	assert!(identity::is_placeholder_title("  No Title "));
	assert!(identity::is_placeholder_title(""));
	assert!(!identity::is_placeholder_title("Voucher digitalizzazione PMI"));
}

#[test]
fn status_round_trips_through_text() {
	for status in [RecordStatus::New, RecordStatus::Analyzed, RecordStatus::Error] {
		assert_eq!(RecordStatus::parse(status.as_str()), Some(status));
	}

	assert_eq!(RecordStatus::parse("ANALYZED"), Some(RecordStatus::Analyzed));
	assert_eq!(RecordStatus::parse("bogus"), None);
}

#[test]
fn status_never_returns_to_new() {
	for status in [RecordStatus::New, RecordStatus::Analyzed, RecordStatus::Error] {
		assert!(!status.permits(RecordStatus::New), "{status:?} must not re-enter new");
	}
}

#[test]
fn status_transitions_follow_the_machine() {
	assert!(RecordStatus::New.permits(RecordStatus::Analyzed));
	assert!(RecordStatus::New.permits(RecordStatus::Error));
	assert!(RecordStatus::Error.permits(RecordStatus::Analyzed));
	assert!(RecordStatus::Analyzed.permits(RecordStatus::Analyzed));
	assert!(!RecordStatus::Analyzed.permits(RecordStatus::Error));

	assert_eq!(RecordStatus::Error.on_success(), RecordStatus::Analyzed);
	assert_eq!(RecordStatus::New.on_failure(), RecordStatus::Error);
	assert_eq!(RecordStatus::Analyzed.on_failure(), RecordStatus::Analyzed);
}

#[test]
fn merge_preserve_keeps_existing_values() {
	let existing = attrs(json!({ "sintesi": "originale", "regions": ["Lombardia"] }));
	let incoming = attrs(json!({ "sintesi": "nuova", "scadenza": "2026-03-01" }));
	let merged = merge::merge(&existing, &incoming, merge::MergeMode::Preserve);

	assert_eq!(merged.get("sintesi"), Some(&json!("originale")));
	assert_eq!(merged.get("scadenza"), Some(&json!("2026-03-01")));
	assert_eq!(merged.get("regions"), Some(&json!(["Lombardia"])));
}

#[test]
fn merge_refreshable_keys_update_in_preserve_mode() {
	let existing = attrs(json!({ "is_expired": false, "marketing_text": "vecchio" }));
	let incoming = attrs(json!({ "is_expired": true, "marketing_text": "nuovo" }));
	let merged = merge::merge(&existing, &incoming, merge::MergeMode::Preserve);

	assert_eq!(merged.get("is_expired"), Some(&json!(true)));
	assert_eq!(merged.get("marketing_text"), Some(&json!("nuovo")));
}

#[test]
fn merge_force_overwrites_everything() {
	let existing = attrs(json!({ "sintesi": "originale", "extra": 1 }));
	let incoming = attrs(json!({ "sintesi": "nuova" }));
	let merged = merge::merge(&existing, &incoming, merge::MergeMode::Force);

	assert_eq!(merged.get("sintesi"), Some(&json!("nuova")));
	assert_eq!(merged.get("extra"), Some(&json!(1)));
}

#[test]
fn merge_converges_on_repeated_application() {
	let a = attrs(json!({ "sintesi": "a", "regions": ["Lazio"] }));
	let b = attrs(json!({ "sintesi": "b", "scadenza": "2025-12-31", "is_expired": false }));
	let once = merge::merge(&a, &b, merge::MergeMode::Preserve);
	let twice = merge::merge(&once, &b, merge::MergeMode::Preserve);

	assert_eq!(once, twice);
}

#[test]
fn unknown_keys_pass_through_merge() {
	let existing = Map::new();
	let incoming = attrs(json!({ "campo_futuro": { "nested": true } }));
	let merged = merge::merge(&existing, &incoming, merge::MergeMode::Preserve);

	assert_eq!(merged.get("campo_futuro"), Some(&json!({ "nested": true })));
}

#[test]
fn malformed_attributes_read_as_empty() {
	assert!(merge::attributes_map(&json!("not an object")).is_empty());
	assert!(merge::attributes_map(&Value::Null).is_empty());
	assert_eq!(merge::attributes_map(&json!({ "k": 1 })).len(), 1);
}

#[test]
fn explicit_expiry_flag_wins_over_deadline() {
	let today = date!(2026 - 01 - 16);
	let flagged = attrs(json!({ "is_expired": false, "scadenza": "2020-01-01" }));

	assert!(!expiry::effective_expired(&flagged, today));

	let flagged_string = attrs(json!({ "is_expired": "true", "scadenza": "2030-01-01" }));

	assert!(expiry::effective_expired(&flagged_string, today));
}

#[test]
fn deadline_comparison_drives_expiry_without_flag() {
	let today = date!(2026 - 01 - 16);

	assert!(expiry::effective_expired(&attrs(json!({ "scadenza": "2026-01-15" })), today));
	assert!(!expiry::effective_expired(&attrs(json!({ "scadenza": "2026-01-16" })), today));
	assert!(!expiry::effective_expired(&attrs(json!({ "close_date": "2026-06-30" })), today));
}

#[test]
fn unparseable_deadlines_count_as_open() {
	let today = date!(2026 - 01 - 16);

	for raw in ["A sportello", "N/A", "fino ad esaurimento fondi"] {
		let record = attrs(json!({ "scadenza": raw }));

		assert!(!expiry::effective_expired(&record, today), "deadline: {raw}");
	}
}

#[test]
fn deadline_keys_resolve_in_priority_order() {
	let record = attrs(json!({ "close_date": "2026-05-01", "scadenza": "2026-02-01" }));

	assert_eq!(expiry::resolve_deadline(&record), Some(date!(2026 - 02 - 01)));
}

#[test]
fn open_date_falls_back_to_ingestion_time() {
	let ingested = datetime!(2025-11-05 10:00 UTC);
	let with_attr = attrs(json!({ "data_apertura": "2025-01-01" }));

	assert_eq!(
		expiry::resolve_open_date(&with_attr, ingested),
		datetime!(2025-01-01 0:00 UTC)
	);
	assert_eq!(expiry::resolve_open_date(&Map::new(), ingested), ingested);
}

#[test]
fn region_filter_matches_list_elements_exactly() {
	let record = attrs(json!({ "regions": ["Lombardia", "Nazionale"] }));

	assert!(regions::region_matches(&record, "Lombardia"));
	assert!(regions::region_matches(&record, "Nazionale"));
	assert!(!regions::region_matches(&record, "Sicilia"));
	assert!(!regions::region_matches(&record, "lombardia"));
}

#[test]
fn region_filter_matches_legacy_field_case_insensitively() {
	let record = attrs(json!({ "regione": "Lombardia" }));

	assert!(regions::region_matches(&record, "lombardia"));
	assert!(!regions::region_matches(&record, "Lazio"));
}

#[test]
fn solr_ids_map_to_display_names() {
	let record = attrs(json!({ "regions": ["226", "Nazionale", "999"] }));
	let names = regions::display_regions(&record);

	assert_eq!(names, vec!["Lombardia".to_string(), "Nazionale".to_string()]);
}

#[test]
fn marketing_text_attribute_wins() {
	let record = attrs(json!({
		"marketing_text": "Fino a 50.000 euro per la tua start-up!",
		"financial_max": 50000,
	}));

	assert_eq!(
		marketing::marketing_summary(&record).as_deref(),
		Some("Fino a 50.000 euro per la tua start-up!")
	);
}

#[test]
fn marketing_summary_composes_from_structured_attributes() {
	let record = attrs(json!({
		"financial_max": 1500000,
		"forma_agevolazione": "Contributo a fondo perduto",
		"ateco_codes": ["62.01", "56.10"],
		"scadenza": "2026-09-30",
	}));
	let summary = marketing::marketing_summary(&record).expect("Expected a composed summary.");

	assert!(summary.contains("\u{20ac}1.5M"), "summary: {summary}");
	assert!(summary.contains("fondo perduto"), "summary: {summary}");
	assert!(summary.contains("Software e IT"), "summary: {summary}");
	assert!(summary.contains("2026-09-30"), "summary: {summary}");
}

#[test]
fn empty_attributes_project_no_summary() {
	assert_eq!(marketing::marketing_summary(&Map::new()), None);
}

#[test]
fn currency_formatting_scales_units() {
	assert_eq!(marketing::format_currency(2_500_000.0), "\u{20ac}2.5M");
	assert_eq!(marketing::format_currency(50_000.0), "\u{20ac}50K");
	assert_eq!(marketing::format_currency(750.0), "\u{20ac}750");
}

#[test]
fn text_search_covers_title_summary_and_attributes() {
	let record = attrs(json!({
		"sintesi": "Contributo per la digitalizzazione delle PMI",
		"search_tags": ["Start-up", "Fondo Perduto"],
	}));

	assert!(search::text_matches("Bando Voucher", None, &record, "voucher"));
	assert!(search::text_matches("Bando", Some("Ottieni fino a 50K"), &record, "ottieni"));
	assert!(search::text_matches("Bando", None, &record, "digitalizzazione"));
	assert!(search::text_matches("Bando", None, &record, "fondo perduto"));
	assert!(!search::text_matches("Bando", None, &record, "agricoltura"));
}
