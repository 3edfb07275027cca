/// One field of the advertised output schema, rendered into the prompt so any
/// chat-completions provider can fill it.
#[derive(Debug, Clone)]
pub struct SchemaField {
	pub name: String,
	pub kind: String,
	pub description: String,
}
impl SchemaField {
	fn new(name: &str, kind: &str, description: &str) -> Self {
		Self { name: name.to_string(), kind: kind.to_string(), description: description.to_string() }
	}
}

#[derive(Debug, Clone)]
pub struct EnrichmentRequest {
	/// Title plus raw content, already truncated to the provider context
	/// budget by the caller.
	pub content: String,
	pub schema: Vec<SchemaField>,
}

/// The grant attribute schema requested from every provider. Keys match the
/// stored attribute vocabulary.
pub fn default_schema() -> Vec<SchemaField> {
	vec![
		SchemaField::new(
			"regions",
			"array of strings",
			"Regioni ammissibili, oppure [\"Nazionale\"] se il bando vale per tutta Italia.",
		),
		SchemaField::new(
			"ateco_codes",
			"array of strings",
			"Codici ATECO o settori economici ammessi, [] se non specificati.",
		),
		SchemaField::new(
			"is_expired",
			"boolean",
			"true se la data di scadenza nel testo e' gia' passata rispetto a oggi.",
		),
		SchemaField::new(
			"marketing_text",
			"string",
			"Riassunto persuasivo di due righe: vantaggio economico piu' call to action.",
		),
		SchemaField::new(
			"search_tags",
			"array of strings",
			"Parole chiave per la ricerca, es. Start-up, Fondo Perduto, Giovani.",
		),
		SchemaField::new("sintesi", "string", "Breve descrizione del bando, massimo 40 parole."),
		SchemaField::new(
			"scadenza",
			"string",
			"Data di chiusura in formato YYYY-MM-DD, oppure \"N/A\" se non indicata.",
		),
	]
}

pub fn render_schema(fields: &[SchemaField]) -> String {
	let mut out = String::new();

	for field in fields {
		out.push_str(&format!("- \"{}\" ({}): {}\n", field.name, field.kind, field.description));
	}

	out
}
