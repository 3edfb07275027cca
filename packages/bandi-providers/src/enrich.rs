use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};

use bandi_config::ProviderConfig;

use crate::{EnrichmentRequest, Error, Result, json, schema};

/// Submit one enrichment request to a chat-completions endpoint and return
/// the structured attribute object.
pub async fn enrich(cfg: &ProviderConfig, req: &EnrichmentRequest) -> Result<Map<String, Value>> {
	let client = Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.build()
		.map_err(|err| Error::Network { message: err.to_string() })?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": build_messages(req),
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await
		.map_err(|err| {
			if err.is_timeout() {
				Error::Timeout
			} else {
				Error::Network { message: err.to_string() }
			}
		})?;

	match res.status() {
		StatusCode::TOO_MANY_REQUESTS => return Err(Error::RateLimited),
		StatusCode::NOT_FOUND => return Err(Error::NotFound),
		status if !status.is_success() => return Err(Error::Server { status: status.as_u16() }),
		_ => {},
	}

	let raw = res.text().await.map_err(|err| Error::Network { message: err.to_string() })?;
	let payload: Value =
		serde_json::from_str(&raw).map_err(|_| Error::Malformed { raw: raw.clone() })?;

	parse_enrichment(payload)
}

/// Unwrap the chat-completions envelope and extract the attribute object
/// from the message content, tolerating prose around the JSON. A payload
/// without the envelope is accepted as-is when it already is an object.
pub fn parse_enrichment(payload: Value) -> Result<Map<String, Value>> {
	if let Some(content) = payload
		.get("choices")
		.and_then(Value::as_array)
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(Value::as_str)
	{
		return json::extract_json(content)
			.and_then(json::into_attribute_object)
			.ok_or_else(|| Error::Malformed { raw: content.to_string() });
	}

	match payload {
		Value::Object(map) => Ok(map),
		other => Err(Error::Malformed { raw: other.to_string() }),
	}
}

fn build_messages(req: &EnrichmentRequest) -> Vec<Value> {
	let system = "Sei un analista esperto di finanza agevolata. Estrai dati strategici dai bandi \
		per le aziende. Rispondi solo in JSON.";
	let user = format!(
		"Analizza il seguente TESTO DI BANDO ed estrai le informazioni richieste in formato JSON \
		rigoroso.\n\nCAMPI RICHIESTI:\n{}\nRispondi ESCLUSIVAMENTE con il JSON.\n\nDATI DA \
		ANALIZZARE:\n{}",
		schema::render_schema(&req.schema),
		req.content,
	);

	vec![
		serde_json::json!({ "role": "system", "content": system }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}
