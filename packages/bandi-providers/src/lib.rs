pub mod enrich;
pub mod json;
pub mod schema;

pub use schema::{EnrichmentRequest, SchemaField, default_schema};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Provider failure taxonomy. The scheduler retries transient errors on the
/// same provider and advances to the next provider on everything else.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Provider rate limited the request.")]
	RateLimited,
	#[error("Model not found on provider.")]
	NotFound,
	#[error("Provider returned server error {status}.")]
	Server { status: u16 },
	#[error("Network error: {message}")]
	Network { message: String },
	#[error("Provider call timed out.")]
	Timeout,
	#[error("Provider output is not valid JSON.")]
	Malformed { raw: String },
	#[error("Invalid provider configuration: {message}")]
	Config { message: String },
}
impl Error {
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::RateLimited | Self::Timeout | Self::Network { .. })
	}
}

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(
		AUTHORIZATION,
		format!("Bearer {api_key}")
			.parse()
			.map_err(|_| Error::Config { message: "api_key is not a valid header value.".to_string() })?,
	);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::Config {
				message: "Default header values must be strings.".to_string(),
			});
		};
		let name = HeaderName::from_bytes(key.as_bytes())
			.map_err(|_| Error::Config { message: format!("Invalid header name: {key}.") })?;

		headers.insert(
			name,
			raw.parse()
				.map_err(|_| Error::Config { message: format!("Invalid header value for {key}.") })?,
		);
	}

	Ok(headers)
}
