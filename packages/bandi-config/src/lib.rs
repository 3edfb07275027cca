mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Enrichment, Postgres, ProviderConfig, Query, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.is_empty() {
		return Err(Error::Validation {
			message: "At least one [[providers]] entry is required.".to_string(),
		});
	}

	for provider in &cfg.providers {
		if provider.provider_id.trim().is_empty() {
			return Err(Error::Validation {
				message: "providers.provider_id must be non-empty.".to_string(),
			});
		}
		if provider.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {} api_key must be non-empty.", provider.provider_id),
			});
		}
		if provider.timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!(
					"Provider {} timeout_ms must be greater than zero.",
					provider.provider_id
				),
			});
		}
	}

	if cfg.enrichment.batch_size == 0 {
		return Err(Error::Validation {
			message: "enrichment.batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.enrichment.concurrency_limit == 0 {
		return Err(Error::Validation {
			message: "enrichment.concurrency_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.enrichment.max_retries == 0 {
		return Err(Error::Validation {
			message: "enrichment.max_retries must be greater than zero.".to_string(),
		});
	}
	if cfg.enrichment.base_backoff_ms > cfg.enrichment.max_backoff_ms {
		return Err(Error::Validation {
			message: "enrichment.base_backoff_ms must not exceed enrichment.max_backoff_ms."
				.to_string(),
		});
	}
	if cfg.enrichment.max_content_chars == 0 {
		return Err(Error::Validation {
			message: "enrichment.max_content_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.query.max_page_size == 0 {
		return Err(Error::Validation {
			message: "query.max_page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.query.default_page_size == 0 || cfg.query.default_page_size > cfg.query.max_page_size {
		return Err(Error::Validation {
			message: "query.default_page_size must be between 1 and query.max_page_size."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for provider in &mut cfg.providers {
		if let Some(stripped) = provider.api_base.strip_suffix('/') {
			provider.api_base = stripped.to_string();
		}
	}
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
