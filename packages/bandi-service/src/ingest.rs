use bandi_domain::{identity, status::RecordStatus};
use bandi_storage::queries;

use crate::{BandiService, ServiceError, ServiceResult};

/// Raw candidate handed over by an ingestion collaborator (feed reader,
/// portal scraper). The core never fetches pages itself.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Candidate {
	pub url: String,
	pub title: String,
	pub raw_content: String,
	pub source_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
	Created { id: i64 },
	Skipped { id: i64 },
}

impl BandiService {
	/// Deduplication gate. The unique index on `identity_hash` is the final
	/// arbiter: a lost insert race degrades to `Skipped`, never to an error.
	pub async fn ingest(&self, candidate: Candidate) -> ServiceResult<IngestOutcome> {
		if candidate.url.trim().is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Candidate url must be non-empty.".to_string(),
			});
		}

		let hash = identity::identity_hash(&candidate.url);
		let title = match candidate.title.trim() {
			"" => identity::TITLE_PLACEHOLDERS[0],
			trimmed => trimmed,
		};

		if let Some(existing) = queries::find_by_identity_hash(&self.db.pool, &hash).await? {
			// Title repair: the only permitted post-creation write to an
			// ingested field.
			if identity::is_placeholder_title(&existing.title)
				&& !identity::is_placeholder_title(title)
			{
				queries::repair_title(&self.db.pool, existing.id, title).await?;
				tracing::info!(id = existing.id, title, "Repaired placeholder title.");
			}

			return Ok(IngestOutcome::Skipped { id: existing.id });
		}

		let inserted = queries::insert_record(
			&self.db.pool,
			candidate.url.trim(),
			&hash,
			title,
			&candidate.raw_content,
			&candidate.source_name,
			RecordStatus::New.as_str(),
		)
		.await?;

		match inserted {
			Some(id) => {
				tracing::info!(id, source = %candidate.source_name, "Ingested new record.");

				Ok(IngestOutcome::Created { id })
			},
			None => {
				// A concurrent submitter won the race between lookup and
				// insert.
				tracing::warn!(url = %candidate.url, "Duplicate detected during insert.");

				let existing = queries::find_by_identity_hash(&self.db.pool, &hash)
					.await?
					.ok_or_else(|| ServiceError::Storage {
						message: "Record vanished after duplicate-key insert.".to_string(),
					})?;

				Ok(IngestOutcome::Skipped { id: existing.id })
			},
		}
	}
}
