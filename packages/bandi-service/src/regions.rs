use ahash::AHashSet;
use serde_json::Value;

use bandi_domain::{merge, regions};
use bandi_storage::queries;

use crate::{BandiService, ServiceResult};

impl BandiService {
	/// Region vocabulary observed across all enriched records, deduplicated,
	/// coded ids mapped to display names. Served to clients building filter
	/// menus.
	pub async fn regions(&self) -> ServiceResult<Vec<String>> {
		let blobs = queries::fetch_enriched_attributes(&self.db.pool).await?;

		Ok(region_names(&blobs))
	}
}

fn region_names(blobs: &[Value]) -> Vec<String> {
	let mut seen = AHashSet::new();
	let mut names = Vec::new();

	for blob in blobs {
		let attrs = merge::attributes_map(blob);

		for name in regions::display_regions(&attrs) {
			if seen.insert(name.clone()) {
				names.push(name);
			}
		}
	}

	// Nazionale leads the menu; everything else is alphabetical. A store
	// where nothing (or only Nazionale) was observed serves the static list
	// instead of a one-entry menu.
	names.retain(|name| name != "Nazionale");

	if names.is_empty() {
		return regions::FALLBACK_REGIONS.iter().map(|region| region.to_string()).collect();
	}

	names.sort();
	names.insert(0, "Nazionale".to_string());

	names
}
