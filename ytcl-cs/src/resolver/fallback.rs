//! Bundled fallback classification dataset
//!
//! A read-only JSON object mapping identifiers to classification labels,
//! shipped alongside the service and consulted only when neither an
//! override nor a consensus prediction exists. Loaded at most once; a
//! missing or malformed file degrades to an empty dataset.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{error, info};
use ytcl_common::Classification;

/// Read-only identifier → classification mapping, loaded on first use
pub struct StaticFallbackDataset {
    path: PathBuf,
    data: OnceCell<HashMap<String, Classification>>,
}

impl StaticFallbackDataset {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: OnceCell::new(),
        }
    }

    fn data(&self) -> &HashMap<String, Classification> {
        self.data.get_or_init(|| load_dataset(&self.path))
    }

    /// Classification for a normalized identifier
    ///
    /// Exact match first; datasets with mixed-case keys are covered by a
    /// case-insensitive scan.
    pub fn lookup(&self, normalized: &str) -> Option<Classification> {
        if normalized.is_empty() {
            return None;
        }

        let data = self.data();
        if let Some(classification) = data.get(normalized) {
            return Some(*classification);
        }

        data.iter()
            .find(|(key, _)| key.to_lowercase() == normalized)
            .map(|(_, classification)| *classification)
    }

    /// Number of usable entries
    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn load_dataset(path: &PathBuf) -> HashMap<String, Classification> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            error!("Failed to load fallback dataset {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    let labels: HashMap<String, String> = match serde_json::from_str(&raw) {
        Ok(labels) => labels,
        Err(e) => {
            error!("Fallback dataset {} is not valid JSON: {}", path.display(), e);
            return HashMap::new();
        }
    };

    // Entries with unrecognized or "unknown" labels carry no signal
    let data: HashMap<String, Classification> = labels
        .into_iter()
        .filter_map(|(identifier, label)| {
            Classification::parse_label(&label)
                .filter(|c| c.is_known())
                .map(|c| (identifier, c))
        })
        .collect();

    info!(
        "Loaded {} fallback channel classifications from {}",
        data.len(),
        path.display()
    );

    data
}
