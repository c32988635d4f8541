//! Discovery seed configuration.
//!
//! `config/seeds.yaml` lists the jurisdiction/industry slices the weekly
//! discovery job expands into registry lookups.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedEntry {
    /// ISO 3166-1 alpha-2 country code, e.g. `NO`.
    pub country: String,
    /// NACE industry code to discover, e.g. `62` for IT services.
    pub nace_code: String,
    /// Queue priority for jobs spawned from this seed.
    pub priority: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedsFile {
    pub seeds: Vec<SeedEntry>,
}

/// Load and validate the seeds configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_seeds(path: &Path) -> Result<SeedsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let seeds_file: SeedsFile = serde_yaml::from_str(&content)?;

    validate_seeds(&seeds_file)?;

    Ok(seeds_file)
}

fn validate_seeds(seeds_file: &SeedsFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for seed in &seeds_file.seeds {
        if seed.country.trim().len() != 2 || !seed.country.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ConfigError::Validation(format!(
                "seed country '{}' is not a two-letter country code",
                seed.country
            )));
        }

        if seed.nace_code.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "seed for country '{}' has an empty nace_code",
                seed.country
            )));
        }

        let key = (seed.country.to_uppercase(), seed.nace_code.clone());
        if !seen.insert(key) {
            return Err(ConfigError::Validation(format!(
                "duplicate seed: country '{}', nace_code '{}'",
                seed.country, seed.nace_code
            )));
        }
    }

    Ok(())
}
