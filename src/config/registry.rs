//! Tabular payer registries
//!
//! Payer lists are often maintained as spreadsheets. A CSV export with the
//! columns `company_name` and `base_domain`, plus the optional `priority` and
//! `known_provider_portal`, can stand in for the `[[payer]]` tables of the
//! TOML configuration.

use crate::config::types::{PayerEntry, Priority};
use crate::config::validation::validate_payers;
use crate::ConfigError;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PayerRow {
    company_name: String,
    base_domain: String,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    known_provider_portal: Option<String>,
}

impl PayerRow {
    fn into_entry(self) -> Result<PayerEntry, ConfigError> {
        let priority = match self.priority.as_deref() {
            Some(p) => p.parse::<Priority>()?,
            None => Priority::default(),
        };

        Ok(PayerEntry {
            name: self.company_name,
            base_domain: self.base_domain,
            known_portal: self.known_provider_portal,
            seeds: Vec::new(),
            priority,
        })
    }
}

/// Reads and validates a CSV payer registry
pub fn read_payer_csv<R: Read>(reader: R) -> Result<Vec<PayerEntry>, ConfigError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let payers = reader
        .deserialize::<PayerRow>()
        .map(|row| row?.into_entry())
        .collect::<Result<Vec<_>, _>>()?;

    validate_payers(&payers)?;
    Ok(payers)
}

/// Loads the CSV payer registry at `path`
pub fn load_payer_csv(path: &Path) -> Result<Vec<PayerEntry>, ConfigError> {
    read_payer_csv(std::fs::File::open(path)?)
}
