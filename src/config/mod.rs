#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::entities::{Book, EntityKind, User};
use crate::core::{ConfigProvider, KeySelector};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where candidates come from, decided by the shape of the location string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Api(String),
    CsvFile(PathBuf),
    Demo,
}

impl SourceLocation {
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            SourceLocation::Api(location.to_string())
        } else if location.eq_ignore_ascii_case("demo") {
            SourceLocation::Demo
        } else {
            SourceLocation::CsvFile(PathBuf::from(location))
        }
    }
}

/// Fully resolved settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    pub entity: EntityKind,
    pub source: String,
    pub store: String,
    pub key_fields: Vec<String>,
    pub display_limit: Option<usize>,
}

impl IngestConfig {
    /// Per-entity defaults: demo books into `books.db`,
    /// `users.csv` into `users.db`.
    pub fn for_entity(entity: EntityKind) -> Self {
        Self {
            entity,
            source: entity.default_source().to_string(),
            store: entity.default_store().to_string(),
            key_fields: Vec::new(),
            display_limit: None,
        }
    }

    pub fn source_kind(&self) -> SourceLocation {
        SourceLocation::parse(&self.source)
    }
}

impl ConfigProvider for IngestConfig {
    fn entity(&self) -> EntityKind {
        self.entity
    }

    fn source_location(&self) -> &str {
        &self.source
    }

    fn store_location(&self) -> &str {
        &self.store
    }

    fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    fn display_limit(&self) -> Option<usize> {
        self.display_limit
    }
}

impl Validate for IngestConfig {
    fn validate(&self) -> Result<()> {
        match self.source_kind() {
            SourceLocation::Api(url) => validation::validate_url("source", &url)?,
            SourceLocation::CsvFile(_) => validation::validate_path("source", &self.source)?,
            SourceLocation::Demo => {
                if !self.entity.has_sample_data() {
                    return Err(EtlError::InvalidConfigValueError {
                        field: "source".to_string(),
                        value: self.source.clone(),
                        reason: format!("no demo data is available for {}", self.entity),
                    });
                }
            }
        }

        validation::validate_path("store", &self.store)?;

        for field in &self.key_fields {
            validation::validate_non_empty_string("dedup.key_fields", field)?;
        }
        match self.entity {
            EntityKind::Books => KeySelector::for_entity::<Book>(&self.key_fields).map(|_| ())?,
            EntityKind::Users => KeySelector::for_entity::<User>(&self.key_fields).map(|_| ())?,
        }

        if let Some(limit) = self.display_limit {
            validation::validate_positive_number("display.limit", limit, 1)?;
        }

        Ok(())
    }
}
