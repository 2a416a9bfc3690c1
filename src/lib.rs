pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::{toml_config::TomlConfig, IngestConfig, SourceLocation};

pub use adapters::{ApiSource, CsvFileSource, SqliteStore, StaticSource};
pub use app::pipelines::{IngestPipeline, PipelineOutput};
pub use crate::core::entities::{Book, EntityKind, User};
pub use crate::core::{etl::ImportEngine, summary::ImportSummary};
pub use domain::model::{ImportOutcome, KeySelector, RawCandidate};
pub use utils::error::{EtlError, Result};
