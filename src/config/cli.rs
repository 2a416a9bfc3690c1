use crate::config::toml_config::TomlConfig;
use crate::config::IngestConfig;
use crate::core::entities::EntityKind;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "small-ingest")]
#[command(about = "Import records from an API or CSV file into SQLite, skipping duplicates")]
pub struct CliConfig {
    /// Entity to import; defaults to the config file's entity, then books
    #[arg(long, value_enum)]
    pub entity: Option<EntityKind>,

    /// http(s) URL, CSV file path, or "demo"
    #[arg(long)]
    pub source: Option<String>,

    /// SQLite database path, or ":memory:"
    #[arg(long)]
    pub store: Option<String>,

    /// Dedup key columns, comma separated
    #[arg(long, value_delimiter = ',')]
    pub key: Vec<String>,

    /// Number of stored rows to show after the import
    #[arg(long)]
    pub display_limit: Option<usize>,

    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<String>,

    /// List rejected and failed records after the summary
    #[arg(long)]
    pub show_issues: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Merges the optional TOML file with command line overrides.
    pub fn resolve(&self) -> Result<IngestConfig> {
        let file_config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                let toml = TomlConfig::from_file(path)?;
                tracing::info!("Pipeline: {}", toml.name());
                Some(toml.to_ingest_config())
            }
            None => None,
        };

        let mut config = match (file_config, self.entity) {
            (Some(file), Some(entity)) if file.entity != entity => {
                tracing::warn!(
                    "--entity {} differs from the config file ({}); ignoring file settings",
                    entity,
                    file.entity
                );
                IngestConfig::for_entity(entity)
            }
            (Some(file), _) => file,
            (None, entity) => IngestConfig::for_entity(entity.unwrap_or(EntityKind::Books)),
        };

        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(store) = &self.store {
            config.store = store.clone();
        }
        if !self.key.is_empty() {
            config.key_fields = self.key.clone();
        }
        if self.display_limit.is_some() {
            config.display_limit = self.display_limit;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_flags() {
        let cli = CliConfig::parse_from(["small-ingest"]);
        let config = cli.resolve().unwrap();
        assert_eq!(config, IngestConfig::for_entity(EntityKind::Books));
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = CliConfig::parse_from([
            "small-ingest",
            "--entity",
            "users",
            "--source",
            "people.csv",
            "--store",
            ":memory:",
            "--key",
            "name,email",
            "--display-limit",
            "3",
        ]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.entity, EntityKind::Users);
        assert_eq!(config.source, "people.csv");
        assert_eq!(config.store, ":memory:");
        assert_eq!(config.key_fields, vec!["name", "email"]);
        assert_eq!(config.display_limit, Some(3));
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"[pipeline]\nentity = \"users\"\n[source]\nlocation = \"a.csv\"\n[store]\nlocation = \"a.db\"\n",
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = CliConfig::parse_from(["small-ingest", "--config", &path, "--store", "b.db"]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.entity, EntityKind::Users);
        assert_eq!(config.source, "a.csv");
        assert_eq!(config.store, "b.db");
    }
}
