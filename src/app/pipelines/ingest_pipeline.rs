use crate::adapters::{ApiSource, CsvFileSource, SqliteStore, StaticSource};
use crate::app::display::render_table;
use crate::config::SourceLocation;
use crate::core::entities::{Book, EntityKind, User};
use crate::core::etl::ImportEngine;
use crate::core::summary::ImportSummary;
use crate::core::{ConfigProvider, Entity, KeySelector, RecordSource, Store};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;

/// Everything a completed run has to report.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub entity: EntityKind,
    pub source: String,
    pub summary: ImportSummary,
    /// Rendered table of stored rows, limited by the display setting.
    pub stored: String,
}

/// Connect, prepare schema, fetch, import, then read back for display.
pub struct IngestPipeline<C: ConfigProvider> {
    config: C,
    client: Client,
}

impl<C: ConfigProvider> IngestPipeline<C> {
    pub fn new(config: C) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: C, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub async fn run(&self) -> Result<PipelineOutput> {
        match self.config.entity() {
            EntityKind::Books => self.run_entity::<Book>().await,
            EntityKind::Users => self.run_entity::<User>().await,
        }
    }

    fn build_source<E: Entity>(&self) -> Result<Box<dyn RecordSource>> {
        let location = self.config.source_location();
        let source: Box<dyn RecordSource> = match SourceLocation::parse(location) {
            SourceLocation::Api(url) => Box::new(ApiSource::with_client(url, self.client.clone())),
            SourceLocation::CsvFile(path) => Box::new(CsvFileSource::new(path)),
            SourceLocation::Demo => {
                let samples = E::sample_candidates();
                if samples.is_empty() {
                    return Err(EtlError::ConfigError {
                        message: format!("no demo data is available for {}", E::TABLE),
                    });
                }
                tracing::info!("Using built-in demo data for {}", E::TABLE);
                Box::new(StaticSource::new("demo", samples))
            }
        };
        Ok(source)
    }

    async fn run_entity<E: Entity>(&self) -> Result<PipelineOutput> {
        let key = KeySelector::for_entity::<E>(self.config.key_fields())?;
        let source = self.build_source::<E>()?;

        // 準備資料庫
        let store = SqliteStore::<E>::connect(self.config.store_location(), key.clone()).await?;
        store.ensure_schema().await?;

        // 擷取資料
        tracing::info!("Fetching candidates from {}", source.describe());
        let candidates = source.fetch().await?;
        tracing::info!("Fetched {} candidates", candidates.len());

        let summary = ImportEngine::new(&store, &key)
            .import_all(candidates)
            .await?;

        // The import is committed at this point; a failed read-back only affects the table.
        let rows = match self.config.display_limit().or(E::DISPLAY_LIMIT) {
            Some(limit) => store.query_page(limit).await,
            None => store.query_all().await,
        };
        store.close().await;

        let stored = match rows {
            Ok(rows) => render_table(&rows),
            Err(e) => {
                tracing::warn!("Could not read back stored {}: {}", E::TABLE, e);
                format!("--- {} in database unavailable: {} ---\n", E::TABLE, e)
            }
        };

        Ok(PipelineOutput {
            entity: self.config.entity(),
            source: source.describe(),
            summary,
            stored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;

    #[tokio::test]
    async fn test_demo_books_into_memory_store() {
        let mut config = IngestConfig::for_entity(EntityKind::Books);
        config.store = ":memory:".to_string();

        let output = IngestPipeline::new(config).run().await.unwrap();

        assert_eq!(output.entity, EntityKind::Books);
        assert_eq!(output.source, "demo");
        assert_eq!(output.summary.inserted(), 5);
        assert!(output.stored.contains("The Great Gatsby"));
        assert!(output.stored.contains("(5 shown)"));
    }

    #[tokio::test]
    async fn test_missing_csv_is_source_failure() {
        let mut config = IngestConfig::for_entity(EntityKind::Users);
        config.source = "/no/such/dir/users.csv".to_string();
        config.store = ":memory:".to_string();

        let err = IngestPipeline::new(config).run().await.unwrap_err();
        assert!(matches!(err, EtlError::SourceError { .. }));
    }

    #[tokio::test]
    async fn test_failed_read_back_keeps_summary() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("books.db");
        let mut config = IngestConfig::for_entity(EntityKind::Books);
        config.store = path.to_str().unwrap().to_string();

        // a foreign table without the columns inserts and reads need
        let key = KeySelector::for_entity::<Book>(&[]).unwrap();
        let seed = SqliteStore::<Book>::connect(&config.store, key).await.unwrap();
        sqlx::query("CREATE TABLE books (id INTEGER PRIMARY KEY, title TEXT NOT NULL)")
            .execute(seed.pool())
            .await
            .unwrap();
        seed.close().await;

        let output = IngestPipeline::new(config).run().await.unwrap();

        assert_eq!(output.summary.total(), 5);
        assert_eq!(output.summary.store_errors(), 5);
        assert!(output.stored.contains("books in database unavailable"));
    }

    #[tokio::test]
    async fn test_unopenable_store_is_terminal() {
        let mut config = IngestConfig::for_entity(EntityKind::Books);
        config.store = "/no/such/dir/books.db".to_string();

        let err = IngestPipeline::new(config).run().await.unwrap_err();
        assert!(matches!(err, EtlError::StoreUnavailable { .. }));
    }
}
