use anyhow::Result;
use httpmock::prelude::*;
use small_ingest::core::{DedupKey, RecordSource, Store, StoreErrorReason, StoredEntity};
use small_ingest::domain::model::StoreResult;
use small_ingest::{
    Book, CsvFileSource, EntityKind, EtlError, ImportEngine, IngestConfig, IngestPipeline,
    KeySelector, RawCandidate, SqliteStore, User,
};
use tempfile::TempDir;

fn store_path(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_str().unwrap().to_string()
}

#[tokio::test]
async fn test_api_books_end_to_end_and_rerun() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/books");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([
                {"title": "1984", "author": "Orwell", "year": 1949}
            ]));
    });

    let config = IngestConfig {
        entity: EntityKind::Books,
        source: server.url("/books"),
        store: store_path(&temp_dir, "books.db"),
        key_fields: vec![],
        display_limit: None,
    };

    let first = IngestPipeline::new(config.clone()).run().await?;
    assert_eq!(first.summary.inserted(), 1);
    assert_eq!(first.summary.total(), 1);
    assert!(first.summary.render().contains("Skipped (duplicate):  0"));

    let second = IngestPipeline::new(config).run().await?;
    assert_eq!(second.summary.inserted(), 0);
    assert_eq!(second.summary.skipped_duplicate(), 1);
    assert!(second.stored.contains("1984"));

    api_mock.assert_hits(2);
    Ok(())
}

#[tokio::test]
async fn test_csv_users_with_duplicate_and_invalid_rows() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let csv_path = temp_dir.path().join("users.csv");

    let mut csv = String::from("name,email\n");
    for i in 1..=20 {
        csv.push_str(&format!("User {},user{}@example.com\n", i, i));
    }
    csv.push_str("Duplicate User,user1@example.com\n");
    csv.push_str(",nameless@example.com\n");
    tokio::fs::write(&csv_path, csv).await?;

    let config = IngestConfig {
        entity: EntityKind::Users,
        source: csv_path.to_str().unwrap().to_string(),
        store: store_path(&temp_dir, "users.db"),
        key_fields: vec![],
        display_limit: None,
    };

    let output = IngestPipeline::new(config.clone()).run().await?;

    assert_eq!(output.summary.total(), 22);
    assert_eq!(output.summary.inserted(), 20);
    assert_eq!(output.summary.skipped_duplicate(), 1);
    assert_eq!(output.summary.rejected(), 1);
    assert_eq!(output.summary.store_errors(), 0);
    assert_eq!(output.summary.issues()[0].position, 22);
    // users show the first 10 rows by default
    assert!(output.stored.contains("(10 shown)"));

    let rerun = IngestPipeline::new(config).run().await?;
    assert_eq!(rerun.summary.inserted(), 0);
    assert_eq!(rerun.summary.skipped_duplicate(), 21);
    assert_eq!(rerun.summary.rejected(), 1);
    Ok(())
}

#[tokio::test]
async fn test_api_failure_is_terminal_and_store_untouched() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/failed");
        then.status(503);
    });

    let config = IngestConfig {
        entity: EntityKind::Books,
        source: server.url("/failed"),
        store: store_path(&temp_dir, "books.db"),
        key_fields: vec![],
        display_limit: None,
    };

    let err = IngestPipeline::new(config.clone()).run().await.unwrap_err();
    assert!(matches!(err, EtlError::SourceError { .. }));
    assert_eq!(err.exit_code(), 2);

    let key = KeySelector::for_entity::<Book>(&[])?;
    let store = SqliteStore::<Book>::connect(&config.store, key).await?;
    assert!(store.query_all().await?.is_empty());
    Ok(())
}

/// Reports every key as absent, so duplicates are only caught by the constraint.
struct BlindCheckStore(SqliteStore<User>);

#[async_trait::async_trait]
impl Store<User> for BlindCheckStore {
    async fn ensure_schema(&self) -> small_ingest::Result<()> {
        self.0.ensure_schema().await
    }

    async fn exists(&self, _key: &DedupKey) -> StoreResult<bool> {
        Ok(false)
    }

    async fn insert(&self, record: &User) -> StoreResult<StoredEntity<User>> {
        self.0.insert(record).await
    }

    async fn query_all(&self) -> small_ingest::Result<Vec<StoredEntity<User>>> {
        self.0.query_all().await
    }

    async fn query_page(&self, limit: usize) -> small_ingest::Result<Vec<StoredEntity<User>>> {
        self.0.query_page(limit).await
    }
}

#[tokio::test]
async fn test_constraint_race_is_counted_as_duplicate() -> Result<()> {
    let key = KeySelector::for_entity::<User>(&[])?;
    let store = BlindCheckStore(SqliteStore::connect(":memory:", key.clone()).await?);
    store.ensure_schema().await?;

    let candidates = vec![
        RawCandidate::new().with("name", "A").with("email", "a@x.com"),
        RawCandidate::new().with("name", "B").with("email", "a@x.com"),
    ];
    let summary = ImportEngine::new(&store, &key).import_all(candidates).await?;

    assert_eq!(summary.inserted(), 1);
    assert_eq!(summary.skipped_duplicate(), 1);
    assert_eq!(summary.store_errors(), 0);
    assert_eq!(
        store.insert(&User {
            name: "C".to_string(),
            email: "a@x.com".to_string(),
        })
        .await
        .unwrap_err(),
        StoreErrorReason::UniquenessViolation
    );
    Ok(())
}

#[tokio::test]
async fn test_compound_key_allows_same_title_different_author() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let csv_path = temp_dir.path().join("books.csv");
    tokio::fs::write(
        &csv_path,
        "title,author,year\nPoems,Emily Dickinson,1890\nPoems,Robert Frost,\nPoems,Emily Dickinson,1890\nBad Year,Nobody,soon\n",
    )
    .await?;

    let source = CsvFileSource::new(&csv_path);
    let candidates = source.fetch().await?;

    let key = KeySelector::for_entity::<Book>(&["title".to_string(), "author".to_string()])?;
    let store = SqliteStore::<Book>::connect(&store_path(&temp_dir, "books.db"), key.clone()).await?;
    store.ensure_schema().await?;

    let summary = ImportEngine::new(&store, &key).import_all(candidates).await?;

    assert_eq!(summary.inserted(), 2);
    assert_eq!(summary.skipped_duplicate(), 1);
    assert_eq!(summary.rejected(), 1);

    let rows = store.query_all().await?;
    assert_eq!(rows[1].record.author, "Robert Frost");
    assert_eq!(rows[1].record.year, None);
    Ok(())
}

#[tokio::test]
async fn test_legacy_row_with_blank_author_does_not_fail_the_run() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = IngestConfig {
        entity: EntityKind::Books,
        source: "demo".to_string(),
        store: store_path(&temp_dir, "books.db"),
        key_fields: vec![],
        display_limit: None,
    };

    // table and row as the older tool wrote them, without the unique index
    let key = KeySelector::for_entity::<Book>(&[])?;
    let seed = SqliteStore::<Book>::connect(&config.store, key).await?;
    sqlx::query("CREATE TABLE books (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL, author TEXT NOT NULL, year INTEGER)")
        .execute(seed.pool())
        .await?;
    sqlx::query("INSERT INTO books (title, author, year) VALUES ('Old', '', 1900)")
        .execute(seed.pool())
        .await?;
    seed.close().await;

    let output = IngestPipeline::new(config).run().await?;

    assert_eq!(output.summary.inserted(), 5);
    assert_eq!(output.summary.store_errors(), 0);
    assert!(output.stored.contains("(6 shown)"));
    assert!(output.stored.contains("Old"));
    Ok(())
}
