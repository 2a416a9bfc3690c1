use crate::domain::model::{
    ColumnKind, DedupKey, Entity, FieldValue, KeySelector, RawCandidate, StoreErrorReason,
    StoreResult, StoredEntity,
};
use crate::domain::ports::Store;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, TypeInfo, ValueRef};
use std::marker::PhantomData;
use std::str::FromStr;

/// One entity table in a SQLite database.
pub struct SqliteStore<E: Entity> {
    pool: SqlitePool,
    key: KeySelector,
    _entity: PhantomData<E>,
}

impl<E: Entity> SqliteStore<E> {
    /// Opens `location`, creating the file if needed. `:memory:` opens a private
    /// in-memory database held by a single connection.
    pub async fn connect(location: &str, key: KeySelector) -> Result<Self> {
        let unavailable = |e: sqlx::Error| EtlError::StoreUnavailable {
            message: format!("cannot open '{}': {}", location, e),
        };

        let options = if location == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(unavailable)?
        } else {
            SqliteConnectOptions::new()
                .filename(location)
                .create_if_missing(true)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(unavailable)?;

        tracing::debug!("Opened SQLite store at {}", location);
        Ok(Self::from_pool(pool, key))
    }

    /// Wraps a pool owned by the caller.
    pub fn from_pool(pool: SqlitePool, key: KeySelector) -> Self {
        Self {
            pool,
            key,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn column_list() -> String {
        E::COLUMNS
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn create_table_sql() -> String {
        let mut columns = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        for column in E::COLUMNS {
            let kind = match column.kind {
                ColumnKind::Text => "TEXT",
                ColumnKind::Integer => "INTEGER",
            };
            let null = if column.required { " NOT NULL" } else { "" };
            columns.push(format!("{} {}{}", column.name, kind, null));
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            E::TABLE,
            columns.join(", ")
        )
    }

    fn unique_index_name(&self) -> String {
        format!("ux_{}_{}", E::TABLE, self.key.columns().join("_"))
    }

    fn unique_index_sql(&self) -> String {
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
            self.unique_index_name(),
            E::TABLE,
            self.key.columns().join(", ")
        )
    }

    /// Unique indexes on the table other than the one for the current key,
    /// e.g. left behind by a run with a different key selector.
    pub async fn other_unique_indexes(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM pragma_index_list(?) WHERE \"unique\" = 1 AND origin = 'c' AND name != ? ORDER BY name",
        )
        .bind(E::TABLE)
        .bind(self.unique_index_name())
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    fn select_sql() -> String {
        format!(
            "SELECT id, {} FROM {} ORDER BY id",
            Self::column_list(),
            E::TABLE
        )
    }

    /// Reads a column by the type of the stored value rather than the declared
    /// column type, since legacy rows may hold text in an INTEGER column.
    fn read_column(row: &SqliteRow, name: &str) -> Result<serde_json::Value> {
        let (is_null, stored_type) = {
            let value = row.try_get_raw(name)?;
            (value.is_null(), value.type_info().name().to_string())
        };
        if is_null {
            return Ok(serde_json::Value::Null);
        }
        let value = if stored_type == "INTEGER" {
            serde_json::Value::from(row.try_get_unchecked::<i64, _>(name)?)
        } else {
            serde_json::Value::from(row.try_get_unchecked::<String, _>(name)?)
        };
        Ok(value)
    }

    fn decode_row(row: &SqliteRow) -> Result<StoredEntity<E>> {
        let id: i64 = row.try_get("id")?;
        let mut raw = RawCandidate::new();
        for column in E::COLUMNS {
            let value = Self::read_column(row, column.name)?;
            raw.data.insert(column.name.to_string(), value);
        }

        let record = match E::normalize(&raw) {
            Ok(record) => record,
            Err(reason) => {
                tracing::warn!(
                    "Row {} of '{}' does not pass validation ({}); showing it as stored",
                    id,
                    E::TABLE,
                    reason
                );
                E::from_stored(&raw)
            }
        };
        Ok(StoredEntity { id, record })
    }

    async fn fetch(&self, sql: &str, limit: Option<usize>) -> Result<Vec<StoredEntity<E>>> {
        let rows = match limit {
            Some(limit) => {
                let sql = format!("{} LIMIT ?", sql);
                sqlx::query(&sql)
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => sqlx::query(sql).fetch_all(&self.pool).await?,
        };
        rows.iter().map(Self::decode_row).collect()
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: FieldValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        FieldValue::Null => query.bind(None::<i64>),
        FieldValue::Integer(v) => query.bind(v),
        FieldValue::Text(v) => query.bind(v),
    }
}

/// Maps a driver error onto the importer's per-record taxonomy.
pub fn classify_error(err: sqlx::Error) -> StoreErrorReason {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreErrorReason::UniquenessViolation
        }
        sqlx::Error::Database(db) => StoreErrorReason::Write(db.message().to_string()),
        other @ (sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::Configuration(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed) => StoreErrorReason::Unavailable(other.to_string()),
        other => StoreErrorReason::Write(other.to_string()),
    }
}

#[async_trait]
impl<E: Entity> Store<E> for SqliteStore<E> {
    async fn ensure_schema(&self) -> Result<()> {
        let unavailable = |e: sqlx::Error| EtlError::StoreUnavailable {
            message: format!("cannot prepare table '{}': {}", E::TABLE, e),
        };

        sqlx::query(&Self::create_table_sql())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        sqlx::query(&self.unique_index_sql())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        match self.other_unique_indexes().await {
            Ok(others) if !others.is_empty() => tracing::warn!(
                "'{}' also has unique indexes {:?}; they still reject rows the key ({}) would allow",
                E::TABLE,
                others,
                self.key.columns().join(", ")
            ),
            Ok(_) => {}
            Err(e) => tracing::debug!("Could not list indexes of '{}': {}", E::TABLE, e),
        }

        tracing::debug!(
            "Schema ready for '{}' with unique key ({})",
            E::TABLE,
            self.key.columns().join(", ")
        );
        Ok(())
    }

    async fn exists(&self, key: &DedupKey) -> StoreResult<bool> {
        let conditions = key
            .parts()
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {})",
            E::TABLE,
            conditions
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in key.parts() {
            query = bind_value(query, value.clone());
        }

        let row = query.fetch_one(&self.pool).await.map_err(classify_error)?;
        row.try_get::<bool, _>(0).map_err(classify_error)
    }

    async fn insert(&self, record: &E) -> StoreResult<StoredEntity<E>> {
        let placeholders = vec!["?"; E::COLUMNS.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            Self::column_list(),
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for value in record.values() {
            query = bind_value(query, value);
        }

        let result = query.execute(&self.pool).await.map_err(classify_error)?;
        Ok(StoredEntity {
            id: result.last_insert_rowid(),
            record: record.clone(),
        })
    }

    async fn query_all(&self) -> Result<Vec<StoredEntity<E>>> {
        self.fetch(&Self::select_sql(), None).await
    }

    async fn query_page(&self, limit: usize) -> Result<Vec<StoredEntity<E>>> {
        self.fetch(&Self::select_sql(), Some(limit)).await
    }
}
