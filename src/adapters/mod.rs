// Adapters layer: concrete record sources and the SQLite store.

pub mod sources;
pub mod sqlite_store;

pub use sources::{ApiSource, CsvFileSource, StaticSource};
pub use sqlite_store::SqliteStore;
