use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// A loosely typed record exactly as the source produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub data: HashMap<String, serde_json::Value>,
}

impl RawCandidate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` unless `value` is a JSON object.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(obj) => Some(Self {
                data: obj.into_iter().collect(),
            }),
            _ => None,
        }
    }

    pub fn with(mut self, field: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.data.get(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

impl Column {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Text,
            required: true,
        }
    }

    pub const fn optional_integer(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Integer,
            required: false,
        }
    }
}

/// Why a candidate could not be turned into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("missing required field '{field}'")]
    MissingField { field: String },

    #[error("field '{field}' expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },
}

/// A strongly typed record that can be persisted in its own table.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    const TABLE: &'static str;
    /// Data columns in storage order; the identity column is implicit.
    const COLUMNS: &'static [Column];
    const DEFAULT_KEY: &'static [&'static str];
    /// Rows shown after an import; `None` shows every row.
    const DISPLAY_LIMIT: Option<usize>;

    fn normalize(raw: &RawCandidate) -> std::result::Result<Self, RejectReason>;

    /// Builds a record from stored column values without rejecting anything.
    /// Used for rows written before the current validation rules.
    fn from_stored(raw: &RawCandidate) -> Self;

    fn value(&self, column: &str) -> FieldValue;

    fn values(&self) -> Vec<FieldValue> {
        Self::COLUMNS.iter().map(|c| self.value(c.name)).collect()
    }

    /// Candidates served by the built-in `demo` source.
    fn sample_candidates() -> Vec<RawCandidate> {
        Vec::new()
    }
}

/// Identifies the logical entity a record stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    parts: Vec<(String, FieldValue)>,
}

impl DedupKey {
    pub fn parts(&self) -> &[(String, FieldValue)] {
        &self.parts
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (column, value)) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", column, value)?;
        }
        Ok(())
    }
}

/// Ordered list of columns that make up the dedup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySelector {
    columns: Vec<String>,
}

impl KeySelector {
    /// Falls back to `E::DEFAULT_KEY` when `fields` is empty. Every field must be a
    /// required column of `E`, so a key can never contain NULL.
    pub fn for_entity<E: Entity>(fields: &[String]) -> Result<Self> {
        let columns: Vec<String> = if fields.is_empty() {
            E::DEFAULT_KEY.iter().map(|c| c.to_string()).collect()
        } else {
            fields.iter().map(|f| f.trim().to_string()).collect()
        };

        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "dedup.key_fields".to_string(),
                    value: name.clone(),
                    reason: format!("column '{}' is listed more than once", name),
                });
            }
        }

        for name in &columns {
            match E::COLUMNS.iter().find(|c| c.name == name.as_str()) {
                Some(column) if column.required => {}
                Some(_) => {
                    return Err(EtlError::InvalidConfigValueError {
                        field: "dedup.key_fields".to_string(),
                        value: name.clone(),
                        reason: format!("column '{}' is nullable and cannot be a key", name),
                    })
                }
                None => {
                    return Err(EtlError::InvalidConfigValueError {
                        field: "dedup.key_fields".to_string(),
                        value: name.clone(),
                        reason: format!("'{}' has no column named '{}'", E::TABLE, name),
                    })
                }
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn key_for<E: Entity>(&self, record: &E) -> DedupKey {
        DedupKey {
            parts: self
                .columns
                .iter()
                .map(|c| (c.clone(), record.value(c)))
                .collect(),
        }
    }
}

/// A persisted row: engine-assigned identity plus the record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntity<E> {
    pub id: i64,
    pub record: E,
}

/// Per-record store failure. Only `Unavailable` ends a pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreErrorReason {
    #[error("uniqueness constraint violated")]
    UniquenessViolation,

    #[error("write failed: {0}")]
    Write(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreErrorReason>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Inserted { id: i64 },
    SkippedDuplicate { key: DedupKey },
    Rejected(RejectReason),
    StoreError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Inserted,
    SkippedDuplicate,
    Rejected,
    StoreError,
}

impl ImportOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            ImportOutcome::Inserted { .. } => OutcomeKind::Inserted,
            ImportOutcome::SkippedDuplicate { .. } => OutcomeKind::SkippedDuplicate,
            ImportOutcome::Rejected(_) => OutcomeKind::Rejected,
            ImportOutcome::StoreError(_) => OutcomeKind::StoreError,
        }
    }
}
