use crate::domain::model::RawCandidate;
use crate::domain::ports::RecordSource;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::path::PathBuf;

/// Fetches candidates from a JSON HTTP endpoint.
pub struct ApiSource {
    endpoint: String,
    client: Client,
}

impl ApiSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(endpoint, Client::new())
    }

    pub fn with_client(endpoint: impl Into<String>, client: Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }
}

#[async_trait]
impl RecordSource for ApiSource {
    fn describe(&self) -> String {
        self.endpoint.clone()
    }

    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        tracing::debug!("Making API request to: {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;
        tracing::debug!("API response status: {}", response.status());

        if !response.status().is_success() {
            return Err(EtlError::SourceError {
                source_name: self.describe(),
                message: format!("HTTP status {}", response.status()),
            });
        }

        let json_data: serde_json::Value = response.json().await?;
        match json_data {
            serde_json::Value::Array(items) => {
                let total = items.len();
                let records: Vec<RawCandidate> =
                    items.into_iter().filter_map(RawCandidate::from_json).collect();
                if records.len() < total {
                    tracing::warn!(
                        "Ignored {} non-object elements in API response",
                        total - records.len()
                    );
                }
                Ok(records)
            }
            obj @ serde_json::Value::Object(_) => Ok(RawCandidate::from_json(obj)
                .into_iter()
                .collect()),
            other => Err(EtlError::SourceError {
                source_name: self.describe(),
                message: format!("expected a JSON array or object, got {}", other),
            }),
        }
    }
}

/// Reads candidates from a CSV file with a header row.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for CsvFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        if !self.path.exists() {
            return Err(EtlError::SourceError {
                source_name: self.describe(),
                message: "file not found".to_string(),
            });
        }

        tracing::debug!("Reading CSV from {}", self.path.display());
        let content = tokio::fs::read(&self.path).await?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_slice());
        let headers = reader.headers()?.clone();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let data: HashMap<String, serde_json::Value> = headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.trim().to_string(), serde_json::Value::from(v)))
                .collect();
            records.push(RawCandidate { data });
        }
        Ok(records)
    }
}

/// Serves a fixed list of candidates.
pub struct StaticSource {
    name: String,
    records: Vec<RawCandidate>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, records: Vec<RawCandidate>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        Ok(self.records.clone())
    }
}
