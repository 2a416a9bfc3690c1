use crate::config::IngestConfig;
use crate::core::entities::EntityKind;
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineSection,
    pub source: Option<LocationSection>,
    pub store: Option<LocationSection>,
    pub dedup: Option<DedupSection>,
    pub display: Option<DisplaySection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    pub name: Option<String>,
    pub entity: EntityKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSection {
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupSection {
    pub key_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySection {
    pub limit: Option<usize>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
            message: format!("cannot read '{}': {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY}); unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn name(&self) -> &str {
        self.pipeline.name.as_deref().unwrap_or("ingest")
    }

    /// Missing sections fall back to the entity defaults.
    pub fn to_ingest_config(&self) -> IngestConfig {
        let mut config = IngestConfig::for_entity(self.pipeline.entity);
        if let Some(source) = &self.source {
            config.source = source.location.clone();
        }
        if let Some(store) = &self.store {
            config.store = store.location.clone();
        }
        if let Some(dedup) = &self.dedup {
            config.key_fields = dedup.key_fields.clone();
        }
        config.display_limit = self.display.as_ref().and_then(|d| d.limit);
        config
    }
}
