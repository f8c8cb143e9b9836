//! Index configuration and on-disk layout.
//!
//! Everything lives under `.footprint/index/`:
//! - `config.yaml`: embedding, selection, planner and retry settings
//! - `vectors.sqlite`: the vector store
//! - `documents.sqlite`: the content store

use crate::context::{SelectionOptions, DEFAULT_DIVERSITY_CAP, DEFAULT_MAX_CHARS_PER_FRAGMENT};
use crate::planner::{Plan, PlannerPolicy};
use footprint_core::config::STATE_DIR;
use footprint_core::{AppError, AppResult};
use footprint_llm::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Embedding provider settings. `dimensions` is the store dimension `D`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// "ollama" or "mock"
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    /// Texts per embedding call
    pub batch_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 10,
            endpoint: None,
            timeout_secs: None,
        }
    }
}

/// Context selection policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionSettings {
    pub diversity_cap: usize,
    pub max_chars_per_fragment: usize,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            diversity_cap: DEFAULT_DIVERSITY_CAP,
            max_chars_per_fragment: DEFAULT_MAX_CHARS_PER_FRAGMENT,
        }
    }
}

/// Everything the retrieval pipeline reads from `.footprint/index/config.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    pub embedding: EmbeddingSettings,
    pub selection: SelectionSettings,
    pub planner: PlannerPolicy,
    pub retry: RetryPolicy,
}

impl IndexConfig {
    /// Load from the workspace, or defaults when no file exists.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        let path = config_path(workspace);

        if !path.exists() {
            tracing::debug!("No index config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            AppError::Config(format!("Failed to read index config {:?}: {}", path, e))
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(format!("Failed to parse index config {:?}: {}", path, e))
        })?;

        config.validate()?;
        tracing::debug!("Loaded index config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self, workspace: &Path) -> AppResult<()> {
        let path = config_path(workspace);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, serde_yaml::to_string(self)?).map_err(|e| {
            AppError::Config(format!("Failed to write index config {:?}: {}", path, e))
        })?;

        tracing::debug!("Saved index config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be positive".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding.batch_size must be positive".to_string(),
            ));
        }
        if self.selection.diversity_cap == 0 {
            return Err(AppError::Config(
                "selection.diversity_cap must be positive".to_string(),
            ));
        }
        if self.selection.max_chars_per_fragment == 0 {
            return Err(AppError::Config(
                "selection.max_chars_per_fragment must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Selection options for a plan: its categories and result count, this
    /// config's cap and budget.
    pub fn selection_options(&self, plan: &Plan) -> SelectionOptions {
        SelectionOptions {
            max_results: plan.max_results,
            max_chars_per_fragment: self.selection.max_chars_per_fragment,
            diversity_cap: self.selection.diversity_cap,
            eligible: Some(plan.eligible_categories.clone()),
        }
    }
}

/// `.footprint/index/`
pub fn index_dir(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join("index")
}

pub fn config_path(workspace: &Path) -> PathBuf {
    index_dir(workspace).join("config.yaml")
}

pub fn vectors_path(workspace: &Path) -> PathBuf {
    index_dir(workspace).join("vectors.sqlite")
}

pub fn documents_path(workspace: &Path) -> PathBuf {
    index_dir(workspace).join("documents.sqlite")
}
