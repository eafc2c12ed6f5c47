use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::chunk::Strategy;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            collection: default_collection(),
        }
    }
}

fn default_store_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_collection() -> String {
    "brain".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub chunk_overlap: usize,
    #[serde(default)]
    pub strip_whitespace: bool,
    /// Percentile of adjacent-sentence distances used as the semantic
    /// breakpoint threshold.
    #[serde(default = "default_breakpoint_percentile")]
    pub breakpoint_percentile: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            chunk_size: default_chunk_size(),
            chunk_overlap: 0,
            strip_whitespace: false,
            breakpoint_percentile: default_breakpoint_percentile(),
        }
    }
}

fn default_strategy() -> String {
    "character".to_string()
}
fn default_chunk_size() -> usize {
    100
}
fn default_breakpoint_percentile() -> f64 {
    95.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    /// Dot-prefixed, lowercase extensions of files to ingest.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Extra glob patterns excluded on top of any discovered ignore files.
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec![".md".to_string(), ".txt".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider (default `http://localhost:11434`).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            url: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7331".to_string()
}

/// All-defaults configuration, used when no config file is present.
impl Config {
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.chunk_overlap must be < chunking.chunk_size");
    }
    if !(0.0..=100.0).contains(&config.chunking.breakpoint_percentile)
        || config.chunking.breakpoint_percentile == 0.0
    {
        anyhow::bail!("chunking.breakpoint_percentile must be in (0.0, 100.0]");
    }

    // Reject unknown strategy names at load time, not inside a run.
    Strategy::from_str(&config.chunking.strategy)?;

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "local" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }

    if matches!(config.embedding.provider.as_str(), "openai" | "ollama") {
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_passes_validation() {
        let config = Config::minimal();
        assert!(validate(&config).is_ok());
        assert_eq!(config.store.collection, "brain");
        assert_eq!(config.chunking.chunk_size, 100);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.embedding.provider, "disabled");
        assert_eq!(config.discovery.extensions, vec![".md", ".txt"]);
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let config: Config = toml::from_str("[chunking]\nchunk_size = 0\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let config: Config =
            toml::from_str("[chunking]\nchunk_size = 10\nchunk_overlap = 10\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_strategy_rejected() {
        let config: Config = toml::from_str("[chunking]\nstrategy = \"token\"\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn openai_provider_requires_model_and_dims() {
        let config: Config = toml::from_str("[embedding]\nprovider = \"openai\"\n").unwrap();
        assert!(validate(&config).is_err());
    }
}
