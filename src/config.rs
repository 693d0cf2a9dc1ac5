//! Configuration: store locations, batching and logging
//!
//! Resolution order for each setting:
//! 1. Command-line flag / environment variable (handled by the CLI)
//! 2. TOML config file
//! 3. Compiled defaults

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_SPARQL_ENDPOINT: &str = "http://127.0.0.1:9999/blazegraph/sparql";
pub const DEFAULT_DATABASE: &str = "relational.db";
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FederationConfig {
    pub graph: GraphConfig,
    pub relational: RelationalConfig,
    pub logging: LoggingConfig,
}

/// `[graph]` section: SPARQL endpoints holding DOAJ journals
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub endpoints: Vec<String>,

    /// Max ISSNs per `VALUES` block / triples per `INSERT DATA` request
    pub batch_size: usize,

    pub timeout_secs: u64,
}

/// `[relational]` section: SQLite files holding Scimago rankings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelationalConfig {
    pub databases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for FederationConfig {
    fn default() -> Self {
        FederationConfig {
            graph: GraphConfig::default(),
            relational: RelationalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            endpoints: vec![DEFAULT_SPARQL_ENDPOINT.to_string()],
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for RelationalConfig {
    fn default() -> Self {
        RelationalConfig {
            databases: vec![DEFAULT_DATABASE.to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl FederationConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FederationConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file; a missing file falls back to defaults with a warning
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            return Ok(FederationConfig::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.graph.batch_size == 0 {
            return Err(Error::Config("graph.batch_size must be at least 1".to_string()));
        }
        if self.graph.timeout_secs == 0 {
            return Err(Error::Config("graph.timeout_secs must be at least 1".to_string()));
        }
        if self.graph.endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(Error::Config("graph.endpoints contains a blank entry".to_string()));
        }
        if self.relational.databases.iter().any(|d| d.trim().is_empty()) {
            return Err(Error::Config(
                "relational.databases contains a blank entry".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace the SPARQL endpoints (CLI/env override)
    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        if !endpoints.is_empty() {
            self.graph.endpoints = endpoints;
        }
        self
    }

    /// Replace the SQLite databases (CLI/env override)
    pub fn with_databases(mut self, databases: Vec<String>) -> Self {
        if !databases.is_empty() {
            self.relational.databases = databases;
        }
        self
    }
}
