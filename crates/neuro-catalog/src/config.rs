//! Endpoint configuration and environment overrides.
//!
//! Only hosts and transport limits are configurable here. The business
//! filters applied by each provider (modeling application, brain region,
//! facet predicates) are fixed in the provider modules.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Configuration for both providers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub model_db: ModelDbConfig,
    pub neuro_morpho: NeuroMorphoConfig,
}

/// ModelDB endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelDbConfig {
    /// REST API root, e.g. `http://modeldb.science/api/v1`.
    pub api_base: String,
    /// Host serving the HTML model pages. Relative links found on those
    /// pages are made absolute against this host.
    pub html_host: String,
    /// Path of the model page below `html_host`.
    pub show_model_path: String,
}

impl Default for ModelDbConfig {
    fn default() -> Self {
        Self {
            api_base: "http://modeldb.science/api/v1".to_string(),
            html_host: "https://senselab.med.yale.edu".to_string(),
            show_model_path: "/modeldb/ShowModel".to_string(),
        }
    }
}

/// NeuroMorpho endpoints and limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NeuroMorphoConfig {
    /// REST API root, e.g. `http://neuromorpho.org/api`.
    pub api_base: String,
    /// Public site used to build page and download links.
    pub site_base: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Page size used when enumerating facet values.
    pub facet_page_size: usize,
}

impl Default for NeuroMorphoConfig {
    fn default() -> Self {
        Self {
            api_base: "http://neuromorpho.org/api".to_string(),
            site_base: "http://neuromorpho.org".to_string(),
            timeout_secs: 30,
            facet_page_size: 100,
        }
    }
}

impl NeuroMorphoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CatalogConfig {
    /// Build a config from defaults, overridden by environment variables.
    ///
    /// Recognised variables: `MODELDB_API_BASE`, `MODELDB_HTML_HOST`,
    /// `NEUROMORPHO_API_BASE`, `NEUROMORPHO_SITE_BASE`,
    /// `NEUROMORPHO_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(base) = lookup("MODELDB_API_BASE") {
            config.model_db.api_base = checked_base("MODELDB_API_BASE", &base)?;
        }
        if let Some(host) = lookup("MODELDB_HTML_HOST") {
            config.model_db.html_host = checked_base("MODELDB_HTML_HOST", &host)?;
        }
        if let Some(base) = lookup("NEUROMORPHO_API_BASE") {
            config.neuro_morpho.api_base = checked_base("NEUROMORPHO_API_BASE", &base)?;
        }
        if let Some(base) = lookup("NEUROMORPHO_SITE_BASE") {
            config.neuro_morpho.site_base = checked_base("NEUROMORPHO_SITE_BASE", &base)?;
        }
        if let Some(secs) = lookup("NEUROMORPHO_TIMEOUT_SECS") {
            config.neuro_morpho.timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("NEUROMORPHO_TIMEOUT_SECS is not a number: {secs}"))?;
        }

        Ok(config)
    }
}

/// Validate a base URL and strip its trailing slash.
fn checked_base(key: &str, value: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    url::Url::parse(trimmed).with_context(|| format!("{key} is not a valid URL: {value}"))?;
    Ok(trimmed.to_string())
}
