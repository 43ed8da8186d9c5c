//! Canonical record shapes produced by the catalog providers.

use serde::{Deserialize, Serialize};

/// Source tag carried by every ModelDB record.
pub const MODEL_DB_SOURCE: &str = "ModelDB";

/// Source tag carried by every NeuroMorpho record.
pub const NEURO_MORPHO_SOURCE: &str = "Neuro Morpho";

/// A computational model harvested from ModelDB.
///
/// Sequence fields are always present: a field missing upstream becomes an
/// empty vector. Only `readme_link` is allowed to be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Namespaced identifier, `model_db-<id>`.
    pub source_id: String,
    /// Upstream numeric id rendered as a string.
    pub id: String,
    pub class_id: Option<u64>,
    pub name: String,
    pub description: String,
    pub channels: Vec<String>,
    pub cell_types: Vec<String>,
    pub page_link: String,
    /// Zip download link scraped from the model page, empty when not found.
    pub download_link: String,
    pub model_types: Vec<String>,
    pub model_concepts: Vec<String>,
    pub modeling_applications: Vec<String>,
    pub papers: Vec<String>,
    pub readme_link: Option<String>,
    pub model_files: Vec<ModelFile>,
    pub source: String,
}

/// A `.mod` source file resolved to its downloadable URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFile {
    /// Lowercased anchor label as shown in the file tree.
    pub label: String,
    pub url: String,
}

/// A neuron reconstruction harvested from NeuroMorpho.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuronRecord {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub archive: String,
    pub region: String,
    /// Second brain region, empty when fewer than two are listed.
    pub secondary_region: String,
    pub cell_type: String,
    /// Second cell type, empty when fewer than two are listed.
    pub secondary_cell_type: String,
    pub species: String,
    pub icon_url: String,
    pub self_link: String,
    pub original_format: String,
    /// Download URL of the source-version file, built from archive and name.
    pub derived_download_url: String,
    pub page_link: String,
    pub protocol: String,
    pub morphologies: Vec<String>,
    pub structural_domains: Vec<String>,
    pub source: String,
}

/// Errors raised while talking to an upstream catalog.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CatalogError {
    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn decode(url: &str, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.to_string(),
            source,
        }
    }
}

/// Convenience result type.
pub type CatalogResult<T> = Result<T, CatalogError>;
