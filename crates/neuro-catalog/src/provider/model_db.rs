//! ModelDB provider.
//!
//! Pipeline per search:
//! 1. list every model id for the NEURON modeling application,
//! 2. per id, fetch the structured record from the REST API,
//! 3. scrape the HTML model page for the zip link, the readme link and the
//!    `.mod` files (each `.mod` file needs a second page to resolve its
//!    download URL),
//! 4. normalize, keep hippocampal models only.
//!
//! A failure on one id is logged and the loop moves on. Only the id listing
//! can fail the whole search. Calls are issued one at a time.

use super::{check_page_size, Provider};
use crate::acquisition::http_client::HttpClient;
use crate::acquisition::scrape::{absolutize, HttpPageScraper, PageScraper};
use crate::config::ModelDbConfig;
use crate::types::{CatalogError, CatalogResult, ModelFile, ModelRecord, MODEL_DB_SOURCE};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub const ID_PREFIX: &str = "model_db";

const MODELING_APPLICATION: &str = "NEURON";
const REGION_KEY: &str = "hippocampus";

const DOWNLOAD_ANCHOR_ID: &str = "downloadmodelzip";
const FILE_TREE_ID: &str = "filetreetable";
const FILE_DOWNLOAD_ID: &str = "downloadzip2";

/// Links scraped from the HTML side of ModelDB for one model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxiliaryLinks {
    pub download_link: Option<String>,
    pub readme_link: Option<String>,
    pub model_files: Vec<ModelFile>,
}

pub struct ModelDbProvider<S = HttpPageScraper> {
    config: ModelDbConfig,
    api: HttpClient,
    scraper: S,
}

impl ModelDbProvider<HttpPageScraper> {
    pub fn new(config: ModelDbConfig) -> Self {
        Self::with_scraper(config, HttpPageScraper::new())
    }
}

impl<S: PageScraper> ModelDbProvider<S> {
    /// Build a provider around a custom page scraper.
    pub fn with_scraper(config: ModelDbConfig, scraper: S) -> Self {
        Self {
            config,
            // ModelDB calls are not bounded in time.
            api: HttpClient::new(None),
            scraper,
        }
    }

    async fn list_ids(&self) -> CatalogResult<Vec<u64>> {
        let url = format!(
            "{}/models?modeling_application={MODELING_APPLICATION}",
            self.config.api_base
        );
        self.api.get_json(&url).await
    }

    async fn fetch_detail(&self, id: u64) -> Option<Value> {
        let url = format!("{}/models/{id}", self.config.api_base);
        match self.api.get_json(&url).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                tracing::warn!("model {id} detail unavailable: {e}");
                None
            }
        }
    }

    fn model_page_url(&self, id: u64, tab: u8) -> String {
        format!(
            "{}{}?model={id}#tabs-{tab}",
            self.config.html_host, self.config.show_model_path
        )
    }

    /// Run the three HTML lookups for one model, in order.
    pub async fn fetch_auxiliary(&self, id: u64) -> AuxiliaryLinks {
        AuxiliaryLinks {
            download_link: self.download_link(id).await,
            readme_link: self.readme_link(id).await,
            model_files: self.model_files(id).await,
        }
    }

    async fn download_link(&self, id: u64) -> Option<String> {
        let anchor = self
            .scraper
            .scrape(&self.model_page_url(id, 1), DOWNLOAD_ANCHOR_ID)
            .await?;
        let href = anchor.href?;
        Some(absolutize(&href, &self.config.html_host))
    }

    async fn readme_link(&self, id: u64) -> Option<String> {
        let table = self
            .scraper
            .scrape(&self.model_page_url(id, 2), FILE_TREE_ID)
            .await?;
        table
            .anchors
            .into_iter()
            .filter(|a| a.has_text_token("readme"))
            .find_map(|a| a.href)
            .map(|href| absolutize(&href, &self.config.html_host))
    }

    async fn model_files(&self, id: u64) -> Vec<ModelFile> {
        let Some(table) = self
            .scraper
            .scrape(&self.model_page_url(id, 2), FILE_TREE_ID)
            .await
        else {
            return Vec::new();
        };

        let mut files = Vec::new();
        for anchor in table.anchors {
            let Some(label) = anchor.label() else {
                continue;
            };
            if !label.contains(".mod") {
                continue;
            }
            let Some(href) = anchor.href else {
                continue;
            };
            let file_page = absolutize(&href, &self.config.html_host);
            // Files whose download page cannot be resolved are left out.
            if let Some(url) = self.resolve_file_download(&file_page).await {
                files.push(ModelFile { label, url });
            }
        }
        files
    }

    async fn resolve_file_download(&self, file_page: &str) -> Option<String> {
        let button = self.scraper.scrape(file_page, FILE_DOWNLOAD_ID).await?;
        let href = button.href?;
        Some(absolutize(&href, &self.config.html_host))
    }
}

#[async_trait]
impl<S: PageScraper> Provider for ModelDbProvider<S> {
    type Record = ModelRecord;

    fn source(&self) -> &str {
        MODEL_DB_SOURCE
    }

    fn id_prefix(&self) -> &str {
        ID_PREFIX
    }

    async fn search(&self, offset: usize, page_size: usize) -> CatalogResult<Vec<ModelRecord>> {
        check_page_size(page_size)?;
        tracing::debug!("model_db search offset={offset} page_size={page_size} (full listing)");

        let ids = self.list_ids().await?;
        tracing::info!("model_db listed {} model ids", ids.len());

        let mut records = Vec::new();
        for id in ids {
            let Some(detail) = self.fetch_detail(id).await else {
                continue;
            };
            let links = self.fetch_auxiliary(id).await;
            let page_link = self.model_page_url(id, 1);

            let record = match normalize(detail, links, page_link) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("exception with model {id}: {e}");
                    continue;
                }
            };

            if !is_from_region(&record) {
                continue;
            }
            if record.cell_types.len() > 1 {
                tracing::debug!("more than 1 neurons {}", record.id);
            }
            records.push(record);
        }

        tracing::info!("model_db search kept {} models", records.len());
        Ok(records)
    }
}

// ── Raw payload ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawModel {
    id: u64,
    name: String,
    #[serde(default)]
    class_id: Option<u64>,
    #[serde(default)]
    notes: Option<RawNotes>,
    #[serde(default)]
    neurons: Option<RawAttribute>,
    #[serde(default)]
    model_paper: Option<RawAttribute>,
    #[serde(default)]
    currents: Option<RawAttribute>,
    #[serde(default)]
    model_type: Option<RawAttribute>,
    #[serde(default)]
    model_concept: Option<RawAttribute>,
    #[serde(default)]
    modeling_application: Option<RawAttribute>,
}

#[derive(Debug, Deserialize)]
struct RawNotes {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAttribute {
    #[serde(default)]
    value: Option<Vec<RawObject>>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    object_name: String,
}

fn object_names(attr: Option<RawAttribute>) -> Vec<String> {
    attr.and_then(|a| a.value)
        .unwrap_or_default()
        .into_iter()
        .map(|o| o.object_name)
        .collect()
}

/// Map a raw ModelDB detail object plus its scraped links into a record.
///
/// Missing optional fields become empty; a missing `id` or `name` fails the
/// whole item.
pub fn normalize(
    detail: Value,
    links: AuxiliaryLinks,
    page_link: String,
) -> CatalogResult<ModelRecord> {
    let raw: RawModel =
        serde_json::from_value(detail).map_err(|e| CatalogError::Mapping(e.to_string()))?;

    let source_id = format!("{ID_PREFIX}-{}", raw.id);
    Ok(ModelRecord {
        source_id,
        id: raw.id.to_string(),
        class_id: raw.class_id,
        name: raw.name,
        description: raw.notes.and_then(|n| n.value).unwrap_or_default(),
        channels: object_names(raw.currents),
        cell_types: object_names(raw.neurons),
        page_link,
        download_link: links.download_link.unwrap_or_default(),
        model_types: object_names(raw.model_type),
        model_concepts: object_names(raw.model_concept),
        modeling_applications: object_names(raw.modeling_application),
        papers: object_names(raw.model_paper),
        readme_link: links.readme_link,
        model_files: links.model_files,
        source: MODEL_DB_SOURCE.to_string(),
    })
}

/// True when a cell type mentions the hippocampus, case-insensitively.
pub fn is_from_region(record: &ModelRecord) -> bool {
    record
        .cell_types
        .iter()
        .any(|cell| cell.to_lowercase().contains(REGION_KEY))
}
