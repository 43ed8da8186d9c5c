//! NeuroMorpho provider.
//!
//! Two phases per search. First every value of four facets is enumerated
//! and narrowed to the values describing complete 3D reconstructions in
//! Neurolucida ASCII format. Then the faceted select endpoint is paged
//! through for hippocampal neurons matching those values.

use super::{check_page_size, Provider};
use crate::acquisition::http_client::HttpClient;
use crate::config::NeuroMorphoConfig;
use crate::filter::FacetFilter;
use crate::types::{CatalogError, CatalogResult, NeuronRecord, NEURO_MORPHO_SOURCE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ID_PREFIX: &str = "neuro_morpho";

const BRAIN_REGION: &str = "hippocampus";

/// A server-enumerable filter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Domain,
    OriginalFormat,
    Attributes,
    PhysicalIntegrity,
}

impl Facet {
    pub const ALL: [Facet; 4] = [
        Facet::Domain,
        Facet::OriginalFormat,
        Facet::Attributes,
        Facet::PhysicalIntegrity,
    ];

    /// Field name used by the NeuroMorpho API.
    pub fn field_name(self) -> &'static str {
        match self {
            Facet::Domain => "domain",
            Facet::OriginalFormat => "original_format",
            Facet::Attributes => "attributes",
            Facet::PhysicalIntegrity => "Physical_Integrity",
        }
    }

    /// Which of the facet's values are acceptable.
    pub fn filter(self) -> FacetFilter<'static> {
        match self {
            Facet::Domain => FacetFilter::exact(&["dendrites", "soma", "axon"], &[]),
            Facet::OriginalFormat => FacetFilter::substring(&[".asc"], &[]),
            Facet::Attributes => FacetFilter::exact(&["diameter", "3d", "angles"], &[]),
            Facet::PhysicalIntegrity => FacetFilter::exact(&["dendrites complete"], &["no axon"]),
        }
    }
}

/// Body of the faceted select request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectFilter {
    pub brain_region: Vec<String>,
    pub domain: Vec<String>,
    pub original_format: Vec<String>,
    pub attributes: Vec<String>,
    #[serde(rename = "Physical_Integrity")]
    pub physical_integrity: Vec<String>,
}

impl SelectFilter {
    fn values_mut(&mut self, facet: Facet) -> &mut Vec<String> {
        match facet {
            Facet::Domain => &mut self.domain,
            Facet::OriginalFormat => &mut self.original_format,
            Facet::Attributes => &mut self.attributes,
            Facet::PhysicalIntegrity => &mut self.physical_integrity,
        }
    }
}

pub struct NeuroMorphoProvider {
    config: NeuroMorphoConfig,
    client: HttpClient,
}

impl NeuroMorphoProvider {
    pub fn new(config: NeuroMorphoConfig) -> Self {
        let client = HttpClient::new(Some(config.timeout()));
        Self { config, client }
    }

    fn endpoint(&self, path: &str, page: usize, size: usize) -> CatalogResult<String> {
        let mut url = url::Url::parse(&format!("{}/{path}", self.config.api_base))
            .map_err(|e| CatalogError::InvalidInput(format!("bad NeuroMorpho endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());
        Ok(url.into())
    }

    /// Every value of one facet, across all of its pages.
    pub async fn field_values(&self, facet: Facet) -> CatalogResult<Vec<String>> {
        let path = format!("neuron/fields/{}", facet.field_name());
        let size = self.config.facet_page_size;

        let mut values = Vec::new();
        let mut page = 0;
        let mut total_pages = 1;
        let mut fetched = false;
        while page < total_pages || !fetched {
            let url = self.endpoint(&path, page, size)?;
            let resp: FieldsResponse = self.client.get_json(&url).await?;
            values.extend(resp.fields);
            // Without page metadata the first page is the only one.
            total_pages = resp.page.map_or(1, |p| p.total_pages);
            page += 1;
            fetched = true;
        }
        Ok(values)
    }

    /// Enumerate the four facets and keep their acceptable values.
    pub async fn discover_filter(&self) -> CatalogResult<SelectFilter> {
        let mut filter = SelectFilter {
            brain_region: vec![BRAIN_REGION.to_string()],
            ..SelectFilter::default()
        };
        for facet in Facet::ALL {
            let all = self.field_values(facet).await?;
            let kept = facet.filter().apply(&all);
            tracing::info!(
                "{} allowed values ({} of {}): {:?}",
                facet.field_name(),
                kept.len(),
                all.len(),
                kept
            );
            *filter.values_mut(facet) = kept;
        }
        Ok(filter)
    }

    async fn fetch_page(
        &self,
        page: usize,
        size: usize,
        filter: &SelectFilter,
    ) -> CatalogResult<SelectResponse> {
        let url = self.endpoint("neuron/select", page, size)?;
        self.client.post_json(&url, filter).await
    }

    fn map_neurons(&self, raw: Vec<Value>) -> Vec<NeuronRecord> {
        raw.into_iter()
            .filter_map(|item| match map_neuron(item, &self.config.site_base) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("exception on map neuron: {e}");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl Provider for NeuroMorphoProvider {
    type Record = NeuronRecord;

    fn source(&self) -> &str {
        NEURO_MORPHO_SOURCE
    }

    fn id_prefix(&self) -> &str {
        ID_PREFIX
    }

    async fn search(&self, offset: usize, page_size: usize) -> CatalogResult<Vec<NeuronRecord>> {
        check_page_size(page_size)?;
        let filter = self.discover_filter().await?;

        let mut records = Vec::new();
        let mut page = offset / page_size;
        let mut total_pages = 1;
        let mut fetched = false;
        // At least one request, even when the server reports zero pages.
        while page < total_pages || !fetched {
            match self.fetch_page(page, page_size, &filter).await {
                Ok(resp) => {
                    total_pages = resp.page.total_pages;
                    let neurons = resp.embedded.map(|e| e.neuron_resources).unwrap_or_default();
                    records.extend(self.map_neurons(neurons));
                }
                Err(e) => {
                    // The page bound only moves on a successful response.
                    tracing::warn!("exception retrieving page {page}: {e}");
                }
            }
            page += 1;
            fetched = true;
        }

        tracing::info!("neuro_morpho search returned {} neurons", records.len());
        Ok(records)
    }
}

// ── Raw payload ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "totalPages")]
    total_pages: usize,
}

#[derive(Debug, Deserialize)]
struct FieldsResponse {
    fields: Vec<String>,
    #[serde(default)]
    page: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    #[serde(rename = "_embedded", default)]
    embedded: Option<Embedded>,
    page: PageInfo,
}

#[derive(Debug, Deserialize)]
struct Embedded {
    #[serde(rename = "neuronResources", default)]
    neuron_resources: Vec<Value>,
}

/// Facet values arrive either as an array or as one comma-joined string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FacetValues {
    List(Vec<String>),
    Joined(String),
}

impl FacetValues {
    fn into_vec(self) -> Vec<String> {
        match self {
            FacetValues::List(values) => values,
            FacetValues::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawHref {
    href: String,
}

#[derive(Debug, Deserialize)]
struct RawLinks {
    #[serde(rename = "self")]
    self_link: RawHref,
}

#[derive(Debug, Deserialize)]
struct RawNeuron {
    neuron_id: u64,
    neuron_name: String,
    archive: String,
    original_format: String,
    #[serde(rename = "_links")]
    links: RawLinks,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    brain_region: Option<Vec<String>>,
    #[serde(default)]
    cell_type: Option<Vec<String>>,
    #[serde(default)]
    species: Option<String>,
    #[serde(default)]
    png_url: Option<String>,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    attributes: Option<FacetValues>,
    #[serde(default)]
    domain: Option<FacetValues>,
}

fn nth_or_empty(values: &[String], n: usize) -> String {
    values.get(n).cloned().unwrap_or_default()
}

/// Map one raw neuron resource into a record.
///
/// `site_base` is the public NeuroMorpho host used for the page and
/// download links.
pub fn map_neuron(raw: Value, site_base: &str) -> CatalogResult<NeuronRecord> {
    let raw: RawNeuron =
        serde_json::from_value(raw).map_err(|e| CatalogError::Mapping(e.to_string()))?;

    let regions = raw.brain_region.unwrap_or_default();
    let cell_types = raw.cell_type.unwrap_or_default();
    let extension = raw.original_format.rsplit('.').next().unwrap_or_default();

    let derived_download_url = format!(
        "{site_base}/dableFiles/{}/Source-Version/{}.{extension}",
        raw.archive.to_lowercase(),
        raw.neuron_name
    );
    let page_link = format!("{site_base}/neuron_info.jsp?neuron_name={}", raw.neuron_name);

    Ok(NeuronRecord {
        id: raw.neuron_id,
        description: raw.note.unwrap_or_default(),
        region: nth_or_empty(&regions, 0),
        secondary_region: nth_or_empty(&regions, 1),
        cell_type: nth_or_empty(&cell_types, 0),
        secondary_cell_type: nth_or_empty(&cell_types, 1),
        species: raw.species.unwrap_or_default(),
        icon_url: raw.png_url.unwrap_or_default(),
        self_link: raw.links.self_link.href,
        derived_download_url,
        page_link,
        protocol: raw.protocol.unwrap_or_default(),
        morphologies: raw.attributes.map(FacetValues::into_vec).unwrap_or_default(),
        structural_domains: raw.domain.map(FacetValues::into_vec).unwrap_or_default(),
        source: NEURO_MORPHO_SOURCE.to_string(),
        name: raw.neuron_name,
        archive: raw.archive,
        original_format: raw.original_format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_neuron() -> Value {
        json!({
            "neuron_id": 1042,
            "neuron_name": "n409",
            "archive": "Turner",
            "note": "Reconstructed from CA1",
            "brain_region": ["hippocampus", "CA1", "stratum radiatum"],
            "cell_type": ["pyramidal", "principal cell"],
            "species": "rat",
            "png_url": "http://neuromorpho.org/images/imageFiles/Turner/n409.png",
            "protocol": "in vitro",
            "original_format": "Neurolucida.asc",
            "domain": "Dendrites, Soma, Axon",
            "attributes": "Diameter, 3D, Angles",
            "_links": {"self": {"href": "http://neuromorpho.org/api/neuron/id/1042"}}
        })
    }

    #[test]
    fn test_map_neuron() {
        let record = map_neuron(raw_neuron(), "http://neuromorpho.org").unwrap();
        assert_eq!(record.id, 1042);
        assert_eq!(record.name, "n409");
        assert_eq!(record.region, "hippocampus");
        assert_eq!(record.secondary_region, "CA1");
        assert_eq!(record.cell_type, "pyramidal");
        assert_eq!(record.secondary_cell_type, "principal cell");
        assert_eq!(record.self_link, "http://neuromorpho.org/api/neuron/id/1042");
        assert_eq!(
            record.derived_download_url,
            "http://neuromorpho.org/dableFiles/turner/Source-Version/n409.asc"
        );
        assert_eq!(
            record.page_link,
            "http://neuromorpho.org/neuron_info.jsp?neuron_name=n409"
        );
        assert_eq!(record.morphologies, vec!["Diameter", "3D", "Angles"]);
        assert_eq!(record.structural_domains, vec!["Dendrites", "Soma", "Axon"]);
        assert_eq!(record.source, "Neuro Morpho");
    }

    #[test]
    fn test_map_neuron_single_region_and_cell_type() {
        let mut raw = raw_neuron();
        raw["brain_region"] = json!(["hippocampus"]);
        raw["cell_type"] = json!([]);
        raw["domain"] = json!(["Dendrites", "Soma"]);
        raw["note"] = Value::Null;

        let record = map_neuron(raw, "http://nm.test").unwrap();
        assert_eq!(record.region, "hippocampus");
        assert_eq!(record.secondary_region, "");
        assert_eq!(record.cell_type, "");
        assert_eq!(record.secondary_cell_type, "");
        assert_eq!(record.description, "");
        assert_eq!(record.structural_domains, vec!["Dendrites", "Soma"]);
    }

    #[test]
    fn test_extension_without_dot_is_whole_format() {
        let mut raw = raw_neuron();
        raw["original_format"] = json!("swc");
        let record = map_neuron(raw, "http://nm.test").unwrap();
        assert!(record.derived_download_url.ends_with("/n409.swc"));
    }

    #[test]
    fn test_map_neuron_missing_required_key() {
        let mut raw = raw_neuron();
        raw.as_object_mut().unwrap().remove("archive");
        let err = map_neuron(raw, "http://nm.test").unwrap_err();
        assert!(matches!(err, CatalogError::Mapping(_)));
    }

    #[test]
    fn test_malformed_neuron_does_not_abort_page() {
        let provider = NeuroMorphoProvider::new(NeuroMorphoConfig::default());
        let records = provider.map_neurons(vec![raw_neuron(), json!({"neuron_id": 2}), raw_neuron()]);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_facet_filters() {
        assert!(Facet::Domain.filter().accepts("Dendrites, Soma, Axon"));
        assert!(!Facet::Domain.filter().accepts("Dendrites, Soma, No Axon"));
        assert!(Facet::OriginalFormat.filter().accepts("Neurolucida.asc"));
        assert!(!Facet::OriginalFormat.filter().accepts("Neurolucida.dat"));
        assert!(Facet::Attributes.filter().accepts("Diameter, 3D, Angles"));
        assert!(!Facet::Attributes.filter().accepts("No Diameter, 3D, Angles"));
        assert!(Facet::PhysicalIntegrity.filter().accepts("Dendrites Complete"));
        assert!(!Facet::PhysicalIntegrity
            .filter()
            .accepts("Dendrites Complete, No Axon"));
    }

    #[test]
    fn test_select_filter_wire_names() {
        let filter = SelectFilter {
            brain_region: vec!["hippocampus".into()],
            physical_integrity: vec!["Dendrites Complete".into()],
            ..SelectFilter::default()
        };
        let body = serde_json::to_value(&filter).unwrap();
        assert_eq!(body["brain_region"], json!(["hippocampus"]));
        assert_eq!(body["Physical_Integrity"], json!(["Dendrites Complete"]));
        assert_eq!(body["original_format"], json!([]));
    }

    #[test]
    fn test_endpoint_carries_paging() {
        let provider = NeuroMorphoProvider::new(NeuroMorphoConfig::default());
        let url = provider.endpoint("neuron/select", 2, 50).unwrap();
        assert_eq!(url, "http://neuromorpho.org/api/neuron/select?page=2&size=50");
    }
}
