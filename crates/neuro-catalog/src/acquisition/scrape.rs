//! Locate a single element on an HTML page by its `id` attribute.
//!
//! The parsed DOM never leaves this module: callers receive an owned
//! [`ScrapedElement`] holding the element's `href` and the anchors below it.

use super::http_client::HttpClient;
use async_trait::async_trait;
use scraper::{Html, Selector};

/// Owned snapshot of a located element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedElement {
    pub tag: String,
    pub href: Option<String>,
    /// Every `<a>` below the element, in document order.
    pub anchors: Vec<ScrapedAnchor>,
}

/// An anchor found below a located element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedAnchor {
    pub href: Option<String>,
    /// Direct text children of the anchor, untrimmed. Text inside nested
    /// elements is not included.
    pub text_nodes: Vec<String>,
}

impl ScrapedAnchor {
    /// True when one of the direct text nodes, lowercased, equals `token`.
    pub fn has_text_token(&self, token: &str) -> bool {
        self.text_nodes.iter().any(|t| t.to_lowercase() == token)
    }

    /// First direct text node, lowercased.
    pub fn label(&self) -> Option<String> {
        self.text_nodes.first().map(|t| t.to_lowercase())
    }
}

/// Fetch a page and return the element carrying `element_id`.
///
/// Any failure (transport error, non-200 status, missing element) yields
/// `None`. Implementations hold no per-call state.
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape(&self, url: &str, element_id: &str) -> Option<ScrapedElement>;
}

/// [`PageScraper`] over plain HTTP GET.
///
/// TLS certificate verification is disabled, matching the ModelDB HTML
/// host. Requests carry no timeout.
#[derive(Debug, Clone)]
pub struct HttpPageScraper {
    client: HttpClient,
}

impl HttpPageScraper {
    pub fn new() -> Self {
        Self {
            client: HttpClient::new(None).accept_invalid_certs(true),
        }
    }
}

impl Default for HttpPageScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageScraper for HttpPageScraper {
    async fn scrape(&self, url: &str, element_id: &str) -> Option<ScrapedElement> {
        match self.client.get(url).await {
            Ok(resp) if resp.is_ok() => find_element(&resp.body, element_id),
            Ok(resp) => {
                tracing::debug!("scrape of {url} returned status {}", resp.status);
                None
            }
            Err(e) => {
                tracing::warn!("exception on scraping {url}: {e}");
                None
            }
        }
    }
}

/// Parse `html` and snapshot the first element whose id is `element_id`.
pub fn find_element(html: &str, element_id: &str) -> Option<ScrapedElement> {
    let document = Html::parse_document(html);
    let with_id = Selector::parse("[id]").ok()?;
    let anchor_sel = Selector::parse("a").ok()?;

    let element = document
        .select(&with_id)
        .find(|el| el.value().id() == Some(element_id))?;

    let anchors = element
        .select(&anchor_sel)
        .map(|anchor| ScrapedAnchor {
            href: anchor.value().attr("href").map(str::to_string),
            text_nodes: anchor
                .children()
                .filter_map(|child| child.value().as_text())
                .map(|text| text.to_string())
                .collect(),
        })
        .collect();

    Some(ScrapedElement {
        tag: element.value().name().to_string(),
        href: element.value().attr("href").map(str::to_string),
        anchors,
    })
}

/// Prefix `host` onto links that are not already absolute.
pub fn absolutize(href: &str, host: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{host}{href}")
    }
}
