//! HTTP acquisition layer shared by the providers.
//!
//! JSON REST calls go through [`http_client::HttpClient`]; HTML pages are
//! reduced to a single element through [`scrape::PageScraper`].

pub mod http_client;
pub mod scrape;
