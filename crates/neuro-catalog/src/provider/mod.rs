//! Catalog providers.
//!
//! A [`Provider`] turns one upstream catalog into a list of canonical
//! records. Single malformed upstream items are skipped and reported through
//! `tracing`; only systemic failures come back as `Err`.

pub mod model_db;
pub mod neuro_morpho;

use crate::types::{CatalogError, CatalogResult};
use async_trait::async_trait;
use serde::Serialize;

pub use model_db::ModelDbProvider;
pub use neuro_morpho::NeuroMorphoProvider;

/// Uniform search interface over a remote catalog.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Canonical record produced by this provider.
    type Record: Serialize + Send;

    /// Source tag stamped on every record.
    fn source(&self) -> &str;

    /// Namespace prefix for identifiers minted by this provider.
    fn id_prefix(&self) -> &str;

    /// Search the catalog.
    ///
    /// `offset` and `page_size` are hints for the upstream pagination
    /// scheme, not an exact result window.
    async fn search(&self, offset: usize, page_size: usize) -> CatalogResult<Vec<Self::Record>>;
}

pub(crate) fn check_page_size(page_size: usize) -> CatalogResult<()> {
    if page_size == 0 {
        return Err(CatalogError::InvalidInput(
            "page size must be positive".to_string(),
        ));
    }
    Ok(())
}
