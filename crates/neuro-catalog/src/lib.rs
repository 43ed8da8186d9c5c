// Copyright 2026 Neuro Catalog Contributors
// SPDX-License-Identifier: Apache-2.0

//! Neuro catalog — harvest neuron model and morphology metadata from
//! ModelDB and NeuroMorpho into canonical, source-tagged records.

pub mod acquisition;
pub mod config;
pub mod filter;
pub mod provider;
pub mod types;

pub use config::{CatalogConfig, ModelDbConfig, NeuroMorphoConfig};
pub use filter::{filter_values, FacetFilter, MatchMode};
pub use provider::{ModelDbProvider, NeuroMorphoProvider, Provider};
pub use types::*;
