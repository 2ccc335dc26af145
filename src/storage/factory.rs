//! Store factory for creating stores based on configuration

use crate::core::config::StoreConfig;
use crate::core::entity::CatalogSnapshot;
use crate::core::error::Result;
use crate::storage::MemStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Store wrapper for shared access
pub type SharedStore = Arc<MemStore>;

/// Create a store based on configuration
///
/// When `catalog_path` is set the store is seeded from that JSON catalog.
pub fn create_store(config: &StoreConfig) -> Result<MemStore> {
    match &config.catalog_path {
        Some(path) => load_catalog(path),
        None => Ok(MemStore::new()),
    }
}

/// Create a shared store based on configuration
pub fn create_shared_store(config: &StoreConfig) -> Result<SharedStore> {
    let store = create_store(config)?;
    Ok(Arc::new(store))
}

fn load_catalog(path: &Path) -> Result<MemStore> {
    let contents = std::fs::read_to_string(path)?;
    let snapshot: CatalogSnapshot = serde_json::from_str(&contents)?;
    let store = MemStore::from_snapshot(&snapshot)?;
    info!(path = %path.display(), entities = snapshot.len(), "Loaded catalog");
    Ok(store)
}
