//! Haul - an inventory catalog of components, assemblies and kits
//!
//! Components are contained in assemblies or kits, assemblies in kits. The
//! crate validates and applies partial updates, maintains tag sets and
//! containment targets over a pluggable [`storage::Store`], and builds the
//! containment graph of the whole catalog for rendering with Graphviz.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;

// Main functional modules
pub mod storage;
pub mod catalog;
pub mod graph;
pub mod system;

// Re-export commonly used items for convenience
pub use crate::core::{Config, EntityKind, Error, ObjectId, Result};
pub use catalog::{Catalog, UpdateOutcome};
pub use graph::{build_graph, Graph};

use crate::core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize tracing and metrics
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once keeps the first subscriber.
pub fn init(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| Error::config(format!("Invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match logging.format.as_str() {
        "pretty" => builder.pretty().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.try_init(),
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }

    tracing::info!("Initializing {} v{}", NAME, VERSION);

    system::metrics::init_registry();

    Ok(())
}
