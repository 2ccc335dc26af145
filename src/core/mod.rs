//! Core system types and foundations
//!
//! This module contains the fundamental building blocks of haul: identifiers,
//! the entity model, error handling and configuration.

pub mod types;
pub mod entity;
pub mod error;
pub mod config;

// Re-export commonly used items
pub use types::{EntityKind, ObjectId, Revision};
pub use entity::{
    Assembly, AssemblyWithId, CatalogSnapshot, Component, ComponentWithId, Entity, Identified,
    Kit, KitWithId,
};
pub use error::{Error, GraphError, Result, StoreError, ValidationError};
pub use config::{Config, OutputFormat, WriteMode};
