//! Error types and handling for the haul catalog
//!
//! Validation errors are raised before any store write. Store errors are
//! propagated to the caller untouched, the core never retries.

use crate::core::types::{EntityKind, ObjectId, ParseObjectIdError};
use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the catalog
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No entity with the requested id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input rejected before reaching the store
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Write raced with another writer (compare-and-swap mode only)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store layer errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Graph construction errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Graph rendering through an external tool failed
    #[error("Render error: {0}")]
    Render(String),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejections of caller input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name set or created as the empty string
    #[error("name cannot be empty")]
    EmptyName,

    /// Update document was not a JSON object
    #[error("update document must be a JSON object")]
    NotAnObject,

    /// Tag payload was not an array
    #[error("tags must be an array of strings")]
    TagsNotArray,

    /// Tag payload contained a non-string element
    #[error("tag at index {index} is not a string")]
    NonStringTag {
        /// Position of the offending element
        index: usize,
    },

    /// A whitelisted field carried the wrong JSON type
    #[error("field {field:?} must be a {expected}")]
    WrongType {
        /// Field name
        field: String,
        /// Expected JSON type
        expected: &'static str,
    },

    /// Required field missing on create
    #[error("missing required field {0:?}")]
    MissingField(&'static str),

    /// Malformed identifier
    #[error(transparent)]
    MalformedId(#[from] ParseObjectIdError),

    /// Target operation on a kind that has no target
    #[error("{0} entities have no target field")]
    NoTargetField(EntityKind),
}

/// Store-specific errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be interpreted
    #[error("data corruption detected: {0}")]
    Corruption(String),

    /// An insert collided with an existing id
    #[error("duplicate id {0}")]
    DuplicateId(ObjectId),
}

/// Graph construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two entities share an id
    #[error("duplicate node {id}")]
    DuplicateNode {
        /// Repeated id
        id: ObjectId,
    },

    /// Target does not refer to any listed entity
    #[error("{kind} {from} targets {target}, which is not in the graph")]
    DanglingTarget {
        /// Kind of the source entity
        kind: EntityKind,
        /// Source entity
        from: ObjectId,
        /// Missing target
        target: ObjectId,
    },

    /// Target refers to an entity of a kind that cannot contain the source
    #[error("{kind} {from} cannot be contained in {target_kind} {target}")]
    IllegalTarget {
        /// Kind of the source entity
        kind: EntityKind,
        /// Source entity
        from: ObjectId,
        /// Kind of the target entity
        target_kind: EntityKind,
        /// Target entity
        target: ObjectId,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error for an entity
    pub fn not_found(kind: EntityKind, id: ObjectId) -> Self {
        Self::NotFound(format!("no {} with id {}", kind, id))
    }

    /// Create a conflict error for an entity
    pub fn conflict(kind: EntityKind, id: ObjectId) -> Self {
        Self::Conflict(format!("{} {} was modified concurrently", kind, id))
    }

    /// Create a render error
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::Validation(_) | Error::Conflict(_) | Error::Graph(_)
        )
    }

    /// Check if this is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Store(_) | Error::Io(_) | Error::Render(_))
    }
}

impl From<ParseObjectIdError> for Error {
    fn from(err: ParseObjectIdError) -> Self {
        Error::Validation(ValidationError::MalformedId(err))
    }
}
