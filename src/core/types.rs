//! Identifier and kind types shared by every part of the catalog
//!
//! `ObjectId` is a fixed 12-byte identifier rendered as 24 lowercase hex
//! characters. The all-zero id is reserved as the "no target" sentinel.

use rand::Rng;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;

/// Length of an id in bytes
pub const OBJECT_ID_LEN: usize = 12;

/// Length of an id in its hex representation
pub const OBJECT_ID_HEX_LEN: usize = OBJECT_ID_LEN * 2;

/// 12-byte entity identifier, unique across all collections
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

/// Store-maintained revision of a document, bumped on every write
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Revision(u64);

/// Error returned when a string is not a well-formed id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id {input:?}: expected 24 hex characters")]
pub struct ParseObjectIdError {
    /// The rejected input
    pub input: String,
}

// Per-process random part, generated once like a machine/process identifier.
static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(|| {
    let mut bytes = [0u8; 5];
    rand::rng().fill(&mut bytes);
    bytes
});

static COUNTER: Lazy<AtomicU32> = Lazy::new(|| AtomicU32::new(rand::rng().random::<u32>()));

impl ObjectId {
    /// The reserved "no target" id
    pub const ZERO: ObjectId = ObjectId([0u8; OBJECT_ID_LEN]);

    /// Generate a fresh id: seconds since epoch, process bytes, counter
    pub fn generate() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst) & 0x00ff_ffff;

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        Self(bytes)
    }

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    /// Whether this is the "no target" sentinel
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; OBJECT_ID_LEN]
    }

    /// Parse a 24 character hex string
    pub fn parse_hex(s: &str) -> Result<Self, ParseObjectIdError> {
        let invalid = || ParseObjectIdError { input: s.to_string() };
        if s.len() != OBJECT_ID_HEX_LEN {
            return Err(invalid());
        }
        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| invalid())?;
        Ok(Self(bytes))
    }

    /// Lowercase hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ObjectIdVisitor;

        impl<'de> Visitor<'de> for ObjectIdVisitor {
            type Value = ObjectId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a 24 character hex object id")
            }

            fn visit_str<E>(self, value: &str) -> Result<ObjectId, E>
            where
                E: de::Error,
            {
                ObjectId::parse_hex(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(ObjectIdVisitor)
    }
}

impl Revision {
    /// Revision of a freshly inserted document
    pub const INITIAL: Revision = Revision(1);

    /// Create from a raw counter value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Next revision after a write
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw counter value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// The three cataloged entity kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Atomic part
    Component,
    /// Group of components
    Assembly,
    /// Group of assemblies and components, always a graph root
    Kit,
}

impl EntityKind {
    /// All kinds in graph node-pass order
    pub const ALL: [EntityKind; 3] = [EntityKind::Component, EntityKind::Assembly, EntityKind::Kit];

    /// Store collection name
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Component => "components",
            EntityKind::Assembly => "assemblies",
            EntityKind::Kit => "kits",
        }
    }

    /// Whether entities of this kind carry a target reference
    pub fn has_target(self) -> bool {
        !matches!(self, EntityKind::Kit)
    }

    /// Kinds an entity of this kind may legally point at
    pub fn legal_targets(self) -> &'static [EntityKind] {
        match self {
            EntityKind::Component => &[EntityKind::Assembly, EntityKind::Kit],
            EntityKind::Assembly => &[EntityKind::Kit],
            EntityKind::Kit => &[],
        }
    }

    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Component => "component",
            EntityKind::Assembly => "assembly",
            EntityKind::Kit => "kit",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "component" | "components" => Ok(EntityKind::Component),
            "assembly" | "assemblies" => Ok(EntityKind::Assembly),
            "kit" | "kits" => Ok(EntityKind::Kit),
            other => Err(format!("unknown entity kind: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_sentinel() {
        assert!(ObjectId::ZERO.is_zero());
        assert!(ObjectId::default().is_zero());
        assert_eq!(ObjectId::ZERO.to_hex(), "000000000000000000000000");
        assert!(!ObjectId::generate().is_zero());
    }

    #[test]
    fn test_parse_hex() {
        let id: ObjectId = "64b7f0c2a1b2c3d4e5f60718".parse().unwrap();
        assert_eq!(id.to_string(), "64b7f0c2a1b2c3d4e5f60718");

        // Uppercase hex is accepted, rendering is lowercase
        let upper = ObjectId::parse_hex("64B7F0C2A1B2C3D4E5F60718").unwrap();
        assert_eq!(upper, id);
    }

    #[test]
    fn test_parse_hex_rejects_malformed() {
        assert!(ObjectId::parse_hex("").is_err());
        assert!(ObjectId::parse_hex("1234").is_err());
        assert!(ObjectId::parse_hex("zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
        assert!(ObjectId::parse_hex("64b7f0c2a1b2c3d4e5f6071800").is_err());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: std::collections::HashSet<ObjectId> = (0..1000).map(|_| ObjectId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let id = ObjectId::parse_hex("64b7f0c2a1b2c3d4e5f60718").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"64b7f0c2a1b2c3d4e5f60718\"");
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ObjectId>("\"nope\"").is_err());
    }

    #[test]
    fn test_kind_relationships() {
        assert!(EntityKind::Component.has_target());
        assert!(EntityKind::Assembly.has_target());
        assert!(!EntityKind::Kit.has_target());
        assert_eq!(EntityKind::Assembly.legal_targets(), &[EntityKind::Kit]);
        assert_eq!("assemblies".parse::<EntityKind>().unwrap(), EntityKind::Assembly);
        assert!("widget".parse::<EntityKind>().is_err());
    }
}
