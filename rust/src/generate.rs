//! UUID generation (v1, v4, v5).
//!
//! The generator implements `Iterator<Item = String>`.
//! Use `next_uuid()` for the explicit domain API.

use once_cell::sync::Lazy;
use rand::random_range;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::parse::{FormatOptions, convert_format};

/// Well-known namespaces for name-based UUIDs.
pub static NAMESPACES: Lazy<BTreeMap<&'static str, Uuid>> = Lazy::new(|| {
    BTreeMap::from([
        ("DNS", Uuid::NAMESPACE_DNS),
        ("URL", Uuid::NAMESPACE_URL),
        ("OID", Uuid::NAMESPACE_OID),
        ("X500", Uuid::NAMESPACE_X500),
    ])
});

/// Errors that can occur while configuring a generator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("Unsupported UUID version: {0} (expected 1, 4 or 5)")]
    UnsupportedVersion(u8),
    #[error("Name is required for version 5 UUIDs")]
    MissingName,
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),
}

/// Versions this toolkit can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidVersion {
    V1,
    V4,
    V5,
}

impl UuidVersion {
    pub fn number(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V4 => 4,
            Self::V5 => 5,
        }
    }

    pub fn from_number(n: u8) -> Result<Self, GenerateError> {
        match n {
            1 => Ok(Self::V1),
            4 => Ok(Self::V4),
            5 => Ok(Self::V5),
            _ => Err(GenerateError::UnsupportedVersion(n)),
        }
    }
}

/// Resolve a namespace name (`DNS`, `URL`, `OID`, `X500`, any case) or a literal UUID.
pub fn resolve_namespace(s: &str) -> Result<Uuid, GenerateError> {
    if let Some(ns) = NAMESPACES.get(s.to_ascii_uppercase().as_str()) {
        return Ok(*ns);
    }
    crate::parse::to_bytes(s)
        .map(Uuid::from_bytes)
        .map_err(|_| GenerateError::InvalidNamespace(s.to_string()))
}

/// UUID generator with output formatting.
pub struct UuidGen {
    version: UuidVersion,
    namespace: Uuid,
    name: Option<String>,
    node_id: [u8; 6],
    format: FormatOptions,
    emitted: usize,
}

impl UuidGen {
    /// Create a generator. Version 5 requires a name.
    pub fn new(
        version: UuidVersion,
        namespace: Uuid,
        name: Option<String>,
        format: FormatOptions,
    ) -> Result<Self, GenerateError> {
        let name = name.filter(|n| !n.is_empty());
        if version == UuidVersion::V5 && name.is_none() {
            return Err(GenerateError::MissingName);
        }

        let mut node_id = [0u8; 6];
        for b in node_id.iter_mut() {
            *b = random_range(0..=255u8);
        }
        // multicast bit marks a random node id
        node_id[0] |= 0x01;

        Ok(Self {
            version,
            namespace,
            name,
            node_id,
            format,
            emitted: 0,
        })
    }

    /// Create a random (v4) generator with default formatting.
    pub fn random() -> Self {
        Self {
            version: UuidVersion::V4,
            namespace: Uuid::NAMESPACE_DNS,
            name: None,
            node_id: [0x01, 0, 0, 0, 0, 0],
            format: FormatOptions::default(),
            emitted: 0,
        }
    }

    fn next_raw(&mut self) -> Uuid {
        let idx = self.emitted;
        self.emitted += 1;
        match self.version {
            UuidVersion::V1 => Uuid::now_v1(&self.node_id),
            UuidVersion::V4 => Uuid::new_v4(),
            UuidVersion::V5 => {
                let base = self.name.as_deref().unwrap_or_default();
                let name = if idx == 0 {
                    base.to_string()
                } else {
                    format!("{base}-{idx}")
                };
                Uuid::new_v5(&self.namespace, name.as_bytes())
            }
        }
    }

    /// Generate the next UUID (domain API).
    pub fn next_uuid(&mut self) -> String {
        let raw = self.next_raw().hyphenated().to_string();
        // hyphenated output of the uuid crate always reformats cleanly
        convert_format(&raw, self.format).unwrap_or(raw)
    }

    /// Generate n UUIDs.
    pub fn next_n(&mut self, n: usize) -> Vec<String> {
        self.take(n).collect()
    }

    pub fn version(&self) -> UuidVersion {
        self.version
    }
}

impl Iterator for UuidGen {
    type Item = String;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_uuid())
    }
}
