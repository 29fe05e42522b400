//! Domain types shared by the upload pipeline.
//!
//! Only the fields the pipeline touches live here; the building/unit/provider
//! records themselves are owned by the application that embeds these crates.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::constants::{DOCUMENT_CONTENT_TYPES, IMAGE_CONTENT_TYPES};

/// What a slot accepts: images only, or images plus PDF documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Document,
}

impl MediaKind {
    pub fn allowed_content_types(self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => IMAGE_CONTENT_TYPES,
            MediaKind::Document => DOCUMENT_CONTENT_TYPES,
        }
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "document" => Ok(MediaKind::Document),
            _ => Err(anyhow::anyhow!("Invalid media kind: {}", s)),
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Document => write!(f, "document"),
        }
    }
}

/// First segment of every storage key. Other systems locate assets by it,
/// so the string forms are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Buildings,
    Units,
    Components,
    Requests,
    ContingencyDocs,
    Providers,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 6] = [
        AssetCategory::Buildings,
        AssetCategory::Units,
        AssetCategory::Components,
        AssetCategory::Requests,
        AssetCategory::ContingencyDocs,
        AssetCategory::Providers,
    ];

    pub fn as_segment(self) -> &'static str {
        match self {
            AssetCategory::Buildings => "buildings",
            AssetCategory::Units => "units",
            AssetCategory::Components => "components",
            AssetCategory::Requests => "requests",
            AssetCategory::ContingencyDocs => "contingency_docs",
            AssetCategory::Providers => "providers",
        }
    }
}

impl FromStr for AssetCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        AssetCategory::ALL
            .into_iter()
            .find(|c| c.as_segment() == normalized)
            .ok_or_else(|| anyhow::anyhow!("Invalid asset category: {}", s))
    }
}

impl Display for AssetCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_segment())
    }
}

/// A user-selected file before validation.
///
/// `size` is the declared byte length as reported by the picker; it is what
/// the validator checks, independent of how many bytes were actually read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub data: Bytes,
    pub content_type: String,
    pub size: u64,
    pub name: String,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        let size = data.len() as u64;
        Self {
            data,
            content_type: content_type.into(),
            size,
            name: name.into(),
        }
    }

    /// MIME type lowercased with any `; param=...` suffix dropped.
    pub fn normalized_content_type(&self) -> String {
        normalize_content_type(&self.content_type)
    }

    /// Whether the declared type is one of the accepted image types.
    pub fn is_image(&self) -> bool {
        let normalized = self.normalized_content_type();
        IMAGE_CONTENT_TYPES.contains(&normalized.as_str())
    }
}

pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Reply from the application's entity-persistence callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistResponse {
    pub success: bool,
    pub message: String,
}

impl PersistResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
