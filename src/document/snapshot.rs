//! Snapshot wire format and persistence

use crate::document::block::Block;
use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Document-level metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subject: String,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub created_at: f64,
    #[serde(default)]
    pub updated_at: f64,
    #[serde(default = "default_version")]
    pub version: u32,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            subject: String::new(),
            created_at: 0.0,
            updated_at: 0.0,
            version: SNAPSHOT_VERSION,
        }
    }
}

/// Serializable form of a whole document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    #[serde(default)]
    pub metadata: Metadata,
    pub blocks: Vec<Block>,
}

/// Older documents stored blocks per page
#[derive(Deserialize)]
struct PagedSnapshot {
    #[serde(default)]
    metadata: Metadata,
    pages: Vec<PagedPage>,
}

#[derive(Deserialize)]
struct PagedPage {
    #[serde(default, alias = "items")]
    blocks: Vec<Block>,
}

impl From<PagedSnapshot> for DocumentSnapshot {
    fn from(paged: PagedSnapshot) -> Self {
        Self {
            metadata: paged.metadata,
            blocks: paged.pages.into_iter().flat_map(|p| p.blocks).collect(),
        }
    }
}

/// Serialize a snapshot to JSON
pub fn snapshot_to_json(snapshot: &DocumentSnapshot) -> Result<String> {
    Ok(serde_json::to_string(snapshot)?)
}

/// Parse a snapshot, accepting both the flat and the paged layout
pub fn snapshot_from_json(json: &str) -> Result<DocumentSnapshot> {
    let value: Value = serde_json::from_str(json)?;
    let paged = value.get("blocks").is_none() && value.get("pages").is_some();
    if paged {
        let legacy: PagedSnapshot = serde_json::from_value(value)?;
        Ok(legacy.into())
    } else if value.is_object() {
        Ok(serde_json::from_value(value)?)
    } else {
        Err(SheetError::InvalidSnapshot(
            "expected a JSON object".to_string(),
        ))
    }
}

/// Persistence collaborator for whole-document snapshots
pub trait SnapshotStore {
    fn load(&self) -> Result<DocumentSnapshot>;
    fn save(&mut self, snapshot: &DocumentSnapshot) -> Result<()>;
}

/// Store that keeps the serialized snapshot in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    json: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with existing JSON
    pub fn with_json(json: impl Into<String>) -> Self {
        Self {
            json: Some(json.into()),
        }
    }

    pub fn json(&self) -> Option<&str> {
        self.json.as_deref()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<DocumentSnapshot> {
        let json = self
            .json
            .as_deref()
            .ok_or_else(|| SheetError::Storage("nothing saved yet".to_string()))?;
        snapshot_from_json(json)
    }

    fn save(&mut self, snapshot: &DocumentSnapshot) -> Result<()> {
        self.json = Some(snapshot_to_json(snapshot)?);
        Ok(())
    }
}
