//! Core types for material-ingest

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a staged item
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    /// Create a new ItemId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for u64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl PartialEq<u64> for ItemId {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

impl PartialEq<ItemId> for u64 {
    fn eq(&self, other: &ItemId) -> bool {
        *self == other.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// The kind of content an item was staged as
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A local file with a binary payload (metered transfer)
    File,
    /// A remote URL reference (instant transfer)
    Url,
}

/// Item transfer state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    /// Staged or frozen, transfer not started yet
    Pending,
    /// Transfer in progress
    InProgress,
    /// Successfully transferred
    Completed,
    /// Transfer failed
    Failed,
    /// Cancelled while in flight
    Cancelled,
}

impl ItemState {
    /// Convert integer state code to ItemState enum
    pub fn from_i32(state: i32) -> Self {
        match state {
            0 => ItemState::Pending,
            1 => ItemState::InProgress,
            2 => ItemState::Completed,
            3 => ItemState::Failed,
            4 => ItemState::Cancelled,
            _ => ItemState::Failed, // Default to Failed for unknown state
        }
    }

    /// Convert ItemState enum to integer state code
    pub fn to_i32(&self) -> i32 {
        match self {
            ItemState::Pending => 0,
            ItemState::InProgress => 1,
            ItemState::Completed => 2,
            ItemState::Failed => 3,
            ItemState::Cancelled => 4,
        }
    }

    /// Whether no further transition can occur from this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemState::Completed | ItemState::Failed | ItemState::Cancelled
        )
    }
}

/// A local file to stage for ingestion
///
/// The `path` is an opaque content handle — the pipeline never reads it,
/// it is carried through for the consumer that processes the completed batch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewFile {
    /// Display name (usually the original filename)
    pub name: String,

    /// Size in bytes
    pub size_bytes: u64,

    /// Content handle (None for files whose payload lives elsewhere)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl NewFile {
    /// Create a NewFile with no content handle
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            path: None,
        }
    }

    /// Attach a content handle
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Snapshot of a staged or in-flight item
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemInfo {
    /// Unique item identifier
    pub id: ItemId,

    /// Original kind (file or URL)
    pub kind: ItemKind,

    /// Display name (filename or URL string)
    pub name: String,

    /// Size in bytes (0 for URL references)
    pub size_bytes: u64,

    /// Content handle for file items, if one was attached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Progress percentage (0 to 100)
    pub progress: u8,

    /// Current transfer state
    pub state: ItemState,

    /// Failure reason (set only when state is Failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the item was added to the staging area
    pub staged_at: DateTime<Utc>,
}

/// Counts describing the staged batch, for display purposes
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct StagingStats {
    /// Total number of staged items
    pub total: usize,

    /// Number of staged files
    pub files: usize,

    /// Number of staged URLs
    pub urls: usize,

    /// Combined size of all staged files in bytes
    pub total_size_bytes: u64,
}

/// Final summary delivered once per batch via [`Event::BatchCompleted`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Category the batch was submitted under
    pub category: String,

    /// Number of items staged as files
    pub files: usize,

    /// Number of items staged as URLs
    pub urls: usize,

    /// Number of items that reached Completed
    pub completed: usize,

    /// Number of items that reached Failed
    pub failed: usize,

    /// Number of items that reached Cancelled
    pub cancelled: usize,
}

impl BatchSummary {
    /// Whether every item in the batch completed successfully
    pub fn is_full_success(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

/// Event emitted during the batch ingestion lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A metered item started transferring (Pending → InProgress)
    ItemStarted {
        /// Item ID
        id: ItemId,
    },

    /// Progress update for a metered item
    ItemProgress {
        /// Item ID
        id: ItemId,
        /// Progress percentage (0 to 100), never regresses
        percent: u8,
    },

    /// Item finished successfully
    ItemCompleted {
        /// Item ID
        id: ItemId,
    },

    /// Item failed during transfer
    ItemFailed {
        /// Item ID
        id: ItemId,
        /// Failure reason
        error: String,
    },

    /// Item was cancelled while in flight
    ItemCancelled {
        /// Item ID
        id: ItemId,
    },

    /// Submission was rejected before any transfer started
    BatchRejected {
        /// Human-readable rejection reason
        reason: String,
    },

    /// Every item in the batch reached a terminal state (fires exactly once per batch)
    BatchCompleted {
        /// Outcome counts for the batch
        summary: BatchSummary,
    },
}
