//! Draft model: a submission attempt that has not been confirmed by the server.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique, time-ordered identifier for a draft, using UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(Uuid);

impl DraftId {
    /// Create a new unique draft ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for DraftId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DraftId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// Sync state of a stored draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    #[default]
    PendingServerSync,
}

impl DraftStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingServerSync => "pending_server_sync",
        }
    }
}

/// Metadata of the original evidence file picked by the user.
///
/// The bytes are not stored; a retry re-reads them from `path` when the
/// upload never completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Everything the user entered on the activity form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityForm {
    pub title: String,
    pub description: String,
    pub activity_type_id: String,
    pub competency_id: String,
    /// Free-text notes kept with the draft for the student's reference.
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub recognized_course_id: Option<String>,
    pub evidence: EvidenceFile,
}

/// A locally persisted submission attempt awaiting server confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: DraftId,
    pub timestamp: DateTime<Utc>,
    pub form_data: ActivityForm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_url: Option<String>,
    #[serde(default)]
    pub status: DraftStatus,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl Draft {
    /// Capture a failed submission attempt.
    ///
    /// `evidence_url` is only set when the upload finished before a later
    /// step failed.
    pub fn capture(
        form_data: ActivityForm,
        evidence_url: Option<String>,
        last_error: impl Into<String>,
    ) -> Self {
        Self {
            id: DraftId::new(),
            timestamp: Utc::now(),
            form_data,
            evidence_url: evidence_url.filter(|url| !url.trim().is_empty()),
            status: DraftStatus::PendingServerSync,
            retry_count: 0,
            last_error: Some(last_error.into()),
        }
    }

    /// Record a failed retry attempt.
    pub fn record_failure(&mut self, reason: impl Into<String>) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_error = Some(reason.into());
    }

    pub const fn has_uploaded_evidence(&self) -> bool {
        self.evidence_url.is_some()
    }
}
