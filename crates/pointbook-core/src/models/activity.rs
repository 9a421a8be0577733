//! Server-side activity types: the POST payload, created id, and history records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::draft::ActivityForm;
use crate::error::Result;
use crate::util::{normalize_text_option, require_text};

/// Server-assigned activity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// JSON body of `POST /activities`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    pub title: String,
    pub description: String,
    pub competency_id: String,
    pub activity_type_id: String,
    pub document_url: String,
    pub recognized_course_id: Option<String>,
    pub event_id: Option<String>,
}

impl ActivityPayload {
    /// Builds the payload from form data and an uploaded evidence URL.
    ///
    /// Every required reference must be non-empty; optional references that
    /// are blank are sent as `null`.
    pub fn from_form(form: &ActivityForm, evidence_url: &str) -> Result<Self> {
        Ok(Self {
            title: require_text("title", &form.title)?,
            description: require_text("description", &form.description)?,
            competency_id: require_text("competency", &form.competency_id)?,
            activity_type_id: require_text("activity type", &form.activity_type_id)?,
            document_url: require_text("evidence URL", evidence_url)?,
            recognized_course_id: normalize_text_option(form.recognized_course_id.clone()),
            event_id: normalize_text_option(form.event_id.clone()),
        })
    }
}

/// Review state of a submitted activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Pending,
    Approved,
    Rejected,
    Other(String),
}

impl ActivityStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "submitted" => Self::Pending,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Other(value) => value,
        }
    }
}

/// A server-confirmed activity as shown in the student's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    pub id: ActivityId,
    pub title: String,
    pub status: ActivityStatus,
    pub points: u32,
    pub created_at: DateTime<Utc>,
}
