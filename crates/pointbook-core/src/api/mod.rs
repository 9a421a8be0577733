//! HTTP clients for the activity-points REST API.
//!
//! [`ActivityApi`] is the seam the submit flow and the retry engine depend on;
//! [`HttpActivityApi`] is the production implementation composed of the
//! upload, submission, and history clients.

mod history;
mod submission;
mod upload;

use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::AccessToken;
use crate::config::ApiConfig;
use crate::evidence::Evidence;
use crate::models::{ActivityId, ActivityPayload, ActivityRecord};
use crate::util::compact_text;

pub use history::{normalize_activity, HistoryClient, RawActivity};
pub use submission::SubmissionClient;
pub use upload::UploadClient;

/// Which remote call an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Upload,
    Submission,
    History,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upload => "upload",
            Self::Submission => "submission",
            Self::History => "history",
        })
    }
}

/// Failure taxonomy of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Local pre-flight check failed; nothing was sent.
    #[error("Invalid submission: {0}")]
    Validation(String),
    /// The server rejected the evidence upload.
    #[error("Upload failed with HTTP {status}: {body}")]
    Upload { status: u16, body: String },
    /// The server rejected the activity record.
    #[error("Submission failed with HTTP {status}: {body}")]
    Submission { status: u16, body: String },
    /// The history request failed or returned an unexpected shape.
    #[error("History request failed with HTTP {status}: {body}")]
    History { status: u16, body: String },
    /// The request could not be completed at all (including timeouts).
    #[error("Network failure during {phase}: {message}")]
    Network { phase: Phase, message: String },
    /// Missing credential or `401` from the server.
    #[error("Session expired during {phase}; please log in again")]
    Auth { phase: Phase },
    /// The stored credential could not be read (e.g. a locked keychain).
    #[error("Could not read the stored credential: {0}")]
    Credential(String),
}

impl ApiError {
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub(crate) fn network(phase: Phase, error: &reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "request timed out".to_string()
        } else {
            error.to_string()
        };
        Self::Network { phase, message }
    }

    /// Maps a non-success status into the error for `phase`.
    pub(crate) fn from_status(phase: Phase, status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return Self::Auth { phase };
        }
        let status = status.as_u16();
        let body = parse_error_body(body);
        match phase {
            Phase::Upload => Self::Upload { status, body },
            Phase::Submission => Self::Submission { status, body },
            Phase::History => Self::History { status, body },
        }
    }
}

/// Remote operations the reliability layer needs.
#[async_trait]
pub trait ActivityApi: Send + Sync {
    /// Upload evidence and return its reference URL.
    async fn upload_evidence(
        &self,
        token: &AccessToken,
        evidence: &Evidence,
    ) -> Result<String, ApiError>;

    /// Create an activity and return the server-assigned id.
    async fn create_activity(
        &self,
        token: &AccessToken,
        payload: &ActivityPayload,
    ) -> Result<ActivityId, ApiError>;

    /// List the student's confirmed activities.
    async fn list_activities(&self, token: &AccessToken) -> Result<Vec<ActivityRecord>, ApiError>;
}

/// Production [`ActivityApi`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpActivityApi {
    upload: UploadClient,
    submission: SubmissionClient,
    history: HistoryClient,
}

impl HttpActivityApi {
    pub fn new(config: &ApiConfig) -> crate::Result<Self> {
        let client = config.http_client()?;
        Ok(Self {
            upload: UploadClient::new(config, client.clone()),
            submission: SubmissionClient::new(config, client.clone()),
            history: HistoryClient::new(config, client),
        })
    }
}

#[async_trait]
impl ActivityApi for HttpActivityApi {
    async fn upload_evidence(
        &self,
        token: &AccessToken,
        evidence: &Evidence,
    ) -> Result<String, ApiError> {
        self.upload.upload(token, evidence).await
    }

    async fn create_activity(
        &self,
        token: &AccessToken,
        payload: &ActivityPayload,
    ) -> Result<ActivityId, ApiError> {
        self.submission.create(token, payload).await
    }

    async fn list_activities(&self, token: &AccessToken) -> Result<Vec<ActivityRecord>, ApiError> {
        self.history.list(token).await
    }
}

/// Identifier as the server sends it: a string or a bare integer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    pub(crate) fn into_activity_id(self) -> Option<ActivityId> {
        match self {
            Self::Text(value) => {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| ActivityId::new(trimmed))
            }
            Self::Number(value) => Some(ActivityId::new(value.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Prefer the JSON `message`/`error` field, fall back to the raw body.
fn parse_error_body(body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return compact_text(&message);
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed
    }
}
