use std::io;

use pointbook_core::api::ApiError;
use pointbook_core::submit::SubmitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] pointbook_core::Error),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Draft ID cannot be empty")]
    EmptyDraftId,
    #[error("Draft not found for id/prefix: {0}")]
    DraftNotFound(String),
    #[error("{0}")]
    AmbiguousDraftId(String),
    #[error("Purge cancelled; pass --yes to discard drafts non-interactively")]
    PurgeNotConfirmed,
    #[error("Draft storage error during retry: {0}")]
    RetryStorage(String),
    #[error(
        "Not signed in for profile '{0}'. Run `pointbook auth login --token <TOKEN>` first."
    )]
    NotSignedIn(String),
}
