//! pointbook-core - Offline-resilient activity submission
//!
//! Submits activity records with evidence to the activity-points API and
//! keeps every attempt the server did not confirm as a local draft, which a
//! later reconciliation pass replays.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod evidence;
pub mod export;
pub mod models;
pub mod retry;
pub mod store;
pub mod submit;
pub mod util;

#[cfg(test)]
mod testing;

pub use api::{ActivityApi, ApiError, HttpActivityApi, Phase};
pub use auth::{AccessToken, CredentialStore};
pub use error::{Error, Result};
pub use events::{ActivitySubmitted, SubmissionEvents, SubmissionSource, Subscription};
pub use models::{ActivityForm, ActivityId, Draft, DraftId};
pub use retry::{RetryEngine, RetryReport};
pub use store::{DraftStore, JsonFileDraftStore, MemoryDraftStore};
pub use submit::{SubmissionService, SubmitError, SubmitOutcome};
