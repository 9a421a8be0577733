//! Live submission flow: validate, upload evidence, post the activity.
//!
//! ```text
//! Idle -> Uploading -> Uploaded -> Posting -> Confirmed
//!              |                      |
//!              +-> UploadFailed ------+-> PostFailed -> Draft-Saved
//! ```
//!
//! Any failure after validation is captured as exactly one draft, keeping
//! the evidence URL when the upload already succeeded.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ActivityApi, ApiError, Phase};
use crate::auth::{current_token, invalidate, CredentialStore};
use crate::events::{ActivitySubmitted, SubmissionEvents, SubmissionSource};
use crate::evidence::{validate_evidence, Evidence};
use crate::models::{ActivityForm, ActivityId, ActivityPayload, Draft, DraftId};
use crate::store::DraftStore;
use crate::util::require_text;

/// Result of a submit that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The server accepted the activity.
    Confirmed { activity_id: ActivityId },
    /// The attempt failed and was saved locally for a later retry.
    DraftSaved { draft_id: DraftId, error: ApiError },
}

impl SubmitOutcome {
    /// Message shown to the student after the attempt.
    pub fn user_message(&self) -> String {
        match self {
            Self::Confirmed { activity_id } => {
                format!("Activity submitted (id {activity_id}).")
            }
            Self::DraftSaved { error, .. } if error.is_auth() => {
                "Your session ended, please log in again. Your submission was saved and can be retried after logging in.".to_string()
            }
            Self::DraftSaved {
                error: ApiError::Credential(reason),
                ..
            } => format!(
                "Your saved login could not be read ({reason}). Your submission was saved; try again once it is available."
            ),
            Self::DraftSaved { error, .. } if error.is_validation() => format!(
                "The server could not accept this submission yet ({error}). It was saved; review it before retrying."
            ),
            Self::DraftSaved { error, .. } => format!(
                "We could not reach the server ({error}). Your work was saved; try again later."
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// Fix-your-input failure; nothing was sent and no draft was created.
    #[error("Please fix your input: {0}")]
    Validation(String),
    /// The attempt failed and the draft could not be persisted either.
    #[error("Submission failed ({cause}) and the draft could not be saved: {source}")]
    DraftNotSaved {
        cause: ApiError,
        #[source]
        source: crate::Error,
    },
}

/// Runs live submissions against an [`ActivityApi`], saving failures to a
/// [`DraftStore`].
pub struct SubmissionService<S, A, C>
where
    S: DraftStore,
    A: ActivityApi,
    C: CredentialStore,
{
    store: Arc<S>,
    api: Arc<A>,
    credentials: Arc<C>,
    events: SubmissionEvents,
}

impl<S, A, C> SubmissionService<S, A, C>
where
    S: DraftStore,
    A: ActivityApi,
    C: CredentialStore,
{
    pub const fn new(
        store: Arc<S>,
        api: Arc<A>,
        credentials: Arc<C>,
        events: SubmissionEvents,
    ) -> Self {
        Self {
            store,
            api,
            credentials,
            events,
        }
    }

    /// Reads the evidence from `form.evidence.path`, then submits.
    pub async fn submit(&self, form: ActivityForm) -> Result<SubmitOutcome, SubmitError> {
        validate_form(&form)?;
        let evidence = Evidence::load(&form.evidence.path)
            .map_err(|error| SubmitError::Validation(error.to_string()))?;
        self.submit_with_evidence(form, evidence).await
    }

    /// Submits with evidence already in memory. The form's evidence metadata
    /// is replaced with `evidence.file`.
    pub async fn submit_with_evidence(
        &self,
        mut form: ActivityForm,
        evidence: Evidence,
    ) -> Result<SubmitOutcome, SubmitError> {
        form.evidence = evidence.file.clone();
        validate_form(&form)?;
        validate_evidence(&form.evidence)
            .map_err(|error| SubmitError::Validation(error.to_string()))?;

        let token = match current_token(self.credentials.as_ref(), Phase::Upload) {
            Ok(token) => token,
            Err(error) => return self.save_draft(form, None, error),
        };

        tracing::debug!("Submitting '{}': uploading evidence", form.title);
        let evidence_url = match self.api.upload_evidence(&token, &evidence).await {
            Ok(url) => url,
            Err(error) => {
                self.on_rejected(&error);
                return self.save_draft(form, None, error);
            }
        };

        tracing::debug!("Submitting '{}': evidence uploaded, posting", form.title);
        let payload = match ActivityPayload::from_form(&form, &evidence_url) {
            Ok(payload) => payload,
            Err(error) => {
                let error = ApiError::Validation(error.to_string());
                return self.save_draft(form, Some(evidence_url), error);
            }
        };

        match self.api.create_activity(&token, &payload).await {
            Ok(activity_id) => {
                tracing::info!("Activity '{}' confirmed as {}", form.title, activity_id);
                self.events.publish(&ActivitySubmitted::now(
                    activity_id.clone(),
                    SubmissionSource::Live,
                ));
                Ok(SubmitOutcome::Confirmed { activity_id })
            }
            Err(error) => {
                self.on_rejected(&error);
                self.save_draft(form, Some(evidence_url), error)
            }
        }
    }

    /// Clears the credential when the server answered `401`.
    fn on_rejected(&self, error: &ApiError) {
        if error.is_auth() {
            invalidate(self.credentials.as_ref());
        }
    }

    fn save_draft(
        &self,
        form: ActivityForm,
        evidence_url: Option<String>,
        error: ApiError,
    ) -> Result<SubmitOutcome, SubmitError> {
        let draft = Draft::capture(form, evidence_url, error.to_string());
        let draft_id = draft.id;
        if let Err(source) = self.store.append(draft) {
            tracing::error!("Failed to save draft after submission failure: {}", source);
            return Err(SubmitError::DraftNotSaved {
                cause: error,
                source,
            });
        }

        tracing::warn!("Submission failed, saved draft {}: {}", draft_id, error);
        Ok(SubmitOutcome::DraftSaved { draft_id, error })
    }
}

/// Required-field check run before anything is sent.
pub fn validate_form(form: &ActivityForm) -> Result<(), SubmitError> {
    let checks = [
        ("title", form.title.as_str()),
        ("description", form.description.as_str()),
        ("activity type", form.activity_type_id.as_str()),
        ("competency", form.competency_id.as_str()),
    ];
    for (field, value) in checks {
        require_text(field, value).map_err(|error| SubmitError::Validation(error.to_string()))?;
    }
    Ok(())
}
