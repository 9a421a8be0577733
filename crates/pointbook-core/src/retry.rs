//! Reconciliation of saved drafts against the server.
//!
//! A pass works on a snapshot taken when it starts and replays each draft in
//! chronological order. Results are merged into the store with one write at
//! the end, so drafts the user appended or removed meanwhile are kept as the
//! user left them.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::api::{ActivityApi, ApiError, Phase};
use crate::auth::{current_token, invalidate, CredentialStore};
use crate::events::{ActivitySubmitted, SubmissionEvents, SubmissionSource};
use crate::evidence::Evidence;
use crate::models::{ActivityId, ActivityPayload, Draft, DraftId};
use crate::store::DraftStore;

/// Shortest interval accepted by [`RetryEngine::run_periodic`].
pub const MIN_RETRY_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Confirmed(ActivityId),
    Failed(ApiError),
}

/// What happened to one draft during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftAttempt {
    pub draft_id: DraftId,
    pub title: String,
    pub outcome: AttemptOutcome,
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryReport {
    pub attempts: Vec<DraftAttempt>,
    /// Set when the store could not be read or the results not written.
    pub store_error: Option<String>,
}

impl RetryReport {
    pub fn succeeded(&self) -> usize {
        self.attempts
            .iter()
            .filter(|attempt| matches!(attempt.outcome, AttemptOutcome::Confirmed(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.attempts.len() - self.succeeded()
    }

    /// `(succeeded, failed)`
    pub fn counts(&self) -> (usize, usize) {
        (self.succeeded(), self.failed())
    }
}

/// Replays saved drafts. At most one pass runs at a time per engine.
pub struct RetryEngine<S, A, C>
where
    S: DraftStore,
    A: ActivityApi,
    C: CredentialStore,
{
    store: Arc<S>,
    api: Arc<A>,
    credentials: Arc<C>,
    events: SubmissionEvents,
    pass: Mutex<()>,
}

impl<S, A, C> RetryEngine<S, A, C>
where
    S: DraftStore,
    A: ActivityApi,
    C: CredentialStore,
{
    pub fn new(store: Arc<S>, api: Arc<A>, credentials: Arc<C>, events: SubmissionEvents) -> Self {
        Self {
            store,
            api,
            credentials,
            events,
            pass: Mutex::new(()),
        }
    }

    /// Attempt every stored draft once, oldest first. Never fails; store
    /// problems are carried in [`RetryReport::store_error`].
    pub async fn retry_all(&self) -> RetryReport {
        let _pass = self.pass.lock().await;

        let snapshot = match self.store.list() {
            Ok(drafts) => drafts,
            Err(error) => {
                tracing::error!("Retry pass aborted, cannot read drafts: {}", error);
                return RetryReport {
                    attempts: Vec::new(),
                    store_error: Some(error.to_string()),
                };
            }
        };
        if snapshot.is_empty() {
            tracing::debug!("Retry pass skipped, no drafts");
            return RetryReport::default();
        }

        tracing::info!("Retrying {} draft(s)", snapshot.len());
        let mut report = RetryReport::default();
        let mut confirmed = HashSet::new();
        let mut still_pending = HashMap::new();

        for mut draft in snapshot {
            let outcome = match self.replay(&mut draft).await {
                Ok(activity_id) => {
                    tracing::info!("Draft {} confirmed as {}", draft.id, activity_id);
                    self.events.publish(&ActivitySubmitted::now(
                        activity_id.clone(),
                        SubmissionSource::Retry(draft.id),
                    ));
                    confirmed.insert(draft.id);
                    AttemptOutcome::Confirmed(activity_id)
                }
                Err(error) => {
                    draft.record_failure(error.to_string());
                    tracing::warn!(
                        "Draft {} still pending after {} retries: {}",
                        draft.id,
                        draft.retry_count,
                        error
                    );
                    AttemptOutcome::Failed(error)
                }
            };

            report.attempts.push(DraftAttempt {
                draft_id: draft.id,
                title: draft.form_data.title.clone(),
                outcome,
            });
            if !confirmed.contains(&draft.id) {
                still_pending.insert(draft.id, draft);
            }
        }

        let merge = self.store.update(&mut |current| {
            current
                .into_iter()
                .filter(|draft| !confirmed.contains(&draft.id))
                .map(|draft| still_pending.get(&draft.id).cloned().unwrap_or(draft))
                .collect()
        });
        if let Err(error) = merge {
            tracing::error!("Failed to save retry results: {}", error);
            report.store_error = Some(error.to_string());
        }

        let (succeeded, failed) = report.counts();
        tracing::info!("Retry pass finished: {} succeeded, {} failed", succeeded, failed);
        report
    }

    /// Run [`Self::retry_all`] every `every` until `shutdown` resolves.
    /// The first pass starts immediately. Returns the number of passes run.
    pub async fn run_periodic<F, R>(&self, every: Duration, shutdown: F, mut on_pass: R) -> usize
    where
        F: Future<Output = ()>,
        R: FnMut(&RetryReport),
    {
        let mut ticker = tokio::time::interval(every.max(MIN_RETRY_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut passes = 0;
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    let report = self.retry_all().await;
                    passes += 1;
                    on_pass(&report);
                }
            }
        }
        tracing::debug!("Periodic retry stopped after {} pass(es)", passes);
        passes
    }

    async fn replay(&self, draft: &mut Draft) -> Result<ActivityId, ApiError> {
        let phase = if draft.has_uploaded_evidence() {
            Phase::Submission
        } else {
            Phase::Upload
        };
        let token = current_token(self.credentials.as_ref(), phase)?;

        let evidence_url = if let Some(url) = &draft.evidence_url {
            url.clone()
        } else {
            let evidence = Evidence::load(&draft.form_data.evidence.path).map_err(|error| {
                ApiError::Validation(format!("evidence could not be re-read: {error}"))
            })?;
            tracing::debug!("Draft {}: uploading evidence", draft.id);
            let url = self
                .api
                .upload_evidence(&token, &evidence)
                .await
                .inspect_err(|error| self.on_rejected(error))?;
            draft.evidence_url = Some(url.clone());
            url
        };

        let payload = ActivityPayload::from_form(&draft.form_data, &evidence_url)
            .map_err(|error| ApiError::Validation(error.to_string()))?;
        tracing::debug!("Draft {}: posting", draft.id);
        self.api
            .create_activity(&token, &payload)
            .await
            .inspect_err(|error| self.on_rejected(error))
    }

    /// Clears the credential when the server answered `401`; later drafts in
    /// the pass then fail fast without a request.
    fn on_rejected(&self, error: &ApiError) {
        if error.is_auth() {
            invalidate(self.credentials.as_ref());
        }
    }
}
