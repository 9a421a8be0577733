//! Scripted `ActivityApi` and credential stores used by the submit and retry
//! tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{ActivityApi, ApiError, Phase};
use crate::auth::{AccessToken, CredentialError, CredentialResult, CredentialStore};
use crate::evidence::Evidence;
use crate::models::{ActivityId, ActivityPayload, ActivityRecord};

pub const MOCK_EVIDENCE_URL: &str = "https://files.example.edu/mock.pdf";

pub struct MockActivityApi {
    upload: Mutex<Result<String, ApiError>>,
    create: Mutex<Result<ActivityId, ApiError>>,
    create_by_title: Mutex<HashMap<String, Result<ActivityId, ApiError>>>,
    on_create: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    calls: Mutex<Vec<String>>,
}

impl Default for MockActivityApi {
    fn default() -> Self {
        Self {
            upload: Mutex::new(Ok(MOCK_EVIDENCE_URL.to_string())),
            create: Mutex::new(Ok(ActivityId::new("created-1"))),
            create_by_title: Mutex::new(HashMap::new()),
            on_create: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockActivityApi {
    pub fn set_upload(&self, result: Result<String, ApiError>) {
        *self.upload.lock().unwrap() = result;
    }

    pub fn set_create(&self, result: Result<ActivityId, ApiError>) {
        *self.create.lock().unwrap() = result;
    }

    pub fn set_create_for(&self, title: &str, result: Result<ActivityId, ApiError>) {
        self.create_by_title
            .lock()
            .unwrap()
            .insert(title.to_string(), result);
    }

    /// Runs `hook` once, during the next create call.
    pub fn set_on_create(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_create.lock().unwrap() = Some(Box::new(hook));
    }

    /// Recorded calls, e.g. `upload:certificate.pdf`, `create:Hackathon`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created_titles(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| call.strip_prefix("create:").map(ToString::to_string))
            .collect()
    }

    pub fn server_error(status: u16) -> ApiError {
        ApiError::Submission {
            status,
            body: "Internal Server Error".to_string(),
        }
    }

    pub const fn unauthorized() -> ApiError {
        ApiError::Auth {
            phase: Phase::Submission,
        }
    }
}

#[async_trait]
impl ActivityApi for MockActivityApi {
    async fn upload_evidence(
        &self,
        _token: &AccessToken,
        evidence: &Evidence,
    ) -> Result<String, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("upload:{}", evidence.file.file_name));
        self.upload.lock().unwrap().clone()
    }

    async fn create_activity(
        &self,
        _token: &AccessToken,
        payload: &ActivityPayload,
    ) -> Result<ActivityId, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("create:{}", payload.title));
        let hook = self.on_create.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        if let Some(result) = self.create_by_title.lock().unwrap().get(&payload.title) {
            return result.clone();
        }
        self.create.lock().unwrap().clone()
    }

    async fn list_activities(&self, _token: &AccessToken) -> Result<Vec<ActivityRecord>, ApiError> {
        self.calls.lock().unwrap().push("list".to_string());
        Ok(Vec::new())
    }
}

/// Credential store whose reads always fail, as with a locked keychain.
#[derive(Debug, Default)]
pub struct UnreadableCredentialStore {
    clears: AtomicUsize,
}

impl UnreadableCredentialStore {
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl CredentialStore for UnreadableCredentialStore {
    fn load_token(&self) -> CredentialResult<Option<AccessToken>> {
        Err(CredentialError::SecureStorage("keychain is locked".to_string()))
    }

    fn save_token(&self, _token: &AccessToken) -> CredentialResult<()> {
        Ok(())
    }

    fn clear_token(&self) -> CredentialResult<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
