//! Bearer credential handling for the activity API.
//!
//! Tokens are issued by an external login flow; this crate only reads them,
//! and clears them when the server answers `401`.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{ApiError, Phase};
use crate::util::normalize_text_option;

/// Bearer token sent as `Authorization: Bearer ...`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Returns `None` for blank tokens.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        normalize_text_option(Some(raw.into())).map(Self)
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("AccessToken([REDACTED])")
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type CredentialResult<T> = Result<T, CredentialError>;

/// Persistence seam for the bearer token.
pub trait CredentialStore: Send + Sync {
    fn load_token(&self) -> CredentialResult<Option<AccessToken>>;
    fn save_token(&self, token: &AccessToken) -> CredentialResult<()>;
    fn clear_token(&self) -> CredentialResult<()>;
}

impl<C: CredentialStore + ?Sized> CredentialStore for Arc<C> {
    fn load_token(&self) -> CredentialResult<Option<AccessToken>> {
        (**self).load_token()
    }

    fn save_token(&self, token: &AccessToken) -> CredentialResult<()> {
        (**self).save_token(token)
    }

    fn clear_token(&self) -> CredentialResult<()> {
        (**self).clear_token()
    }
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<AccessToken>>,
}

impl MemoryCredentialStore {
    pub fn new(token: Option<AccessToken>) -> Self {
        Self {
            token: Mutex::new(token),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load_token(&self) -> CredentialResult<Option<AccessToken>> {
        self.token
            .lock()
            .map(|guard| guard.clone())
            .map_err(|error| CredentialError::SecureStorage(error.to_string()))
    }

    fn save_token(&self, token: &AccessToken) -> CredentialResult<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|error| CredentialError::SecureStorage(error.to_string()))?;
        *guard = Some(token.clone());
        Ok(())
    }

    fn clear_token(&self) -> CredentialResult<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|error| CredentialError::SecureStorage(error.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Loads the token for a call in `phase`. A missing token is
/// [`ApiError::Auth`]; a store failure is [`ApiError::Credential`] and must not
/// lead to the credential being cleared.
pub(crate) fn current_token<C: CredentialStore + ?Sized>(
    store: &C,
    phase: Phase,
) -> Result<AccessToken, ApiError> {
    match store.load_token() {
        Ok(Some(token)) => Ok(token),
        Ok(None) => Err(ApiError::Auth { phase }),
        Err(error) => {
            tracing::warn!("Failed to load access token: {}", error);
            Err(ApiError::Credential(error.to_string()))
        }
    }
}

/// Clears the stored token after the server rejected it.
pub(crate) fn invalidate<C: CredentialStore + ?Sized>(store: &C) {
    if let Err(error) = store.clear_token() {
        tracing::warn!("Failed to clear rejected access token: {}", error);
    } else {
        tracing::info!("Access token rejected by server; stored credential cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::UnreadableCredentialStore;

    #[test]
    fn access_token_debug_redacts_secret() {
        let token = AccessToken::new("super-secret").unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn access_token_rejects_blank_values() {
        assert!(AccessToken::new("   ").is_none());
        assert_eq!(AccessToken::new(" abc ").unwrap().secret(), "abc");
    }

    #[test]
    fn memory_store_invalidate_clears_token() {
        let store = MemoryCredentialStore::new(AccessToken::new("abc"));
        assert!(current_token(&store, Phase::Upload).is_ok());
        invalidate(&store);
        assert_eq!(
            current_token(&store, Phase::Upload).unwrap_err(),
            ApiError::Auth {
                phase: Phase::Upload
            }
        );
    }

    #[test]
    fn unreadable_store_is_a_credential_error_not_auth() {
        let store = UnreadableCredentialStore::default();
        let error = current_token(&store, Phase::Submission).unwrap_err();
        assert!(matches!(error, ApiError::Credential(ref message) if message.contains("locked")));
        assert!(!error.is_auth());
    }
}
