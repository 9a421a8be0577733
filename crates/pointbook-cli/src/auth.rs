//! Per-profile access token persistence in the OS keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use pointbook_core::auth::{AccessToken, CredentialError, CredentialResult, CredentialStore};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "pointbook-cli";

#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    username: String,
}

impl KeyringCredentialStore {
    pub fn for_profile(profile_name: &str) -> Self {
        Self {
            username: format!("access_token:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> CredentialResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| CredentialError::SecureStorage(error.to_string()))
    }
}

impl CredentialStore for KeyringCredentialStore {
    #[cfg(not(test))]
    fn load_token(&self) -> CredentialResult<Option<AccessToken>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(AccessToken::new(raw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(CredentialError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_token(&self) -> CredentialResult<Option<AccessToken>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| CredentialError::SecureStorage(error.to_string()))?;
        Ok(guard.get(&self.username).cloned().and_then(AccessToken::new))
    }

    #[cfg(not(test))]
    fn save_token(&self, token: &AccessToken) -> CredentialResult<()> {
        self.entry()?
            .set_password(token.secret())
            .map_err(|error| CredentialError::SecureStorage(error.to_string()))
    }

    #[cfg(test)]
    fn save_token(&self, token: &AccessToken) -> CredentialResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| CredentialError::SecureStorage(error.to_string()))?;
        guard.insert(self.username.clone(), token.secret().to_string());
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_token(&self) -> CredentialResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(CredentialError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_token(&self) -> CredentialResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| CredentialError::SecureStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_scoped_per_profile() {
        let work = KeyringCredentialStore::for_profile("auth-test-work");
        let home = KeyringCredentialStore::for_profile("auth-test-home");

        work.save_token(&AccessToken::new("work-token").unwrap())
            .unwrap();

        assert_eq!(
            work.load_token().unwrap().map(|token| token.secret().to_string()),
            Some("work-token".to_string())
        );
        assert_eq!(home.load_token().unwrap(), None);
    }

    #[test]
    fn clear_token_is_idempotent() {
        let store = KeyringCredentialStore::for_profile("auth-test-clear");
        store
            .save_token(&AccessToken::new("token").unwrap())
            .unwrap();

        store.clear_token().unwrap();
        store.clear_token().unwrap();
        assert_eq!(store.load_token().unwrap(), None);
    }
}
