use pointbook_core::auth::{AccessToken, CredentialStore};

use crate::auth::KeyringCredentialStore;
use crate::cli::AuthCommands;
use crate::commands::common::read_piped_stdin;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { profile, token } => {
            let profile_name = resolve_profile(profile.as_deref().or(global_profile))?;
            let raw = match token {
                Some(token) => Some(token),
                None => read_piped_stdin()?,
            };
            let token = raw.and_then(AccessToken::new).ok_or_else(|| {
                CliError::Auth("no token given; pass --token or pipe it on stdin".to_string())
            })?;

            KeyringCredentialStore::for_profile(&profile_name)
                .save_token(&token)
                .map_err(|error| CliError::Auth(error.to_string()))?;
            println!("Stored access token for profile '{profile_name}'");
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let profile_name = resolve_profile(profile.as_deref().or(global_profile))?;
            let stored = KeyringCredentialStore::for_profile(&profile_name)
                .load_token()
                .map_err(|error| CliError::Auth(error.to_string()))?;
            if stored.is_some() {
                println!("Profile '{profile_name}' has a stored access token.");
            } else {
                println!("Profile '{profile_name}' is not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout { profile } => {
            let profile_name = resolve_profile(profile.as_deref().or(global_profile))?;
            KeyringCredentialStore::for_profile(&profile_name)
                .clear_token()
                .map_err(|error| CliError::Auth(error.to_string()))?;
            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}

fn resolve_profile(explicit: Option<&str>) -> Result<String, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    Ok(config.resolve_profile_name(explicit))
}
