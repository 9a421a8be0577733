use std::env;
use std::path::{Path, PathBuf};

use pointbook_core::config::{validate_request_timeout, DEFAULT_REQUEST_TIMEOUT_SECS};

use crate::cli::ConfigCommands;
use crate::commands::common::resolve_drafts_path;
use crate::config_profiles::{
    default_config_path, is_http_url, normalize_text_option, CliProfile, CliProfilesConfig,
    API_URL_ENV,
};
use crate::error::CliError;

pub fn run_config(
    command: ConfigCommands,
    global_profile: Option<&str>,
    drafts_override: Option<&Path>,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_base_url,
            timeout,
            profile_drafts_path,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            api_base_url,
            timeout,
            profile_drafts_path,
            no_activate,
        ),
        ConfigCommands::Show { profile } => {
            run_config_show(profile.as_deref().or(global_profile), drafts_override)
        }
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    api_base_url: Option<String>,
    timeout: Option<u64>,
    drafts_path: Option<PathBuf>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing_profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged = merge_profile(
        &existing_profile,
        api_base_url,
        timeout,
        drafts_path,
        normalize_text_option(env::var(API_URL_ENV).ok()),
    );
    validate_profile(&merged)?;
    *config.profile_mut_or_default(&profile_name) = merged;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let ready = config
        .profile(&profile_name)
        .and_then(CliProfile::api_base_url)
        .is_some();
    if ready {
        println!(
            "Profile '{profile_name}' is ready. Run `pointbook auth login --token <TOKEN>`."
        );
    } else {
        println!("Profile '{profile_name}' is missing: api_base_url");
    }

    Ok(())
}

/// Explicit flags win, then the environment, then what the profile had.
pub fn merge_profile(
    existing: &CliProfile,
    api_base_url: Option<String>,
    timeout: Option<u64>,
    drafts_path: Option<PathBuf>,
    env_api_base_url: Option<String>,
) -> CliProfile {
    CliProfile {
        api_base_url: normalize_text_option(api_base_url)
            .or(env_api_base_url)
            .or_else(|| existing.api_base_url())
            .map(|url| url.trim_end_matches('/').to_string()),
        request_timeout_secs: timeout.or(existing.request_timeout_secs),
        drafts_path: drafts_path
            .filter(|path| !path.as_os_str().is_empty())
            .or_else(|| existing.drafts_path.clone()),
    }
}

pub fn validate_profile(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = profile.api_base_url() {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "api_base_url must include http:// or https://".to_string(),
            ));
        }
    }
    if let Some(timeout) = profile.request_timeout_secs {
        validate_request_timeout(timeout)?;
    }
    Ok(())
}

fn run_config_show(
    profile_name: Option<&str>,
    drafts_override: Option<&Path>,
) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();
    let config_path = default_config_path().map_err(CliError::Config)?;
    let drafts_path = resolve_drafts_path(drafts_override.map(Path::to_path_buf), &profile)?;
    let api_base_url = normalize_text_option(env::var(API_URL_ENV).ok())
        .or_else(|| profile.api_base_url())
        .unwrap_or_else(|| "(not set)".to_string());

    println!("config file:     {}", config_path.display());
    println!("profile:         {profile_name}");
    println!("api base url:    {api_base_url}");
    println!(
        "request timeout: {}s",
        profile
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    );
    println!("drafts file:     {}", drafts_path.display());
    Ok(())
}
