use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pointbook_core::config::{ApiConfig, DEFAULT_REQUEST_TIMEOUT_SECS};
use pointbook_core::events::{SubmissionEvents, SubmissionSource, Subscription};
use pointbook_core::models::{Draft, DraftId};
use pointbook_core::store::JsonFileDraftStore;

use crate::auth::KeyringCredentialStore;
use crate::config_profiles::{
    default_drafts_path, normalize_text_option, CliProfile, CliProfilesConfig, API_URL_ENV,
    DRAFTS_PATH_ENV,
};
use crate::error::CliError;

/// Resolved profile plus the drafts file it points at.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub profile_name: String,
    pub profile: CliProfile,
    pub drafts_path: PathBuf,
}

impl CommandContext {
    pub fn load(
        global_profile: Option<&str>,
        drafts_override: Option<&Path>,
    ) -> Result<Self, CliError> {
        let config = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile_name = config.resolve_profile_name(global_profile);
        let profile = config.profile(&profile_name).cloned().unwrap_or_default();
        let drafts_path = resolve_drafts_path(drafts_override.map(Path::to_path_buf), &profile)?;
        tracing::debug!(
            "Using profile '{}' with drafts at {}",
            profile_name,
            drafts_path.display()
        );

        Ok(Self {
            profile_name,
            profile,
            drafts_path,
        })
    }

    pub fn open_store(&self) -> Result<Arc<JsonFileDraftStore>, CliError> {
        Ok(Arc::new(JsonFileDraftStore::open(&self.drafts_path)?))
    }

    pub fn api_config(&self) -> Result<ApiConfig, CliError> {
        resolve_api_config(&self.profile_name, &self.profile)
    }

    pub fn credentials(&self) -> Arc<KeyringCredentialStore> {
        Arc::new(KeyringCredentialStore::for_profile(&self.profile_name))
    }
}

/// `POINTBOOK_API_URL`, then the profile's `api_base_url`.
pub fn resolve_api_config(profile_name: &str, profile: &CliProfile) -> Result<ApiConfig, CliError> {
    let base_url = normalize_text_option(env::var(API_URL_ENV).ok())
        .or_else(|| profile.api_base_url())
        .ok_or_else(|| {
            CliError::Config(format!(
                "No API base URL for profile '{profile_name}'. Run `pointbook config init --api-base-url <URL>` or set {API_URL_ENV}."
            ))
        })?;
    let timeout = profile
        .request_timeout_secs
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    Ok(ApiConfig::with_timeout(base_url, timeout)?)
}

/// `--drafts-path`, then `POINTBOOK_DRAFTS_PATH`, then the profile, then the
/// platform data directory.
pub fn resolve_drafts_path(
    cli_override: Option<PathBuf>,
    profile: &CliProfile,
) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_override {
        return Ok(path);
    }
    if let Some(path) = env::var_os(DRAFTS_PATH_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = profile.drafts_path.clone() {
        return Ok(path);
    }
    default_drafts_path().map_err(CliError::Config)
}

/// Prints every confirmation while the returned guard is alive.
pub fn announce_confirmations(events: &SubmissionEvents) -> Subscription {
    events.subscribe(|event| match event.source {
        SubmissionSource::Live => println!("Activity {} submitted", event.activity_id),
        SubmissionSource::Retry(draft_id) => println!(
            "Draft {} submitted as activity {}",
            short_draft_id(&draft_id),
            event.activity_id
        ),
    })
}

/// Full id or unique prefix of a stored draft.
pub fn resolve_draft_id(query: &str, drafts: &[Draft]) -> Result<DraftId, CliError> {
    let query = query.trim().to_ascii_lowercase();
    if query.is_empty() {
        return Err(CliError::EmptyDraftId);
    }

    let matching = drafts
        .iter()
        .map(|draft| draft.id)
        .filter(|id| id.to_string().starts_with(&query))
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::DraftNotFound(query)),
        [id] => Ok(*id),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(short_draft_id)
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousDraftId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_draft_id(id: &DraftId) -> String {
    id.to_string().chars().take(13).collect()
}

pub fn format_draft_lines(drafts: &[Draft], now: DateTime<Utc>) -> Vec<String> {
    let now_ms = now.timestamp_millis();
    drafts
        .iter()
        .map(|draft| {
            let short_id = short_draft_id(&draft.id);
            let title = preview(&draft.form_data.title, 32);
            let age = format_relative_time(draft.timestamp.timestamp_millis(), now_ms);
            let stage = if draft.has_uploaded_evidence() {
                "uploaded"
            } else {
                "local"
            };
            let error = draft
                .last_error
                .as_deref()
                .map(|error| preview(error, 60))
                .unwrap_or_default();
            format!(
                "{short_id:<13}  {title:<32}  {age:<10}  {stage:<8}  retries={}  {error}",
                draft.retry_count
            )
        })
        .collect()
}

/// First line, whitespace collapsed, cut to `max_chars` with an ellipsis.
pub fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_text_option(Some(buffer)))
}
