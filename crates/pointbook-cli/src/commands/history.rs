use pointbook_core::api::ActivityApi;
use pointbook_core::auth::CredentialStore;
use pointbook_core::models::ActivityRecord;
use pointbook_core::HttpActivityApi;
use serde::Serialize;

use crate::commands::common::{preview, CommandContext};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub id: String,
    pub title: String,
    pub status: String,
    pub points: u32,
    pub created_at: String,
}

pub async fn run_history(as_json: bool, global_profile: Option<&str>) -> Result<(), CliError> {
    let context = CommandContext::load(global_profile, None)?;
    let credentials = context.credentials();
    let token = credentials
        .load_token()
        .map_err(|error| CliError::Auth(error.to_string()))?
        .ok_or_else(|| CliError::NotSignedIn(context.profile_name.clone()))?;
    let api = HttpActivityApi::new(&context.api_config()?)?;

    let records = match api.list_activities(&token).await {
        Ok(records) => records,
        Err(error) => {
            if error.is_auth() {
                credentials
                    .clear_token()
                    .map_err(|clear_error| CliError::Auth(clear_error.to_string()))?;
            }
            return Err(error.into());
        }
    };

    if as_json {
        let items = records.iter().map(history_item).collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if records.is_empty() {
        println!("No activities yet.");
    } else {
        for line in format_history_lines(&records) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn history_item(record: &ActivityRecord) -> HistoryItem {
    HistoryItem {
        id: record.id.to_string(),
        title: record.title.clone(),
        status: record.status.label().to_string(),
        points: record.points,
        created_at: record.created_at.to_rfc3339(),
    }
}

pub fn format_history_lines(records: &[ActivityRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            format!(
                "{}  {:<9}  {:>4} pts  {}",
                record.created_at.format("%Y-%m-%d"),
                record.status.label(),
                record.points,
                preview(&record.title, 48)
            )
        })
        .collect()
}
