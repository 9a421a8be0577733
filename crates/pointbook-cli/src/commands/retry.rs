use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pointbook_core::events::SubmissionEvents;
use pointbook_core::retry::{AttemptOutcome, DraftAttempt, RetryEngine, RetryReport};
use pointbook_core::HttpActivityApi;

use crate::commands::common::{announce_confirmations, preview, short_draft_id, CommandContext};
use crate::error::CliError;

pub async fn run_retry(
    watch_secs: Option<u64>,
    global_profile: Option<&str>,
    drafts_path: Option<&Path>,
) -> Result<(), CliError> {
    let context = CommandContext::load(global_profile, drafts_path)?;
    let api = HttpActivityApi::new(&context.api_config()?)?;
    let events = SubmissionEvents::new();
    let _confirmations = announce_confirmations(&events);
    let engine = RetryEngine::new(
        context.open_store()?,
        Arc::new(api),
        context.credentials(),
        events,
    );

    if let Some(secs) = watch_secs {
        println!("Retrying saved drafts every {secs}s, press Ctrl-C to stop");
        let shutdown = async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", error);
                std::future::pending::<()>().await;
            }
        };
        engine
            .run_periodic(Duration::from_secs(secs), shutdown, |report| {
                if report.attempts.is_empty() && report.store_error.is_none() {
                    return;
                }
                print_report(report);
            })
            .await;
        return Ok(());
    }

    let report = engine.retry_all().await;
    print_report(&report);
    match report.store_error {
        Some(error) => Err(CliError::RetryStorage(error)),
        None => Ok(()),
    }
}

fn print_report(report: &RetryReport) {
    for attempt in &report.attempts {
        if matches!(attempt.outcome, AttemptOutcome::Failed(_)) {
            println!("{}", format_attempt_line(attempt));
        }
    }
    println!("{}", format_retry_summary(report));
    if let Some(error) = &report.store_error {
        eprintln!("Draft storage problem: {error}");
    }
}

pub fn format_retry_summary(report: &RetryReport) -> String {
    let (succeeded, failed) = report.counts();
    if succeeded + failed == 0 {
        "No drafts to retry.".to_string()
    } else {
        format!(
            "Retried {} draft(s): {succeeded} submitted, {failed} still pending.",
            succeeded + failed
        )
    }
}

pub fn format_attempt_line(attempt: &DraftAttempt) -> String {
    let title = preview(&attempt.title, 32);
    match &attempt.outcome {
        AttemptOutcome::Confirmed(activity_id) => format!(
            "{}  {title}  submitted as {activity_id}",
            short_draft_id(&attempt.draft_id)
        ),
        AttemptOutcome::Failed(error) => format!(
            "{}  {title}  still pending: {error}",
            short_draft_id(&attempt.draft_id)
        ),
    }
}
