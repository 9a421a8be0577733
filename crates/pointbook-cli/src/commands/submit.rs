use std::path::Path;
use std::sync::Arc;

use pointbook_core::events::SubmissionEvents;
use pointbook_core::evidence::Evidence;
use pointbook_core::models::{ActivityForm, EvidenceFile};
use pointbook_core::submit::{SubmissionService, SubmitOutcome};
use pointbook_core::HttpActivityApi;

use crate::cli::SubmitArgs;
use crate::commands::common::{announce_confirmations, CommandContext};
use crate::config_profiles::normalize_text_option;
use crate::error::CliError;

pub async fn run_submit(
    args: SubmitArgs,
    global_profile: Option<&str>,
    drafts_path: Option<&Path>,
) -> Result<(), CliError> {
    let context = CommandContext::load(global_profile, drafts_path)?;
    // Drafts are retried later, possibly from another working directory.
    let evidence_path = std::path::absolute(&args.evidence)?;
    let evidence = Evidence::load(&evidence_path)?;
    let form = form_from_args(args, evidence.file.clone());

    let api = HttpActivityApi::new(&context.api_config()?)?;
    let events = SubmissionEvents::new();
    let _confirmations = announce_confirmations(&events);
    let service = SubmissionService::new(
        context.open_store()?,
        Arc::new(api),
        context.credentials(),
        events,
    );

    let outcome = service.submit_with_evidence(form, evidence).await?;
    if let SubmitOutcome::DraftSaved { draft_id, .. } = &outcome {
        eprintln!("{}", outcome.user_message());
        println!("Saved as draft {draft_id}");
    }
    Ok(())
}

pub fn form_from_args(args: SubmitArgs, evidence: EvidenceFile) -> ActivityForm {
    ActivityForm {
        title: args.title,
        description: args.description,
        activity_type_id: args.activity_type,
        competency_id: args.competency,
        notes: normalize_text_option(args.notes),
        event_id: normalize_text_option(args.event),
        recognized_course_id: normalize_text_option(args.course),
        evidence,
    }
}
