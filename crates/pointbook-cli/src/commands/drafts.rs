use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use chrono::Utc;
use pointbook_core::export::{clear_all, PurgeConfirmation};
use pointbook_core::store::DraftStore;

use crate::cli::DraftsCommands;
use crate::commands::common::{format_draft_lines, resolve_draft_id, CommandContext};
use crate::commands::export::run_export;
use crate::error::CliError;

pub fn run_drafts(
    command: DraftsCommands,
    global_profile: Option<&str>,
    drafts_path: Option<&Path>,
) -> Result<(), CliError> {
    let context = CommandContext::load(global_profile, drafts_path)?;
    match command {
        DraftsCommands::List { json } => run_list(json, &context),
        DraftsCommands::Remove { id } => run_remove(&id, &context),
        DraftsCommands::Export { format, output } => {
            run_export(format, output.as_deref(), &context)
        }
        DraftsCommands::Clear { yes } => run_clear(yes, &context),
    }
}

fn run_list(as_json: bool, context: &CommandContext) -> Result<(), CliError> {
    let drafts = context.open_store()?.list()?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&drafts)?);
    } else if drafts.is_empty() {
        println!("No saved drafts.");
    } else {
        for line in format_draft_lines(&drafts, Utc::now()) {
            println!("{line}");
        }
    }

    Ok(())
}

fn run_remove(query: &str, context: &CommandContext) -> Result<(), CliError> {
    let store = context.open_store()?;
    let drafts = store.list()?;
    let draft_id = resolve_draft_id(query, &drafts)?;

    if store.remove(&draft_id)? {
        println!("Discarded draft {draft_id}");
        Ok(())
    } else {
        Err(CliError::DraftNotFound(draft_id.to_string()))
    }
}

pub fn run_clear(skip_prompt: bool, context: &CommandContext) -> Result<(), CliError> {
    let store = context.open_store()?;
    let count = match store.list() {
        Ok(drafts) if drafts.is_empty() => {
            println!("No saved drafts.");
            return Ok(());
        }
        Ok(drafts) => Some(drafts.len()),
        Err(error) => {
            eprintln!("Warning: the drafts file could not be read: {error}");
            None
        }
    };

    let confirmation = if skip_prompt {
        PurgeConfirmation::acknowledged()
    } else {
        prompt_purge_confirmation(count)?
    };

    let removed = clear_all(store.as_ref(), confirmation)?;
    match count {
        Some(_) => println!("Discarded {removed} draft(s)"),
        None => println!(
            "Reset the drafts file; the unreadable copy was kept next to {}",
            context.drafts_path.display()
        ),
    }
    Ok(())
}

fn prompt_purge_confirmation(count: Option<usize>) -> Result<PurgeConfirmation, CliError> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Err(CliError::PurgeNotConfirmed);
    }

    print!("{} Type 'yes' to continue: ", purge_prompt(count));
    io::stdout().flush()?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;

    if is_purge_acknowledged(&answer) {
        Ok(PurgeConfirmation::acknowledged())
    } else {
        Err(CliError::PurgeNotConfirmed)
    }
}

/// Question shown before a purge; `None` when the store could not be read.
pub fn purge_prompt(count: Option<usize>) -> String {
    match count {
        Some(count) => format!(
            "Discard {count} unsent draft(s)? Export them first with `pointbook drafts export`."
        ),
        None => "Reset the unreadable drafts file? A backup copy is kept next to it.".to_string(),
    }
}

pub fn is_purge_acknowledged(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
