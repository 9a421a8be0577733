use std::path::{Path, PathBuf};

use chrono::Utc;
use pointbook_core::export::{export_all, suggested_export_file_name};

use crate::cli::ExportFormat;
use crate::commands::common::CommandContext;
use crate::error::CliError;

pub fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    context: &CommandContext,
) -> Result<(), CliError> {
    let store = context.open_store()?;
    let rendered = export_all(store.as_ref(), format.into())?;

    if let Some(path) = output_path {
        let path = resolve_output_path(path, format, Utc::now().timestamp_millis());
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

/// A directory target gets a timestamped file name inside it.
pub fn resolve_output_path(path: &Path, format: ExportFormat, timestamp_ms: i64) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_export_file_name(format.into(), timestamp_ms))
    } else {
        path.to_path_buf()
    }
}
