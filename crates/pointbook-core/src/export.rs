//! Draft export and purge.
//!
//! Exporting never touches the store. Purging needs a [`PurgeConfirmation`],
//! which callers obtain only after the user explicitly agreed.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Draft;
use crate::store::DraftStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Serialized export document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftExport {
    pub exported_at: DateTime<Utc>,
    pub total: usize,
    pub drafts: Vec<Draft>,
}

impl DraftExport {
    pub fn new(drafts: Vec<Draft>, exported_at: DateTime<Utc>) -> Self {
        Self {
            exported_at,
            total: drafts.len(),
            drafts,
        }
    }
}

pub fn render_json_export(export: &DraftExport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(export)
}

/// Human-readable summary, one section per draft.
#[must_use]
pub fn render_markdown_export(export: &DraftExport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Pending activity drafts");
    let _ = writeln!(output);
    let _ = writeln!(output, "Exported at: {}", export.exported_at.to_rfc3339());
    let _ = writeln!(output, "Total: {}", export.total);

    for draft in &export.drafts {
        let form = &draft.form_data;
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", form.title);
        let _ = writeln!(output);
        let _ = writeln!(output, "- id: {}", draft.id);
        let _ = writeln!(output, "- saved: {}", draft.timestamp.to_rfc3339());
        let _ = writeln!(output, "- status: {}", draft.status.as_str());
        let _ = writeln!(output, "- activity type: {}", form.activity_type_id);
        let _ = writeln!(output, "- competency: {}", form.competency_id);
        let _ = writeln!(output, "- evidence: {}", form.evidence.path.display());
        if let Some(url) = &draft.evidence_url {
            let _ = writeln!(output, "- evidence url: {url}");
        }
        let _ = writeln!(output, "- retries: {}", draft.retry_count);
        if let Some(error) = &draft.last_error {
            let _ = writeln!(output, "- last error: {error}");
        }
        let _ = writeln!(output);
        output.push_str(form.description.trim());
        output.push('\n');
    }

    output
}

/// Snapshot every draft and render it in `format`. Read-only.
pub fn export_all<S: DraftStore + ?Sized>(store: &S, format: ExportFormat) -> Result<String> {
    let export = DraftExport::new(store.list()?, Utc::now());
    tracing::debug!("Exporting {} draft(s) as {:?}", export.total, format);
    match format {
        ExportFormat::Json => Ok(render_json_export(&export)?),
        ExportFormat::Markdown => Ok(render_markdown_export(&export)),
    }
}

#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("pointbook-drafts-{timestamp_ms}.{}", format.extension())
}

/// Proof that the user agreed to discard every saved draft.
#[derive(Debug)]
pub struct PurgeConfirmation(());

impl PurgeConfirmation {
    /// Call only after the user explicitly acknowledged the data loss.
    #[must_use]
    pub const fn acknowledged() -> Self {
        Self(())
    }
}

/// Discard every draft. Returns how many were removed.
pub fn clear_all<S: DraftStore + ?Sized>(store: &S, _confirmation: PurgeConfirmation) -> Result<usize> {
    let removed = store.clear()?;
    tracing::warn!("Purged {} draft(s) from local storage", removed);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::fixtures::sample_form;
    use crate::store::MemoryDraftStore;

    fn store_with_two() -> MemoryDraftStore {
        MemoryDraftStore::with_drafts(vec![
            Draft::capture(sample_form("Hackathon"), None, "HTTP 500"),
            Draft::capture(
                sample_form("Blood drive"),
                Some("https://files.example.edu/e1.pdf".to_string()),
                "timeout",
            ),
        ])
    }

    #[test]
    fn json_export_has_document_shape() {
        let store = store_with_two();

        let rendered = export_all(&store, ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["total"], 2);
        assert!(value["exportedAt"].is_string());
        assert_eq!(value["drafts"].as_array().unwrap().len(), 2);
        assert_eq!(value["drafts"][0]["formData"]["title"], "Hackathon");
        assert_eq!(value["drafts"][1]["evidenceUrl"], "https://files.example.edu/e1.pdf");
    }

    #[test]
    fn export_is_non_destructive() {
        let store = store_with_two();
        let before = store.list().unwrap();

        export_all(&store, ExportFormat::Json).unwrap();
        export_all(&store, ExportFormat::Markdown).unwrap();

        assert_eq!(store.list().unwrap(), before);
    }

    #[test]
    fn json_export_parses_back_into_drafts() {
        let store = store_with_two();
        let rendered = export_all(&store, ExportFormat::Json).unwrap();

        let parsed: DraftExport = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed.drafts, store.list().unwrap());
    }

    #[test]
    fn markdown_export_lists_each_draft() {
        let rendered = export_all(&store_with_two(), ExportFormat::Markdown).unwrap();

        assert!(rendered.contains("Total: 2"));
        assert!(rendered.contains("## Hackathon"));
        assert!(rendered.contains("## Blood drive"));
        assert!(rendered.contains("- evidence url: https://files.example.edu/e1.pdf"));
        assert!(rendered.contains("- last error: HTTP 500"));
    }

    #[test]
    fn empty_export_reports_zero() {
        let rendered = export_all(&MemoryDraftStore::new(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["total"], 0);
    }

    #[test]
    fn clear_all_discards_everything() {
        let store = store_with_two();

        let removed = clear_all(&store, PurgeConfirmation::acknowledged()).unwrap();

        assert_eq!(removed, 2);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn suggested_export_file_name_uses_format_extension() {
        assert_eq!(
            suggested_export_file_name(ExportFormat::Json, 123),
            "pointbook-drafts-123.json"
        );
        assert_eq!(
            suggested_export_file_name(ExportFormat::Markdown, 456),
            "pointbook-drafts-456.md"
        );
    }
}
