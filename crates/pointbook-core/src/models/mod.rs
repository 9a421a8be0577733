//! Data models for Pointbook

mod activity;
mod draft;

pub use activity::{ActivityId, ActivityPayload, ActivityRecord, ActivityStatus};
pub use draft::{ActivityForm, Draft, DraftId, DraftStatus, EvidenceFile};

#[cfg(test)]
pub(crate) use draft::fixtures;
