//! Durable draft store: the only persistence boundary for submissions the
//! server has not confirmed.
//!
//! The store is injected into the submit flow and the retry engine instead of
//! being reached as ambient state, so both can be exercised against
//! [`MemoryDraftStore`] in tests.

mod file;
mod memory;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{Draft, DraftId};

pub use file::JsonFileDraftStore;
pub use memory::MemoryDraftStore;

/// Ordered collection of drafts keyed by id.
///
/// Insertion order is chronological order. Implementations must make
/// `replace` and `update` a single atomic write.
pub trait DraftStore: Send + Sync {
    /// Add a draft at the end. Fails with [`Error::DuplicateDraft`] when the
    /// id is already stored.
    fn append(&self, draft: Draft) -> Result<()>;

    /// Full ordered list, read from storage at call time.
    fn list(&self) -> Result<Vec<Draft>>;

    /// Remove exactly one draft. Returns `false` when it was not stored.
    fn remove(&self, id: &DraftId) -> Result<bool>;

    /// Remove every draft, returning how many were discarded.
    fn clear(&self) -> Result<usize>;

    /// Overwrite the whole list in one write.
    fn replace(&self, drafts: Vec<Draft>) -> Result<()>;

    /// Read-modify-write under the store's lock, applied as one write.
    fn update(&self, apply: &mut dyn FnMut(Vec<Draft>) -> Vec<Draft>) -> Result<()>;

    fn get(&self, id: &DraftId) -> Result<Option<Draft>> {
        Ok(self.list()?.into_iter().find(|draft| draft.id == *id))
    }
}

impl<S: DraftStore + ?Sized> DraftStore for Arc<S> {
    fn append(&self, draft: Draft) -> Result<()> {
        (**self).append(draft)
    }

    fn list(&self) -> Result<Vec<Draft>> {
        (**self).list()
    }

    fn remove(&self, id: &DraftId) -> Result<bool> {
        (**self).remove(id)
    }

    fn clear(&self) -> Result<usize> {
        (**self).clear()
    }

    fn replace(&self, drafts: Vec<Draft>) -> Result<()> {
        (**self).replace(drafts)
    }

    fn update(&self, apply: &mut dyn FnMut(Vec<Draft>) -> Vec<Draft>) -> Result<()> {
        (**self).update(apply)
    }

    fn get(&self, id: &DraftId) -> Result<Option<Draft>> {
        (**self).get(id)
    }
}

/// Shared append rule: never overwrite an existing id.
fn push_unique(drafts: &mut Vec<Draft>, draft: Draft) -> Result<()> {
    if drafts.iter().any(|existing| existing.id == draft.id) {
        return Err(Error::DuplicateDraft(draft.id.to_string()));
    }
    drafts.push(draft);
    Ok(())
}
