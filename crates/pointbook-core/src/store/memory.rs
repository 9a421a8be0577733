//! In-memory draft store for tests and embedding.

use std::sync::{Mutex, MutexGuard};

use super::{push_unique, DraftStore};
use crate::error::{Error, Result};
use crate::models::{Draft, DraftId};

#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<Vec<Draft>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing drafts, preserving their order.
    pub fn with_drafts(drafts: Vec<Draft>) -> Self {
        Self {
            drafts: Mutex::new(drafts),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Draft>>> {
        self.drafts
            .lock()
            .map_err(|error| Error::Storage(error.to_string()))
    }
}

impl DraftStore for MemoryDraftStore {
    fn append(&self, draft: Draft) -> Result<()> {
        let mut drafts = self.lock()?;
        push_unique(&mut drafts, draft)
    }

    fn list(&self) -> Result<Vec<Draft>> {
        Ok(self.lock()?.clone())
    }

    fn remove(&self, id: &DraftId) -> Result<bool> {
        let mut drafts = self.lock()?;
        let before = drafts.len();
        drafts.retain(|draft| draft.id != *id);
        Ok(drafts.len() != before)
    }

    fn clear(&self) -> Result<usize> {
        let mut drafts = self.lock()?;
        let removed = drafts.len();
        drafts.clear();
        Ok(removed)
    }

    fn replace(&self, drafts: Vec<Draft>) -> Result<()> {
        *self.lock()? = drafts;
        Ok(())
    }

    fn update(&self, apply: &mut dyn FnMut(Vec<Draft>) -> Vec<Draft>) -> Result<()> {
        let mut drafts = self.lock()?;
        let current = std::mem::take(&mut *drafts);
        *drafts = apply(current);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract_tests::exercise_store;

    #[test]
    fn memory_store_satisfies_contract() {
        exercise_store(&MemoryDraftStore::new());
    }
}
