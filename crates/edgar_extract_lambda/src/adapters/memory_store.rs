use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use edgar_extract_core::contract::FilingRecord;

use crate::adapters::filing_store::{ensure_record_id, FilingStore, StoreError};

/// Process-local store used by the local API and tests.
#[derive(Debug)]
pub struct InMemoryFilingStore {
    target: String,
    records: RwLock<HashMap<String, FilingRecord>>,
}

impl InMemoryFilingStore {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Counts records even after a writer panicked mid-write; a poisoned map
    /// still holds every record inserted before the panic.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl FilingStore for InMemoryFilingStore {
    fn target(&self) -> &str {
        &self.target
    }

    async fn put(&self, record: &FilingRecord) -> Result<(), StoreError> {
        ensure_record_id(record)?;
        let mut records = self.records.write().map_err(|_| poisoned())?;
        match records.entry(record.id().to_string()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateId(record.id().to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<FilingRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(id).cloned())
    }
}
