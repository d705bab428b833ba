use async_trait::async_trait;
use edgar_extract_core::contract::FilingRecord;
use edgar_extract_core::schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record id must be non-empty")]
    MissingId,
    #[error("record '{0}' already exists")]
    DuplicateId(String),
    #[error("filing store unavailable: {0}")]
    Unavailable(String),
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}

impl From<SchemaError> for StoreError {
    fn from(error: SchemaError) -> Self {
        Self::Corrupt(error.to_string())
    }
}

/// Keyed record store. A successful `put` is durable and visible to the next
/// `get` for the same id; ids are never overwritten.
#[async_trait]
pub trait FilingStore: Send + Sync {
    /// Name of the backing table the store writes to.
    fn target(&self) -> &str;

    async fn put(&self, record: &FilingRecord) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<FilingRecord>, StoreError>;
}

pub fn ensure_record_id(record: &FilingRecord) -> Result<(), StoreError> {
    if record.id().trim().is_empty() {
        return Err(StoreError::MissingId);
    }
    Ok(())
}
