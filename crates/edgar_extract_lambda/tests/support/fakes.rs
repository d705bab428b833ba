#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use edgar_extract_core::contract::{FilingRecord, NormalizedExtractRequest};
use edgar_extract_lambda::adapters::extractor::{ExtractionError, FilingExtractor};
use edgar_extract_lambda::adapters::filing_store::{FilingStore, StoreError};
use serde_json::json;

/// Returns a small JSON document built from the request and counts calls.
#[derive(Debug, Default)]
pub struct FixedExtractor {
    calls: AtomicUsize,
}

impl FixedExtractor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FilingExtractor for FixedExtractor {
    async fn extract(&self, request: &NormalizedExtractRequest) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "cik": request.cik,
            "formType": request.form_type,
            "balanceSheet": {"totalAssets": "352583"},
        })
        .to_string())
    }
}

/// Sleeps before answering, for timeout scenarios.
pub struct SlowExtractor {
    pub delay: Duration,
}

#[async_trait]
impl FilingExtractor for SlowExtractor {
    async fn extract(&self, _request: &NormalizedExtractRequest) -> Result<String, ExtractionError> {
        tokio::time::sleep(self.delay).await;
        Ok(r#"{"late":true}"#.to_string())
    }
}

pub struct FailingExtractor {
    pub error: ExtractionError,
}

#[async_trait]
impl FilingExtractor for FailingExtractor {
    async fn extract(&self, _request: &NormalizedExtractRequest) -> Result<String, ExtractionError> {
        Err(self.error.clone())
    }
}

/// Rejects every call, like a table that does not exist.
#[derive(Debug, Default)]
pub struct UnavailableStore {
    put_attempts: AtomicUsize,
}

impl UnavailableStore {
    pub fn put_attempts(&self) -> usize {
        self.put_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FilingStore for UnavailableStore {
    fn target(&self) -> &str {
        "filings-missing"
    }

    async fn put(&self, _record: &FilingRecord) -> Result<(), StoreError> {
        self.put_attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable(
            "requested resource not found".to_string(),
        ))
    }

    async fn get(&self, _id: &str) -> Result<Option<FilingRecord>, StoreError> {
        Err(StoreError::Unavailable(
            "requested resource not found".to_string(),
        ))
    }
}
