use std::sync::Arc;
use std::time::{Duration, Instant};

use edgar_extract_core::contract::{
    normalize_request, request_fingerprint, ExtractAccepted, ExtractRequest, FilingRecord,
};
use thiserror::Error;

use crate::adapters::extractor::{ExtractionError, FilingExtractor};
use crate::adapters::filing_store::{FilingStore, StoreError};

pub const DEFAULT_EXTRACT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("extraction succeeded but the record was not persisted: {0}")]
    Storage(#[from] StoreError),
    #[error("extraction exceeded its {}s time budget", .0.as_secs_f64())]
    Timeout(Duration),
}

impl ExtractError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::Extraction(ExtractionError::InvalidSource(_)) => 422,
            Self::Extraction(ExtractionError::FilingNotFound(_)) => 404,
            Self::Extraction(ExtractionError::SourceUnavailable(_)) => 502,
            Self::Storage(_) => 500,
            Self::Timeout(_) => 504,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Extraction(ExtractionError::InvalidSource(_)) => "extraction_failed",
            Self::Extraction(ExtractionError::FilingNotFound(_)) => "filing_not_found",
            Self::Extraction(ExtractionError::SourceUnavailable(_)) => "source_unavailable",
            Self::Storage(_) => "storage_failed",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// The processing unit behind `POST /extract`.
///
/// It is handed its store and extractor at construction and never looks
/// either up on its own. Each call makes at most one write attempt, and the
/// whole call is cut off after `timeout`.
pub struct ExtractionUnit {
    store: Arc<dyn FilingStore>,
    extractor: Arc<dyn FilingExtractor>,
    timeout: Duration,
}

impl ExtractionUnit {
    pub fn new(
        store: Arc<dyn FilingStore>,
        extractor: Arc<dyn FilingExtractor>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            extractor,
            timeout,
        }
    }

    pub fn storage_target(&self) -> &str {
        self.store.target()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn extract(&self, body: &str) -> Result<ExtractAccepted, ExtractError> {
        let started_at = Instant::now();
        match tokio::time::timeout(self.timeout, self.extract_and_store(body, started_at)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    storage_target = %self.store.target(),
                    "extract_timed_out"
                );
                Err(ExtractError::Timeout(self.timeout))
            }
        }
    }

    async fn extract_and_store(
        &self,
        body: &str,
        started_at: Instant,
    ) -> Result<ExtractAccepted, ExtractError> {
        let request: ExtractRequest = serde_json::from_str(body)
            .map_err(|error| ExtractError::InvalidRequest(format!("Malformed request: {error}")))?;
        let normalized = normalize_request(request)
            .map_err(|error| ExtractError::InvalidRequest(error.message().to_string()))?;
        let fingerprint = request_fingerprint(&normalized);

        tracing::info!(
            request_fingerprint = %fingerprint,
            cik = %normalized.cik,
            filing_date = %normalized.filing_date,
            form_type = %normalized.form_type,
            inline_content = normalized.content.is_some(),
            "extract_started"
        );

        let data = match self.extractor.extract(&normalized).await {
            Ok(data) if data.trim().is_empty() => {
                return Err(self.failed(
                    &fingerprint,
                    started_at,
                    ExtractionError::InvalidSource("extractor produced an empty payload".to_string())
                        .into(),
                ));
            }
            Ok(data) => data,
            Err(error) => return Err(self.failed(&fingerprint, started_at, error.into())),
        };

        let record = FilingRecord::new(normalized.cik.clone(), normalized.filing_date.clone(), data);
        if let Err(error) = self.store.put(&record).await {
            return Err(self.failed(&fingerprint, started_at, error.into()));
        }

        tracing::info!(
            request_fingerprint = %fingerprint,
            record_id = %record.id(),
            storage_target = %self.store.target(),
            duration_ms = started_at.elapsed().as_millis() as u64,
            "extract_completed"
        );
        Ok(ExtractAccepted::stored(&record, &normalized, fingerprint))
    }

    fn failed(&self, fingerprint: &str, started_at: Instant, error: ExtractError) -> ExtractError {
        let duration_ms = started_at.elapsed().as_millis() as u64;
        if error.status_code() >= 500 {
            tracing::error!(
                request_fingerprint = %fingerprint,
                status_code = error.status_code(),
                duration_ms,
                error = %error,
                "extract_failed"
            );
        } else {
            tracing::warn!(
                request_fingerprint = %fingerprint,
                status_code = error.status_code(),
                duration_ms,
                error = %error,
                "extract_failed"
            );
        }
        error
    }
}
