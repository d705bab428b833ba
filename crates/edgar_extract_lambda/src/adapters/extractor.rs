use async_trait::async_trait;
use edgar_extract_core::contract::NormalizedExtractRequest;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("source document is invalid: {0}")]
    InvalidSource(String),
    #[error("filing not found: {0}")]
    FilingNotFound(String),
    #[error("filing source unavailable: {0}")]
    SourceUnavailable(String),
}

/// Turns a normalized request into the opaque `data` payload of a record.
#[async_trait]
pub trait FilingExtractor: Send + Sync {
    async fn extract(&self, request: &NormalizedExtractRequest) -> Result<String, ExtractionError>;
}

/// Uses the inline extractor when the request carries statement text and the
/// remote one otherwise.
pub struct SourceSelectingExtractor<I, R> {
    inline: I,
    remote: R,
}

impl<I, R> SourceSelectingExtractor<I, R> {
    pub fn new(inline: I, remote: R) -> Self {
        Self { inline, remote }
    }
}

#[async_trait]
impl<I, R> FilingExtractor for SourceSelectingExtractor<I, R>
where
    I: FilingExtractor,
    R: FilingExtractor,
{
    async fn extract(&self, request: &NormalizedExtractRequest) -> Result<String, ExtractionError> {
        if request.content.is_some() {
            self.inline.extract(request).await
        } else {
            self.remote.extract(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Labelled(&'static str);

    #[async_trait]
    impl FilingExtractor for Labelled {
        async fn extract(
            &self,
            _request: &NormalizedExtractRequest,
        ) -> Result<String, ExtractionError> {
            Ok(self.0.to_string())
        }
    }

    fn request(content: Option<&str>) -> NormalizedExtractRequest {
        NormalizedExtractRequest {
            cik: "0000320193".to_string(),
            filing_date: "2024-03-01".to_string(),
            form_type: "10-Q".to_string(),
            accession_number: None,
            fiscal_year: None,
            fiscal_quarter: None,
            content: content.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn selects_inline_extractor_only_when_content_is_present() {
        let extractor = SourceSelectingExtractor::new(Labelled("inline"), Labelled("remote"));

        assert_eq!(
            extractor.extract(&request(Some("Total assets $1"))).await,
            Ok("inline".to_string())
        );
        assert_eq!(extractor.extract(&request(None)).await, Ok("remote".to_string()));
    }
}
