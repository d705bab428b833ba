//! Wires configuration into the store, extractor, unit and router.
//!
//! Both binaries build their router here, once per process, so the Lambda and
//! local entry points serve the same route table and policy.

use std::sync::Arc;

use edgar_extract_core::contract::ValidationError;
use thiserror::Error;

use crate::adapters::dynamodb::DynamoDbFilingStore;
use crate::adapters::edgar_submissions::EdgarSubmissionsExtractor;
use crate::adapters::extractor::{FilingExtractor, SourceSelectingExtractor};
use crate::adapters::filing_store::FilingStore;
use crate::adapters::memory_store::InMemoryFilingStore;
use crate::adapters::statement_text::StatementTextExtractor;
use crate::config::{RuntimeConfig, StoreKind};
use crate::handlers::extract::ExtractionUnit;
use crate::router::RequestRouter;

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("failed to compile statement patterns: {0}")]
    Regex(#[from] regex::Error),
    #[error("failed to build EDGAR HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("invalid routing policy: {0}")]
    Policy(#[from] ValidationError),
}

pub async fn build_store(config: &RuntimeConfig) -> Arc<dyn FilingStore> {
    match config.store_kind {
        StoreKind::DynamoDb => Arc::new(
            DynamoDbFilingStore::from_default_aws_config(config.table_name.as_str()).await,
        ),
        StoreKind::Memory => Arc::new(InMemoryFilingStore::new(config.table_name.as_str())),
    }
}

pub fn build_extractor(
    config: &RuntimeConfig,
) -> Result<Arc<dyn FilingExtractor>, CompositionError> {
    let inline = StatementTextExtractor::new()?;
    let remote =
        EdgarSubmissionsExtractor::new(config.edgar_base_url.as_str(), &config.edgar_user_agent)?;
    Ok(Arc::new(SourceSelectingExtractor::new(inline, remote)))
}

pub fn build_router_with(
    config: &RuntimeConfig,
    store: Arc<dyn FilingStore>,
    extractor: Arc<dyn FilingExtractor>,
) -> Result<RequestRouter, CompositionError> {
    if config.cors.is_wildcard() {
        tracing::warn!("CORS allows any origin; set CORS_ALLOWED_ORIGINS to restrict callers");
    }

    let unit = ExtractionUnit::new(store, extractor, config.extract_timeout);
    let router = RequestRouter::new(config.cors.clone(), Arc::new(unit))?;

    tracing::info!(
        store = %config.store_kind,
        storage_target = %config.table_name,
        allowed_methods = %config.cors.allow_methods_value(),
        wildcard_origin = config.cors.is_wildcard(),
        timeout_secs = config.extract_timeout.as_secs(),
        "router_composed"
    );
    Ok(router)
}

pub async fn build_router(config: &RuntimeConfig) -> Result<RequestRouter, CompositionError> {
    let store = build_store(config).await;
    let extractor = build_extractor(config)?;
    build_router_with(config, store, extractor)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::{ENV_CORS_ALLOWED_ORIGINS, ENV_FILINGS_STORE};
    use crate::handlers::http::HttpRequest;

    fn memory_config(extra: &[(&str, &str)]) -> RuntimeConfig {
        let mut values: HashMap<String, String> =
            HashMap::from([(ENV_FILINGS_STORE.to_string(), "memory".to_string())]);
        for (name, value) in extra {
            values.insert(name.to_string(), value.to_string());
        }
        RuntimeConfig::from_lookup(|name| values.get(name).cloned()).expect("config")
    }

    #[tokio::test]
    async fn memory_composition_serves_inline_statements() {
        let router = build_router(&memory_config(&[(ENV_CORS_ALLOWED_ORIGINS, "*")]))
            .await
            .expect("router should build");

        let response = router
            .dispatch(
                HttpRequest::new("POST", "/extract")
                    .with_header("origin", "https://anywhere.example.org")
                    .with_body(
                        r#"{"cik":"320193","filingDate":"2024-03-01","content":"Total assets $352,583"}"#,
                    ),
            )
            .await;

        assert_eq!(response.status_code, 201);
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    }

    #[tokio::test]
    async fn memory_store_uses_configured_target() {
        let store = build_store(&memory_config(&[])).await;

        assert_eq!(store.target(), "filings-local");
    }
}
