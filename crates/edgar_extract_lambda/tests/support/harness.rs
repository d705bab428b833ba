#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use edgar_extract_core::cors::{AllowedOrigins, CorsPolicy};
use edgar_extract_lambda::adapters::extractor::FilingExtractor;
use edgar_extract_lambda::adapters::filing_store::FilingStore;
use edgar_extract_lambda::adapters::memory_store::InMemoryFilingStore;
use edgar_extract_lambda::handlers::extract::ExtractionUnit;
use edgar_extract_lambda::handlers::http::HttpRequest;
use edgar_extract_lambda::router::{RequestRouter, EXTRACT_PATH};

use super::fakes::FixedExtractor;

pub const APP_ORIGIN: &str = "https://filings.example.com";
pub const SCENARIO_CIK: &str = "0000320193";
pub const SCENARIO_FILING_DATE: &str = "2024-03-01";

/// Router with explicit collaborators. `memory` is set only when the router
/// writes to the harness's own in-memory store.
pub struct RouterHarness {
    pub router: RequestRouter,
    pub memory: Option<Arc<InMemoryFilingStore>>,
}

impl RouterHarness {
    /// The in-memory store behind the router. Panics for harnesses built
    /// with `with_store`, whose records live elsewhere.
    pub fn store(&self) -> &InMemoryFilingStore {
        self.memory
            .as_deref()
            .expect("harness was built with a custom store")
    }
}

pub struct RouterHarnessBuilder {
    extractor: Arc<dyn FilingExtractor>,
    store: Option<Arc<dyn FilingStore>>,
    origins: BTreeSet<String>,
    timeout: Duration,
}

impl Default for RouterHarnessBuilder {
    fn default() -> Self {
        Self {
            extractor: Arc::new(FixedExtractor::default()),
            store: None,
            origins: BTreeSet::from([APP_ORIGIN.to_string()]),
            timeout: Duration::from_secs(5),
        }
    }
}

impl RouterHarnessBuilder {
    pub fn with_extractor(mut self, extractor: Arc<dyn FilingExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Routes writes to `store`; the harness then exposes no in-memory store.
    pub fn with_store(mut self, store: Arc<dyn FilingStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> RouterHarness {
        let (store, memory): (Arc<dyn FilingStore>, _) = match self.store {
            Some(store) => (store, None),
            None => {
                let memory = Arc::new(InMemoryFilingStore::new("filings-test"));
                (Arc::clone(&memory) as Arc<dyn FilingStore>, Some(memory))
            }
        };
        let unit = ExtractionUnit::new(store, self.extractor, self.timeout);
        let policy = CorsPolicy {
            allowed_origins: AllowedOrigins::List(self.origins),
            ..CorsPolicy::default()
        };
        let router = RequestRouter::new(policy, Arc::new(unit)).expect("test policy is valid");
        RouterHarness { router, memory }
    }
}

pub fn extract_body(cik: &str, filing_date: &str) -> String {
    serde_json::json!({"cik": cik, "filingDate": filing_date}).to_string()
}

pub fn post_extract(body: impl Into<String>) -> HttpRequest {
    HttpRequest::new("POST", EXTRACT_PATH)
        .with_header("content-type", "application/json")
        .with_header("origin", APP_ORIGIN)
        .with_body(body)
}
