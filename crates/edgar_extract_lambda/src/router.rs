//! Route table and CORS enforcement in front of the extraction unit.

use std::str::FromStr;
use std::sync::Arc;

use edgar_extract_core::contract::ValidationError;
use edgar_extract_core::cors::{CorsPolicy, HttpMethod, PREFLIGHT_MAX_AGE_SECS};

use crate::handlers::extract::ExtractionUnit;
use crate::handlers::http::{
    empty_response, error_response, json_response, ApiGatewayResponse, HttpRequest,
};

pub const EXTRACT_PATH: &str = "/extract";

struct Route {
    method: HttpMethod,
    path: &'static str,
    unit: Arc<ExtractionUnit>,
}

/// Immutable after construction; shared across requests behind an `Arc`.
pub struct RequestRouter {
    routes: Vec<Route>,
    policy: CorsPolicy,
}

impl RequestRouter {
    pub fn new(policy: CorsPolicy, unit: Arc<ExtractionUnit>) -> Result<Self, ValidationError> {
        policy.validate()?;
        let routes = vec![Route {
            method: HttpMethod::Post,
            path: EXTRACT_PATH,
            unit,
        }];

        for method in &policy.allowed_methods {
            if !routes.iter().any(|route| route.method == *method) {
                return Err(ValidationError::new(format!(
                    "CORS policy allows {method} but no route handles it"
                )));
            }
        }

        Ok(Self { routes, policy })
    }

    pub fn policy(&self) -> &CorsPolicy {
        &self.policy
    }

    /// `(method, path)` pairs in registration order.
    pub fn route_table(&self) -> Vec<(HttpMethod, &'static str)> {
        self.routes
            .iter()
            .map(|route| (route.method, route.path))
            .collect()
    }

    pub async fn dispatch(&self, request: HttpRequest) -> ApiGatewayResponse {
        let path = normalize_path(&request.path);
        let method = request.method.trim().to_ascii_uppercase();

        let parsed = HttpMethod::from_str(&method).ok();
        let known_path = self.routes.iter().any(|route| route.path == path);
        if known_path && parsed == Some(HttpMethod::Options) {
            return self.preflight(&request, path);
        }

        // Unrouted methods on a known path are unmatched like unknown paths.
        let Some(route) = parsed.and_then(|method| self.route_for(method, path)) else {
            tracing::debug!(%method, %path, "route_not_found");
            return error_response(
                404,
                "not_found",
                &format!("No route for {method} {path}"),
            );
        };

        let allow_origin = match request.header("origin") {
            None => None,
            Some(origin) => match self.policy.allow_origin_value(origin) {
                Some(value) => Some(value),
                None => {
                    tracing::debug!(%origin, %path, "cors_origin_rejected");
                    return cors_rejected(&format!("Origin {origin} is not allowed"));
                }
            },
        };

        tracing::debug!(
            %path,
            storage_target = %route.unit.storage_target(),
            timeout_ms = route.unit.timeout().as_millis() as u64,
            "dispatching_extract"
        );
        let body = request.body.as_deref().unwrap_or_default();
        let response = match route.unit.extract(body).await {
            Ok(accepted) => json_response(201, accepted),
            Err(error) => error_response(error.status_code(), error.error_code(), &error.to_string()),
        };

        match allow_origin {
            Some(value) => response
                .with_header("access-control-allow-origin", value)
                .with_header("vary", "Origin"),
            None => response,
        }
    }

    fn route_for(&self, method: HttpMethod, path: &str) -> Option<&Route> {
        if !self.policy.allows_method(method) {
            return None;
        }
        self.routes
            .iter()
            .find(|route| route.method == method && route.path == path)
    }

    fn preflight(&self, request: &HttpRequest, path: &str) -> ApiGatewayResponse {
        let Some(origin) = request.header("origin") else {
            return cors_rejected("Preflight request is missing an Origin header");
        };
        let Some(allow_origin) = self.policy.allow_origin_value(origin) else {
            tracing::debug!(%origin, %path, "cors_preflight_rejected");
            return cors_rejected(&format!("Origin {origin} is not allowed"));
        };

        let requested_method = request
            .header("access-control-request-method")
            .and_then(|value| HttpMethod::from_str(value).ok());
        let Some(requested_method) = requested_method else {
            return cors_rejected("Preflight request names no supported method");
        };
        if self.route_for(requested_method, path).is_none() {
            return cors_rejected(&format!(
                "Method {requested_method} is not allowed for {path}"
            ));
        }

        if let Some(requested_headers) = request.header("access-control-request-headers") {
            if !self.policy.allows_request_headers(requested_headers) {
                return cors_rejected(&format!(
                    "Request headers '{requested_headers}' are not allowed"
                ));
            }
        }

        empty_response(204)
            .with_header("access-control-allow-origin", allow_origin)
            .with_header(
                "access-control-allow-methods",
                self.policy.allow_methods_value(),
            )
            .with_header(
                "access-control-allow-headers",
                self.policy.allow_headers_value(),
            )
            .with_header("access-control-max-age", PREFLIGHT_MAX_AGE_SECS.to_string())
            .with_header("vary", "Origin")
    }
}

fn cors_rejected(message: &str) -> ApiGatewayResponse {
    error_response(403, "cors_rejected", message)
}

fn normalize_path(path: &str) -> &str {
    let path = path.split('?').next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::Duration;

    use async_trait::async_trait;
    use edgar_extract_core::contract::NormalizedExtractRequest;
    use edgar_extract_core::cors::AllowedOrigins;

    use super::*;
    use crate::adapters::extractor::{ExtractionError, FilingExtractor};
    use crate::adapters::memory_store::InMemoryFilingStore;

    struct FixedExtractor;

    #[async_trait]
    impl FilingExtractor for FixedExtractor {
        async fn extract(
            &self,
            _request: &NormalizedExtractRequest,
        ) -> Result<String, ExtractionError> {
            Ok(r#"{"totalAssets":"1"}"#.to_string())
        }
    }

    fn unit(store: Arc<InMemoryFilingStore>) -> Arc<ExtractionUnit> {
        Arc::new(ExtractionUnit::new(
            store,
            Arc::new(FixedExtractor),
            Duration::from_secs(5),
        ))
    }

    fn policy_for(origins: &[&str]) -> CorsPolicy {
        CorsPolicy {
            allowed_origins: AllowedOrigins::List(
                origins.iter().map(|origin| origin.to_string()).collect(),
            ),
            ..CorsPolicy::default()
        }
    }

    const BODY: &str = r#"{"cik":"320193","filingDate":"2024-03-01"}"#;

    #[test]
    fn normalizes_trailing_slashes_and_queries() {
        assert_eq!(normalize_path("/extract/"), "/extract");
        assert_eq!(normalize_path("/extract?x=1"), "/extract");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn rejects_policies_allowing_unrouted_methods() {
        let store = Arc::new(InMemoryFilingStore::new("filings-test"));
        let policy = CorsPolicy {
            allowed_methods: BTreeSet::from([HttpMethod::Post, HttpMethod::Get]),
            ..CorsPolicy::default()
        };

        let error = RequestRouter::new(policy, unit(store))
            .err()
            .expect("policy should be rejected");
        assert!(error.message().contains("GET"));
    }

    #[test]
    fn route_table_holds_only_post_extract() {
        let store = Arc::new(InMemoryFilingStore::new("filings-test"));
        let router = RequestRouter::new(CorsPolicy::default(), unit(store)).expect("router");

        assert_eq!(router.route_table(), vec![(HttpMethod::Post, EXTRACT_PATH)]);
    }

    #[tokio::test]
    async fn dispatches_post_without_origin() {
        let store = Arc::new(InMemoryFilingStore::new("filings-test"));
        let router =
            RequestRouter::new(CorsPolicy::default(), unit(Arc::clone(&store))).expect("router");

        let response = router
            .dispatch(HttpRequest::new("post", "/extract/").with_body(BODY))
            .await;

        assert_eq!(response.status_code, 201);
        assert_eq!(response.header("access-control-allow-origin"), None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn echoes_allowed_origin() {
        let store = Arc::new(InMemoryFilingStore::new("filings-test"));
        let router = RequestRouter::new(policy_for(&["https://app.example.com"]), unit(store))
            .expect("router");

        let response = router
            .dispatch(
                HttpRequest::new("POST", "/extract")
                    .with_header("Origin", "https://app.example.com")
                    .with_body(BODY),
            )
            .await;

        assert_eq!(response.status_code, 201);
        assert_eq!(
            response.header("access-control-allow-origin"),
            Some("https://app.example.com")
        );
        assert_eq!(response.header("vary"), Some("Origin"));
    }

    #[tokio::test]
    async fn unrouted_methods_on_extract_are_not_found() {
        let store = Arc::new(InMemoryFilingStore::new("filings-test"));
        let router =
            RequestRouter::new(CorsPolicy::default(), unit(Arc::clone(&store))).expect("router");

        for method in ["GET", "BREW"] {
            let response = router
                .dispatch(HttpRequest::new(method, "/extract").with_body(BODY))
                .await;

            assert_eq!(response.status_code, 404, "{method} /extract");
            assert_eq!(response.json_body().expect("json")["error"], "not_found");
            assert_eq!(response.header("allow"), None);
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn preflight_rejects_unlisted_request_headers() {
        let store = Arc::new(InMemoryFilingStore::new("filings-test"));
        let router = RequestRouter::new(policy_for(&["https://app.example.com"]), unit(store))
            .expect("router");

        let response = router
            .dispatch(
                HttpRequest::new("OPTIONS", "/extract")
                    .with_header("Origin", "https://app.example.com")
                    .with_header("Access-Control-Request-Method", "POST")
                    .with_header("Access-Control-Request-Headers", "Content-Type, X-Secret"),
            )
            .await;

        assert_eq!(response.status_code, 403);
        assert_eq!(
            response.json_body().expect("json")["error"],
            "cors_rejected"
        );
    }
}
