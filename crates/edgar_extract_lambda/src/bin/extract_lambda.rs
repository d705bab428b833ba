use std::sync::Arc;

use edgar_extract_lambda::composition::build_router;
use edgar_extract_lambda::config::RuntimeConfig;
use edgar_extract_lambda::handlers::http::{error_response, ApiGatewayResponse, HttpRequest};
use edgar_extract_lambda::router::RequestRouter;
use edgar_extract_lambda::telemetry::{init_tracing, LogFormat};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::Instrument;

// Logged as ApiEndpoint when API_ENDPOINT is unset.
const UNDECLARED_ENDPOINT: &str = "https://undeclared.execute-api.invalid";

async fn handle_request(
    router: &RequestRouter,
    event: LambdaEvent<Value>,
) -> Result<ApiGatewayResponse, Error> {
    let span = tracing::info_span!("extract_request", request_id = %event.context.request_id);

    let request = match HttpRequest::from_apigw_event(event.payload) {
        Ok(request) => request,
        Err(message) => {
            span.in_scope(|| tracing::warn!(%message, "rejected_event"));
            return Ok(error_response(400, "invalid_request", &message));
        }
    };

    let response = router.dispatch(request).instrument(span.clone()).await;
    span.in_scope(|| tracing::info!(status_code = response.status_code, "request_completed"));
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing(LogFormat::Json)?;

    let config = RuntimeConfig::from_env()?;
    let outputs = config.declared_outputs(UNDECLARED_ENDPOINT);
    tracing::info!(
        outputs = %serde_json::to_string(&outputs)?,
        "declared_outputs"
    );

    let router = Arc::new(build_router(&config).await?);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let router = Arc::clone(&router);
        async move { handle_request(&router, event).await }
    }))
    .await
}
