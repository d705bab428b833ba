use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use edgar_extract_lambda::composition::build_router;
use edgar_extract_lambda::config::RuntimeConfig;
use edgar_extract_lambda::handlers::http::{error_response, ApiGatewayResponse, HttpRequest};
use edgar_extract_lambda::router::RequestRouter;
use edgar_extract_lambda::telemetry::{init_tracing, LogFormat};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 1024 * 1024;

async fn forward(State(router): State<Arc<RequestRouter>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return into_axum_response(error_response(
                413,
                "invalid_request",
                "Request body exceeds 1 MiB",
            ))
        }
    };

    let mut http_request = HttpRequest::new(parts.method.as_str(), parts.uri.path());
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            http_request = http_request.with_header(name.as_str(), value);
        }
    }
    if !bytes.is_empty() {
        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => http_request = http_request.with_body(text),
            Err(_) => {
                return into_axum_response(error_response(
                    400,
                    "invalid_request",
                    "Request body must be UTF-8",
                ))
            }
        }
    }

    into_axum_response(router.dispatch(http_request).await)
}

fn into_axum_response(response: ApiGatewayResponse) -> Response {
    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut axum_response = (status, Body::from(response.body)).into_response();
    for (name, value) in response.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            axum_response.headers_mut().insert(name, value);
        }
    }
    axum_response
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(LogFormat::Text)?;

    let config = RuntimeConfig::from_env()?;
    let router = Arc::new(build_router(&config).await?);

    let listener = TcpListener::bind(&config.local_bind_address).await?;
    let local_addr = listener.local_addr()?;
    let outputs = config.declared_outputs(&format!("http://{local_addr}"));
    tracing::info!(
        outputs = %serde_json::to_string(&outputs)?,
        extract_url = %outputs.extract_url(),
        "declared_outputs"
    );

    let app = Router::new()
        .fallback(forward)
        .with_state(router)
        .layer(TraceLayer::new_for_http());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("local API stopped");
    Ok(())
}
