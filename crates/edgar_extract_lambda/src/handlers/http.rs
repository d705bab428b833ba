//! Transport-neutral request and response envelopes.
//!
//! Requests come from API Gateway proxy events or from the local axum server;
//! responses serialize as the API Gateway proxy response shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Header names are stored lower-cased; lookups are case-insensitive.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Accepts REST API (`httpMethod`/`path`) and HTTP API v2
    /// (`requestContext.http.method`/`rawPath`) proxy events.
    pub fn from_apigw_event(event: Value) -> Result<Self, String> {
        let Some(object) = event.as_object() else {
            return Err("Request event must be a JSON object".to_string());
        };

        let method = object
            .get("httpMethod")
            .and_then(Value::as_str)
            .or_else(|| event.pointer("/requestContext/http/method").and_then(Value::as_str))
            .ok_or_else(|| "Request event is missing an HTTP method".to_string())?;
        let path = object
            .get("path")
            .and_then(Value::as_str)
            .or_else(|| object.get("rawPath").and_then(Value::as_str))
            .ok_or_else(|| "Request event is missing a path".to_string())?;

        if object.get("isBase64Encoded").and_then(Value::as_bool) == Some(true) {
            return Err("Base64-encoded request bodies are not supported".to_string());
        }

        let mut request = Self::new(method, path);
        if let Some(headers) = object.get("headers").and_then(Value::as_object) {
            for (name, value) in headers {
                if let Some(value) = value.as_str() {
                    request = request.with_header(name, value);
                }
            }
        }

        match object.get("body") {
            None | Some(Value::Null) => {}
            Some(Value::String(text)) => request.body = Some(text.clone()),
            Some(body @ Value::Object(_)) => request.body = Some(body.to_string()),
            Some(_) => return Err("Request body must be a string or JSON object".to_string()),
        }

        Ok(request)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiGatewayResponse {
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

pub fn json_response(status_code: u16, payload: impl Serialize) -> ApiGatewayResponse {
    match serde_json::to_string(&payload) {
        Ok(body) => ApiGatewayResponse {
            status_code,
            headers: BTreeMap::from([("content-type".to_string(), CONTENT_TYPE_JSON.to_string())]),
            body,
        },
        Err(error) => error_response(500, "serialization_error", &error.to_string()),
    }
}

pub fn error_response(status_code: u16, error: &str, message: &str) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: BTreeMap::from([("content-type".to_string(), CONTENT_TYPE_JSON.to_string())]),
        body: json!({
            "error": error,
            "message": message,
        })
        .to_string(),
    }
}

pub fn empty_response(status_code: u16) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: BTreeMap::new(),
        body: String::new(),
    }
}
