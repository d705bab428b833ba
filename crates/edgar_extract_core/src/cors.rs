//! Cross-origin policy model.
//!
//! The policy is plain configuration: it is parsed and validated once at
//! startup and then only queried. The default allows `POST` and no foreign
//! origins; a wildcard origin has to be configured explicitly.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::contract::ValidationError;

pub const DEFAULT_ALLOWED_HEADERS: [&str; 1] = ["content-type"];
pub const PREFLIGHT_MAX_AGE_SECS: u32 = 600;
pub const WILDCARD_ORIGIN: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            other => Err(ValidationError::new(format!(
                "unsupported HTTP method '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(BTreeSet<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allowed_methods: BTreeSet<HttpMethod>,
    pub allowed_origins: AllowedOrigins,
    pub allowed_headers: BTreeSet<String>,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_methods: BTreeSet::from([HttpMethod::Post]),
            allowed_origins: AllowedOrigins::List(BTreeSet::new()),
            allowed_headers: DEFAULT_ALLOWED_HEADERS
                .iter()
                .map(|header| header.to_string())
                .collect(),
        }
    }
}

impl CorsPolicy {
    /// Builds a policy from comma-separated settings. An empty origin list
    /// means no cross-origin caller is allowed; `*` alone allows any.
    pub fn from_settings(methods: &str, origins: &str) -> Result<Self, ValidationError> {
        let allowed_methods = methods
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(HttpMethod::from_str)
            .collect::<Result<BTreeSet<_>, _>>()?;

        let origin_entries: Vec<&str> = origins
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .collect();

        let allowed_origins = if origin_entries.contains(&WILDCARD_ORIGIN) {
            if origin_entries.len() > 1 {
                return Err(ValidationError::new(
                    "wildcard CORS origin cannot be combined with explicit origins",
                ));
            }
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(
                origin_entries
                    .into_iter()
                    .map(normalize_origin)
                    .collect::<Result<BTreeSet<_>, _>>()?,
            )
        };

        let policy = Self {
            allowed_methods,
            allowed_origins,
            ..Self::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.allowed_methods.is_empty() {
            return Err(ValidationError::new(
                "CORS allowed methods cannot be empty",
            ));
        }
        if self.allowed_methods.contains(&HttpMethod::Options) {
            return Err(ValidationError::new(
                "OPTIONS is answered by preflight handling and cannot be listed",
            ));
        }
        if let AllowedOrigins::List(origins) = &self.allowed_origins {
            for origin in origins {
                if normalize_origin(origin)? != *origin {
                    return Err(ValidationError::new(format!(
                        "CORS origin '{origin}' is not in canonical scheme://host[:port] form"
                    )));
                }
            }
        }
        for header in &self.allowed_headers {
            if header.is_empty()
                || header != &header.to_ascii_lowercase()
                || !header
                    .bytes()
                    .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-')
            {
                return Err(ValidationError::new(format!(
                    "invalid CORS header name '{header}'"
                )));
            }
        }
        Ok(())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.allowed_origins, AllowedOrigins::Any)
    }

    pub fn allows_method(&self, method: HttpMethod) -> bool {
        self.allowed_methods.contains(&method)
    }

    pub fn allows_origin(&self, origin: &str) -> bool {
        match &self.allowed_origins {
            AllowedOrigins::Any => true,
            AllowedOrigins::List(origins) => normalize_origin(origin)
                .map(|normalized| origins.contains(&normalized))
                .unwrap_or(false),
        }
    }

    /// Value for `Access-Control-Allow-Origin`, or `None` when the origin is
    /// not allowed.
    pub fn allow_origin_value(&self, origin: &str) -> Option<String> {
        match &self.allowed_origins {
            AllowedOrigins::Any => Some(WILDCARD_ORIGIN.to_string()),
            AllowedOrigins::List(_) if self.allows_origin(origin) => {
                Some(origin.trim().to_string())
            }
            AllowedOrigins::List(_) => None,
        }
    }

    pub fn allow_methods_value(&self) -> String {
        self.allowed_methods
            .iter()
            .map(|method| method.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn allow_headers_value(&self) -> String {
        self.allowed_headers
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Checks an `Access-Control-Request-Headers` value.
    pub fn allows_request_headers(&self, requested: &str) -> bool {
        requested
            .split(',')
            .map(|header| header.trim().to_ascii_lowercase())
            .filter(|header| !header.is_empty())
            .all(|header| self.allowed_headers.contains(&header))
    }
}

pub fn normalize_origin(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|_| ValidationError::new(format!("invalid CORS origin '{trimmed}'")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::new(format!(
            "CORS origin '{trimmed}' must use http or https"
        )));
    }
    if url.host_str().is_none() {
        return Err(ValidationError::new(format!(
            "CORS origin '{trimmed}' must include a host"
        )));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(ValidationError::new(format!(
            "CORS origin '{trimmed}' must not include a path, query, or fragment"
        )));
    }
    Ok(url.origin().ascii_serialization())
}
