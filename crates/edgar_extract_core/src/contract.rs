use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

pub const RESPONSE_SCHEMA_VERSION: &str = "v1";
pub const CIK_WIDTH: usize = 10;
pub const DEFAULT_FORM_TYPE: &str = "10-Q";
pub const SUPPORTED_FORM_TYPES: [&str; 5] = ["10-K", "10-Q", "8-K", "20-F", "6-K"];
pub const FILING_DATE_FORMAT: &str = "%Y-%m-%d";
pub const STATUS_STORED: &str = "stored";

/// The single persisted entity. The id is assigned once, by whoever builds the
/// record, and has no setter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilingRecord {
    id: String,
    cik: String,
    #[serde(rename = "filingDate")]
    filing_date: String,
    data: String,
}

impl FilingRecord {
    /// Creates a record with a freshly generated id.
    pub fn new(
        cik: impl Into<String>,
        filing_date: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self::from_parts(Uuid::new_v4().to_string(), cik, filing_date, data)
    }

    /// Rebuilds a record whose id was assigned earlier, e.g. when decoding a
    /// stored item.
    pub fn from_parts(
        id: impl Into<String>,
        cik: impl Into<String>,
        filing_date: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            cik: cik.into(),
            filing_date: filing_date.into(),
            data: data.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cik(&self) -> &str {
        &self.cik
    }

    pub fn filing_date(&self) -> &str {
        &self.filing_date
    }

    pub fn data(&self) -> &str {
        &self.data
    }
}

/// Body of `POST /extract` as sent by clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExtractRequest {
    pub cik: String,
    #[serde(alias = "filing_date")]
    pub filing_date: String,
    #[serde(default = "default_form_type", alias = "form_type")]
    pub form_type: String,
    #[serde(default, alias = "accession_number")]
    pub accession_number: Option<String>,
    #[serde(default, alias = "fiscal_year")]
    pub fiscal_year: Option<u16>,
    #[serde(default, alias = "fiscal_quarter")]
    pub fiscal_quarter: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedExtractRequest {
    pub cik: String,
    pub filing_date: String,
    pub form_type: String,
    pub accession_number: Option<String>,
    pub fiscal_year: Option<u16>,
    pub fiscal_quarter: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractAccepted {
    pub id: String,
    pub cik: String,
    pub filing_date: String,
    pub form_type: String,
    pub request_fingerprint: String,
    pub status: String,
    pub schema_version: String,
}

impl ExtractAccepted {
    pub fn stored(
        record: &FilingRecord,
        request: &NormalizedExtractRequest,
        request_fingerprint: String,
    ) -> Self {
        Self {
            id: record.id().to_string(),
            cik: record.cik().to_string(),
            filing_date: record.filing_date().to_string(),
            form_type: request.form_type.clone(),
            request_fingerprint,
            status: STATUS_STORED.to_string(),
            schema_version: RESPONSE_SCHEMA_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn default_form_type() -> String {
    DEFAULT_FORM_TYPE.to_string()
}

pub fn normalize_request(
    payload: ExtractRequest,
) -> Result<NormalizedExtractRequest, ValidationError> {
    let cik = normalize_cik(&payload.cik)?;

    let filing_date = payload.filing_date.trim();
    let filing_date = NaiveDate::parse_from_str(filing_date, FILING_DATE_FORMAT)
        .map_err(|_| {
            ValidationError::new("filingDate must be a calendar date formatted as YYYY-MM-DD")
        })?
        .format(FILING_DATE_FORMAT)
        .to_string();

    let form_type = payload.form_type.trim().to_ascii_uppercase();
    if !SUPPORTED_FORM_TYPES.contains(&form_type.as_str()) {
        return Err(ValidationError::new(format!(
            "formType must be one of: {}",
            SUPPORTED_FORM_TYPES.join(", ")
        )));
    }

    let accession_number = match payload.accession_number {
        Some(value) => {
            let value = value.trim().to_string();
            if !is_accession_number(&value) {
                return Err(ValidationError::new(
                    "accessionNumber must match ##########-##-######",
                ));
            }
            Some(value)
        }
        None => None,
    };

    if let Some(year) = payload.fiscal_year {
        if !(1000..=9999).contains(&year) {
            return Err(ValidationError::new("fiscalYear must be a four-digit year"));
        }
    }

    let fiscal_quarter = match payload.fiscal_quarter {
        Some(value) => {
            let value = value.trim().to_ascii_uppercase();
            if !matches!(value.as_str(), "Q1" | "Q2" | "Q3" | "Q4") {
                return Err(ValidationError::new(
                    "fiscalQuarter must be Q1, Q2, Q3, or Q4",
                ));
            }
            Some(value)
        }
        None => None,
    };

    if let Some(content) = &payload.content {
        if content.trim().is_empty() {
            return Err(ValidationError::new(
                "content cannot be blank when provided",
            ));
        }
    }

    Ok(NormalizedExtractRequest {
        cik,
        filing_date,
        form_type,
        accession_number,
        fiscal_year: payload.fiscal_year,
        fiscal_quarter,
        content: payload.content,
    })
}

/// Accepts up to ten digits and left-pads them with zeros.
pub fn normalize_cik(raw: &str) -> Result<String, ValidationError> {
    let cik = raw.trim();
    if cik.is_empty() {
        return Err(ValidationError::new("cik cannot be empty"));
    }
    if cik.len() > CIK_WIDTH || !cik.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::new(
            "cik must be a numeric string of up to 10 digits",
        ));
    }
    Ok(format!("{cik:0>width$}", width = CIK_WIDTH))
}

pub fn is_accession_number(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    parts.len() == 3
        && parts
            .iter()
            .zip([10usize, 2, 6])
            .all(|(part, len)| part.len() == len && part.bytes().all(|b| b.is_ascii_digit()))
}

pub fn request_fingerprint(request: &NormalizedExtractRequest) -> String {
    let mut hasher = Sha256::new();
    let fiscal_year = request.fiscal_year.map(|year| year.to_string());
    for field in [
        Some(request.cik.as_str()),
        Some(request.filing_date.as_str()),
        Some(request.form_type.as_str()),
        request.accession_number.as_deref(),
        fiscal_year.as_deref(),
        request.fiscal_quarter.as_deref(),
        request.content.as_deref(),
    ] {
        match field {
            Some(value) => {
                hasher.update([1u8]);
                hasher.update((value.len() as u64).to_be_bytes());
                hasher.update(value.as_bytes());
            }
            None => hasher.update([0u8]),
        }
    }
    format!("{:x}", hasher.finalize())
}
