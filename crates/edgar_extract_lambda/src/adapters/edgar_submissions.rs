//! Filing metadata lookup against the SEC EDGAR submissions API.
//!
//! `GET {base}/submissions/CIK##########.json` returns the company profile
//! plus column-oriented arrays of its recent filings. The extractor picks the
//! filing matching the request and records where its primary document lives.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use edgar_extract_core::contract::NormalizedExtractRequest;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::adapters::extractor::{ExtractionError, FilingExtractor};

pub const DEFAULT_EDGAR_BASE_URL: &str = "https://data.sec.gov";
pub const EDGAR_ARCHIVES_BASE_URL: &str = "https://www.sec.gov/Archives/edgar/data";
pub const SOURCE_EDGAR_SUBMISSIONS: &str = "edgar_submissions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CompanySubmissions {
    #[serde(default)]
    pub name: String,
    pub filings: SubmissionFilings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SubmissionFilings {
    pub recent: RecentFilings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilings {
    pub accession_number: Vec<String>,
    pub filing_date: Vec<String>,
    pub form: Vec<String>,
    #[serde(default)]
    pub report_date: Vec<String>,
    #[serde(default)]
    pub primary_document: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingMatch {
    pub accession_number: String,
    pub form: String,
    pub filing_date: String,
    pub report_date: Option<String>,
    pub primary_document: Option<String>,
}

pub fn find_filing(
    recent: &RecentFilings,
    request: &NormalizedExtractRequest,
) -> Option<FilingMatch> {
    (0..recent.accession_number.len()).find_map(|index| {
        let accession_number = &recent.accession_number[index];
        let filing_date = recent.filing_date.get(index)?;
        let form = recent.form.get(index)?;

        let accession_matches = request
            .accession_number
            .as_ref()
            .map_or(true, |wanted| wanted == accession_number);
        if filing_date != &request.filing_date || form != &request.form_type || !accession_matches
        {
            return None;
        }

        Some(FilingMatch {
            accession_number: accession_number.clone(),
            form: form.clone(),
            filing_date: filing_date.clone(),
            report_date: non_empty(&recent.report_date, index),
            primary_document: non_empty(&recent.primary_document, index),
        })
    })
}

fn non_empty(values: &[String], index: usize) -> Option<String> {
    values
        .get(index)
        .filter(|value| !value.trim().is_empty())
        .cloned()
}

/// Archive URL of a filing document. Archive paths use the CIK without
/// leading zeros and the accession number without dashes.
pub fn document_url(cik: &str, accession_number: &str, primary_document: &str) -> String {
    let cik = cik.trim_start_matches('0');
    let cik = if cik.is_empty() { "0" } else { cik };
    format!(
        "{EDGAR_ARCHIVES_BASE_URL}/{cik}/{}/{primary_document}",
        accession_number.replace('-', "")
    )
}

pub fn filing_document(
    submissions: &CompanySubmissions,
    filing: &FilingMatch,
    request: &NormalizedExtractRequest,
) -> Value {
    let location = filing
        .primary_document
        .as_deref()
        .map(|document| document_url(&request.cik, &filing.accession_number, document));

    json!({
        "source": SOURCE_EDGAR_SUBMISSIONS,
        "cik": request.cik,
        "entityName": submissions.name,
        "accessionNumber": filing.accession_number,
        "formType": filing.form,
        "filingDate": filing.filing_date,
        "reportDate": filing.report_date,
        "documentUrl": location,
        "fiscalYear": request.fiscal_year,
        "fiscalQuarter": request.fiscal_quarter,
        "extractedAt": Utc::now().to_rfc3339(),
    })
}

pub struct EdgarSubmissionsExtractor {
    client: reqwest::Client,
    base_url: String,
}

impl EdgarSubmissionsExtractor {
    /// The SEC rejects anonymous clients, so a contact user agent is required.
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn submissions_url(&self, cik: &str) -> String {
        format!("{}/submissions/CIK{cik}.json", self.base_url)
    }

    async fn fetch_submissions(&self, cik: &str) -> Result<CompanySubmissions, ExtractionError> {
        let url = self.submissions_url(cik);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| {
                ExtractionError::SourceUnavailable(format!("request to {url} failed: {error}"))
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ExtractionError::FilingNotFound(format!(
                "no EDGAR submissions for CIK {cik}"
            )));
        }
        if !status.is_success() {
            return Err(ExtractionError::SourceUnavailable(format!(
                "{url} answered with status {status}"
            )));
        }

        response.json::<CompanySubmissions>().await.map_err(|error| {
            ExtractionError::SourceUnavailable(format!(
                "undecodable submissions document from {url}: {error}"
            ))
        })
    }
}

#[async_trait]
impl FilingExtractor for EdgarSubmissionsExtractor {
    async fn extract(&self, request: &NormalizedExtractRequest) -> Result<String, ExtractionError> {
        let submissions = self.fetch_submissions(&request.cik).await?;
        let filing = find_filing(&submissions.filings.recent, request).ok_or_else(|| {
            ExtractionError::FilingNotFound(format!(
                "no {} filed on {} for CIK {}",
                request.form_type, request.filing_date, request.cik
            ))
        })?;

        tracing::debug!(
            cik = %request.cik,
            accession_number = %filing.accession_number,
            "edgar_filing_matched"
        );
        Ok(filing_document(&submissions, &filing, request).to_string())
    }
}
