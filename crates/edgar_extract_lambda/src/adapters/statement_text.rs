use async_trait::async_trait;
use chrono::Utc;
use edgar_extract_core::contract::NormalizedExtractRequest;
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::adapters::extractor::{ExtractionError, FilingExtractor};

pub const SOURCE_STATEMENT_TEXT: &str = "statement_text";

// Label, optional colon/currency, then an amount such as 1,234.5 or (1,234).
const AMOUNT_PATTERN: &str = r"[\s:]*\$?\s*(\(?-?\d[\d,]*(?:\.\d+)?\)?)";

const BALANCE_SHEET_LABELS: [(&str, &str); 2] = [
    ("totalAssets", r"total\s+assets"),
    ("cashAndEquivalents", r"cash\s+and\s+cash\s+equivalents"),
];

const INCOME_STATEMENT_LABELS: [(&str, &str); 5] = [
    ("revenue", r"(?:total\s+)?(?:net\s+)?(?:revenues?|net\s+sales)"),
    ("operatingIncome", r"operating\s+income(?:\s*\(loss\))?"),
    ("netIncome", r"net\s+income(?:\s*\(loss\))?"),
    ("epsBasic", r"basic(?:\s+(?:earnings|net\s+income)\s+per\s+share)?"),
    ("epsDiluted", r"diluted(?:\s+(?:earnings|net\s+income)\s+per\s+share)?"),
];

struct LineItem {
    field: &'static str,
    pattern: Regex,
}

impl LineItem {
    fn compile(field: &'static str, label: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            field,
            pattern: Regex::new(&format!(r"(?i)\b{label}{AMOUNT_PATTERN}"))?,
        })
    }

    fn find(&self, text: &str) -> Option<String> {
        self.pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|amount| normalize_amount(amount.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementItems {
    pub balance_sheet: Map<String, Value>,
    pub income_statement: Map<String, Value>,
}

impl StatementItems {
    pub fn is_empty(&self) -> bool {
        self.balance_sheet.is_empty() && self.income_statement.is_empty()
    }
}

/// Pulls balance-sheet and income-statement line items out of statement text
/// supplied inline with the request.
pub struct StatementTextExtractor {
    balance_sheet: Vec<LineItem>,
    income_statement: Vec<LineItem>,
}

impl StatementTextExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            balance_sheet: compile_line_items(&BALANCE_SHEET_LABELS)?,
            income_statement: compile_line_items(&INCOME_STATEMENT_LABELS)?,
        })
    }

    pub fn extract_items(&self, text: &str) -> StatementItems {
        StatementItems {
            balance_sheet: find_line_items(&self.balance_sheet, text),
            income_statement: find_line_items(&self.income_statement, text),
        }
    }
}

fn compile_line_items(labels: &[(&'static str, &str)]) -> Result<Vec<LineItem>, regex::Error> {
    labels
        .iter()
        .map(|&(field, label)| LineItem::compile(field, label))
        .collect()
}

fn find_line_items(items: &[LineItem], text: &str) -> Map<String, Value> {
    items
        .iter()
        .filter_map(|item| {
            item.find(text)
                .map(|amount| (item.field.to_string(), Value::String(amount)))
        })
        .collect()
}

/// Amounts stay strings so reported values are not rounded; parentheses mark
/// negatives.
fn normalize_amount(raw: &str) -> String {
    let negative = raw.starts_with('-') || (raw.starts_with('(') && raw.ends_with(')'));
    let digits: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    if negative {
        format!("-{digits}")
    } else {
        digits
    }
}

#[async_trait]
impl FilingExtractor for StatementTextExtractor {
    async fn extract(&self, request: &NormalizedExtractRequest) -> Result<String, ExtractionError> {
        let Some(content) = request.content.as_deref() else {
            return Err(ExtractionError::InvalidSource(
                "statement text extraction requires content".to_string(),
            ));
        };

        let items = self.extract_items(content);
        if items.is_empty() {
            return Err(ExtractionError::InvalidSource(
                "no financial statement line items found in content".to_string(),
            ));
        }

        Ok(json!({
            "source": SOURCE_STATEMENT_TEXT,
            "cik": request.cik,
            "filingDate": request.filing_date,
            "formType": request.form_type,
            "fiscalYear": request.fiscal_year,
            "fiscalQuarter": request.fiscal_quarter,
            "balanceSheet": items.balance_sheet,
            "incomeStatement": items.income_statement,
            "extractedAt": Utc::now().to_rfc3339(),
        })
        .to_string())
    }
}
