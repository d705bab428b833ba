//! Attribute layout of the filings table.
//!
//! One logical table, partitioned by `id`, every attribute a string. Store
//! adapters translate between this map and their native item type.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::contract::FilingRecord;

pub const ATTR_ID: &str = "id";
pub const ATTR_CIK: &str = "cik";
pub const ATTR_FILING_DATE: &str = "filingDate";
pub const ATTR_DATA: &str = "data";
pub const PARTITION_KEY: &str = ATTR_ID;
pub const RECORD_ATTRIBUTES: [&str; 4] = [ATTR_ID, ATTR_CIK, ATTR_FILING_DATE, ATTR_DATA];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("stored item is missing attribute '{0}'")]
    MissingAttribute(&'static str),
    #[error("stored item has an empty 'id' attribute")]
    EmptyId,
}

pub fn record_to_attributes(record: &FilingRecord) -> BTreeMap<String, String> {
    BTreeMap::from([
        (ATTR_ID.to_string(), record.id().to_string()),
        (ATTR_CIK.to_string(), record.cik().to_string()),
        (ATTR_FILING_DATE.to_string(), record.filing_date().to_string()),
        (ATTR_DATA.to_string(), record.data().to_string()),
    ])
}

pub fn record_from_attributes(
    attributes: &BTreeMap<String, String>,
) -> Result<FilingRecord, SchemaError> {
    let lookup = |name: &'static str| {
        attributes
            .get(name)
            .ok_or(SchemaError::MissingAttribute(name))
    };

    let id = lookup(ATTR_ID)?;
    if id.trim().is_empty() {
        return Err(SchemaError::EmptyId);
    }

    Ok(FilingRecord::from_parts(
        id.as_str(),
        lookup(ATTR_CIK)?.as_str(),
        lookup(ATTR_FILING_DATE)?.as_str(),
        lookup(ATTR_DATA)?.as_str(),
    ))
}
