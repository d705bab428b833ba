pub mod dynamodb;
pub mod edgar_submissions;
pub mod extractor;
pub mod filing_store;
pub mod memory_store;
pub mod statement_text;
