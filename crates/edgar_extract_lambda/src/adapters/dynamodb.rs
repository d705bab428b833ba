use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use edgar_extract_core::contract::FilingRecord;
use edgar_extract_core::schema::{
    record_from_attributes, record_to_attributes, PARTITION_KEY, RECORD_ATTRIBUTES,
};

use crate::adapters::filing_store::{ensure_record_id, FilingStore, StoreError};

pub struct DynamoDbFilingStore {
    table_name: String,
    client: aws_sdk_dynamodb::Client,
}

impl DynamoDbFilingStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            client,
        }
    }

    /// Resolves region and credentials from the Lambda environment.
    pub async fn from_default_aws_config(table_name: impl Into<String>) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_dynamodb::Client::new(&aws_config), table_name)
    }
}

pub fn record_to_item(record: &FilingRecord) -> HashMap<String, AttributeValue> {
    record_to_attributes(record)
        .into_iter()
        .map(|(name, value)| (name, AttributeValue::S(value)))
        .collect()
}

pub fn record_from_item(item: &HashMap<String, AttributeValue>) -> Result<FilingRecord, StoreError> {
    let mut attributes = BTreeMap::new();
    for name in RECORD_ATTRIBUTES {
        if let Some(value) = item.get(name) {
            let text = value.as_s().map_err(|_| {
                StoreError::Corrupt(format!("attribute '{name}' is not a string"))
            })?;
            attributes.insert(name.to_string(), text.clone());
        }
    }
    Ok(record_from_attributes(&attributes)?)
}

#[async_trait]
impl FilingStore for DynamoDbFilingStore {
    fn target(&self) -> &str {
        &self.table_name
    }

    async fn put(&self, record: &FilingRecord) -> Result<(), StoreError> {
        ensure_record_id(record)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_to_item(record)))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", PARTITION_KEY)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                let duplicate = error
                    .as_service_error()
                    .is_some_and(|service| service.is_conditional_check_failed_exception());
                if duplicate {
                    StoreError::DuplicateId(record.id().to_string())
                } else {
                    StoreError::Unavailable(format!(
                        "failed to put item into {}: {}",
                        self.table_name,
                        DisplayErrorContext(&error)
                    ))
                }
            })
    }

    async fn get(&self, id: &str) -> Result<Option<FilingRecord>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(PARTITION_KEY, AttributeValue::S(id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|error| {
                StoreError::Unavailable(format!(
                    "failed to get item from {}: {}",
                    self.table_name,
                    DisplayErrorContext(&error)
                ))
            })?;

        output.item().map(record_from_item).transpose()
    }
}
