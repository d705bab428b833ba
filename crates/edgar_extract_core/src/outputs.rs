use serde::{Deserialize, Serialize};

/// Informational values published after composition for deployment tooling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeclaredOutputs {
    #[serde(rename = "ApiEndpoint")]
    pub api_endpoint: String,
    #[serde(rename = "TableName")]
    pub table_name: String,
}

impl DeclaredOutputs {
    pub fn new(api_endpoint: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            api_endpoint: api_endpoint.into().trim_end_matches('/').to_string(),
            table_name: table_name.into(),
        }
    }

    pub fn extract_url(&self) -> String {
        format!("{}/extract", self.api_endpoint)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_with_deployment_output_names() {
        let outputs = DeclaredOutputs::new("https://abc.execute-api.us-east-1.amazonaws.com/", "Filings");

        assert_eq!(
            serde_json::to_value(&outputs).expect("outputs should serialize"),
            json!({
                "ApiEndpoint": "https://abc.execute-api.us-east-1.amazonaws.com",
                "TableName": "Filings"
            })
        );
        assert_eq!(
            outputs.extract_url(),
            "https://abc.execute-api.us-east-1.amazonaws.com/extract"
        );
    }
}
