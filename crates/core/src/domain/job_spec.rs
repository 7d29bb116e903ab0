// Job Specification Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// The Job application ID - a 'well known' identity.
pub const DM_JOB_APPLICATION_ID: &str = "datamanagerjobs.squonk.it";

/// Identifies a Job (collection, job and version) and the variables
/// passed to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpecification {
    pub collection: String,
    pub job: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Map<String, serde_json::Value>>,
}

impl JobSpecification {
    pub fn new(
        collection: impl Into<String>,
        job: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            job: job.into(),
            version: version.into(),
            variables: None,
        }
    }

    /// Add (or replace) a Job variable
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.variables
            .get_or_insert_with(serde_json::Map::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("collection", &self.collection),
            ("job", &self.job),
            ("version", &self.version),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "job specification {} cannot be empty",
                    field
                )));
            }
        }
        Ok(())
    }

    /// The specification rendered as JSON text,
    /// which is how the Data Manager expects it.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_specification_json() {
        let spec = JobSpecification::new("rdkit", "rdkit-molprops", "1.0.0")
            .with_variable("separator", "tab")
            .with_variable("inputFile", "work/100.smi");

        let value: serde_json::Value = serde_json::from_str(&spec.to_json_string()).unwrap();
        assert_eq!(
            value,
            json!({
                "collection": "rdkit",
                "job": "rdkit-molprops",
                "version": "1.0.0",
                "variables": {"separator": "tab", "inputFile": "work/100.smi"}
            })
        );
    }

    #[test]
    fn test_specification_without_variables() {
        let spec = JobSpecification::new("im-test", "nop", "1.0.0");
        assert_eq!(
            spec.to_json_string(),
            r#"{"collection":"im-test","job":"nop","version":"1.0.0"}"#
        );
    }

    #[test]
    fn test_validate_empty_fields() {
        assert!(JobSpecification::new("im-test", "nop", "1.0.0").validate().is_ok());

        let err = JobSpecification::new("im-test", " ", "1.0.0")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("job"));
    }
}
