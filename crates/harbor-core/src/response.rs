//! The JSON document written to stdout by `in` and `out`

use serde::{Deserialize, Serialize};

use crate::chart::RemoteChartMetadata;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub version: ResponseVersion,
    pub metadata: Vec<MetadataField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseVersion {
    pub version: String,
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataField {
    pub name: String,
    pub value: String,
}

impl Response {
    /// Build the response from Harbor's chart metadata
    ///
    /// Metadata entries the server did not report are left out.
    pub fn from_metadata(metadata: &RemoteChartMetadata) -> Self {
        let fields = [
            ("created", metadata.created.as_deref()),
            ("description", metadata.description.as_deref()),
            ("appVersion", metadata.app_version.as_deref()),
        ];

        Self {
            version: ResponseVersion {
                version: metadata.version.clone(),
                digest: metadata.digest.clone(),
            },
            metadata: fields
                .into_iter()
                .filter_map(|(name, value)| {
                    value.map(|value| MetadataField {
                        name: name.to_string(),
                        value: value.to_string(),
                    })
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> RemoteChartMetadata {
        RemoteChartMetadata {
            name: "demo".to_string(),
            version: "1.2.0".to_string(),
            app_version: Some("3.1".to_string()),
            description: Some("Demo chart".to_string()),
            created: Some("2024-01-02T03:04:05Z".to_string()),
            digest: "d1e2".to_string(),
        }
    }

    #[test]
    fn test_from_metadata() {
        let response = Response::from_metadata(&metadata());
        assert_eq!(response.version.version, "1.2.0");
        assert_eq!(response.version.digest, "d1e2");
        let names: Vec<&str> = response.metadata.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["created", "description", "appVersion"]);
    }

    #[test]
    fn test_missing_fields_are_skipped() {
        let mut meta = metadata();
        meta.description = None;
        meta.created = None;
        let response = Response::from_metadata(&meta);
        assert_eq!(response.metadata.len(), 1);
        assert_eq!(response.metadata[0].name, "appVersion");
        assert_eq!(response.metadata[0].value, "3.1");
    }
}
