//! The `ServiceSpec` contract document
//!
//! Every collection in the document has a deterministic order so that two
//! documents built from the same observations serialize byte-for-byte equal.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Contract format identifier
pub const API_VERSION: &str = "flowspec/v1alpha1";

/// Contract document kind
pub const KIND: &str = "ServiceSpec";

/// Top-level contract document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "SpecMetadata::is_empty")]
    pub metadata: SpecMetadata,
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
}

/// Descriptive metadata carried by the document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SpecMetadata {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}

impl ServiceSpec {
    /// Create a document with the fixed version and kind tags and sorted endpoints
    pub fn new(mut endpoints: Vec<EndpointSpec>) -> Self {
        for endpoint in &mut endpoints {
            endpoint.sort_operations();
        }
        endpoints.sort();
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: SpecMetadata::default(),
            endpoints,
        }
    }

    /// Attach a service name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = Some(name.into());
        self
    }

    /// Look up an endpoint by templated path
    pub fn endpoint(&self, path: &str) -> Option<&EndpointSpec> {
        self.endpoints.iter().find(|e| e.path == path)
    }

    /// Whether the version and kind tags are the ones this model understands
    pub fn is_supported_format(&self) -> bool {
        self.api_version == API_VERSION && self.kind == KIND
    }

    /// SHA-256 digest over every structural element of the document
    ///
    /// Each element is hashed behind a one-byte tag, so an absent name and
    /// an empty name produce different digests.
    ///
    /// Unlike `==`, which compares endpoints by path only, two documents
    /// share a fingerprint only when operations, required fields and status
    /// results match too.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.api_version.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.kind.as_bytes());
        hasher.update(b"\0");
        if let Some(name) = &self.metadata.name {
            hasher.update(b"\x06");
            hasher.update(name.as_bytes());
        }
        for endpoint in &self.endpoints {
            hasher.update(b"\x01");
            hasher.update(endpoint.path.as_bytes());
            for op in &endpoint.operations {
                hasher.update(b"\x02");
                hasher.update(op.method.as_bytes());
                for header in &op.required.headers {
                    hasher.update(b"\x03h");
                    hasher.update(header.as_bytes());
                }
                for key in &op.required.query {
                    hasher.update(b"\x03q");
                    hasher.update(key.as_bytes());
                }
                for code in &op.status.codes {
                    hasher.update(b"\x04");
                    hasher.update(code.to_be_bytes());
                }
                for range in &op.status.ranges {
                    hasher.update(b"\x05");
                    hasher.update(range.as_bytes());
                }
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// A templated path and the operations observed on it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// Templated path, e.g. `/api/users/{num}`
    pub path: String,
    pub operations: Vec<OperationSpec>,
}

impl EndpointSpec {
    pub fn new(path: impl Into<String>, operations: Vec<OperationSpec>) -> Self {
        let mut endpoint = Self {
            path: path.into(),
            operations,
        };
        endpoint.sort_operations();
        endpoint
    }

    /// Look up an operation by method
    pub fn operation(&self, method: &str) -> Option<&OperationSpec> {
        self.operations
            .iter()
            .find(|op| op.method.eq_ignore_ascii_case(method))
    }

    fn sort_operations(&mut self) {
        self.operations.sort_by(|a, b| a.method.cmp(&b.method));
    }
}

// Endpoint identity is its templated path.
impl PartialEq for EndpointSpec {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for EndpointSpec {}

impl PartialOrd for EndpointSpec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EndpointSpec {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

/// Expected behavior of one method on one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub method: String,
    #[serde(default)]
    pub required: RequiredFields,
    #[serde(default)]
    pub status: StatusResult,
}

/// Header and query keys a request must carry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredFields {
    /// Lower-cased header names
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub headers: BTreeSet<String>,
    /// Query parameter keys, casing preserved
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub query: BTreeSet<String>,
}

impl RequiredFields {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.query.is_empty()
    }
}

/// Accepted response statuses: exact codes or class ranges such as `2xx`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    /// Distinct codes, ascending
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codes: Vec<u16>,
    /// Distinct class labels, ascending
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<String>,
}

impl StatusResult {
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty() && self.ranges.is_empty()
    }

    /// Whether an observed status satisfies this result
    pub fn accepts(&self, status: u16) -> bool {
        self.codes.contains(&status) || self.ranges.iter().any(|r| *r == status_class(status))
    }
}

/// Class label of a status code: 404 becomes `4xx`
pub fn status_class(status: u16) -> String {
    format!("{}xx", status / 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(method: &str, codes: Vec<u16>) -> OperationSpec {
        OperationSpec {
            method: method.to_string(),
            required: RequiredFields::default(),
            status: StatusResult {
                codes,
                ranges: Vec::new(),
            },
        }
    }

    #[test]
    fn test_new_sorts_endpoints_and_operations() {
        let spec = ServiceSpec::new(vec![
            EndpointSpec::new("/b", vec![op("POST", vec![201]), op("GET", vec![200])]),
            EndpointSpec::new("/a", vec![op("GET", vec![200])]),
        ]);

        assert_eq!(spec.api_version, "flowspec/v1alpha1");
        assert_eq!(spec.kind, "ServiceSpec");
        let paths: Vec<&str> = spec.endpoints.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/b"]);
        let methods: Vec<&str> = spec.endpoints[1]
            .operations
            .iter()
            .map(|o| o.method.as_str())
            .collect();
        assert_eq!(methods, vec!["GET", "POST"]);
    }

    #[test]
    fn test_endpoint_equality_is_by_path() {
        let a = EndpointSpec::new("/a", vec![op("GET", vec![200])]);
        let b = EndpointSpec::new("/a", vec![op("POST", vec![201])]);
        assert_eq!(a, b);
        assert_ne!(a, EndpointSpec::new("/b", Vec::new()));
    }

    #[test]
    fn test_fingerprint_sees_operations() {
        let a = ServiceSpec::new(vec![EndpointSpec::new("/a", vec![op("GET", vec![200])])]);
        let b = ServiceSpec::new(vec![EndpointSpec::new("/a", vec![op("GET", vec![404])])]);

        assert_eq!(a, b);
        assert_eq!(a.fingerprint().len(), 64);
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_distinguishes_empty_name_from_none() {
        let unnamed = ServiceSpec::new(vec![EndpointSpec::new("/a", vec![op("GET", vec![200])])]);
        let empty = unnamed.clone().with_name("");
        let named = unnamed.clone().with_name("users");

        assert_ne!(unnamed.fingerprint(), empty.fingerprint());
        assert_ne!(unnamed.fingerprint(), named.fingerprint());
        assert_ne!(empty.fingerprint(), named.fingerprint());
    }

    #[test]
    fn test_serialization_uses_camel_case_and_omits_empty() {
        let spec = ServiceSpec::new(vec![EndpointSpec::new("/a", vec![op("GET", vec![200])])]);
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["apiVersion"], "flowspec/v1alpha1");
        assert_eq!(json["kind"], "ServiceSpec");
        assert!(json.get("metadata").is_none());
        let status = &json["endpoints"][0]["operations"][0]["status"];
        assert_eq!(status["codes"], serde_json::json!([200]));
        assert!(status.get("ranges").is_none());
    }

    #[test]
    fn test_yaml_document_parses() {
        let yaml = r#"
apiVersion: flowspec/v1alpha1
kind: ServiceSpec
metadata:
  name: users
endpoints:
  - path: /api/users/{num}
    operations:
      - method: GET
        required:
          headers: [authorization]
        status:
          ranges: ["2xx"]
"#;
        let spec: ServiceSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(spec.is_supported_format());
        assert_eq!(spec.metadata.name.as_deref(), Some("users"));
        let get = spec.endpoint("/api/users/{num}").and_then(|e| e.operation("get")).unwrap();
        assert!(get.required.headers.contains("authorization"));
        assert!(get.status.accepts(204));
        assert!(!get.status.accepts(404));
    }

    #[test]
    fn test_status_class() {
        assert_eq!(status_class(200), "2xx");
        assert_eq!(status_class(503), "5xx");
    }
}
