//! Normalized traffic records
//!
//! A record is one observed request/response pair, already extracted from
//! whatever log or trace format produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One observed request/response pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// HTTP method, uppercase
    #[serde(default)]
    pub method: String,

    /// Literal request path, e.g. `/api/users/123`
    #[serde(default)]
    pub path: String,

    /// Response status code; 0 when absent, which marks the record malformed
    #[serde(default)]
    pub status: u16,

    /// When the request was observed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Query parameters; key casing is preserved
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, Vec<String>>,

    /// Request headers; keys compare case-insensitively
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
}

impl NormalizedRecord {
    /// Create a record with no headers or query parameters
    pub fn new(method: impl Into<String>, path: impl Into<String>, status: u16) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            status,
            timestamp: None,
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }

    /// Set the observation timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Append a header value
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Append a query parameter value
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Literal path segments; empty segments are ignored
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }

    /// Values of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// Distinct header keys, lower-cased
    pub fn header_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .headers
            .keys()
            .map(|k| k.to_ascii_lowercase())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Reason the record cannot be analyzed, if any
    pub fn malformed_reason(&self) -> Option<&'static str> {
        if self.method.trim().is_empty() {
            Some("missing method")
        } else if self.path.trim().is_empty() {
            Some("missing path")
        } else if self.status == 0 {
            Some("missing status")
        } else if !(100..=599).contains(&self.status) {
            Some("invalid status")
        } else {
            None
        }
    }
}
