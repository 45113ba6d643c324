//! Spec assembly
//!
//! Turns the surviving endpoint accumulators into the final document.

use flowspec_model::{EndpointSpec, OperationSpec, ServiceSpec};

use super::aggregator::EndpointAggregator;
use super::required::RequiredFieldInferrer;
use super::status::StatusAggregation;
use crate::config::GenerationOptions;

pub struct SpecAssembler {
    required: RequiredFieldInferrer,
    status: StatusAggregation,
    service_name: Option<String>,
}

impl SpecAssembler {
    pub fn new(required: RequiredFieldInferrer, status: StatusAggregation) -> Self {
        Self {
            required,
            status,
            service_name: None,
        }
    }

    pub fn from_options(options: &GenerationOptions) -> Self {
        Self {
            required: RequiredFieldInferrer::new(options.required_threshold),
            status: options.status_aggregation,
            service_name: options.service_name.clone(),
        }
    }

    /// Build the document; endpoints end up sorted by path, operations by method
    pub fn assemble(&self, aggregator: &EndpointAggregator) -> ServiceSpec {
        let endpoints = aggregator
            .endpoints()
            .map(|(path, endpoint)| {
                let operations = endpoint
                    .operations()
                    .iter()
                    .map(|(method, op)| OperationSpec {
                        method: method.clone(),
                        required: self.required.infer(op),
                        status: self.status.aggregate(op.statuses()),
                    })
                    .collect();
                EndpointSpec::new(path.clone(), operations)
            })
            .collect();

        let spec = ServiceSpec::new(endpoints);
        match &self.service_name {
            Some(name) => spec.with_name(name.clone()),
            None => spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::segments::{RecordSummary, ShapeKey};

    fn summary(method: &str, status: u16, headers: &[&str]) -> RecordSummary {
        RecordSummary {
            shape: ShapeKey::new(method, 1),
            segments: vec!["x".to_string()],
            status,
            header_keys: headers.iter().map(|s| s.to_string()).collect(),
            query_keys: Vec::new(),
        }
    }

    #[test]
    fn test_assemble_orders_and_tags() {
        let mut aggregator = EndpointAggregator::new();
        aggregator.route("/z".into(), &summary("POST", 201, &[]));
        aggregator.route("/a".into(), &summary("PUT", 200, &["if-match"]));
        aggregator.route("/a".into(), &summary("GET", 200, &[]));
        aggregator.route("/a".into(), &summary("DELETE", 204, &[]));

        let spec = SpecAssembler::new(RequiredFieldInferrer::new(0.95), StatusAggregation::Exact)
            .assemble(&aggregator);

        assert_eq!(spec.api_version, "flowspec/v1alpha1");
        assert_eq!(spec.kind, "ServiceSpec");
        assert!(spec.metadata.name.is_none());

        let paths: Vec<&str> = spec.endpoints.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/z"]);

        let methods: Vec<&str> = spec.endpoints[0]
            .operations
            .iter()
            .map(|o| o.method.as_str())
            .collect();
        assert_eq!(methods, vec!["DELETE", "GET", "PUT"]);

        let put = spec.endpoints[0].operation("PUT").unwrap();
        assert!(put.required.headers.contains("if-match"));
        assert_eq!(put.status.codes, vec![200]);
    }

    #[test]
    fn test_assemble_empty() {
        let spec = SpecAssembler::from_options(&GenerationOptions::default())
            .assemble(&EndpointAggregator::new());
        assert!(spec.endpoints.is_empty());
    }

    #[test]
    fn test_service_name_from_options() {
        let options = GenerationOptions::builder().service_name("users").build();
        let spec = SpecAssembler::from_options(&options).assemble(&EndpointAggregator::new());
        assert_eq!(spec.metadata.name.as_deref(), Some("users"));
    }
}
