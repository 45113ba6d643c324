//! Generation options
//!
//! Options can be built in code, loaded from YAML/TOML/JSON files, and
//! overridden from `FLOWSPEC_*` environment variables. `validate` is run by
//! the generator before any record is consumed.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::status::StatusAggregation;
use crate::error::{InferenceError, Result};

pub const ENV_MIN_ENDPOINT_SAMPLES: &str = "FLOWSPEC_MIN_ENDPOINT_SAMPLES";
pub const ENV_MIN_SAMPLE_SIZE: &str = "FLOWSPEC_MIN_SAMPLE_SIZE";
pub const ENV_CARDINALITY_THRESHOLD: &str = "FLOWSPEC_CARDINALITY_THRESHOLD";
pub const ENV_REQUIRED_THRESHOLD: &str = "FLOWSPEC_REQUIRED_THRESHOLD";
pub const ENV_STATUS_AGGREGATION: &str = "FLOWSPEC_STATUS_AGGREGATION";
pub const ENV_SERVICE_NAME: &str = "FLOWSPEC_SERVICE_NAME";

/// Options controlling spec generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Minimum records sharing a path shape before the shape is analyzed,
    /// and minimum records an endpoint needs to be published
    pub min_endpoint_samples: usize,

    /// Minimum records at a segment position before it may become a parameter
    pub min_sample_size: usize,

    /// Unique/total ratio a position must exceed to become a parameter
    pub cardinality_threshold: f64,

    /// Fraction of an operation's records a field must appear in to be required
    pub required_threshold: f64,

    /// How observed status codes are summarized
    pub status_aggregation: StatusAggregation,

    /// Name recorded in the generated document's metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            min_endpoint_samples: 1,
            min_sample_size: 10,
            cardinality_threshold: 0.5,
            required_threshold: 0.95,
            status_aggregation: StatusAggregation::Auto,
            service_name: None,
        }
    }
}

impl GenerationOptions {
    /// Create a new options builder
    pub fn builder() -> GenerationOptionsBuilder {
        GenerationOptionsBuilder::new()
    }

    /// Parse options from YAML; missing keys take their defaults
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_yaml::from_str(content)
            .map_err(|e| InferenceError::configuration("options", format!("YAML error: {}", e)))?;
        Self::from_value(value, "YAML")
    }

    /// Parse options from TOML; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = toml::from_str(content)
            .map_err(|e| InferenceError::configuration("options", format!("TOML error: {}", e)))?;
        Self::from_value(value, "TOML")
    }

    /// Parse options from JSON; missing keys take their defaults
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| InferenceError::configuration("options", format!("JSON error: {}", e)))?;
        Self::from_value(value, "JSON")
    }

    /// Decode an already parsed document, naming the first key that fails
    fn from_value(value: serde_json::Value, format: &str) -> Result<Self> {
        Self::deserialize(&value).map_err(|e| {
            let option = offending_key(&value).unwrap_or("options");
            InferenceError::configuration(option, format!("{} error: {}", format, e))
        })
    }

    /// Load options from a file, choosing the format by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            InferenceError::configuration("options", format!("{}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(InferenceError::configuration(
                "options",
                format!(
                    "unsupported options file extension {:?} for {}",
                    other.unwrap_or(""),
                    path.display()
                ),
            )),
        }
    }

    /// Apply `FLOWSPEC_*` environment variable overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_MIN_ENDPOINT_SAMPLES) {
            self.min_endpoint_samples = parse_env(ENV_MIN_ENDPOINT_SAMPLES, &v)?;
        }
        if let Some(v) = lookup(ENV_MIN_SAMPLE_SIZE) {
            self.min_sample_size = parse_env(ENV_MIN_SAMPLE_SIZE, &v)?;
        }
        if let Some(v) = lookup(ENV_CARDINALITY_THRESHOLD) {
            self.cardinality_threshold = parse_env(ENV_CARDINALITY_THRESHOLD, &v)?;
        }
        if let Some(v) = lookup(ENV_REQUIRED_THRESHOLD) {
            self.required_threshold = parse_env(ENV_REQUIRED_THRESHOLD, &v)?;
        }
        if let Some(v) = lookup(ENV_STATUS_AGGREGATION) {
            self.status_aggregation = parse_env(ENV_STATUS_AGGREGATION, &v)?;
        }
        if let Some(v) = lookup(ENV_SERVICE_NAME) {
            let name = v.trim();
            if !name.is_empty() {
                self.service_name = Some(name.to_string());
            }
        }
        Ok(self)
    }

    /// Check every option is within its valid domain
    pub fn validate(&self) -> Result<()> {
        check_fraction("cardinality_threshold", self.cardinality_threshold)?;
        check_fraction("required_threshold", self.required_threshold)?;
        Ok(())
    }
}

fn offending_key(value: &serde_json::Value) -> Option<&str> {
    value.as_object()?.iter().find_map(|(key, field)| {
        let mut single = serde_json::Map::new();
        single.insert(key.clone(), field.clone());
        GenerationOptions::deserialize(&serde_json::Value::Object(single))
            .is_err()
            .then_some(key.as_str())
    })
}

fn check_fraction(option: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(InferenceError::configuration(
            option,
            format!("must be within [0, 1], got {}", value),
        ));
    }
    Ok(())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| InferenceError::configuration(key, format!("{:?}: {}", value, e)))
}

/// Builder for GenerationOptions
pub struct GenerationOptionsBuilder {
    options: GenerationOptions,
}

impl GenerationOptionsBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self {
            options: GenerationOptions::default(),
        }
    }

    pub fn min_endpoint_samples(mut self, samples: usize) -> Self {
        self.options.min_endpoint_samples = samples;
        self
    }

    pub fn min_sample_size(mut self, samples: usize) -> Self {
        self.options.min_sample_size = samples;
        self
    }

    pub fn cardinality_threshold(mut self, threshold: f64) -> Self {
        self.options.cardinality_threshold = threshold;
        self
    }

    pub fn required_threshold(mut self, threshold: f64) -> Self {
        self.options.required_threshold = threshold;
        self
    }

    pub fn status_aggregation(mut self, strategy: StatusAggregation) -> Self {
        self.options.status_aggregation = strategy;
        self
    }

    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.options.service_name = Some(name.into());
        self
    }

    /// Build the options
    pub fn build(self) -> GenerationOptions {
        self.options
    }
}

impl Default for GenerationOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_options() {
        let options = GenerationOptions::default();
        assert_eq!(options.required_threshold, 0.95);
        assert_eq!(options.status_aggregation, StatusAggregation::Auto);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let options = GenerationOptions::builder()
            .min_endpoint_samples(3)
            .min_sample_size(25)
            .cardinality_threshold(0.8)
            .required_threshold(0.9)
            .status_aggregation(StatusAggregation::Exact)
            .service_name("users")
            .build();

        assert_eq!(options.min_endpoint_samples, 3);
        assert_eq!(options.min_sample_size, 25);
        assert_eq!(options.cardinality_threshold, 0.8);
        assert_eq!(options.required_threshold, 0.9);
        assert_eq!(options.status_aggregation, StatusAggregation::Exact);
        assert_eq!(options.service_name.as_deref(), Some("users"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_thresholds() {
        let err = GenerationOptions::builder()
            .required_threshold(1.5)
            .build()
            .validate()
            .unwrap_err();
        assert!(matches!(err, InferenceError::Configuration { ref option, .. } if option == "required_threshold"));

        let err = GenerationOptions::builder()
            .cardinality_threshold(f64::NAN)
            .build()
            .validate()
            .unwrap_err();
        assert!(matches!(err, InferenceError::Configuration { ref option, .. } if option == "cardinality_threshold"));

        assert!(GenerationOptions::builder()
            .required_threshold(0.0)
            .cardinality_threshold(1.0)
            .build()
            .validate()
            .is_ok());
    }

    #[test]
    fn test_yaml_partial_uses_defaults() {
        let options = GenerationOptions::from_yaml_str(
            "min_sample_size: 5\nstatus_aggregation: range\n",
        )
        .unwrap();
        assert_eq!(options.min_sample_size, 5);
        assert_eq!(options.status_aggregation, StatusAggregation::Range);
        assert_eq!(options.required_threshold, 0.95);
    }

    #[test]
    fn test_toml_options() {
        let options = GenerationOptions::from_toml_str(
            "required_threshold = 0.8\nservice_name = \"orders\"\n",
        )
        .unwrap();
        assert_eq!(options.required_threshold, 0.8);
        assert_eq!(options.service_name.as_deref(), Some("orders"));
    }

    #[test]
    fn test_unknown_strategy_is_configuration_error() {
        let err = GenerationOptions::from_yaml_str("min_sample_size: 5\nstatus_aggregation: fuzzy\n")
            .unwrap_err();
        assert!(matches!(err, InferenceError::Configuration { ref option, .. } if option == "status_aggregation"));
    }

    #[test]
    fn test_parse_errors_name_the_offending_option() {
        let err = GenerationOptions::from_toml_str("min_sample_size = \"ten\"\n").unwrap_err();
        assert!(matches!(err, InferenceError::Configuration { ref option, .. } if option == "min_sample_size"));

        let err = GenerationOptions::from_json_str(r#"{"required_threshold": 0.9, "min_endpoint_samples": -1}"#)
            .unwrap_err();
        assert!(matches!(err, InferenceError::Configuration { ref option, .. } if option == "min_endpoint_samples"));

        let err = GenerationOptions::from_yaml_str("cardinality_threshold: [0.5]\n").unwrap_err();
        assert!(matches!(err, InferenceError::Configuration { ref option, .. } if option == "cardinality_threshold"));
    }

    #[test]
    fn test_syntax_errors_name_the_document() {
        let err = GenerationOptions::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, InferenceError::Configuration { ref option, .. } if option == "options"));

        let err = GenerationOptions::from_yaml_str("- just\n- a list\n").unwrap_err();
        assert!(matches!(err, InferenceError::Configuration { ref option, .. } if option == "options"));
    }

    #[test]
    fn test_from_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("options.yaml");
        let mut file = std::fs::File::create(&yaml_path).unwrap();
        writeln!(file, "min_endpoint_samples: 4").unwrap();
        assert_eq!(GenerationOptions::from_file(&yaml_path).unwrap().min_endpoint_samples, 4);

        let toml_path = dir.path().join("options.toml");
        std::fs::write(&toml_path, "min_sample_size = 7\n").unwrap();
        assert_eq!(GenerationOptions::from_file(&toml_path).unwrap().min_sample_size, 7);

        let txt_path = dir.path().join("options.txt");
        std::fs::write(&txt_path, "").unwrap();
        assert!(GenerationOptions::from_file(&txt_path).is_err());

        assert!(GenerationOptions::from_file(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_MIN_SAMPLE_SIZE, "30"),
            (ENV_REQUIRED_THRESHOLD, "0.99"),
            (ENV_STATUS_AGGREGATION, "EXACT"),
            (ENV_SERVICE_NAME, "billing"),
        ]
        .into_iter()
        .collect();

        let options = GenerationOptions::default()
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(options.min_sample_size, 30);
        assert_eq!(options.required_threshold, 0.99);
        assert_eq!(options.status_aggregation, StatusAggregation::Exact);
        assert_eq!(options.service_name.as_deref(), Some("billing"));
        assert_eq!(options.min_endpoint_samples, 1);
    }

    #[test]
    fn test_env_override_names_bad_variable() {
        let err = GenerationOptions::default()
            .apply_overrides(|k| (k == ENV_MIN_ENDPOINT_SAMPLES).then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, InferenceError::Configuration { ref option, .. } if option == ENV_MIN_ENDPOINT_SAMPLES));
    }
}
