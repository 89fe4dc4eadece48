use serde::Deserialize;

/// Knobs for one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalConfig {
    /// Deepest allowed component nesting; deeper evaluation fails with
    /// [`crate::error::WitnessError::ResourceExhausted`].
    pub max_depth: usize,
    /// Separator between display names in component traces.
    pub trace_separator: String,
    /// Emit a `trace` event for every component run.
    pub log_component_runs: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_depth: 512,
            trace_separator: "->".to_string(),
            log_component_runs: false,
        }
    }
}

impl EvalConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = EvalConfig::from_json(r#"{ "max_depth": 8 }"#).unwrap();
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.trace_separator, "->");
        assert!(!config.log_component_runs);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(EvalConfig::from_json(r#"{ "threads": 4 }"#).is_err());
    }
}
