//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::JobflowError;
use crate::observability::{LogSink, StdoutLogSink, TracingLogSink};

/// Environment variable read by [`PipelineOptions::from_env`].
pub const DEBUG_ENV: &str = "JOBFLOW_DEBUG";

/// Runtime configuration for a [`JobPipeline`](crate::pipeline::JobPipeline).
#[derive(Clone)]
pub struct PipelineConfig {
    /// Whether debug lines are written to the log sink.
    pub debug_enabled: bool,
    /// Receives debug lines.
    pub log_sink: Arc<dyn LogSink>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debug_enabled: false,
            log_sink: Arc::new(StdoutLogSink),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables debug logging.
    #[must_use]
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_enabled = enabled;
        self
    }

    /// Sets the log sink.
    #[must_use]
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = sink;
        self
    }
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("debug_enabled", &self.debug_enabled)
            .finish_non_exhaustive()
    }
}

/// Where debug lines go when configured from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTarget {
    /// Print to standard output.
    #[default]
    Stdout,
    /// Forward to `tracing`.
    Tracing,
}

/// Serializable options that build a [`PipelineConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Whether debug lines are written.
    #[serde(default, alias = "debugEnabled")]
    pub debug: bool,
    /// Where debug lines go.
    #[serde(default)]
    pub log_target: LogTarget,
}

impl PipelineOptions {
    /// Parses options from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, JobflowError> {
        serde_json::from_str(json).map_err(|e| JobflowError::InvalidConfig(e.to_string()))
    }

    /// Reads options from the environment.
    ///
    /// `JOBFLOW_DEBUG` accepts `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`
    /// (case-insensitive). An unset variable leaves debug disabled.
    pub fn from_env() -> Result<Self, JobflowError> {
        Self::from_env_value(std::env::var(DEBUG_ENV).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Result<Self, JobflowError> {
        let debug = match value.map(|v| v.trim().to_ascii_lowercase()) {
            None => false,
            Some(v) => match v.as_str() {
                "1" | "true" | "yes" | "on" => true,
                "" | "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(JobflowError::InvalidConfig(format!(
                        "{DEBUG_ENV} must be a boolean, got '{v}'"
                    )))
                }
            },
        };
        Ok(Self {
            debug,
            ..Self::default()
        })
    }

    /// Builds the runtime configuration.
    #[must_use]
    pub fn into_config(self) -> PipelineConfig {
        let log_sink: Arc<dyn LogSink> = match self.log_target {
            LogTarget::Stdout => Arc::new(StdoutLogSink),
            LogTarget::Tracing => Arc::new(TracingLogSink),
        };
        PipelineConfig {
            debug_enabled: self.debug,
            log_sink,
        }
    }
}

impl From<PipelineOptions> for PipelineConfig {
    fn from(options: PipelineOptions) -> Self {
        options.into_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert!(!config.debug_enabled);
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::new().with_debug(true);
        assert!(config.debug_enabled);
    }

    #[test]
    fn test_options_from_json() {
        let options = PipelineOptions::from_json(r#"{"debug": true, "log_target": "tracing"}"#).unwrap();
        assert_eq!(
            options,
            PipelineOptions {
                debug: true,
                log_target: LogTarget::Tracing,
            }
        );
    }

    #[test]
    fn test_options_accept_camel_case_alias() {
        let options = PipelineOptions::from_json(r#"{"debugEnabled": true}"#).unwrap();
        assert!(options.debug);
        assert_eq!(options.log_target, LogTarget::Stdout);
    }

    #[test]
    fn test_options_from_empty_json() {
        let options = PipelineOptions::from_json("{}").unwrap();
        assert_eq!(options, PipelineOptions::default());
    }

    #[test]
    fn test_options_invalid_json() {
        let err = PipelineOptions::from_json("{debug: }").unwrap_err();
        assert!(matches!(err, JobflowError::InvalidConfig(_)));
    }

    #[test]
    fn test_env_values() {
        assert!(!PipelineOptions::from_env_value(None).unwrap().debug);
        assert!(PipelineOptions::from_env_value(Some("TRUE")).unwrap().debug);
        assert!(PipelineOptions::from_env_value(Some(" 1 ")).unwrap().debug);
        assert!(!PipelineOptions::from_env_value(Some("off")).unwrap().debug);
        assert!(PipelineOptions::from_env_value(Some("maybe")).is_err());
    }

    #[test]
    fn test_into_config() {
        let config: PipelineConfig = PipelineOptions {
            debug: true,
            log_target: LogTarget::Tracing,
        }
        .into();
        assert!(config.debug_enabled);
    }
}
