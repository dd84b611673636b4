//! Service configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration:
//!
//! ```
//! use avdata_service::ServiceConfig;
//!
//! let config = ServiceConfig::from_json_str(r#"{ "response_buffer_bytes": 1024 }"#).unwrap();
//! assert_eq!(config.response_buffer_bytes, 1024);
//! assert_eq!(config.record_buffer_bytes, 4096);
//! ```

use crate::error::ServiceError;
use crate::tracing_setup::{TracingFormat, TracingSetup};
use avdata_timeseries::{RecordConfig, is_valid_compression_level, max_compression_level};
use serde::{Deserialize, Serialize};

/// Default cap on an encoded response payload, in bytes.
pub const DEFAULT_RESPONSE_BUFFER_BYTES: usize = 4096;

/// Log settings as they appear in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingSettings {
    /// Level name (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Output format.
    pub format: TracingFormat,
    /// Optional per-target filter.
    pub env_filter: Option<String>,
    /// Emit span enter/exit events.
    pub span_events: bool,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: TracingFormat::default(),
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingSettings {
    /// Builds a [`TracingSetup`] from these settings.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Config`] if the level name is unknown.
    pub fn to_setup(&self) -> Result<TracingSetup, ServiceError> {
        let mut setup = TracingSetup::new()
            .with_level(TracingSetup::parse_level(&self.level)?)
            .with_format(self.format)
            .with_span_events(self.span_events);
        if let Some(filter) = &self.env_filter {
            setup = setup.with_env_filter(filter.clone());
        }
        Ok(setup)
    }
}

/// Configuration of an [`AssetDataService`](crate::AssetDataService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Cap on read response payloads.
    pub response_buffer_bytes: usize,
    /// Cap on encoded time-series records.
    pub record_buffer_bytes: usize,
    /// zstd level for time-series pushes.
    pub compression_level: i32,
    /// Log settings.
    pub tracing: TracingSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            response_buffer_bytes: DEFAULT_RESPONSE_BUFFER_BYTES,
            record_buffer_bytes: avdata_timeseries::DEFAULT_BUFFER_BYTES,
            compression_level: max_compression_level(),
            tracing: TracingSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Config`] if the JSON is malformed or a value is out of
    /// range.
    pub fn from_json_str(json: &str) -> Result<Self, ServiceError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| ServiceError::config(format!("failed to parse configuration: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.response_buffer_bytes == 0 {
            return Err(ServiceError::config("response_buffer_bytes must be positive"));
        }
        if self.record_buffer_bytes == 0 {
            return Err(ServiceError::config("record_buffer_bytes must be positive"));
        }
        if !is_valid_compression_level(self.compression_level) {
            return Err(ServiceError::config(format!(
                "compression_level {} is outside the zstd range",
                self.compression_level
            )));
        }
        self.tracing.to_setup()?.filter()?;
        Ok(())
    }

    /// Record limits derived from this configuration.
    #[must_use]
    pub fn record_config(&self) -> RecordConfig {
        RecordConfig::default()
            .with_buffer_bytes(self.record_buffer_bytes)
            .with_compression_level(self.compression_level)
    }
}
