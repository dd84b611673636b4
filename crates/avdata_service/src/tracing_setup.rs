//! Log subscriber setup.
//!
//! The library crates only emit `tracing` events. [`TracingSetup`] installs a
//! `tracing-subscriber` registry for the hosting process.
//!
//! # Example
//!
//! ```
//! use avdata_service::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! TracingSetup::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .with_env_filter("avdata_store=debug,avdata_service=info")
//!     .init()
//!     .unwrap();
//! ```

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use tracing::{Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingFormat {
    /// Human-readable multi-line output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON lines for log aggregation.
    Json,
}

/// Builder for the process-wide subscriber.
#[derive(Debug, Clone)]
pub struct TracingSetup {
    level: Level,
    format: TracingFormat,
    env_filter: Option<String>,
    span_events: bool,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingSetup {
    /// Creates a setup with INFO level and pretty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a level name such as `"debug"`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Config`] if the name is not a level.
    pub fn parse_level(name: &str) -> Result<Level, ServiceError> {
        name.parse()
            .map_err(|_| ServiceError::config(format!("unknown log level {name:?}")))
    }

    /// Sets the maximum level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Adds per-target directives, e.g. `avdata_store=debug`.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Emits span enter/exit events.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configured level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the configured format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    /// Builds the event filter.
    ///
    /// The configured level applies to every target; per-target directives
    /// from [`Self::with_env_filter`] override it for their targets.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Config`] if a directive does not parse.
    pub fn filter(&self) -> Result<EnvFilter, ServiceError> {
        let mut directives = self.level.as_str().to_ascii_lowercase();
        if let Some(extra) = self.env_filter.as_deref().filter(|f| !f.is_empty()) {
            directives.push(',');
            directives.push_str(extra);
        }
        EnvFilter::builder()
            .parse(&directives)
            .map_err(|err| ServiceError::config(format!("invalid log filter {directives:?}: {err}")))
    }

    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let spans = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = tracing_subscriber::fmt::layer().with_span_events(spans);
        match self.format {
            TracingFormat::Pretty => layer.pretty().boxed(),
            TracingFormat::Compact => layer.compact().boxed(),
            TracingFormat::Json => layer.json().boxed(),
        }
    }

    /// Installs the subscriber.
    ///
    /// Returns `false` if a global subscriber was already set.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Config`] if the filter does not parse.
    pub fn init(&self) -> Result<bool, ServiceError> {
        let filter = self.filter()?;
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(self.fmt_layer())
            .try_init()
            .is_ok();
        if installed {
            tracing::info!(level = %self.level, format = ?self.format, "tracing initialized");
        }
        Ok(installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let setup = TracingSetup::default();
        assert_eq!(setup.level(), Level::INFO);
        assert_eq!(setup.format(), TracingFormat::Pretty);
        assert!(!setup.span_events);
    }

    #[test]
    fn builder_sets_fields() {
        let setup = TracingSetup::new()
            .with_level(Level::TRACE)
            .with_format(TracingFormat::Json)
            .with_env_filter("avdata_store=debug")
            .with_span_events(true);
        assert_eq!(setup.level(), Level::TRACE);
        assert_eq!(setup.format(), TracingFormat::Json);
        assert_eq!(setup.env_filter.as_deref(), Some("avdata_store=debug"));
        assert!(setup.span_events);
    }

    #[test]
    fn parse_level_names() {
        assert_eq!(TracingSetup::parse_level("warn").unwrap(), Level::WARN);
        assert!(matches!(
            TracingSetup::parse_level("loud"),
            Err(ServiceError::Config(_))
        ));
    }

    #[test]
    fn filter_combines_level_and_directives() {
        let filter = TracingSetup::new()
            .with_level(Level::WARN)
            .with_env_filter("avdata_store=debug")
            .filter()
            .unwrap();
        let shown = filter.to_string();
        assert!(shown.contains("warn"), "{shown}");
        assert!(shown.contains("avdata_store=debug"), "{shown}");
    }

    #[test]
    fn malformed_filter_is_a_config_error() {
        let setup = TracingSetup::new().with_env_filter("avdata_store=loud");
        assert!(matches!(setup.filter(), Err(ServiceError::Config(_))));
        assert!(matches!(setup.init(), Err(ServiceError::Config(_))));
    }

    #[test]
    fn init_twice_is_harmless() {
        let setup = TracingSetup::new().with_format(TracingFormat::Compact);
        setup.init().unwrap();
        assert!(!setup.init().unwrap());
    }
}
