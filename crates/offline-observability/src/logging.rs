//! Structured logging of router activity.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use offline_core::{RouterEvent, RouterObserver};
use serde::{Deserialize, Serialize};

/// Log level for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "TRACE"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A structured log entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Log level.
    pub level: LogLevel,
    /// Log message.
    pub message: String,
    /// Component that produced the entry.
    pub component: String,
    /// Cache generation in effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
    /// Additional structured fields.
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
    /// Microseconds since the logger was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_us: Option<u64>,
}

impl LogEntry {
    /// Format as JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }

    /// Format as human-readable string.
    pub fn to_human(&self) -> String {
        let mut s = format!("[{}] {}", self.level, self.message);

        if let Some(elapsed) = self.elapsed_us {
            s.push_str(&format!(" ({}us)", elapsed));
        }

        if !self.fields.is_empty() {
            s.push_str(" | ");
            let fields: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| match v {
                    serde_json::Value::String(s) => format!("{}={}", k, s),
                    other => format!("{}={}", k, other),
                })
                .collect();
            s.push_str(&fields.join(" "));
        }

        s
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for log aggregation).
    #[default]
    Json,
    /// Human-readable format (for development).
    Human,
}

/// Structured logger writing one line per entry to stderr.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    component: String,
    generation: Option<String>,
    start_time: Instant,
    min_level: LogLevel,
    format: LogFormat,
}

impl StructuredLogger {
    /// Create a logger for a component.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            generation: None,
            start_time: Instant::now(),
            min_level: LogLevel::Info,
            format: LogFormat::Json,
        }
    }

    /// Tag entries with a cache generation.
    pub fn with_generation(mut self, generation: impl Into<String>) -> Self {
        self.generation = Some(generation.into());
        self
    }

    /// Set minimum log level.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Set output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Log at debug level.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, BTreeMap::new());
    }

    /// Log at info level.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, BTreeMap::new());
    }

    /// Log at warn level.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, BTreeMap::new());
    }

    /// Log at error level.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, BTreeMap::new());
    }

    /// Log with additional fields.
    pub fn log_with_fields(
        &self,
        level: LogLevel,
        message: &str,
        fields: BTreeMap<String, serde_json::Value>,
    ) {
        self.log(level, message, fields);
    }

    /// Format an entry, or `None` if it is below the minimum level.
    pub fn render(
        &self,
        level: LogLevel,
        message: &str,
        fields: BTreeMap<String, serde_json::Value>,
    ) -> Option<String> {
        if level < self.min_level {
            return None;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            component: self.component.clone(),
            generation: self.generation.clone(),
            fields,
            elapsed_us: Some(self.elapsed_us()),
        };

        Some(match self.format {
            LogFormat::Json => entry.to_json(),
            LogFormat::Human => entry.to_human(),
        })
    }

    fn log(&self, level: LogLevel, message: &str, fields: BTreeMap<String, serde_json::Value>) {
        if let Some(line) = self.render(level, message, fields) {
            eprintln!("{}", line);
        }
    }

    /// Get elapsed time since logger creation.
    pub fn elapsed_us(&self) -> u64 {
        self.start_time.elapsed().as_micros() as u64
    }

    /// Start building a log entry.
    pub fn builder(&self, level: LogLevel, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, level, message)
    }
}

/// Builder for log entries with fluent API.
pub struct LogBuilder<'a> {
    logger: &'a StructuredLogger,
    level: LogLevel,
    message: String,
    fields: BTreeMap<String, serde_json::Value>,
}

impl<'a> LogBuilder<'a> {
    /// Create a new log builder.
    pub fn new(logger: &'a StructuredLogger, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            logger,
            level,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a string field.
    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::json!(value.into()));
        self
    }

    /// Add an integer field.
    pub fn field_u64(mut self, key: &str, value: u64) -> Self {
        self.fields.insert(key.to_string(), serde_json::json!(value));
        self
    }

    /// Add a duration field (in microseconds).
    pub fn duration_us(mut self, key: &str, duration: std::time::Duration) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::json!(duration.as_micros() as u64));
        self
    }

    /// Render without emitting.
    pub fn render(self) -> Option<String> {
        self.logger.render(self.level, &self.message, self.fields)
    }

    /// Emit the log entry.
    pub fn emit(self) {
        self.logger.log(self.level, &self.message, self.fields);
    }
}

/// Router observer that writes every event through a [`StructuredLogger`].
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    logger: StructuredLogger,
}

impl LoggingObserver {
    /// Create an observer around a logger.
    pub fn new(logger: StructuredLogger) -> Self {
        Self { logger }
    }

    /// Build the log entry for an event without emitting it.
    pub fn entry_for<'a>(&'a self, event: &RouterEvent) -> LogBuilder<'a> {
        let log = &self.logger;
        match event {
            RouterEvent::Installing { generation, seeds } => log
                .builder(LogLevel::Info, "installing")
                .field("generation", generation)
                .field_u64("seeds", *seeds as u64),
            RouterEvent::SeedCached { url } => log
                .builder(LogLevel::Debug, "seed cached")
                .field("url", url),
            RouterEvent::SeedFailed { url, reason } => log
                .builder(LogLevel::Warn, "seed failed")
                .field("url", url)
                .field("reason", reason),
            RouterEvent::Installed {
                generation,
                cached,
                failed,
            } => {
                let level = if *failed > 0 { LogLevel::Warn } else { LogLevel::Info };
                log.builder(level, "installed")
                    .field("generation", generation)
                    .field_u64("cached", *cached as u64)
                    .field_u64("failed", *failed as u64)
            }
            RouterEvent::GenerationEvicted { generation } => log
                .builder(LogLevel::Info, "generation evicted")
                .field("generation", generation),
            RouterEvent::Activated {
                generation,
                claimed_clients,
            } => log
                .builder(LogLevel::Info, "activated")
                .field("generation", generation)
                .field_u64("claimed_clients", *claimed_clients as u64),
            RouterEvent::Routed {
                request_id,
                method,
                url,
                rule,
                strategy,
                status,
                elapsed,
            } => log
                .builder(LogLevel::Debug, "routed")
                .field("request_id", request_id.to_string())
                .field("method", method)
                .field("url", url)
                .field("rule", *rule)
                .field("strategy", strategy.as_str())
                .field("cache", status.to_string())
                .duration_us("elapsed_us", *elapsed),
            RouterEvent::RouteFailed {
                request_id,
                url,
                rule,
                strategy,
                error,
                elapsed,
            } => log
                .builder(LogLevel::Warn, "route failed")
                .field("request_id", request_id.to_string())
                .field("url", url)
                .field("rule", *rule)
                .field("strategy", strategy.as_str())
                .field("error", error)
                .duration_us("elapsed_us", *elapsed),
            RouterEvent::StoreWriteFailed { url, reason } => log
                .builder(LogLevel::Warn, "store write failed")
                .field("url", url)
                .field("reason", reason),
        }
    }
}

impl RouterObserver for LoggingObserver {
    fn on_event(&self, event: &RouterEvent) {
        self.entry_for(event).emit();
    }
}
