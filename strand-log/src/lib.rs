//! # strand-log
//!
//! A logging capability that is handed to data structures explicitly instead
//! of being looked up from a process-wide singleton.
//!
//! Events are ordinary [`tracing`] events with structured fields. A
//! [`Logger`] decides which subscriber receives them:
//!
//! - [`Logger::disabled`] drops everything and never evaluates the event
//!   closure, so structures built without a logger pay nothing.
//! - [`Logger::from_subscriber`] / [`Logger::new`] route events to an explicit
//!   subscriber, scoped to the duration of the call.
//! - [`Logger::console`] builds a `tracing_subscriber::fmt` subscriber from a
//!   [`LogConfig`].
//!
//! ## Example
//!
//! ```
//! use strand_log::{LogConfig, Logger};
//!
//! let config = LogConfig::new("orders", "debug").unwrap();
//! let logger = Logger::console(&config);
//!
//! logger.emit(|| tracing::debug!(capacity = 16, "deque created"));
//!
//! // A disabled logger skips the closure entirely.
//! Logger::disabled().emit(|| unreachable!());
//! ```

#![warn(missing_docs)]

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::Dispatch;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Error returned when a logger configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogConfigError {
    /// The level string is not one of `off`, `error`, `warn`, `info`,
    /// `debug` or `trace`.
    #[error("unknown log level: {0:?}")]
    UnknownLevel(String),
}

/// Configuration for a console logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Name attached to every event as the `name` field of a `logger` span.
    pub name: String,
    /// Most verbose level that is emitted.
    pub level: LevelFilter,
}

impl LogConfig {
    /// Creates a configuration from a name and a level string.
    ///
    /// # Errors
    ///
    /// Returns [`LogConfigError::UnknownLevel`] if `level` does not parse.
    pub fn new(name: impl Into<String>, level: &str) -> Result<Self, LogConfigError> {
        Ok(Self {
            name: name.into(),
            level: Self::parse_level(level)?,
        })
    }

    /// Parses a level string, case-insensitively.
    ///
    /// Accepts `off`, `error`, `warn`, `info`, `debug` and `trace`.
    ///
    /// # Errors
    ///
    /// Returns [`LogConfigError::UnknownLevel`] for anything else.
    pub fn parse_level(level: &str) -> Result<LevelFilter, LogConfigError> {
        let trimmed = level.trim();
        if trimmed.is_empty() {
            return Err(LogConfigError::UnknownLevel(level.to_owned()));
        }
        trimmed
            .parse::<LevelFilter>()
            .map_err(|_| LogConfigError::UnknownLevel(level.to_owned()))
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            name: "strand".to_owned(),
            level: LevelFilter::INFO,
        }
    }
}

/// An explicitly passed logging capability.
///
/// Cloning is cheap; clones share the same subscriber.
#[derive(Clone, Default)]
pub struct Logger {
    dispatch: Option<Dispatch>,
    name: Option<Arc<str>>,
}

impl Logger {
    /// Returns a logger that discards every event.
    #[inline]
    pub const fn disabled() -> Self {
        Self {
            dispatch: None,
            name: None,
        }
    }

    /// Returns a logger that sends events to `dispatch`.
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
            name: None,
        }
    }

    /// Returns a logger that sends events to `subscriber`.
    pub fn from_subscriber<S>(subscriber: S) -> Self
    where
        S: tracing::Subscriber + Send + Sync + 'static,
    {
        Self::new(Dispatch::new(subscriber))
    }

    /// Returns a logger writing formatted events to stdout.
    pub fn console(config: &LogConfig) -> Self {
        Self::with_writer(config, std::io::stdout)
    }

    /// Returns a logger writing formatted events to `writer`.
    pub fn with_writer<W>(config: &LogConfig, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(config.level)
            .with_writer(writer)
            .with_ansi(false)
            .finish();
        Self::from_subscriber(subscriber).named(config.name.as_str())
    }

    /// Attaches a name that is recorded on every event.
    #[must_use]
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the logger's name, if any.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` if events go anywhere.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.dispatch.is_some()
    }

    /// Runs `event` with this logger's subscriber as the thread default.
    ///
    /// The closure is expected to emit `tracing` events. It is not called at
    /// all when the logger is disabled.
    #[inline]
    pub fn emit<F: FnOnce()>(&self, event: F) {
        let Some(dispatch) = &self.dispatch else {
            return;
        };
        tracing::dispatcher::with_default(dispatch, || match &self.name {
            Some(name) => tracing::error_span!("logger", name = %name).in_scope(event),
            None => event(),
        });
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("enabled", &self.is_enabled())
            .field("name", &self.name)
            .finish()
    }
}
