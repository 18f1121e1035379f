use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use log::{Log, Metadata, Record};
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::{
    config::{Appender, Config as LogConfig, Root},
    encode::pattern::PatternEncoder,
};

use crate::configure::{shared_settings, SinkSettings};
use crate::error::{LogError, Result};
use crate::level::LogLevel;

const LABEL_SEPARATOR: &str = " > ";

/// `<label>-<unix millis>`, the destination used when none is given.
pub fn default_destination(label: &str) -> String {
    format!("{}-{}", label, Utc::now().timestamp_millis())
}

/// A log4rs handle built for one label.
struct Backend {
    label: String,
    logger: log4rs::Logger,
}

impl Backend {
    fn build(label: &str, destination: &str, settings: &SinkSettings) -> Result<Self> {
        let pattern = format!("<{{d({})}}> [{{t}}] {{m}}{{n}}", settings.time_format);
        let backend_err = |reason: String| LogError::Backend {
            destination: destination.to_string(),
            reason,
        };

        let file = FileAppender::builder()
            .append(true)
            .encoder(Box::new(PatternEncoder::new(&pattern)))
            .build(settings.log_dir.join(format!("{}.log", destination)))
            .map_err(|e| backend_err(e.to_string()))?;

        let mut log_config_builder =
            LogConfig::builder().appender(Appender::builder().build("file", Box::new(file)));
        let mut root_builder = Root::builder().appender("file");

        if settings.console {
            let stdout = ConsoleAppender::builder()
                .target(Target::Stdout)
                .encoder(Box::new(PatternEncoder::new(&pattern)))
                .build();
            log_config_builder =
                log_config_builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
            root_builder = root_builder.appender("stdout");
        }

        let log_config = log_config_builder
            .build(root_builder.build(settings.level_filter()?))
            .map_err(|e| backend_err(e.to_string()))?;

        Ok(Self {
            label: label.to_string(),
            logger: log4rs::Logger::new(log_config),
        })
    }
}

/// Writes labeled lines to the console and to `<log_dir>/<destination>.log`.
///
/// Every line reads `<timestamp> [label] LEVEL : message`. Write failures are
/// handled inside log4rs and never reach the caller.
pub struct Sink {
    destination: String,
    settings: Arc<SinkSettings>,
    backend: Backend,
}

impl Sink {
    /// Sink writing to `<label>-<unix millis>.log` with the process-wide settings.
    pub fn new(label: &str) -> Result<Self> {
        Self::with_destination(label, &default_destination(label))
    }

    pub fn with_destination(label: &str, destination: &str) -> Result<Self> {
        Self::with_settings(label, destination, shared_settings()?)
    }

    pub fn with_settings(label: &str, destination: &str, settings: Arc<SinkSettings>) -> Result<Self> {
        let backend = Backend::build(label, destination, &settings)?;
        Ok(Self {
            destination: destination.to_string(),
            settings,
            backend,
        })
    }

    pub fn label(&self) -> &str {
        &self.backend.label
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn log_path(&self) -> PathBuf {
        self.settings.log_dir.join(format!("{}.log", self.destination))
    }

    /// Extends the label with `" > segment"`. The handle is rebuilt before
    /// returning, so every later write carries the new label.
    pub fn set_label(&mut self, segment: &str) -> Result<()> {
        let label = format!("{}{}{}", self.backend.label, LABEL_SEPARATOR, segment);
        self.backend = Backend::build(&label, &self.destination, &self.settings)?;
        Ok(())
    }

    /// Same label and destination, fresh handle.
    pub fn try_clone(&self) -> Result<Self> {
        Self::with_settings(self.label(), &self.destination, self.settings.clone())
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        let metadata = Metadata::builder()
            .level(level.to_log_level())
            .target(&self.backend.label)
            .build();
        if !self.backend.logger.enabled(&metadata) {
            return;
        }
        self.backend.logger.log(
            &Record::builder()
                .metadata(metadata)
                .args(format_args!("{} : {}", level, message))
                .build(),
        );
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn critical(&self, message: &str) {
        self.log(LogLevel::Critical, message);
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("label", &self.backend.label)
            .field("destination", &self.destination)
            .finish()
    }
}
