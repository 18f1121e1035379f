use crate::error::{LogError, Result};
use crate::level::LogLevel;
use crate::logger::Sink;
use crate::registry::{LogClass, Logged, DEFAULT_MASK};

/// Logs around one method of a `Logged` type.
///
/// A call opens a sink labeled `<descriptor>.<method>`, writes the entry
/// message, runs the body, replays the class's loggable declarations for
/// each requested mask, then writes the exit message. A failing body stops
/// the sequence right there.
#[derive(Debug, Clone)]
pub struct LoggedMethod {
    name: String,
    masks: Vec<String>,
    entry: Option<String>,
    exit: Option<String>,
}

impl LoggedMethod {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            masks: vec![DEFAULT_MASK.to_string()],
            entry: None,
            exit: None,
        }
    }

    pub fn masks<I, S>(mut self, masks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.masks = masks.into_iter().map(Into::into).collect();
        self
    }

    pub fn entry(mut self, message: &str) -> Self {
        self.entry = Some(message.to_string());
        self
    }

    pub fn exit(mut self, message: &str) -> Self {
        self.exit = Some(message.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke<T, R, F>(&self, target: &mut T, body: F) -> Result<R>
    where
        T: Logged,
        F: FnOnce(&mut T) -> R,
    {
        self.try_invoke(target, |t| Ok::<R, LogError>(body(t)))
    }

    /// Like `invoke`, for bodies that can fail. On `Err` no declaration or
    /// exit line is written and the error is returned as is.
    pub fn try_invoke<T, R, E, F>(&self, target: &mut T, body: F) -> Result<R, E>
    where
        T: Logged,
        E: From<LogError>,
        F: FnOnce(&mut T) -> Result<R, E>,
    {
        let class = T::log_class()?;
        let sink = self.open_sink(class, target)?;

        if let Some(entry) = &self.entry {
            sink.info(entry);
        }

        let output = body(target)?;

        self.replay(class, target, &sink);

        if let Some(exit) = &self.exit {
            sink.info(exit);
        }

        Ok(output)
    }

    fn open_sink<T: Logged>(&self, class: &LogClass<T>, target: &T) -> Result<Sink> {
        let info = target.logger_info().ok_or_else(|| LogError::MissingLoggerDeclaration {
            class: class.name().to_string(),
        })?;
        class.open_sink(&format!("{}.{}", info.descriptor, self.name), &info.filename)
    }

    fn replay<T>(&self, class: &LogClass<T>, target: &T, sink: &Sink) {
        for declaration in class.loggables() {
            for mask in &self.masks {
                if !declaration.matches(mask) {
                    continue;
                }
                let Some(value) = class.read(target, &declaration.property) else {
                    continue;
                };
                match declaration.level {
                    // Debug declarations ignore their template and go out as Warn.
                    LogLevel::Debug => sink.warn(&format!("{}: {}", declaration.property, value)),
                    level => {
                        sink.log(level, &declaration.template.render(&declaration.property, &value))
                    }
                }
            }
        }
    }
}
