//! Per-type log metadata.
//!
//! A `LogClass` is built once per type and holds three things: the logger
//! declaration every instance copies into its own `LoggerInfo`, the ordered
//! loggable declarations, and the accessor table used to read a property's
//! current value off a live instance. A class may also declare a fixed
//! label and session from which each instance opens its own `Sink`.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Display};
use std::sync::Arc;

use crate::configure::{shared_settings, SinkSettings};
use crate::error::{LogError, Result};
use crate::level::LogLevel;
use crate::logger::Sink;

pub const DEFAULT_MASK: &str = "default";

const PLACEHOLDERS: [&str; 4] = ["<name>", "<value>", "<error>", "<message>"];

/// A message template holding exactly two placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    pub fn parse(template: &str) -> Result<Self> {
        let found: usize = PLACEHOLDERS.iter().map(|p| template.matches(p).count()).sum();
        if found != 2 {
            return Err(LogError::InvalidTemplate { template: template.to_string(), found });
        }
        Ok(Self(template.to_string()))
    }

    pub fn default_for(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug | LogLevel::Info => Self("<name> : <value>".to_string()),
            _ => Self("<error> : <message>".to_string()),
        }
    }

    /// Fills the first `<name>` and then the first `<value>`; other
    /// placeholders are left as written.
    pub fn render(&self, name: &str, value: &str) -> String {
        self.0.replacen("<name>", name, 1).replacen("<value>", value, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builder for one loggable declaration.
#[derive(Debug, Clone)]
pub struct Loggable {
    property: String,
    level: LogLevel,
    masks: Vec<String>,
    template: Option<String>,
}

impl Loggable {
    pub fn new(property: &str) -> Self {
        Self {
            property: property.to_string(),
            level: LogLevel::Info,
            masks: vec![DEFAULT_MASK.to_string()],
            template: None,
        }
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// An empty list keeps the `default` mask.
    pub fn masks<I, S>(mut self, masks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let masks: Vec<String> = masks.into_iter().map(Into::into).collect();
        if !masks.is_empty() {
            self.masks = masks;
        }
        self
    }

    pub fn template(mut self, template: &str) -> Self {
        self.template = Some(template.to_string());
        self
    }

    fn declare(self) -> Result<LoggableDeclaration> {
        let template = match &self.template {
            Some(t) => Template::parse(t)?,
            None => Template::default_for(self.level),
        };
        Ok(LoggableDeclaration {
            property: self.property,
            level: self.level,
            template,
            masks: self.masks.into_iter().collect(),
        })
    }
}

/// What to log about one property after a wrapped call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggableDeclaration {
    pub property: String,
    pub level: LogLevel,
    pub template: Template,
    pub masks: BTreeSet<String>,
}

impl LoggableDeclaration {
    pub fn matches(&self, mask: &str) -> bool {
        self.masks.contains(mask)
    }
}

/// Logger details owned by each instance of a logged type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerInfo {
    pub descriptor: String,
    pub filename: String,
    pub levels: BTreeSet<LogLevel>,
}

impl LoggerInfo {
    /// Allowed levels are carried for callers; wrapped calls do not filter on them.
    pub fn allows(&self, level: LogLevel) -> bool {
        self.levels.contains(&level)
    }
}

#[derive(Debug, Clone)]
struct LoggerDeclaration {
    descriptor: Option<String>,
    filename: String,
    levels: BTreeSet<LogLevel>,
}

pub fn default_levels() -> BTreeSet<LogLevel> {
    [LogLevel::Info, LogLevel::Warn, LogLevel::Error].into_iter().collect()
}

type Accessor<T> = Box<dyn Fn(&T) -> String + Send + Sync>;

/// Log metadata of one type.
pub struct LogClass<T> {
    name: String,
    logger: Option<LoggerDeclaration>,
    loggables: Vec<LoggableDeclaration>,
    accessors: HashMap<String, Accessor<T>>,
    instance_logger: Option<InstanceLogger>,
    settings: Option<Arc<SinkSettings>>,
}

#[derive(Debug, Clone)]
struct InstanceLogger {
    label: String,
    session: String,
}

impl<T> LogClass<T> {
    pub fn builder(name: &str) -> LogClassBuilder<T> {
        LogClassBuilder {
            name: name.to_string(),
            logger: None,
            descriptor: None,
            loggables: Vec::new(),
            accessors: HashMap::new(),
            instance_logger: None,
            settings: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds the `LoggerInfo` a new instance keeps; `None` without a logger declaration.
    pub fn logger_info(&self) -> Option<LoggerInfo> {
        self.logger.as_ref().map(|decl| LoggerInfo {
            descriptor: decl.descriptor.clone().unwrap_or_else(|| self.name.clone()),
            filename: decl.filename.clone(),
            levels: decl.levels.clone(),
        })
    }

    pub fn loggables(&self) -> &[LoggableDeclaration] {
        &self.loggables
    }

    /// Current value of `property` on `target`.
    pub fn read(&self, target: &T, property: &str) -> Option<String> {
        self.accessors.get(property).map(|get| get(target))
    }

    /// Opens the sink an instance owns for its whole life, labeled and
    /// destined as declared with `instance_logger`.
    pub fn instance_sink(&self) -> Result<Sink> {
        let logger = self.instance_logger.as_ref().ok_or_else(|| LogError::MissingInstanceLogger {
            class: self.name.clone(),
        })?;
        self.open_sink(&logger.label, &logger.session)
    }

    pub(crate) fn open_sink(&self, label: &str, destination: &str) -> Result<Sink> {
        let settings = match &self.settings {
            Some(settings) => settings.clone(),
            None => shared_settings()?,
        };
        Sink::with_settings(label, destination, settings)
    }
}

impl<T> fmt::Debug for LogClass<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogClass")
            .field("name", &self.name)
            .field("logger", &self.logger)
            .field("loggables", &self.loggables)
            .field("instance_logger", &self.instance_logger)
            .finish()
    }
}

pub struct LogClassBuilder<T> {
    name: String,
    logger: Option<(String, BTreeSet<LogLevel>)>,
    descriptor: Option<String>,
    loggables: Vec<Loggable>,
    accessors: HashMap<String, Accessor<T>>,
    instance_logger: Option<InstanceLogger>,
    settings: Option<Arc<SinkSettings>>,
}

impl<T> LogClassBuilder<T> {
    /// Declares the destination file every instance logs to, allowing Info, Warn and Error.
    pub fn logger(self, filename: &str) -> Self {
        self.logger_with_levels(filename, default_levels())
    }

    pub fn logger_with_levels<I>(mut self, filename: &str, levels: I) -> Self
    where
        I: IntoIterator<Item = LogLevel>,
    {
        self.logger = Some((filename.to_string(), levels.into_iter().collect()));
        self
    }

    /// Overrides the descriptor used in sink labels (defaults to the class name).
    pub fn descriptor(mut self, descriptor: &str) -> Self {
        self.descriptor = Some(descriptor.to_string());
        self
    }

    pub fn property<V, F>(mut self, name: &str, getter: F) -> Self
    where
        T: 'static,
        V: Display,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.accessors
            .insert(name.to_string(), Box::new(move |target: &T| getter(target).to_string()));
        self
    }

    pub fn loggable(mut self, loggable: Loggable) -> Self {
        self.loggables.push(loggable);
        self
    }

    /// Gives every instance its own sink labeled `label`, writing to `<session>.log`.
    pub fn instance_logger(mut self, label: &str, session: &str) -> Self {
        self.instance_logger = Some(InstanceLogger {
            label: label.to_string(),
            session: session.to_string(),
        });
        self
    }

    pub fn settings(mut self, settings: Arc<SinkSettings>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn build(self) -> Result<LogClass<T>> {
        let mut loggables = Vec::with_capacity(self.loggables.len());
        for loggable in self.loggables {
            if !self.accessors.contains_key(&loggable.property) {
                return Err(LogError::UnknownProperty {
                    class: self.name.clone(),
                    property: loggable.property,
                });
            }
            loggables.push(loggable.declare()?);
        }

        let descriptor = self.descriptor;
        Ok(LogClass {
            name: self.name,
            logger: self.logger.map(|(filename, levels)| LoggerDeclaration {
                descriptor,
                filename,
                levels,
            }),
            loggables,
            accessors: self.accessors,
            instance_logger: self.instance_logger,
            settings: self.settings,
        })
    }
}

/// A type whose methods can be wrapped with `LoggedMethod`.
///
/// Usually implemented through `logged_class!`.
pub trait Logged: Sized + 'static {
    fn log_class() -> Result<&'static LogClass<Self>>;

    fn logger_info(&self) -> Option<&LoggerInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        balance: i64,
        owner: &'static str,
    }

    #[test]
    fn test_template_requires_two_placeholders() {
        assert!(Template::parse("<name>=<value>").is_ok());
        assert!(Template::parse("<value> then <name>").is_ok());
        assert!(Template::parse("<error>: <message>").is_ok());

        let err = Template::parse("<name> only").unwrap_err();
        assert_eq!(err, LogError::InvalidTemplate { template: "<name> only".to_string(), found: 1 });
        assert!(Template::parse("<name> <value> <message>").is_err());
    }

    #[test]
    fn test_render_replaces_first_occurrence_only() {
        let template = Template::parse("<name>=<value>").unwrap();
        assert_eq!(template.render("count", "5"), "count=5");

        let template = Template::parse("<name> <name>").unwrap();
        assert_eq!(template.render("count", "5"), "count <name>");
    }

    #[test]
    fn test_default_template_depends_on_level() {
        assert_eq!(Template::default_for(LogLevel::Debug).as_str(), "<name> : <value>");
        assert_eq!(Template::default_for(LogLevel::Info).as_str(), "<name> : <value>");
        assert_eq!(Template::default_for(LogLevel::Warn).as_str(), "<error> : <message>");
        assert_eq!(Template::default_for(LogLevel::Critical).as_str(), "<error> : <message>");
    }

    #[test]
    fn test_declarations_keep_order_and_defaults() {
        let class = LogClass::<Account>::builder("Account")
            .property("balance", |a: &Account| a.balance)
            .property("owner", |a: &Account| a.owner)
            .loggable(Loggable::new("balance"))
            .loggable(Loggable::new("owner").level(LogLevel::Warn).masks(["audit", "default"]))
            .loggable(Loggable::new("balance").masks(Vec::<String>::new()))
            .build()
            .unwrap();

        let loggables = class.loggables();
        assert_eq!(loggables.len(), 3);
        assert_eq!(loggables[0].property, "balance");
        assert_eq!(loggables[0].level, LogLevel::Info);
        assert!(loggables[0].matches(DEFAULT_MASK));
        assert_eq!(loggables[1].property, "owner");
        assert!(loggables[1].matches("audit"));
        assert_eq!(loggables[1].template.as_str(), "<error> : <message>");
        assert!(loggables[2].matches(DEFAULT_MASK));
    }

    #[test]
    fn test_build_rejects_undeclared_property() {
        let err = LogClass::<Account>::builder("Account")
            .loggable(Loggable::new("missing"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            LogError::UnknownProperty { class: "Account".to_string(), property: "missing".to_string() }
        );
    }

    #[test]
    fn test_build_rejects_bad_template() {
        let result = LogClass::<Account>::builder("Account")
            .property("balance", |a: &Account| a.balance)
            .loggable(Loggable::new("balance").template("no placeholders"))
            .build();
        assert!(matches!(result, Err(LogError::InvalidTemplate { found: 0, .. })));
    }

    #[test]
    fn test_logger_info_factory() {
        let class = LogClass::<Account>::builder("Account").logger("ledger").build().unwrap();
        let info = class.logger_info().unwrap();
        assert_eq!(info.descriptor, "Account");
        assert_eq!(info.filename, "ledger");
        assert!(info.allows(LogLevel::Info));
        assert!(!info.allows(LogLevel::Debug));

        let class = LogClass::<Account>::builder("Account")
            .logger_with_levels("ledger", [LogLevel::Critical])
            .descriptor("Ledger")
            .build()
            .unwrap();
        let info = class.logger_info().unwrap();
        assert_eq!(info.descriptor, "Ledger");
        assert!(info.allows(LogLevel::Critical));

        let class = LogClass::<Account>::builder("Account").build().unwrap();
        assert!(class.logger_info().is_none());
    }

    #[test]
    fn test_instance_sink_requires_declaration() {
        let class = LogClass::<Account>::builder("Account").logger("ledger").build().unwrap();
        assert_eq!(
            class.instance_sink().unwrap_err(),
            LogError::MissingInstanceLogger { class: "Account".to_string() }
        );
    }

    #[test]
    fn test_instance_sink_uses_declared_label_and_session() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Arc::new(SinkSettings { console: false, ..SinkSettings::in_dir(dir.path()) });
        let class = LogClass::<Account>::builder("Account")
            .instance_logger("accounts", "ledger-session")
            .settings(settings)
            .build()
            .unwrap();

        let sink = class.instance_sink().unwrap();

        assert_eq!(sink.label(), "accounts");
        assert_eq!(sink.destination(), "ledger-session");
        assert_eq!(sink.log_path(), dir.path().join("ledger-session.log"));
    }

    #[test]
    fn test_read_uses_current_value() {
        let class = LogClass::<Account>::builder("Account")
            .property("balance", |a: &Account| a.balance)
            .build()
            .unwrap();
        let mut account = Account { balance: 10, owner: "ann" };
        assert_eq!(class.read(&account, "balance").as_deref(), Some("10"));

        account.balance = 25;
        assert_eq!(class.read(&account, "balance").as_deref(), Some("25"));
        assert_eq!(class.read(&account, "owner"), None);
    }
}
