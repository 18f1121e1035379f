/// Implements `Logged` for a type.
///
/// Takes the type, the name of its `Option<LoggerInfo>` field, and an
/// expression producing `Result<LogClass<Type>, LogError>`. The expression
/// runs once; a failed build is reported on every later lookup.
///
/// ```
/// use annolog::{logged_class, LogClass, Loggable, LoggerInfo, Logged};
///
/// struct Counter {
///     count: u32,
///     logger_info: Option<LoggerInfo>,
/// }
///
/// logged_class!(Counter, logger_info, {
///     LogClass::builder("Counter")
///         .logger("session1")
///         .property("count", |c: &Counter| c.count)
///         .loggable(Loggable::new("count").template("<name>=<value>"))
///         .build()
/// });
///
/// let class = Counter::log_class().unwrap();
/// assert_eq!(class.loggables().len(), 1);
/// ```
#[macro_export]
macro_rules! logged_class {
    ($ty:ty, $info:ident, $class:expr) => {
        impl $crate::Logged for $ty {
            fn log_class() -> ::std::result::Result<&'static $crate::LogClass<Self>, $crate::LogError> {
                static CLASS: ::std::sync::OnceLock<
                    ::std::result::Result<$crate::LogClass<$ty>, $crate::LogError>,
                > = ::std::sync::OnceLock::new();
                CLASS.get_or_init(|| $class).as_ref().map_err(::std::clone::Clone::clone)
            }

            fn logger_info(&self) -> ::std::option::Option<&$crate::LoggerInfo> {
                self.$info.as_ref()
            }
        }
    };
}

// Formatting shorthands for sink writes, e.g. `sink_info!(sink, "n = {}", n)`.

#[macro_export]
macro_rules! sink_info {
    ($sink:expr, $($arg:tt)*) => {
        $sink.info(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! sink_debug {
    ($sink:expr, $($arg:tt)*) => {
        $sink.debug(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! sink_warn {
    ($sink:expr, $($arg:tt)*) => {
        $sink.warn(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! sink_error {
    ($sink:expr, $($arg:tt)*) => {
        $sink.error(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! sink_critical {
    ($sink:expr, $($arg:tt)*) => {
        $sink.critical(&format!($($arg)*))
    };
}
