pub mod configure;
pub mod error;
pub mod level;
pub mod log_macros;
pub mod logger;
pub mod registry;
pub mod wrapper;

pub use configure::SinkSettings;
pub use error::LogError;
pub use level::LogLevel;
pub use logger::Sink;
pub use registry::{LogClass, LogClassBuilder, Loggable, LoggableDeclaration, Logged, LoggerInfo, Template};
pub use wrapper::LoggedMethod;
