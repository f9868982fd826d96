//! Colorized, structured console logging for command-line tools.
//!
//! Records are printed to stderr with a colored `level: ` prefix on every
//! line, and their extra attributes are appended as inline JSON:
//!
//! ```text
//! info: Label request sent --- {"status_code": 200, "labels": 12}
//! ```

pub mod bridge;
pub mod encoder;
mod error;
pub mod formatter;
pub mod handler;
pub mod logger;
pub mod record;
pub mod style;

pub use bridge::{LogBridge, init};
pub use encoder::{Attribute, Json, Text};
pub use error::EmitError;
pub use formatter::{ColorFormatter, Formatter, PlainFormatter};
pub use handler::{ConsoleHandler, Handler};
pub use logger::Logger;
pub use record::{ExceptionInfo, Extras, Level, LogRecord};

/// Attaches a stderr [`ConsoleHandler`] with a [`ColorFormatter`] to `logger`,
/// stops propagation to its ancestors and lets every level through.
///
/// Calling this twice on the same logger attaches two handlers.
pub fn configure(logger: &mut Logger) {
    configure_with(logger, ConsoleHandler::new());
}

/// Same as [`configure`], with a caller-built handler.
pub fn configure_with(logger: &mut Logger, mut handler: ConsoleHandler) {
    handler.set_formatter(ColorFormatter::new());
    logger.add_handler(handler);
    logger.set_propagate(false);
    logger.set_level(Level::TRACE);
}
