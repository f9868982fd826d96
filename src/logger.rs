use colorlog::{ConsoleHandler, Level, Logger};
use env_logger::WriteStyle;

pub const LOGGER_NAME: &str = "colorlog";

/// Builds the application logger: a colored stderr handler, no
/// propagation, and a threshold taken from the verbosity flags
/// (`None` silences everything).
pub fn console_logger(level: Option<log::Level>, write_style: WriteStyle) -> Logger {
    let mut logger = Logger::new(LOGGER_NAME);
    colorlog::configure_with(&mut logger, ConsoleHandler::new().with_write_style(write_style));

    let threshold = level.map_or_else(|| Level::custom(u8::MAX, "OFF"), Level::from);
    logger.set_level(threshold);

    logger
}
