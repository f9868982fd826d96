use std::sync::Arc;

use log::{
    Metadata, SetLoggerError,
    kv::{self, Key, Value, VisitSource},
};

use crate::{
    logger::Logger,
    record::{ExceptionInfo, Extras, Level, LogRecord},
};

/// Key whose `:err` capture becomes the record's exception info,
/// e.g. `error!(exc_info:err = err; "Upload failed")`.
pub const EXC_INFO_KEY: &str = "exc_info";

/// Forwards records from the [`log`] macros to a [`Logger`].
///
/// Key-value pairs become extra attributes.
pub struct LogBridge {
    logger: Arc<Logger>,
}

impl LogBridge {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.logger.is_enabled_for(&Level::from(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        self.logger.log(&to_record(record));
    }

    fn flush(&self) {}
}

fn to_record<'r>(record: &'r log::Record<'_>) -> LogRecord<'r> {
    let level = Level::from(record.level());
    let mut entry = match record.args().as_str() {
        Some(message) => LogRecord::new(level, message),
        None => LogRecord::new(level, "{}").with_arg(record.args()),
    };

    let origin = match (record.file(), record.line()) {
        (Some(file), Some(line)) => format!("{} ({file}:{line})", record.target()),
        _ => record.target().to_owned(),
    };
    entry = entry.with_origin(origin);

    let mut collector = Collector::default();
    // The collector never fails a pair, so neither does the visit.
    let _ = record.key_values().visit(&mut collector);

    if !collector.extras.is_empty() {
        entry = entry.with_extras(collector.extras);
    }
    if let Some(exc_info) = collector.exc_info {
        entry = entry.with_exception(exc_info);
    }

    entry
}

#[derive(Default)]
struct Collector<'kvs> {
    extras: Extras<'kvs>,
    exc_info: Option<ExceptionInfo>,
}

impl<'kvs> VisitSource<'kvs> for Collector<'kvs> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), kv::Error> {
        if key.as_str() == EXC_INFO_KEY {
            if let Some(error) = value.to_borrowed_error() {
                self.exc_info = Some(ExceptionInfo::from_error(error));
                return Ok(());
            }
        }

        self.extras.insert(key.as_str(), value);
        Ok(())
    }
}

/// Installs `logger` behind the [`log`] macros, letting through everything
/// its effective level allows.
pub fn init(logger: Arc<Logger>) -> Result<(), SetLoggerError> {
    let max_level = logger.effective_level().to_level_filter();
    log::set_boxed_logger(Box::new(LogBridge::new(logger)))?;
    log::set_max_level(max_level);
    Ok(())
}
