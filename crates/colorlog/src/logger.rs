use std::{error::Error, sync::Arc};

use crate::{
    handler::Handler,
    record::{ExceptionInfo, Level, LogRecord},
};

/// A named logger: a severity threshold, the handlers records are sent
/// to, and an optional parent that also receives them while `propagate` is set.
pub struct Logger {
    name: String,
    level: Level,
    propagate: bool,
    handlers: Vec<Box<dyn Handler>>,
    parent: Option<Arc<Logger>>,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: Level::NOTSET,
            propagate: true,
            handlers: Vec::new(),
            parent: None,
        }
    }

    pub fn with_parent(name: impl Into<String>, parent: Arc<Self>) -> Self {
        Self { parent: Some(parent), ..Self::new(name) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    /// The first threshold other than `NOTSET` up the parent chain.
    pub fn effective_level(&self) -> &Level {
        let mut logger = self;

        while logger.level == Level::NOTSET {
            match &logger.parent {
                Some(parent) => logger = parent.as_ref(),
                None => break,
            }
        }

        &logger.level
    }

    pub fn is_enabled_for(&self, level: &Level) -> bool {
        level.value() >= self.effective_level().value()
    }

    pub fn propagate(&self) -> bool {
        self.propagate
    }

    pub fn set_propagate(&mut self, propagate: bool) {
        self.propagate = propagate;
    }

    pub fn add_handler(&mut self, handler: impl Handler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn handlers(&self) -> &[Box<dyn Handler>] {
        &self.handlers
    }

    /// Handles the record if it passes this logger's threshold.
    pub fn log(&self, record: &LogRecord<'_>) {
        if self.is_enabled_for(record.level()) {
            self.handle(record);
        }
    }

    /// Sends the record to this logger's handlers, then to each ancestor's
    /// until a logger with `propagate` cleared is reached.
    pub fn handle(&self, record: &LogRecord<'_>) {
        let mut current = Some(self);

        while let Some(logger) = current {
            for handler in &logger.handlers {
                handler.emit(record);
            }

            if !logger.propagate {
                break;
            }
            current = logger.parent.as_deref();
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(&LogRecord::new(Level::DEBUG, message));
    }

    pub fn info(&self, message: &str) {
        self.log(&LogRecord::new(Level::INFO, message));
    }

    pub fn warning(&self, message: &str) {
        self.log(&LogRecord::new(Level::WARNING, message));
    }

    pub fn error(&self, message: &str) {
        self.log(&LogRecord::new(Level::ERROR, message));
    }

    pub fn critical(&self, message: &str) {
        self.log(&LogRecord::new(Level::CRITICAL, message));
    }

    /// Logs at `ERROR` with the error chain attached.
    pub fn exception(&self, message: &str, error: &(dyn Error + 'static)) {
        let record =
            LogRecord::new(Level::ERROR, message).with_exception(ExceptionInfo::from_error(error));
        self.log(&record);
    }
}

#[cfg(test)]
mod tests {
    use std::{io, sync::Arc};

    use super::Logger;
    use crate::{
        handler::ConsoleHandler,
        record::{Level, LogRecord},
        test_utils::SharedBuf,
    };

    fn piped(buf: &SharedBuf) -> ConsoleHandler {
        ConsoleHandler::new().with_pipe(buf.clone())
    }

    #[test]
    fn threshold_filters_records() {
        let buf = SharedBuf::default();
        let mut logger = Logger::new("cli");
        logger.add_handler(piped(&buf));
        logger.set_level(Level::INFO);

        logger.debug("hidden");
        logger.info("shown");
        logger.log(&LogRecord::new(Level::custom(25, "NOTICE"), "custom"));

        assert_eq!("info: shown\ncustom\n", buf.contents());
    }

    #[test]
    fn effective_level_is_inherited() {
        let mut root = Logger::new("root");
        root.set_level(Level::WARNING);
        let child = Logger::with_parent("root.child", Arc::new(root));

        assert_eq!(&Level::NOTSET, child.level());
        assert_eq!(&Level::WARNING, child.effective_level());
        assert!(!child.is_enabled_for(&Level::INFO));
        assert!(child.is_enabled_for(&Level::ERROR));
        assert_eq!(&Level::NOTSET, Logger::new("lone").effective_level());
    }

    #[test]
    fn records_propagate_to_ancestors() {
        let root_buf = SharedBuf::default();
        let child_buf = SharedBuf::default();

        let mut root = Logger::new("root");
        root.add_handler(piped(&root_buf));
        let mut child = Logger::with_parent("root.child", Arc::new(root));
        child.add_handler(piped(&child_buf));

        child.warning("twice");
        assert_eq!("warning: twice\n", root_buf.contents());
        assert_eq!("warning: twice\n", child_buf.contents());

        child.set_propagate(false);
        child.warning("once");
        assert_eq!("warning: twice\n", root_buf.contents());
        assert_eq!("warning: twice\nwarning: once\n", child_buf.contents());
    }

    #[test]
    fn exception_attaches_error_chain() {
        let buf = SharedBuf::default();
        let mut logger = Logger::new("cli");
        logger.add_handler(piped(&buf));

        logger.exception("Upload failed", &io::Error::other("disk full"));
        assert_eq!("Upload failed\nError: disk full\n", buf.contents());
    }
}
