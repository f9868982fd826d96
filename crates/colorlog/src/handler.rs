use std::{
    any::Any,
    io::{self, IsTerminal, Write},
    panic::{self, AssertUnwindSafe},
};

use env_logger::WriteStyle;

use crate::{
    EmitError,
    formatter::{ColorFormatter, Formatter},
    record::LogRecord,
};

/// A sink for formatted records.
///
/// `emit` must not fail: anything that goes wrong is reported through
/// [`handle_error`][Handler::handle_error], which must not fail either.
pub trait Handler: Send + Sync {
    fn emit(&self, record: &LogRecord<'_>);

    /// Writes a best-effort diagnostic to stderr, dropping any failure to do so.
    fn handle_error(&self, record: &LogRecord<'_>, error: &EmitError) {
        let _ = write_diagnostic(record, error, &mut io::stderr().lock());
    }
}

/// Describes a failed record: the error, where it was logged from, and
/// the rendered message, or the raw template when rendering is what failed.
pub(crate) fn write_diagnostic(
    record: &LogRecord<'_>, error: &EmitError, out: &mut impl Write,
) -> io::Result<()> {
    let message = panic::catch_unwind(AssertUnwindSafe(|| record.message()))
        .ok()
        .and_then(Result::ok);

    writeln!(out, "--- Logging error ---\n{error}")?;

    if let Some(origin) = record.origin() {
        writeln!(out, "Logged from: {origin}")?;
    }

    match message {
        Some(message) => writeln!(out, "Message: {message:?}"),
        None => writeln!(
            out,
            "Message: {:?}\nArguments: {}",
            record.template(),
            record.arg_count()
        ),
    }
}

/// Writes formatted records to the standard error stream.
pub struct ConsoleHandler {
    formatter: Box<dyn Formatter>,
    use_stderr: bool,
    write_style: WriteStyle,
    #[cfg(test)]
    pipe: Option<std::sync::Mutex<Box<dyn Write + Send>>>,
}

impl ConsoleHandler {
    pub fn new() -> Self {
        Self {
            formatter: Box::new(ColorFormatter::new()),
            use_stderr: true,
            write_style: WriteStyle::Auto,
            #[cfg(test)]
            pipe: None,
        }
    }

    pub fn set_formatter(&mut self, formatter: impl Formatter + 'static) {
        self.formatter = Box::new(formatter);
    }

    pub fn with_write_style(mut self, write_style: WriteStyle) -> Self {
        self.write_style = write_style;
        self
    }

    /// Captures the output in memory instead of writing it to stderr.
    #[cfg(test)]
    pub(crate) fn with_pipe(mut self, pipe: impl Write + Send + 'static) -> Self {
        self.pipe = Some(std::sync::Mutex::new(Box::new(pipe)));
        self
    }

    /// Always `true`: records go to the standard error stream.
    pub fn use_stderr(&self) -> bool {
        self.use_stderr
    }

    /// Whether escape codes are written: always, never, or only to a terminal.
    pub fn colors_enabled(&self) -> bool {
        match self.write_style {
            WriteStyle::Always => true,
            WriteStyle::Never => false,
            _ => self.is_terminal(),
        }
    }

    fn is_terminal(&self) -> bool {
        #[cfg(test)]
        if self.pipe.is_some() {
            return false;
        }

        io::stderr().is_terminal()
    }

    fn write_record(&self, record: &LogRecord<'_>) -> Result<(), EmitError> {
        let mut text = self.formatter.format(record, self.colors_enabled())?;
        text.push('\n');

        #[cfg(test)]
        if let Some(pipe) = &self.pipe {
            let mut pipe = pipe.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            pipe.write_all(text.as_bytes())?;
            return Ok(());
        }

        io::stderr().lock().write_all(text.as_bytes())?;
        Ok(())
    }
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for ConsoleHandler {
    fn emit(&self, record: &LogRecord<'_>) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.write_record(record)))
            .unwrap_or_else(|payload| Err(EmitError::Panicked(panic_message(payload.as_ref()))));

        if let Err(error) = result {
            self.handle_error(record, &error);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
