use itertools::Itertools;

use crate::{EmitError, encoder::encode_extras, record::LogRecord, style::Color};

/// Turns a record into the text a handler writes out, without a trailing newline.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord<'_>, colors: bool) -> Result<String, EmitError>;
}

/// The message, followed by the error chain when the record carries one.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn format(&self, record: &LogRecord<'_>, _colors: bool) -> Result<String, EmitError> {
        let mut text = record.message()?;

        if let Some(exc_info) = record.exc_info() {
            if !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&exc_info.to_string());
        }

        Ok(text)
    }
}

/// Prefixes every line with the colored level name and appends the
/// extra attributes as JSON after a ` --- ` separator.
///
/// Records with exception info are left to [`PlainFormatter`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ColorFormatter {
    fallback: PlainFormatter,
}

impl ColorFormatter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Formatter for ColorFormatter {
    fn format(&self, record: &LogRecord<'_>, colors: bool) -> Result<String, EmitError> {
        if record.exc_info().is_some() {
            return self.fallback.format(record, colors);
        }

        let level = record.level().name().to_lowercase();
        let mut msg = record.message()?;

        if let Some(color) = Color::for_level(&level) {
            let prefix = color.paint(&format!("{level}: "), colors);
            let prefixed = split_lines(&msg).map(|line| format!("{prefix}{line}")).join("\n");
            msg = prefixed;
        }

        if let Some(extras) = record.extra_attributes().filter(|extras| !extras.is_empty()) {
            msg.push_str(" --- ");
            msg.push_str(&encode_extras(extras)?);
        }

        Ok(msg)
    }
}

/// Splits on every Unicode line boundary, `\r\n` counting as one.
/// A trailing boundary does not start an empty line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;

    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }

        let Some(end) = rest.find(is_line_boundary) else {
            return Some(std::mem::take(&mut rest));
        };
        let (line, tail) = rest.split_at(end);
        let width = if tail.starts_with("\r\n") {
            2
        } else {
            tail.chars().next().map_or(1, char::len_utf8)
        };
        rest = &tail[width..];
        Some(line)
    })
}

const fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\x0b'
            | '\x0c'
            | '\x1c'
            | '\x1d'
            | '\x1e'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::{ColorFormatter, Formatter, PlainFormatter};
    use crate::{
        EmitError,
        encoder::Text,
        record::{ExceptionInfo, Extras, Level, LogRecord},
    };

    fn plain(record: &LogRecord<'_>) -> String {
        ColorFormatter::new().format(record, false).unwrap()
    }

    #[test]
    fn extras_are_appended() {
        let record = LogRecord::new(Level::INFO, "hello").with_extra("a", 1).with_extra("b", "x");
        assert_eq!(r#"info: hello --- {"a": 1, "b": "x"}"#, plain(&record));
    }

    #[test]
    fn every_line_is_prefixed() {
        let record = LogRecord::new(Level::WARNING, "first\nsecond\n\nfourth");
        assert_eq!("warning: first\nwarning: second\nwarning: \nwarning: fourth", plain(&record));
    }

    #[test]
    fn every_line_boundary_starts_a_new_line() {
        let info = |text: &str| plain(&LogRecord::new(Level::INFO, text));

        assert_eq!("info: a\ninfo: b", info("a\rb"));
        assert_eq!("info: a\ninfo: b\ninfo: c", info("a\u{2028}b\x0cc"));
        assert_eq!("info: a\ninfo: b", info("a\r\nb\r\n"));
        assert_eq!("info: a\ninfo: \ninfo: b", info("a\r\rb"));
        assert_eq!("info: x\ninfo: y\ninfo: z", info("x\u{85}y\x1ez\u{2029}"));
    }

    #[test]
    fn colored_prefix() {
        let record = LogRecord::new(Level::ERROR, "a\nb");
        let text = ColorFormatter::new().format(&record, true).unwrap();

        assert_eq!("\x1b[31merror: \x1b[0ma\n\x1b[31merror: \x1b[0mb", text);
    }

    #[test]
    fn all_recognized_levels() {
        for (level, name) in [
            (Level::DEBUG, "debug"),
            (Level::INFO, "info"),
            (Level::WARNING, "warning"),
            (Level::ERROR, "error"),
            (Level::CRITICAL, "critical"),
            (Level::custom(40, "EXCEPTION"), "exception"),
        ] {
            let record = LogRecord::new(level, "msg");
            assert_eq!(format!("{name}: msg"), plain(&record));
        }
    }

    #[test]
    fn empty_extras_are_not_appended() {
        let record = LogRecord::new(Level::DEBUG, "quiet").with_extras(Extras::new());
        assert_eq!("debug: quiet", plain(&record));
    }

    #[test]
    fn unknown_level_has_no_prefix() {
        let record =
            LogRecord::new(Level::custom(25, "NOTICE"), "two\nlines").with_extra("k", true);
        assert_eq!("two\nlines --- {\"k\": true}", plain(&record));

        let trace = LogRecord::new(Level::TRACE, "verbose");
        assert_eq!("verbose", plain(&trace));
    }

    #[test]
    fn empty_message_has_no_lines() {
        let record = LogRecord::new(Level::INFO, "");
        assert_eq!("", plain(&record));
    }

    #[test]
    fn exception_uses_plain_rendering() {
        let exc_info = ExceptionInfo::new(["upload failed", "timed out"]);
        let record = LogRecord::new(Level::ERROR, "Request {} failed")
            .with_arg(3)
            .with_extra("ignored", 1)
            .with_exception(exc_info);

        let expected = "Request 3 failed\nError: upload failed\n\nCaused by:\n    0: timed out";
        assert_eq!(expected, ColorFormatter::new().format(&record, true).unwrap());
        assert_eq!(expected, PlainFormatter.format(&record, true).unwrap());
    }

    #[test]
    fn message_errors_surface() {
        struct Broken;

        impl fmt::Display for Broken {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                Err(fmt::Error)
            }
        }

        let record = LogRecord::new(Level::INFO, "{}").with_arg(Broken);
        assert!(matches!(ColorFormatter::new().format(&record, false), Err(EmitError::Render(_))));

        let unformattable_extra = LogRecord::new(Level::INFO, "ok").with_extra("v", Text(Broken));
        assert_eq!("info: ok --- {\"v\": null}", plain(&unformattable_extra));
    }
}
