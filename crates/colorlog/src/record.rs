use std::{
    borrow::Cow,
    error::Error,
    fmt::{self, Display, Write},
};

use crate::{EmitError, encoder::Attribute};

/// Severity of a record: a numeric value ordered from verbose to urgent,
/// plus the upper-case name formatters print.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level {
    value: u8,
    name: Cow<'static, str>,
}

impl Level {
    pub const NOTSET: Self = Self::named(0, "NOTSET");
    pub const TRACE: Self = Self::named(5, "TRACE");
    pub const DEBUG: Self = Self::named(10, "DEBUG");
    pub const INFO: Self = Self::named(20, "INFO");
    pub const WARNING: Self = Self::named(30, "WARNING");
    pub const ERROR: Self = Self::named(40, "ERROR");
    pub const CRITICAL: Self = Self::named(50, "CRITICAL");

    const fn named(value: u8, name: &'static str) -> Self {
        Self { value, name: Cow::Borrowed(name) }
    }

    /// Creates a level outside the standard set, e.g. `Level::custom(25, "NOTICE")`.
    pub fn custom(value: u8, name: impl Into<Cow<'static, str>>) -> Self {
        Self { value, name: name.into() }
    }

    /// Looks up one of the standard levels by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let level = match name.to_ascii_lowercase().as_str() {
            "notset" => Self::NOTSET,
            "trace" => Self::TRACE,
            "debug" => Self::DEBUG,
            "info" => Self::INFO,
            "warning" | "warn" => Self::WARNING,
            "error" => Self::ERROR,
            "critical" | "fatal" => Self::CRITICAL,
            _ => return None,
        };
        Some(level)
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The most verbose [`log::LevelFilter`] that still lets this level through.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self.value {
            0..=5 => log::LevelFilter::Trace,
            6..=10 => log::LevelFilter::Debug,
            11..=20 => log::LevelFilter::Info,
            21..=30 => log::LevelFilter::Warn,
            _ => log::LevelFilter::Error,
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::ERROR,
            log::Level::Warn => Self::WARNING,
            log::Level::Info => Self::INFO,
            log::Level::Debug => Self::DEBUG,
            log::Level::Trace => Self::TRACE,
        }
    }
}

/// Structured key-value data attached to a single record, kept in insertion order.
#[derive(Default)]
pub struct Extras<'a> {
    entries: Vec<(String, Box<dyn Attribute + 'a>)>,
}

impl<'a> Extras<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an attribute, replacing the value of an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Attribute + 'a) -> &mut Self {
        let key = key.into();
        let value: Box<dyn Attribute + 'a> = Box::new(value);

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }

        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Attribute + 'a) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&(dyn Attribute + 'a)> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &(dyn Attribute + 'a))> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Extras<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter().map(|(k, _)| k)).finish()
    }
}

/// An error chain captured at log time, outermost error first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    chain: Vec<String>,
}

impl ExceptionInfo {
    pub fn new<I, S>(chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { chain: chain.into_iter().map(Into::into).collect() }
    }

    /// Walks [`Error::source`] to capture the whole chain.
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let mut chain = vec![error.to_string()];
        let mut source = error.source();

        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        Self { chain }
    }

    pub fn chain(&self) -> &[String] {
        &self.chain
    }
}

impl Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((top, causes)) = self.chain.split_first() else {
            return f.write_str("Error");
        };

        write!(f, "Error: {top}")?;

        if !causes.is_empty() {
            f.write_str("\n\nCaused by:")?;
            for (i, cause) in causes.iter().enumerate() {
                write!(f, "\n    {i}: {cause}")?;
            }
        }

        Ok(())
    }
}

/// One logging event: a level, a message template with its positional
/// arguments, and the optional exception info and extra attributes.
pub struct LogRecord<'a> {
    level: Level,
    template: Cow<'a, str>,
    args: Vec<Box<dyn Display + 'a>>,
    exc_info: Option<ExceptionInfo>,
    extra_attributes: Option<Extras<'a>>,
    origin: Option<Cow<'a, str>>,
}

impl<'a> LogRecord<'a> {
    pub fn new(level: Level, template: impl Into<Cow<'a, str>>) -> Self {
        Self {
            level,
            template: template.into(),
            args: Vec::new(),
            exc_info: None,
            extra_attributes: None,
            origin: None,
        }
    }

    /// Appends a positional argument, substituted for the next `{}` in the template.
    pub fn with_arg(mut self, arg: impl Display + 'a) -> Self {
        self.args.push(Box::new(arg));
        self
    }

    pub fn with_exception(mut self, exc_info: ExceptionInfo) -> Self {
        self.exc_info = Some(exc_info);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Attribute + 'a) -> Self {
        self.extra_attributes.get_or_insert_with(Extras::new).insert(key, value);
        self
    }

    pub fn with_extras(mut self, extras: Extras<'a>) -> Self {
        self.extra_attributes = Some(extras);
        self
    }

    /// Where the record was logged from, e.g. `app::upload (src/upload.rs:42)`.
    pub fn with_origin(mut self, origin: impl Into<Cow<'a, str>>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn exc_info(&self) -> Option<&ExceptionInfo> {
        self.exc_info.as_ref()
    }

    pub fn extra_attributes(&self) -> Option<&Extras<'a>> {
        self.extra_attributes.as_ref()
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Renders the template with its arguments.
    ///
    /// A template without arguments is returned verbatim. Otherwise every
    /// `{}` takes the next argument, `{{` and `}}` escape braces, and the
    /// number of placeholders must match the number of arguments.
    pub fn message(&self) -> Result<String, EmitError> {
        if self.args.is_empty() {
            return Ok(self.template.clone().into_owned());
        }

        let mut out = String::with_capacity(self.template.len());
        let mut args = self.args.iter();
        let mut chars = self.template.chars().peekable();

        while let Some(c) = chars.next() {
            let next = chars.peek().copied();
            match (c, next) {
                ('{', Some('{')) | ('}', Some('}')) => {
                    chars.next();
                    out.push(c);
                }
                ('{', Some('}')) => {
                    chars.next();
                    let arg = args.next().ok_or(EmitError::MissingArgument)?;
                    write!(out, "{arg}")?;
                }
                _ => out.push(c),
            }
        }

        if args.next().is_some() {
            return Err(EmitError::UnusedArguments);
        }

        Ok(out)
    }
}

impl fmt::Debug for LogRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRecord")
            .field("level", &self.level)
            .field("template", &self.template)
            .field("args", &self.args.len())
            .field("exc_info", &self.exc_info)
            .field("extra_attributes", &self.extra_attributes)
            .field("origin", &self.origin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{fmt, io};

    use super::{ExceptionInfo, Level, LogRecord};
    use crate::{EmitError, encoder::Attribute};

    #[test]
    fn message_without_args_is_verbatim() {
        let record = LogRecord::new(Level::INFO, "100% {} done");
        assert_eq!("100% {} done", record.message().unwrap());
    }

    #[test]
    fn message_substitutes_args_in_order() {
        let record = LogRecord::new(Level::INFO, "Collected {} tests in {}s {{cached}}")
            .with_arg(42)
            .with_arg(1.5);

        assert_eq!("Collected 42 tests in 1.5s {cached}", record.message().unwrap());
    }

    #[test]
    fn message_argument_mismatch() {
        let missing = LogRecord::new(Level::INFO, "{} and {}").with_arg("one");
        assert!(matches!(missing.message(), Err(EmitError::MissingArgument)));

        let unused = LogRecord::new(Level::INFO, "{}").with_arg(1).with_arg(2);
        assert!(matches!(unused.message(), Err(EmitError::UnusedArguments)));
    }

    #[test]
    fn message_render_failure() {
        struct Broken;

        impl fmt::Display for Broken {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                Err(fmt::Error)
            }
        }

        let record = LogRecord::new(Level::INFO, "{}").with_arg(Broken);
        assert!(matches!(record.message(), Err(EmitError::Render(_))));
    }

    #[test]
    fn level_ordering_and_names() {
        assert!(Level::DEBUG < Level::INFO);
        assert!(Level::WARNING < Level::ERROR);
        assert!(Level::custom(25, "NOTICE") > Level::INFO);
        assert_eq!(Some(Level::WARNING), Level::from_name("warn"));
        assert_eq!(None, Level::from_name("notice"));
        assert_eq!(Level::WARNING, Level::from(log::Level::Warn));
        assert_eq!(log::LevelFilter::Error, Level::CRITICAL.to_level_filter());
    }

    #[test]
    fn exception_info_walks_sources() {
        let error = Wrapped(io::Error::other("connection reset"));
        let info = ExceptionInfo::from_error(&error);

        assert_eq!(
            "Error: request failed\n\nCaused by:\n    0: connection reset",
            info.to_string()
        );
    }

    #[test]
    fn extras_keep_insertion_order_and_replace() {
        let record = LogRecord::new(Level::INFO, "msg")
            .with_extra("b", 1)
            .with_extra("a", 2)
            .with_extra("b", 3);

        let extras = record.extra_attributes().unwrap();
        let keys: Vec<_> = extras.iter().map(|(k, _)| k).collect();

        assert_eq!(vec!["b", "a"], keys);
        assert_eq!(Some(serde_json::json!(3)), extras.get("b").unwrap().to_json());
    }

    #[derive(Debug)]
    struct Wrapped(io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("request failed")
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }
}
