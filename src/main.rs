#[macro_use] extern crate log;

use std::{io, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorlog::{ExceptionInfo, Level, LogRecord, Logger};
use env_logger::WriteStyle;
use serde_json::Value;
mod logger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
    /// When to color the level prefixes.
    #[arg(long, value_enum, global = true, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Emit a single record through the console logger.
    Emit {
        #[arg(value_name = "MESSAGE")]
        message: String,
        /// Level name, or `NAME:VALUE` for a custom level.
        #[arg(short, long, default_value = "info", value_parser = parse_level)]
        level: Level,
        /// Substituted for the next `{}` in the message.
        #[arg(short, long = "arg", value_name = "VALUE")]
        args: Vec<String>,
        /// Extra attribute; the value is read as JSON, or as a string if that fails.
        #[arg(short = 'x', long = "extra", value_name = "KEY=VALUE", value_parser = parse_extra)]
        extras: Vec<(String, Value)>,
        /// Attaches an error chain, outermost error first.
        #[arg(short, long = "error", value_name = "MESSAGE")]
        errors: Vec<String>,
    },
    /// Log a sample of every level through the `log` macros.
    Demo,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl From<ColorChoice> for WriteStyle {
    fn from(value: ColorChoice) -> Self {
        match value {
            ColorChoice::Auto => Self::Auto,
            ColorChoice::Always => Self::Always,
            ColorChoice::Never => Self::Never,
        }
    }
}

fn main() {
    let args = Cli::parse();
    let logger = Arc::new(logger::console_logger(args.verbose.log_level(), args.color.into()));

    if let Err(err) = colorlog::init(Arc::clone(&logger)) {
        logger.exception("Failed to install the console logger", &err);
    }

    match args.command {
        Commands::Emit { message, level, args, extras, errors } => {
            emit(&logger, level, &message, &args, extras, errors);
        }
        Commands::Demo => demo(&logger),
    }
}

fn emit(
    logger: &Logger, level: Level, message: &str, args: &[String], extras: Vec<(String, Value)>,
    errors: Vec<String>,
) {
    let mut record = LogRecord::new(level, message);

    for arg in args {
        record = record.with_arg(arg);
    }

    for (key, value) in extras {
        record = record.with_extra(key, value);
    }

    if !errors.is_empty() {
        record = record.with_exception(ExceptionInfo::new(errors));
    }

    logger.log(&record);
}

fn demo(logger: &Logger) {
    trace!("Levels outside the color map are printed as is");
    debug!(runner = "pytest", dry_run = false; "Collecting labels...");
    info!("Collected {} tests", 42);
    info!(status_code = 200, labels = 12; "Label request sent. Waiting for result.");
    warn!(status_code = 502; "Request failed. Retrying");
    info!("Label groups:\n- present_diff_labels\n- global_level_labels");

    let err = io::Error::other("connection reset by peer");
    error!(exc_info:err = err; "Sorry. Codecov is having problems");

    let err = anyhow!("timed out after 30s").context("waiting for label analysis");
    logger.exception("Request failed", &*err);
}

fn parse_level(s: &str) -> Result<Level> {
    if let Some(level) = Level::from_name(s) {
        return Ok(level);
    }

    match s.split_once(':') {
        Some((name, value)) => {
            let value = value.parse().with_context(|| format!("Invalid level value: `{value}`"))?;
            Ok(Level::custom(value, name.to_uppercase()))
        }
        None if s.is_empty() => bail!("The level name is empty"),
        None => Ok(Level::custom(Level::INFO.value(), s.to_uppercase())),
    }
}

fn parse_extra(s: &str) -> Result<(String, Value)> {
    let (key, raw) = s
        .split_once('=')
        .with_context(|| format!("Expected `KEY=VALUE`, got: `{s}`"))?;

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
    Ok((key.to_owned(), value))
}
