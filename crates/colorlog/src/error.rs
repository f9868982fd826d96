use std::{fmt, io};

use thiserror::Error;

/// Failures raised while turning a record into text or writing it out.
///
/// They never leave a [`Handler`][crate::Handler]; handlers route them
/// to [`handle_error`][crate::Handler::handle_error] instead.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("not enough arguments for format string")]
    MissingArgument,

    #[error("not all arguments converted during string formatting")]
    UnusedArguments,

    #[error("a formatting trait implementation returned an error")]
    Render(#[from] fmt::Error),

    #[error("failed to encode extra attributes: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write log entry: {0}")]
    Write(#[from] io::Error),

    #[error("panicked while emitting: {0}")]
    Panicked(String),
}
