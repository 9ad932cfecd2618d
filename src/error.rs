//! Fatal errors of the interpreter.
//!
//! Anything that surfaces as a [`ShellError`] ends the interpreter. Per-command
//! failures (bad built-in usage, a program that cannot be executed, ...) are
//! reported on the output stream and turned into a non-zero [`ExitCode`]
//! instead.
//!
//! [`ExitCode`]: crate::command::ExitCode

use rustyline::error::ReadlineError;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("failed to create pipe: {0}")]
    Pipe(#[source] io::Error),

    #[error("failed to create process: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),

    #[error("Error opening batch file - {}", .0.display())]
    BatchFile(PathBuf, #[source] io::Error),

    #[error("line editor error: {0}")]
    Readline(#[from] ReadlineError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
