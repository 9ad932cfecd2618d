//! A small command interpreter.
//!
//! Lines are split on whitespace with `$name` substitution, then either run
//! as one of the built-ins (`cd`, `exit`, `export`, `local`, `vars`,
//! `history`) or launched as external programs, singly or chained through
//! pipes. Non-built-in command lines are kept in a bounded history that can be
//! listed, resized and replayed.
//!
//! The main entry point is [`Interpreter`]. Process creation goes through the
//! [`process::ProcessBackend`] trait so the dispatch and pipeline logic can be
//! driven without forking; [`process::OsBackend`] is the real implementation.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod history;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod pipeline;
pub mod process;
pub mod vars;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Result, ShellError};
pub use interpreter::{Interpreter, Registry};
pub use io_adapters::MemWriter;
