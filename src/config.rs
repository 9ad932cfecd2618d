use crate::history::DEFAULT_HISTORY_SIZE;
use argh::FromArgs;
use std::path::PathBuf;

pub const DEFAULT_PROMPT: &str = "rsh> ";

/// Environment variable holding the log filter (env_logger syntax).
pub const LOG_ENV: &str = "RSH_LOG";

#[derive(FromArgs, Debug)]
/// A small command interpreter: variables, pipelines and command history.
pub struct Args {
    #[argh(positional)]
    /// file of commands to run line by line instead of reading from the terminal.
    pub batch_file: Option<PathBuf>,

    #[argh(option, default = "DEFAULT_HISTORY_SIZE")]
    /// number of history entries kept at startup.
    pub history_size: usize,

    #[argh(option, default = "String::from(DEFAULT_PROMPT)")]
    /// prompt printed in interactive mode.
    pub prompt: String,
}

/// Settings an [`Interpreter`](crate::Interpreter) and its read loop start with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub batch_file: Option<PathBuf>,
    pub history_size: usize,
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_file: None,
            history_size: DEFAULT_HISTORY_SIZE,
            prompt: DEFAULT_PROMPT.to_owned(),
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            batch_file: args.batch_file,
            history_size: args.history_size,
            prompt: args.prompt,
        }
    }
}
