use crate::env::{Environment, ProcessEnvironment};
use crate::history::History;
use crate::vars::LocalVars;
use std::io;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Interpreter state that built-ins read and mutate.
///
/// Owned by one [`Interpreter`](crate::Interpreter) and never shared with
/// child processes.
pub struct ShellState {
    /// The environment table children inherit.
    pub environment: Box<dyn Environment>,
    /// Variables visible to `$name` substitution only.
    pub locals: LocalVars,
    pub history: History,
    /// Set by `exit`; the read loops stop once it is true.
    pub should_exit: bool,
}

impl ShellState {
    pub fn new(environment: Box<dyn Environment>, history: History) -> Self {
        Self {
            environment,
            locals: LocalVars::default(),
            history,
            should_exit: false,
        }
    }
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new(Box::new(ProcessEnvironment), History::default())
    }
}

/// What a built-in asks the dispatcher to do once it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Finished with this status.
    Status(ExitCode),
    /// Run this line as if it had just been typed (`history N`).
    Replay(String),
}

/// Object-safe trait for anything the registry can hand to the dispatcher.
///
/// Implemented by built-ins via a blanket impl. Only failures to write to
/// `stdout` come back as errors; everything else is reported on it.
pub trait ExecutableCommand {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        state: &mut ShellState,
    ) -> io::Result<Outcome>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Name the factory answers to.
    fn name(&self) -> &'static str;

    /// Attempt to create a command instance for the provided name and arguments.
    ///
    /// `args` excludes the command name.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
