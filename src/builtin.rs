use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Outcome, ShellState};
use crate::interpreter::Factory;
use crate::vars::{Assignment, VarError};
use anyhow::{Context, Result, anyhow, bail};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::io;
use std::io::Write;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process; they never spawn a child process. Every argument reaches the
/// command as a plain positional, so words like `-x` or `help` are data.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "history" or "cd".
    fn name() -> &'static str;

    /// Executes the command against the interpreter state.
    ///
    /// An `Err` is printed on `stdout` and turned into status 1.
    fn execute(self, stdout: &mut dyn Write, state: &mut ShellState) -> Result<Outcome>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        state: &mut ShellState,
    ) -> io::Result<Outcome> {
        match <T as BuiltinCommand>::execute(*self, stdout, state) {
            Ok(x) => Ok(x),
            Err(e) => {
                log::debug!("{} failed: {e:#}", T::name());
                writeln!(stdout, "{e:#}")?;
                Ok(Outcome::Status(1))
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _state: &mut ShellState,
    ) -> io::Result<Outcome> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(Outcome::Status(if self.is_error { 1 } else { 0 }))
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            // Everything after `--` is positional: no flags, no `help`.
            let args: Vec<&str> = std::iter::once("--").chain(args.iter().copied()).collect();
            Some(match T::from_args(&[name], &args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

const SUCCESS: Outcome = Outcome::Status(0);

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; anything after it is ignored.
    pub args: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, _state: &mut ShellState) -> Result<Outcome> {
        let Some(target) = self.args.first() else {
            bail!("rsh: expected argument to \"cd\"");
        };
        env::set_current_dir(target).context("Error while using cd!")?;
        Ok(SUCCESS)
    }
}

#[derive(FromArgs)]
/// Exit the shell with status 0.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, state: &mut ShellState) -> Result<Outcome> {
        state.should_exit = true;
        Ok(SUCCESS)
    }
}

#[derive(FromArgs)]
/// Set (NAME=value) or remove (NAME=) an environment variable.
pub struct Export {
    #[argh(positional, greedy)]
    /// the assignment; anything after it is ignored.
    pub args: Vec<String>,
}

impl BuiltinCommand for Export {
    fn name() -> &'static str {
        "export"
    }

    fn execute(self, _stdout: &mut dyn Write, state: &mut ShellState) -> Result<Outcome> {
        let arg = self
            .args
            .first()
            .ok_or(VarError::MissingArgument)
            .context("export")?;
        let assignment = Assignment::parse_export(arg).context("export")?;
        match &assignment.value {
            Some(value) => state.environment.set(&assignment.name, value),
            None => state.environment.unset(&assignment.name),
        }
        Ok(SUCCESS)
    }
}

#[derive(FromArgs)]
/// Set (NAME=value) or remove (NAME=) a shell-local variable.
pub struct Local {
    #[argh(positional, greedy)]
    /// the assignment; anything after it is ignored.
    pub args: Vec<String>,
}

impl BuiltinCommand for Local {
    fn name() -> &'static str {
        "local"
    }

    fn execute(self, _stdout: &mut dyn Write, state: &mut ShellState) -> Result<Outcome> {
        let arg = self
            .args
            .first()
            .ok_or(VarError::MissingArgument)
            .context("local")?;
        let assignment = Assignment::parse_local(arg).context("local")?;
        state.locals.apply(&assignment).context("local")?;
        Ok(SUCCESS)
    }
}

#[derive(FromArgs)]
/// Print every shell-local variable as NAME=value.
pub struct Vars {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Vars {
    fn name() -> &'static str {
        "vars"
    }

    fn execute(self, stdout: &mut dyn Write, state: &mut ShellState) -> Result<Outcome> {
        for (name, value) in state.locals.iter() {
            writeln!(stdout, "{name}={value}")?;
        }
        Ok(SUCCESS)
    }
}

#[derive(FromArgs)]
/// List the history, replay entry N, or change its size with `set K`.
pub struct History {
    #[argh(positional, greedy)]
    /// nothing, an entry number, or `set` followed by the new size.
    pub args: Vec<String>,
}

impl History {
    fn list(stdout: &mut dyn Write, state: &ShellState) -> Result<ExitCode> {
        for (idx, line) in state.history.iter().enumerate() {
            writeln!(stdout, "{}) {}", idx + 1, line)?;
        }
        Ok(0)
    }
}

fn numeric_only() -> anyhow::Error {
    anyhow!("Numeric Only!")
}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Write, state: &mut ShellState) -> Result<Outcome> {
        match self.args.as_slice() {
            [] => Self::list(stdout, state).map(Outcome::Status),
            [set, size, ..] if set == "set" => {
                let size: usize = size.parse().map_err(|_| numeric_only())?;
                state.history.resize(size);
                Ok(SUCCESS)
            }
            [index, ..] => {
                let index: usize = index.parse().map_err(|_| numeric_only())?;
                let line = state
                    .history
                    .get_one_based(index)
                    .ok_or_else(numeric_only)?;
                Ok(Outcome::Replay(line.to_owned()))
            }
        }
    }
}
