use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Outcome, ShellState};
use crate::config::Config;
use crate::env::ProcessEnvironment;
use crate::error::{Result, ShellError};
use crate::history::History;
use crate::lexer;
use crate::pipeline;
use crate::process::{OsBackend, ProcessBackend, SpawnError};
use crate::vars;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// `history N` may replay a line that replays again; stop after this many levels.
const MAX_REPLAY_DEPTH: usize = 16;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the built-ins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Fixed name → handler mapping consulted before anything is spawned.
pub struct Registry {
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Registry {
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { commands }
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.iter().any(|factory| factory.name() == name)
    }

    /// `args` is the whole argument vector, command name included.
    pub fn create(&self, args: &[String]) -> Option<Box<dyn ExecutableCommand>> {
        let (name, rest) = args.split_first()?;
        let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
        self.commands
            .iter()
            .find_map(|factory| factory.try_create(name, &rest))
    }
}

impl Default for Registry {
    /// `history`, `cd`, `exit`, `export`, `local` and `vars`.
    fn default() -> Self {
        use crate::builtin::{self, Cd, Exit, Export, Local, Vars};
        Self::new(vec![
            Box::new(Factory::<builtin::History>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Export>::default()),
            Box::new(Factory::<Local>::default()),
            Box::new(Factory::<Vars>::default()),
        ])
    }
}

/// A minimal shell: tokenizes lines, runs built-ins in-process and everything
/// else as child processes, optionally chained through pipes.
///
/// Output of built-ins and diagnostics goes to the interpreter's writer;
/// external programs inherit the process's stdout.
///
/// Example
/// ```
/// use rsh::{Config, Interpreter};
/// let mut sh = Interpreter::new(&Config::default());
/// let code = sh.execute_line("local GREETING=hello").unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(sh.state().locals.get("GREETING"), Some("hello"));
/// ```
pub struct Interpreter<B: ProcessBackend = OsBackend> {
    state: ShellState,
    registry: Registry,
    backend: B,
    stdout: Box<dyn Write>,
    replay_depth: usize,
}

impl Interpreter<OsBackend> {
    /// Interpreter on real processes, the real environment and stdout.
    pub fn new(config: &Config) -> Self {
        let state = ShellState::new(
            Box::new(ProcessEnvironment),
            History::new(config.history_size),
        );
        Self::with_parts(state, OsBackend, Box::new(std::io::stdout()))
    }
}

impl Default for Interpreter<OsBackend> {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl<B: ProcessBackend> Interpreter<B> {
    pub fn with_parts(state: ShellState, backend: B, stdout: Box<dyn Write>) -> Self {
        Self {
            state,
            registry: Registry::default(),
            backend,
            stdout,
            replay_depth: 0,
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ShellState {
        &mut self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether `exit` has run; read loops stop once this is true.
    pub fn should_exit(&self) -> bool {
        self.state.should_exit
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.registry.is_builtin(name)
    }

    /// Tokenize `line` and dispatch it.
    ///
    /// A trailing line terminator is ignored.
    pub fn execute_line(&mut self, line: &str) -> Result<ExitCode> {
        let line = line.trim_end_matches(['\n', '\r']);
        let state = &self.state;
        let args = lexer::split_into_args(line, |name| {
            vars::resolve(state.environment.as_ref(), &state.locals, name)
        });
        log::debug!("{line:?} -> {args:?}");
        self.dispatch(line, &args)
    }

    /// Run an already tokenized command line.
    ///
    /// `line` is the text `args` came from; it is what goes into the history
    /// after anything that is not a built-in has run.
    pub fn dispatch(&mut self, line: &str, args: &[String]) -> Result<ExitCode> {
        let Some(name) = args.first() else {
            writeln!(self.stdout, "Empty input!")?;
            return Ok(1);
        };

        let code = if lexer::count_pipes(args) > 0 {
            let stages = match pipeline::split_stages(args) {
                Ok(stages) => stages,
                Err(e) => {
                    writeln!(self.stdout, "{e}")?;
                    return Ok(1);
                }
            };
            self.stdout.flush()?;
            pipeline::run_pipeline(&mut self.backend, &stages, &mut *self.stdout)?;
            0
        } else if let Some(cmd) = self.registry.create(args) {
            log::debug!("builtin {name}");
            return self.run_builtin(cmd);
        } else {
            self.run_external(args)?
        };

        self.state.history.record(line);
        Ok(code)
    }

    fn run_builtin(&mut self, cmd: Box<dyn ExecutableCommand>) -> Result<ExitCode> {
        match cmd.execute(&mut *self.stdout, &mut self.state)? {
            Outcome::Status(code) => Ok(code),
            Outcome::Replay(line) => self.replay(&line),
        }
    }

    fn replay(&mut self, line: &str) -> Result<ExitCode> {
        if self.replay_depth >= MAX_REPLAY_DEPTH {
            writeln!(self.stdout, "history: replay nested too deeply")?;
            return Ok(1);
        }
        self.replay_depth += 1;
        let result = self.execute_line(line);
        self.replay_depth -= 1;
        result
    }

    fn run_external(&mut self, args: &[String]) -> Result<ExitCode> {
        self.stdout.flush()?;
        match self.backend.spawn(args, None, None) {
            Ok(child) => self.backend.wait(child).map_err(ShellError::Wait),
            Err(SpawnError::Fatal(_, e)) => Err(ShellError::Spawn(e)),
            Err(e) => {
                log::warn!("{e}");
                writeln!(self.stdout, "rsh: {e}")?;
                Ok(e.exit_code())
            }
        }
    }

    /// Execute every line of `reader` until it ends or `exit` runs.
    pub fn run_lines<R: BufRead>(&mut self, reader: R) -> Result<()> {
        for line in reader.lines() {
            self.execute_line(&line?)?;
            if self.should_exit() {
                break;
            }
        }
        self.stdout.flush()?;
        Ok(())
    }

    /// Batch mode: run the commands in the file at `path`.
    pub fn run_batch(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).map_err(|e| ShellError::BatchFile(path.to_path_buf(), e))?;
        log::debug!("running batch file {}", path.display());
        self.run_lines(BufReader::new(file))
    }

    /// Interactive Read-Eval-Print Loop.
    ///
    /// Ctrl+C discards the current line, Ctrl+D leaves the loop.
    pub fn repl(&mut self, prompt: &str) -> Result<()> {
        let mut rl = DefaultEditor::new()?;

        while !self.should_exit() {
            match rl.readline(prompt) {
                Ok(line) => {
                    self.execute_line(&line)?;
                    self.stdout.flush()?;
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }
}
