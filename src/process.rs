use crate::command::ExitCode;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::io::{PipeReader, PipeWriter};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

/// Why a program could not be started.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// Nothing executable under that name. Reported, the shell carries on.
    #[error("{0}: command not found")]
    NotFound(String),

    /// The program was found but could not be executed. Reported, the shell carries on.
    #[error("{0}: {1}")]
    Exec(String, #[source] io::Error),

    /// The process itself could not be created (out of processes, memory, ...).
    #[error("{0}: {1}")]
    Fatal(String, #[source] io::Error),
}

impl SpawnError {
    /// Status a failed launch reports, following the usual shell convention.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SpawnError::NotFound(_) => 127,
            SpawnError::Exec(..) | SpawnError::Fatal(..) => 126,
        }
    }
}

/// The OS process boundary.
///
/// The dispatcher and the pipeline builder only talk to processes through
/// this trait, so their wiring can be exercised without forking anything.
pub trait ProcessBackend {
    /// Read end of a pipe.
    type Reader;
    /// Write end of a pipe.
    type Writer;
    /// A running child.
    type Child;

    /// Allocate one pipe.
    fn pipe(&mut self) -> io::Result<(Self::Reader, Self::Writer)>;

    /// Start `argv[0]` with `argv` as its argument list.
    ///
    /// `None` for a stream means the child inherits the interpreter's own.
    /// The passed pipe ends are consumed: once this returns, the parent no
    /// longer holds them, whether or not the spawn succeeded.
    fn spawn(
        &mut self,
        argv: &[String],
        stdin: Option<Self::Reader>,
        stdout: Option<Self::Writer>,
    ) -> Result<Self::Child, SpawnError>;

    /// Block until `child` has exited or was killed by a signal.
    fn wait(&mut self, child: Self::Child) -> io::Result<ExitCode>;
}

/// Real processes via [`std::process::Command`] and [`std::io::pipe`].
///
/// Pipe ends are created close-on-exec, so a child only keeps the ends that
/// were duplicated onto its stdin/stdout; every other descriptor of every
/// pipe disappears when it execs.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsBackend;

impl ProcessBackend for OsBackend {
    type Reader = PipeReader;
    type Writer = PipeWriter;
    type Child = Child;

    fn pipe(&mut self) -> io::Result<(PipeReader, PipeWriter)> {
        std::io::pipe()
    }

    fn spawn(
        &mut self,
        argv: &[String],
        stdin: Option<PipeReader>,
        stdout: Option<PipeWriter>,
    ) -> Result<Child, SpawnError> {
        let Some(name) = argv.first() else {
            return Err(SpawnError::NotFound(String::new()));
        };
        let search_paths = std::env::var_os("PATH").unwrap_or_default();
        let program = find_command_path(&search_paths, Path::new(name))
            .ok_or_else(|| SpawnError::NotFound(name.clone()))?;

        let mut cmd = Command::new(&*program);
        cmd.args(&argv[1..]);
        if let Some(reader) = stdin {
            cmd.stdin(Stdio::from(reader));
        }
        if let Some(writer) = stdout {
            cmd.stdout(Stdio::from(writer));
        }

        // `cmd` owns the pipe ends; they are closed in the parent when it drops
        let child = cmd.spawn().map_err(|e| classify_spawn_error(name, e))?;
        log::debug!("spawned {name} as pid {}", child.id());
        Ok(child)
    }

    fn wait(&mut self, mut child: Child) -> io::Result<ExitCode> {
        let pid = child.id();
        let status = child.wait()?;
        let code = exit_code(status);
        log::debug!("reaped pid {pid}: {code}");
        Ok(code)
    }
}

fn classify_spawn_error(name: &str, e: io::Error) -> SpawnError {
    match e.kind() {
        io::ErrorKind::NotFound => SpawnError::NotFound(name.to_owned()),
        io::ErrorKind::WouldBlock | io::ErrorKind::OutOfMemory => {
            SpawnError::Fatal(name.to_owned(), e)
        }
        _ => SpawnError::Exec(name.to_owned(), e),
    }
}

fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(x) => x,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first executable file.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

/// First executable `cmd` along `search_paths`. A file without execute
/// permission is skipped, but returned when nothing better exists so the
/// launch fails with "permission denied" instead of "not found".
fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    let mut not_executable = None;
    for path in std::env::split_paths(search_paths).map(|dir| dir.join(cmd)) {
        if !path.is_file() {
            continue;
        }
        if is_executable(&path) {
            return Some(path);
        }
        not_executable.get_or_insert(path);
    }
    not_executable
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|meta| meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
