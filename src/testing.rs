//! In-memory process backend for unit tests.

use crate::command::ExitCode;
use crate::process::{ProcessBackend, SpawnError};
use std::cell::{Ref, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Serialises tests that write the process environment or spawn real
/// children, which read it.
pub(crate) fn lock_process_env() -> MutexGuard<'static, ()> {
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

/// Whitespace-split a literal command line.
pub(crate) fn args(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_owned).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Spawned {
    pub argv: Vec<String>,
    /// Pipe number the child's stdin was connected to.
    pub stdin: Option<usize>,
    /// Pipe number the child's stdout was connected to.
    pub stdout: Option<usize>,
    /// Pipes that existed when this child was started.
    pub pipes_at_spawn: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Ledger {
    pub pipes_created: usize,
    /// Descriptors (two per pipe) the parent still holds.
    pub open_fds: BTreeSet<usize>,
    pub spawned: Vec<Spawned>,
    pub reaped: usize,
}

impl Ledger {
    pub fn fds_created(&self) -> usize {
        self.pipes_created * 2
    }
}

/// Pipe end that marks itself closed in the ledger when dropped.
#[derive(Debug)]
pub(crate) struct FakeFd {
    pipe: usize,
    fd: usize,
    ledger: Rc<RefCell<Ledger>>,
}

impl Drop for FakeFd {
    fn drop(&mut self) {
        self.ledger.borrow_mut().open_fds.remove(&self.fd);
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    ledger: Rc<RefCell<Ledger>>,
    missing: HashSet<String>,
    unspawnable: HashSet<String>,
    exit_codes: HashMap<String, ExitCode>,
    pipe_limit: Option<usize>,
}

impl FakeBackend {
    /// `name` behaves like a program that is not on PATH.
    pub fn missing(mut self, name: &str) -> Self {
        self.missing.insert(name.to_owned());
        self
    }

    /// Creating a process for `name` fails as if the process table were full.
    pub fn unspawnable(mut self, name: &str) -> Self {
        self.unspawnable.insert(name.to_owned());
        self
    }

    pub fn exit_code(mut self, name: &str, code: ExitCode) -> Self {
        self.exit_codes.insert(name.to_owned(), code);
        self
    }

    /// Fail every pipe allocation after the first `limit`.
    pub fn pipe_limit(mut self, limit: usize) -> Self {
        self.pipe_limit = Some(limit);
        self
    }

    pub fn ledger(&self) -> Ref<'_, Ledger> {
        self.ledger.borrow()
    }

    fn fd(&self, pipe: usize, fd: usize) -> FakeFd {
        self.ledger.borrow_mut().open_fds.insert(fd);
        FakeFd {
            pipe,
            fd,
            ledger: Rc::clone(&self.ledger),
        }
    }
}

impl ProcessBackend for FakeBackend {
    type Reader = FakeFd;
    type Writer = FakeFd;
    type Child = ExitCode;

    fn pipe(&mut self) -> io::Result<(FakeFd, FakeFd)> {
        let pipe = self.ledger.borrow().pipes_created;
        if self.pipe_limit.is_some_and(|limit| pipe >= limit) {
            return Err(io::Error::other("too many open files"));
        }
        self.ledger.borrow_mut().pipes_created += 1;
        Ok((self.fd(pipe, pipe * 2), self.fd(pipe, pipe * 2 + 1)))
    }

    fn spawn(
        &mut self,
        argv: &[String],
        stdin: Option<FakeFd>,
        stdout: Option<FakeFd>,
    ) -> Result<ExitCode, SpawnError> {
        let stdin_pipe = stdin.as_ref().map(|fd| fd.pipe);
        let stdout_pipe = stdout.as_ref().map(|fd| fd.pipe);
        // the child got its copies; the parent's go away with these
        drop(stdin);
        drop(stdout);

        let name = argv.first().cloned().unwrap_or_default();
        if self.missing.contains(&name) {
            return Err(SpawnError::NotFound(name));
        }
        if self.unspawnable.contains(&name) {
            return Err(SpawnError::Fatal(
                name,
                io::Error::from(io::ErrorKind::WouldBlock),
            ));
        }

        let mut ledger = self.ledger.borrow_mut();
        let pipes_at_spawn = ledger.pipes_created;
        ledger.spawned.push(Spawned {
            argv: argv.to_vec(),
            stdin: stdin_pipe,
            stdout: stdout_pipe,
            pipes_at_spawn,
        });
        Ok(self.exit_codes.get(&name).copied().unwrap_or(0))
    }

    fn wait(&mut self, child: ExitCode) -> io::Result<ExitCode> {
        self.ledger.borrow_mut().reaped += 1;
        Ok(child)
    }
}
