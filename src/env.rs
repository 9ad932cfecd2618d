use std::collections::HashMap;
use std::env as stdenv;

/// Get/set/unset access to the environment table that spawned programs inherit.
///
/// The interpreter never caches the table: every lookup goes through the
/// implementation, so a variable exported a moment ago is visible to the next
/// substitution.
pub trait Environment {
    /// Value of `name`, or `None` when it is unset or not valid unicode.
    fn get(&self, name: &str) -> Option<String>;

    /// Set or overwrite `name`.
    fn set(&mut self, name: &str, value: &str);

    /// Remove `name`. Removing a missing variable is not an error.
    fn unset(&mut self, name: &str);
}

/// The real process environment.
///
/// This is what the binary uses: children spawned by the process backend
/// inherit the table, so `export` is visible to external commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn get(&self, name: &str) -> Option<String> {
        stdenv::var(name).ok()
    }

    fn set(&mut self, name: &str, value: &str) {
        // SAFETY: the interpreter runs on one thread. Embedders (test
        // harnesses included) must not touch the environment from another
        // thread while an interpreter on ProcessEnvironment is running.
        unsafe { stdenv::set_var(name, value) }
    }

    fn unset(&mut self, name: &str) {
        // SAFETY: see `set`.
        unsafe { stdenv::remove_var(name) }
    }
}

/// Map-backed environment for tests and embedding.
///
/// Nothing set here reaches spawned programs.
#[derive(Debug, Default, Clone)]
pub struct MemoryEnvironment {
    pub vars: HashMap<String, String>,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Environment for MemoryEnvironment {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_owned(), value.to_owned());
    }

    fn unset(&mut self, name: &str) {
        self.vars.remove(name);
    }
}
