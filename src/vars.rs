//! Shell-local variables and `$name` resolution.

use crate::env::Environment;

/// Maximum number of entries a [`LocalVars`] table accepts.
pub const LOCAL_VARS_CAPACITY: usize = 100;

/// Errors reported by the `export`/`local` built-ins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VarError {
    #[error("expected argument in the form VAR=value")]
    MissingArgument,

    #[error("invalid format. Use VAR=value")]
    InvalidFormat,

    #[error("maximum number of variables reached")]
    CapacityExceeded,
}

/// Parsed `NAME=value` argument.
///
/// `value == None` means "remove the variable" (`NAME=`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: Option<String>,
}

impl Assignment {
    /// Grammar of `export`: split on the first `=`, the value keeps any
    /// further `=` characters.
    pub fn parse_export(arg: &str) -> Result<Self, VarError> {
        let (name, value) = split_name(arg)?;
        Ok(Self {
            name: name.to_owned(),
            value: (!value.is_empty()).then(|| value.to_owned()),
        })
    }

    /// Grammar of `local`: like [`Assignment::parse_export`], but the value
    /// ends at the next `=` (empty pieces are skipped), so `A=b=c` assigns `b`
    /// and `A==b` assigns `b` too.
    pub fn parse_local(arg: &str) -> Result<Self, VarError> {
        let (name, rest) = split_name(arg)?;
        Ok(Self {
            name: name.to_owned(),
            value: rest
                .split('=')
                .find(|piece| !piece.is_empty())
                .map(str::to_owned),
        })
    }
}

fn split_name(arg: &str) -> Result<(&str, &str), VarError> {
    if arg.contains('\0') {
        return Err(VarError::InvalidFormat);
    }
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => Err(VarError::InvalidFormat),
    }
}

/// Ordered, capacity-bounded table of shell-local variables.
///
/// Keys are unique. Removal keeps the remaining entries packed in insertion
/// order, which is the order `vars` prints them in.
#[derive(Debug, Clone)]
pub struct LocalVars {
    entries: Vec<(String, String)>,
    capacity: usize,
}

impl Default for LocalVars {
    fn default() -> Self {
        Self::with_capacity(LOCAL_VARS_CAPACITY)
    }
}

impl LocalVars {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Overwrite an existing entry or append a new one.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), VarError> {
        if let Some((_, slot)) = self.entries.iter_mut().find(|(key, _)| key == name) {
            *slot = value.to_owned();
            return Ok(());
        }
        if self.entries.len() >= self.capacity {
            return Err(VarError::CapacityExceeded);
        }
        self.entries.push((name.to_owned(), value.to_owned()));
        Ok(())
    }

    /// Returns whether an entry was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|(key, _)| key == name) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, assignment: &Assignment) -> Result<(), VarError> {
        match &assignment.value {
            Some(value) => self.set(&assignment.name, value),
            None => {
                self.remove(&assignment.name);
                Ok(())
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve `name` for `$name` substitution.
///
/// The environment always wins over the local table.
pub fn resolve(env: &dyn Environment, locals: &LocalVars, name: &str) -> Option<String> {
    env.get(name).or_else(|| locals.get(name).map(str::to_owned))
}
