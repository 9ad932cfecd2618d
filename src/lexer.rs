//! Splitting of a command line into an argument vector.
//!
//! The grammar is deliberately flat: arguments are separated by runs of
//! whitespace, a leading `$` marks variable expansion and a standalone `|`
//! separates pipeline stages. There is no quoting, escaping or globbing.

/// Characters that separate arguments: space, tab, carriage return, newline and bell.
pub const DELIMITERS: [char; 5] = [' ', '\t', '\r', '\n', '\x07'];

/// Standalone token separating pipeline stages.
pub const PIPE: &str = "|";

/// Split `line` into arguments, expanding `$name` tokens through `resolve`.
///
/// A `$name` token whose variable is unset or empty contributes no argument
/// at all, it does not become an empty string. A lone `$` resolves the empty
/// name, which is never set, so it is dropped too. Every other token is
/// emitted unchanged.
///
/// # Returns
/// The argument vector, possibly empty.
pub fn split_into_args<F>(line: &str, mut resolve: F) -> Vec<String>
where
    F: FnMut(&str) -> Option<String>,
{
    line.split(DELIMITERS)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.strip_prefix('$') {
            Some(name) => resolve(name).filter(|value| !value.is_empty()),
            None => Some(token.to_owned()),
        })
        .collect()
}

/// Number of standalone `|` tokens in `args`.
pub fn count_pipes(args: &[String]) -> usize {
    args.iter().filter(|arg| *arg == PIPE).count()
}
