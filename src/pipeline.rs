//! Running `cmd1 | cmd2 | ... | cmdN` as N concurrently running processes.

use crate::error::{Result, ShellError};
use crate::lexer::PIPE;
use crate::process::{ProcessBackend, SpawnError};
use std::io::Write;

/// A `|` with nothing on one of its sides.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rsh: syntax error near unexpected token `|'")]
pub struct EmptyStage;

/// Partition `args` into stages at every standalone `|` token.
///
/// A leading or trailing `|`, or two adjacent ones, would produce an empty
/// stage and is rejected.
pub fn split_stages(args: &[String]) -> std::result::Result<Vec<&[String]>, EmptyStage> {
    args.split(|arg| arg == PIPE)
        .map(|stage| if stage.is_empty() { Err(EmptyStage) } else { Ok(stage) })
        .collect()
}

/// Spawn one child per stage, connected by `stages.len() - 1` pipes, and reap them all.
///
/// All pipes are allocated before the first child starts, so every stage is
/// wired to its neighbours before any of them runs. Stage `i` reads from pipe
/// `i - 1` and writes to pipe `i`; the first stage keeps the interpreter's
/// stdin and the last one its stdout. Each pipe end is moved into the spawn
/// that uses it, so the parent holds no descriptor by the time it waits and
/// the last reader sees end-of-stream once upstream writers are done.
///
/// A stage that cannot be executed is reported on `out`; its neighbours see
/// the closed pipe ends and the rest of the pipeline still runs. No combined
/// status is computed.
///
/// # Errors
/// Failing to create a pipe or a process is fatal. Children already started
/// are reaped before the error is returned.
pub fn run_pipeline<B: ProcessBackend>(
    backend: &mut B,
    stages: &[&[String]],
    out: &mut dyn Write,
) -> Result<()> {
    let pipe_count = stages.len().saturating_sub(1);

    // readers[i] / writers[i] are stage i's stdin / stdout
    let mut readers = Vec::with_capacity(stages.len());
    let mut writers = Vec::with_capacity(stages.len());
    readers.push(None);
    for _ in 0..pipe_count {
        let (reader, writer) = backend.pipe().map_err(ShellError::Pipe)?;
        readers.push(Some(reader));
        writers.push(Some(writer));
    }
    writers.push(None);
    log::debug!("pipeline: {} stages, {pipe_count} pipes", stages.len());

    let mut children = Vec::with_capacity(stages.len());
    let mut fatal = None;
    for (i, stage) in stages.iter().enumerate() {
        let stdin = readers[i].take();
        let stdout = writers[i].take();
        match backend.spawn(stage, stdin, stdout) {
            Ok(child) => children.push(child),
            Err(SpawnError::Fatal(_, e)) => {
                fatal = Some(ShellError::Spawn(e));
                break;
            }
            Err(e) => {
                log::warn!("pipeline stage {i}: {e}");
                if let Err(e) = writeln!(out, "rsh: {e}") {
                    fatal = Some(ShellError::Io(e));
                    break;
                }
            }
        }
    }

    // only non-empty after a fatal error
    drop(readers);
    drop(writers);

    let mut wait_error = None;
    for child in children {
        if let Err(e) = backend.wait(child) {
            wait_error.get_or_insert(ShellError::Wait(e));
        }
    }

    match fatal.or(wait_error) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBackend, args};

    fn stages(args: &[String]) -> Vec<&[String]> {
        split_stages(args).expect("valid pipeline")
    }

    #[test]
    fn split_on_standalone_pipes() {
        let input = args("ls -l | grep rs | wc -l");
        let stages = stages(&input);
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0], args("ls -l").as_slice());
        assert_eq!(stages[1], args("grep rs").as_slice());
        assert_eq!(stages[2], args("wc -l").as_slice());
    }

    #[test]
    fn empty_stages_are_rejected() {
        for line in ["| ls", "ls |", "ls | | wc", "|"] {
            assert_eq!(split_stages(&args(line)), Err(EmptyStage), "{line}");
        }
    }

    #[test]
    fn three_stages_use_two_pipes_and_close_all_ends() {
        let mut backend = FakeBackend::default();
        let input = args("cmd1 | cmd2 a | cmd3");
        let mut out = Vec::new();

        run_pipeline(&mut backend, &stages(&input), &mut out).unwrap();

        let ledger = backend.ledger();
        assert_eq!(ledger.pipes_created, 2);
        assert_eq!(ledger.fds_created(), 4);
        assert!(ledger.open_fds.is_empty(), "leaked {:?}", ledger.open_fds);
        assert_eq!(ledger.spawned.len(), 3);
        assert_eq!(ledger.reaped, 3);
        assert!(out.is_empty());

        let wiring: Vec<_> = ledger
            .spawned
            .iter()
            .map(|s| (s.argv.join(" "), s.stdin, s.stdout))
            .collect();
        assert_eq!(
            wiring,
            vec![
                ("cmd1".to_string(), None, Some(0)),
                ("cmd2 a".to_string(), Some(0), Some(1)),
                ("cmd3".to_string(), Some(1), None),
            ]
        );
    }

    #[test]
    fn all_pipes_exist_before_first_spawn() {
        let mut backend = FakeBackend::default();
        let input = args("a | b | c | d");

        run_pipeline(&mut backend, &stages(&input), &mut Vec::new()).unwrap();

        let ledger = backend.ledger();
        assert_eq!(ledger.spawned[0].pipes_at_spawn, 3);
    }

    #[test]
    fn missing_stage_is_reported_and_others_reaped() {
        let mut backend = FakeBackend::default().missing("nope");
        let input = args("a | nope | c");
        let mut out = Vec::new();

        run_pipeline(&mut backend, &stages(&input), &mut out).unwrap();

        let ledger = backend.ledger();
        assert_eq!(ledger.spawned.len(), 2);
        assert_eq!(ledger.reaped, 2);
        assert!(ledger.open_fds.is_empty());
        assert_eq!(String::from_utf8(out).unwrap(), "rsh: nope: command not found\n");
    }

    #[test]
    fn fatal_spawn_reaps_started_children() {
        let mut backend = FakeBackend::default().unspawnable("b");
        let input = args("a | b | c");

        let err = run_pipeline(&mut backend, &stages(&input), &mut Vec::new()).unwrap_err();

        assert!(matches!(err, ShellError::Spawn(_)));
        let ledger = backend.ledger();
        assert_eq!(ledger.spawned.len(), 1);
        assert_eq!(ledger.reaped, 1);
        assert!(ledger.open_fds.is_empty());
    }

    #[test]
    fn pipe_failure_is_fatal_and_spawns_nothing() {
        let mut backend = FakeBackend::default().pipe_limit(1);
        let input = args("a | b | c");

        let err = run_pipeline(&mut backend, &stages(&input), &mut Vec::new()).unwrap_err();

        assert!(matches!(err, ShellError::Pipe(_)));
        let ledger = backend.ledger();
        assert!(ledger.spawned.is_empty());
        assert!(ledger.open_fds.is_empty());
    }
}
