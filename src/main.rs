use rsh::config::{Args, LOG_ENV};
use rsh::{Config, Interpreter};
use std::process::ExitCode;

/// Keep Ctrl+C from killing the interpreter; children inherit the disposition.
#[cfg(unix)]
fn ignore_interrupts() {
    use nix::sys::signal::{SigHandler, Signal, signal};
    // SAFETY: SIG_IGN installs no handler code, so nothing runs in signal context.
    if let Err(e) = unsafe { signal(Signal::SIGINT, SigHandler::SigIgn) } {
        log::warn!("could not ignore SIGINT: {e}");
    }
}

#[cfg(not(unix))]
fn ignore_interrupts() {}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV, "warn")).init();

    let config = Config::from(argh::from_env::<Args>());
    ignore_interrupts();

    let mut interpreter = Interpreter::new(&config);
    let result = match &config.batch_file {
        Some(path) => interpreter.run_batch(path),
        None => interpreter.repl(&config.prompt),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("fatal: {e:?}");
            println!("{e}");
            ExitCode::FAILURE
        }
    }
}
