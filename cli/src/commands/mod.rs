pub mod cli;
pub mod deps;
pub mod run;

use std::io::Write;

use buildd_core::api::{
    CancellationRegistry, CliError, ErrorKind, OperationKey, OutboundEvent, ReplyRx, StreamTag,
    TaskResult, TerminalState,
};
use tokio::signal;

/// Drains `rx` until the terminal result and returns it. The first Ctrl+C
/// cancels `key`; the operation still reports its own result.
pub(crate) async fn drain_events<F>(
    rx: &mut ReplyRx,
    registry: &CancellationRegistry,
    key: &OperationKey,
    mut on_event: F,
) -> Result<Option<TaskResult>, CliError>
where
    F: FnMut(&OutboundEvent) -> std::io::Result<()>,
{
    let mut interrupted = false;
    loop {
        tokio::select! {
            ev = rx.recv() => {
                let Some(ev) = ev else {
                    return Ok(None);
                };
                match ev {
                    OutboundEvent::Result(result) => return Ok(Some(result)),
                    other => on_event(&other)?,
                }
            }
            _ = signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                tracing::info!(key = %key, "interrupted, cancelling");
                registry.cancel(key);
            }
        }
    }
}

/// Writes an output chunk to the matching local stream. Progress goes to
/// stderr so stdout carries only what the build printed.
pub(crate) fn write_event(ev: &OutboundEvent, stdout_to_stderr: bool) -> std::io::Result<()> {
    match ev {
        OutboundEvent::Progress { message } => {
            let mut err = std::io::stderr().lock();
            writeln!(err, "> {message}")
        }
        OutboundEvent::Output { stream, bytes } => match stream {
            StreamTag::Stdout if !stdout_to_stderr => {
                let mut out = std::io::stdout().lock();
                out.write_all(bytes)?;
                out.flush()
            }
            _ => {
                let mut err = std::io::stderr().lock();
                err.write_all(bytes)?;
                err.flush()
            }
        },
        OutboundEvent::Result(_) => Ok(()),
    }
}

/// Prints a non-success result to stderr.
pub(crate) fn report_result(result: &TaskResult) {
    match result {
        TaskResult::Cancelled { message, key, .. } => eprintln!("{message} ({key})"),
        TaskResult::Error { kind, message } => eprintln!("error [{kind}]: {message}"),
        TaskResult::Success { .. } | TaskResult::Dependencies { .. } => {}
    }
}

/// Absolute, symlink-free form of a `--project-dir` argument.
pub(crate) fn resolve_project_dir(dir: &str) -> Result<String, CliError> {
    let path = std::fs::canonicalize(dir)
        .map_err(|e| CliError::Command(format!("invalid project directory {dir}: {e}")))?;
    Ok(path.to_string_lossy().into_owned())
}

/// Process exit code for the terminal state of a local operation.
pub fn exit_code_for_state(state: TerminalState) -> i32 {
    match state {
        TerminalState::Completed => 0,
        TerminalState::Cancelled => 130,
        TerminalState::Failed(kind) => match kind {
            ErrorKind::BuildFailed => 1,
            ErrorKind::InvalidRequest
            | ErrorKind::UnsupportedArgument
            | ErrorKind::UnsupportedOperation => 2,
            ErrorKind::UnsupportedVersion => 3,
            ErrorKind::Connection | ErrorKind::Io => 20,
            ErrorKind::Internal => 50,
        },
    }
}
