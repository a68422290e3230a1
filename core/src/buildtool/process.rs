use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

use super::io_pump::pump;
use super::{ensure_not_cancelled, BuildInvocation, BuildTool};
use crate::config::BuildToolConfig;
use crate::deps::{parse_project_outline, ProjectOutline};
use crate::error::{BuildFailure, EngineError};
use crate::output::{BuildEventSink, ProgressEvent, StreamTag};
use crate::util::RingBytes;

lazy_static! {
    static ref UNSUPPORTED_ARGUMENT: Regex =
        Regex::new(r"(?i)unknown command-line option|unrecognized option|problem configuring task .* from command line").unwrap();
    static ref UNSUPPORTED_VERSION: Regex = Regex::new(
        r"(?i)unsupported (?:gradle|java|class file major) version|minimum supported gradle version|requires gradle \d"
    )
    .unwrap();
}

#[cfg(windows)]
const WRAPPER: &str = "gradlew.bat";
#[cfg(not(windows))]
const WRAPPER: &str = "gradlew";

/// Drives a Gradle-style command line as a child process.
pub struct ProcessBuildTool {
    config: BuildToolConfig,
}

impl ProcessBuildTool {
    pub fn new(config: BuildToolConfig) -> Self {
        Self { config }
    }

    /// Configured program, else the project's wrapper script, else `gradle`.
    pub fn resolve_program(&self, project_dir: &Path) -> PathBuf {
        if let Some(program) = self.config.program.as_deref().filter(|p| !p.is_empty()) {
            return PathBuf::from(program);
        }
        if self.config.prefer_wrapper {
            let wrapper = project_dir.join(WRAPPER);
            if wrapper.is_file() {
                return wrapper;
            }
        }
        PathBuf::from("gradle")
    }

    /// Command-line arguments for `invocation`, tasks first.
    pub fn command_args(&self, invocation: &BuildInvocation) -> Vec<String> {
        let mut args: Vec<String> = invocation.tasks.clone();
        args.extend(invocation.args.iter().cloned());
        if self.config.console_flag {
            let mode = if invocation.color_output { "rich" } else { "plain" };
            args.push(format!("--console={mode}"));
        }
        let jvm_args = invocation
            .jvm_args
            .as_deref()
            .or(self.config.jvm_args.as_deref())
            .filter(|a| !a.trim().is_empty());
        if let Some(jvm_args) = jvm_args {
            args.push(format!("-Dorg.gradle.jvmargs={jvm_args}"));
        }
        args
    }

    fn spawn(&self, invocation: &BuildInvocation) -> Result<Child, BuildFailure> {
        let program = self.resolve_program(&invocation.project_dir);
        let args = self.command_args(invocation);
        tracing::debug!(
            program = %program.display(),
            args = ?args,
            cwd = %invocation.project_dir.display(),
            "spawning build tool"
        );

        Command::new(&program)
            .args(&args)
            .current_dir(&invocation.project_dir)
            .envs(&self.config.env)
            .envs(&invocation.env)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => BuildFailure::Connection(format!(
                    "build tool '{}' not found: {e}",
                    program.display()
                )),
                _ => BuildFailure::Io(e),
            })
    }

    async fn drive(
        child: &mut Child,
        stdin: Option<String>,
        sink: &dyn BuildEventSink,
        tail: &RingBytes,
    ) -> Result<ExitStatus, BuildFailure> {
        let stdin_pipe = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| stream_failure(EngineError::Spawn("no stdout".into())))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| stream_failure(EngineError::Spawn("no stderr".into())))?;

        // The child may fill its stdout before reading stdin, so the
        // payload is fed alongside the pumps.
        let feed = async move {
            if let (Some(payload), Some(mut pipe)) = (stdin, stdin_pipe) {
                if let Err(e) = pipe.write_all(payload.as_bytes()).await {
                    tracing::warn!(error.kind = "stdin.write", error.message = %e);
                }
                // Dropping the pipe closes stdin.
            }
        };

        let ((), out, err) = tokio::join!(
            feed,
            pump(stdout, StreamTag::Stdout, sink, None),
            pump(stderr, StreamTag::Stderr, sink, Some(tail)),
        );
        let out_bytes = out.map_err(stream_failure)?;
        let err_bytes = err.map_err(stream_failure)?;
        tracing::trace!(stdout = out_bytes, stderr = err_bytes, "build tool streams closed");

        Ok(child.wait().await?)
    }
}

#[async_trait]
impl BuildTool for ProcessBuildTool {
    fn name(&self) -> &str {
        "process"
    }

    async fn run_build(
        &self,
        invocation: BuildInvocation,
        sink: &dyn BuildEventSink,
    ) -> Result<(), BuildFailure> {
        ensure_not_cancelled(&invocation.cancel)?;

        let mut child = self.spawn(&invocation)?;
        let tail = RingBytes::new(self.config.stderr_tail_bytes);
        let cancel = invocation.cancel.clone();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = Self::drive(&mut child, invocation.stdin.clone(), sink, &tail) => Some(res),
        };

        let Some(status) = outcome else {
            if let Err(e) = child.kill().await {
                tracing::warn!(error.kind = "process.kill", error.message = %e);
            }
            tracing::info!(key = %cancel.key(), "build tool process killed after cancellation");
            return Err(BuildFailure::Cancelled("Build cancelled".to_string()));
        };

        let status = status?;
        if status.success() {
            return Ok(());
        }
        Err(classify_exit(status.code(), &tail.tail_string()))
    }

    async fn project_outline(
        &self,
        invocation: BuildInvocation,
    ) -> Result<ProjectOutline, BuildFailure> {
        let collector = StdoutCollector::default();
        self.run_build(invocation.with_tasks(["projects"]), &collector)
            .await?;
        Ok(parse_project_outline(&collector.text()))
    }
}

fn stream_failure(err: EngineError) -> BuildFailure {
    match err {
        EngineError::StreamIo { source, .. } => BuildFailure::Io(source),
        other => BuildFailure::Other(other.into()),
    }
}

/// Maps a non-zero exit to a failure category using the stderr tail.
pub(crate) fn classify_exit(code: Option<i32>, stderr_tail: &str) -> BuildFailure {
    let message = failure_summary(code, stderr_tail);
    if UNSUPPORTED_ARGUMENT.is_match(stderr_tail) {
        BuildFailure::UnsupportedArgument(message)
    } else if UNSUPPORTED_VERSION.is_match(stderr_tail) {
        BuildFailure::UnsupportedVersion(message)
    } else {
        BuildFailure::BuildFailed(message)
    }
}

fn failure_summary(code: Option<i32>, stderr_tail: &str) -> String {
    let mut lines = stderr_tail.lines().map(str::trim);
    if lines.any(|l| l.ends_with("What went wrong:")) {
        let what: Vec<&str> = lines.take_while(|l| !l.is_empty()).collect();
        if !what.is_empty() {
            return what.join(" ");
        }
    }
    if let Some(last) = stderr_tail.lines().map(str::trim).rev().find(|l| !l.is_empty()) {
        return last.to_string();
    }
    match code {
        Some(code) => format!("build tool exited with code {code}"),
        None => "build tool terminated by signal".to_string(),
    }
}

#[derive(Default)]
struct StdoutCollector {
    buf: Mutex<Vec<u8>>,
}

impl StdoutCollector {
    fn text(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[async_trait]
impl BuildEventSink for StdoutCollector {
    async fn on_progress(&self, _event: ProgressEvent) {}

    async fn on_standard_output(&self, bytes: Bytes) {
        self.buf
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(&bytes);
    }

    async fn on_standard_error(&self, _bytes: Bytes) {}
}
