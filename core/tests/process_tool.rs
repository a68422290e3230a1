#![cfg(unix)]

mod common;

use std::path::Path;
use std::time::Duration;

use buildd_core::buildtool::{BuildInvocation, BuildTool, ProcessBuildTool};
use buildd_core::cancel::CancellationHandle;
use buildd_core::config::BuildToolConfig;
use buildd_core::error::BuildFailure;
use buildd_core::output::{reply_channel, OutboundEvent, OutputMultiplexer, StreamTag};

use common::collect;

fn sh_tool() -> ProcessBuildTool {
    ProcessBuildTool::new(BuildToolConfig {
        program: Some("sh".into()),
        ..BuildToolConfig::default()
    })
}

fn script(dir: &Path, body: &str) -> String {
    let path = dir.join("build.sh");
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

fn stream_text(events: &[OutboundEvent], tag: StreamTag) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            OutboundEvent::Output { stream, bytes } if *stream == tag => {
                Some(String::from_utf8_lossy(bytes).into_owned())
            }
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn streams_stdout_stderr_and_progress() {
    let dir = tempfile::tempdir().unwrap();
    let script = script(
        dir.path(),
        "echo '> Task :compileJava'\necho \"args: $*\"\necho 'careful' >&2\n",
    );
    let inv = BuildInvocation::new(dir.path(), CancellationHandle::detached("k"))
        .with_tasks([script.as_str(), "build"]);

    let (tx, rx) = reply_channel(64);
    let mux = OutputMultiplexer::new("k", tx);
    sh_tool().run_build(inv, &mux).await.unwrap();
    drop(mux);
    let events = collect(rx).await;

    assert!(events.contains(&OutboundEvent::Progress {
        message: "Task :compileJava".into()
    }));
    let stdout = stream_text(&events, StreamTag::Stdout);
    assert!(stdout.contains("args: build --console=plain"));
    assert_eq!(stream_text(&events, StreamTag::Stderr), "careful\n");
}

#[tokio::test]
async fn stdin_payload_is_written_and_closed() {
    let dir = tempfile::tempdir().unwrap();
    let script = script(dir.path(), "cat\n");
    let mut inv = BuildInvocation::new(dir.path(), CancellationHandle::detached("k"))
        .with_tasks([script]);
    inv.stdin = Some("from client\n".into());

    let (tx, rx) = reply_channel(64);
    let mux = OutputMultiplexer::new("k", tx);
    sh_tool().run_build(inv, &mux).await.unwrap();
    drop(mux);

    assert_eq!(
        stream_text(&collect(rx).await, StreamTag::Stdout),
        "from client\n"
    );
}

#[tokio::test]
async fn large_stdin_does_not_block_a_chatty_build() {
    let dir = tempfile::tempdir().unwrap();
    // Fills the stdout pipe several times over before touching stdin.
    let script = script(dir.path(), "head -c 262144 /dev/zero\ncat >/dev/null\n");
    let mut inv = BuildInvocation::new(dir.path(), CancellationHandle::detached("k"))
        .with_tasks([script]);
    inv.stdin = Some("y".repeat(256 * 1024));

    let (tx, rx) = reply_channel(64);
    let drained = tokio::spawn(collect(rx));
    let run = async {
        let mux = OutputMultiplexer::new("k", tx);
        sh_tool().run_build(inv, &mux).await
    };

    tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("build stalled on stdin")
        .unwrap();

    let events = drained.await.unwrap();
    let stdout_len: usize = events
        .iter()
        .filter_map(|e| match e {
            OutboundEvent::Output {
                stream: StreamTag::Stdout,
                bytes,
            } => Some(bytes.len()),
            _ => None,
        })
        .sum();
    assert_eq!(stdout_len, 262144);
}

#[tokio::test]
async fn non_zero_exit_is_a_build_failure() {
    let dir = tempfile::tempdir().unwrap();
    let script = script(
        dir.path(),
        "echo '* What went wrong:' >&2\necho 'Task not found' >&2\nexit 1\n",
    );
    let inv = BuildInvocation::new(dir.path(), CancellationHandle::detached("k"))
        .with_tasks([script]);

    let (tx, _rx) = reply_channel(64);
    let mux = OutputMultiplexer::new("k", tx);
    match sh_tool().run_build(inv, &mux).await {
        Err(BuildFailure::BuildFailed(msg)) => assert_eq!(msg, "Task not found"),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn cancellation_kills_the_process() {
    let dir = tempfile::tempdir().unwrap();
    let script = script(dir.path(), "echo '> Task :run'\nexec sleep 30\n");
    let handle = CancellationHandle::detached("k");
    let inv = BuildInvocation::new(dir.path(), handle.clone()).with_tasks([script]);

    let (tx, mut rx) = reply_channel(64);
    let run = tokio::spawn(async move {
        let mux = OutputMultiplexer::new("k", tx);
        sh_tool().run_build(inv, &mux).await
    });

    // Wait until the child is demonstrably running.
    while let Some(ev) = rx.recv().await {
        if matches!(ev, OutboundEvent::Progress { .. }) {
            break;
        }
    }
    handle.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("process was not killed")
        .unwrap();
    match outcome {
        Err(BuildFailure::Cancelled(msg)) => assert_eq!(msg, "Build cancelled"),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn missing_program_is_a_connection_failure() {
    let dir = tempfile::tempdir().unwrap();
    let tool = ProcessBuildTool::new(BuildToolConfig {
        program: Some("/nonexistent/buildd-gradle".into()),
        ..BuildToolConfig::default()
    });
    let inv = BuildInvocation::new(dir.path(), CancellationHandle::detached("k"))
        .with_tasks(["build"]);
    let (tx, _rx) = reply_channel(4);
    let mux = OutputMultiplexer::new("k", tx);
    assert!(matches!(
        tool.run_build(inv, &mux).await,
        Err(BuildFailure::Connection(_))
    ));
}

#[tokio::test]
async fn project_outline_runs_the_projects_report() {
    let dir = tempfile::tempdir().unwrap();
    // `sh projects` executes this file from the project directory.
    std::fs::write(
        dir.path().join("projects"),
        "cat <<'OUT'\nRoot project 'demo'\n+--- Project ':app'\n\\--- Project ':lib'\nOUT\n",
    )
    .unwrap();
    let tool = ProcessBuildTool::new(BuildToolConfig {
        program: Some("sh".into()),
        console_flag: false,
        ..BuildToolConfig::default()
    });

    let outline = tool
        .project_outline(BuildInvocation::new(dir.path(), CancellationHandle::detached("k")))
        .await
        .unwrap();
    assert_eq!(outline.name, "demo");
    assert_eq!(outline.children, vec!["app", "lib"]);
}
