#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;

use buildd_core::buildtool::{BuildInvocation, BuildTool};
use buildd_core::deps::{ProjectOutline, StructuralNode};
use buildd_core::error::BuildFailure;
use buildd_core::output::{BuildEventSink, OutboundEvent, ProgressEvent, ReplyRx, TaskResult};

/// What the scripted tool does once its output has been emitted.
#[derive(Clone)]
pub enum Ending {
    Succeed,
    WaitForCancel,
    Fail(fn() -> BuildFailure),
    Panic,
}

/// Build tool that replays canned output instead of starting a process.
pub struct ScriptedTool {
    pub ending: Ending,
    pub progress: Vec<String>,
    pub stdout: Vec<&'static str>,
    pub stderr: Vec<&'static str>,
    /// Stdout per task, used by dependency sub-builds.
    pub stdout_by_task: HashMap<String, String>,
    pub outline: ProjectOutline,
    pub model: Option<StructuralNode>,
    pub started: Arc<Notify>,
    pub invocations: Mutex<Vec<BuildInvocation>>,
}

impl ScriptedTool {
    pub fn new(ending: Ending) -> Self {
        Self {
            ending,
            progress: Vec::new(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            stdout_by_task: HashMap::new(),
            outline: ProjectOutline::default(),
            model: None,
            started: Arc::new(Notify::new()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> Vec<BuildInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn tasks_run(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .flat_map(|i| i.tasks.clone())
            .collect()
    }
}

#[async_trait]
impl BuildTool for ScriptedTool {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run_build(
        &self,
        invocation: BuildInvocation,
        sink: &dyn BuildEventSink,
    ) -> Result<(), BuildFailure> {
        self.invocations.lock().unwrap().push(invocation.clone());

        for p in &self.progress {
            sink.on_progress(ProgressEvent::new(p.clone())).await;
        }
        for chunk in self.stdout.iter().copied() {
            sink.on_standard_output(Bytes::from_static(chunk.as_bytes())).await;
        }
        for task in &invocation.tasks {
            if let Some(text) = self.stdout_by_task.get(task) {
                sink.on_standard_output(Bytes::from(text.clone())).await;
            }
        }
        for chunk in self.stderr.iter().copied() {
            sink.on_standard_error(Bytes::from_static(chunk.as_bytes())).await;
        }
        self.started.notify_one();

        match &self.ending {
            Ending::Succeed => Ok(()),
            Ending::WaitForCancel => {
                invocation.cancel.cancelled().await;
                Err(BuildFailure::Cancelled("Build cancelled".to_string()))
            }
            Ending::Fail(make) => Err(make()),
            Ending::Panic => panic!("scripted tool panic"),
        }
    }

    async fn project_outline(
        &self,
        invocation: BuildInvocation,
    ) -> Result<ProjectOutline, BuildFailure> {
        self.invocations.lock().unwrap().push(invocation);
        Ok(self.outline.clone())
    }

    async fn dependency_model(
        &self,
        _invocation: BuildInvocation,
    ) -> Result<StructuralNode, BuildFailure> {
        self.model
            .clone()
            .ok_or_else(|| BuildFailure::Unsupported("no model".to_string()))
    }
}

pub async fn collect(mut rx: ReplyRx) -> Vec<OutboundEvent> {
    let mut events = Vec::new();
    while let Some(ev) = rx.recv().await {
        events.push(ev);
    }
    events
}

pub fn result_of(events: &[OutboundEvent]) -> &TaskResult {
    match events.last() {
        Some(OutboundEvent::Result(r)) => r,
        other => panic!("stream did not end with a result: {other:?}"),
    }
}

pub fn assert_single_trailing_result(events: &[OutboundEvent]) {
    let results = events.iter().filter(|e| e.is_result()).count();
    assert_eq!(results, 1, "expected exactly one result in {events:?}");
    assert!(events.last().map(|e| e.is_result()).unwrap_or(false));
}
