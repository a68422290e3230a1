use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::buildtool::BuildInvocation;
use crate::cancel::{CancellationHandle, OperationKey};
use crate::config::DependencyStrategy;

/// Request to run one task of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTaskRequest {
    pub project_dir: String,
    pub task: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Written to the build tool's stdin, which is closed afterwards.
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub java_debug: bool,
    #[serde(default)]
    pub java_debug_port: Option<u16>,
    #[serde(default)]
    pub color_output: bool,
    #[serde(default)]
    pub jvm_args: Option<String>,
}

impl RunTaskRequest {
    pub fn new(project_dir: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            project_dir: project_dir.into(),
            task: task.into(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> OperationKey {
        OperationKey::for_task(&self.project_dir, &self.task)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.project_dir.trim().is_empty() {
            return Err("Project directory is not set".to_string());
        }
        if self.task.trim().is_empty() {
            return Err("Task is not set".to_string());
        }
        if self.java_debug && self.debug_port().is_none() {
            return Err("Java debug port is not set".to_string());
        }
        Ok(())
    }

    fn debug_port(&self) -> Option<u16> {
        self.java_debug_port.filter(|p| *p != 0)
    }

    pub(crate) fn invocation(&self, cancel: CancellationHandle) -> BuildInvocation {
        let mut invocation = BuildInvocation::new(&self.project_dir, cancel)
            .with_tasks([self.task.clone()]);
        invocation.args = self.args.clone();
        invocation.env = self.env.clone();
        invocation.stdin = self.input.clone();
        invocation.color_output = self.color_output;
        invocation.jvm_args = self.jvm_args.clone();
        match self.debug_port() {
            Some(port) if self.java_debug => invocation.with_java_debug(port),
            _ => invocation,
        }
    }
}

/// Request for the resolved dependency forest of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRequest {
    pub project_dir: String,
    /// Key the client will cancel with. Defaults to the project's
    /// `dependencies` operation key.
    #[serde(default)]
    pub cancellation_key: Option<String>,
    #[serde(default)]
    pub strategy: Option<DependencyStrategy>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub jvm_args: Option<String>,
}

impl DependencyRequest {
    pub fn new(project_dir: impl Into<String>) -> Self {
        Self {
            project_dir: project_dir.into(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> OperationKey {
        match self.cancellation_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => OperationKey::new(key),
            None => OperationKey::for_task(&self.project_dir, "dependencies"),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.project_dir.trim().is_empty() {
            return Err("Project directory is not set".to_string());
        }
        Ok(())
    }

    pub(crate) fn invocation(&self, cancel: CancellationHandle) -> BuildInvocation {
        let mut invocation = BuildInvocation::new(&self.project_dir, cancel);
        invocation.args = self.args.clone();
        invocation.env = self.env.clone();
        invocation.jvm_args = self.jvm_args.clone();
        invocation
    }
}
