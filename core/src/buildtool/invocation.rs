use std::collections::HashMap;
use std::path::PathBuf;

use crate::cancel::CancellationHandle;

/// Environment variable the JVM reads agent options from.
pub const JAVA_TOOL_OPTIONS: &str = "JAVA_TOOL_OPTIONS";

/// Parameters of one build-tool operation.
#[derive(Debug, Clone)]
pub struct BuildInvocation {
    pub project_dir: PathBuf,
    pub tasks: Vec<String>,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub stdin: Option<String>,
    pub cancel: CancellationHandle,
    pub color_output: bool,
    pub jvm_args: Option<String>,
    pub java_debug_port: Option<u16>,
}

impl BuildInvocation {
    pub fn new(project_dir: impl Into<PathBuf>, cancel: CancellationHandle) -> Self {
        Self {
            project_dir: project_dir.into(),
            tasks: Vec::new(),
            args: Vec::new(),
            env: HashMap::new(),
            stdin: None,
            cancel,
            color_output: false,
            jvm_args: None,
            java_debug_port: None,
        }
    }

    pub fn with_tasks<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tasks = tasks.into_iter().map(Into::into).collect();
        self
    }

    /// Suspends the JVM until a debugger attaches on `port`.
    pub fn with_java_debug(mut self, port: u16) -> Self {
        self.env
            .insert(JAVA_TOOL_OPTIONS.to_string(), jdwp_agent_options(port));
        self.java_debug_port = Some(port);
        self
    }
}

pub fn jdwp_agent_options(port: u16) -> String {
    format!("-agentlib:jdwp=transport=dt_socket,server=y,suspend=y,address=localhost:{port}")
}
