use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub build_tool: BuildToolConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "buildd_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8787
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Which raw input the dependency query normalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStrategy {
    /// Structural model first, console text when the tool cannot answer.
    #[default]
    Auto,
    Model,
    Text,
}

impl std::str::FromStr for DependencyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "model" => Ok(Self::Model),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown dependency strategy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bound of the per-operation reply channel.
    #[serde(default = "default_reply_channel_capacity")]
    pub reply_channel_capacity: usize,

    #[serde(default)]
    pub dependency_strategy: DependencyStrategy,

    /// Also stream stdout of dependency sub-builds to the client.
    #[serde(default)]
    pub forward_dependency_stdout: bool,

    #[serde(default = "default_elision_markers")]
    pub elision_markers: Vec<String>,
}

fn default_reply_channel_capacity() -> usize {
    256
}

pub fn default_elision_markers() -> Vec<String> {
    vec!["(*)".to_string(), "(n)".to_string()]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reply_channel_capacity: default_reply_channel_capacity(),
            dependency_strategy: DependencyStrategy::default(),
            forward_dependency_stdout: false,
            elision_markers: default_elision_markers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildToolConfig {
    /// Explicit program to run. When unset the project wrapper or `gradle` is used.
    #[serde(default)]
    pub program: Option<String>,

    #[serde(default = "default_prefer_wrapper")]
    pub prefer_wrapper: bool,

    /// Append `--console=plain|rich` to every invocation.
    #[serde(default = "default_console_flag")]
    pub console_flag: bool,

    #[serde(default)]
    pub jvm_args: Option<String>,

    /// Extra environment for every build-tool process.
    #[serde(default)]
    pub env: HashMap<String, String>,

    #[serde(default = "default_stderr_tail_bytes")]
    pub stderr_tail_bytes: usize,
}

fn default_prefer_wrapper() -> bool {
    true
}

fn default_console_flag() -> bool {
    true
}

fn default_stderr_tail_bytes() -> usize {
    8 * 1024
}

impl Default for BuildToolConfig {
    fn default() -> Self {
        Self {
            program: None,
            prefer_wrapper: default_prefer_wrapper(),
            console_flag: default_console_flag(),
            jvm_args: None,
            env: HashMap::new(),
            stderr_tail_bytes: default_stderr_tail_bytes(),
        }
    }
}
