use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::cancel::OperationKey;
use crate::deps::DependencyTree;
use crate::error::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamTag {
    Stdout,
    Stderr,
}

impl StreamTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "STDOUT",
            Self::Stderr => "STDERR",
        }
    }
}

/// One message of an operation's reply stream.
///
/// Serialized adjacently tagged: `{"event": "output", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    Progress {
        message: String,
    },
    Output {
        stream: StreamTag,
        #[serde(with = "b64_bytes")]
        bytes: Bytes,
    },
    Result(TaskResult),
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Output { .. } => "output",
            Self::Result(_) => "result",
        }
    }

    pub fn is_result(&self) -> bool {
        matches!(self, Self::Result(_))
    }

    /// JSON of the event body without the outer tag.
    pub fn data_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct OutputData<'a> {
            stream: StreamTag,
            #[serde(with = "b64_bytes")]
            bytes: &'a Bytes,
        }

        match self {
            Self::Progress { message } => {
                serde_json::to_string(&serde_json::json!({ "message": message }))
            }
            Self::Output { stream, bytes } => serde_json::to_string(&OutputData {
                stream: *stream,
                bytes,
            }),
            Self::Result(result) => serde_json::to_string(result),
        }
    }
}

/// Terminal result of an operation. Exactly one ends every reply stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskResult {
    Success {
        message: String,
        task: String,
    },
    Dependencies {
        nodes: Vec<DependencyTree>,
    },
    Cancelled {
        message: String,
        key: OperationKey,
        project_dir: String,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl TaskResult {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            kind,
            message: message.into(),
        }
    }

    pub fn terminal_state(&self) -> TerminalState {
        match self {
            Self::Success { .. } | Self::Dependencies { .. } => TerminalState::Completed,
            Self::Cancelled { .. } => TerminalState::Cancelled,
            Self::Error { kind, .. } => TerminalState::Failed(*kind),
        }
    }
}

/// Where an operation's lifecycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    Completed,
    Cancelled,
    Failed(ErrorKind),
}

impl TerminalState {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Completed)
    }
}

mod b64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD
            .decode(s.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
