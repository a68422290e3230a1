use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error kinds reported to clients in an `Error` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum ErrorKind {
    InvalidRequest = 3,
    UnsupportedArgument = 10,
    UnsupportedVersion = 11,
    BuildFailed = 20,
    Connection = 30,
    Io = 40,
    UnsupportedOperation = 50,
    Internal = 99,
}

impl ErrorKind {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnsupportedArgument => "unsupported_argument",
            Self::UnsupportedVersion => "unsupported_version",
            Self::BuildFailed => "build_failed",
            Self::Connection => "connection",
            Self::Io => "io",
            Self::UnsupportedOperation => "unsupported_operation",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of an external build-tool operation other than success.
///
/// `Cancelled` is not an error for the client; the coordinators map it to a
/// dedicated `Cancelled` result. Everything else maps to an `Error` result via
/// [`BuildFailure::kind`].
#[derive(Error, Debug)]
pub enum BuildFailure {
    #[error("{0}")]
    Cancelled(String),

    #[error("unsupported build argument: {0}")]
    UnsupportedArgument(String),

    #[error("unsupported build tool version: {0}")]
    UnsupportedVersion(String),

    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("could not connect to build tool: {0}")]
    Connection(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation not supported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildFailure {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Cancelled(_) => None,
            Self::UnsupportedArgument(_) => Some(ErrorKind::UnsupportedArgument),
            Self::UnsupportedVersion(_) => Some(ErrorKind::UnsupportedVersion),
            Self::BuildFailed(_) => Some(ErrorKind::BuildFailed),
            Self::Connection(_) => Some(ErrorKind::Connection),
            Self::Io(_) => Some(ErrorKind::Io),
            Self::Unsupported(_) => Some(ErrorKind::UnsupportedOperation),
            Self::Other(_) => Some(ErrorKind::Internal),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
