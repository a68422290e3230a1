#[allow(clippy::module_inception)]
pub mod error;
pub mod failure;

pub use error::{CliError, EngineError};
pub use failure::{BuildFailure, ErrorKind};
