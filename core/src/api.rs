//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `buildd_core::api` instead of reaching into internal modules.

pub use crate::buildtool::{BuildInvocation, BuildTool, ProcessBuildTool};
pub use crate::cancel::{CancellationHandle, CancellationRegistry, OperationKey, RegistryLease};
pub use crate::config::{
    load_default, load_from_path, AppConfig, BuildToolConfig, DependencyStrategy, EngineConfig,
    LoggingConfig, ServerConfig,
};
pub use crate::context::AppContext;
pub use crate::deps::{DependencyTree, NodeType, Normalizer, ProjectOutline, StructuralNode};
pub use crate::engine::{
    DependencyQueryCoordinator, DependencyRequest, RunTaskRequest, TaskExecutionCoordinator,
};
pub use crate::error::{BuildFailure, CliError, EngineError, ErrorKind};
pub use crate::output::{
    reply_channel, BuildEventSink, OutboundEvent, OutputMultiplexer, ProgressEvent, ReplyRx,
    ReplyTx, StreamTag, TaskResult, TerminalState,
};
