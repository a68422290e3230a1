//! The external build tool, seen as an opaque operation that accepts
//! parameters and reports through a [`BuildEventSink`].

mod invocation;
mod io_pump;
mod process;

use async_trait::async_trait;

use crate::cancel::CancellationHandle;
use crate::deps::{ProjectOutline, StructuralNode};
use crate::error::BuildFailure;
use crate::output::BuildEventSink;

pub use invocation::{jdwp_agent_options, BuildInvocation, JAVA_TOOL_OPTIONS};
pub use io_pump::progress_from_line;
pub use process::ProcessBuildTool;

#[async_trait]
pub trait BuildTool: Send + Sync {
    fn name(&self) -> &str;

    /// Runs the invocation to a terminal state. Cancellation is reported as
    /// [`BuildFailure::Cancelled`].
    async fn run_build(
        &self,
        invocation: BuildInvocation,
        sink: &dyn BuildEventSink,
    ) -> Result<(), BuildFailure>;

    /// Root project name and its direct child projects.
    async fn project_outline(
        &self,
        invocation: BuildInvocation,
    ) -> Result<ProjectOutline, BuildFailure>;

    /// Resolved dependency graph of the whole build, when the tool can
    /// answer a model query.
    async fn dependency_model(
        &self,
        invocation: BuildInvocation,
    ) -> Result<StructuralNode, BuildFailure> {
        let _ = invocation;
        Err(BuildFailure::Unsupported(format!(
            "{} does not provide a dependency model",
            self.name()
        )))
    }
}

/// Shorthand used by tools and tests to check the latch before doing work.
pub fn ensure_not_cancelled(cancel: &CancellationHandle) -> Result<(), BuildFailure> {
    if cancel.is_cancelled() {
        return Err(BuildFailure::Cancelled("Build cancelled".to_string()));
    }
    Ok(())
}
