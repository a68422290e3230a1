use std::sync::Arc;

use crate::buildtool::BuildTool;
use crate::cancel::{CancellationRegistry, OperationKey};
use crate::config::EngineConfig;
use crate::error::ErrorKind;
use crate::output::{OutputMultiplexer, ReplyTx, TaskResult, TerminalState};

use super::outcome::{failure_result, guarded};
use super::types::RunTaskRequest;

pub const SUCCESS_MESSAGE: &str = "Successfully run task";

/// Runs single tasks: Idle -> Running -> {Completed, Cancelled, Failed} -> Cleared.
#[derive(Clone)]
pub struct TaskExecutionCoordinator {
    registry: CancellationRegistry,
    tool: Arc<dyn BuildTool>,
    config: EngineConfig,
}

impl TaskExecutionCoordinator {
    pub fn new(registry: CancellationRegistry, tool: Arc<dyn BuildTool>, config: EngineConfig) -> Self {
        Self {
            registry,
            tool,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs `request` to completion, streaming into `reply`. Exactly one
    /// result is written to `reply` unless the receiver is gone.
    pub async fn run(&self, request: RunTaskRequest, reply: ReplyTx) -> TerminalState {
        let key = request.key();
        let mux = OutputMultiplexer::new(key.as_str(), reply);

        if let Err(message) = request.validate() {
            tracing::warn!(key = %key, error.kind = %ErrorKind::InvalidRequest, error.message = %message, "request rejected");
            let result = TaskResult::error(ErrorKind::InvalidRequest, message);
            let state = result.terminal_state();
            mux.finish(result).await;
            return state;
        }

        let lease = self.registry.lease(&key);
        let invocation = request.invocation(lease.handle().clone());
        tracing::info!(key = %key, task = %request.task, tool = self.tool.name(), "task started");

        let result = match guarded(self.tool.run_build(invocation, &mux)).await {
            Ok(()) => {
                tracing::info!(key = %key, task = %request.task, "task completed");
                TaskResult::Success {
                    message: SUCCESS_MESSAGE.to_string(),
                    task: request.task.clone(),
                }
            }
            Err(failure) => failure_result(failure, &key, &request.project_dir),
        };

        // Clear before the result is observable so a follow-up request
        // with the same key starts a fresh lifecycle.
        drop(lease);
        let state = result.terminal_state();
        mux.finish(result).await;
        let events = mux.forwarded().await;
        tracing::debug!(key = %key, events, "reply stream closed");
        state
    }

    /// Cancels the run of `task` in `project_dir`. Returns whether it was in flight.
    pub fn cancel(&self, project_dir: &str, task: &str) -> bool {
        self.cancel_key(&OperationKey::for_task(project_dir, task))
    }

    pub fn cancel_key(&self, key: &OperationKey) -> bool {
        self.registry.cancel(key)
    }
}
