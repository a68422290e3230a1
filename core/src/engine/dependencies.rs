use std::path::Path;
use std::sync::Arc;

use crate::buildtool::{ensure_not_cancelled, BuildInvocation, BuildTool};
use crate::cancel::{CancellationHandle, CancellationRegistry};
use crate::config::{DependencyStrategy, EngineConfig};
use crate::deps::{parse_dependency_report, DependencyTree, Normalizer};
use crate::error::{BuildFailure, ErrorKind};
use crate::output::{DependencyCapture, OutputMultiplexer, ReplyTx, TaskResult, TerminalState};

use super::outcome::{failure_result, guarded};
use super::types::DependencyRequest;

/// Answers dependency queries with a normalized forest, one tree per module.
#[derive(Clone)]
pub struct DependencyQueryCoordinator {
    registry: CancellationRegistry,
    tool: Arc<dyn BuildTool>,
    config: EngineConfig,
    normalizer: Normalizer,
}

impl DependencyQueryCoordinator {
    pub fn new(registry: CancellationRegistry, tool: Arc<dyn BuildTool>, config: EngineConfig) -> Self {
        let normalizer = Normalizer::new(config.elision_markers.clone());
        Self {
            registry,
            tool,
            config,
            normalizer,
        }
    }

    pub async fn query(&self, request: DependencyRequest, reply: ReplyTx) -> TerminalState {
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
        let strategy = request.strategy.unwrap_or(self.config.dependency_strategy);
        tracing::info!(key = %key, strategy = ?strategy, "dependency query started");

        let collected = guarded(self.collect(&request, strategy, lease.handle(), &mux)).await;
        let result = match collected {
            Ok(nodes) => {
                tracing::info!(
                    key = %key,
                    modules = nodes.len(),
                    nodes = nodes.iter().map(DependencyTree::node_count).sum::<usize>(),
                    "dependency query completed"
                );
                TaskResult::Dependencies { nodes }
            }
            Err(failure) => failure_result(failure, &key, &request.project_dir),
        };

        drop(lease);
        let state = result.terminal_state();
        mux.finish(result).await;
        let events = mux.forwarded().await;
        tracing::debug!(key = %key, events, "reply stream closed");
        state
    }

    async fn collect(
        &self,
        request: &DependencyRequest,
        strategy: DependencyStrategy,
        cancel: &CancellationHandle,
        mux: &OutputMultiplexer,
    ) -> Result<Vec<DependencyTree>, BuildFailure> {
        match strategy {
            DependencyStrategy::Model => self.from_model(request, cancel).await,
            DependencyStrategy::Text => self.from_text(request, cancel, mux).await,
            DependencyStrategy::Auto => match self.from_model(request, cancel).await {
                Err(BuildFailure::Unsupported(reason)) => {
                    tracing::debug!(%reason, "model query unsupported, parsing console reports");
                    self.from_text(request, cancel, mux).await
                }
                other => other,
            },
        }
    }

    async fn from_model(
        &self,
        request: &DependencyRequest,
        cancel: &CancellationHandle,
    ) -> Result<Vec<DependencyTree>, BuildFailure> {
        let root = self
            .tool
            .dependency_model(request.invocation(cancel.clone()))
            .await?;
        Ok(self.normalizer.normalize_structural(&root))
    }

    async fn from_text(
        &self,
        request: &DependencyRequest,
        cancel: &CancellationHandle,
        mux: &OutputMultiplexer,
    ) -> Result<Vec<DependencyTree>, BuildFailure> {
        let outline = self
            .tool
            .project_outline(request.invocation(cancel.clone()))
            .await?;

        let root_name = if outline.name.is_empty() {
            fallback_project_name(&request.project_dir)
        } else {
            outline.name.clone()
        };
        let mut sub_builds = vec![(root_name, "dependencies".to_string())];
        sub_builds.extend(
            outline
                .children
                .iter()
                .map(|child| (child.clone(), format!(":{child}:dependencies"))),
        );

        let capture = DependencyCapture::new(mux, self.config.forward_dependency_stdout);
        let mut nodes = Vec::with_capacity(sub_builds.len());
        for (name, task) in sub_builds {
            ensure_not_cancelled(cancel)?;
            capture.reset();
            let invocation: BuildInvocation = request.invocation(cancel.clone()).with_tasks([task]);
            self.tool.run_build(invocation, &capture).await?;
            tracing::debug!(project = %name, bytes = capture.captured_len(), "dependency report captured");

            let report = parse_dependency_report(&capture.take_text());
            nodes.push(self.normalizer.normalize_subproject(&name, report.first_project()));
        }
        Ok(nodes)
    }
}

fn fallback_project_name(project_dir: &str) -> String {
    Path::new(project_dir)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_dir.to_string())
}
