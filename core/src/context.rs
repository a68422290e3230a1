use std::sync::Arc;

use crate::buildtool::{BuildTool, ProcessBuildTool};
use crate::cancel::CancellationRegistry;
use crate::config::AppConfig;
use crate::engine::{DependencyQueryCoordinator, TaskExecutionCoordinator};
use crate::output::{reply_channel, ReplyRx, ReplyTx};

/// Process-lifetime state shared by every operation: configuration, the
/// cancellation registry and the build tool.
#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    registry: CancellationRegistry,
    tool: Arc<dyn BuildTool>,
}

impl AppContext {
    pub fn new(cfg: AppConfig, tool: Arc<dyn BuildTool>) -> Self {
        Self {
            cfg,
            registry: CancellationRegistry::new(),
            tool,
        }
    }

    /// Context backed by the command-line build tool from `cfg.build_tool`.
    pub fn with_process_tool(cfg: AppConfig) -> Self {
        let tool = Arc::new(ProcessBuildTool::new(cfg.build_tool.clone()));
        Self::new(cfg, tool)
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn registry(&self) -> &CancellationRegistry {
        &self.registry
    }

    pub fn tool(&self) -> Arc<dyn BuildTool> {
        self.tool.clone()
    }

    pub fn tasks(&self) -> TaskExecutionCoordinator {
        TaskExecutionCoordinator::new(
            self.registry.clone(),
            self.tool.clone(),
            self.cfg.engine.clone(),
        )
    }

    pub fn dependencies(&self) -> DependencyQueryCoordinator {
        DependencyQueryCoordinator::new(
            self.registry.clone(),
            self.tool.clone(),
            self.cfg.engine.clone(),
        )
    }

    pub fn reply_channel(&self) -> (ReplyTx, ReplyRx) {
        reply_channel(self.cfg.engine.reply_channel_capacity)
    }
}
