use async_trait::async_trait;
use bytes::Bytes;

/// Progress notification from the build tool, e.g. a task starting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub display_name: String,
}

impl ProgressEvent {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}

/// Receiver of the three callback streams a build-tool operation fires.
///
/// Every method takes `&self` and may be called concurrently from
/// independent producers.
#[async_trait]
pub trait BuildEventSink: Send + Sync {
    async fn on_progress(&self, event: ProgressEvent);

    async fn on_standard_output(&self, bytes: Bytes);

    async fn on_standard_error(&self, bytes: Bytes);
}
