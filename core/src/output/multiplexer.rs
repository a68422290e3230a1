use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};

use super::event::{OutboundEvent, StreamTag, TaskResult};
use super::sink::{BuildEventSink, ProgressEvent};

pub type ReplyTx = mpsc::Sender<OutboundEvent>;
pub type ReplyRx = mpsc::Receiver<OutboundEvent>;

/// Bounded reply channel for one operation.
pub fn reply_channel(capacity: usize) -> (ReplyTx, ReplyRx) {
    mpsc::channel(capacity.max(1))
}

struct ReplyState {
    tx: ReplyTx,
    finished: bool,
    receiver_gone: bool,
    forwarded: u64,
}

/// Serializes progress, stdout and stderr callbacks into one ordered reply
/// stream.
///
/// The lock is held across the channel send, so concurrent producers never
/// interleave and a slow client applies backpressure to the build tool.
pub struct OutputMultiplexer {
    label: String,
    state: Mutex<ReplyState>,
}

impl OutputMultiplexer {
    pub fn new(label: impl Into<String>, tx: ReplyTx) -> Self {
        Self {
            label: label.into(),
            state: Mutex::new(ReplyState {
                tx,
                finished: false,
                receiver_gone: false,
                forwarded: 0,
            }),
        }
    }

    async fn forward(&self, event: OutboundEvent) {
        let mut state = self.state.lock().await;
        if state.finished {
            tracing::trace!(op = %self.label, event = event.name(), "event after result dropped");
            return;
        }
        if state.receiver_gone {
            return;
        }
        if state.tx.send(event).await.is_err() {
            state.receiver_gone = true;
            tracing::debug!(op = %self.label, "reply receiver closed, discarding further events");
            return;
        }
        state.forwarded += 1;
    }

    /// Writes the terminal result and closes the stream for further events.
    ///
    /// Returns `false` when a result was already written or the client is gone.
    pub async fn finish(&self, result: TaskResult) -> bool {
        let mut state = self.state.lock().await;
        if state.finished {
            tracing::warn!(op = %self.label, "second terminal result ignored");
            return false;
        }
        state.finished = true;
        if state.receiver_gone {
            return false;
        }
        if state.tx.send(OutboundEvent::Result(result)).await.is_err() {
            state.receiver_gone = true;
            tracing::debug!(op = %self.label, "reply receiver closed before result");
            return false;
        }
        state.forwarded += 1;
        true
    }

    /// Number of events delivered to the reply channel, result included.
    pub async fn forwarded(&self) -> u64 {
        self.state.lock().await.forwarded
    }

    pub(crate) async fn forward_output(&self, stream: StreamTag, bytes: Bytes) {
        if bytes.is_empty() {
            return;
        }
        self.forward(OutboundEvent::Output { stream, bytes }).await;
    }
}

#[async_trait]
impl BuildEventSink for OutputMultiplexer {
    async fn on_progress(&self, event: ProgressEvent) {
        self.forward(OutboundEvent::Progress {
            message: event.display_name,
        })
        .await;
    }

    async fn on_standard_output(&self, bytes: Bytes) {
        self.forward_output(StreamTag::Stdout, bytes).await;
    }

    async fn on_standard_error(&self, bytes: Bytes) {
        self.forward_output(StreamTag::Stderr, bytes).await;
    }
}
