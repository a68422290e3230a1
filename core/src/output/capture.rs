use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;

use super::event::StreamTag;
use super::multiplexer::OutputMultiplexer;
use super::sink::{BuildEventSink, ProgressEvent};

/// Sink for dependency sub-builds: buffers stdout for parsing and forwards
/// everything else to the operation's multiplexer.
///
/// The buffer belongs to one query. Call [`DependencyCapture::reset`]
/// before each sub-build and [`DependencyCapture::take_text`] after it.
pub struct DependencyCapture<'a> {
    inner: &'a OutputMultiplexer,
    stdout: Mutex<Vec<u8>>,
    forward_stdout: bool,
}

impl<'a> DependencyCapture<'a> {
    pub fn new(inner: &'a OutputMultiplexer, forward_stdout: bool) -> Self {
        Self {
            inner,
            stdout: Mutex::new(Vec::new()),
            forward_stdout,
        }
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<u8>> {
        self.stdout.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn reset(&self) {
        self.buffer().clear();
    }

    /// Drains the captured stdout as text.
    pub fn take_text(&self) -> String {
        let bytes = std::mem::take(&mut *self.buffer());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn captured_len(&self) -> usize {
        self.buffer().len()
    }
}

#[async_trait]
impl BuildEventSink for DependencyCapture<'_> {
    async fn on_progress(&self, event: ProgressEvent) {
        self.inner.on_progress(event).await;
    }

    async fn on_standard_output(&self, bytes: Bytes) {
        self.buffer().extend_from_slice(&bytes);
        if self.forward_stdout {
            self.inner.forward_output(StreamTag::Stdout, bytes).await;
        }
    }

    async fn on_standard_error(&self, bytes: Bytes) {
        self.inner.on_standard_error(bytes).await;
    }
}
