use bytes::Bytes;
use tokio::io::AsyncReadExt;

use crate::error::EngineError;
use crate::output::{BuildEventSink, ProgressEvent, StreamTag};
use crate::util::RingBytes;

const CHUNK_SIZE: usize = 16 * 1024;

const MAX_LINE: usize = 8 * 1024;

const PROGRESS_PREFIXES: [&str; 3] = ["> Task ", "> Configure project ", "> Transform "];

/// Reads `rd` to EOF, forwarding each chunk to `sink` as it arrives.
///
/// Stdout lines that announce a task or project are also reported as
/// progress. Stderr is mirrored into `tail` for failure messages.
pub(crate) async fn pump<R>(
    mut rd: R,
    stream: StreamTag,
    sink: &dyn BuildEventSink,
    tail: Option<&RingBytes>,
) -> Result<u64, EngineError>
where
    R: tokio::io::AsyncRead + Unpin + Send,
{
    let label = match stream {
        StreamTag::Stdout => "stdout",
        StreamTag::Stderr => "stderr",
    };
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    let mut lines = LineScanner::default();

    loop {
        let n = rd.read(&mut buf).await.map_err(|e| EngineError::StreamIo {
            stream: label,
            source: e,
        })?;
        if n == 0 {
            break;
        }
        total += n as u64;

        if let Some(tail) = tail {
            tail.push(&buf[..n]);
        }

        let chunk = Bytes::copy_from_slice(&buf[..n]);
        match stream {
            StreamTag::Stdout => sink.on_standard_output(chunk).await,
            StreamTag::Stderr => sink.on_standard_error(chunk).await,
        }

        if stream == StreamTag::Stdout {
            for event in lines.feed(&buf[..n]) {
                sink.on_progress(event).await;
            }
        }
    }

    if let Some(event) = lines.finish() {
        sink.on_progress(event).await;
    }

    Ok(total)
}

/// Splits stdout into lines for progress detection.
///
/// Only the first `MAX_LINE` bytes of a line are kept, so output without
/// newlines (progress bars, binary data) cannot grow the buffer.
#[derive(Default)]
struct LineScanner {
    line: Vec<u8>,
}

impl LineScanner {
    fn feed(&mut self, mut data: &[u8]) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(pos) = data.iter().position(|&b| b == b'\n') {
            self.push(&data[..pos]);
            events.extend(self.take_line());
            data = &data[pos + 1..];
        }
        self.push(data);
        events
    }

    fn finish(mut self) -> Option<ProgressEvent> {
        self.take_line()
    }

    fn push(&mut self, bytes: &[u8]) {
        let room = MAX_LINE.saturating_sub(self.line.len());
        self.line.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }

    fn take_line(&mut self) -> Option<ProgressEvent> {
        if self.line.is_empty() {
            return None;
        }
        if self.line.last() == Some(&b'\r') {
            self.line.pop();
        }
        let event = progress_from_line(&String::from_utf8_lossy(&self.line));
        self.line.clear();
        event
    }
}

/// Progress event for a console line such as `> Task :app:compileJava`.
pub fn progress_from_line(line: &str) -> Option<ProgressEvent> {
    if !PROGRESS_PREFIXES.iter().any(|p| line.starts_with(p)) {
        return None;
    }
    Some(ProgressEvent::new(line.trim_start_matches("> ").trim_end()))
}
