//! Per-operation outbound event stream.

mod capture;
mod event;
mod multiplexer;
mod sink;

pub use capture::DependencyCapture;
pub use event::{OutboundEvent, StreamTag, TaskResult, TerminalState};
pub use multiplexer::{reply_channel, OutputMultiplexer, ReplyRx, ReplyTx};
pub use sink::{BuildEventSink, ProgressEvent};
