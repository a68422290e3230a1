//! Coordinators that drive one client operation end to end.
//!
//! Both follow the same lifecycle: validate, lease the cancellation handle,
//! invoke the build tool with a multiplexer as sink, map the outcome to one
//! terminal [`TaskResult`](crate::output::TaskResult), release the lease.

mod dependencies;
mod outcome;
mod tasks;
mod types;

pub use dependencies::DependencyQueryCoordinator;
pub use tasks::TaskExecutionCoordinator;
pub use types::{DependencyRequest, RunTaskRequest};
