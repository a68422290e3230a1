use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::cancel::OperationKey;
use crate::error::{BuildFailure, ErrorKind};
use crate::output::TaskResult;

/// Awaits `fut`, turning a panic inside the build tool into an
/// uncategorized failure.
pub(crate) async fn guarded<F, T>(fut: F) -> Result<T, BuildFailure>
where
    F: Future<Output = Result<T, BuildFailure>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(payload) => Err(BuildFailure::Other(anyhow::anyhow!(
            "build tool panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic".to_string()
}

/// Maps a non-success outcome to the terminal result sent to the client.
pub(crate) fn failure_result(
    failure: BuildFailure,
    key: &OperationKey,
    project_dir: &str,
) -> TaskResult {
    let failure = match failure {
        BuildFailure::Cancelled(message) => {
            tracing::info!(key = %key, "operation cancelled");
            return TaskResult::Cancelled {
                message,
                key: key.clone(),
                project_dir: project_dir.to_string(),
            };
        }
        other => other,
    };
    let kind = failure.kind().unwrap_or(ErrorKind::Internal);
    let message = failure.to_string();
    if kind == ErrorKind::Internal {
        tracing::error!(key = %key, error.kind = %kind, error.message = %message, "operation failed unexpectedly");
    } else {
        tracing::warn!(key = %key, error.kind = %kind, error.message = %message, "operation failed");
    }
    TaskResult::error(kind, message)
}
