//! Request checks that must fail before anything reaches the engine.

use buildd_core::api::OperationKey;

use super::models::{CancelRequest, HttpServerError};

/// Resolves the operation key a cancel request refers to.
pub fn cancel_key(req: &CancelRequest) -> Result<OperationKey, HttpServerError> {
    if let Some(key) = req.key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(OperationKey::new(key));
    }

    let project_dir = non_blank(req.project_dir.as_deref()).ok_or_else(|| {
        HttpServerError::InvalidRequest("Either key or project_dir must be set".to_string())
    })?;
    let task = non_blank(req.task.as_deref())
        .ok_or_else(|| HttpServerError::InvalidRequest("Task is not set".to_string()))?;

    Ok(OperationKey::for_task(project_dir, task))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_key_wins() {
        let req = CancelRequest {
            key: Some("deps-1".into()),
            project_dir: Some("/p".into()),
            task: Some(":build".into()),
        };
        assert_eq!(cancel_key(&req).unwrap().as_str(), "deps-1");
    }

    #[test]
    fn test_key_derived_from_project_and_task() {
        let req = CancelRequest {
            key: Some("  ".into()),
            project_dir: Some("/p".into()),
            task: Some(":build".into()),
        };
        assert_eq!(cancel_key(&req).unwrap().as_str(), "/p:build");
    }

    #[test]
    fn test_incomplete_request_is_rejected() {
        assert!(matches!(
            cancel_key(&CancelRequest::default()),
            Err(HttpServerError::InvalidRequest(_))
        ));
        let req = CancelRequest {
            project_dir: Some("/p".into()),
            ..CancelRequest::default()
        };
        assert!(matches!(
            cancel_key(&req),
            Err(HttpServerError::InvalidRequest(msg)) if msg == "Task is not set"
        ));
    }
}
