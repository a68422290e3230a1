use buildd_core::api::{AppContext, CliError, DependencyRequest, TaskResult};

use super::cli::DepsArgs;
use super::{drain_events, exit_code_for_state, report_result, resolve_project_dir, write_event};

/// Handles `buildd deps`: prints the normalized forest as pretty JSON.
/// Build output goes to stderr so stdout stays parseable.
pub async fn handle_deps(args: DepsArgs, ctx: &AppContext) -> Result<i32, CliError> {
    let request = DependencyRequest {
        project_dir: resolve_project_dir(&args.project_dir)?,
        strategy: args.strategy,
        args: args.args,
        ..DependencyRequest::default()
    };
    let key = request.key();

    let (tx, mut rx) = ctx.reply_channel();
    let dependencies = ctx.dependencies();
    let query = tokio::spawn(async move { dependencies.query(request, tx).await });

    let result = drain_events(&mut rx, ctx.registry(), &key, |ev| write_event(ev, true)).await?;
    let state = query
        .await
        .map_err(|e| CliError::Command(format!("dependency query failed: {e}")))?;

    match &result {
        Some(TaskResult::Dependencies { nodes }) => {
            let json = serde_json::to_string_pretty(nodes)
                .map_err(|e| CliError::Command(format!("failed to encode dependencies: {e}")))?;
            println!("{json}");
        }
        Some(other) => report_result(other),
        None => {}
    }
    Ok(exit_code_for_state(state))
}
