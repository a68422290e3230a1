use std::collections::HashMap;

use buildd_core::api::{AppContext, CliError, RunTaskRequest};

use super::cli::RunArgs;
use super::{drain_events, exit_code_for_state, report_result, resolve_project_dir, write_event};
use crate::utils::{parse_env_file, parse_env_pairs};

/// Handles `buildd run`: streams the build's output through and maps its
/// terminal state to an exit code.
pub async fn handle_run(args: RunArgs, ctx: &AppContext) -> Result<i32, CliError> {
    let request = build_request(args)?;
    let key = request.key();

    let (tx, mut rx) = ctx.reply_channel();
    let tasks = ctx.tasks();
    let runner = tokio::spawn(async move { tasks.run(request, tx).await });

    let result = drain_events(&mut rx, ctx.registry(), &key, |ev| write_event(ev, false)).await?;
    let state = runner
        .await
        .map_err(|e| CliError::Command(format!("task runner failed: {e}")))?;

    if let Some(result) = &result {
        report_result(result);
    }
    Ok(exit_code_for_state(state))
}

fn build_request(args: RunArgs) -> Result<RunTaskRequest, CliError> {
    let mut env = HashMap::new();
    if let Some(path) = args.env_file.as_deref() {
        env.extend(parse_env_file(path)?);
    }
    env.extend(parse_env_pairs(&args.env)?);

    Ok(RunTaskRequest {
        project_dir: resolve_project_dir(&args.project_dir)?,
        task: args.task,
        args: args.args,
        env,
        input: args.input,
        java_debug: args.java_debug_port.is_some(),
        java_debug_port: args.java_debug_port,
        color_output: args.color,
        jvm_args: args.jvm_args,
    })
}
