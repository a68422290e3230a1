use buildd_core::api::DependencyStrategy;
use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "buildd", version, about = "Build-tool execution server")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of ~/.buildd/config.toml or ./buildd.toml.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Defaults to `server.host` from the config.
    #[arg(long)]
    pub host: Option<String>,

    /// Defaults to `server.port` from the config.
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    #[arg(long)]
    pub project_dir: String,

    /// Task path, e.g. `:app:build`.
    #[arg(long)]
    pub task: String,

    /// Extra build-tool argument. Can be specified multiple times.
    #[arg(long = "arg", action = clap::ArgAction::Append, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Extra environment variables for the build (KEY=VALUE).
    /// Can be specified multiple times.
    #[arg(long = "env", action = clap::ArgAction::Append)]
    pub env: Vec<String>,

    /// Dotenv-style file read before `--env` values.
    #[arg(long)]
    pub env_file: Option<String>,

    /// Text written to the build's stdin.
    #[arg(long)]
    pub input: Option<String>,

    /// Attach a JDWP agent listening on this port.
    #[arg(long)]
    pub java_debug_port: Option<u16>,

    #[arg(long, default_value_t = false)]
    pub color: bool,

    #[arg(long, allow_hyphen_values = true)]
    pub jvm_args: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DepsArgs {
    #[arg(long)]
    pub project_dir: String,

    /// auto | model | text. Defaults to `engine.dependency_strategy`.
    #[arg(long)]
    pub strategy: Option<DependencyStrategy>,

    #[arg(long = "arg", action = clap::ArgAction::Append, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Run one task locally.
    Run(RunArgs),
    /// Print the dependency forest of a build as JSON.
    Deps(DepsArgs),
}
