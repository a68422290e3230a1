mod load;
mod types;

pub use load::{apply_env_overrides, get_buildd_data_dir, load_default, load_from_path};
pub use types::{
    default_elision_markers, AppConfig, BuildToolConfig, DependencyStrategy, EngineConfig,
    LoggingConfig, ServerConfig,
};
