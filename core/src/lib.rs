pub mod api;
pub mod buildtool;
pub mod cancel;
pub mod config;
pub mod context;
pub mod deps;
pub mod engine;
pub mod error;
pub mod output;
pub mod util;
