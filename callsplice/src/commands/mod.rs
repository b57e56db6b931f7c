//! Commands module - CLI command implementations.

mod init;
mod inject;
mod rules;

pub use init::{run_init, run_init_in, DEFAULT_CONFIG};
pub use inject::{build_transformer, compile_rules, run_inject, FileReport, InjectOptions, InjectReport};
pub use rules::run_rules;
