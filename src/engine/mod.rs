//! Engine: the per-dump operations (upload, confirm) and the process-facing pieces (CLI, liveness).

pub mod arg_parser;
pub mod cli;
pub mod confirm;
pub mod liveness;
pub mod upload;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::{handle_run, resolve_settings};
pub use confirm::confirm_upload;
pub use liveness::LivenessReporter;
pub use upload::{ObjectUploader, object_key_for};
