pub mod config;
pub mod env;
pub mod logger;
pub mod settings_file;

pub use config::*;
pub use env::EnvSnapshot;
pub use logger::{resolve_level, setup_logging};
pub use settings_file::{
    SettingsFile, apply_file_to_settings, load_settings_file, parse_settings_file,
};
