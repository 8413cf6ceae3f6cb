use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Pick the crate's log level: `--verbose` wins, then a `LOGLEVEL` value, then info.
/// Unrecognised `LOGLEVEL` values fall back to info.
pub fn resolve_level(verbose: bool, env_level: Option<&str>) -> LevelFilter {
    if verbose {
        return LevelFilter::Debug;
    }
    env_level
        .and_then(|s| s.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the process logger. Called once from `main`; library code only uses the `log` macros.
pub fn setup_logging(level: LevelFilter) {
    Builder::from_default_env()
        .filter_level(LevelFilter::Warn) // Default: only warnings from dependencies
        .filter_module(env!("CARGO_PKG_NAME"), level) // Our crate: use requested level
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME").cyan();
            let tag = match record.level() {
                Level::Error => Some("ERROR".red()),
                Level::Warn => Some("WARN".yellow()),
                _ => None,
            };
            match tag {
                Some(tag) => writeln!(
                    buf,
                    "[{} {} {}] {}",
                    name,
                    tag,
                    record.target().white(),
                    record.args()
                ),
                None => writeln!(buf, "[{}] {}", name, record.args()),
            }
        })
        .init();
}
