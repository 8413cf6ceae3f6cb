//! coredrain CLI: watch DIR for core dumps and offload them to object storage.

use anyhow::Result;
use clap::Parser;
use coredrain::engine::arg_parser::Cli;
use coredrain::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
