//! Pipeline components: watcher, startup sweep, worker pool, in-flight registry, supervisor.

pub mod context;
pub mod inflight;
pub mod orchestrator;
pub mod pool;
pub mod report;
pub mod sweep;
pub mod watch;

pub use context::{install_signal_handler, shutdown_channel};
pub use inflight::{InFlight, InFlightClaim};
pub use orchestrator::run_supervisor;
pub use pool::WorkerPool;
pub use report::report_outcome;
pub use sweep::SweepBacklog;
pub use watch::{DirectoryWatcher, WatchBatch, is_dump_name, is_write_close, tasks_from_event};
