//! Logging and run observability.

mod logging;

pub use logging::{parse_filter, setup_logging, LogSettings};
pub use tracing_appender::non_blocking::WorkerGuard;
