// * Operations: logging setup and pipeline counters

pub mod telemetry;

// * Re-exports for convenient access
pub use telemetry::{
    init_tracing, init_tracing_pretty, init_tracing_with_level, install_panic_hook, panic_message,
    PipelineStats, PipelineStatsSnapshot,
};
