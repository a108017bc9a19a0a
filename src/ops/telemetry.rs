// * Telemetry - JSON Logging and Pipeline Counters
// * Provides structured logging setup and lock-free run statistics

use serde::Serialize;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the tracing subscriber with JSON formatting
///
/// # Example
/// ```ignore
/// use argus_extractor::ops::telemetry;
///
/// telemetry::init_tracing();
/// tracing::info!(url = "https://shop.example/p/1", "Analyzing page");
/// ```
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Initializes tracing with custom log level
pub fn init_tracing_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // * try_init: a second initialisation (tests, embedding) is not fatal
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .try_init();
}

/// Initializes tracing with pretty formatting (for development)
pub fn init_tracing_pretty() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty())
        .try_init();
}

/// Text of a panic payload, for `&str` and `String` payloads
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Reports panics through tracing instead of the default stderr printer.
///
/// The executor still catches module panics; the hook only decides where the
/// message goes. Install it once, after the subscriber.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(panic = %panic_message(info.payload()), location = %location, "Panic raised");
    }));
}

/// Counters shared by every run of one analyzer
#[derive(Debug, Default)]
pub struct PipelineStats {
    runs_completed: AtomicU64,
    runs_failed: AtomicU64,
    modules_executed: AtomicU64,
    module_failures: AtomicU64,
    fields_resolved: AtomicU64,
    enrichment_hits: AtomicU64,
}

/// Point-in-time copy of `PipelineStats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct PipelineStatsSnapshot {
    pub runs_completed: u64,
    pub runs_failed: u64,
    pub modules_executed: u64,
    pub module_failures: u64,
    pub fields_resolved: u64,
    pub enrichment_hits: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run(&self, modules_executed: usize, module_failures: usize, fields_resolved: usize, enrichment_hits: usize) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        self.modules_executed.fetch_add(modules_executed as u64, Ordering::Relaxed);
        self.module_failures.fetch_add(module_failures as u64, Ordering::Relaxed);
        self.fields_resolved.fetch_add(fields_resolved as u64, Ordering::Relaxed);
        self.enrichment_hits.fetch_add(enrichment_hits as u64, Ordering::Relaxed);
    }

    /// A run aborted before execution (dependency cycle)
    pub fn record_failed_run(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Share of executed modules that returned without error
    pub fn module_success_rate(&self) -> f64 {
        let executed = self.modules_executed.load(Ordering::Relaxed) as f64;
        let failed = self.module_failures.load(Ordering::Relaxed) as f64;
        if executed > 0.0 {
            (executed - failed) / executed
        } else {
            1.0
        }
    }

    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            modules_executed: self.modules_executed.load(Ordering::Relaxed),
            module_failures: self.module_failures.load(Ordering::Relaxed),
            fields_resolved: self.fields_resolved.load(Ordering::Relaxed),
            enrichment_hits: self.enrichment_hits.load(Ordering::Relaxed),
        }
    }
}
