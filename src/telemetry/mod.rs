//! Telemetry module
//!
//! Logging setup and process-level metric names. Cycle code records
//! counters and gauges through the `metrics` facade; installing an
//! exporter is left to the embedding process.

mod logging;

pub use logging::{init_logging, LogFormat};

use crate::config::TelemetryConfig;

/// Guard that cleans up telemetry on drop
pub struct TelemetryGuard {
    _priv: (),
}

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig, format: LogFormat) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level, format)?;

    Ok(TelemetryGuard { _priv: () })
}
