//! # SG Telemetry
//!
//! Log subscriber installation for binaries and test harnesses built on
//! the Scatter/Gather driver. The driver library only emits `tracing`
//! events; installing a subscriber is the caller's decision.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sg_telemetry::{init_tracing, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_tracing(&config).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SG_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `SG_JSON_LOGS` | `false` | Emit JSON lines instead of text |
//! | `SG_SERVICE_NAME` | `sg-driver` | Service name attached to the startup event |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::{init_tracing, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}
