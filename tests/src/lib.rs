//! # Scatter/Gather Test Suite
//!
//! Workspace-level tests exercising the driver through its public API only.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Driver builders and a request-recording transport
//! └── integration/
//!     ├── e2e_files.rs  # Quadrant read/write scenarios, eviction, model check
//!     ├── wire.rs       # Frames the driver puts on the wire
//!     └── shared.rs     # Multi-threaded access through SharedDriver
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sg-tests
//!
//! # Benchmarks
//! cargo bench -p sg-tests
//! ```

pub mod fixtures;
pub mod integration;
