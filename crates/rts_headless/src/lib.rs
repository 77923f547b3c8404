//! Headless match driver for scripted control and CI verification.
//!
//! This crate drives `rts_core` simulations without any front-end:
//!
//! - **Interactive control**: a controller plays through JSON commands on
//!   stdin and reads responses on stdout
//! - **Auto-play**: the scripted policy plays one or both sides
//! - **Batch runs**: many seeds in parallel, aggregated into a results file
//! - **Determinism checks**: repeated runs must hash identically
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: commands from the controller (step, select, train, ...)
//! - **stdout**: responses and state (JSON)
//! - **stderr**: logs (human-readable)
//!
//! See the [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"step","count":60}' | cargo run -p rts_headless -- run
//!
//! # Auto-play one match and print the map
//! cargo run -p rts_headless -- play --seed 7 --ticks 2000
//!
//! # Verify determinism
//! cargo run -p rts_headless -- verify --seed 7 --runs 5
//! ```

pub mod ascii_visualizer;
pub mod batch;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod runner;

pub use ascii_visualizer::{render_ascii, AsciiConfig};
pub use batch::{run_batch, BatchConfig, BatchResults};
pub use error::{HeadlessError, Result};
pub use metrics::{BatchSummary, GameMetrics};
pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
