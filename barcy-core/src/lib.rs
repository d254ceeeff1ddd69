#![cfg_attr(not(any(feature = "std", test)), no_std)]

//! # Barcy Core
//!
//! Tells barcode-scanner keystroke bursts apart from human typing.
//! Accumulates key events, watches their timing and delimiters, and reports
//! each burst as a scan, a long-press scan or an error.

pub mod types;
pub mod state;
pub mod engine;
pub mod handler;
pub mod hal;

#[cfg(feature = "embassy-time")]
pub mod task;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;


pub use types::*;
pub use state::ScanState;
pub use engine::*;
pub use handler::*;
pub use hal::{Duration, Instant};

#[cfg(feature = "embassy-time")]
pub use task::{detector_task, DetectorCommand};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
