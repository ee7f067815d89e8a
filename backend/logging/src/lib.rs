//! Structured logging setup for RoboWarehouse.
//!
//! Console output plus optional daily-rolling NDJSON files, with
//! environment-based level control.

pub mod logger;

pub use logger::{build_filter, init_logger, LogSettings, LOG_FILE_PREFIX};
