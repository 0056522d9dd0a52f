//! Utility functions for common operations.
//!
//! - **Atomic writes**: replace output files without ever exposing a partial file

mod fs;

pub use fs::atomic_write;
