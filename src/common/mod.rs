//! Common types shared across the simulator.

/// Error types for construction and program parsing.
pub mod error;

pub use error::{BuildError, ParseError};
