//! Core types for the strut linear-constraint solver.
//!
//! This crate provides the foundational types used by the solver crate:
//! - Variable and constraint handles
//! - The linear-equation constraint data type
//! - The shared numeric tolerance
//! - Error types

pub mod constraint;
pub mod errors;
pub mod types;

pub use constraint::*;
pub use errors::*;
pub use types::*;
