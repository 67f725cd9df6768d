//! The dashboard's raw canvas export format.

pub mod types;

pub use types::*;
