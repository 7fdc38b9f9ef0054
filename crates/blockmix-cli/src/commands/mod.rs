//! Command implementations.

pub mod info;
pub mod mix;
