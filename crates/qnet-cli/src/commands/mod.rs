//! CLI command implementations.

pub mod config;
pub mod network;
pub mod replay;
