//! Shared utilities for darc.
//!
//! This crate provides common utilities used across the darc workspace:
//! - Peer identity generation and parsing
//! - Logging setup with tracing

pub mod id;
pub mod log;

pub use id::PeerId;
