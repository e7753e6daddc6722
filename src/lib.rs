//! Dubforge - automatic video dubbing pipeline
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod media;
pub mod pipeline;
pub mod progress;
pub mod retention;
pub mod server;
pub mod session;
pub mod state;
pub mod subtitles;
