//! `abacus-supervisor` library crate.
//!
//! Boots the backend API detached, gates on its health endpoint, then runs
//! the frontend in the foreground and exits with its code. The binary
//! entrypoint lives in `main.rs`; the modules are public for integration
//! testing.

pub mod config;
pub mod environment;
pub mod error;
pub mod process;
pub mod readiness;
pub mod supervisor;

pub use supervisor::Supervisor;
