//! Abacus domain crate.
//!
//! Pure calculator logic and the environment variable names shared by the
//! supervisor, backend and frontend binaries. No I/O lives here.

pub mod calculator;
pub mod env_names;
pub mod error;
