//! Abacus calculator frontend (the user-facing process).
//!
//! Serves an HTML calculator on the exposed port and forwards calculations
//! to the backend API found at `API_URL`.

pub mod client;
pub mod config;
pub mod page;
pub mod routes;
pub mod state;
