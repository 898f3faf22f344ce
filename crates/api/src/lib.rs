//! Abacus calculator API (the backend process).
//!
//! Exposes config, error handling and routes so integration tests, the
//! binary entrypoint and the frontend's end-to-end tests can all build the
//! same router.

pub mod config;
pub mod error;
pub mod routes;
