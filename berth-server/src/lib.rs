//! Berth Deployment Server Library
//!
//! This library exposes the server's internal modules for integration testing.

pub mod connection;
pub mod constants;
pub mod deploy;
pub mod files;
pub mod handlers;
pub mod monitor;
