//! # todo_core
//!
//! Core domain logic for Todo: credential storage, bearer-token sessions,
//! the access gate, and per-user todo storage.

pub mod auth;
pub mod db;
pub mod diagnose;
pub mod migrate;
pub mod models;
pub mod seed;
pub mod todos;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
