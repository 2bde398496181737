//! Domain models shared by the API and CLI front ends.

pub mod auth;
pub mod todo;
