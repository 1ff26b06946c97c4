//! Patient dashboard API library.
//!
//! Medications, shipments and weight records for signed-in users, served as
//! a JSON REST API. The binary in `main.rs` wires this library to the
//! environment; the integration tests drive [`routes::app`] directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
