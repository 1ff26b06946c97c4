//! Patient Dashboard Core - Shared domain library.
//!
//! This crate provides the types and pure computations used across the
//! patient dashboard components:
//! - `api` - REST API for medications, shipments and weight tracking
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Anything that needs the weight history or a tracking number
//! takes it as an argument, which keeps these rules testable in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and closed enums
//! - [`goals`] - Weight-goal snapshot resolution over a weight history
//! - [`progress`] - Derived progress statistics (BMI, percentage, ETA)
//! - [`carrier`] - Carrier guess from tracking-number shape

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod carrier;
pub mod goals;
pub mod progress;
pub mod types;

pub use carrier::Carrier;
pub use goals::{GoalSnapshot, WeightEntry, WeightField, latest_with, weight_change};
pub use progress::{ProgressInput, WeightProgress};
pub use types::*;
