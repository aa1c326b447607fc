//! Principal Aggregate
//!
//! Authenticated identities and their account state.

pub mod entity;

pub use entity::{AccountStatus, Principal};
