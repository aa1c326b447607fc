//! Role Aggregate
//!
//! Named authorities attached to principals.

pub mod entity;

pub use entity::Role;
