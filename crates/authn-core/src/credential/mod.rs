//! Credential Aggregate
//!
//! Stored credential hashes, role sets and account flags, plus the store
//! implementations that own them.

pub mod entity;
pub mod store;
pub mod memory;
pub mod mongo;

pub use entity::CredentialRecord;
pub use store::{CredentialStore, SaveMode};
pub use memory::InMemoryCredentialStore;
pub use mongo::MongoCredentialStore;
