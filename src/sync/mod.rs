//! Remote synchronization layer
//!
//! The `DocumentStore` trait is the seam to the remote per-user document
//! store; `SyncGateway` maps store records onto document paths.

pub mod document_store;
pub mod gateway;

pub use document_store::{DocumentStore, MemoryDocumentStore, RestDocumentStore};
pub use gateway::SyncGateway;
