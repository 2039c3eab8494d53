//! Local state store
//!
//! This module provides the process-wide state:
//! - Model definitions for everything the store holds
//! - The `AppStore` aggregate with its mutation actions
//! - Whole-store device persistence

pub mod app_store;
pub mod models;
pub mod persistence;

pub use app_store::AppStore;
pub use models::*;
pub use persistence::StoreStorage;
