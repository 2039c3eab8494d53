//! NutriTrack core library
//!
//! Client-side state synchronization and reminder scheduling for the
//! nutrition and medication tracker: the local state store, the remote
//! sync gateway, the identity bridge and the background reminder scanner.

pub mod config;
pub mod error;
pub mod services;
pub mod store;
pub mod sync;
