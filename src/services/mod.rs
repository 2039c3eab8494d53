//! Service layer
//!
//! Identity bridge, reminder scanner, derived metrics, notification
//! dispatch and the external API clients.

pub mod auth;
pub mod insights;
pub mod medicine;
pub mod metrics;
pub mod notifications;
pub mod reminders;

pub use auth::{IdentityBridge, IdentityProvider, Principal};
pub use insights::GenerationClient;
pub use medicine::MedicineLookup;
pub use notifications::{LogNotifier, Notifier};
pub use reminders::ReminderScanner;
