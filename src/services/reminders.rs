//! Reminder scanner
//!
//! Recurring background task that reads the reminder list from the store
//! and announces doses in two windows: "upcoming" (up to 15 minutes before
//! the scheduled time) and "due" (the scheduled minute plus a 5 minute
//! grace period for ticks missed while suspended). Each reminder fires at
//! most once per phase per calendar day; the fired marks live in the local
//! store, which is the authority for de-duplication, and survive restarts.
//!
//! Time deltas are plain minute subtraction with no midnight wraparound:
//! a reminder at 00:10 checked at 23:55 does not notify.

use crate::config::{DUE_GRACE_MINUTES, SCAN_INTERVAL_SECS, UPCOMING_WINDOW_MINUTES};
use crate::services::notifications::{Notification, Notifier, Toast, ToastSender};
use crate::store::app_store::AppStore;
use crate::store::models::{Reminder, ReminderPhase};
use chrono::{Local, Timelike};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Which notification window a time delta falls in, if any. The upcoming
/// window is inclusive at 15 and exclusive at 0; minute zero belongs to
/// the due window.
pub fn window_phase(diff_minutes: i64) -> Option<ReminderPhase> {
    if diff_minutes > 0 && diff_minutes <= UPCOMING_WINDOW_MINUTES {
        Some(ReminderPhase::Upcoming)
    } else if (-DUE_GRACE_MINUTES..=0).contains(&diff_minutes) {
        Some(ReminderPhase::Due)
    } else {
        None
    }
}

/// Parse "HH:MM" into minutes since midnight
fn time_to_minutes(time: &str) -> Option<i64> {
    let (hours, minutes) = time.split_once(':')?;
    let hours: i64 = hours.trim().parse().ok()?;
    let minutes: i64 = minutes.trim().parse().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 60 + minutes)
}

#[derive(Clone)]
pub struct ReminderScanner {
    store: AppStore,
    notifier: Arc<dyn Notifier>,
    toasts: ToastSender,
}

impl ReminderScanner {
    pub fn new(store: AppStore, notifier: Arc<dyn Notifier>, toasts: ToastSender) -> Self {
        Self {
            store,
            notifier,
            toasts,
        }
    }

    /// Start the background scan loop. The task runs until the handle is
    /// aborted, independent of any UI surface.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Starting reminder scanner");

            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(SCAN_INTERVAL_SECS));

            loop {
                interval.tick().await;

                let now = Local::now();
                let now_minutes = i64::from(now.hour()) * 60 + i64::from(now.minute());
                let day_key = now.format("%d").to_string();

                self.scan_at(now_minutes, &day_key).await;
            }
        })
    }

    /// One scan pass against an explicit wall-clock position
    pub async fn scan_at(&self, now_minutes: i64, day_key: &str) {
        for reminder in self.store.reminders() {
            if !reminder.enabled {
                continue;
            }

            let Some(reminder_minutes) = time_to_minutes(&reminder.time) else {
                tracing::warn!(
                    "Reminder {} has unparseable time {:?}, skipping",
                    reminder.id,
                    reminder.time
                );
                continue;
            };

            let diff_minutes = reminder_minutes - now_minutes;
            let Some(phase) = window_phase(diff_minutes) else {
                continue;
            };

            if self.store.has_reminder_fired(&reminder.id, phase, day_key) {
                continue;
            }

            self.announce(&reminder, phase, day_key);
            self.store
                .mark_reminder_fired(&reminder.id, phase, day_key)
                .await;
        }
    }

    fn announce(&self, reminder: &Reminder, phase: ReminderPhase, day_key: &str) {
        let title = match phase {
            ReminderPhase::Upcoming => format!("Time to take {} soon!", reminder.medicine_name),
            ReminderPhase::Due => format!("Time to take {}", reminder.medicine_name),
        };
        let body = if reminder.notes.is_empty() {
            format!("Scheduled for {}.", reminder.time)
        } else {
            format!("Scheduled for {}. {}", reminder.time, reminder.notes)
        };
        let tag = format!("med-{}-{}-{}", reminder.id, phase.code(), day_key);

        if self.notifier.is_permitted() {
            let notification = Notification {
                title: title.clone(),
                body: body.clone(),
                tag,
            };
            if self.notifier.notify(notification).is_ok() {
                return;
            }
            tracing::error!("Failed to display notification for reminder {}", reminder.id);
        }

        // Fallback channel so a running foreground app still informs the user
        if self.toasts.send(Toast { title, body }).is_err() {
            tracing::warn!("Toast channel closed, reminder {} unannounced", reminder.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::StaticIdentityProvider;
    use crate::services::notifications::toast_channel;
    use crate::store::models::ReminderDraft;
    use crate::sync::{MemoryDocumentStore, SyncGateway};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct CaptureNotifier {
        permitted: bool,
        seen: Mutex<Vec<Notification>>,
    }

    impl CaptureNotifier {
        fn new(permitted: bool) -> Self {
            Self {
                permitted,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl Notifier for CaptureNotifier {
        fn is_permitted(&self) -> bool {
            self.permitted
        }

        fn notify(&self, notification: Notification) -> crate::error::Result<()> {
            self.seen.lock().unwrap().push(notification);
            Ok(())
        }
    }

    async fn open_store() -> (AppStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let gateway = SyncGateway::new(Arc::new(MemoryDocumentStore::new()));
        let provider = Arc::new(StaticIdentityProvider::new());
        let store = AppStore::open(temp.path(), gateway, provider).await.unwrap();
        (store, temp)
    }

    fn reminder_at(time: &str) -> ReminderDraft {
        ReminderDraft {
            medicine_name: "Amoxicillin".into(),
            time: time.into(),
            enabled: true,
            notes: "After food".into(),
            phone: None,
        }
    }

    #[test]
    fn window_boundaries() {
        // 08:00 reminder against a moving clock
        assert_eq!(window_phase(15), Some(ReminderPhase::Upcoming)); // 07:45
        assert_eq!(window_phase(16), None); // 07:44
        assert_eq!(window_phase(1), Some(ReminderPhase::Upcoming)); // 07:59
        assert_eq!(window_phase(0), Some(ReminderPhase::Due)); // 08:00
        assert_eq!(window_phase(-5), Some(ReminderPhase::Due)); // 08:05
        assert_eq!(window_phase(-6), None); // 08:06
    }

    #[test]
    fn time_parsing() {
        assert_eq!(time_to_minutes("08:00"), Some(480));
        assert_eq!(time_to_minutes("23:59"), Some(1439));
        assert_eq!(time_to_minutes("00:10"), Some(10));
        assert_eq!(time_to_minutes("24:00"), None);
        assert_eq!(time_to_minutes("8am"), None);
        assert_eq!(time_to_minutes(""), None);
    }

    #[tokio::test]
    async fn upcoming_window_notifies_once_per_day() {
        let (store, _temp) = open_store().await;
        store.add_reminder(reminder_at("08:00")).await;

        let notifier = Arc::new(CaptureNotifier::new(true));
        let (toasts, _rx) = toast_channel();
        let scanner = ReminderScanner::new(store, notifier.clone(), toasts);

        // 07:45, then repeated ticks inside the same window
        scanner.scan_at(465, "15").await;
        scanner.scan_at(466, "15").await;
        scanner.scan_at(470, "15").await;

        assert_eq!(notifier.count(), 1);
        let seen = notifier.seen.lock().unwrap();
        assert_eq!(seen[0].title, "Time to take Amoxicillin soon!");
        assert!(seen[0].tag.contains("-pre-15"));
    }

    #[tokio::test]
    async fn due_fires_separately_from_upcoming() {
        let (store, _temp) = open_store().await;
        store.add_reminder(reminder_at("08:00")).await;

        let notifier = Arc::new(CaptureNotifier::new(true));
        let (toasts, _rx) = toast_channel();
        let scanner = ReminderScanner::new(store, notifier.clone(), toasts);

        scanner.scan_at(465, "15").await; // 07:45 upcoming
        scanner.scan_at(480, "15").await; // 08:00 due
        scanner.scan_at(484, "15").await; // 08:04 still in grace, deduplicated

        assert_eq!(notifier.count(), 2);
        let seen = notifier.seen.lock().unwrap();
        assert!(seen[0].tag.contains("-pre-15"));
        assert!(seen[1].tag.contains("-now-15"));
        assert_eq!(seen[1].title, "Time to take Amoxicillin");
    }

    #[tokio::test]
    async fn next_day_notifies_again() {
        let (store, _temp) = open_store().await;
        store.add_reminder(reminder_at("08:00")).await;

        let notifier = Arc::new(CaptureNotifier::new(true));
        let (toasts, _rx) = toast_channel();
        let scanner = ReminderScanner::new(store, notifier.clone(), toasts);

        scanner.scan_at(470, "15").await;
        scanner.scan_at(470, "16").await;

        assert_eq!(notifier.count(), 2);
    }

    #[tokio::test]
    async fn disabled_reminders_are_skipped() {
        let (store, _temp) = open_store().await;
        let reminder = store.add_reminder(reminder_at("08:00")).await;
        store.set_reminder_enabled(&reminder.id, false).await;

        let notifier = Arc::new(CaptureNotifier::new(true));
        let (toasts, _rx) = toast_channel();
        let scanner = ReminderScanner::new(store, notifier.clone(), toasts);

        scanner.scan_at(470, "15").await;
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn missing_permission_falls_back_to_toast() {
        let (store, _temp) = open_store().await;
        store.add_reminder(reminder_at("08:00")).await;

        let notifier = Arc::new(CaptureNotifier::new(false));
        let (toasts, mut rx) = toast_channel();
        let scanner = ReminderScanner::new(store.clone(), notifier.clone(), toasts);

        scanner.scan_at(470, "15").await;

        assert_eq!(notifier.count(), 0);
        let toast = rx.try_recv().unwrap();
        assert_eq!(toast.title, "Time to take Amoxicillin soon!");

        // The fallback still counts for de-duplication
        scanner.scan_at(471, "15").await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn no_midnight_wraparound() {
        let (store, _temp) = open_store().await;
        store.add_reminder(reminder_at("00:10")).await;

        let notifier = Arc::new(CaptureNotifier::new(true));
        let (toasts, _rx) = toast_channel();
        let scanner = ReminderScanner::new(store, notifier.clone(), toasts);

        // 23:55 the previous evening: a wrapped diff would be +15, the
        // plain subtraction yields -1425 and stays silent
        scanner.scan_at(23 * 60 + 55, "15").await;
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn marks_survive_a_restart_within_the_window() {
        let temp = TempDir::new().unwrap();
        let docs = Arc::new(MemoryDocumentStore::new());

        {
            let gateway = SyncGateway::new(docs.clone());
            let provider = Arc::new(StaticIdentityProvider::new());
            let store = AppStore::open(temp.path(), gateway, provider).await.unwrap();
            store.add_reminder(reminder_at("08:00")).await;

            let notifier = Arc::new(CaptureNotifier::new(true));
            let (toasts, _rx) = toast_channel();
            let scanner = ReminderScanner::new(store, notifier.clone(), toasts);
            scanner.scan_at(470, "15").await;
            assert_eq!(notifier.count(), 1);
        }

        // New process over the same data directory, same window
        let gateway = SyncGateway::new(docs);
        let provider = Arc::new(StaticIdentityProvider::new());
        let store = AppStore::open(temp.path(), gateway, provider).await.unwrap();

        let notifier = Arc::new(CaptureNotifier::new(true));
        let (toasts, _rx) = toast_channel();
        let scanner = ReminderScanner::new(store, notifier.clone(), toasts);
        scanner.scan_at(472, "15").await;

        assert_eq!(notifier.count(), 0);
    }
}
