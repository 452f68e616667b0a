#![forbid(unsafe_code)]

pub mod config;
pub mod extract;
pub mod loader;
pub mod notify;
pub mod observation;
pub mod watcher;

pub use config::{TelegramCredentials, WatchConfig};
pub use extract::extract_count;
pub use loader::{HttpLoader, LoadError, PageLoader};
pub use notify::{slot_free_message, Delivery, Notifier, TelegramNotifier, STARTUP_MESSAGE};
pub use observation::{Observation, ObservationLog};
pub use watcher::{should_notify, CheckOutcome, WatchState, Watcher, WatcherHandle};
