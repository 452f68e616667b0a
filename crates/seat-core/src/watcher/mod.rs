pub mod engine;
pub mod state;

pub use engine::{should_notify, Watcher, WatcherHandle};
pub use state::{CheckOutcome, WatchState};
