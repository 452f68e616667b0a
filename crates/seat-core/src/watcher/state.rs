/// Lifecycle of a spawned watcher task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Active,
    Stopping,
    Stopped,
}

impl WatchState {
    pub fn can_transition_to(self, target: WatchState) -> bool {
        matches!(
            (self, target),
            (WatchState::Active, WatchState::Stopping)
                | (WatchState::Active, WatchState::Stopped)
                | (WatchState::Stopping, WatchState::Stopped)
        )
    }
}

impl std::fmt::Display for WatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// What a single check produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// A count was read. `notified` is true when a notification was attempted.
    Observed { count: u64, notified: bool },
    /// Fetch failed or the page carried no count.
    Unavailable,
}

impl CheckOutcome {
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Observed { count, .. } => Some(*count),
            Self::Unavailable => None,
        }
    }

    pub fn notified(&self) -> bool {
        matches!(self, Self::Observed { notified: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions() {
        assert!(WatchState::Active.can_transition_to(WatchState::Stopping));
        assert!(WatchState::Active.can_transition_to(WatchState::Stopped));
        assert!(WatchState::Stopping.can_transition_to(WatchState::Stopped));
        assert!(!WatchState::Stopped.can_transition_to(WatchState::Active));
        assert!(!WatchState::Stopped.can_transition_to(WatchState::Stopping));
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(WatchState::Stopping.to_string(), "stopping");
    }

    #[test]
    fn outcome_accessors() {
        let o = CheckOutcome::Observed { count: 40, notified: true };
        assert_eq!(o.count(), Some(40));
        assert!(o.notified());
        assert_eq!(CheckOutcome::Unavailable.count(), None);
        assert!(!CheckOutcome::Unavailable.notified());
    }
}
