/// Per-widget request tokens and load state.
///
/// Every load issues a token from a monotonically increasing per-widget counter. A response
/// is applied only while its token is still the latest one for that widget, so an older
/// request that resolves late cannot overwrite a newer result.
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Widget {
    RecentCitations,
    Stats,
    TopCited,
    Contributions,
    CitationSubmit,
}

/// `Idle -> Loading -> {Populated | Error}`; any state may go back to `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    #[default]
    Idle,
    Loading,
    Populated,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    widget: Widget,
    seq: u64,
}

impl RequestToken {
    pub fn widget(&self) -> Widget {
        self.widget
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
struct Entry {
    latest: u64,
    state: WidgetState,
}

#[derive(Debug, Default)]
pub struct WidgetTracker {
    entries: Mutex<HashMap<Widget, Entry>>,
}

impl WidgetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token for `widget` and mark it loading.
    pub fn begin(&self, widget: Widget) -> RequestToken {
        let mut entries = self.lock();
        let entry = entries.entry(widget).or_default();
        entry.latest += 1;
        entry.state = WidgetState::Loading;
        RequestToken {
            widget,
            seq: entry.latest,
        }
    }

    /// Settle `token` with `state` and run `apply` under the tracker lock.
    ///
    /// Returns `false` without running `apply` when a newer token has been issued.
    pub fn settle<F: FnOnce()>(&self, token: RequestToken, state: WidgetState, apply: F) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&token.widget) else {
            return false;
        };
        if entry.latest != token.seq {
            return false;
        }
        entry.state = state;
        apply();
        true
    }

    pub fn state(&self, widget: Widget) -> WidgetState {
        self.lock()
            .get(&widget)
            .map(|e| e.state)
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Widget, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_increase_per_widget() {
        let tracker = WidgetTracker::new();
        let a = tracker.begin(Widget::Stats);
        let b = tracker.begin(Widget::Stats);
        let c = tracker.begin(Widget::TopCited);
        assert!(b.seq() > a.seq());
        assert_eq!(c.seq(), 1);
        assert!(!tracker.settle(a, WidgetState::Populated, || {}));
        assert!(tracker.settle(b, WidgetState::Populated, || {}));
        assert!(tracker.settle(c, WidgetState::Populated, || {}));
    }

    #[test]
    fn stale_settle_is_dropped() {
        let tracker = WidgetTracker::new();
        let first = tracker.begin(Widget::RecentCitations);
        let second = tracker.begin(Widget::RecentCitations);

        let mut applied = Vec::new();
        assert!(tracker.settle(second, WidgetState::Populated, || applied.push("second")));
        assert!(!tracker.settle(first, WidgetState::Error, || applied.push("first")));

        assert_eq!(applied, vec!["second"]);
        assert_eq!(tracker.state(Widget::RecentCitations), WidgetState::Populated);
    }

    #[test]
    fn states_follow_lifecycle() {
        let tracker = WidgetTracker::new();
        assert_eq!(tracker.state(Widget::Contributions), WidgetState::Idle);
        let token = tracker.begin(Widget::Contributions);
        assert_eq!(tracker.state(Widget::Contributions), WidgetState::Loading);
        tracker.settle(token, WidgetState::Error, || {});
        assert_eq!(tracker.state(Widget::Contributions), WidgetState::Error);
        tracker.begin(Widget::Contributions);
        assert_eq!(tracker.state(Widget::Contributions), WidgetState::Loading);
    }
}
