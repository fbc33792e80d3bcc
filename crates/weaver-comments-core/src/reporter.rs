//! Thread store seam and outdated-anchor reporting.

use std::sync::Arc;

use crate::resolver::Unanchored;
use crate::types::{ThreadId, ThreadSnapshot};

/// The external owner of comment threads.
///
/// The pipeline reads one snapshot per pass and reports threads whose anchors
/// are gone. Reports may repeat on every pass while a thread stays
/// unanchored, so `report_outdated` must be a no-op for threads that are not
/// open anymore.
pub trait ThreadStore {
    /// Threads and view mode for one resolution pass.
    ///
    /// The returned snapshot must not change while the pass runs.
    fn snapshot(&self) -> ThreadSnapshot;

    /// Move the thread from open to outdated.
    fn report_outdated(&self, thread_id: &ThreadId);
}

impl<S: ThreadStore + ?Sized> ThreadStore for Arc<S> {
    fn snapshot(&self) -> ThreadSnapshot {
        (**self).snapshot()
    }

    fn report_outdated(&self, thread_id: &ThreadId) {
        (**self).report_outdated(thread_id)
    }
}

impl<S: ThreadStore + ?Sized> ThreadStore for &S {
    fn snapshot(&self) -> ThreadSnapshot {
        (**self).snapshot()
    }

    fn report_outdated(&self, thread_id: &ThreadId) {
        (**self).report_outdated(thread_id)
    }
}

/// Forwards terminal resolution failures to the thread store.
///
/// Outdated anchors are an expected end state, so this logs at debug level
/// and never fails.
#[derive(Clone, Debug)]
pub struct OutdatedReporter<S> {
    store: S,
}

impl<S: ThreadStore> OutdatedReporter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Report a single thread.
    pub fn report(&self, entry: &Unanchored) {
        tracing::debug!(
            thread = %entry.thread_id,
            reason = entry.reason.as_str(),
            detail = ?entry.reason,
            "reporting outdated thread"
        );
        self.store.report_outdated(&entry.thread_id);
    }

    /// Report every entry in order. Returns how many were reported.
    pub fn report_all<'a>(&self, entries: impl IntoIterator<Item = &'a Unanchored>) -> usize {
        let mut count = 0;
        for entry in entries {
            self.report(entry);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::RelativePosition;
    use crate::resolver::{AnchorSide, UnanchoredReason};
    use crate::store::MemoryThreadStore;
    use crate::types::{Selection, Thread, ThreadStatus};

    fn selection() -> Selection {
        Selection::new(
            RelativePosition::from_bytes(vec![1]),
            RelativePosition::from_bytes(vec![2]),
        )
    }

    #[test]
    fn test_report_marks_thread_outdated() {
        let store = Arc::new(MemoryThreadStore::new());
        store.insert(Thread::anchored("t1", selection()));
        let reporter = OutdatedReporter::new(store.clone());

        reporter.report(&Unanchored {
            thread_id: "t1".into(),
            reason: UnanchoredReason::Degenerate { offset: 0 },
        });

        assert_eq!(store.status(&"t1".into()), Some(ThreadStatus::Outdated));
    }

    #[test]
    fn test_repeated_reports_transition_once() {
        let store = Arc::new(MemoryThreadStore::new());
        store.insert(Thread::anchored("t1", selection()));
        let reporter = OutdatedReporter::new(store.clone());
        let entry = Unanchored {
            thread_id: "t1".into(),
            reason: UnanchoredReason::Unresolvable {
                side: AnchorSide::Anchor,
            },
        };

        assert_eq!(reporter.report_all([&entry, &entry, &entry]), 3);
        assert_eq!(store.outdated_transitions(), 1);
    }

    #[test]
    fn test_report_order_does_not_matter() {
        let forward = Arc::new(MemoryThreadStore::new());
        let backward = Arc::new(MemoryThreadStore::new());
        for store in [&forward, &backward] {
            store.insert(Thread::anchored("a", selection()));
            store.insert(Thread::anchored("b", selection()));
        }
        let a = Unanchored {
            thread_id: "a".into(),
            reason: UnanchoredReason::Degenerate { offset: 4 },
        };
        let b = Unanchored {
            thread_id: "b".into(),
            reason: UnanchoredReason::Degenerate { offset: 4 },
        };

        OutdatedReporter::new(forward.clone()).report_all([&a, &b]);
        OutdatedReporter::new(backward.clone()).report_all([&b, &a]);

        assert_eq!(forward.snapshot(), backward.snapshot());
    }
}
