//! In-memory thread store.

use std::sync::Mutex;

use crate::reporter::ThreadStore;
use crate::types::{CommentMode, Thread, ThreadId, ThreadSnapshot, ThreadStatus};

#[derive(Default)]
struct StoreState {
    mode: CommentMode,
    threads: Vec<Thread>,
    outdated_transitions: usize,
}

/// Insertion-ordered [`ThreadStore`] kept in memory.
///
/// Starts in [`CommentMode::ListLoading`]; call [`set_mode`](Self::set_mode)
/// once the threads are loaded.
#[derive(Default)]
pub struct MemoryThreadStore {
    state: Mutex<StoreState>,
}

impl MemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that is already loaded with `threads`.
    pub fn with_threads(threads: impl IntoIterator<Item = Thread>) -> Self {
        let store = Self::new();
        for thread in threads {
            store.insert(thread);
        }
        store.set_mode(CommentMode::List);
        store
    }

    /// Insert a thread, replacing any thread with the same id in place.
    pub fn insert(&self, thread: Thread) {
        let mut state = self.lock();
        match state.threads.iter_mut().find(|t| t.id == thread.id) {
            Some(existing) => *existing = thread,
            None => state.threads.push(thread),
        }
    }

    pub fn remove(&self, thread_id: &ThreadId) -> Option<Thread> {
        let mut state = self.lock();
        let idx = state.threads.iter().position(|t| &t.id == thread_id)?;
        Some(state.threads.remove(idx))
    }

    pub fn set_mode(&self, mode: CommentMode) {
        self.lock().mode = mode;
    }

    pub fn mode(&self) -> CommentMode {
        self.lock().mode.clone()
    }

    /// Set a thread's status directly. Returns false if the thread is unknown.
    pub fn set_status(&self, thread_id: &ThreadId, status: ThreadStatus) -> bool {
        let mut state = self.lock();
        match state.threads.iter_mut().find(|t| &t.id == thread_id) {
            Some(thread) => {
                thread.status = status;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, thread_id: &ThreadId) -> Option<Thread> {
        self.lock().threads.iter().find(|t| &t.id == thread_id).cloned()
    }

    pub fn status(&self, thread_id: &ThreadId) -> Option<ThreadStatus> {
        self.get(thread_id).map(|t| t.status)
    }

    /// Threads currently tagged outdated, for thread-list views.
    pub fn outdated(&self) -> Vec<Thread> {
        self.lock()
            .threads
            .iter()
            .filter(|t| t.status.is_outdated())
            .cloned()
            .collect()
    }

    /// Number of open-to-outdated transitions performed so far.
    pub fn outdated_transitions(&self) -> usize {
        self.lock().outdated_transitions
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // Every mutation is a single step, so poisoned state is still consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ThreadStore for MemoryThreadStore {
    fn snapshot(&self) -> ThreadSnapshot {
        let state = self.lock();
        ThreadSnapshot::new(state.mode.clone(), state.threads.clone())
    }

    fn report_outdated(&self, thread_id: &ThreadId) {
        let mut state = self.lock();
        let Some(thread) = state.threads.iter_mut().find(|t| &t.id == thread_id) else {
            tracing::debug!(thread = %thread_id, "outdated report for unknown thread");
            return;
        };
        if !thread.status.is_open() {
            return;
        }
        thread.status = ThreadStatus::Outdated;
        state.outdated_transitions += 1;
        tracing::info!(thread = %thread_id, "thread marked outdated");
    }
}
