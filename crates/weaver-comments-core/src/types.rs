//! Comment thread types: ids, lifecycle status, anchored selections and the
//! spans derived from them.
//!
//! Threads and their relative positions are owned by the thread store. The
//! resolved spans are recomputed on every document mutation and carry no
//! identity beyond the pass that produced them.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::position::RelativePosition;

/// Stable identifier of a comment thread.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(SmolStr);

impl ThreadId {
    /// Create a thread id from any string-like value.
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ThreadId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ThreadId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Lifecycle status of a thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    /// Attached to live content.
    #[default]
    Open,
    /// The anchored text was removed. Kept for history, never rendered inline.
    Outdated,
    /// Resolved or deleted by a user.
    Closed,
}

impl ThreadStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_outdated(&self) -> bool {
        matches!(self, Self::Outdated)
    }
}

/// The anchored range of a thread, captured once at creation time.
///
/// Like an editor selection, `anchor` is where the range started and `head`
/// where it ended; concurrent edits may resolve them in either order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: RelativePosition,
    pub head: RelativePosition,
}

impl Selection {
    pub fn new(anchor: RelativePosition, head: RelativePosition) -> Self {
        Self { anchor, head }
    }
}

/// A comment thread as handed out by the thread store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub status: ThreadStatus,
    /// `None` for document-level threads that are not attached to text.
    pub selection: Option<Selection>,
}

impl Thread {
    /// Create an open thread anchored to `selection`.
    pub fn anchored(id: impl Into<ThreadId>, selection: Selection) -> Self {
        Self {
            id: id.into(),
            status: ThreadStatus::Open,
            selection: Some(selection),
        }
    }

    /// Create an open document-level thread.
    pub fn document_level(id: impl Into<ThreadId>) -> Self {
        Self {
            id: id.into(),
            status: ThreadStatus::Open,
            selection: None,
        }
    }

    pub fn with_status(mut self, status: ThreadStatus) -> Self {
        self.status = status;
        self
    }
}

/// What the thread store is currently showing.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum CommentMode {
    /// Threads are still being fetched. No resolution happens in this mode.
    #[default]
    ListLoading,
    /// Thread list, nothing focused.
    List,
    /// A single thread is focused; its span is rendered as active.
    Thread(ThreadId),
}

impl CommentMode {
    /// The focused thread, if any.
    pub fn active_thread(&self) -> Option<&ThreadId> {
        match self {
            Self::Thread(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::ListLoading)
    }
}

/// Stable input for one resolution pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadSnapshot {
    pub mode: CommentMode,
    pub threads: Vec<Thread>,
}

impl ThreadSnapshot {
    pub fn new(mode: CommentMode, threads: Vec<Thread>) -> Self {
        Self { mode, threads }
    }
}

/// A thread's live position in the current document, in char offsets.
///
/// `start < end` always holds: inverted ranges are normalised and collapsed
/// ones are rejected by [`ResolvedSpan::new`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedSpan {
    pub thread_id: ThreadId,
    pub start: usize,
    pub end: usize,
    pub active: bool,
}

impl ResolvedSpan {
    /// Build a span from two resolved offsets in either order.
    ///
    /// Returns `None` if the offsets are equal.
    pub fn new(thread_id: ThreadId, a: usize, b: usize, active: bool) -> Option<Self> {
        if a == b {
            return None;
        }
        Some(Self {
            thread_id,
            start: a.min(b),
            end: a.max(b),
            active,
        })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}
