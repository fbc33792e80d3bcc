//! Replicated document abstraction.
//!
//! The anchor pipeline never owns or mutates the document. It reads the
//! current text and length, resolves positions through the [`AnchorCodec`]
//! supertrait, and listens for mutation batches.

use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

use crate::pipeline::PipelineEvent;
use crate::position::AnchorCodec;

/// A replicated text container observed by the pipeline.
pub trait ReplicatedDocument: AnchorCodec {
    /// Full text of the current snapshot.
    fn text(&self) -> String;

    /// Length in chars of the current snapshot.
    fn len_chars(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// Register a listener that is notified once per applied mutation batch,
    /// local or remote.
    ///
    /// The listener stays registered until the returned guard is dropped or
    /// explicitly unsubscribed.
    fn subscribe_mutations(&self, notifier: MutationNotifier) -> MutationSubscription;
}

/// Handle given to a document listener to signal a mutation batch.
///
/// Notifying only enqueues; the recompute runs on the pipeline's consumer
/// side, never inside the document's callback.
#[derive(Clone)]
pub struct MutationNotifier {
    tx: UnboundedSender<PipelineEvent>,
}

impl MutationNotifier {
    pub(crate) fn new(tx: UnboundedSender<PipelineEvent>) -> Self {
        Self { tx }
    }

    /// Signal that the document changed.
    ///
    /// Returns `false` once the pipeline is gone, so listeners may choose to
    /// unregister themselves.
    pub fn notify(&self) -> bool {
        self.tx.send(PipelineEvent::Mutation).is_ok()
    }
}

impl fmt::Debug for MutationNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationNotifier")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Guard for a registered mutation listener.
///
/// Dropping the guard unregisters the listener.
#[must_use = "dropping the subscription unregisters the listener"]
pub struct MutationSubscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl MutationSubscription {
    /// Wrap the backend-specific release action.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Unregister the listener now.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for MutationSubscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for MutationSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationSubscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
