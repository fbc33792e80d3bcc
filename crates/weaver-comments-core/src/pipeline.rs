//! Mutation pipeline: keeps resolved comment spans in step with the document.
//!
//! One pipeline is attached to one document for its whole lifetime. The
//! document listener and the replication session only push events onto a
//! single-consumer queue; the pipeline drains that queue and recomputes on
//! its own side, so a recompute never re-enters itself and a renderer never
//! sees a half-finished pass.
//!
//! Two ways to drive it:
//! - [`AnchorPipeline::process_pending`] after applying local or remote
//!   changes, for callers that own the event loop.
//! - [`AnchorPipeline::run`] as the dedicated task for the document.
//!
//! Both coalesce everything already queued into one recompute.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;

use crate::config::PipelineConfig;
use crate::connection::{ConnectionMonitor, ConnectionState};
use crate::document::{MutationNotifier, MutationSubscription, ReplicatedDocument};
use crate::error::AnchorError;
use crate::reporter::{OutdatedReporter, ThreadStore};
use crate::resolver::{Unanchored, resolve_threads};
use crate::types::ResolvedSpan;

/// Events consumed by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The document applied a mutation batch.
    Mutation,
    /// The replication session reported a new state.
    Connection(ConnectionState),
    /// Threads were added, removed or refocused in the store.
    ThreadsChanged,
    /// Stop listening to the document.
    Detach,
}

/// What the renderer sees after a pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedView {
    pub spans: Arc<[ResolvedSpan]>,
    pub text: Arc<str>,
    /// Incremented on every publish.
    pub generation: u64,
}

impl Default for ResolvedView {
    fn default() -> Self {
        Self {
            spans: Arc::from(Vec::new()),
            text: Arc::from(""),
            generation: 0,
        }
    }
}

/// Counters for a single recompute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub generation: u64,
    pub spans: usize,
    pub outdated: usize,
    pub pending: usize,
    /// The thread store was still loading, spans were carried over.
    pub skipped: bool,
}

/// Cloneable sender for the replication session and the thread store.
#[derive(Clone, Debug)]
pub struct PipelineHandle {
    tx: UnboundedSender<PipelineEvent>,
}

impl PipelineHandle {
    /// Forward a connection state notification.
    pub fn set_connection(&self, state: ConnectionState) -> Result<(), AnchorError> {
        self.send(PipelineEvent::Connection(state))
    }

    /// Signal that the thread set or the focused thread changed.
    pub fn threads_changed(&self) -> Result<(), AnchorError> {
        self.send(PipelineEvent::ThreadsChanged)
    }

    /// Ask the pipeline to detach from its document.
    pub fn detach(&self) -> Result<(), AnchorError> {
        self.send(PipelineEvent::Detach)
    }

    fn send(&self, event: PipelineEvent) -> Result<(), AnchorError> {
        self.tx.send(event).map_err(|_| AnchorError::Detached)
    }
}

/// Resolves every open thread of one attached document on each mutation.
pub struct AnchorPipeline<D, S> {
    document: D,
    reporter: OutdatedReporter<S>,
    connection: ConnectionMonitor,
    config: PipelineConfig,
    tx: UnboundedSender<PipelineEvent>,
    rx: UnboundedReceiver<PipelineEvent>,
    subscription: Option<MutationSubscription>,
    publisher: watch::Sender<ResolvedView>,
    pending: Vec<Unanchored>,
    generation: u64,
}

impl<D, S> AnchorPipeline<D, S>
where
    D: ReplicatedDocument,
    S: ThreadStore,
{
    /// Attach to `document`, register the mutation listener and publish the
    /// current text.
    pub fn attach(document: D, store: S, config: PipelineConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = document.subscribe_mutations(MutationNotifier::new(tx.clone()));
        let (publisher, _) = watch::channel(ResolvedView::default());

        let mut pipeline = Self {
            document,
            reporter: OutdatedReporter::new(store),
            connection: ConnectionMonitor::new(),
            config,
            tx,
            rx,
            subscription: Some(subscription),
            publisher,
            pending: Vec::new(),
            generation: 0,
        };
        pipeline.pass();
        tracing::debug!("comment pipeline attached");
        pipeline
    }

    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            tx: self.tx.clone(),
        }
    }

    /// Receiver for published views. Starts at the latest view.
    pub fn subscribe(&self) -> watch::Receiver<ResolvedView> {
        self.publisher.subscribe()
    }

    pub fn view(&self) -> ResolvedView {
        self.publisher.borrow().clone()
    }

    /// Spans as of the latest processed mutation.
    pub fn resolved_spans(&self) -> Arc<[ResolvedSpan]> {
        self.publisher.borrow().spans.clone()
    }

    /// Text as of the latest processed mutation.
    pub fn document_text(&self) -> Arc<str> {
        self.publisher.borrow().text.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.current_state()
    }

    pub fn is_authoritative(&self) -> bool {
        self.connection.is_authoritative()
    }

    /// Whether the session has been synced at least once.
    pub fn initial_load_done(&self) -> bool {
        self.connection.initial_load_done()
    }

    /// Threads that failed to resolve in the last pass while not synced.
    pub fn pending(&self) -> &[Unanchored] {
        &self.pending
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn store(&self) -> &S {
        self.reporter.store()
    }

    /// Run one resolution pass now.
    pub fn recompute(&mut self) -> Result<PassSummary, AnchorError> {
        if !self.is_attached() {
            return Err(AnchorError::Detached);
        }
        Ok(self.pass())
    }

    /// Drain the queue and recompute as needed.
    ///
    /// Returns the number of passes run. Events queued after a detach request
    /// are discarded.
    pub fn process_pending(&mut self) -> Result<usize, AnchorError> {
        if !self.is_attached() {
            return Err(AnchorError::Detached);
        }
        let mut batch = Batch::default();
        while let Ok(event) = self.rx.try_recv() {
            if !self.apply(event, &mut batch) {
                break;
            }
        }
        Ok(self.finish(batch))
    }

    /// Process events until detached.
    ///
    /// Each wake-up drains whatever else is already queued, so a burst of
    /// mutations costs one pass.
    pub async fn run(mut self) -> Result<(), AnchorError> {
        if !self.is_attached() {
            return Err(AnchorError::Detached);
        }
        while let Some(event) = self.rx.recv().await {
            let mut batch = Batch::default();
            let mut keep_going = self.apply(event, &mut batch);
            while keep_going {
                match self.rx.try_recv() {
                    Ok(event) => keep_going = self.apply(event, &mut batch),
                    Err(_) => break,
                }
            }
            self.finish(batch);
            if !self.is_attached() {
                break;
            }
        }
        Ok(())
    }

    /// Unregister the document listener. Nothing is published afterwards.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            tracing::debug!(generation = self.generation, "comment pipeline detached");
        }
    }

    /// Apply one event to the batch. Returns false once detached.
    fn apply(&mut self, event: PipelineEvent, batch: &mut Batch) -> bool {
        let wants_pass = match event {
            PipelineEvent::Mutation => true,
            PipelineEvent::ThreadsChanged => true,
            PipelineEvent::Connection(state) => match self.connection.apply(state) {
                Some(transition) => {
                    transition.first_load
                        || (transition.became_authoritative() && self.config.recompute_on_sync)
                }
                None => false,
            },
            PipelineEvent::Detach => {
                self.detach();
                batch.dirty = false;
                return false;
            }
        };

        if wants_pass {
            if self.config.coalesce {
                batch.dirty = true;
            } else {
                self.pass();
                batch.passes += 1;
            }
        }
        true
    }

    fn finish(&mut self, batch: Batch) -> usize {
        if batch.dirty && self.is_attached() {
            self.pass();
            return batch.passes + 1;
        }
        batch.passes
    }

    fn pass(&mut self) -> PassSummary {
        let text: Arc<str> = Arc::from(self.document.text());
        let snapshot = self.reporter.store().snapshot();
        let state = self.connection.current_state();
        self.generation += 1;

        let mut summary = PassSummary {
            generation: self.generation,
            ..PassSummary::default()
        };

        // Spans from an earlier pass are offsets into older text, so a
        // loading thread list publishes the new text with no spans.
        if snapshot.mode.is_loading() {
            summary.skipped = true;
            self.pending.clear();
            self.publish(Arc::from(Vec::new()), text);
            tracing::trace!(generation = summary.generation, "thread list loading, spans cleared");
            return summary;
        }

        let pass = resolve_threads(&self.document, &snapshot, state);
        summary.spans = pass.spans.len();
        summary.outdated = pass.outdated.len();
        summary.pending = pass.pending.len();

        self.publish(Arc::from(pass.spans), text);
        self.reporter.report_all(&pass.outdated);
        self.pending = pass.pending;

        tracing::debug!(
            generation = summary.generation,
            state = state.as_str(),
            spans = summary.spans,
            outdated = summary.outdated,
            pending = summary.pending,
            "recomputed comment spans"
        );
        summary
    }

    fn publish(&self, spans: Arc<[ResolvedSpan]>, text: Arc<str>) {
        self.publisher.send_replace(ResolvedView {
            spans,
            text,
            generation: self.generation,
        });
    }
}

impl<D, S> Drop for AnchorPipeline<D, S> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

#[derive(Default)]
struct Batch {
    dirty: bool,
    passes: usize,
}
