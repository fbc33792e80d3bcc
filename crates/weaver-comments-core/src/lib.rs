//! weaver-comments-core: comment thread anchoring for collaboratively edited
//! documents, without depending on a particular CRDT.
//!
//! Threads carry a pair of relative positions captured when they were
//! created. Every time the document changes, the pipeline maps those back to
//! live offsets and publishes the spans for rendering. Threads whose text was
//! removed are reported outdated, but only once the local replica is synced.
//!
//! This crate provides:
//! - `AnchorCodec` / `ReplicatedDocument` - the seams to the CRDT engine
//! - `ConnectionMonitor` - replication session state as seen by resolution
//! - `resolve_threads` - one pure resolution pass
//! - `AnchorPipeline` - mutation-driven recompute and publication
//! - `OutdatedReporter` / `ThreadStore` - reporting back to thread storage
//! - `MemoryThreadStore` - in-memory thread store

pub mod config;
pub mod connection;
pub mod document;
mod error;
pub mod pipeline;
pub mod position;
pub mod reporter;
pub mod resolver;
pub mod store;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{CommentsConfig, DocumentConfig, PipelineConfig, TelemetryConfig};
pub use connection::{ConnectionMonitor, ConnectionState, ConnectionTransition};
pub use document::{MutationNotifier, MutationSubscription, ReplicatedDocument};
pub use error::AnchorError;
pub use pipeline::{AnchorPipeline, PassSummary, PipelineEvent, PipelineHandle, ResolvedView};
pub use position::{AnchorCodec, RelativePosition, Resolution};
pub use reporter::{OutdatedReporter, ThreadStore};
pub use resolver::{AnchorSide, ResolutionPass, Unanchored, UnanchoredReason, resolve_threads};
pub use smol_str::SmolStr;
pub use store::MemoryThreadStore;
pub use types::{
    CommentMode, ResolvedSpan, Selection, Thread, ThreadId, ThreadSnapshot, ThreadStatus,
};

/// Result type for anchoring operations.
pub type Result<T> = std::result::Result<T, AnchorError>;
