//! Loro backend for weaver comment anchoring.
//!
//! This crate provides:
//! - `LoroCommentDocument`: a Loro text container implementing
//!   `ReplicatedDocument` and `AnchorCodec` from weaver-comments-core
//! - `CrdtError`: errors from the Loro side (import, export, edits)

mod document;
mod error;

pub use document::LoroCommentDocument;
pub use error::CrdtError;

// Re-export Loro types that consumers need
pub use loro::{ExportMode, LoroDoc, LoroText, VersionVector};
