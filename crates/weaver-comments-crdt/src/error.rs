//! Error types for the Loro-backed document.

use miette::Diagnostic;
use thiserror::Error;
use weaver_comments_core::AnchorError;

/// Errors that can occur during CRDT operations.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum CrdtError {
    /// Failed to import CRDT data.
    #[error("failed to import CRDT data: {0}")]
    #[diagnostic(code(weaver::comments::crdt::import))]
    Import(String),

    /// Failed to export CRDT data.
    #[error("failed to export CRDT data: {0}")]
    #[diagnostic(code(weaver::comments::crdt::export))]
    Export(String),

    /// A text edit was rejected.
    #[error("edit failed: {0}")]
    #[diagnostic(code(weaver::comments::crdt::edit))]
    Edit(String),
}

impl From<loro::LoroError> for CrdtError {
    fn from(e: loro::LoroError) -> Self {
        CrdtError::Edit(e.to_string())
    }
}

impl From<CrdtError> for AnchorError {
    fn from(e: CrdtError) -> Self {
        AnchorError::Backend(e.to_string())
    }
}
