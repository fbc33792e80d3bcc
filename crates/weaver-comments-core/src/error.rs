//! Error types for comment anchoring.

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while running the anchor pipeline.
///
/// Anchors that fail to resolve are not errors; they are reported through
/// the thread store instead.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum AnchorError {
    /// The pipeline was detached from its document.
    #[error("pipeline is detached from its document")]
    #[diagnostic(
        code(weaver::comments::detached),
        help("create a new pipeline after re-attaching to the document")
    )]
    Detached,

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    #[diagnostic(code(weaver::comments::config))]
    Config(String),

    /// The document backend failed.
    #[error("document backend error: {0}")]
    #[diagnostic(code(weaver::comments::backend))]
    Backend(String),
}
