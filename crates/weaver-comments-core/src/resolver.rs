//! Anchor resolution: relative selections to live spans.
//!
//! A pass is a pure function of the document snapshot, the thread snapshot
//! and the connection state. It keeps no memory of earlier passes, so the
//! same inputs always produce the same output.

use crate::connection::ConnectionState;
use crate::document::ReplicatedDocument;
use crate::position::{RelativePosition, Resolution};
use crate::types::{ResolvedSpan, Selection, Thread, ThreadId, ThreadSnapshot};

/// Which end of a selection failed to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnchorSide {
    Anchor,
    Head,
}

/// Why a thread produced no span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnanchoredReason {
    /// One end could not be mapped into the document.
    Unresolvable { side: AnchorSide },
    /// Both ends resolved to the same offset: the enclosed text is gone.
    Degenerate { offset: usize },
}

impl UnanchoredReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unresolvable { .. } => "unresolvable",
            Self::Degenerate { .. } => "degenerate",
        }
    }
}

/// A thread whose selection did not yield a span this pass.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Unanchored {
    pub thread_id: ThreadId,
    pub reason: UnanchoredReason,
}

/// Output of one resolution pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionPass {
    /// Spans in thread order.
    pub spans: Vec<ResolvedSpan>,
    /// Threads to report as outdated. Only filled under a synced connection.
    pub outdated: Vec<Unanchored>,
    /// Threads that failed to resolve before sync; retried on a later pass.
    pub pending: Vec<Unanchored>,
}

/// Resolve every open, anchored thread in `snapshot` against `doc`.
///
/// Threads without a selection and threads that are not open are skipped.
/// A failure on one thread never affects the others.
pub fn resolve_threads<D>(
    doc: &D,
    snapshot: &ThreadSnapshot,
    state: ConnectionState,
) -> ResolutionPass
where
    D: ReplicatedDocument + ?Sized,
{
    let len = doc.len_chars();
    let active = snapshot.mode.active_thread();
    let authoritative = state.is_authoritative();
    let mut pass = ResolutionPass::default();

    for thread in &snapshot.threads {
        let Some(selection) = evaluable_selection(thread) else {
            continue;
        };

        match resolve_selection(doc, len, selection) {
            Ok((a, b)) => {
                let is_active = active == Some(&thread.id);
                match ResolvedSpan::new(thread.id.clone(), a, b, is_active) {
                    Some(span) => {
                        tracing::trace!(
                            thread = %thread.id,
                            start = span.start,
                            end = span.end,
                            active = is_active,
                            "resolved thread anchor"
                        );
                        pass.spans.push(span);
                    }
                    None => unanchored(
                        &mut pass,
                        authoritative,
                        &thread.id,
                        UnanchoredReason::Degenerate { offset: a },
                    ),
                }
            }
            Err(side) => unanchored(
                &mut pass,
                authoritative,
                &thread.id,
                UnanchoredReason::Unresolvable { side },
            ),
        }
    }

    pass
}

fn evaluable_selection(thread: &Thread) -> Option<&Selection> {
    if !thread.status.is_open() {
        return None;
    }
    thread.selection.as_ref()
}

fn resolve_selection<D>(
    doc: &D,
    len: usize,
    selection: &Selection,
) -> Result<(usize, usize), AnchorSide>
where
    D: ReplicatedDocument + ?Sized,
{
    let anchor = resolve_side(doc, len, &selection.anchor).ok_or(AnchorSide::Anchor)?;
    let head = resolve_side(doc, len, &selection.head).ok_or(AnchorSide::Head)?;
    Ok((anchor, head))
}

fn resolve_side<D>(doc: &D, len: usize, position: &RelativePosition) -> Option<usize>
where
    D: ReplicatedDocument + ?Sized,
{
    match doc.resolve(position) {
        Resolution::Resolved(offset) if offset <= len => Some(offset),
        Resolution::Resolved(offset) => {
            tracing::warn!(offset, len, "codec resolved a position past the end of the document");
            None
        }
        Resolution::Unresolvable => None,
    }
}

fn unanchored(
    pass: &mut ResolutionPass,
    authoritative: bool,
    thread_id: &ThreadId,
    reason: UnanchoredReason,
) {
    let entry = Unanchored {
        thread_id: thread_id.clone(),
        reason,
    };
    if authoritative {
        pass.outdated.push(entry);
    } else {
        tracing::trace!(thread = %thread_id, reason = reason.as_str(), "anchor not resolvable yet");
        pass.pending.push(entry);
    }
}
