//! Loro-backed replicated document for comment anchoring.

use std::borrow::Cow;
use std::sync::Arc;

use loro::cursor::{Cursor, Side};
use loro::event::DiffEvent;
use loro::{ExportMode, LoroDoc, LoroText, VersionVector};
use weaver_comments_core::{
    AnchorCodec, DocumentConfig, MutationNotifier, MutationSubscription, RelativePosition,
    ReplicatedDocument, Resolution,
};

use crate::CrdtError;

/// A `LoroDoc` with the text container that comments are anchored to.
///
/// Relative positions are encoded Loro cursors. A cursor keeps pointing at
/// the same character across concurrent edits, and at the place a deleted
/// character used to be once it is gone.
#[derive(Clone)]
pub struct LoroCommentDocument {
    doc: LoroDoc,
    text: LoroText,
}

impl LoroCommentDocument {
    /// Create a new empty document using the default container name.
    pub fn new() -> Self {
        Self::from_doc(LoroDoc::new(), &DocumentConfig::default())
    }

    /// Wrap an existing document.
    ///
    /// Clones of a `LoroDoc` share state, so the replication session can keep
    /// applying updates to its own handle.
    pub fn from_doc(doc: LoroDoc, config: &DocumentConfig) -> Self {
        let text = doc.get_text(config.text_container.as_str());
        Self { doc, text }
    }

    /// Create a document from an existing Loro snapshot.
    pub fn from_snapshot(snapshot: &[u8], config: &DocumentConfig) -> Result<Self, CrdtError> {
        let doc = LoroDoc::new();
        doc.import(snapshot)
            .map_err(|e| CrdtError::Import(e.to_string()))?;
        Ok(Self::from_doc(doc, config))
    }

    /// Get the underlying Loro document.
    pub fn doc(&self) -> &LoroDoc {
        &self.doc
    }

    /// Get the text container.
    pub fn content(&self) -> &LoroText {
        &self.text
    }

    /// Insert text at a char offset and commit.
    pub fn insert(&self, char_offset: usize, text: &str) -> Result<(), CrdtError> {
        self.text.insert(char_offset, text)?;
        self.doc.commit();
        Ok(())
    }

    /// Delete `len` chars starting at `char_offset` and commit.
    pub fn delete(&self, char_offset: usize, len: usize) -> Result<(), CrdtError> {
        self.text.delete(char_offset, len)?;
        self.doc.commit();
        Ok(())
    }

    /// Export full snapshot.
    pub fn export_snapshot(&self) -> Result<Vec<u8>, CrdtError> {
        self.doc
            .export(ExportMode::Snapshot)
            .map_err(|e| CrdtError::Export(e.to_string()))
    }

    /// Export updates since given version.
    pub fn export_updates_since(&self, version: &VersionVector) -> Option<Vec<u8>> {
        if *version == self.doc.oplog_vv() {
            return None;
        }

        let updates = self
            .doc
            .export(ExportMode::Updates {
                from: Cow::Owned(version.clone()),
            })
            .ok()?;

        if updates.is_empty() {
            return None;
        }

        Some(updates)
    }

    /// Import remote changes.
    pub fn import(&self, data: &[u8]) -> Result<(), CrdtError> {
        self.doc
            .import(data)
            .map_err(|e| CrdtError::Import(e.to_string()))?;
        Ok(())
    }

    /// Get current version vector.
    pub fn version(&self) -> VersionVector {
        self.doc.oplog_vv()
    }
}

impl Default for LoroCommentDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl AnchorCodec for LoroCommentDocument {
    fn encode(&self, offset: usize) -> Option<RelativePosition> {
        if offset > self.text.len_unicode() {
            return None;
        }
        let cursor = self.text.get_cursor(offset, Side::Middle)?;
        Some(RelativePosition::from_bytes(cursor.encode()))
    }

    fn resolve(&self, position: &RelativePosition) -> Resolution {
        let cursor = match Cursor::decode(position.as_bytes()) {
            Ok(cursor) => cursor,
            Err(e) => {
                tracing::warn!(error = %e, "failed to decode relative position");
                return Resolution::Unresolvable;
            }
        };

        match self.doc.get_cursor_pos(&cursor) {
            Ok(result) => Resolution::Resolved(result.current.pos),
            Err(e) => {
                tracing::trace!(error = ?e, "cursor no longer resolvable");
                Resolution::Unresolvable
            }
        }
    }
}

impl ReplicatedDocument for LoroCommentDocument {
    fn text(&self) -> String {
        self.text.to_string()
    }

    fn len_chars(&self) -> usize {
        self.text.len_unicode()
    }

    fn subscribe_mutations(&self, notifier: MutationNotifier) -> MutationSubscription {
        // Fires after each committed local transaction and each import.
        let sub = self
            .doc
            .subscribe_root(Arc::new(move |_event: DiffEvent<'_>| {
                notifier.notify();
            }));
        MutationSubscription::new(move || drop(sub))
    }
}
