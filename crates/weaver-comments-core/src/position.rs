//! Relative positions and the codec that turns them into live offsets.
//!
//! The codec is the only piece of the replicated document engine the anchor
//! logic depends on. Implementations live next to the CRDT they wrap (see
//! `weaver-comments-crdt` for Loro).

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::Selection;

/// An edit-resilient reference to a specific character instance.
///
/// The bytes are opaque outside the codec that produced them. They are
/// persisted with the thread and never change after creation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelativePosition(Bytes);

impl RelativePosition {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

/// Outcome of resolving one relative position against a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Live char offset in the current snapshot.
    Resolved(usize),
    /// The position could not be mapped back into the document.
    Unresolvable,
}

impl Resolution {
    pub fn offset(self) -> Option<usize> {
        match self {
            Self::Resolved(offset) => Some(offset),
            Self::Unresolvable => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl From<Option<usize>> for Resolution {
    fn from(offset: Option<usize>) -> Self {
        offset.map_or(Self::Unresolvable, Self::Resolved)
    }
}

/// Encode/resolve contract of the replicated document engine.
///
/// All offsets are in Unicode scalar values (chars).
pub trait AnchorCodec {
    /// Capture a relative position for the character at `offset`.
    ///
    /// `offset == len` is valid and denotes the end of the text. Returns
    /// `None` if the offset is out of bounds.
    fn encode(&self, offset: usize) -> Option<RelativePosition>;

    /// Map a relative position back to a live offset.
    ///
    /// Must not fail for malformed input: bytes the codec cannot decode are
    /// reported as [`Resolution::Unresolvable`].
    fn resolve(&self, position: &RelativePosition) -> Resolution;

    /// Encode both ends of a range, for creating a new thread.
    fn selection(&self, anchor: usize, head: usize) -> Option<Selection> {
        Some(Selection::new(self.encode(anchor)?, self.encode(head)?))
    }
}

impl<C: AnchorCodec + ?Sized> AnchorCodec for &C {
    fn encode(&self, offset: usize) -> Option<RelativePosition> {
        (**self).encode(offset)
    }

    fn resolve(&self, position: &RelativePosition) -> Resolution {
        (**self).resolve(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_from_option() {
        assert_eq!(Resolution::from(Some(4)), Resolution::Resolved(4));
        assert_eq!(Resolution::from(None), Resolution::Unresolvable);
        assert_eq!(Resolution::Resolved(4).offset(), Some(4));
        assert!(!Resolution::Unresolvable.is_resolved());
    }

    #[test]
    fn test_relative_position_bytes() {
        let pos = RelativePosition::from_bytes(vec![1u8, 2, 3]);
        assert_eq!(pos.as_bytes(), &[1, 2, 3]);
        assert_eq!(pos.clone().into_bytes().len(), 3);
    }
}
