//! In-memory replicated text used by the unit tests.
//!
//! Characters are never physically removed, only tombstoned, so positions
//! pointing at deleted characters still resolve to where they used to be.

use std::sync::{Arc, Mutex};

use crate::document::{MutationNotifier, MutationSubscription, ReplicatedDocument};
use crate::position::{AnchorCodec, RelativePosition, Resolution};

const END_TAG: u8 = 0;
const CHAR_TAG: u8 = 1;

#[derive(Clone, Debug)]
struct Item {
    id: u64,
    ch: char,
    alive: bool,
}

#[derive(Default)]
struct Inner {
    items: Vec<Item>,
    next_id: u64,
    listeners: Vec<(u64, MutationNotifier)>,
    next_listener: u64,
}

impl Inner {
    fn alive_index(&self, offset: usize) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.alive)
            .nth(offset)
            .map(|(idx, _)| idx)
    }

    fn len(&self) -> usize {
        self.items.iter().filter(|item| item.alive).count()
    }
}

#[derive(Clone, Default)]
pub(crate) struct SimDocument {
    inner: Arc<Mutex<Inner>>,
}

impl SimDocument {
    pub(crate) fn new(text: &str) -> Self {
        let doc = Self::default();
        {
            let mut inner = doc.inner.lock().unwrap();
            for ch in text.chars() {
                let id = inner.next_id;
                inner.next_id += 1;
                inner.items.push(Item { id, ch, alive: true });
            }
        }
        doc
    }

    pub(crate) fn insert(&self, offset: usize, text: &str) {
        let notifiers = {
            let mut inner = self.inner.lock().unwrap();
            let at = inner.alive_index(offset).unwrap_or(inner.items.len());
            for (i, ch) in text.chars().enumerate() {
                let id = inner.next_id;
                inner.next_id += 1;
                inner.items.insert(at + i, Item { id, ch, alive: true });
            }
            inner.listeners.clone()
        };
        notify_all(&notifiers);
    }

    pub(crate) fn delete(&self, start: usize, end: usize) {
        let notifiers = {
            let mut inner = self.inner.lock().unwrap();
            let mut seen = 0;
            for item in inner.items.iter_mut().filter(|item| item.alive) {
                if seen >= start && seen < end {
                    item.alive = false;
                }
                seen += 1;
            }
            inner.listeners.clone()
        };
        notify_all(&notifiers);
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.inner.lock().unwrap().listeners.len()
    }
}

fn notify_all(listeners: &[(u64, MutationNotifier)]) {
    for (_, notifier) in listeners {
        notifier.notify();
    }
}

impl AnchorCodec for SimDocument {
    fn encode(&self, offset: usize) -> Option<RelativePosition> {
        let inner = self.inner.lock().unwrap();
        if offset == inner.len() {
            return Some(RelativePosition::from_bytes(vec![END_TAG]));
        }
        let idx = inner.alive_index(offset)?;
        let mut bytes = vec![CHAR_TAG];
        bytes.extend_from_slice(&inner.items[idx].id.to_le_bytes());
        Some(RelativePosition::from_bytes(bytes))
    }

    fn resolve(&self, position: &RelativePosition) -> Resolution {
        let inner = self.inner.lock().unwrap();
        match position.as_bytes() {
            [END_TAG] => Resolution::Resolved(inner.len()),
            [CHAR_TAG, rest @ ..] if rest.len() == 8 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(rest);
                let id = u64::from_le_bytes(raw);
                let Some(idx) = inner.items.iter().position(|item| item.id == id) else {
                    return Resolution::Unresolvable;
                };
                let before = inner.items[..idx].iter().filter(|item| item.alive).count();
                Resolution::Resolved(before)
            }
            _ => Resolution::Unresolvable,
        }
    }
}

impl ReplicatedDocument for SimDocument {
    fn text(&self) -> String {
        let inner = self.inner.lock().unwrap();
        inner
            .items
            .iter()
            .filter(|item| item.alive)
            .map(|item| item.ch)
            .collect()
    }

    fn len_chars(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    fn subscribe_mutations(&self, notifier: MutationNotifier) -> MutationSubscription {
        let key = {
            let mut inner = self.inner.lock().unwrap();
            let key = inner.next_listener;
            inner.next_listener += 1;
            inner.listeners.push((key, notifier));
            key
        };
        let inner = self.inner.clone();
        MutationSubscription::new(move || {
            if let Ok(mut inner) = inner.lock() {
                inner.listeners.retain(|(k, _)| *k != key);
            }
        })
    }
}
