use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

struct Entry<F: ?Sized> {
    handler: Arc<F>,
    once: bool,
}

/// Handlers keyed by message type.
///
/// A type with no handlers has no slot at all: slots are created by the
/// first registration and deleted when their last handler goes. Handler
/// identity is pointer identity of the `Arc`.
pub struct HandlerRegistry<F: ?Sized> {
    slots: BTreeMap<String, Vec<Entry<F>>>,
}

impl<F: ?Sized> HandlerRegistry<F> {
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// Append `handler` after any existing handlers for `msg_type`.
    pub fn push(&mut self, msg_type: &str, handler: Arc<F>) {
        self.insert(msg_type, handler, false);
    }

    /// Append a handler that is dropped the first time it is dispatched.
    pub fn push_once(&mut self, msg_type: &str, handler: Arc<F>) {
        self.insert(msg_type, handler, true);
    }

    /// Make `handler` the only handler for `msg_type`.
    pub fn replace(&mut self, msg_type: &str, handler: Arc<F>) {
        self.slots.insert(
            msg_type.to_string(),
            vec![Entry {
                handler,
                once: false,
            }],
        );
    }

    /// Like [`Self::replace`], but one-shot.
    pub fn replace_once(&mut self, msg_type: &str, handler: Arc<F>) {
        self.slots.insert(
            msg_type.to_string(),
            vec![Entry {
                handler,
                once: true,
            }],
        );
    }

    /// Remove the first registration of exactly this handler.
    pub fn remove_one(&mut self, msg_type: &str, handler: &Arc<F>) -> bool {
        let Some(entries) = self.slots.get_mut(msg_type) else {
            return false;
        };
        let Some(index) = entries
            .iter()
            .position(|entry| Arc::ptr_eq(&entry.handler, handler))
        else {
            return false;
        };
        entries.remove(index);
        if entries.is_empty() {
            self.slots.remove(msg_type);
        }
        true
    }

    /// Remove every handler for `msg_type`.
    pub fn remove_all(&mut self, msg_type: &str) -> bool {
        self.slots.remove(msg_type).is_some()
    }

    /// Handlers to run for one inbound message, in registration order.
    ///
    /// One-shot entries leave the registry here, before anything runs, so
    /// a second message of the same type cannot reach them.
    pub fn take_for_dispatch(&mut self, msg_type: &str) -> Vec<Arc<F>> {
        let Some(entries) = self.slots.get_mut(msg_type) else {
            return Vec::new();
        };
        let selected = entries
            .iter()
            .map(|entry| Arc::clone(&entry.handler))
            .collect();
        entries.retain(|entry| !entry.once);
        if entries.is_empty() {
            self.slots.remove(msg_type);
        }
        selected
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn contains(&self, msg_type: &str) -> bool {
        self.slots.contains_key(msg_type)
    }

    pub fn count(&self, msg_type: &str) -> usize {
        self.slots.get(msg_type).map_or(0, Vec::len)
    }

    /// Registered types in lexical order.
    pub fn types(&self) -> Vec<String> {
        self.slots.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn insert(&mut self, msg_type: &str, handler: Arc<F>, once: bool) {
        self.slots
            .entry(msg_type.to_string())
            .or_default()
            .push(Entry { handler, once });
    }
}

impl<F: ?Sized> Default for HandlerRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for HandlerRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(ty, entries)| (ty, entries.len())))
            .finish()
    }
}
