//! Ownership of in-flight event payloads.

use std::collections::HashMap;

use crate::error::{SimError, SimResult};
use crate::event::EventId;

/// Owns the payload of every queued event, keyed by event identity.
///
/// An entry is added once when the event is scheduled and removed once
/// when the event is extracted for dispatch. Removal hands the payload
/// back by value, so it lives exactly as long as the dispatch scope that
/// took it, whether the handler succeeds or fails.
#[derive(Debug, Clone)]
pub struct PayloadRetainer<P> {
    payloads: HashMap<EventId, P>,
}

impl<P> PayloadRetainer<P> {
    pub fn new() -> Self {
        PayloadRetainer {
            payloads: HashMap::new(),
        }
    }

    /// Take ownership of `payload` for event `id`.
    ///
    /// A second entry for the same event is refused and the original
    /// payload kept.
    pub fn retain(&mut self, id: EventId, payload: P) -> SimResult<()> {
        if self.payloads.contains_key(&id) {
            return Err(SimError::DuplicatePayload(id));
        }
        self.payloads.insert(id, payload);
        Ok(())
    }

    /// Remove and return the payload for `id`.
    pub fn release(&mut self, id: EventId) -> Option<P> {
        self.payloads.remove(&id)
    }

    pub fn get(&self, id: EventId) -> Option<&P> {
        self.payloads.get(&id)
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.payloads.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Drop every retained payload.
    pub fn clear(&mut self) {
        self.payloads.clear();
    }
}

impl<P> Default for PayloadRetainer<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_retain_then_release_once() {
        let mut retainer = PayloadRetainer::new();
        let id = EventId::new(3);
        retainer.retain(id, "payload").unwrap();
        assert!(retainer.contains(id));
        assert_eq!(retainer.get(id), Some(&"payload"));

        assert_eq!(retainer.release(id), Some("payload"));
        assert_eq!(retainer.release(id), None);
        assert!(retainer.is_empty());
    }

    #[test]
    fn test_duplicate_is_refused() {
        let mut retainer = PayloadRetainer::new();
        let id = EventId::new(0);
        retainer.retain(id, 1u32).unwrap();
        let err = retainer.retain(id, 2u32).unwrap_err();
        assert!(matches!(err, SimError::DuplicatePayload(dup) if dup == id));
        assert_eq!(retainer.get(id), Some(&1));
        assert_eq!(retainer.len(), 1);
    }

    #[test]
    fn test_clear_drops_payloads() {
        let shared = Rc::new(());
        let mut retainer = PayloadRetainer::new();
        for i in 0..4 {
            retainer.retain(EventId::new(i), Rc::clone(&shared)).unwrap();
        }
        assert_eq!(Rc::strong_count(&shared), 5);
        retainer.clear();
        assert_eq!(Rc::strong_count(&shared), 1);
    }
}
