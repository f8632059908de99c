//! Entity timeouts: one-shot and periodic timers.
//!
//! A timeout is armed by queueing an ordinary event with the [`TIMEOUT`]
//! operation at its owner. The event carries no payload; the timer table
//! maps it back to the timeout. Cancelling only marks the timer inactive.
//! Its pending firing stays queued and is discarded when it comes up.

use std::collections::{BTreeMap, HashMap};

use crate::entity::EntityId;
use crate::event::{EventId, Operation};

/// Operation carried by timer firings. Entities need not list it.
pub const TIMEOUT: Operation = Operation::from_static("timeout");

/// Identity of a timeout, stable across periodic re-arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeoutId(u64);

impl TimeoutId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TimeoutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TO#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Timer {
    pub(crate) owner: EntityId,
    pub(crate) delay: u64,
    pub(crate) periodic: bool,
    pub(crate) active: bool,
}

/// Live timers and the queued events that fire them.
#[derive(Debug, Default)]
pub(crate) struct TimerTable {
    timers: BTreeMap<TimeoutId, Timer>,
    firings: HashMap<EventId, TimeoutId>,
    next: u64,
}

impl TimerTable {
    pub(crate) fn create(&mut self, owner: EntityId, delay: u64, periodic: bool) -> TimeoutId {
        let id = TimeoutId(self.next);
        self.next += 1;
        self.timers.insert(
            id,
            Timer {
                owner,
                delay,
                periodic,
                active: true,
            },
        );
        id
    }

    /// Record that `event` fires `timeout`.
    pub(crate) fn bind(&mut self, event: EventId, timeout: TimeoutId) {
        self.firings.insert(event, timeout);
    }

    /// If `event` is a timer firing, unbind it and return its timeout.
    pub(crate) fn take_firing(&mut self, event: EventId) -> Option<TimeoutId> {
        self.firings.remove(&event)
    }

    pub(crate) fn get(&self, id: TimeoutId) -> Option<&Timer> {
        self.timers.get(&id)
    }

    pub(crate) fn remove(&mut self, id: TimeoutId) -> Option<Timer> {
        self.timers.remove(&id)
    }

    /// Mark a timer inactive. `false` if it was unknown or already inactive.
    pub(crate) fn cancel(&mut self, id: TimeoutId) -> bool {
        match self.timers.get_mut(&id) {
            Some(timer) if timer.active => {
                timer.active = false;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_active(&self, id: TimeoutId) -> bool {
        self.timers.get(&id).is_some_and(|timer| timer.active)
    }

    pub(crate) fn clear(&mut self) {
        self.timers.clear();
        self.firings.clear();
        self.next = 0;
    }
}
