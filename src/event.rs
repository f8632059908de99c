/// Event records for the scheduling core.
///
/// An `Event` names *what* should happen (`operation`), *to whom*
/// (`destination`) and *when* (`time`). Its payload is owned by the
/// simulation's `PayloadRetainer` under the event's `EventId`.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::entity::EntityId;
use crate::time::VirtualTime;

// ── Event ID ──────────────────────────────────────────────────────────

/// Stable identity of a scheduled event.
///
/// IDs are strictly increasing per simulation, so they also serve as the
/// secondary ordering key: two events due at the same time dispatch in
/// the order they were scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(u64);

impl EventId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

// ── Event ID Generator ───────────────────────────────────────────────

/// Strictly-increasing event-ID generator. One per simulation.
#[derive(Debug, Clone, Default)]
pub struct EventIdGen {
    next: u64,
}

impl EventIdGen {
    pub fn new() -> Self {
        EventIdGen { next: 0 }
    }

    /// Mint the next event ID.
    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }

    /// Peek at the next ID without consuming it.
    pub fn peek(&self) -> EventId {
        EventId(self.next)
    }
}

// ── Operation ─────────────────────────────────────────────────────────

/// Opaque selector naming the action an entity should perform.
///
/// Entities advertise the operations they accept when they are
/// registered; scheduling an operation the destination does not list is
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Operation(Cow<'static, str>);

impl Operation {
    /// An operation from a static name. Usable in `const` items.
    pub const fn from_static(name: &'static str) -> Self {
        Operation(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Operation(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Operation {
    fn from(name: &'static str) -> Self {
        Operation::from_static(name)
    }
}

impl From<String> for Operation {
    fn from(name: String) -> Self {
        Operation(Cow::Owned(name))
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Event ─────────────────────────────────────────────────────────────

/// A single scheduled unit of work.
///
/// Fields are private: an event's dispatch time is fixed when it is
/// created and cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    id: EventId,
    time: VirtualTime,
    operation: Operation,
    destination: EntityId,
}

impl Event {
    pub fn new(id: EventId, time: VirtualTime, operation: Operation, destination: EntityId) -> Self {
        Event {
            id,
            time,
            operation,
            destination,
        }
    }

    #[inline]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Absolute virtual time at which the event is due.
    #[inline]
    pub fn time(&self) -> VirtualTime {
        self.time
    }

    #[inline]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    #[inline]
    pub fn destination(&self) -> EntityId {
        self.destination
    }

    /// The queue ordering key.
    #[inline]
    pub(crate) fn key(&self) -> (VirtualTime, EventId) {
        (self.time, self.id)
    }
}

/// Ordering: smallest `(time, id)` first. The remaining fields only break
/// ties between records sharing an ID, keeping `Ord` consistent with `Eq`.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key()
            .cmp(&other.key())
            .then_with(|| self.destination.cmp(&other.destination))
            .then_with(|| self.operation.cmp(&other.operation))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} → {}",
            self.id, self.time, self.operation, self.destination
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(id: u64, time: u64) -> Event {
        Event::new(
            EventId::new(id),
            VirtualTime::new(time),
            Operation::from_static("tick"),
            EntityId::new(0),
        )
    }

    #[test]
    fn test_event_id_monotonic() {
        let mut gen = EventIdGen::new();
        let a = gen.next_id();
        let b = gen.next_id();
        assert_eq!(gen.peek().raw(), 2);
        assert!(a < b);
        assert_eq!(a.raw(), 0);
    }

    #[test]
    fn test_event_ordering_by_time() {
        assert!(ev(1, 10) < ev(0, 20));
    }

    #[test]
    fn test_event_ordering_tiebreak_by_id() {
        assert!(ev(0, 10) < ev(1, 10));
    }

    #[test]
    fn test_ordering_agrees_with_equality() {
        let a = ev(3, 10);
        let b = Event::new(
            EventId::new(3),
            VirtualTime::new(10),
            Operation::from_static("tick"),
            EntityId::new(1),
        );
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_operation_equality_ignores_ownership() {
        let borrowed = Operation::from_static("deliver");
        let owned = Operation::new(String::from("deliver"));
        assert_eq!(borrowed, owned);
        assert_eq!(owned.as_str(), "deliver");
    }

    #[test]
    fn test_event_display() {
        let e = ev(42, 100);
        assert_eq!(e.to_string(), "E#42 T=100 tick → N0");
    }
}
