/// Virtual time for the simulation.
///
/// A logical timestamp with no dependency on `std::time`. Time advances
/// only when the driver loop extracts an event for dispatch.

/// A point in simulation time, measured in integer ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualTime(u64);

impl VirtualTime {
    /// The zero-point of simulation time.
    pub const ZERO: VirtualTime = VirtualTime(0);

    /// The latest representable time. `run` with this horizon never stops
    /// on the end-time condition.
    pub const MAX: VirtualTime = VirtualTime(u64::MAX);

    /// Create a new `VirtualTime` from a raw tick value.
    #[inline]
    pub fn new(ticks: u64) -> Self {
        VirtualTime(ticks)
    }

    /// Return the raw tick value.
    #[inline]
    pub fn ticks(self) -> u64 {
        self.0
    }

    /// The absolute time `delay` ticks after `self`.
    ///
    /// Returns `None` when the sum is not representable.
    #[inline]
    pub fn plus(self, delay: u64) -> Option<VirtualTime> {
        self.0.checked_add(delay).map(VirtualTime)
    }
}

impl From<u64> for VirtualTime {
    fn from(ticks: u64) -> Self {
        VirtualTime(ticks)
    }
}

impl std::fmt::Display for VirtualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T={}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_default_agree() {
        assert_eq!(VirtualTime::ZERO.ticks(), 0);
        assert_eq!(VirtualTime::default(), VirtualTime::ZERO);
    }

    #[test]
    fn test_ordering() {
        assert!(VirtualTime::new(10) < VirtualTime::new(20));
        assert!(VirtualTime::new(20) <= VirtualTime::MAX);
    }

    #[test]
    fn test_plus() {
        let t = VirtualTime::new(100);
        assert_eq!(t.plus(50), Some(VirtualTime::new(150)));
        assert_eq!(t.plus(0), Some(t));
    }

    #[test]
    fn test_plus_overflow() {
        assert!(VirtualTime::MAX.plus(1).is_none());
        assert!(VirtualTime::new(u64::MAX - 1).plus(2).is_none());
        assert_eq!(VirtualTime::new(u64::MAX - 1).plus(1), Some(VirtualTime::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(VirtualTime::new(42).to_string(), "T=42");
    }
}
