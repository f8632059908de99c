//! Simulation configuration.

/// When destinations are checked against the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidationPolicy {
    /// Reject unknown destinations and unsupported operations at
    /// `schedule`; nothing undispatchable is ever queued.
    #[default]
    Eager,
    /// Accept anything at `schedule` and check when the event fires. A
    /// bad target then fails the `run` call that reaches it.
    Lazy,
}

/// Configuration for a [`Simulation`](crate::Simulation).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct SimulationConfig {
    pub validation: ValidationPolicy,
    /// Keep a [`TraceEntry`](crate::TraceEntry) per dispatch.
    pub record_trace: bool,
}

impl SimulationConfig {
    /// Eager validation, no trace. Same as `Default`.
    pub fn eager() -> Self {
        Self::default()
    }

    /// Lazy validation, no trace.
    pub fn lazy() -> Self {
        SimulationConfig {
            validation: ValidationPolicy::Lazy,
            ..Self::default()
        }
    }

    pub fn with_trace(mut self, record: bool) -> Self {
        self.record_trace = record;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_eager_without_trace() {
        let config = SimulationConfig::default();
        assert_eq!(config.validation, ValidationPolicy::Eager);
        assert!(!config.record_trace);
        assert_eq!(config, SimulationConfig::eager());
    }

    #[test]
    fn test_lazy_with_trace() {
        let config = SimulationConfig::lazy().with_trace(true);
        assert_eq!(config.validation, ValidationPolicy::Lazy);
        assert!(config.record_trace);
    }
}
