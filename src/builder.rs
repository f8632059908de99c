/// Fluent builder for simulation setup.
///
/// Collects configuration, entities and seed events, then assembles a
/// ready-to-run `Simulation` in one call.

use crate::config::{SimulationConfig, ValidationPolicy};
use crate::entity::{Entity, EntityId, Recorder, Relay};
use crate::error::SimResult;
use crate::event::Operation;
use crate::simulation::Simulation;

// ── SimulationBuilder ─────────────────────────────────────────────────

/// Builder for a [`Simulation`].
///
/// # Example
/// ```rust
/// use kairos::{SimulationBuilder, VirtualTime, DELIVER};
///
/// let mut sim = SimulationBuilder::<String>::new()
///     .recorder(0)
///     .relay(1, 0, 5)
///     .schedule(DELIVER, 1, 0, "hello".to_string())
///     .build()
///     .unwrap();
///
/// sim.run(VirtualTime::new(100)).unwrap();
/// assert_eq!(sim.now(), VirtualTime::new(5));
/// ```
pub struct SimulationBuilder<P> {
    config: SimulationConfig,
    entities: Vec<(EntityId, Box<dyn Entity<P>>)>,
    events: Vec<(Operation, EntityId, u64, P)>,
}

impl<P: Clone + 'static> SimulationBuilder<P> {
    pub fn new() -> Self {
        SimulationBuilder {
            config: SimulationConfig::default(),
            entities: Vec::new(),
            events: Vec::new(),
        }
    }

    // ── Configuration ─────────────────────────────────────────

    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn validation(mut self, policy: ValidationPolicy) -> Self {
        self.config.validation = policy;
        self
    }

    pub fn record_trace(mut self, record: bool) -> Self {
        self.config.record_trace = record;
        self
    }

    // ── Entities ──────────────────────────────────────────────

    /// Register a custom entity under `id`.
    pub fn entity<E>(mut self, id: u64, entity: E) -> Self
    where
        E: Entity<P> + 'static,
    {
        self.entities.push((EntityId::new(id), Box::new(entity)));
        self
    }

    /// Register an entity built from its own ID.
    pub fn entity_with<F, E>(self, id: u64, factory: F) -> Self
    where
        F: FnOnce(EntityId) -> E,
        E: Entity<P> + 'static,
    {
        let entity = factory(EntityId::new(id));
        self.entity(id, entity)
    }

    /// Register a [`Recorder`].
    pub fn recorder(self, id: u64) -> Self {
        self.entity(id, Recorder::<P>::new())
    }

    /// Register a [`Relay`] forwarding to `next` after `delay` ticks.
    pub fn relay(self, id: u64, next: u64, delay: u64) -> Self {
        self.entity(id, Relay::new(EntityId::new(next), delay))
    }

    // ── Events ────────────────────────────────────────────────

    /// Seed an event, `delay` ticks after time zero.
    pub fn schedule(
        mut self,
        operation: impl Into<Operation>,
        destination: u64,
        delay: u64,
        payload: P,
    ) -> Self {
        self.events
            .push((operation.into(), EntityId::new(destination), delay, payload));
        self
    }

    // ── Build ─────────────────────────────────────────────────

    /// Register everything, then schedule the seed events in the order
    /// they were added.
    ///
    /// Fails on a duplicate entity ID, or on a seed event the simulation
    /// would reject.
    pub fn build(self) -> SimResult<Simulation<P>> {
        let mut sim = Simulation::with_config(self.config);
        for (id, entity) in self.entities {
            sim.register_boxed(id, entity)?;
        }
        for (operation, destination, delay, payload) in self.events {
            sim.schedule(operation, destination, delay, payload)?;
        }
        Ok(sim)
    }
}

impl<P: Clone + 'static> Default for SimulationBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
