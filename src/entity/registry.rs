//! `EntityRegistry`: owns every entity and resolves destinations.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{SimError, SimResult};
use crate::event::Operation;

use super::id::EntityId;
use super::traits::Entity;

struct Slot<P> {
    /// Captured once at registration; never re-queried.
    operations: BTreeSet<Operation>,
    /// `None` while the entity is checked out for dispatch.
    entity: Option<Box<dyn Entity<P>>>,
}

/// Maps destination IDs to entities and their accepted operations.
///
/// Resolution only consults the operation sets, so it keeps working while
/// an entity is checked out for dispatch; that is what lets a handler
/// schedule events for itself.
pub struct EntityRegistry<P> {
    slots: BTreeMap<EntityId, Slot<P>>,
    next_id: u64,
}

impl<P> EntityRegistry<P> {
    pub fn new() -> Self {
        EntityRegistry {
            slots: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Register an entity under the next free sequential ID.
    pub fn register<E>(&mut self, entity: E) -> EntityId
    where
        E: Entity<P> + 'static,
    {
        while self.slots.contains_key(&EntityId::new(self.next_id)) {
            self.next_id += 1;
        }
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.insert(id, Box::new(entity));
        id
    }

    /// Register an entity under a caller-chosen ID.
    pub fn register_as<E>(&mut self, id: EntityId, entity: E) -> SimResult<()>
    where
        E: Entity<P> + 'static,
    {
        self.register_boxed(id, Box::new(entity))
    }

    /// Register an already boxed entity under a caller-chosen ID.
    pub fn register_boxed(&mut self, id: EntityId, entity: Box<dyn Entity<P>>) -> SimResult<()> {
        if self.slots.contains_key(&id) {
            return Err(SimError::DuplicateEntity(id));
        }
        self.insert(id, entity);
        Ok(())
    }

    fn insert(&mut self, id: EntityId, entity: Box<dyn Entity<P>>) {
        let operations = entity.operations().into_iter().collect();
        self.slots.insert(
            id,
            Slot {
                operations,
                entity: Some(entity),
            },
        );
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Whether `id` is registered and accepts `operation`.
    pub fn supports(&self, id: EntityId, operation: &Operation) -> bool {
        self.slots
            .get(&id)
            .is_some_and(|slot| slot.operations.contains(operation))
    }

    /// Like [`supports`](Self::supports), but as a `Result`.
    pub fn resolve(&self, id: EntityId, operation: &Operation) -> SimResult<()> {
        if self.supports(id, operation) {
            Ok(())
        } else {
            Err(SimError::InvalidTarget {
                destination: id,
                operation: operation.clone(),
            })
        }
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Downcast an entity for inspection.
    ///
    /// `None` if the ID is unknown or the entity is of another type.
    pub fn entity<T: 'static>(&self, id: EntityId) -> Option<&T> {
        self.slots
            .get(&id)?
            .entity
            .as_ref()?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn entity_mut<T: 'static>(&mut self, id: EntityId) -> Option<&mut T> {
        self.slots
            .get_mut(&id)?
            .entity
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Validate and take an entity out of its slot for dispatch.
    pub(crate) fn checkout(
        &mut self,
        id: EntityId,
        operation: &Operation,
    ) -> SimResult<Box<dyn Entity<P>>> {
        self.resolve(id, operation)?;
        self.take(id).ok_or_else(|| SimError::InvalidTarget {
            destination: id,
            operation: operation.clone(),
        })
    }

    /// Take an entity out of its slot without an operation check.
    pub(crate) fn take(&mut self, id: EntityId) -> Option<Box<dyn Entity<P>>> {
        self.slots.get_mut(&id)?.entity.take()
    }

    /// Return an entity taken by [`checkout`](Self::checkout).
    pub(crate) fn checkin(&mut self, id: EntityId, entity: Box<dyn Entity<P>>) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.entity = Some(entity);
        }
    }
}

impl<P> Default for EntityRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for EntityRegistry<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(id, slot)| (id, &slot.operations)))
            .finish()
    }
}
