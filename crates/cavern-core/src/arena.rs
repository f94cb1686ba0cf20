//! Generational arena for entity instances.
//!
//! Script object variables bind to an entity *instance*, not to its id: the
//! binding dies with the entity and must be re-captured. Each entity
//! occupies a slot with a generation counter; a stored [`EntityRef`] is
//! valid only while its generation matches the slot's current generation,
//! so stale bindings are detected by comparison instead of dangling.

use serde::{Deserialize, Serialize};

use crate::objects::{ObjectKey, ObjectKind};

/// A `(slot, generation)` handle to an arena entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    slot: u32,
    generation: u32,
}

impl EntityRef {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    entry: Option<Entity>,
}

/// An entity instance held by the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: ObjectKind,
    pub key: ObjectKey,
    pub type_name: String,
}

/// Slot-and-generation entity store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityArena {
    slots: Vec<Slot>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, returning its handle.
    pub fn insert(&mut self, entity: Entity) -> EntityRef {
        // Reuse the first free slot before growing.
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.is_none() {
                slot.entry = Some(entity);
                return EntityRef {
                    slot: idx as u32,
                    generation: slot.generation,
                };
            }
        }
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entity),
        });
        EntityRef {
            slot: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Remove an entity. Its slot's generation advances, invalidating every
    /// outstanding handle to it.
    pub fn remove(&mut self, handle: EntityRef) -> Option<Entity> {
        let slot = self.slots.get_mut(handle.slot as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let entity = slot.entry.take()?;
        slot.generation += 1;
        Some(entity)
    }

    /// Resolve a handle, returning `None` when the entity is gone or the
    /// handle is stale.
    pub fn get(&self, handle: EntityRef) -> Option<&Entity> {
        let slot = self.slots.get(handle.slot as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    /// Whether a handle still points at a live entity.
    pub fn is_live(&self, handle: EntityRef) -> bool {
        self.get(handle).is_some()
    }

    /// Find the live entity with the given kind and key.
    pub fn find(&self, kind: ObjectKind, key: ObjectKey) -> Option<EntityRef> {
        self.slots.iter().enumerate().find_map(|(idx, slot)| {
            let entity = slot.entry.as_ref()?;
            (entity.kind == kind && entity.key == key).then_some(EntityRef {
                slot: idx as u32,
                generation: slot.generation,
            })
        })
    }

    /// Live entities of one kind.
    pub fn of_kind(&self, kind: ObjectKind) -> impl Iterator<Item = (EntityRef, &Entity)> {
        self.slots.iter().enumerate().filter_map(move |(idx, slot)| {
            let entity = slot.entry.as_ref()?;
            (entity.kind == kind).then_some((
                EntityRef {
                    slot: idx as u32,
                    generation: slot.generation,
                },
                entity,
            ))
        })
    }

    /// Count of live entities of one kind.
    pub fn count(&self, kind: ObjectKind) -> usize {
        self.of_kind(kind).count()
    }
}
