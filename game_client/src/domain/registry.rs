// Client-side mirror of the server's entity set.

use std::collections::HashMap;
use sync_protocol::{ComponentSet, EntityData, EntityId};

/// Local best-effort copy of one server entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub components: ComponentSet,
}

impl From<EntityData> for Entity {
    fn from(data: EntityData) -> Self {
        Self {
            id: data.id,
            components: data.components,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryChange {
    Created,
    Updated,
}

/// Entity id to entity; at most one entry per id.
///
/// Mutation is crate-private so only the message handler can write; everything else
/// gets a read-only view between handler invocations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRegistry {
    entities: HashMap<EntityId, Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an unseen id or fully replaces the component set of a known one.
    pub(crate) fn upsert(&mut self, data: EntityData) -> RegistryChange {
        match self.entities.get_mut(&data.id) {
            Some(entity) => {
                // Full replace, never a merge: the server always sends complete snapshots.
                entity.components = data.components;
                RegistryChange::Updated
            }
            None => {
                self.entities.insert(data.id.clone(), Entity::from(data));
                RegistryChange::Created
            }
        }
    }

    pub(crate) fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
