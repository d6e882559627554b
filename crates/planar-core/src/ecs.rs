//! Entity Component System (ECS)
//!
//! A small generational entity store with one sparse storage per component
//! type. Features:
//! - Stable entity IDs with generation counters
//! - Components indexed directly by entity index
//! - Enumeration in ascending index order, so iteration is reproducible

use std::any::{Any, TypeId};
use std::fmt;

use ahash::AHashMap;

/// Marker trait for components
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Entity identifier with generation counter for stable IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    /// Entity index
    index: u32,
    /// Generation counter to detect stale references
    generation: u32,
}

impl Entity {
    /// Create a new entity with the given index and generation
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Get the entity index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Get the entity generation
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Stable 64-bit identity. Index-major, so ordering by bits matches
    /// ordering by index first.
    pub fn to_bits(&self) -> u64 {
        (u64::from(self.index) << 32) | u64::from(self.generation)
    }

    /// Create a null entity (invalid reference)
    pub fn null() -> Self {
        Self {
            index: u32::MAX,
            generation: 0,
        }
    }

    /// Check if this is a null entity
    pub fn is_null(&self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Internal entity metadata
#[derive(Debug)]
struct EntityMeta {
    generation: u32,
    alive: bool,
}

/// Type-erased component storage
trait ComponentStorage: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn len(&self) -> usize;
}

/// Sparse storage indexed by entity index
struct TypedStorage<T: Component> {
    slots: Vec<Option<(u32, T)>>,
    len: usize,
}

impl<T: Component> TypedStorage<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }

    fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        let index = entity.index() as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }

        match self.slots[index].replace((entity.generation(), component)) {
            Some((generation, previous)) if generation == entity.generation() => Some(previous),
            Some(_) => None,
            None => {
                self.len += 1;
                None
            }
        }
    }

    fn get(&self, entity: Entity) -> Option<&T> {
        match self.slots.get(entity.index() as usize)? {
            Some((generation, component)) if *generation == entity.generation() => Some(component),
            _ => None,
        }
    }

    fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        match self.slots.get_mut(entity.index() as usize)? {
            Some((generation, component)) if *generation == entity.generation() => Some(component),
            _ => None,
        }
    }

    fn take(&mut self, entity: Entity) -> Option<T> {
        let slot = self.slots.get_mut(entity.index() as usize)?;
        if !matches!(slot, Some((generation, _)) if *generation == entity.generation()) {
            return None;
        }
        self.len -= 1;
        slot.take().map(|(_, component)| component)
    }

    fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|(generation, _)| Entity::new(index as u32, *generation))
        })
    }
}

impl<T: Component> ComponentStorage for TypedStorage<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.take(entity).is_some()
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// The ECS world containing all entities and components
pub struct World {
    /// Entity metadata indexed by entity index
    entities: Vec<EntityMeta>,
    /// Free entity indices for recycling
    free_indices: Vec<u32>,
    /// Component storages indexed by TypeId
    storages: AHashMap<TypeId, Box<dyn ComponentStorage>>,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            free_indices: Vec::new(),
            storages: AHashMap::new(),
        }
    }

    /// Spawn a new entity
    pub fn spawn(&mut self) -> Entity {
        if let Some(index) = self.free_indices.pop() {
            let meta = &mut self.entities[index as usize];
            meta.generation = meta.generation.wrapping_add(1);
            meta.alive = true;
            return Entity::new(index, meta.generation);
        }

        let index = self.entities.len() as u32;
        self.entities.push(EntityMeta {
            generation: 0,
            alive: true,
        });
        Entity::new(index, 0)
    }

    /// Despawn an entity and drop all of its components
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        self.entities[entity.index() as usize].alive = false;
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }

        self.free_indices.push(entity.index());
        true
    }

    /// Check if an entity is alive
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities
            .get(entity.index() as usize)
            .is_some_and(|meta| meta.alive && meta.generation == entity.generation())
    }

    /// Get the number of alive entities
    pub fn entity_count(&self) -> usize {
        self.entities.iter().filter(|m| m.alive).count()
    }

    /// Add a component to an entity, replacing any previous value of the same type
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let Some(storage) = self.storage_or_insert::<T>() else {
            return false;
        };
        storage.insert(entity, component);
        true
    }

    /// Remove a component from an entity, returning it
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>()?.take(entity)
    }

    /// Get a component from an entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storage::<T>()?.get(entity)
    }

    /// Get a mutable component from an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>()?.get_mut(entity)
    }

    /// Check if an entity has a component
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    /// Number of entities carrying a component of type `T`
    pub fn component_count<T: Component>(&self) -> usize {
        self.storages
            .get(&TypeId::of::<T>())
            .map_or(0, |storage| storage.len())
    }

    /// All entities carrying a component of type `T`, in ascending index order
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        self.storage::<T>()
            .map(|storage| storage.entities().collect())
            .unwrap_or_default()
    }

    fn storage<T: Component>(&self) -> Option<&TypedStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<TypedStorage<T>>()
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut TypedStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<TypedStorage<T>>()
    }

    fn storage_or_insert<T: Component>(&mut self) -> Option<&mut TypedStorage<T>> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(TypedStorage::<T>::new()))
            .as_any_mut()
            .downcast_mut::<TypedStorage<T>>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f64,
        y: f64,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        x: f64,
        y: f64,
    }

    #[test]
    fn test_entity_creation() {
        let mut world = World::new();
        let entity = world.spawn();

        assert!(!entity.is_null());
        assert!(world.is_alive(entity));
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_entity_despawn() {
        let mut world = World::new();
        let entity = world.spawn();

        assert!(world.despawn(entity));
        assert!(!world.is_alive(entity));
        assert!(!world.despawn(entity));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_entity_recycling() {
        let mut world = World::new();
        let entity1 = world.spawn();
        world.add_component(entity1, Position { x: 1.0, y: 1.0 });
        world.despawn(entity1);
        let entity2 = world.spawn();

        // Same index, different generation
        assert_eq!(entity1.index(), entity2.index());
        assert_ne!(entity1.generation(), entity2.generation());

        // Old entity reference is no longer valid and its components are gone
        assert!(!world.is_alive(entity1));
        assert!(world.is_alive(entity2));
        assert!(!world.has_component::<Position>(entity2));
    }

    #[test]
    fn test_component_add_get() {
        let mut world = World::new();
        let entity = world.spawn();

        let pos = Position { x: 1.0, y: 2.0 };
        assert!(world.add_component(entity, pos.clone()));

        assert_eq!(world.get_component::<Position>(entity), Some(&pos));
    }

    #[test]
    fn test_component_replace_and_remove() {
        let mut world = World::new();
        let entity = world.spawn();

        world.add_component(entity, Position { x: 0.0, y: 0.0 });
        world.add_component(entity, Position { x: 5.0, y: 0.0 });
        assert_eq!(world.component_count::<Position>(), 1);

        let removed = world.remove_component::<Position>(entity);
        assert_eq!(removed, Some(Position { x: 5.0, y: 0.0 }));
        assert_eq!(world.component_count::<Position>(), 0);
    }

    #[test]
    fn test_component_mutation() {
        let mut world = World::new();
        let entity = world.spawn();

        world.add_component(entity, Position { x: 0.0, y: 0.0 });

        if let Some(pos) = world.get_component_mut::<Position>(entity) {
            pos.x = 10.0;
        }

        let pos = world.get_component::<Position>(entity).unwrap();
        assert_eq!(pos.x, 10.0);
    }

    #[test]
    fn test_has_component() {
        let mut world = World::new();
        let entity = world.spawn();

        assert!(!world.has_component::<Position>(entity));

        world.add_component(entity, Position { x: 0.0, y: 0.0 });

        assert!(world.has_component::<Position>(entity));
        assert!(!world.has_component::<Velocity>(entity));
    }

    #[test]
    fn test_entities_with_is_index_ordered() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();

        world.add_component(c, Velocity { x: 0.0, y: 0.0 });
        world.add_component(a, Velocity { x: 0.0, y: 0.0 });
        world.add_component(b, Position { x: 0.0, y: 0.0 });

        assert_eq!(world.entities_with::<Velocity>(), vec![a, c]);
        assert!(world.entities_with::<String>().is_empty());
    }

    #[test]
    fn test_entity_bits_and_display() {
        let entity = Entity::new(3, 2);
        assert_eq!(entity.to_bits(), (3u64 << 32) | 2);
        assert_eq!(entity.to_string(), "3v2");
        assert!(Entity::new(1, 9).to_bits() < Entity::new(2, 0).to_bits());
    }
}
