//! World - the owner of the component registry and the group arena.
//!
//! The World wires type registration to group storage and provides the
//! entry points for creating entities, moving them between groups and
//! running queries.
//!
//! Entities are addressed by [`EntityHandle`], a `(group, row)` position.
//! Every structural mutation (creating a group, inserting or erasing a row,
//! moving an entity between groups) may shift rows and groups, so a handle
//! is only valid until the next one. Stable ids are left to the caller.

use smallvec::SmallVec;

use crate::{
    archetype::GroupMut,
    arena::GroupArena,
    bundle::Bundle,
    component::{Component, ComponentId, ComponentRegistry},
    entity::{EntityHandle, GroupRef},
    error::{EcsError, Result},
    query::{Query, QueryBuilder, QueryRow},
    storage::{Column, ErasedColumn},
};

/// The ECS world - container for all groups and components.
pub struct World {
    /// Component type registry.
    components: ComponentRegistry,
    /// Every group's columns.
    groups: GroupArena,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            components: ComponentRegistry::new(),
            groups: GroupArena::new(),
        }
    }

    /// Create a world with room for `column_capacity` columns across all
    /// groups before the arena reallocates.
    #[must_use]
    pub fn with_capacity(column_capacity: usize) -> Self {
        Self {
            components: ComponentRegistry::new(),
            groups: GroupArena::with_capacity(column_capacity),
        }
    }

    // ------------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------------

    /// Register `T`, stored in the default sparse slot column.
    pub fn register_component<T: Component>(&mut self) -> Result<ComponentId> {
        self.components.register::<T>()
    }

    /// Register `C::Item`, stored in a column of type `C`.
    pub fn register_component_with<C: Column>(&mut self) -> Result<ComponentId> {
        self.components.register_with::<C>()
    }

    /// Get the component ID for a type.
    pub fn component_id<T: Component>(&self) -> Result<ComponentId> {
        self.components.id::<T>()
    }

    /// Get the component registry.
    #[must_use]
    pub const fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Get the group arena.
    #[must_use]
    pub const fn groups(&self) -> &GroupArena {
        &self.groups
    }

    pub(crate) const fn groups_mut(&mut self) -> &mut GroupArena {
        &mut self.groups
    }

    // ------------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------------

    /// Create an entity from a bundle of components.
    ///
    /// The entity goes to the group holding exactly the bundle's component
    /// types, which is created if it does not exist yet.
    ///
    /// # Panics
    ///
    /// Panics if the bundle holds the same component type twice.
    pub fn create_entity<B: Bundle>(&mut self, bundle: B) -> Result<EntityHandle> {
        let ids = B::component_ids(&self.components)?;
        let group = self.groups.find_or_create(&ids, &self.components);
        let row = self.groups.group_mut(group).emplace_row(bundle, &ids);
        Ok(EntityHandle::new(group, row))
    }

    /// Remove an entity and drop its components.
    ///
    /// Later rows of the same group shift down by one.
    pub fn erase(&mut self, handle: EntityHandle) {
        self.groups.group_mut(handle.group()).erase_row(handle.row());
    }

    /// Number of entities across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.entity_count()
    }

    /// Whether the world holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a reference to an entity's component.
    ///
    /// Returns `None` if `T` is unregistered or the entity does not have it.
    #[must_use]
    pub fn get<T: Component>(&self, handle: EntityHandle) -> Option<&T> {
        let id = self.components.get_id::<T>()?;
        let column = self.groups.group(handle.group()).get_storage(id)?;
        Some(column.get::<T>(handle.row()))
    }

    /// Get a mutable reference to an entity's component.
    #[must_use]
    pub fn get_mut<T: Component>(&mut self, handle: EntityHandle) -> Option<&mut T> {
        let id = self.components.get_id::<T>()?;
        let group = self.groups.group_mut(handle.group());
        let idx = group.column_index(id)?;
        Some(group.into_columns()[idx].get_mut::<T>(handle.row()))
    }

    /// Check if an entity has a component.
    #[must_use]
    pub fn contains<T: Component>(&self, handle: EntityHandle) -> bool {
        self.components
            .get_id::<T>()
            .is_some_and(|id| self.groups.group(handle.group()).contains_id(id))
    }

    /// Add a component to an entity, moving it to the group with `T`.
    ///
    /// If the entity already has `T`, the value is replaced in place and
    /// the same handle is returned.
    pub fn insert_component<T: Component>(
        &mut self,
        handle: EntityHandle,
        value: T,
    ) -> Result<EntityHandle> {
        let id = self.components.id::<T>()?;

        if let Some(slot) = self.get_mut::<T>(handle) {
            *slot = value;
            return Ok(handle);
        }

        let mut ids = self.groups.group(handle.group()).id_vec();
        ids.push(id);

        let (target, mut to) = self.move_entity(handle, &ids, |_, _| {});
        to.storage_mut(id).push(value);
        Ok(EntityHandle::new(target, to.len() - 1))
    }

    /// Remove a component from an entity, moving it to the group without
    /// `T`.
    ///
    /// Returns the entity's new handle and the removed value.
    pub fn remove_component<T: Component>(&mut self, handle: EntityHandle) -> Result<(EntityHandle, T)> {
        let id = self.components.id::<T>()?;
        let source = self.groups.group(handle.group());

        if !source.contains_id(id) {
            return Err(EcsError::MissingComponent {
                name: std::any::type_name::<T>(),
            });
        }
        if source.size() == 1 {
            return Err(EcsError::EmptyArchetype);
        }

        let ids: SmallVec<[ComponentId; 8]> =
            source.ids().filter(|&other| other != id).collect();

        let mut removed = None;
        let (target, to) = self.move_entity(handle, &ids, |column, row| {
            if column.id() == id {
                removed = Some(column.take::<T>(row));
            }
        });
        let new_handle = EntityHandle::new(target, to.len() - 1);

        let value = removed.expect("source group holds the removed component");
        Ok((new_handle, value))
    }

    /// Move the entity at `handle` to the group `ids`.
    ///
    /// Columns the target shares with the source move their value; every
    /// other source column is handed to `leftover` before the row is gone.
    /// Returns the target group and a view of it with the moved row last.
    fn move_entity(
        &mut self,
        handle: EntityHandle,
        ids: &[ComponentId],
        mut leftover: impl FnMut(&mut ErasedColumn, usize),
    ) -> (GroupRef, GroupMut<'_>) {
        let columns_before = self.groups.column_count();
        let target = self
            .groups
            .find_or_create_from(handle.group(), ids, &self.components);

        let source = if self.groups.column_count() > columns_before {
            handle.group().relocate(target.start(), target.size())
        } else {
            handle.group()
        };

        let row = handle.row();
        let (mut from, mut to) = self.groups.pair_mut(source, target);
        for column in from.columns_mut() {
            let id = column.id();
            if to.column_index(id).is_some() {
                column.move_row(row, to.storage_mut(id));
            } else {
                leftover(column, row);
            }
        }

        tracing::trace!(
            from = ?source,
            to = ?target,
            row,
            "moved entity between groups"
        );

        (target, to)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Start building a query.
    #[must_use]
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.components)
    }

    /// Run `query` over every matching row.
    pub fn for_each<F>(&mut self, query: &Query, f: F)
    where
        F: FnMut(QueryRow<'_>),
    {
        query.for_each(self, f);
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("component_count", &self.components.len())
            .field("group_count", &self.groups.group_count())
            .field("entity_count", &self.len())
            .finish()
    }
}
