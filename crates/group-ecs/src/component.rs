//! Component type registration and metadata.
//!
//! Components are data types that can be attached to entities.
//! Each registered type gets a dense [`ComponentId`] and a [`ComponentInfo`]
//! that knows how to build an empty column for it, which is all the
//! group machinery needs to stay ignorant of concrete types.

use std::{any::TypeId, fmt};

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::{
    error::{EcsError, Result},
    sparse::SparseSlots,
    storage::{Column, ErasedColumn},
};

/// Marker trait for types that can be used as components.
///
/// # Example
///
/// ```ignore
/// struct Position { x: f32, y: f32, z: f32 }
/// world.register_component::<Position>()?;
/// ```
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Identifier for a component type, unique within one [`ComponentRegistry`].
///
/// Ids are totally ordered; a group is keyed by the sorted sequence of the
/// ids of its members.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

impl ComponentId {
    /// Create a component ID from a raw value.
    #[must_use]
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Runtime information about a component type.
#[derive(Clone)]
pub struct ComponentInfo {
    id: ComponentId,
    name: &'static str,
    type_id: TypeId,
    /// Builds an empty column of the storage type chosen at registration.
    new_column: fn(ComponentId) -> ErasedColumn,
}

impl ComponentInfo {
    /// Info for `T` stored in the default [`SparseSlots`] column.
    #[must_use]
    pub fn of<T: Component>(id: ComponentId) -> Self {
        Self::with_column::<SparseSlots<T>>(id)
    }

    /// Info for `C::Item` stored in a user-supplied column type `C`.
    #[must_use]
    pub fn with_column<C: Column>(id: ComponentId) -> Self {
        Self {
            id,
            name: std::any::type_name::<C::Item>(),
            type_id: TypeId::of::<C::Item>(),
            new_column: ErasedColumn::new::<C>,
        }
    }

    /// Get the component ID.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Get the component type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Get the Rust `TypeId` of the component.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Check if this info is for the given type.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Build a fresh, empty column for this component.
    #[must_use]
    pub fn new_column(&self) -> ErasedColumn {
        (self.new_column)(self.id)
    }
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Registry for component types.
///
/// Maps Rust types to dense `ComponentId`s (`0, 1, 2, ...` in registration
/// order) and stores the metadata for each.
#[derive(Default)]
pub struct ComponentRegistry {
    type_to_id: HashMap<TypeId, ComponentId, FxBuildHasher>,
    /// Indexed by `ComponentId::as_raw`.
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` with the default sparse-slot storage.
    ///
    /// Registering the same type twice is rejected rather than ignored.
    pub fn register<T: Component>(&mut self) -> Result<ComponentId> {
        self.register_with::<SparseSlots<T>>()
    }

    /// Register `C::Item` with a user-supplied column type.
    pub fn register_with<C: Column>(&mut self) -> Result<ComponentId> {
        let type_id = TypeId::of::<C::Item>();
        if self.type_to_id.contains_key(&type_id) {
            return Err(EcsError::AlreadyRegistered {
                name: std::any::type_name::<C::Item>(),
            });
        }

        let raw = u32::try_from(self.infos.len()).expect("component id space exhausted");
        let id = ComponentId(raw);
        self.type_to_id.insert(type_id, id);
        self.infos.push(ComponentInfo::with_column::<C>(id));

        tracing::debug!(
            component = std::any::type_name::<C::Item>(),
            id = raw,
            "registered component"
        );

        Ok(id)
    }

    /// Get the component ID for a type.
    ///
    /// Fails with the type's name if it was never registered.
    pub fn id<T: Component>(&self) -> Result<ComponentId> {
        self.get_id::<T>().ok_or(EcsError::UnregisteredComponent {
            name: std::any::type_name::<T>(),
        })
    }

    /// Get the component ID for a type, if registered.
    #[must_use]
    pub fn get_id<T: Component>(&self) -> Option<ComponentId> {
        self.type_to_id.get(&TypeId::of::<T>()).copied()
    }

    /// Get component info by ID.
    #[must_use]
    pub fn get_info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(id.as_raw() as usize)
    }

    /// Get component info by ID, panicking on ids from another registry.
    #[must_use]
    pub fn info(&self, id: ComponentId) -> &ComponentInfo {
        self.get_info(id)
            .unwrap_or_else(|| panic!("{id:?} was not issued by this registry"))
    }

    /// Get the number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Iterate over all registered component infos.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.infos.iter()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("count", &self.len())
            .field("components", &self.infos)
            .finish()
    }
}
