//! Bundles - the component values of one new entity.
//!
//! Implemented for tuples of up to twelve components. A single component is
//! written as a one-element tuple: `(Position { .. },)`.

use smallvec::{SmallVec, smallvec};

use crate::{
    archetype::GroupMut,
    component::{Component, ComponentId, ComponentRegistry},
    error::Result,
};

/// A set of component values that can be written as one row.
pub trait Bundle: Send + Sync + 'static {
    /// Component ids of the bundle's elements, in element order.
    ///
    /// Fails if any element type is not registered.
    fn component_ids(registry: &ComponentRegistry) -> Result<SmallVec<[ComponentId; 8]>>;

    /// Push every element into its column of `group`.
    ///
    /// `ids` must be the output of [`Bundle::component_ids`] for the same
    /// registry that built the group.
    fn push_into(self, group: &mut GroupMut<'_>, ids: &[ComponentId]);
}

macro_rules! impl_bundle {
    ($($name:ident),+) => {
        impl<$($name: Component),+> Bundle for ($($name,)+) {
            fn component_ids(registry: &ComponentRegistry) -> Result<SmallVec<[ComponentId; 8]>> {
                Ok(smallvec![$(registry.id::<$name>()?),+])
            }

            #[allow(non_snake_case)]
            fn push_into(self, group: &mut GroupMut<'_>, ids: &[ComponentId]) {
                let ($($name,)+) = self;
                let mut ids = ids.iter().copied();
                $(
                    let id = ids.next().expect("one id per bundle element");
                    group.storage_mut(id).push($name);
                )+
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);
impl_bundle!(A, B, C, D, E, F, G, H, I);
impl_bundle!(A, B, C, D, E, F, G, H, I, J);
impl_bundle!(A, B, C, D, E, F, G, H, I, J, K);
impl_bundle!(A, B, C, D, E, F, G, H, I, J, K, L);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EcsError;

    struct Position(f32);
    struct Velocity(f32);

    #[test]
    fn test_component_ids_in_element_order() {
        let mut registry = ComponentRegistry::new();
        let pos = registry.register::<Position>().unwrap();
        let vel = registry.register::<Velocity>().unwrap();

        let ids = <(Velocity, Position)>::component_ids(&registry).unwrap();
        assert_eq!(ids.as_slice(), &[vel, pos]);
    }

    #[test]
    fn test_unregistered_element_fails() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Position>().unwrap();

        let err = <(Position, Velocity)>::component_ids(&registry).unwrap_err();
        assert!(matches!(err, EcsError::UnregisteredComponent { name } if name.ends_with("Velocity")));
    }
}
