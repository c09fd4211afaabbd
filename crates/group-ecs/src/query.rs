//! Query system for iterating over groups with specific component patterns.
//!
//! Queries are built at runtime by method chaining on a [`QueryBuilder`],
//! not through type-level generics. Each term names one component, how it is
//! accessed ([`AccessMode`]) and whether it must be there ([`Presence`]).
//!
//! # Basic Usage
//!
//! ```ignore
//! let query = world
//!     .query()
//!     .write::<Position>()
//!     .read::<Velocity>()
//!     .without::<Frozen>()
//!     .build()?;
//!
//! query.for_each(&mut world, |mut row| {
//!     let vel = *row.get::<Velocity>();
//!     let pos = row.get_mut::<Position>();
//!     pos.x += vel.x;
//! });
//! ```
//!
//! # Execution
//!
//! A built [`Query`] is the dispatch plan for one query shape. Execution
//! walks every group large enough to hold the required terms, resolves the
//! plan against the group once (column lookups and access checks), and then
//! hands out rows that only index into the resolved columns.
//!
//! # Term Combinators
//!
//! - `.read::<T>()` - must have `T`, shared access
//! - `.write::<T>()` - must have `T`, exclusive access
//! - `.with::<T>()` - must have `T`, no data access
//! - `.optional_read::<T>()` / `.optional_write::<T>()` - `T` if present
//! - `.without::<T>()` - must not have `T`

use std::{any::TypeId, fmt, marker::PhantomData};

use smallvec::SmallVec;

use crate::{
    World,
    access::{AccessDescriptor, AccessMode, Presence, QueryAccess},
    archetype::Group,
    component::{Component, ComponentId, ComponentRegistry},
    entity::{EntityHandle, GroupRef},
    error::{EcsError, Result},
    storage::ErasedColumn,
};

// ============================================================================
// Terms
// ============================================================================

/// A single term in a query.
#[derive(Clone, Copy, Debug)]
pub struct QueryTerm {
    /// Component, access mode and presence rule.
    pub descriptor: AccessDescriptor,
    type_id: TypeId,
    name: &'static str,
}

impl QueryTerm {
    /// Type name of the term's component.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

// ============================================================================
// QueryBuilder
// ============================================================================

/// Builder for constructing queries at runtime.
pub struct QueryBuilder<'w> {
    registry: &'w ComponentRegistry,
    terms: Vec<QueryTerm>,
    error: Option<EcsError>,
}

impl<'w> QueryBuilder<'w> {
    /// Create an empty builder resolving types through `registry`.
    #[must_use]
    pub fn new(registry: &'w ComponentRegistry) -> Self {
        Self {
            registry,
            terms: Vec::new(),
            error: None,
        }
    }

    /// Add a term for `T` with an explicit access mode and presence rule.
    ///
    /// If `T` is not registered, [`build`](Self::build) fails.
    #[must_use]
    pub fn term<T: Component>(mut self, mode: AccessMode, presence: Presence) -> Self {
        match self.registry.id::<T>() {
            Ok(id) => self.terms.push(QueryTerm {
                descriptor: AccessDescriptor::new(id, mode, presence),
                type_id: TypeId::of::<T>(),
                name: std::any::type_name::<T>(),
            }),
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some(err);
                }
            }
        }
        self
    }

    /// Entity must have `T`; shared access via [`QueryRow::get`].
    #[must_use]
    pub fn read<T: Component>(self) -> Self {
        self.term::<T>(AccessMode::Read, Presence::Require)
    }

    /// Entity must have `T`; exclusive access via [`QueryRow::get_mut`].
    #[must_use]
    pub fn write<T: Component>(self) -> Self {
        self.term::<T>(AccessMode::Write, Presence::Require)
    }

    /// Entity must have `T`, but its data is not accessed.
    ///
    /// Useful for tag/marker components.
    #[must_use]
    pub fn with<T: Component>(self) -> Self {
        self.term::<T>(AccessMode::Inaccessible, Presence::Require)
    }

    /// Shared access to `T` if the entity has it.
    #[must_use]
    pub fn optional_read<T: Component>(self) -> Self {
        self.term::<T>(AccessMode::Read, Presence::Optional)
    }

    /// Exclusive access to `T` if the entity has it.
    #[must_use]
    pub fn optional_write<T: Component>(self) -> Self {
        self.term::<T>(AccessMode::Write, Presence::Optional)
    }

    /// Exclude entities that have `T`.
    #[must_use]
    pub fn without<T: Component>(self) -> Self {
        self.term::<T>(AccessMode::Inaccessible, Presence::Exclude)
    }

    /// Build the dispatch plan.
    ///
    /// # Errors
    ///
    /// Returns the first [`EcsError::UnregisteredComponent`] hit while
    /// adding terms.
    ///
    /// # Panics
    ///
    /// Panics if one component appears in two terms.
    pub fn build(self) -> Result<Query> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut ids: SmallVec<[ComponentId; 8]> = self
            .terms
            .iter()
            .map(|term| term.descriptor.component_id)
            .collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            let name = self
                .terms
                .iter()
                .find(|term| term.descriptor.component_id == pair[0])
                .map_or("?", QueryTerm::name);
            panic!("component `{name}` appears twice in one query");
        }

        let mut required: SmallVec<[ComponentId; 8]> = self
            .terms
            .iter()
            .filter(|term| term.descriptor.presence == Presence::Require)
            .map(|term| term.descriptor.component_id)
            .collect();
        required.sort_unstable();

        let access = QueryAccess::new(self.terms.iter().map(|term| term.descriptor));

        Ok(Query {
            terms: self.terms.into_iter().collect(),
            access,
            required,
        })
    }
}

impl fmt::Debug for QueryBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("terms", &self.terms)
            .field("error", &self.error)
            .finish()
    }
}

// ============================================================================
// Query - the dispatch plan
// ============================================================================

/// How one term binds to one group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// Shared access to the column at this index.
    Shared(usize),
    /// Exclusive access to the column at this index.
    Exclusive(usize),
    /// The component is present; its data is not accessed.
    Marker,
    /// The component is absent (optional or excluded term).
    Absent,
}

/// A query plan resolved against one group: one [`Slot`] per term, in term
/// order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedGroup {
    slots: SmallVec<[Slot; 8]>,
}

impl ResolvedGroup {
    /// The slots, in term order.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
}

/// An executable query over groups.
#[derive(Clone)]
pub struct Query {
    terms: SmallVec<[QueryTerm; 8]>,
    access: QueryAccess,
    /// Sorted ids of the `Require` terms.
    required: SmallVec<[ComponentId; 8]>,
}

impl Query {
    /// The query terms, in declaration order.
    #[must_use]
    pub fn terms(&self) -> &[QueryTerm] {
        &self.terms
    }

    /// The access descriptors, for concurrency checks against other queries.
    #[must_use]
    pub const fn access(&self) -> &QueryAccess {
        &self.access
    }

    /// Smallest group size that can satisfy every required term.
    #[must_use]
    pub fn min_group_size(&self) -> usize {
        self.required.len().max(1)
    }

    /// Bind the plan to `group`, or `None` if the group does not match.
    #[must_use]
    pub fn resolve(&self, group: Group<'_>) -> Option<ResolvedGroup> {
        if !group.contains(&self.required) {
            return None;
        }

        let mut slots = SmallVec::with_capacity(self.terms.len());
        for term in &self.terms {
            let desc = term.descriptor;
            let slot = match (group.column_index(desc.component_id), desc.presence) {
                (Some(_), Presence::Exclude) | (None, Presence::Require) => return None,
                (None, Presence::Optional | Presence::Exclude) => Slot::Absent,
                (Some(idx), Presence::Require | Presence::Optional) => match desc.mode {
                    AccessMode::Read => Slot::Shared(idx),
                    AccessMode::Write => Slot::Exclusive(idx),
                    AccessMode::Inaccessible => Slot::Marker,
                },
            };
            slots.push(slot);
        }

        Some(ResolvedGroup { slots })
    }

    /// Whether `group` matches the query.
    #[must_use]
    pub fn matches(&self, group: Group<'_>) -> bool {
        self.resolve(group).is_some()
    }

    /// Call `f` for every matching row, with exclusive access to `Write` terms.
    pub fn for_each<F>(&self, world: &mut World, mut f: F)
    where
        F: FnMut(QueryRow<'_>),
    {
        let mut visited = 0_usize;
        for (group_ref, mut group) in world.groups_mut().groups_mut_from(self.min_group_size()) {
            if group.is_empty() {
                continue;
            }
            let resolved = match self.resolve(group.as_group()) {
                Some(resolved) => resolved,
                None => continue,
            };

            let len = group.len();
            let handles = self.bind_mut(&resolved, group.columns_mut(), len);
            for row in 0..len {
                f(QueryRow::new(&self.terms, &handles, group_ref, row));
            }
            visited += 1;
        }

        tracing::trace!(groups = visited, terms = self.terms.len(), "ran query");
    }

    /// Call `f` for every matching row with shared access.
    ///
    /// Takes `&World`, so any number of read-only queries may run at once.
    ///
    /// # Panics
    ///
    /// Panics if the query has a `Write` term.
    pub fn for_each_read<F>(&self, world: &World, mut f: F)
    where
        F: FnMut(QueryRow<'_>),
    {
        assert!(
            self.access.is_read_only(),
            "for_each_read needs a query without write terms: {:?}",
            self.access
        );

        for (group_ref, group) in world.groups().groups_from(self.min_group_size()) {
            if group.is_empty() {
                continue;
            }
            let resolved = match self.resolve(group) {
                Some(resolved) => resolved,
                None => continue,
            };

            let len = group.len();
            let handles = self.bind(&resolved, group.columns(), len);
            for row in 0..len {
                f(QueryRow::new(&self.terms, &handles, group_ref, row));
            }
        }
    }

    /// Number of rows the query matches.
    #[must_use]
    pub fn count(&self, world: &World) -> usize {
        world
            .groups()
            .groups_from(self.min_group_size())
            .filter(|(_, group)| self.matches(*group))
            .map(|(_, group)| group.len())
            .sum()
    }

    fn bind(&self, resolved: &ResolvedGroup, columns: &[ErasedColumn], rows: usize) -> Handles {
        self.terms
            .iter()
            .zip(&resolved.slots)
            .map(|(term, slot)| match *slot {
                Slot::Shared(idx) => Handle::Read(shared(term, &columns[idx], rows)),
                Slot::Exclusive(_) => unreachable!("read-only query resolved a write slot"),
                Slot::Marker => Handle::Present,
                Slot::Absent => Handle::Absent,
            })
            .collect()
    }

    fn bind_mut(
        &self,
        resolved: &ResolvedGroup,
        columns: &mut [ErasedColumn],
        rows: usize,
    ) -> Handles {
        self.terms
            .iter()
            .zip(&resolved.slots)
            .map(|(term, slot)| match *slot {
                Slot::Shared(idx) => Handle::Read(shared(term, &columns[idx], rows)),
                Slot::Exclusive(idx) => {
                    checked(term, &columns[idx]);
                    let (ptr, len) = columns[idx].raw_parts_mut();
                    assert_rows(&columns[idx], len, rows);
                    Handle::Write(ptr)
                }
                Slot::Marker => Handle::Present,
                Slot::Absent => Handle::Absent,
            })
            .collect()
    }
}

fn checked<'c>(term: &QueryTerm, column: &'c ErasedColumn) -> &'c ErasedColumn {
    assert_eq!(
        column.item_type_id(),
        term.type_id,
        "column {:?} does not store `{}`",
        column.id(),
        term.name
    );
    column
}

/// Base pointer of a read column, checked to cover `rows` rows.
fn shared(term: &QueryTerm, column: &ErasedColumn, rows: usize) -> *const u8 {
    let (ptr, len) = checked(term, column).raw_parts();
    assert_rows(column, len, rows);
    ptr
}

fn assert_rows(column: &ErasedColumn, len: usize, rows: usize) {
    assert!(
        len >= rows,
        "column {:?} holds {len} rows, fewer than its group's {rows}",
        column.id()
    );
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("access", &self.access)
            .field("min_group_size", &self.min_group_size())
            .finish()
    }
}

// ============================================================================
// QueryRow - single row access
// ============================================================================

/// Base pointer of one term's column within the current group.
#[derive(Clone, Copy, Debug)]
enum Handle {
    Read(*const u8),
    Write(*mut u8),
    Present,
    Absent,
}

type Handles = SmallVec<[Handle; 8]>;

/// A single row of a query result.
pub struct QueryRow<'a> {
    terms: &'a [QueryTerm],
    handles: &'a [Handle],
    group: GroupRef,
    row: usize,
    _columns: PhantomData<&'a mut [ErasedColumn]>,
}

impl<'a> QueryRow<'a> {
    fn new(terms: &'a [QueryTerm], handles: &'a [Handle], group: GroupRef, row: usize) -> Self {
        Self {
            terms,
            handles,
            group,
            row,
            _columns: PhantomData,
        }
    }

    /// Handle of the entity in this row.
    #[must_use]
    pub const fn handle(&self) -> EntityHandle {
        EntityHandle::new(self.group, self.row)
    }

    /// Row index within the current group.
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    fn slot<T: Component>(&self) -> (usize, Handle) {
        let wanted = TypeId::of::<T>();
        let idx = self
            .terms
            .iter()
            .position(|term| term.type_id == wanted)
            .unwrap_or_else(|| {
                panic!(
                    "`{}` is not part of the query",
                    std::any::type_name::<T>()
                )
            });
        (idx, self.handles[idx])
    }

    /// Shared access to `T`, if present.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not a term of the query or is a term without data
    /// access.
    #[must_use]
    pub fn get_optional<T: Component>(&self) -> Option<&T> {
        let ptr = match self.slot::<T>().1 {
            Handle::Read(ptr) => ptr,
            Handle::Write(ptr) => ptr.cast_const(),
            Handle::Absent => return None,
            Handle::Present => panic!(
                "`{}` is a filter term without data access",
                std::any::type_name::<T>()
            ),
        };
        // SAFETY: the handle points at a column of `T` checked at bind time,
        // `row` is in bounds and no exclusive borrow of it is alive
        Some(unsafe { &*ptr.cast::<T>().add(self.row) })
    }

    /// Exclusive access to `T`, if present.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not a write term of the query.
    #[must_use]
    pub fn get_optional_mut<T: Component>(&mut self) -> Option<&mut T> {
        let ptr = match self.slot::<T>().1 {
            Handle::Write(ptr) => ptr,
            Handle::Absent if self.is_write::<T>() => return None,
            _ => panic!(
                "`{}` is not a write term of the query",
                std::any::type_name::<T>()
            ),
        };
        // SAFETY: the column of `T` is exclusively borrowed by the running
        // query, `row` is in bounds and `&mut self` prevents aliasing
        Some(unsafe { &mut *ptr.cast::<T>().add(self.row) })
    }

    /// Shared access to a required `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not a term of the query with data access, or if it
    /// is absent in this group.
    #[must_use]
    pub fn get<T: Component>(&self) -> &T {
        self.get_optional::<T>().unwrap_or_else(|| {
            panic!(
                "`{}` is absent here; use get_optional for optional terms",
                std::any::type_name::<T>()
            )
        })
    }

    /// Exclusive access to a required `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not a write term of the query, or if it is absent
    /// in this group.
    #[must_use]
    pub fn get_mut<T: Component>(&mut self) -> &mut T {
        self.get_optional_mut::<T>().unwrap_or_else(|| {
            panic!(
                "`{}` is absent here; use get_optional_mut for optional terms",
                std::any::type_name::<T>()
            )
        })
    }

    /// Whether the entity has `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not a term of the query.
    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        !matches!(self.slot::<T>().1, Handle::Absent)
    }

    fn is_write<T: Component>(&self) -> bool {
        self.terms[self.slot::<T>().0].descriptor.is_write()
    }
}

impl fmt::Debug for QueryRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRow")
            .field("handle", &self.handle())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    struct Enemy;

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    struct Dead;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Health(u32);

    fn world() -> World {
        let mut world = World::new();
        world.register_component::<Position>().unwrap();
        world.register_component::<Velocity>().unwrap();
        world.register_component::<Enemy>().unwrap();
        world.register_component::<Dead>().unwrap();
        world.register_component::<Health>().unwrap();
        world
    }

    fn pos(x: f32) -> Position {
        Position { x, y: 0.0 }
    }

    fn vel(x: f32) -> Velocity {
        Velocity { x, y: 0.0 }
    }

    #[test]
    fn test_simple_query() {
        let mut world = world();

        world.create_entity((pos(1.0), vel(0.1))).unwrap();
        world.create_entity((pos(3.0), vel(0.3))).unwrap();
        // Only Position, no Velocity
        world.create_entity((pos(5.0),)).unwrap();

        let query = world.query().read::<Position>().read::<Velocity>().build().unwrap();
        assert_eq!(query.count(&world), 2);

        let all = world.query().read::<Position>().build().unwrap();
        assert_eq!(all.count(&world), 3);
    }

    #[test]
    fn test_query_get_components() {
        let mut world = world();
        world.create_entity((Health(7), pos(1.0), vel(0.5))).unwrap();

        let query = world.query().read::<Position>().read::<Velocity>().build().unwrap();

        let mut seen = 0;
        query.for_each_read(&world, |row| {
            assert_eq!(row.get::<Position>().x, 1.0);
            assert_eq!(row.get::<Velocity>().x, 0.5);
            seen += 1;
        });
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_write_query() {
        let mut world = world();
        let a = world.create_entity((pos(1.0), vel(2.0))).unwrap();
        world.create_entity((pos(10.0), vel(-1.0), Enemy)).unwrap();

        let query = world.query().write::<Position>().read::<Velocity>().build().unwrap();
        query.for_each(&mut world, |mut row| {
            let dx = row.get::<Velocity>().x;
            row.get_mut::<Position>().x += dx;
        });

        assert_eq!(world.get::<Position>(a).unwrap().x, 3.0);
        let xs = world.query().read::<Position>().with::<Enemy>().build().unwrap();
        xs.for_each_read(&world, |row| assert_eq!(row.get::<Position>().x, 9.0));
    }

    #[test]
    fn test_optional_query() {
        let mut world = world();
        world.create_entity((pos(1.0), vel(0.1))).unwrap();
        world.create_entity((pos(3.0),)).unwrap();

        let query = world
            .query()
            .read::<Position>()
            .optional_read::<Velocity>()
            .build()
            .unwrap();

        let mut with_vel = 0;
        let mut without_vel = 0;
        query.for_each_read(&world, |row| match row.get_optional::<Velocity>() {
            Some(_) => with_vel += 1,
            None => without_vel += 1,
        });

        assert_eq!(with_vel, 1);
        assert_eq!(without_vel, 1);
    }

    #[test]
    fn test_optional_write() {
        let mut world = world();
        world.create_entity((Health(1), pos(0.0))).unwrap();
        world.create_entity((pos(0.0),)).unwrap();

        let query = world
            .query()
            .read::<Position>()
            .optional_write::<Health>()
            .build()
            .unwrap();

        let mut healed = 0;
        query.for_each(&mut world, |mut row| {
            if let Some(hp) = row.get_optional_mut::<Health>() {
                hp.0 += 10;
                healed += 1;
            }
        });

        assert_eq!(healed, 1);
        let hp = world.query().read::<Health>().build().unwrap();
        hp.for_each_read(&world, |row| assert_eq!(row.get::<Health>(), &Health(11)));
    }

    #[test]
    fn test_with_filter() {
        let mut world = world();
        world.create_entity((pos(1.0), Enemy)).unwrap();
        world.create_entity((pos(3.0),)).unwrap();

        let query = world.query().read::<Position>().with::<Enemy>().build().unwrap();

        let mut xs = Vec::new();
        query.for_each_read(&world, |row| {
            assert!(row.has::<Enemy>());
            xs.push(row.get::<Position>().x);
        });
        assert_eq!(xs, vec![1.0]);
    }

    #[test]
    fn test_without() {
        let mut world = world();
        world.create_entity((pos(1.0), Dead)).unwrap();
        world.create_entity((pos(3.0),)).unwrap();

        let query = world.query().read::<Position>().without::<Dead>().build().unwrap();

        let mut xs = Vec::new();
        query.for_each_read(&world, |row| xs.push(row.get::<Position>().x));
        assert_eq!(xs, vec![3.0]);
    }

    #[test]
    fn test_combined_filters() {
        let mut world = world();
        // Position + Enemy: matches
        world.create_entity((pos(1.0), Enemy)).unwrap();
        // Position + Enemy + Dead: excluded
        world.create_entity((pos(2.0), Enemy, Dead)).unwrap();
        // Position only: no Enemy
        world.create_entity((pos(3.0),)).unwrap();

        let query = world
            .query()
            .read::<Position>()
            .with::<Enemy>()
            .without::<Dead>()
            .build()
            .unwrap();

        let mut xs = Vec::new();
        query.for_each_read(&world, |row| xs.push(row.get::<Position>().x));
        assert_eq!(xs, vec![1.0]);
    }

    #[test]
    fn test_resolve_slots() {
        let mut world = world();
        world.create_entity((pos(1.0), Enemy)).unwrap();

        let query = world
            .query()
            .write::<Position>()
            .with::<Enemy>()
            .optional_read::<Velocity>()
            .without::<Dead>()
            .build()
            .unwrap();

        let (_, group) = world.groups().groups().next().unwrap();
        let resolved = query.resolve(group).unwrap();
        let pos_idx = group.column_index(world.component_id::<Position>().unwrap()).unwrap();
        assert_eq!(
            resolved.slots(),
            &[Slot::Exclusive(pos_idx), Slot::Marker, Slot::Absent, Slot::Absent]
        );
    }

    #[test]
    fn test_rows_in_row_order() {
        let mut world = world();
        for i in 0..5 {
            world.create_entity((Health(i),)).unwrap();
        }

        let query = world.query().read::<Health>().build().unwrap();
        let mut rows = Vec::new();
        query.for_each_read(&world, |row| {
            assert_eq!(row.handle().row(), row.row());
            rows.push((row.row(), row.get::<Health>().0));
        });
        assert_eq!(rows, vec![(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]);
    }

    #[test]
    fn test_min_group_size() {
        let world = world();
        let query = world
            .query()
            .read::<Position>()
            .with::<Enemy>()
            .optional_read::<Velocity>()
            .without::<Dead>()
            .build()
            .unwrap();
        assert_eq!(query.min_group_size(), 2);

        let only_optional = world.query().optional_read::<Velocity>().build().unwrap();
        assert_eq!(only_optional.min_group_size(), 1);
    }

    #[test]
    fn test_unregistered_term_fails_build() {
        struct Unknown;

        let world = world();
        let err = world
            .query()
            .read::<Position>()
            .read::<Unknown>()
            .build()
            .unwrap_err();
        assert!(matches!(err, EcsError::UnregisteredComponent { name } if name.ends_with("Unknown")));
    }

    #[test]
    #[should_panic(expected = "appears twice")]
    fn test_duplicate_term_panics() {
        let world = world();
        let _ = world.query().read::<Position>().write::<Position>().build();
    }

    #[test]
    #[should_panic(expected = "not a write term")]
    fn test_get_mut_on_read_term_panics() {
        let mut world = world();
        world.create_entity((pos(1.0),)).unwrap();

        let query = world.query().read::<Position>().build().unwrap();
        query.for_each(&mut world, |mut row| {
            let _ = row.get_mut::<Position>();
        });
    }

    #[test]
    #[should_panic(expected = "not part of the query")]
    fn test_get_foreign_type_panics() {
        let mut world = world();
        world.create_entity((pos(1.0), vel(1.0))).unwrap();

        let query = world.query().read::<Position>().build().unwrap();
        query.for_each_read(&world, |row| {
            let _ = row.get::<Velocity>();
        });
    }

    #[test]
    #[should_panic(expected = "without write terms")]
    fn test_for_each_read_rejects_writes() {
        let world = world();
        let query = world.query().write::<Position>().build().unwrap();
        query.for_each_read(&world, |_| {});
    }

    #[test]
    fn test_query_access_conflicts() {
        let world = world();
        let movement = world.query().write::<Position>().read::<Velocity>().build().unwrap();
        let render = world.query().read::<Position>().build().unwrap();
        let ai = world.query().read::<Velocity>().with::<Enemy>().build().unwrap();

        assert!(!movement.access().is_compatible(render.access()));
        assert!(movement.access().is_compatible(ai.access()));
        assert!(render.access().is_compatible(ai.access()));
    }
}
