//! Archetype tables - views over a sorted run of columns.
//!
//! A group (archetype) is every entity that owns exactly the same set of
//! component types. Its table is a contiguous run of [`ErasedColumn`]s, one
//! per component type, strictly sorted by [`ComponentId`], all of equal
//! length. The columns themselves live in the [`GroupArena`](crate::GroupArena)
//! buffer; [`Group`] and [`GroupMut`] borrow one run of it.

use std::{cmp::Ordering, fmt};

use smallvec::SmallVec;

use crate::{bundle::Bundle, component::ComponentId, storage::ErasedColumn};

/// A shared view of one group's columns.
#[derive(Clone, Copy)]
pub struct Group<'a> {
    columns: &'a [ErasedColumn],
}

impl<'a> Group<'a> {
    /// View `columns` as a group.
    ///
    /// # Panics
    ///
    /// Panics if `columns` is empty. Sortedness is checked in debug builds.
    #[must_use]
    pub fn new(columns: &'a [ErasedColumn]) -> Self {
        assert!(!columns.is_empty(), "a group has at least one column");
        debug_assert!(
            columns.windows(2).all(|w| w[0].id() < w[1].id()),
            "group columns must be strictly sorted by component id"
        );
        debug_assert!(
            columns.iter().all(|c| c.len() == columns[0].len()),
            "group columns must have equal length"
        );
        Self { columns }
    }

    /// Number of component types.
    #[must_use]
    pub fn size(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows (entities).
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    /// Whether the group holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The group's columns, sorted by id.
    #[must_use]
    pub fn columns(&self) -> &'a [ErasedColumn] {
        self.columns
    }

    /// The sorted component ids.
    pub fn ids(self) -> impl Iterator<Item = ComponentId> + 'a {
        self.columns.iter().map(ErasedColumn::id)
    }

    /// The sorted component ids, collected.
    #[must_use]
    pub fn id_vec(&self) -> SmallVec<[ComponentId; 8]> {
        self.ids().collect()
    }

    /// Position of `id`'s column, by binary search.
    #[must_use]
    pub fn column_index(&self, id: ComponentId) -> Option<usize> {
        column_index(self.columns, id)
    }

    /// Whether the group has a column for `id`.
    #[must_use]
    pub fn contains_id(&self, id: ComponentId) -> bool {
        self.column_index(id).is_some()
    }

    /// Whether every id of the sorted sequence `ids` is in this group.
    ///
    /// Merge walk over both sorted sequences, O(k + m).
    #[must_use]
    pub fn contains(&self, ids: &[ComponentId]) -> bool {
        debug_assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids must be sorted");

        let mut have = self.columns.iter().map(ErasedColumn::id);
        'wanted: for &want in ids {
            for id in have.by_ref() {
                match id.cmp(&want) {
                    Ordering::Less => {}
                    Ordering::Equal => continue 'wanted,
                    Ordering::Greater => return false,
                }
            }
            return false;
        }
        true
    }

    /// The column for `id`.
    ///
    /// # Panics
    ///
    /// Panics if the group has no such column.
    #[must_use]
    pub fn storage(&self, id: ComponentId) -> &'a ErasedColumn {
        self.get_storage(id)
            .unwrap_or_else(|| panic!("group {:?} has no column for {id:?}", self.id_vec()))
    }

    /// The column for `id`, if present.
    #[must_use]
    pub fn get_storage(&self, id: ComponentId) -> Option<&'a ErasedColumn> {
        self.column_index(id).map(|idx| &self.columns[idx])
    }

    /// Lexicographic comparison of this group's ids against `ids`.
    #[must_use]
    pub fn cmp_ids(&self, ids: &[ComponentId]) -> Ordering {
        self.ids().cmp(ids.iter().copied())
    }
}

impl PartialEq for Group<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.ids().eq(other.ids())
    }
}

impl Eq for Group<'_> {}

impl PartialOrd for Group<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Group<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ids().cmp(other.ids())
    }
}

impl fmt::Debug for Group<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("components", &self.id_vec())
            .field("entity_count", &self.len())
            .finish()
    }
}

/// An exclusive view of one group's columns.
pub struct GroupMut<'a> {
    columns: &'a mut [ErasedColumn],
}

impl<'a> GroupMut<'a> {
    /// View `columns` as a mutable group.
    ///
    /// # Panics
    ///
    /// Panics if `columns` is empty. Sortedness is checked in debug builds.
    #[must_use]
    pub fn new(columns: &'a mut [ErasedColumn]) -> Self {
        let _ = Group::new(&*columns);
        Self { columns }
    }

    /// A shared view of the same group.
    #[must_use]
    pub fn as_group(&self) -> Group<'_> {
        Group {
            columns: &*self.columns,
        }
    }

    /// Number of component types.
    #[must_use]
    pub fn size(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows (entities).
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    /// Whether the group holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of `id`'s column, by binary search.
    #[must_use]
    pub fn column_index(&self, id: ComponentId) -> Option<usize> {
        column_index(self.columns, id)
    }

    /// The columns, mutably. The slice length and order cannot change.
    #[must_use]
    pub fn columns_mut(&mut self) -> &mut [ErasedColumn] {
        &mut *self.columns
    }

    /// Give up the view, keeping the borrow of the columns.
    #[must_use]
    pub fn into_columns(self) -> &'a mut [ErasedColumn] {
        self.columns
    }

    /// The column for `id`, mutably.
    ///
    /// # Panics
    ///
    /// Panics if the group has no such column.
    #[must_use]
    pub fn storage_mut(&mut self, id: ComponentId) -> &mut ErasedColumn {
        match self.column_index(id) {
            Some(idx) => &mut self.columns[idx],
            None => panic!("group {:?} has no column for {id:?}", self.as_group().id_vec()),
        }
    }

    /// Append one row built from `bundle`, returning its index.
    ///
    /// `ids` are the bundle's component ids in bundle order and must cover
    /// exactly this group's columns.
    pub fn emplace_row<B: Bundle>(&mut self, bundle: B, ids: &[ComponentId]) -> usize {
        assert_eq!(
            ids.len(),
            self.size(),
            "a row must provide one value per column"
        );

        let row = self.len();
        bundle.push_into(self, ids);

        debug_assert!(
            self.columns.iter().all(|c| c.len() == row + 1),
            "every column must grow by exactly one row"
        );

        tracing::trace!(row, size = self.size(), "emplaced row");
        row
    }

    /// Erase `row` from every column, preserving the order of later rows.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn erase_row(&mut self, row: usize) {
        assert!(row < self.len(), "row {row} out of bounds");

        for column in self.columns.iter_mut() {
            column.erase(row);
        }

        tracing::trace!(row, size = self.size(), "erased row");
    }
}

impl fmt::Debug for GroupMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_group(), f)
    }
}

fn column_index(columns: &[ErasedColumn], id: ComponentId) -> Option<usize> {
    columns.binary_search_by_key(&id, ErasedColumn::id).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentRegistry;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    fn columns(registry: &ComponentRegistry, ids: &[ComponentId]) -> Vec<ErasedColumn> {
        let mut cols: Vec<ErasedColumn> =
            ids.iter().map(|&id| registry.info(id).new_column()).collect();
        cols.sort();
        cols
    }

    fn setup() -> (ComponentRegistry, ComponentId, ComponentId, ComponentId) {
        let mut registry = ComponentRegistry::new();
        let pos = registry.register::<Position>().unwrap();
        let vel = registry.register::<Velocity>().unwrap();
        let hp = registry.register::<Health>().unwrap();
        (registry, pos, vel, hp)
    }

    #[test]
    fn test_group_contains() {
        let (registry, pos, vel, hp) = setup();
        let cols = columns(&registry, &[hp, pos]);
        let group = Group::new(&cols);

        assert_eq!(group.size(), 2);
        assert!(group.contains(&[pos]));
        assert!(group.contains(&[pos, hp]));
        assert!(!group.contains(&[vel]));
        assert!(!group.contains(&[pos, vel]));
        assert!(group.contains(&[]));
        assert!(group.contains_id(hp));
        assert!(!group.contains_id(vel));
    }

    #[test]
    fn test_emplace_and_erase_rows() {
        let (registry, pos, vel, _) = setup();
        let mut cols = columns(&registry, &[pos, vel]);
        let mut group = GroupMut::new(&mut cols);

        for i in 0..4 {
            let row = group.emplace_row(
                (
                    Velocity { x: i as f32, y: 0.0 },
                    Position { x: 0.0, y: i as f32 },
                ),
                &[vel, pos],
            );
            assert_eq!(row, i);
        }

        group.erase_row(1);

        let group = group.as_group();
        assert_eq!(group.len(), 3);
        let ys: Vec<f32> = group
            .storage(pos)
            .as_slice::<Position>()
            .iter()
            .map(|p| p.y)
            .collect();
        let xs: Vec<f32> = group
            .storage(vel)
            .as_slice::<Velocity>()
            .iter()
            .map(|v| v.x)
            .collect();
        assert_eq!(ys, vec![0.0, 2.0, 3.0]);
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_group_ordering() {
        let (registry, pos, vel, hp) = setup();
        let a = columns(&registry, &[pos, vel]);
        let b = columns(&registry, &[pos, hp]);
        let c = columns(&registry, &[vel, pos]);

        assert!(Group::new(&a) < Group::new(&b));
        assert_eq!(Group::new(&a), Group::new(&c));
        assert_eq!(Group::new(&b).cmp_ids(&[pos, vel]), Ordering::Greater);
        assert_eq!(Group::new(&a).cmp_ids(&[pos, vel]), Ordering::Equal);
    }

    #[test]
    #[should_panic(expected = "has no column")]
    fn test_storage_for_missing_id_panics() {
        let (registry, pos, vel, _) = setup();
        let cols = columns(&registry, &[pos]);
        let _ = Group::new(&cols).storage(vel);
    }

    #[test]
    #[should_panic(expected = "one value per column")]
    fn test_partial_row_is_rejected() {
        let (registry, pos, vel, _) = setup();
        let mut cols = columns(&registry, &[pos, vel]);
        GroupMut::new(&mut cols).emplace_row((Position { x: 0.0, y: 0.0 },), &[pos]);
    }
}
