//! The group arena - every group's columns in one segmented buffer.
//!
//! All columns of all groups live in a single flat `Vec<ErasedColumn>`,
//! ordered first by group size (number of component types) and then
//! lexicographically by the group's sorted id sequence:
//!
//! ```text
//!  size 1          size 2                size 3
//! ┌─────┬─────┬──────────┬──────────┬───────────────┐
//! │ [0] │ [2] │ [0]  [1] │ [1]  [2] │ [0]  [1]  [2] │
//! └─────┴─────┴──────────┴──────────┴───────────────┘
//!  ^offsets[0]  ^offsets[1]           ^offsets[2]     ^offsets[3]
//! ```
//!
//! `offsets[k - 1]..offsets[k]` is the region of size class `k`. Inside a
//! region groups have a fixed stride, so a lookup is a binary search over
//! `region.len() / k` candidates.
//!
//! Creating a group shifts the buffer tail right and bumps every later
//! offset, which costs O(buffer length). Distinct groups are few compared
//! to entities, and groups are never destroyed.

use std::{fmt, ops::Range};

use smallvec::SmallVec;

use crate::{
    archetype::{Group, GroupMut},
    component::{ComponentId, ComponentRegistry},
    entity::GroupRef,
    storage::ErasedColumn,
};

type IdVec = SmallVec<[ComponentId; 8]>;

/// Owner of every group's columns.
pub struct GroupArena {
    columns: Vec<ErasedColumn>,
    /// `offsets[k - 1]` is where size class `k` starts, `offsets[k]` where it
    /// ends. Always holds at least the leading `0`.
    offsets: Vec<usize>,
    /// Columns of a group being created. Empty outside of `insert_scratch`.
    scratch: Vec<ErasedColumn>,
}

impl Default for GroupArena {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an arena with room for `columns` columns before reallocating.
    #[must_use]
    pub fn with_capacity(columns: usize) -> Self {
        Self {
            columns: Vec::with_capacity(columns),
            offsets: vec![0],
            scratch: Vec::new(),
        }
    }

    /// Largest size class the offset table covers.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total number of columns across all groups.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of groups of every size.
    #[must_use]
    pub fn group_count(&self) -> usize {
        (1..=self.max_size()).map(|size| self.range(size).len()).sum()
    }

    /// Number of rows across all groups.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.groups().map(|(_, group)| group.len()).sum()
    }

    fn bounds(&self, size: usize) -> Range<usize> {
        assert!(size > 0, "size class 0 does not exist");
        if size > self.max_size() {
            let end = self.columns.len();
            return end..end;
        }
        self.offsets[size - 1]..self.offsets[size]
    }

    /// The groups of exactly `size` component types, in id order.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    #[must_use]
    pub fn range(&self, size: usize) -> GroupRange<'_> {
        let bounds = self.bounds(size);
        GroupRange {
            start: bounds.start,
            columns: &self.columns[bounds],
            size,
        }
    }

    /// Find the group with exactly the sorted ids `ids`.
    ///
    /// # Panics
    ///
    /// Panics if `ids` is empty. Sortedness is checked in debug builds.
    #[must_use]
    pub fn find(&self, ids: &[ComponentId]) -> Option<GroupRef> {
        assert!(!ids.is_empty(), "a group has at least one component");
        debug_assert!(
            ids.windows(2).all(|w| w[0] < w[1]),
            "ids must be strictly sorted"
        );

        if ids.len() > self.max_size() {
            return None;
        }

        let range = self.range(ids.len());
        range.search(ids).ok().map(|idx| range.group_ref(idx))
    }

    /// Find the group with the ids `ids` (any order), creating it if unseen.
    ///
    /// New columns come from the registry's column factories.
    ///
    /// # Panics
    ///
    /// Panics if `ids` is empty or holds a duplicate.
    pub fn find_or_create(&mut self, ids: &[ComponentId], registry: &ComponentRegistry) -> GroupRef {
        let sorted = sorted_ids(ids);
        if let Some(found) = self.find(&sorted) {
            return found;
        }

        debug_assert!(self.scratch.is_empty());
        self.scratch
            .extend(sorted.iter().map(|&id| registry.info(id).new_column()));
        self.insert_scratch(&sorted)
    }

    /// Like [`find_or_create`](Self::find_or_create), for the group an entity
    /// of `source` moves to.
    ///
    /// Columns whose id is also in `source` are duplicated from it (same
    /// storage type, no data), others come from the registry.
    ///
    /// # Panics
    ///
    /// Panics if `ids` is empty or holds a duplicate.
    pub fn find_or_create_from(
        &mut self,
        source: GroupRef,
        ids: &[ComponentId],
        registry: &ComponentRegistry,
    ) -> GroupRef {
        let sorted = sorted_ids(ids);
        if let Some(found) = self.find(&sorted) {
            return found;
        }

        debug_assert!(self.scratch.is_empty());
        let source_columns = &self.columns[source.columns()];
        for &id in &sorted {
            let column = match source_columns.binary_search_by_key(&id, ErasedColumn::id) {
                Ok(idx) => source_columns[idx].empty_like(),
                Err(_) => registry.info(id).new_column(),
            };
            self.scratch.push(column);
        }
        self.insert_scratch(&sorted)
    }

    /// Move the scratch columns into the buffer as the group `sorted`.
    fn insert_scratch(&mut self, sorted: &[ComponentId]) -> GroupRef {
        let size = sorted.len();
        debug_assert_eq!(self.scratch.len(), size);

        if self.max_size() < size {
            let end = self.columns.len();
            self.offsets.resize(size + 1, end);
        }

        let idx = match self.range(size).search(sorted) {
            Err(idx) => idx,
            Ok(_) => unreachable!("group {sorted:?} already exists"),
        };
        let at = self.offsets[size - 1] + idx * size;

        self.columns
            .splice(at..at, self.scratch.drain(..))
            .for_each(drop);
        for offset in &mut self.offsets[size..] {
            *offset += size;
        }

        tracing::debug!(
            ids = ?sorted,
            size,
            position = at,
            groups = self.group_count(),
            "created group"
        );

        GroupRef::new(at, size)
    }

    /// A shared view of the group at `group`.
    ///
    /// # Panics
    ///
    /// Panics if the locator is out of bounds.
    #[must_use]
    pub fn group(&self, group: GroupRef) -> Group<'_> {
        Group::new(&self.columns[group.columns()])
    }

    /// An exclusive view of the group at `group`.
    ///
    /// # Panics
    ///
    /// Panics if the locator is out of bounds.
    #[must_use]
    pub fn group_mut(&mut self, group: GroupRef) -> GroupMut<'_> {
        GroupMut::new(&mut self.columns[group.columns()])
    }

    /// Exclusive views of two different groups at once.
    ///
    /// # Panics
    ///
    /// Panics if the groups overlap.
    #[must_use]
    pub fn pair_mut(&mut self, a: GroupRef, b: GroupRef) -> (GroupMut<'_>, GroupMut<'_>) {
        assert_ne!(a.start(), b.start(), "groups must not overlap");
        if a.start() < b.start() {
            assert!(a.columns().end <= b.start(), "groups must not overlap");
            let (low, high) = self.columns.split_at_mut(b.start());
            (
                GroupMut::new(&mut low[a.columns()]),
                GroupMut::new(&mut high[..b.size()]),
            )
        } else {
            let (b_view, a_view) = self.pair_mut(b, a);
            (a_view, b_view)
        }
    }

    /// Every group with its locator, smallest size class first.
    pub fn groups(&self) -> Groups<'_> {
        self.groups_from(1)
    }

    /// Every group of at least `min_size` component types.
    ///
    /// # Panics
    ///
    /// Panics if `min_size` is zero.
    pub fn groups_from(&self, min_size: usize) -> Groups<'_> {
        let start = self.bounds(min_size).start;
        Groups {
            rest: &self.columns[start..],
            offsets: &self.offsets,
            size: min_size,
            pos: start,
        }
    }

    /// Every group of at least `min_size` component types, mutably.
    ///
    /// # Panics
    ///
    /// Panics if `min_size` is zero.
    pub fn groups_mut_from(&mut self, min_size: usize) -> GroupsMut<'_> {
        let start = self.bounds(min_size).start;
        GroupsMut {
            rest: &mut self.columns[start..],
            offsets: &self.offsets,
            size: min_size,
            pos: start,
        }
    }
}

impl fmt::Debug for GroupArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupArena")
            .field("offsets", &self.offsets)
            .field("groups", &self.groups().map(|(_, g)| g).collect::<Vec<_>>())
            .finish()
    }
}

/// Sort `ids`, rejecting duplicates.
fn sorted_ids(ids: &[ComponentId]) -> IdVec {
    let mut sorted: IdVec = ids.iter().copied().collect();
    sorted.sort_unstable();
    assert!(
        sorted.windows(2).all(|w| w[0] != w[1]),
        "a group cannot hold the same component twice: {ids:?}"
    );
    sorted
}

/// The groups of one size class, viewed with a stride of the class size.
#[derive(Clone, Copy)]
pub struct GroupRange<'a> {
    start: usize,
    columns: &'a [ErasedColumn],
    size: usize,
}

impl<'a> GroupRange<'a> {
    /// Number of groups in the class.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len() / self.size
    }

    /// Whether the class has no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The class size (columns per group).
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The `idx`-th group of the class.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<Group<'a>> {
        let at = idx.checked_mul(self.size)?;
        let end = at.checked_add(self.size)?;
        self.columns.get(at..end).map(Group::new)
    }

    /// Locator of the `idx`-th group of the class.
    #[must_use]
    pub fn group_ref(&self, idx: usize) -> GroupRef {
        GroupRef::new(self.start + idx * self.size, self.size)
    }

    /// The groups in id order.
    pub fn iter(&self) -> impl Iterator<Item = Group<'a>> + use<'a> {
        self.columns.chunks_exact(self.size).map(Group::new)
    }

    /// Binary search for the sorted ids `ids`: `Ok(index)` of the match, or
    /// `Err(index)` where it would be inserted.
    pub fn search(&self, ids: &[ComponentId]) -> Result<usize, usize> {
        let (mut low, mut high) = (0, self.len());
        while low < high {
            let mid = low + (high - low) / 2;
            let group = Group::new(&self.columns[mid * self.size..(mid + 1) * self.size]);
            match group.cmp_ids(ids) {
                std::cmp::Ordering::Less => low = mid + 1,
                std::cmp::Ordering::Greater => high = mid,
                std::cmp::Ordering::Equal => return Ok(mid),
            }
        }
        Err(low)
    }
}

impl fmt::Debug for GroupRange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over groups of consecutive size classes.
pub struct Groups<'a> {
    rest: &'a [ErasedColumn],
    offsets: &'a [usize],
    size: usize,
    pos: usize,
}

impl<'a> Iterator for Groups<'a> {
    type Item = (GroupRef, Group<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        while self.size < self.offsets.len() && self.pos >= self.offsets[self.size] {
            self.size += 1;
        }
        if self.size >= self.offsets.len() || self.rest.is_empty() {
            return None;
        }

        let (head, tail) = self.rest.split_at(self.size);
        self.rest = tail;
        let group = GroupRef::new(self.pos, self.size);
        self.pos += self.size;
        Some((group, Group::new(head)))
    }
}

/// Mutable iterator over groups of consecutive size classes.
pub struct GroupsMut<'a> {
    rest: &'a mut [ErasedColumn],
    offsets: &'a [usize],
    size: usize,
    pos: usize,
}

impl<'a> Iterator for GroupsMut<'a> {
    type Item = (GroupRef, GroupMut<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        while self.size < self.offsets.len() && self.pos >= self.offsets[self.size] {
            self.size += 1;
        }
        if self.size >= self.offsets.len() || self.rest.is_empty() {
            return None;
        }

        let (head, tail) = std::mem::take(&mut self.rest).split_at_mut(self.size);
        self.rest = tail;
        let group = GroupRef::new(self.pos, self.size);
        self.pos += self.size;
        Some((group, GroupMut::new(head)))
    }
}
