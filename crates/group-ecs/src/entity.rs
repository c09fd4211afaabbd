//! Locators for groups and rows inside the group arena.
//!
//! Both are plain positions into the arena's flat column buffer. Any
//! structural mutation (a new group, a row inserted or erased) may move
//! them, so they are only valid until the next one.

use std::fmt;

/// Position of one group inside the arena's column buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupRef {
    start: usize,
    size: usize,
}

impl GroupRef {
    pub(crate) const fn new(start: usize, size: usize) -> Self {
        Self { start, size }
    }

    /// Index of the group's first column in the arena buffer.
    #[must_use]
    pub const fn start(self) -> usize {
        self.start
    }

    /// Number of component types in the group.
    #[must_use]
    pub const fn size(self) -> usize {
        self.size
    }

    /// Buffer range covered by the group's columns.
    #[must_use]
    pub const fn columns(self) -> std::ops::Range<usize> {
        self.start..self.start + self.size
    }

    /// The locator after `count` columns were inserted at buffer index `at`.
    #[must_use]
    pub const fn relocate(self, at: usize, count: usize) -> Self {
        if self.start >= at {
            Self::new(self.start + count, self.size)
        } else {
            self
        }
    }
}

impl fmt::Debug for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupRef({}+{})", self.start, self.size)
    }
}

/// An entity's location: its group and its row within that group.
///
/// Valid only until the next structural mutation of the world; using a stale
/// handle is a precondition violation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle {
    group: GroupRef,
    row: usize,
}

impl EntityHandle {
    /// Create a handle for `row` of `group`.
    #[must_use]
    pub const fn new(group: GroupRef, row: usize) -> Self {
        Self { group, row }
    }

    /// The group holding the entity.
    #[must_use]
    pub const fn group(self) -> GroupRef {
        self.group
    }

    /// The entity's row within its group.
    #[must_use]
    pub const fn row(self) -> usize {
        self.row
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityHandle({:?}, row {})", self.group, self.row)
    }
}
