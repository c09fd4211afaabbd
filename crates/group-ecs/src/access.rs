//! Access descriptors and the concurrency check.
//!
//! Every term of a query declares which component it touches, how
//! ([`AccessMode`]) and whether the component must be there ([`Presence`]).
//! The same descriptors drive group filtering and the decision whether two
//! queries may run at the same time.

use std::fmt;

use smallvec::SmallVec;

use crate::component::ComponentId;

/// What a query may do to a component's storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Shared access to the values.
    Read,
    /// Exclusive access to the values.
    Write,
    /// No access to the values; only presence is observed.
    Inaccessible,
}

/// Whether a component must, may or must not be present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Presence {
    /// The group must have the component.
    Require,
    /// The group may have the component.
    Optional,
    /// The group must not have the component.
    Exclude,
}

/// One term of a query: a component, an access mode and a presence rule.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessDescriptor {
    /// The component the term refers to.
    pub component_id: ComponentId,
    /// How the values are accessed.
    pub mode: AccessMode,
    /// Whether the component must be present.
    pub presence: Presence,
}

impl AccessDescriptor {
    /// Create a descriptor.
    #[must_use]
    pub const fn new(component_id: ComponentId, mode: AccessMode, presence: Presence) -> Self {
        Self {
            component_id,
            mode,
            presence,
        }
    }

    /// Required shared access.
    #[must_use]
    pub const fn read(component_id: ComponentId) -> Self {
        Self::new(component_id, AccessMode::Read, Presence::Require)
    }

    /// Required exclusive access.
    #[must_use]
    pub const fn write(component_id: ComponentId) -> Self {
        Self::new(component_id, AccessMode::Write, Presence::Require)
    }

    /// The same descriptor with another presence rule.
    #[must_use]
    pub const fn with_presence(self, presence: Presence) -> Self {
        Self { presence, ..self }
    }

    /// Whether the term can observe or change component values.
    ///
    /// `Inaccessible` terms touch nothing and `Exclude` terms only run on
    /// groups without the component.
    #[must_use]
    pub const fn touches_data(&self) -> bool {
        !matches!(self.mode, AccessMode::Inaccessible)
            && !matches!(self.presence, Presence::Exclude)
    }

    /// Whether the term needs exclusive access.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self.mode, AccessMode::Write)
    }
}

impl fmt::Debug for AccessDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}({:?}, {:?})",
            self.mode, self.component_id, self.presence
        )
    }
}

/// Whether two terms can run on parallel threads.
///
/// They conflict only when they refer to the same component, both touch its
/// data and at least one writes.
#[must_use]
pub fn can_run_concurrently(a: &AccessDescriptor, b: &AccessDescriptor) -> bool {
    let conflict = a.component_id == b.component_id
        && a.touches_data()
        && b.touches_data()
        && (a.is_write() || b.is_write());
    !conflict
}

/// The descriptors of a whole query.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct QueryAccess {
    descriptors: SmallVec<[AccessDescriptor; 8]>,
}

impl QueryAccess {
    /// Collect the descriptors of one query.
    pub fn new(descriptors: impl IntoIterator<Item = AccessDescriptor>) -> Self {
        Self {
            descriptors: descriptors.into_iter().collect(),
        }
    }

    /// The descriptors, in declaration order.
    #[must_use]
    pub fn descriptors(&self) -> &[AccessDescriptor] {
        &self.descriptors
    }

    /// Whether no term writes.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        !self.descriptors.iter().any(AccessDescriptor::is_write)
    }

    /// Whether this query and `other` may run concurrently: every pair of
    /// descriptors across the two queries must be compatible.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.descriptors
            .iter()
            .all(|a| other.descriptors.iter().all(|b| can_run_concurrently(a, b)))
    }

    /// Every conflicting descriptor pair across the two queries.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> Vec<(AccessDescriptor, AccessDescriptor)> {
        self.descriptors
            .iter()
            .flat_map(|a| other.descriptors.iter().map(move |b| (*a, *b)))
            .filter(|(a, b)| !can_run_concurrently(a, b))
            .collect()
    }
}

impl fmt::Debug for QueryAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.descriptors).finish()
    }
}
