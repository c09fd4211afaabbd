//! Sparse slot storage - the default column type.
//!
//! Maps an external small integer key to a densely packed slot:
//!
//! - `sparse[key]` is the dense position of `key`, or [`EMPTY`]
//! - `dense[pos]` is the packed value
//! - `keys[pos]` is the key that owns `dense[pos]`
//!
//! Erasing shifts later slots down by one instead of swapping the last slot
//! in. Every column of a group erases the same row, so all columns must move
//! their rows the same way to stay aligned.

use std::fmt;

use crate::{component::Component, storage::Column};

/// Sentinel for a key with no slot.
pub const EMPTY: u32 = u32::MAX;

/// Densely packed values addressed by sparse external keys.
pub struct SparseSlots<T> {
    sparse: Vec<u32>,
    dense: Vec<T>,
    keys: Vec<u32>,
    /// Keys released by `erase`, reused last-in first-out by `Column::push`.
    free: Vec<u32>,
}

impl<T> Default for SparseSlots<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseSlots<T> {
    /// Create empty storage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            keys: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Create storage with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: Vec::with_capacity(capacity),
            dense: Vec::with_capacity(capacity),
            keys: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Insert a slot for `key` at the end of the dense array.
    ///
    /// `key` must not already hold a value.
    pub fn push(&mut self, key: u32, value: T) {
        assert_ne!(key, EMPTY, "key u32::MAX is reserved as the empty sentinel");
        debug_assert!(!self.contains(key), "key {key} already holds a value");

        let idx = key as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, EMPTY);
        }

        self.sparse[idx] = self.dense.len() as u32;
        self.dense.push(value);
        self.keys.push(key);
    }

    /// Dense position of `key`, if it holds a value.
    #[must_use]
    pub fn position(&self, key: u32) -> Option<usize> {
        match self.sparse.get(key as usize) {
            Some(&pos) if pos != EMPTY => Some(pos as usize),
            _ => None,
        }
    }

    /// Whether `key` holds a value.
    #[must_use]
    pub fn contains(&self, key: u32) -> bool {
        self.position(key).is_some()
    }

    /// The value stored for `key`.
    #[must_use]
    pub fn get(&self, key: u32) -> Option<&T> {
        self.position(key).map(|pos| &self.dense[pos])
    }

    /// The value stored for `key`, mutably.
    #[must_use]
    pub fn get_mut(&mut self, key: u32) -> Option<&mut T> {
        self.position(key).map(|pos| &mut self.dense[pos])
    }

    /// The key owning dense position `pos`.
    #[must_use]
    pub fn key_at(&self, pos: usize) -> Option<u32> {
        self.keys.get(pos).copied()
    }

    /// Remove the slot for `key`, shifting later slots down by one.
    pub fn erase(&mut self, key: u32) -> Option<T> {
        let pos = self.position(key)?;

        let value = self.dense.remove(pos);
        self.keys.remove(pos);
        self.sparse[key as usize] = EMPTY;

        for (shifted, &k) in self.keys.iter().enumerate().skip(pos) {
            self.sparse[k as usize] = shifted as u32;
        }

        Some(value)
    }

    /// Remove every slot.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.keys.clear();
        self.free.clear();
    }

    /// Values in dense order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.dense
    }

    /// Values in dense order, mutably.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.dense
    }

    /// Keys in dense order.
    #[must_use]
    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    /// `(key, value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.keys.iter().copied().zip(self.dense.iter())
    }

    /// The most recently released key if any, else the next fresh one.
    fn next_key(&mut self) -> u32 {
        self.free.pop().unwrap_or(self.sparse.len() as u32)
    }
}

impl<T: Component> Column for SparseSlots<T> {
    type Item = T;

    fn push(&mut self, value: T) {
        let key = self.next_key();
        Self::push(self, key, value);
    }

    fn erase(&mut self, row: usize) -> T {
        let key = self.keys[row];
        let value = Self::erase(self, key).expect("row key must hold a value");
        self.free.push(key);
        value
    }

    fn as_slice(&self) -> &[T] {
        &self.dense
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.dense
    }
}

impl<T: fmt::Debug> fmt::Debug for SparseSlots<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
