//! Column storage - the per-component containers of a group and their
//! type-erased wrapper.
//!
//! A [`Column`] owns every instance of one component type in one group.
//! [`ErasedColumn`] boxes a column behind the object-safe `AnyColumn` trait
//! so the group arena can sort, duplicate and reshuffle columns without
//! knowing their concrete types. Each erased operation is a single vtable
//! call; the vtable is fixed when the column is built, and dropping the
//! erased column drops the concrete one through the same vtable.

use std::{
    any::{Any, TypeId},
    cmp::Ordering,
    fmt,
    mem::{ManuallyDrop, MaybeUninit},
};

use crate::component::{Component, ComponentId};

/// A container holding all values of one component type in one group.
///
/// Rows are dense positions `0..len()`, and `as_slice` is the source of
/// truth for how many there are. `erase` must preserve the order of the
/// remaining rows: every column of a group erases the same row, and the
/// rows stay aligned only if all of them shift the same way.
///
/// Row access goes through [`ErasedColumn`] or `as_slice`; the trait adds no
/// `get`, so it never shadows the slice methods of `Vec`.
pub trait Column: Default + Send + Sync + 'static {
    /// The component type stored in this column.
    type Item: Component;

    /// Number of rows.
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the column has no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a value as the last row.
    fn push(&mut self, value: Self::Item);

    /// Remove and return the value at `row`, shifting later rows down.
    fn erase(&mut self, row: usize) -> Self::Item;

    /// All rows as a contiguous slice.
    fn as_slice(&self) -> &[Self::Item];

    /// All rows as a contiguous mutable slice.
    fn as_mut_slice(&mut self) -> &mut [Self::Item];
}

impl<T: Component> Column for Vec<T> {
    type Item = T;

    fn push(&mut self, value: T) {
        Vec::push(self, value);
    }

    fn erase(&mut self, row: usize) -> T {
        self.remove(row)
    }

    fn as_slice(&self) -> &[T] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }
}

/// Object-safe view of a [`Column`] of unknown concrete type.
///
/// Pointer and length always come from one `as_slice` call, so a column
/// whose `len` disagrees with its slice cannot widen a raw view.
trait AnyColumn: Any + Send + Sync {
    fn row_count(&self) -> usize;

    fn raw_parts(&self) -> (*const u8, usize);

    fn raw_parts_mut(&mut self) -> (*mut u8, usize);

    /// # Safety
    ///
    /// `value` must point to an initialized `Item` that the caller gives up.
    unsafe fn push_raw(&mut self, value: *mut u8);

    /// # Safety
    ///
    /// `out` must be valid for a write of one `Item`.
    unsafe fn take_raw(&mut self, row: usize, out: *mut u8);

    fn erase_row(&mut self, row: usize);

    fn empty_like(&self) -> Box<dyn AnyColumn>;

    fn move_row(&mut self, row: usize, dst: &mut dyn AnyColumn);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Column> AnyColumn for C {
    fn row_count(&self) -> usize {
        Column::as_slice(self).len()
    }

    fn raw_parts(&self) -> (*const u8, usize) {
        let slice = Column::as_slice(self);
        (slice.as_ptr().cast(), slice.len())
    }

    fn raw_parts_mut(&mut self) -> (*mut u8, usize) {
        let slice = Column::as_mut_slice(self);
        (slice.as_mut_ptr().cast(), slice.len())
    }

    unsafe fn push_raw(&mut self, value: *mut u8) {
        // SAFETY: caller hands over an initialized `C::Item`
        let value = unsafe { std::ptr::read(value.cast::<C::Item>()) };
        Column::push(self, value);
    }

    unsafe fn take_raw(&mut self, row: usize, out: *mut u8) {
        let value = Column::erase(self, row);
        // SAFETY: caller guarantees `out` is valid for one `C::Item`
        unsafe { std::ptr::write(out.cast::<C::Item>(), value) };
    }

    fn erase_row(&mut self, row: usize) {
        drop(Column::erase(self, row));
    }

    fn empty_like(&self) -> Box<dyn AnyColumn> {
        Box::new(C::default())
    }

    fn move_row(&mut self, row: usize, dst: &mut dyn AnyColumn) {
        let dst = dst
            .as_any_mut()
            .downcast_mut::<C>()
            .expect("rows can only move between columns of the same storage type");
        Column::push(dst, Column::erase(self, row));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A column of unknown concrete type, tagged with its component id.
///
/// Typed accessors check the component `TypeId` before any pointer cast, so
/// pairing a column with the wrong type panics instead of reading garbage.
pub struct ErasedColumn {
    id: ComponentId,
    type_id: TypeId,
    name: &'static str,
    item_size: usize,
    storage: Box<dyn AnyColumn>,
}

impl ErasedColumn {
    /// Build an empty column of type `C` for component `id`.
    #[must_use]
    pub fn new<C: Column>(id: ComponentId) -> Self {
        Self::from_column(id, C::default())
    }

    /// Wrap an existing column.
    #[must_use]
    pub fn from_column<C: Column>(id: ComponentId, column: C) -> Self {
        Self {
            id,
            type_id: TypeId::of::<C::Item>(),
            name: std::any::type_name::<C::Item>(),
            item_size: std::mem::size_of::<C::Item>(),
            storage: Box::new(column),
        }
    }

    /// The component id this column stores.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Type name of the stored component.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.row_count()
    }

    /// Whether the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this column stores `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    fn check<T: 'static>(&self) {
        assert!(
            self.is::<T>(),
            "{:?} stores `{}`, not `{}`",
            self.id,
            self.name,
            std::any::type_name::<T>()
        );
    }

    /// Pointer to the value at `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[must_use]
    pub fn get_ptr(&self, row: usize) -> *const u8 {
        let (ptr, len) = self.storage.raw_parts();
        assert!(row < len, "row {row} out of bounds in {:?}", self.id);
        // SAFETY: row is in bounds of the column's contiguous storage
        unsafe { ptr.add(row * self.item_size) }
    }

    /// Mutable pointer to the value at `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[must_use]
    pub fn get_mut_ptr(&mut self, row: usize) -> *mut u8 {
        let (ptr, len) = self.storage.raw_parts_mut();
        assert!(row < len, "row {row} out of bounds in {:?}", self.id);
        // SAFETY: row is in bounds of the column's contiguous storage
        unsafe { ptr.add(row * self.item_size) }
    }

    /// `TypeId` of the stored component.
    #[must_use]
    pub const fn item_type_id(&self) -> TypeId {
        self.type_id
    }

    /// Size in bytes of one stored value.
    #[must_use]
    pub const fn item_size(&self) -> usize {
        self.item_size
    }

    /// Pointer to the first row and the row count, for callers that index
    /// themselves.
    pub(crate) fn raw_parts(&self) -> (*const u8, usize) {
        self.storage.raw_parts()
    }

    /// Mutable pointer to the first row and the row count.
    pub(crate) fn raw_parts_mut(&mut self) -> (*mut u8, usize) {
        self.storage.raw_parts_mut()
    }

    /// Append `value` as the last row.
    ///
    /// # Panics
    ///
    /// Panics if the column does not store `T`.
    pub fn push<T: 'static>(&mut self, value: T) {
        self.check::<T>();
        let mut value = ManuallyDrop::new(value);
        // SAFETY: the column stores `T`; ownership moves into the column
        unsafe {
            self.storage
                .push_raw(std::ptr::from_mut::<T>(&mut *value).cast());
        }
    }

    /// Remove the value at `row`, dropping it. Later rows shift down.
    pub fn erase(&mut self, row: usize) {
        self.storage.erase_row(row);
    }

    /// Remove and return the value at `row`. Later rows shift down.
    ///
    /// # Panics
    ///
    /// Panics if the column does not store `T`.
    pub fn take<T: 'static>(&mut self, row: usize) -> T {
        self.check::<T>();
        let mut out = MaybeUninit::<T>::uninit();
        // SAFETY: the column stores `T` and `out` has room for one
        unsafe {
            self.storage.take_raw(row, out.as_mut_ptr().cast());
            out.assume_init()
        }
    }

    /// All rows as a typed slice.
    ///
    /// # Panics
    ///
    /// Panics if the column does not store `T`.
    #[must_use]
    pub fn as_slice<T: 'static>(&self) -> &[T] {
        self.check::<T>();
        let (ptr, len) = self.storage.raw_parts();
        // SAFETY: `ptr` and `len` come from one slice of initialized `T`s
        unsafe { std::slice::from_raw_parts(ptr.cast::<T>(), len) }
    }

    /// All rows as a typed mutable slice.
    ///
    /// # Panics
    ///
    /// Panics if the column does not store `T`.
    #[must_use]
    pub fn as_mut_slice<T: 'static>(&mut self) -> &mut [T] {
        self.check::<T>();
        let (ptr, len) = self.storage.raw_parts_mut();
        // SAFETY: `ptr` and `len` come from one slice of initialized `T`s and
        // `&mut self` guarantees exclusive access
        unsafe { std::slice::from_raw_parts_mut(ptr.cast::<T>(), len) }
    }

    /// The value at `row`.
    #[must_use]
    pub fn get<T: 'static>(&self, row: usize) -> &T {
        &self.as_slice::<T>()[row]
    }

    /// The value at `row`, mutably.
    #[must_use]
    pub fn get_mut<T: 'static>(&mut self, row: usize) -> &mut T {
        &mut self.as_mut_slice::<T>()[row]
    }

    /// A new, empty column of the same storage type and component id.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self {
            id: self.id,
            type_id: self.type_id,
            name: self.name,
            item_size: self.item_size,
            storage: self.storage.empty_like(),
        }
    }

    /// Remove `row` and append it to `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `dst` stores another component or another storage type.
    pub fn move_row(&mut self, row: usize, dst: &mut Self) {
        assert_eq!(self.id, dst.id, "rows can only move between columns of one component");
        self.storage.move_row(row, &mut *dst.storage);
    }

    /// The concrete column, if it is a `C`.
    #[must_use]
    pub fn downcast_ref<C: Column>(&self) -> Option<&C> {
        self.storage.as_any().downcast_ref::<C>()
    }

    /// The concrete column mutably, if it is a `C`.
    #[must_use]
    pub fn downcast_mut<C: Column>(&mut self) -> Option<&mut C> {
        self.storage.as_any_mut().downcast_mut::<C>()
    }
}

impl PartialEq for ErasedColumn {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ErasedColumn {}

impl PartialOrd for ErasedColumn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ErasedColumn {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for ErasedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedColumn")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}
