//! Paged sparse set.
//!
//! A [`SparseSet`] maps arbitrary non-negative identifiers to slots in two
//! dense, parallel vectors: one of identifiers, one of values. The sparse side
//! is split into fixed-size pages that are only allocated when an identifier
//! inside their range is first stored. Pages are keyed by page number, so a
//! handful of huge identifiers does not cost memory proportional to their
//! magnitude.
//!
//! ```text
//! pages:    { 0: [..], 2: [..], 9_000_000: [..] }   id -> slot
//! dense:    [ id_a, id_b, id_c ]                      slot -> id
//! elements: [ va,   vb,   vc   ]                      slot -> value
//! ```
//!
//! Insert, lookup and removal are O(1). Removal swaps the last dense entry
//! into the freed slot, so dense order is not stable across removals.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Default number of identifiers covered by one sparse page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Marks an identifier that has no dense slot.
const NO_SLOT: usize = usize::MAX;

/// An identifier that can key a [`SparseSet`].
pub trait SparseId: Copy + Eq + fmt::Debug {
    /// The position of this identifier in the sparse index space.
    fn to_index(self) -> usize;

    /// Rebuilds an identifier from its sparse index.
    fn from_index(index: usize) -> Self;
}

macro_rules! impl_sparse_id {
    ($($t:ty),*) => {
        $(
            impl SparseId for $t {
                #[inline]
                fn to_index(self) -> usize {
                    self as usize
                }

                #[inline]
                fn from_index(index: usize) -> Self {
                    index as $t
                }
            }
        )*
    };
}

impl_sparse_id!(u32, u64, usize);

/// A paged sparse set storing one `T` per identifier `I`.
#[derive(Debug, Clone)]
pub struct SparseSet<T, I = usize> {
    /// Lazily allocated id -> slot pages, keyed by `id / page_size`.
    pages: HashMap<usize, Box<[usize]>>,
    /// Identifiers in dense order. `dense[s]` owns `elements[s]`.
    dense: Vec<I>,
    /// Values in dense order.
    elements: Vec<T>,
    page_size: usize,
}

impl<T, I: SparseId> SparseSet<T, I> {
    /// Creates an empty set using [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates an empty set whose sparse pages each cover `page_size`
    /// identifiers.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(page_size > 0, "sparse set page size must be non-zero");
        Self {
            pages: HashMap::new(),
            dense: Vec::new(),
            elements: Vec::new(),
            page_size,
        }
    }

    /// Number of identifiers covered by each page.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages that are currently allocated.
    #[must_use]
    pub fn allocated_pages(&self) -> usize {
        self.pages.len()
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the set stores nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    fn locate(&self, id: I) -> (usize, usize) {
        let index = id.to_index();
        (index / self.page_size, index % self.page_size)
    }

    /// Returns the dense slot currently holding `id`.
    #[must_use]
    pub fn slot_of(&self, id: I) -> Option<usize> {
        let (page, offset) = self.locate(id);
        let slot = self.pages.get(&page)?[offset];
        (slot != NO_SLOT).then_some(slot)
    }

    /// Returns `true` if `id` has a value.
    #[must_use]
    pub fn contains(&self, id: I) -> bool {
        self.slot_of(id).is_some()
    }

    /// Returns the page for `page`, allocating it on first touch.
    fn page_mut(&mut self, page: usize) -> &mut [usize] {
        let page_size = self.page_size;
        self.pages
            .entry(page)
            .or_insert_with(|| vec![NO_SLOT; page_size].into_boxed_slice())
    }

    fn set_slot(&mut self, id: I, slot: usize) {
        let (page, offset) = self.locate(id);
        if let Some(entries) = self.pages.get_mut(&page) {
            entries[offset] = slot;
        }
    }

    /// Stores `value` under `id`, overwriting any existing value, and returns
    /// a reference to the stored value.
    pub fn put(&mut self, id: I, value: T) -> &mut T {
        if let Some(slot) = self.slot_of(id) {
            self.elements[slot] = value;
            return &mut self.elements[slot];
        }

        let slot = self.elements.len();
        let (page, offset) = self.locate(id);
        self.page_mut(page)[offset] = slot;
        self.dense.push(id);
        self.elements.push(value);
        &mut self.elements[slot]
    }

    /// Returns the value stored under `id`.
    #[must_use]
    pub fn get(&self, id: I) -> Option<&T> {
        self.slot_of(id).map(|slot| &self.elements[slot])
    }

    /// Returns the value stored under `id` mutably.
    #[must_use]
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slot_of(id).map(|slot| &mut self.elements[slot])
    }

    /// Removes and returns the value stored under `id`.
    ///
    /// The last dense entry is moved into the freed slot. Removing an absent
    /// identifier does nothing and returns `None`.
    pub fn remove(&mut self, id: I) -> Option<T> {
        let slot = self.slot_of(id)?;
        let last = self.elements.len() - 1;

        let value = self.elements.swap_remove(slot);
        self.dense.swap_remove(slot);
        if slot != last {
            let moved = self.dense[slot];
            self.set_slot(moved, slot);
        }
        self.set_slot(id, NO_SLOT);
        Some(value)
    }

    /// Removes every value and releases all sparse pages.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.dense.clear();
        self.elements.clear();
    }

    /// Reserves room for at least `additional` more values, and page-table
    /// capacity for as many pages as a dense run of that many identifiers
    /// would need.
    ///
    /// Pages themselves are still allocated on first use.
    pub fn reserve(&mut self, additional: usize) {
        self.dense.reserve(additional);
        self.elements.reserve(additional);
        self.pages.reserve(additional.div_ceil(self.page_size));
    }

    /// Makes identifiers `0..len` exactly the stored set.
    ///
    /// Identifiers at or above `len` are removed; missing identifiers below it
    /// receive a clone of `fill`. Values already stored below `len` are kept.
    pub fn resize(&mut self, len: usize, fill: T)
    where
        T: Clone,
    {
        let doomed: Vec<I> = self
            .dense
            .iter()
            .copied()
            .filter(|id| id.to_index() >= len)
            .collect();
        for id in doomed {
            self.remove(id);
        }

        for index in 0..len {
            let id = I::from_index(index);
            if !self.contains(id) {
                self.put(id, fill.clone());
            }
        }
    }

    /// Values in dense order.
    #[must_use]
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Values in dense order, mutably. The identifier sequence stays fixed.
    #[must_use]
    pub fn elements_mut(&mut self) -> &mut [T] {
        &mut self.elements
    }

    /// Identifiers in dense order.
    #[must_use]
    pub fn dense(&self) -> &[I] {
        &self.dense
    }

    /// Iterates `(id, &value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.dense.iter().copied().zip(self.elements.iter())
    }

    /// Iterates `(id, &mut value)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.dense.iter().copied().zip(self.elements.iter_mut())
    }
}

impl<T, I: SparseId> Default for SparseSet<T, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, I: SparseId> Index<I> for SparseSet<T, I> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("identifier {id:?} is not present in the sparse set"),
        }
    }
}

impl<T, I: SparseId> IndexMut<I> for SparseSet<T, I> {
    fn index_mut(&mut self, id: I) -> &mut T {
        match self.slot_of(id) {
            Some(slot) => &mut self.elements[slot],
            None => panic!("identifier {id:?} is not present in the sparse set"),
        }
    }
}
