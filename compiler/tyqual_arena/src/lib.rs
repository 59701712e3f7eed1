//! Contains the definition of [`Arena`] and [`ID`].
//!
//! [`Arena`] stores items of type `T` and hands out typed [`ID`]s to them.
//! Items are never removed, so an [`ID`] stays valid for the whole lifetime
//! of the arena that produced it. Every stable identity in the inference
//! engine (classes, type parameters, inference variables, hierarchies) is an
//! [`ID`] into some arena.

use std::{fmt::Debug, hash::Hash, marker::PhantomData};

mod arbitrary;

/// Represents an unique identifier to a particular entry in the [`Arena`] of
/// type `T`.
pub struct ID<T> {
    index: usize,
    _marker: PhantomData<Box<T>>,
}

// SAFETY: `ID` only stores an index, `T` is never owned.
unsafe impl<T> Send for ID<T> {}
// SAFETY: `ID` only stores an index, `T` is never owned.
unsafe impl<T> Sync for ID<T> {}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ty_name = std::any::type_name::<T>();
        let ty_name = ty_name.rsplit("::").next().unwrap_or(ty_name);
        write!(f, "ID<{ty_name}>({})", self.index)
    }
}

impl<T> ID<T> {
    /// Creates a new [`ID`] with the given index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self { index, _marker: PhantomData }
    }

    /// Returns the index of the [`ID`].
    #[must_use]
    pub const fn index(&self) -> usize { self.index }
}

impl<T> Clone for ID<T> {
    fn clone(&self) -> Self { *self }
}

impl<T> Copy for ID<T> {}

impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool { self.index == other.index }
}

impl<T> Eq for ID<T> {}

impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for ID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

/// Represents a collection of items of type `T` that can be referenced by an
/// [`ID`].
///
/// Internally, all the items are stored in a [`Vec`], and the [`ID`] is just
/// an index to the item in the [`Vec`]. Unlike [`Vec`], [`Arena`] doesn't
/// allow removing items since it would invalidate the [`ID`]s given out
/// before. Iteration always follows insertion order, which keeps every
/// algorithm walking an arena deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self { Self { items: Vec::new() } }
}

impl<T> Arena<T> {
    /// Creates a new empty [`Arena`].
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Returns the number of items in the [`Arena`].
    #[must_use]
    pub fn len(&self) -> usize { self.items.len() }

    /// Returns `true` if the [`Arena`] contains no items.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Inserts a new item into the [`Arena`] and returns its [`ID`].
    pub fn insert(&mut self, item: T) -> ID<T> {
        let index = self.items.len();
        self.items.push(item);
        ID::new(index)
    }

    /// Returns a reference to the item in the [`Arena`] with the given
    /// [`ID`].
    #[must_use]
    pub fn get(&self, id: ID<T>) -> Option<&T> { self.items.get(id.index) }

    /// Returns a mutable reference to the item in the [`Arena`] with the
    /// given [`ID`].
    #[must_use]
    pub fn get_mut(&mut self, id: ID<T>) -> Option<&mut T> {
        self.items.get_mut(id.index)
    }

    /// Returns `true` if the given [`ID`] refers to an item of this arena.
    #[must_use]
    pub fn contains(&self, id: ID<T>) -> bool { id.index < self.items.len() }

    /// Returns an iterator over the items in the [`Arena`].
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (ID<T>, &T)> {
        self.items.iter().enumerate().map(|(index, item)| (ID::new(index), item))
    }

    /// Returns an iterator over the [`ID`]s of the items in the [`Arena`].
    pub fn ids(&self) -> impl ExactSizeIterator<Item = ID<T>> {
        (0..self.items.len()).map(ID::new)
    }

    /// Returns an iterator over the items in the [`Arena`] without their ids.
    pub fn items(&self) -> impl ExactSizeIterator<Item = &T> {
        self.items.iter()
    }
}
