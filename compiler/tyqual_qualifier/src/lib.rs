//! The qualifier lattice adapter.
//!
//! A qualifier hierarchy is an independent lattice of fine-grained type
//! attributes (nullness, interning, effects, ranges, ...) layered on top of
//! the structural types. The inference engine never knows what a qualifier
//! *means*; it only asks a [`Hierarchy`] for its top, bottom, default, order,
//! least-upper-bound and greatest-lower-bound. The [`Registry`] holds every
//! hierarchy taking part in a check and is shared read-only between
//! concurrently running inference sessions.

use std::{
    collections::BTreeMap,
    fmt::Debug,
    sync::Arc,
};

use getset::Getters;
use tyqual_arena::{Arena, ID};

pub mod finite;

pub use finite::FiniteHierarchy;

/// An opaque element of one qualifier hierarchy.
///
/// Elements are only meaningful together with the [`Hierarchy`] that handed
/// them out.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::From,
)]
#[display(fmt = "#{}", _0)]
pub struct Element(pub usize);

/// A lattice of qualifiers consumed by the inference engine.
///
/// Implementations must be pure: the answers may not change while any
/// inference session is running.
pub trait Hierarchy: Debug + Send + Sync {
    /// The human readable name of the hierarchy, used in diagnostics.
    fn name(&self) -> &str;

    /// The greatest element of the hierarchy.
    fn top(&self) -> Element;

    /// The least element of the hierarchy.
    fn bottom(&self) -> Element;

    /// The qualifier given to a type that was never constrained in this
    /// hierarchy.
    fn default_qualifier(&self) -> Element;

    /// Returns `true` if `sub` is below or equal to `sup`.
    fn is_subtype(&self, sub: Element, sup: Element) -> bool;

    /// The least upper bound of the two elements, `None` if the two elements
    /// have no unique join.
    fn lub(&self, first: Element, second: Element) -> Option<Element>;

    /// The greatest lower bound of the two elements, `None` if the two
    /// elements have no unique meet.
    fn glb(&self, first: Element, second: Element) -> Option<Element>;

    /// The name of the element, `None` if the element doesn't belong to this
    /// hierarchy.
    fn element_name(&self, element: Element) -> Option<&str>;
}

/// An entry of the [`Registry`].
#[derive(Clone)]
pub struct Registered {
    hierarchy: Arc<dyn Hierarchy>,
}

impl Debug for Registered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Registered").field(&self.hierarchy.name()).finish()
    }
}

/// Identifies a hierarchy registered in a [`Registry`].
pub type HierarchyID = ID<Registered>;

/// An element of a particular hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Qualifier {
    /// The hierarchy the element belongs to.
    pub hierarchy: HierarchyID,

    /// The element within the hierarchy.
    pub element: Element,
}

impl Qualifier {
    /// Creates a new [`Qualifier`].
    #[must_use]
    pub const fn new(hierarchy: HierarchyID, element: Element) -> Self {
        Self { hierarchy, element }
    }
}

/// A set of qualifiers holding at most one element per hierarchy.
///
/// The absence of a hierarchy means "not written/unconstrained" in that
/// hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Qualifiers {
    elements: BTreeMap<HierarchyID, Element>,
}

impl Qualifiers {
    /// Creates an empty set of qualifiers.
    #[must_use]
    pub const fn new() -> Self { Self { elements: BTreeMap::new() } }

    /// Returns `true` if no hierarchy has a qualifier.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.elements.is_empty() }

    /// The number of hierarchies that have a qualifier.
    #[must_use]
    pub fn len(&self) -> usize { self.elements.len() }

    /// Gets the element written for the given hierarchy.
    #[must_use]
    pub fn get(&self, hierarchy: HierarchyID) -> Option<Element> {
        self.elements.get(&hierarchy).copied()
    }

    /// Returns `true` if the given hierarchy has a qualifier.
    #[must_use]
    pub fn contains(&self, hierarchy: HierarchyID) -> bool {
        self.elements.contains_key(&hierarchy)
    }

    /// Sets the qualifier of its hierarchy, returning the replaced element.
    pub fn insert(&mut self, qualifier: Qualifier) -> Option<Element> {
        self.elements.insert(qualifier.hierarchy, qualifier.element)
    }

    /// Removes the qualifier of the given hierarchy.
    pub fn remove(&mut self, hierarchy: HierarchyID) -> Option<Element> {
        self.elements.remove(&hierarchy)
    }

    /// Replaces the qualifiers of every hierarchy present in `other`,
    /// leaving the remaining hierarchies untouched.
    pub fn override_with(&mut self, other: &Self) {
        self.elements.extend(other.elements.iter().map(|(k, v)| (*k, *v)));
    }

    /// Iterates the qualifiers in hierarchy order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Qualifier> + '_ {
        self.elements
            .iter()
            .map(|(hierarchy, element)| Qualifier::new(*hierarchy, *element))
    }

    /// Iterates the hierarchies that have a qualifier.
    pub fn hierarchies(&self) -> impl ExactSizeIterator<Item = HierarchyID> + '_ {
        self.elements.keys().copied()
    }
}

impl FromIterator<Qualifier> for Qualifiers {
    fn from_iter<T: IntoIterator<Item = Qualifier>>(iter: T) -> Self {
        Self {
            elements: iter
                .into_iter()
                .map(|qualifier| (qualifier.hierarchy, qualifier.element))
                .collect(),
        }
    }
}

impl Extend<Qualifier> for Qualifiers {
    fn extend<T: IntoIterator<Item = Qualifier>>(&mut self, iter: T) {
        for qualifier in iter {
            self.insert(qualifier);
        }
    }
}

/// A qualifier names a hierarchy that isn't registered in the registry it
/// is used with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error,
)]
#[error("the hierarchy {0:?} is not registered in this registry")]
pub struct UnknownHierarchyError(pub HierarchyID);

/// The set of qualifier hierarchies taking part in a check.
///
/// Hierarchies are registered once up front; afterwards the registry is only
/// read, so it can be shared across threads.
#[derive(Debug, Clone, Default, Getters)]
pub struct Registry {
    /// The registered hierarchies in registration order.
    #[get = "pub"]
    hierarchies: Arena<Registered>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Registers a new hierarchy.
    pub fn register(
        &mut self,
        hierarchy: impl Hierarchy + 'static,
    ) -> HierarchyID {
        self.hierarchies.insert(Registered { hierarchy: Arc::new(hierarchy) })
    }

    /// Iterates the ids of every registered hierarchy.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = HierarchyID> + '_ {
        self.hierarchies.ids()
    }

    /// Gets the hierarchy with the given id.
    #[must_use]
    pub fn get(&self, id: HierarchyID) -> Option<&dyn Hierarchy> {
        self.hierarchies.get(id).map(|x| x.hierarchy.as_ref())
    }

    /// Returns an error if any of the given hierarchies wasn't registered
    /// here.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownHierarchyError`] naming the first such hierarchy.
    pub fn check(
        &self,
        hierarchies: impl IntoIterator<Item = HierarchyID>,
    ) -> Result<(), UnknownHierarchyError> {
        hierarchies
            .into_iter()
            .find(|x| !self.hierarchies.contains(*x))
            .map_or(Ok(()), |x| Err(UnknownHierarchyError(x)))
    }

    /// Looks up a hierarchy by its name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<HierarchyID> {
        self.hierarchies
            .iter()
            .find(|(_, x)| x.hierarchy.name() == name)
            .map(|(id, _)| id)
    }

    /// The top qualifier of the hierarchy, `None` for an unknown hierarchy.
    #[must_use]
    pub fn top(&self, hierarchy: HierarchyID) -> Option<Qualifier> {
        self.get(hierarchy).map(|x| Qualifier::new(hierarchy, x.top()))
    }

    /// The bottom qualifier of the hierarchy, `None` for an unknown
    /// hierarchy.
    #[must_use]
    pub fn bottom(&self, hierarchy: HierarchyID) -> Option<Qualifier> {
        self.get(hierarchy).map(|x| Qualifier::new(hierarchy, x.bottom()))
    }

    /// The default qualifier of the hierarchy, `None` for an unknown
    /// hierarchy.
    #[must_use]
    pub fn default_of(&self, hierarchy: HierarchyID) -> Option<Qualifier> {
        self.get(hierarchy)
            .map(|x| Qualifier::new(hierarchy, x.default_qualifier()))
    }

    /// For every registered hierarchy present in `qualifiers`, the top of
    /// that hierarchy.
    #[must_use]
    pub fn tops_of(&self, qualifiers: &Qualifiers) -> Qualifiers {
        qualifiers.hierarchies().filter_map(|x| self.top(x)).collect()
    }

    /// For every registered hierarchy present in `qualifiers`, the bottom of
    /// that hierarchy.
    #[must_use]
    pub fn bottoms_of(&self, qualifiers: &Qualifiers) -> Qualifiers {
        qualifiers.hierarchies().filter_map(|x| self.bottom(x)).collect()
    }

    /// The default qualifier of every registered hierarchy.
    #[must_use]
    pub fn defaults(&self) -> Qualifiers {
        self.hierarchies
            .iter()
            .map(|(id, x)| Qualifier::new(id, x.hierarchy.default_qualifier()))
            .collect()
    }

    /// Returns `true` if `sub` is below or equal to `sup`. Qualifiers of
    /// different or unknown hierarchies are never related.
    #[must_use]
    pub fn is_subtype(&self, sub: Qualifier, sup: Qualifier) -> bool {
        sub.hierarchy == sup.hierarchy
            && self
                .get(sub.hierarchy)
                .is_some_and(|x| x.is_subtype(sub.element, sup.element))
    }

    /// The least upper bound of all the given elements of one hierarchy.
    ///
    /// Returns `None` if the iterator is empty, the hierarchy is unknown or
    /// some pair has no join.
    pub fn lub(
        &self,
        hierarchy: HierarchyID,
        elements: impl IntoIterator<Item = Element>,
    ) -> Option<Element> {
        let hierarchy = self.get(hierarchy)?;
        elements.into_iter().try_fold(None, |acc: Option<Element>, x| {
            acc.map_or(Some(Some(x)), |acc| hierarchy.lub(acc, x).map(Some))
        })?
    }

    /// The greatest lower bound of all the given elements of one hierarchy.
    ///
    /// Returns `None` if the iterator is empty, the hierarchy is unknown or
    /// some pair has no meet.
    pub fn glb(
        &self,
        hierarchy: HierarchyID,
        elements: impl IntoIterator<Item = Element>,
    ) -> Option<Element> {
        let hierarchy = self.get(hierarchy)?;
        elements.into_iter().try_fold(None, |acc: Option<Element>, x| {
            acc.map_or(Some(Some(x)), |acc| hierarchy.glb(acc, x).map(Some))
        })?
    }

    /// Renders the qualifier as `@Name`.
    #[must_use]
    pub fn qualifier_name(&self, qualifier: Qualifier) -> String {
        self.get(qualifier.hierarchy)
            .and_then(|x| x.element_name(qualifier.element))
            .map_or_else(|| format!("@{}", qualifier.element), |x| format!("@{x}"))
    }
}
