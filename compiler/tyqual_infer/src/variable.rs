//! Contains the definition of [`Variable`] and its bound sets.

use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

use getset::{CopyGetters, Getters};
use tyqual_arena::{Arena, ID};
use tyqual_qualifier::HierarchyID;
use tyqual_term::{
    r#type::Type,
    table::{ClassID, TypeParameterID},
    variable::{Instantiations, SessionID, VariableID},
};

use crate::{
    constraint::{Origin, QualifierTerm},
    error::{Conflict, ForeignVariableError, InvariantViolation},
};

/// The kind of a bound on a variable `α`.
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
)]
pub enum BoundKind {
    /// `α <: T`
    #[display(fmt = "upper")]
    Upper,

    /// `T <: α`
    #[display(fmt = "lower")]
    Lower,

    /// `α = T`
    #[display(fmt = "equal")]
    Equal,
}

/// Upper, lower and equal bounds over terms of type `T`, each remembering
/// the obligation it was first added for.
///
/// Bounds are only ever added.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct BoundSet<T> {
    /// The upper bounds.
    #[get = "pub"]
    upper: BTreeMap<T, Origin>,

    /// The lower bounds.
    #[get = "pub"]
    lower: BTreeMap<T, Origin>,

    /// The equal bounds.
    #[get = "pub"]
    equal: BTreeMap<T, Origin>,
}

impl<T> Default for BoundSet<T> {
    fn default() -> Self {
        Self {
            upper: BTreeMap::new(),
            lower: BTreeMap::new(),
            equal: BTreeMap::new(),
        }
    }
}

impl<T: Ord> BoundSet<T> {
    /// Gets the bounds of the given kind.
    #[must_use]
    pub const fn get(&self, kind: BoundKind) -> &BTreeMap<T, Origin> {
        match kind {
            BoundKind::Upper => &self.upper,
            BoundKind::Lower => &self.lower,
            BoundKind::Equal => &self.equal,
        }
    }

    /// Adds a bound, returning `true` if it wasn't present yet.
    pub fn insert(&mut self, kind: BoundKind, term: T, origin: Origin) -> bool {
        let bounds = match kind {
            BoundKind::Upper => &mut self.upper,
            BoundKind::Lower => &mut self.lower,
            BoundKind::Equal => &mut self.equal,
        };

        match bounds.entry(term) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(origin);
                true
            }
        }
    }

    /// Returns `true` if the bound is present.
    #[must_use]
    pub fn contains(&self, kind: BoundKind, term: &T) -> bool {
        self.get(kind).contains_key(term)
    }

    /// Iterates every bound, upper bounds first, then lower and equal bounds.
    pub fn iter(&self) -> impl Iterator<Item = (BoundKind, &T, Origin)> {
        [BoundKind::Upper, BoundKind::Lower, BoundKind::Equal]
            .into_iter()
            .flat_map(move |kind| {
                self.get(kind).iter().map(move |(term, origin)| {
                    (kind, term, *origin)
                })
            })
    }

    /// The total number of bounds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.upper.len() + self.lower.len() + self.equal.len()
    }

    /// Returns `true` if there is no bound at all.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Returns `true` if every bound of this set is also in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.iter().all(|(kind, term, _)| other.contains(kind, term))
    }
}

/// What an inference variable stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariableKind {
    /// A declared type parameter of the generic operation being called.
    Parameter(TypeParameterID),

    /// A wildcard of a class type that was captured during reduction.
    Capture {
        /// The class whose argument was captured.
        class: ClassID,

        /// The position of the captured argument.
        index: usize,
    },
}

/// One unresolved type parameter of a session.
///
/// The variable is the single mutable point of truth behind every
/// [`Use`](tyqual_term::variable::Use) of it: bounds are only added, and the
/// instantiation is set at most once.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Variable {
    /// The identity of the variable.
    #[get_copy = "pub"]
    id: VariableID,

    /// What the variable stands for.
    #[get_copy = "pub"]
    kind: VariableKind,

    /// The structural bound set.
    #[get = "pub"]
    bounds: BoundSet<Type>,

    /// Whether the variable has a use in a throws clause.
    #[get_copy = "pub"]
    has_throws: bool,

    /// The qualifier bound set of every hierarchy that some use added a
    /// qualifier bound for.
    #[get = "pub"]
    qualifier_bounds: BTreeMap<HierarchyID, BoundSet<QualifierTerm>>,

    /// The resolved instantiation.
    #[get = "pub"]
    instantiation: Option<Type>,

    /// Whether the instantiation was chosen without proper bounds to seed
    /// it.
    #[get_copy = "pub"]
    low_confidence: bool,

    /// The contradictions discovered for this variable.
    #[get = "pub"]
    conflicts: Vec<Conflict>,
}

impl Variable {
    fn new(id: VariableID, kind: VariableKind) -> Self {
        Self {
            id,
            kind,
            bounds: BoundSet::default(),
            has_throws: false,
            qualifier_bounds: BTreeMap::new(),
            instantiation: None,
            low_confidence: false,
            conflicts: Vec::new(),
        }
    }

    /// The declared type parameter the variable stands for; `None` for
    /// capture variables.
    #[must_use]
    pub const fn parameter(&self) -> Option<TypeParameterID> {
        match self.kind {
            VariableKind::Parameter(parameter) => Some(parameter),
            VariableKind::Capture { .. } => None,
        }
    }

    /// Returns `true` once the variable has an instantiation.
    #[must_use]
    pub const fn is_resolved(&self) -> bool { self.instantiation.is_some() }

    /// Gets the qualifier bound set of the hierarchy, `None` if the variable
    /// never participated in it.
    #[must_use]
    pub fn qualifier_bounds_in(
        &self,
        hierarchy: HierarchyID,
    ) -> Option<&BoundSet<QualifierTerm>> {
        self.qualifier_bounds.get(&hierarchy)
    }

    /// Adds a structural bound. Returns `true` if the bound is new.
    pub fn add_bound(&mut self, kind: BoundKind, term: Type, origin: Origin) -> bool {
        self.bounds.insert(kind, term, origin)
    }

    /// Adds a qualifier bound in the given hierarchy. Returns `true` if the
    /// bound is new. A bound on the variable's own qualifier is trivial and
    /// never recorded.
    pub fn add_qualifier_bound(
        &mut self,
        hierarchy: HierarchyID,
        kind: BoundKind,
        term: QualifierTerm,
        origin: Origin,
    ) -> bool {
        if term == QualifierTerm::Of(self.id) {
            return false;
        }

        self.qualifier_bounds
            .entry(hierarchy)
            .or_default()
            .insert(kind, term, origin)
    }

    /// Marks the variable as used in a throws clause.
    pub fn set_throws(&mut self) { self.has_throws = true; }

    /// Records the instantiation. Returns `false`, leaving the variable
    /// untouched, if it was already resolved.
    pub(crate) fn instantiate(
        &mut self,
        instantiation: Type,
        low_confidence: bool,
    ) -> bool {
        if self.instantiation.is_some() {
            return false;
        }

        self.instantiation = Some(instantiation);
        self.low_confidence = low_confidence;
        true
    }

    pub(crate) fn add_conflict(&mut self, conflict: Conflict) {
        if !self.conflicts.contains(&conflict) {
            self.conflicts.push(conflict);
        }
    }

    /// Every other variable mentioned by a structural or qualifier bound of
    /// this variable.
    #[must_use]
    pub fn dependencies(&self) -> BTreeSet<VariableID> {
        let mut dependencies = BTreeSet::new();

        for (_, term, _) in self.bounds.iter() {
            term.collect_inference_variables(&mut dependencies);
        }

        for bounds in self.qualifier_bounds.values() {
            dependencies.extend(
                bounds.iter().filter_map(|(_, term, _)| term.as_of().copied()),
            );
        }

        dependencies.remove(&self.id);
        dependencies
    }
}

/// The arena of the variables owned by one session.
#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
pub struct Variables {
    /// The session owning the variables.
    #[get_copy = "pub"]
    session: SessionID,

    variables: Arena<Variable>,
}

impl Variables {
    /// Creates an empty arena for the given session.
    #[must_use]
    pub fn new(session: SessionID) -> Self {
        Self { session, variables: Arena::new() }
    }

    /// Creates a new unresolved variable without bounds.
    pub fn insert(&mut self, kind: VariableKind) -> VariableID {
        let id = VariableID::new(self.session, self.variables.len());
        self.variables.insert(Variable::new(id, kind));

        id
    }

    /// Checks that the variable was created by this arena.
    ///
    /// # Errors
    ///
    /// See [`InvariantViolation`].
    pub fn check(&self, variable: VariableID) -> Result<(), InvariantViolation> {
        if variable.session() != self.session {
            return Err(ForeignVariableError { variable, session: self.session }
                .into());
        }

        if !self.variables.contains(ID::new(variable.index())) {
            return Err(InvariantViolation::UnknownVariable(variable));
        }

        Ok(())
    }

    /// Gets the variable.
    ///
    /// # Errors
    ///
    /// See [`InvariantViolation`].
    pub fn get(&self, variable: VariableID) -> Result<&Variable, InvariantViolation> {
        self.check(variable)?;

        self.variables
            .get(ID::new(variable.index()))
            .ok_or(InvariantViolation::UnknownVariable(variable))
    }

    /// Gets the variable mutably.
    ///
    /// # Errors
    ///
    /// See [`InvariantViolation`].
    pub fn get_mut(
        &mut self,
        variable: VariableID,
    ) -> Result<&mut Variable, InvariantViolation> {
        self.check(variable)?;

        self.variables
            .get_mut(ID::new(variable.index()))
            .ok_or(InvariantViolation::UnknownVariable(variable))
    }

    /// Iterates the variables in creation order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Variable> {
        self.variables.items()
    }

    /// The number of variables.
    #[must_use]
    pub fn len(&self) -> usize { self.variables.len() }

    /// Returns `true` if no variable was created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.variables.is_empty() }
}

impl Instantiations for Variables {
    fn instantiation(&self, variable: VariableID) -> Option<&Type> {
        self.get(variable).ok().and_then(|x| x.instantiation.as_ref())
    }
}

#[cfg(test)]
mod test;
