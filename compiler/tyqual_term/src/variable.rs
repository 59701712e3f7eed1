//! Contains the definition of [`VariableID`] and [`Use`].

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use getset::{CopyGetters, Getters};
use tyqual_qualifier::{HierarchyID, Qualifiers, Registry};

use crate::r#type::{Array, Class, Parameter, Type};

/// Identifies one inference session.
///
/// Every session draws a fresh id so that variables of different sessions
/// can never be confused with each other.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display,
)]
#[display(fmt = "session#{}", _0)]
pub struct SessionID(usize);

impl SessionID {
    /// Creates a new session id that is unique among all created ones.
    #[must_use]
    pub fn fresh() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A unique identifier for an inference variable.
///
/// The identifier is stable for the whole session; the session tag makes it
/// unique across sessions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, CopyGetters,
)]
pub struct VariableID {
    /// The session that owns the variable.
    #[get_copy = "pub"]
    session: SessionID,

    /// The creation index of the variable within its session.
    #[get_copy = "pub"]
    index: usize,
}

impl VariableID {
    /// Creates a new [`VariableID`].
    #[must_use]
    pub const fn new(session: SessionID, index: usize) -> Self {
        Self { session, index }
    }
}

/// A use of an inference variable at one syntactic occurrence.
///
/// A use may carry explicit qualifiers written at that occurrence. The use is
/// only a view of the variable: bounds are always recorded on the variable
/// owned by the session, never on the use.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Getters, CopyGetters,
)]
pub struct Use {
    /// The variable that this is a use of.
    #[get_copy = "pub"]
    variable: VariableID,

    /// The qualifiers written at this occurrence.
    explicit: Qualifiers,

    /// For every hierarchy written at this occurrence, the top of that
    /// hierarchy.
    #[get = "pub"]
    tops: Qualifiers,

    /// For every hierarchy written at this occurrence, the bottom of that
    /// hierarchy.
    #[get = "pub"]
    bottoms: Qualifiers,
}

impl Use {
    /// Creates a use of `variable` carrying the given explicit qualifiers.
    #[must_use]
    pub fn new(
        variable: VariableID,
        explicit: Qualifiers,
        registry: &Registry,
    ) -> Self {
        Self {
            variable,
            tops: registry.tops_of(&explicit),
            bottoms: registry.bottoms_of(&explicit),
            explicit,
        }
    }

    /// Creates a use without any explicit qualifier.
    #[must_use]
    pub const fn unqualified(variable: VariableID) -> Self {
        Self {
            variable,
            explicit: Qualifiers::new(),
            tops: Qualifiers::new(),
            bottoms: Qualifiers::new(),
        }
    }

    /// Creates a use for an occurrence of a declared type parameter that is
    /// being inferred; the qualifiers written on the occurrence become the
    /// explicit qualifiers of the use.
    #[must_use]
    pub fn from_occurrence(
        occurrence: &Parameter,
        variable: VariableID,
        registry: &Registry,
    ) -> Self {
        Self::new(variable, occurrence.qualifiers.clone(), registry)
    }

    /// Returns `true` if any hierarchy is written at this occurrence.
    #[must_use]
    pub fn has_explicit_qualifier(&self) -> bool { !self.explicit.is_empty() }

    /// Returns `true` if the given hierarchy is written at this occurrence.
    #[must_use]
    pub fn is_explicit_in(&self, hierarchy: HierarchyID) -> bool {
        self.explicit.contains(hierarchy)
    }

    /// The qualifiers written at this occurrence; empty means the qualifiers
    /// come from the variable's instantiation.
    #[must_use]
    pub const fn qualifiers(&self) -> &Qualifiers { &self.explicit }

    /// Returns a copy of this use whose explicit qualifiers are replaced in
    /// every hierarchy present in `qualifiers`.
    #[must_use]
    pub fn with_explicit(
        &self,
        qualifiers: &Qualifiers,
        registry: &Registry,
    ) -> Self {
        let mut explicit = self.explicit.clone();
        explicit.override_with(qualifiers);

        Self::new(self.variable, explicit, registry)
    }

    /// Returns the variable's instantiation if it has one, otherwise this use
    /// unchanged.
    ///
    /// The qualifiers written at this occurrence replace the instantiation's
    /// outermost qualifiers in their hierarchies.
    #[must_use]
    pub fn apply_instantiations(
        &self,
        instantiations: &impl Instantiations,
    ) -> Type {
        let Some(instantiation) = instantiations.instantiation(self.variable)
        else {
            return Type::Inference(self.clone());
        };

        let mut result = instantiation.clone();
        match &mut result {
            Type::Class(Class { qualifiers, .. })
            | Type::Array(Array { qualifiers, .. })
            | Type::Parameter(Parameter { qualifiers, .. }) => {
                qualifiers.override_with(&self.explicit);
            }
            Type::Inference(inner) => {
                inner.explicit.override_with(&self.explicit);
                inner.tops.override_with(&self.tops);
                inner.bottoms.override_with(&self.bottoms);
            }
        }

        result
    }
}

/// A lookup of the instantiations of resolved inference variables.
pub trait Instantiations {
    /// The instantiation of the variable, `None` while it is unresolved.
    fn instantiation(&self, variable: VariableID) -> Option<&Type>;
}

impl Instantiations for BTreeMap<VariableID, Type> {
    fn instantiation(&self, variable: VariableID) -> Option<&Type> {
        self.get(&variable)
    }
}
