//! Contains the definition of [`Constraint`] and the qualifier analog
//! [`QualifierConstraint`].

use std::collections::BTreeSet;

use enum_as_inner::EnumAsInner;
use tyqual_qualifier::{Element, HierarchyID};
use tyqual_term::{
    r#type::{Argument, Type, Wildcard},
    table::TypeParameterID,
    variable::VariableID,
};

/// The obligation a constraint originates from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumAsInner,
)]
pub enum Origin {
    /// The argument at the given index must be compatible with its formal
    /// parameter.
    Argument(usize),

    /// The return type must be compatible with the target type.
    Target,

    /// The instantiation must satisfy the declared bound of the type
    /// parameter.
    DeclaredBound(TypeParameterID),

    /// The variable is used in a throws clause.
    Throws,

    /// The constraint was submitted directly by the caller.
    Explicit,

    /// The equal bound recorded when a variable is resolved.
    Resolution,
}

/// A relation between two type terms awaiting reduction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumAsInner)]
pub enum Relation {
    /// `sub <: sup`
    Subtype {
        /// The subtype side.
        sub: Type,

        /// The supertype side.
        sup: Type,
    },

    /// `first = second`
    Equal(Type, Type),

    /// The type argument `outer` contains `inner`.
    Contains {
        /// The containing argument.
        outer: Argument,

        /// The contained argument.
        inner: Argument,
    },
}

impl Relation {
    /// Returns every inference variable mentioned by either side.
    #[must_use]
    pub fn inference_variables(&self) -> BTreeSet<VariableID> {
        let mut variables = BTreeSet::new();

        match self {
            Self::Subtype { sub: first, sup: second }
            | Self::Equal(first, second) => {
                first.collect_inference_variables(&mut variables);
                second.collect_inference_variables(&mut variables);
            }
            Self::Contains { outer, inner } => {
                collect_argument(outer, &mut variables);
                collect_argument(inner, &mut variables);
            }
        }

        variables
    }

    /// Returns every qualifier hierarchy written anywhere on either side.
    #[must_use]
    pub fn hierarchies(&self) -> BTreeSet<HierarchyID> {
        let mut hierarchies = BTreeSet::new();

        match self {
            Self::Subtype { sub: first, sup: second }
            | Self::Equal(first, second) => {
                first.collect_hierarchies(&mut hierarchies);
                second.collect_hierarchies(&mut hierarchies);
            }
            Self::Contains { outer, inner } => {
                outer.collect_hierarchies(&mut hierarchies);
                inner.collect_hierarchies(&mut hierarchies);
            }
        }

        hierarchies
    }
}

fn collect_argument(argument: &Argument, variables: &mut BTreeSet<VariableID>) {
    match argument {
        Argument::Type(ty) => ty.collect_inference_variables(variables),
        Argument::Wildcard(Wildcard::Extends(ty) | Wildcard::Super(ty)) => {
            ty.collect_inference_variables(variables);
        }
        Argument::Wildcard(Wildcard::Unbounded) => {}
    }
}

/// A pending relation between two type terms.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Constraint {
    /// The relation to reduce.
    pub relation: Relation,

    /// The obligation this constraint comes from.
    pub origin: Origin,

    /// Whether the outermost qualifiers take part in the relation.
    ///
    /// Constraints emitted by structural incorporation are unqualified; the
    /// qualifier bound sets carry the qualifier part of those relations.
    /// Qualifiers of nested types are compared regardless.
    pub qualified: bool,

    /// The variable whose incorporation emitted this constraint; conflicts
    /// discovered while reducing it are attached to this variable.
    pub subject: Option<VariableID>,
}

impl Constraint {
    /// Creates a qualified `sub <: sup` constraint.
    #[must_use]
    pub const fn subtype(sub: Type, sup: Type, origin: Origin) -> Self {
        Self {
            relation: Relation::Subtype { sub, sup },
            origin,
            qualified: true,
            subject: None,
        }
    }

    /// Creates a qualified `first = second` constraint.
    #[must_use]
    pub const fn equal(first: Type, second: Type, origin: Origin) -> Self {
        Self {
            relation: Relation::Equal(first, second),
            origin,
            qualified: true,
            subject: None,
        }
    }

    /// Creates a qualified containment constraint.
    #[must_use]
    pub const fn contains(
        outer: Argument,
        inner: Argument,
        origin: Origin,
    ) -> Self {
        Self {
            relation: Relation::Contains { outer, inner },
            origin,
            qualified: true,
            subject: None,
        }
    }

    /// Creates a constraint between type arguments or array elements of the
    /// sides of this one. Its qualifiers always take part: type arguments
    /// are compared with their own qualifiers even when the outermost
    /// qualifiers of this constraint are left to the qualifier bounds.
    #[must_use]
    pub fn nested(&self, relation: Relation) -> Self {
        Self {
            relation,
            origin: self.origin,
            qualified: true,
            subject: self.subject,
        }
    }

    /// Creates a constraint derived from this one, keeping its origin,
    /// qualification and subject.
    #[must_use]
    pub fn derive(&self, relation: Relation) -> Self {
        Self {
            relation,
            origin: self.origin,
            qualified: self.qualified,
            subject: self.subject,
        }
    }
}

/// A qualifier of one hierarchy appearing in a qualifier bound.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumAsInner,
)]
pub enum QualifierTerm {
    /// A known element of the hierarchy.
    Known(Element),

    /// The qualifier that the variable will be instantiated with.
    Of(VariableID),
}

/// A relation between two qualifier terms of one hierarchy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumAsInner,
)]
pub enum QualifierRelation {
    /// `sub <: sup`
    Subtype {
        /// The lower side.
        sub: QualifierTerm,

        /// The upper side.
        sup: QualifierTerm,
    },

    /// `first = second`
    Equal(QualifierTerm, QualifierTerm),
}

/// A pending relation between qualifier terms of one hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifierConstraint {
    /// The hierarchy both terms belong to.
    pub hierarchy: HierarchyID,

    /// The relation to reduce.
    pub relation: QualifierRelation,

    /// The obligation this constraint comes from.
    pub origin: Origin,

    /// The variable whose incorporation emitted this constraint.
    pub subject: Option<VariableID>,
}
