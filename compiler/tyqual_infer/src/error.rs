//! Contains the errors reported by an inference session.

use std::collections::{BTreeMap, BTreeSet};

use enum_as_inner::EnumAsInner;
use tyqual_qualifier::{Element, HierarchyID, UnknownHierarchyError};
use tyqual_term::{
    r#type::Type,
    table::TypeParameterID,
    variable::{SessionID, VariableID},
};

use crate::{
    constraint::{Origin, QualifierRelation, Relation},
    variable::BoundKind,
};

/// A relation between proper types that doesn't hold.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StructuralConflict {
    /// The relation that failed after reduction.
    pub relation: Relation,

    /// The obligation the relation comes from.
    pub origin: Origin,
}

/// A relation between known qualifiers that doesn't hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifierConflict {
    /// The hierarchy of the qualifiers.
    pub hierarchy: HierarchyID,

    /// The relation that failed.
    pub relation: QualifierRelation,

    /// The obligation the relation comes from.
    pub origin: Origin,
}

/// The known qualifier bounds of one kind have no join (lower bounds) or no
/// meet (upper bounds) in their hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IncomparableQualifiersConflict {
    /// The hierarchy of the qualifiers.
    pub hierarchy: HierarchyID,

    /// The kind of the bounds.
    pub kind: BoundKind,

    /// The known elements of the bounds.
    pub elements: Vec<Element>,
}

/// A contradiction discovered while reducing or incorporating bounds.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumAsInner,
    derive_more::From,
)]
#[allow(missing_docs)]
pub enum Conflict {
    Structural(StructuralConflict),
    Qualifier(QualifierConflict),
    IncomparableQualifiers(IncomparableQualifiersConflict),
}

/// No instantiation satisfies the bounds of some variables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "no instantiation satisfies the bounds of {} inference variable(s)",
    .variables.len()
)]
pub struct UnsatisfiableError {
    /// The conflicts attached to each unsatisfiable variable.
    pub variables: BTreeMap<VariableID, Vec<Conflict>>,

    /// The declared type parameters of the unsatisfiable variables.
    pub parameters: BTreeSet<TypeParameterID>,

    /// Conflicts between proper types that concern no variable.
    pub unattached: Vec<Conflict>,
}

/// The candidates a variable could be resolved to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumAsInner)]
pub enum Ambiguity {
    /// More than one incomparable minimal structural type.
    Type(Vec<Type>),

    /// The qualifier bounds of the hierarchy have no unique join or meet.
    Qualifier {
        /// The hierarchy of the qualifiers.
        hierarchy: HierarchyID,

        /// The incomparable elements.
        elements: Vec<Element>,
    },
}

/// A variable has multiple incomparable minimal instantiations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("the instantiation of {variable:?} is ambiguous")]
pub struct AmbiguousError {
    /// The variable that couldn't be resolved.
    pub variable: VariableID,

    /// The declared type parameter of the variable, if any.
    pub parameter: Option<TypeParameterID>,

    /// The incomparable candidates.
    pub ambiguity: Ambiguity,
}

/// A variable of another session was handed to this session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error,
)]
#[error(
    "the variable {variable:?} doesn't belong to the session {session}"
)]
pub struct ForeignVariableError {
    /// The foreign variable.
    pub variable: VariableID,

    /// The session the variable was handed to.
    pub session: SessionID,
}

/// A programming error of the caller; never a user-facing diagnostic.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    thiserror::Error,
    EnumAsInner,
)]
#[allow(missing_docs)]
pub enum InvariantViolation {
    #[error(transparent)]
    ForeignVariable(#[from] ForeignVariableError),

    #[error("the variable {0:?} was never created by this session")]
    UnknownVariable(VariableID),

    #[error(transparent)]
    UnknownHierarchy(#[from] UnknownHierarchyError),

    #[error(
        "the call supplies {found} arguments but the signature declares \
         {expected} parameters"
    )]
    ArgumentCount { expected: usize, found: usize },
}

/// The session processed more incorporation work than its configured limit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error,
)]
#[error("exceeded the limit of {limit} incorporation work items")]
pub struct OverflowError {
    /// The configured limit.
    pub limit: usize,
}

/// An error returned by an inference session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, EnumAsInner)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    Unsatisfiable(#[from] UnsatisfiableError),

    #[error(transparent)]
    Ambiguous(#[from] AmbiguousError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error(transparent)]
    Overflow(#[from] OverflowError),
}
