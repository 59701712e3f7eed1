//! Contains the definition of the [`Type`] term.

use std::collections::BTreeSet;

use enum_as_inner::EnumAsInner;
use tyqual_qualifier::{HierarchyID, Qualifier, Qualifiers, Registry};

use crate::{
    table::{ClassID, TypeParameterID},
    variable::{Instantiations, Use, VariableID},
    visitor::{self, Transform, Visitor},
};

/// A class or interface type, denoted by `C<A1, ..., An>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Class {
    /// The declaration of the class.
    pub id: ClassID,

    /// The type arguments; empty for non-generic (or raw) classes.
    pub arguments: Vec<Argument>,

    /// The qualifiers of the type.
    pub qualifiers: Qualifiers,
}

impl Class {
    /// Creates an unqualified class type.
    #[must_use]
    pub const fn new(id: ClassID, arguments: Vec<Argument>) -> Self {
        Self { id, arguments, qualifiers: Qualifiers::new() }
    }

    /// Returns `true` if any type argument is a wildcard.
    #[must_use]
    pub fn has_wildcard_arguments(&self) -> bool {
        self.arguments.iter().any(Argument::is_wildcard)
    }
}

/// An array type, denoted by `T[]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Array {
    /// The type of the elements.
    pub element: Box<Type>,

    /// The qualifiers of the array type itself.
    pub qualifiers: Qualifiers,
}

/// An occurrence of a declared type parameter that is not being inferred.
///
/// Such a type is proper: it is an opaque type variable from an enclosing
/// scope. Occurrences of the type parameters being inferred are replaced by
/// [`Use`]s when a session starts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Parameter {
    /// The declaration of the type parameter.
    pub id: TypeParameterID,

    /// The qualifiers written at this occurrence.
    pub qualifiers: Qualifiers,
}

/// A wildcard type argument.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumAsInner)]
pub enum Wildcard {
    /// `?`
    Unbounded,

    /// `? extends T`
    Extends(Box<Type>),

    /// `? super T`
    Super(Box<Type>),
}

/// A type argument of a [`Class`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumAsInner)]
#[allow(missing_docs)]
pub enum Argument {
    Type(Type),
    Wildcard(Wildcard),
}

impl Argument {
    /// Returns `true` if no inference variable is reachable from the
    /// argument.
    #[must_use]
    pub fn is_proper(&self) -> bool {
        match self {
            Self::Type(ty) => ty.is_proper(),
            Self::Wildcard(Wildcard::Unbounded) => true,
            Self::Wildcard(Wildcard::Extends(ty) | Wildcard::Super(ty)) => {
                ty.is_proper()
            }
        }
    }

    /// Adds every hierarchy written anywhere in the argument to
    /// `hierarchies`.
    pub fn collect_hierarchies(&self, hierarchies: &mut BTreeSet<HierarchyID>) {
        visitor::accept_argument(self, &mut HierarchyCollector { hierarchies });
    }

    /// Replaces every resolved variable use reachable from the argument.
    #[must_use]
    pub fn substitute_instantiations(
        &self,
        instantiations: &impl Instantiations,
    ) -> Self {
        visitor::transform_argument(self, &mut Substitution { instantiations })
    }
}

impl From<Type> for Argument {
    fn from(value: Type) -> Self { Self::Type(value) }
}

impl From<Wildcard> for Argument {
    fn from(value: Wildcard) -> Self { Self::Wildcard(value) }
}

/// A type occurring in inference.
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
pub enum Type {
    Class(Class),
    Array(Array),
    Parameter(Parameter),
    Inference(Use),
}

struct Substitution<'a, I> {
    instantiations: &'a I,
}

impl<I: Instantiations> Transform for Substitution<'_, I> {
    fn transform(&mut self, term: &Type) -> Option<Type> {
        let Type::Inference(use_of) = term else {
            return None;
        };

        Some(use_of.apply_instantiations(self.instantiations))
    }
}

struct VariableCollector<'a> {
    variables: &'a mut BTreeSet<VariableID>,
}

impl Visitor for VariableCollector<'_> {
    fn visit(&mut self, term: &Type) -> bool {
        if let Type::Inference(use_of) = term {
            self.variables.insert(use_of.variable());
        }

        true
    }
}

struct HierarchyCollector<'a> {
    hierarchies: &'a mut BTreeSet<HierarchyID>,
}

impl Visitor for HierarchyCollector<'_> {
    fn visit(&mut self, term: &Type) -> bool {
        self.hierarchies.extend(term.qualifiers().hierarchies());
        true
    }
}

impl Type {
    /// Creates an unqualified class type.
    #[must_use]
    pub fn class(id: ClassID, arguments: impl IntoIterator<Item = Argument>) -> Self {
        Self::Class(Class::new(id, arguments.into_iter().collect()))
    }

    /// Creates an unqualified array type.
    #[must_use]
    pub fn array(element: Self) -> Self {
        Self::Array(Array {
            element: Box::new(element),
            qualifiers: Qualifiers::new(),
        })
    }

    /// Creates an unqualified occurrence of a declared type parameter.
    #[must_use]
    pub const fn parameter(id: TypeParameterID) -> Self {
        Self::Parameter(Parameter { id, qualifiers: Qualifiers::new() })
    }

    /// Returns this type with the given qualifier set on the outermost type.
    ///
    /// For a variable use, the qualifier becomes explicit at the occurrence.
    #[must_use]
    pub fn with_qualifier(self, qualifier: Qualifier, registry: &Registry) -> Self {
        let qualifiers = std::iter::once(qualifier).collect::<Qualifiers>();
        self.with_qualifiers_overridden(&qualifiers, registry)
    }

    /// The qualifiers of the outermost type. For a variable use these are the
    /// qualifiers written at the occurrence.
    #[must_use]
    pub const fn qualifiers(&self) -> &Qualifiers {
        match self {
            Self::Class(class) => &class.qualifiers,
            Self::Array(array) => &array.qualifiers,
            Self::Parameter(parameter) => &parameter.qualifiers,
            Self::Inference(use_of) => use_of.qualifiers(),
        }
    }

    /// Returns a copy of this type whose outermost qualifiers are replaced in
    /// every hierarchy present in `qualifiers`.
    #[must_use]
    pub fn with_qualifiers_overridden(
        &self,
        qualifiers: &Qualifiers,
        registry: &Registry,
    ) -> Self {
        let mut result = self.clone();

        match &mut result {
            Self::Class(Class { qualifiers: current, .. })
            | Self::Array(Array { qualifiers: current, .. })
            | Self::Parameter(Parameter { qualifiers: current, .. }) => {
                current.override_with(qualifiers);
            }
            Self::Inference(use_of) => {
                *use_of = use_of.with_explicit(qualifiers, registry);
            }
        }

        result
    }

    /// Returns a copy of this type without qualifiers on the outermost type.
    /// Nested types keep their qualifiers. Variable uses are returned as
    /// unqualified uses.
    #[must_use]
    pub fn without_qualifiers(&self) -> Self {
        let mut result = self.clone();

        match &mut result {
            Self::Class(Class { qualifiers, .. })
            | Self::Array(Array { qualifiers, .. })
            | Self::Parameter(Parameter { qualifiers, .. }) => {
                *qualifiers = Qualifiers::new();
            }
            Self::Inference(use_of) => {
                *use_of = Use::unqualified(use_of.variable());
            }
        }

        result
    }

    /// Returns `true` if no inference variable is reachable from this type.
    #[must_use]
    pub fn is_proper(&self) -> bool {
        struct Finder(bool);

        impl Visitor for Finder {
            fn visit(&mut self, term: &Type) -> bool {
                if term.is_inference() {
                    self.0 = true;
                }

                !self.0
            }
        }

        let mut finder = Finder(false);
        visitor::accept(self, &mut finder);

        !finder.0
    }

    /// Returns every inference variable transitively reachable from this
    /// type.
    #[must_use]
    pub fn inference_variables(&self) -> BTreeSet<VariableID> {
        let mut variables = BTreeSet::new();
        self.collect_inference_variables(&mut variables);
        variables
    }

    /// Adds every inference variable reachable from this type to
    /// `variables`.
    pub fn collect_inference_variables(
        &self,
        variables: &mut BTreeSet<VariableID>,
    ) {
        visitor::accept(self, &mut VariableCollector { variables });
    }

    /// Adds every hierarchy written anywhere in this type, nested types and
    /// variable uses included, to `hierarchies`.
    pub fn collect_hierarchies(&self, hierarchies: &mut BTreeSet<HierarchyID>) {
        visitor::accept(self, &mut HierarchyCollector { hierarchies });
    }

    /// Returns `true` if the given variable is reachable from this type.
    #[must_use]
    pub fn mentions(&self, variable: VariableID) -> bool {
        self.inference_variables().contains(&variable)
    }

    /// Returns a new type where every use of a resolved variable is replaced
    /// by the variable's instantiation; uses of unresolved variables are left
    /// untouched.
    ///
    /// Applying the substitution again without new resolutions returns an
    /// equal type.
    #[must_use]
    pub fn substitute_instantiations(
        &self,
        instantiations: &impl Instantiations,
    ) -> Self {
        visitor::transform(self, &mut Substitution { instantiations })
    }
}
