//! Contains the code related to substituting declared type parameters.

use std::collections::BTreeMap;

use tyqual_qualifier::Registry;

use crate::{
    table::{Class, TypeParameterID},
    r#type::{Argument, Array, Parameter, Type, Wildcard},
};

/// Represents an instantiation of declared type parameters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Instantiation {
    /// The argument each type parameter is replaced with.
    pub arguments: BTreeMap<TypeParameterID, Argument>,
}

/// The number of type arguments supplied doesn't match the number of type
/// parameters of the class.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error,
)]
#[error(
    "the number of type arguments supplied ({found}) does not match the \
     number of type parameters ({expected})"
)]
pub struct MismatchedArgumentCountError {
    /// The number of type parameters expected.
    pub expected: usize,

    /// The number of type arguments supplied.
    pub found: usize,
}

impl Instantiation {
    /// Creates the instantiation mapping the class' type parameters to the
    /// given arguments.
    ///
    /// # Errors
    ///
    /// Returns [`MismatchedArgumentCountError`] if the lengths differ.
    pub fn from_arguments(
        class: &Class,
        arguments: &[Argument],
    ) -> Result<Self, MismatchedArgumentCountError> {
        if class.parameters().len() != arguments.len() {
            return Err(MismatchedArgumentCountError {
                expected: class.parameters().len(),
                found: arguments.len(),
            });
        }

        Ok(Self {
            arguments: class
                .parameters()
                .iter()
                .copied()
                .zip(arguments.iter().cloned())
                .collect(),
        })
    }

    /// Replaces every occurrence of a mapped type parameter in a type
    /// position.
    ///
    /// A parameter mapped to a wildcard cannot occur in a type position; it
    /// is replaced by the wildcard's upper bound when it has one and kept
    /// as-is otherwise. Qualifiers written on the occurrence take precedence
    /// over the qualifiers of the argument; for a variable use they become
    /// explicit at the use.
    #[must_use]
    pub fn instantiate(&self, ty: &Type, registry: &Registry) -> Type {
        match ty {
            Type::Parameter(parameter) => {
                match self.arguments.get(&parameter.id) {
                    Some(Argument::Type(argument)) => {
                        with_occurrence_qualifiers(argument, parameter, registry)
                    }
                    Some(Argument::Wildcard(Wildcard::Extends(bound))) => {
                        with_occurrence_qualifiers(bound, parameter, registry)
                    }
                    Some(Argument::Wildcard(
                        Wildcard::Unbounded | Wildcard::Super(_),
                    ))
                    | None => ty.clone(),
                }
            }
            Type::Class(class) => {
                Type::Class(self.instantiate_class(class, registry))
            }
            Type::Array(array) => Type::Array(Array {
                element: Box::new(self.instantiate(&array.element, registry)),
                qualifiers: array.qualifiers.clone(),
            }),
            Type::Inference(_) => ty.clone(),
        }
    }

    /// Replaces every occurrence of a mapped type parameter in the type
    /// arguments of the class.
    #[must_use]
    pub fn instantiate_class(
        &self,
        class: &crate::r#type::Class,
        registry: &Registry,
    ) -> crate::r#type::Class {
        crate::r#type::Class {
            id: class.id,
            arguments: class
                .arguments
                .iter()
                .map(|x| self.instantiate_argument(x, registry))
                .collect(),
            qualifiers: class.qualifiers.clone(),
        }
    }

    /// Replaces every occurrence of a mapped type parameter in a type
    /// argument. A parameter written directly as the argument may be
    /// replaced by a wildcard.
    #[must_use]
    pub fn instantiate_argument(
        &self,
        argument: &Argument,
        registry: &Registry,
    ) -> Argument {
        match argument {
            Argument::Type(Type::Parameter(parameter)) => {
                match self.arguments.get(&parameter.id) {
                    Some(Argument::Type(argument)) => Argument::Type(
                        with_occurrence_qualifiers(argument, parameter, registry),
                    ),
                    Some(wildcard @ Argument::Wildcard(_)) => wildcard.clone(),
                    None => argument.clone(),
                }
            }
            Argument::Type(ty) => Argument::Type(self.instantiate(ty, registry)),
            Argument::Wildcard(Wildcard::Unbounded) => argument.clone(),
            Argument::Wildcard(Wildcard::Extends(bound)) => Argument::Wildcard(
                Wildcard::Extends(Box::new(self.instantiate(bound, registry))),
            ),
            Argument::Wildcard(Wildcard::Super(bound)) => Argument::Wildcard(
                Wildcard::Super(Box::new(self.instantiate(bound, registry))),
            ),
        }
    }
}

fn with_occurrence_qualifiers(
    argument: &Type,
    occurrence: &Parameter,
    registry: &Registry,
) -> Type {
    if occurrence.qualifiers.is_empty() {
        return argument.clone();
    }

    argument.with_qualifiers_overridden(&occurrence.qualifiers, registry)
}
