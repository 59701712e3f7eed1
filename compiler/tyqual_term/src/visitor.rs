//! Contains the recursive traversal of [`Type`] terms.

use crate::r#type::{Argument, Array, Class, Type, Wildcard};

/// A read-only visitor of type terms.
pub trait Visitor {
    /// Visits a term. Returns `false` to stop the traversal.
    fn visit(&mut self, term: &Type) -> bool;
}

/// Rewrites type terms bottom-up.
pub trait Transform {
    /// Returns the replacement of the term, or `None` to keep the term and
    /// descend into its sub-terms.
    fn transform(&mut self, term: &Type) -> Option<Type>;
}

impl<F: FnMut(&Type) -> Option<Type>> Transform for F {
    fn transform(&mut self, term: &Type) -> Option<Type> { self(term) }
}

/// Visits the term and all its sub-terms in pre-order. Returns `false` if the
/// visitor stopped the traversal.
pub fn accept(term: &Type, visitor: &mut impl Visitor) -> bool {
    if !visitor.visit(term) {
        return false;
    }

    match term {
        Type::Class(class) => {
            class.arguments.iter().all(|x| accept_argument(x, visitor))
        }
        Type::Array(array) => accept(&array.element, visitor),
        Type::Parameter(_) | Type::Inference(_) => true,
    }
}

/// Visits every type reachable from the type argument.
pub fn accept_argument(argument: &Argument, visitor: &mut impl Visitor) -> bool {
    match argument {
        Argument::Type(ty) => accept(ty, visitor),
        Argument::Wildcard(Wildcard::Unbounded) => true,
        Argument::Wildcard(Wildcard::Extends(ty) | Wildcard::Super(ty)) => {
            accept(ty, visitor)
        }
    }
}

/// Rebuilds the term, giving the transformer the chance to replace every
/// sub-term. A replaced term is not descended into.
pub fn transform(term: &Type, transformer: &mut impl Transform) -> Type {
    if let Some(replaced) = transformer.transform(term) {
        return replaced;
    }

    match term {
        Type::Class(class) => Type::Class(Class {
            id: class.id,
            arguments: class
                .arguments
                .iter()
                .map(|x| transform_argument(x, transformer))
                .collect(),
            qualifiers: class.qualifiers.clone(),
        }),
        Type::Array(array) => Type::Array(Array {
            element: Box::new(transform(&array.element, transformer)),
            qualifiers: array.qualifiers.clone(),
        }),
        Type::Parameter(_) | Type::Inference(_) => term.clone(),
    }
}

/// Rebuilds the type argument with [`transform`].
pub fn transform_argument(
    argument: &Argument,
    transformer: &mut impl Transform,
) -> Argument {
    match argument {
        Argument::Type(ty) => Argument::Type(transform(ty, transformer)),
        Argument::Wildcard(Wildcard::Unbounded) => {
            Argument::Wildcard(Wildcard::Unbounded)
        }
        Argument::Wildcard(Wildcard::Extends(ty)) => Argument::Wildcard(
            Wildcard::Extends(Box::new(transform(ty, transformer))),
        ),
        Argument::Wildcard(Wildcard::Super(ty)) => Argument::Wildcard(
            Wildcard::Super(Box::new(transform(ty, transformer))),
        ),
    }
}
