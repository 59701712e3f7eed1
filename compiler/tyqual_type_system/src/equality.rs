//! Contains the structural equality check.

use tyqual_qualifier::Qualifiers;
use tyqual_term::r#type::{Argument, Type, Wildcard};

use crate::Environment;

impl Environment {
    /// Returns `true` if both qualifier sets agree in every hierarchy present
    /// on both sides.
    #[must_use]
    pub fn qualifiers_agree(&self, first: &Qualifiers, second: &Qualifiers) -> bool {
        first
            .iter()
            .all(|x| second.get(x.hierarchy).is_none_or(|y| y == x.element))
    }

    /// Returns `true` if the two types are structurally identical.
    ///
    /// When `qualified` is set, qualifiers are compared at every level in the
    /// hierarchies present on both sides; otherwise qualifiers are ignored.
    #[must_use]
    pub fn equals(&self, first: &Type, second: &Type, qualified: bool) -> bool {
        if qualified && !self.qualifiers_agree(first.qualifiers(), second.qualifiers())
        {
            return false;
        }

        match (first, second) {
            (Type::Class(first), Type::Class(second)) => {
                first.id == second.id
                    && first.arguments.len() == second.arguments.len()
                    && first
                        .arguments
                        .iter()
                        .zip(&second.arguments)
                        .all(|(x, y)| self.arguments_equal(x, y, qualified))
            }
            (Type::Array(first), Type::Array(second)) => {
                self.equals(&first.element, &second.element, qualified)
            }
            (Type::Parameter(first), Type::Parameter(second)) => {
                first.id == second.id
            }
            (Type::Inference(first), Type::Inference(second)) => {
                first.variable() == second.variable()
            }
            _ => false,
        }
    }

    /// Returns `true` if the two type arguments are identical.
    #[must_use]
    pub fn arguments_equal(
        &self,
        first: &Argument,
        second: &Argument,
        qualified: bool,
    ) -> bool {
        match (first, second) {
            (Argument::Type(first), Argument::Type(second)) => {
                self.equals(first, second, qualified)
            }
            (Argument::Wildcard(first), Argument::Wildcard(second)) => {
                match (first, second) {
                    (Wildcard::Unbounded, Wildcard::Unbounded) => true,
                    (Wildcard::Extends(first), Wildcard::Extends(second))
                    | (Wildcard::Super(first), Wildcard::Super(second)) => {
                        self.equals(first, second, qualified)
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }
}
