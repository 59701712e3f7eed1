//! Contains the subtyping relation between proper types.

use std::collections::BTreeSet;

use tyqual_qualifier::{Qualifier, Qualifiers};
use tyqual_term::{
    instantiation::Instantiation,
    r#type::{Argument, Class, Type, Wildcard},
    table::{ClassID, TypeParameterID},
};

use crate::Environment;

impl Environment {
    /// Returns `true` if the type is the raw `Object` class.
    #[must_use]
    pub fn is_object(&self, ty: &Type) -> bool {
        matches!(
            ty,
            Type::Class(class)
                if class.id == self.table.object() && class.arguments.is_empty()
        )
    }

    /// The declared upper bounds of the type parameter; `Object` when none
    /// is declared.
    #[must_use]
    pub fn declared_bounds(&self, parameter: TypeParameterID) -> Vec<Type> {
        self.table
            .type_parameter(parameter)
            .map(|x| x.bounds().clone())
            .filter(|x| !x.is_empty())
            .unwrap_or_else(|| vec![self.table.object_type()])
    }

    /// Every class reachable from the given class through declared
    /// supertypes, including the class itself.
    #[must_use]
    pub fn erased_supertypes(&self, class: ClassID) -> BTreeSet<ClassID> {
        let mut result = BTreeSet::new();
        let mut stack = vec![class];

        while let Some(id) = stack.pop() {
            if !result.insert(id) {
                continue;
            }

            if let Some(declaration) = self.table.class(id) {
                stack.extend(declaration.supertypes().iter().map(|x| x.id));
            }
        }

        result
    }

    /// Finds the parameterization of `target` among the supertypes of the
    /// given class type, returning its type arguments.
    ///
    /// An empty argument list is returned when `target` is reached through a
    /// raw use of a generic class. Wildcard arguments of `class` propagate through supertypes
    /// that mention the parameter directly as an argument.
    #[must_use]
    pub fn as_super(
        &self,
        class: &Class,
        target: ClassID,
    ) -> Option<Vec<Argument>> {
        if class.id == target {
            return Some(class.arguments.clone());
        }

        let declaration = self.table.class(class.id)?;
        let instantiation = if class.arguments.is_empty()
            && !declaration.parameters().is_empty()
        {
            None
        } else {
            Instantiation::from_arguments(declaration, &class.arguments).ok()
        };

        declaration.supertypes().iter().find_map(|supertype| {
            let supertype = instantiation.as_ref().map_or_else(
                || Class::new(supertype.id, Vec::new()),
                |x| x.instantiate_class(supertype, &self.registry),
            );

            self.as_super(&supertype, target)
        })
    }

    /// Returns `true` if every qualifier of `sub` is below the qualifier of
    /// `sup` in the same hierarchy. Hierarchies missing on either side are
    /// unconstrained.
    #[must_use]
    pub fn qualifiers_subtype(&self, sub: &Qualifiers, sup: &Qualifiers) -> bool {
        sub.iter().all(|x| {
            sup.get(x.hierarchy).is_none_or(|y| {
                self.registry.is_subtype(x, Qualifier::new(x.hierarchy, y))
            })
        })
    }

    /// Returns `true` if `sub` is a subtype of `sup`.
    ///
    /// Arrays are covariant and are subtypes of `Object`; raw types are
    /// compatible with every parameterization. Uses of inference variables
    /// are opaque: a use is only related to a use of the same variable and
    /// to `Object`.
    #[must_use]
    pub fn is_subtype(&self, sub: &Type, sup: &Type, qualified: bool) -> bool {
        if qualified && !self.qualifiers_subtype(sub.qualifiers(), sup.qualifiers())
        {
            return false;
        }

        match (sub, sup) {
            (Type::Inference(sub), Type::Inference(sup)) => {
                sub.variable() == sup.variable()
            }
            (_, sup) if self.is_object(sup) => true,
            (Type::Inference(_), _) | (_, Type::Inference(_)) => false,
            (Type::Parameter(sub), Type::Parameter(sup)) if sub.id == sup.id => {
                true
            }
            (Type::Parameter(sub), sup) => self
                .declared_bounds(sub.id)
                .iter()
                .any(|x| self.is_subtype(x, sup, qualified)),
            (_, Type::Parameter(_))
            | (Type::Class(_), Type::Array(_))
            | (Type::Array(_), Type::Class(_)) => false,
            (Type::Class(sub), Type::Class(sup)) => {
                self.as_super(sub, sup.id).is_some_and(|arguments| {
                    arguments.is_empty()
                        || sup.arguments.is_empty()
                        || (arguments.len() == sup.arguments.len()
                            && sup
                                .arguments
                                .iter()
                                .zip(&arguments)
                                .all(|(x, y)| self.contains(x, y, qualified)))
                })
            }
            (Type::Array(sub), Type::Array(sup)) => {
                self.is_subtype(&sub.element, &sup.element, qualified)
            }
        }
    }

    /// Returns `true` if the type argument `outer` contains `inner`.
    #[must_use]
    pub fn contains(
        &self,
        outer: &Argument,
        inner: &Argument,
        qualified: bool,
    ) -> bool {
        let Argument::Wildcard(outer) = outer else {
            return self.arguments_equal(outer, inner, qualified);
        };

        match (outer, inner) {
            (Wildcard::Unbounded, _) => true,
            (Wildcard::Extends(bound), Argument::Type(inner)) => {
                self.is_subtype(inner, bound, qualified)
            }
            (
                Wildcard::Extends(bound),
                Argument::Wildcard(Wildcard::Extends(inner)),
            ) => self.is_subtype(inner, bound, qualified),
            (
                Wildcard::Extends(bound),
                Argument::Wildcard(Wildcard::Unbounded | Wildcard::Super(_)),
            ) => self.is_object(bound),
            (Wildcard::Super(bound), Argument::Type(inner)) => {
                self.is_subtype(bound, inner, qualified)
            }
            (
                Wildcard::Super(bound),
                Argument::Wildcard(Wildcard::Super(inner)),
            ) => self.is_subtype(bound, inner, qualified),
            (
                Wildcard::Super(_),
                Argument::Wildcard(Wildcard::Unbounded | Wildcard::Extends(_)),
            ) => false,
        }
    }
}

#[cfg(test)]
mod test;
