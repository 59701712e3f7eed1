//! Contains the least-upper-bound and greatest-lower-bound computations.

use std::collections::BTreeSet;

use tyqual_term::{
    r#type::{Argument, Type, Wildcard},
    table::ClassID,
};

use crate::{AmbiguousBoundError, Environment};

impl Environment {
    /// Removes the outermost qualifiers and structural duplicates, keeping
    /// the first occurrence of each type.
    fn distinct_structures(&self, types: &[Type]) -> Vec<Type> {
        let mut distinct = Vec::<Type>::with_capacity(types.len());

        for ty in types {
            let ty = ty.without_qualifiers();
            if !distinct.iter().any(|x| self.equals(x, &ty, true)) {
                distinct.push(ty);
            }
        }

        distinct
    }

    /// The classes that every value of the type is an instance of.
    #[must_use]
    pub fn erased_candidates(&self, ty: &Type) -> BTreeSet<ClassID> {
        match ty {
            Type::Class(class) => self.erased_supertypes(class.id),
            Type::Parameter(parameter) => self
                .declared_bounds(parameter.id)
                .iter()
                .flat_map(|x| self.erased_candidates(x))
                .collect(),
            Type::Array(_) | Type::Inference(_) => {
                std::iter::once(self.table.object()).collect()
            }
        }
    }

    fn parameterization_of(
        &self,
        ty: &Type,
        target: ClassID,
    ) -> Option<Vec<Argument>> {
        match ty {
            Type::Class(class) => self.as_super(class, target),
            Type::Parameter(parameter) => self
                .declared_bounds(parameter.id)
                .iter()
                .find_map(|x| self.parameterization_of(x, target)),
            Type::Array(_) | Type::Inference(_) => None,
        }
    }

    /// Computes the least upper bound of the given proper types.
    ///
    /// The result carries no outermost qualifiers; qualifiers are resolved
    /// per hierarchy by the caller. Type arguments that differ among the
    /// types become `? extends` the least upper bound of the arguments, down
    /// to `depth` levels of nesting, after which they become `?`.
    ///
    /// # Errors
    ///
    /// Returns [`AmbiguousBoundError`] if the types have more than one
    /// minimal common erased supertype.
    pub fn lub(
        &self,
        types: &[Type],
        depth: usize,
    ) -> Result<Type, AmbiguousBoundError> {
        let distinct = self.distinct_structures(types);

        match distinct.as_slice() {
            [] => return Ok(self.table.object_type()),
            [single] => return Ok(single.clone()),
            _ => {}
        }

        if let Some(greatest) = distinct
            .iter()
            .find(|x| distinct.iter().all(|y| self.is_subtype(y, x, false)))
        {
            return Ok(greatest.clone());
        }

        if distinct.iter().all(Type::is_array) {
            let elements = distinct
                .iter()
                .filter_map(Type::as_array)
                .map(|x| x.element.as_ref().clone())
                .collect::<Vec<_>>();

            return Ok(Type::array(self.lub(&elements, depth)?));
        }

        let erased = distinct
            .iter()
            .map(|x| self.erased_candidates(x))
            .reduce(|acc, x| acc.intersection(&x).copied().collect())
            .unwrap_or_default();

        let minimal = erased
            .iter()
            .copied()
            .filter(|x| {
                !erased.iter().any(|y| {
                    y != x && self.erased_supertypes(*y).contains(x)
                })
            })
            .collect::<Vec<_>>();

        if minimal.len() != 1 {
            log::debug!(
                "ambiguous least upper bound: {} minimal candidates",
                minimal.len()
            );

            return Err(AmbiguousBoundError {
                candidates: minimal
                    .into_iter()
                    .map(|x| Type::class(x, []))
                    .collect(),
            });
        }

        let candidate = minimal[0];
        let parameter_count =
            self.table.class(candidate).map_or(0, |x| x.parameters().len());

        if parameter_count == 0 {
            return Ok(Type::class(candidate, []));
        }

        let Some(parameterizations) = distinct
            .iter()
            .map(|x| self.parameterization_of(x, candidate))
            .collect::<Option<Vec<_>>>()
            .filter(|x| x.iter().all(|y| y.len() == parameter_count))
        else {
            return Ok(Type::class(candidate, []));
        };

        Ok(Type::class(
            candidate,
            (0..parameter_count).map(|index| {
                let arguments = parameterizations
                    .iter()
                    .map(|x| &x[index])
                    .collect::<Vec<_>>();

                self.lub_arguments(&arguments, depth)
            }),
        ))
    }

    fn lub_arguments(&self, arguments: &[&Argument], depth: usize) -> Argument {
        let first = arguments[0];
        if arguments.iter().all(|x| self.arguments_equal(first, x, true)) {
            return first.clone();
        }

        if depth == 0 {
            return Argument::Wildcard(Wildcard::Unbounded);
        }

        let Some(uppers) = arguments
            .iter()
            .map(|x| match x {
                Argument::Type(ty) => Some(ty.clone()),
                Argument::Wildcard(Wildcard::Extends(ty)) => {
                    Some(ty.as_ref().clone())
                }
                Argument::Wildcard(Wildcard::Unbounded | Wildcard::Super(_)) => {
                    None
                }
            })
            .collect::<Option<Vec<_>>>()
        else {
            return Argument::Wildcard(Wildcard::Unbounded);
        };

        match self.lub(&uppers, depth - 1) {
            Ok(lub) if !self.is_object(&lub) => {
                Argument::Wildcard(Wildcard::Extends(Box::new(lub)))
            }
            _ => Argument::Wildcard(Wildcard::Unbounded),
        }
    }

    /// Computes the greatest lower bound of the given proper types: the one
    /// type that is a subtype of every other.
    ///
    /// # Errors
    ///
    /// Returns [`AmbiguousBoundError`] if no type is a subtype of all the
    /// others.
    pub fn glb(&self, types: &[Type]) -> Result<Type, AmbiguousBoundError> {
        let distinct = self.distinct_structures(types);

        if distinct.is_empty() {
            return Ok(self.table.object_type());
        }

        distinct
            .iter()
            .find(|x| distinct.iter().all(|y| self.is_subtype(x, y, false)))
            .cloned()
            .ok_or_else(|| AmbiguousBoundError { candidates: distinct.clone() })
    }
}

#[cfg(test)]
mod test;
