//! Contains how bounds are recorded through one [`Use`] of a variable.
//!
//! A use written with an explicit qualifier pins the qualifier at that
//! occurrence only. Bounds recorded through such a use still reach the
//! variable's structural bound set, but with their outermost qualifiers
//! replaced: lower bounds get the tops and upper bounds the bottoms of the
//! explicit hierarchies, and an equal bound to anything but a variable is
//! recorded as both. The use never records qualifier bounds in the
//! hierarchies it is explicit in, so the annotation can't leak into the
//! other occurrences of the variable.
//!
//! Resolution chooses qualifiers from the qualifier bound sets alone, so the
//! overridden outermost qualifiers only mark the recorded structural bound.

use tyqual_qualifier::{HierarchyID, Registry};
use tyqual_term::{r#type::Type, variable::Use};

use crate::{
    constraint::{Origin, QualifierTerm},
    error::InvariantViolation,
    variable::{BoundKind, Variables},
};

/// Records bounds on the variable behind a use.
pub trait UseOfVariable {
    /// Adds a structural bound to the used variable, returning the bounds
    /// that were actually new to the variable.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] if the variable doesn't belong to
    /// `variables`.
    fn add_bound(
        &self,
        variables: &mut Variables,
        registry: &Registry,
        origin: Origin,
        kind: BoundKind,
        bound: &Type,
    ) -> Result<Vec<(BoundKind, Type)>, InvariantViolation>;

    /// Adds a qualifier bound to the used variable unless the use is
    /// explicit in the hierarchy. Returns `true` if the bound is new.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] if the variable doesn't belong to
    /// `variables`.
    fn add_qualifier_bound(
        &self,
        variables: &mut Variables,
        hierarchy: HierarchyID,
        kind: BoundKind,
        term: QualifierTerm,
        origin: Origin,
    ) -> Result<bool, InvariantViolation>;
}

impl UseOfVariable for Use {
    fn add_bound(
        &self,
        variables: &mut Variables,
        registry: &Registry,
        origin: Origin,
        kind: BoundKind,
        bound: &Type,
    ) -> Result<Vec<(BoundKind, Type)>, InvariantViolation> {
        let variable = variables.get_mut(self.variable())?;

        let candidates = if !self.has_explicit_qualifier()
            || (kind == BoundKind::Equal && bound.is_inference())
        {
            vec![(kind, bound.clone())]
        } else {
            let with_tops =
                || bound.with_qualifiers_overridden(self.tops(), registry);
            let with_bottoms =
                || bound.with_qualifiers_overridden(self.bottoms(), registry);

            match kind {
                BoundKind::Lower => vec![(BoundKind::Lower, with_tops())],
                BoundKind::Upper => vec![(BoundKind::Upper, with_bottoms())],
                BoundKind::Equal => vec![
                    (BoundKind::Upper, with_bottoms()),
                    (BoundKind::Lower, with_tops()),
                ],
            }
        };

        let mut added = Vec::with_capacity(candidates.len());
        for (kind, term) in candidates {
            if variable.add_bound(kind, term.clone(), origin) {
                added.push((kind, term));
            }
        }

        Ok(added)
    }

    fn add_qualifier_bound(
        &self,
        variables: &mut Variables,
        hierarchy: HierarchyID,
        kind: BoundKind,
        term: QualifierTerm,
        origin: Origin,
    ) -> Result<bool, InvariantViolation> {
        let variable = variables.get_mut(self.variable())?;

        if self.is_explicit_in(hierarchy) {
            return Ok(false);
        }

        Ok(variable.add_qualifier_bound(hierarchy, kind, term, origin))
    }
}

#[cfg(test)]
mod test;
