//! Contains the closure of bound sets under the incorporation rules.
//!
//! Every newly recorded bound is queued as a work item. Processing it pairs
//! the bound with every other bound of the same variable:
//!
//! | new \ existing | equal `S`  | upper `S`  | lower `S`  |
//! |----------------|------------|------------|------------|
//! | equal `T`      | `T = S`    | `T <: S`   | `S <: T`   |
//! | upper `T`      | `S <: T`   |            | `S <: T`   |
//! | lower `T`      | `T <: S`   | `T <: S`   |            |
//!
//! The emitted constraints are queued as well, so the queue drains exactly
//! when no rule adds a new bound. Qualifier bounds follow the same table per
//! hierarchy; additionally the known upper bounds must have a meet and the
//! known lower bounds a join in their hierarchy.

use tyqual_qualifier::HierarchyID;
use tyqual_term::{r#type::Type, variable::VariableID};

use crate::{
    constraint::{
        Constraint, Origin, QualifierConstraint, QualifierRelation,
        QualifierTerm, Relation,
    },
    error::{Error, IncomparableQualifiersConflict, OverflowError},
    session::Session,
    variable::BoundKind,
};

/// The closure state of a session's bound sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    /// Bounds or constraints were added since the last closure.
    Unclosed,

    /// The incorporation rules are being applied.
    Closing,

    /// No incorporation rule adds a new bound.
    Closed,
}

/// A queued unit of incorporation work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Work {
    Constraint(Constraint),
    Qualifier(QualifierConstraint),
    Bound {
        variable: VariableID,
        kind: BoundKind,
        term: Type,
        origin: Origin,
    },
    QualifierBound {
        variable: VariableID,
        hierarchy: HierarchyID,
        kind: BoundKind,
        term: QualifierTerm,
        origin: Origin,
    },
}

const fn pair(
    new: BoundKind,
    existing: BoundKind,
) -> Option<(bool, bool)> {
    // (is equality, new term is on the left)
    match (new, existing) {
        (BoundKind::Equal, BoundKind::Equal) => Some((true, true)),
        (BoundKind::Equal | BoundKind::Lower, BoundKind::Upper)
        | (BoundKind::Lower, BoundKind::Equal) => Some((false, true)),
        (BoundKind::Equal | BoundKind::Upper, BoundKind::Lower)
        | (BoundKind::Upper, BoundKind::Equal) => Some((false, false)),
        (BoundKind::Upper, BoundKind::Upper)
        | (BoundKind::Lower, BoundKind::Lower) => None,
    }
}

impl Session<'_> {
    /// Applies the incorporation rules until no rule adds a new bound.
    ///
    /// Conflicts are attached to the variables they concern and don't stop
    /// the closure.
    ///
    /// # Errors
    ///
    /// - [`Error::Overflow`] if the session exceeds its configured number of
    ///   work items.
    /// - [`Error::Invariant`] if a constraint mentions a foreign variable.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.work.is_empty() {
            self.state = State::Closed;
            return Ok(());
        }

        self.state = State::Closing;

        while let Some(work) = self.work.pop_front() {
            self.processed += 1;

            if self.processed > self.config.max_steps {
                self.work.push_front(work);
                self.state = State::Unclosed;

                log::debug!(
                    "{}: overflow after {} work items",
                    self.id(),
                    self.config.max_steps
                );

                return Err(OverflowError { limit: self.config.max_steps }.into());
            }

            match work {
                Work::Constraint(constraint) => self.reduce(&constraint)?,
                Work::Qualifier(constraint) => {
                    self.reduce_qualifier_constraint(&constraint)?;
                }
                Work::Bound { variable, kind, term, origin } => {
                    self.incorporate_bound(variable, kind, &term, origin)?;
                }
                Work::QualifierBound { variable, hierarchy, kind, term, origin } => {
                    self.incorporate_qualifier_bound(
                        variable, hierarchy, kind, term, origin,
                    )?;
                }
            }
        }

        self.state = State::Closed;
        Ok(())
    }

    fn incorporate_bound(
        &mut self,
        variable: VariableID,
        kind: BoundKind,
        term: &Type,
        origin: Origin,
    ) -> Result<(), Error> {
        let others = self
            .variables
            .get(variable)?
            .bounds()
            .iter()
            .filter(|(other_kind, other, _)| {
                *other_kind != kind || *other != term
            })
            .map(|(kind, term, _)| (kind, term.clone()))
            .collect::<Vec<_>>();

        for (other_kind, other) in others {
            let Some((equality, new_on_left)) = pair(kind, other_kind) else {
                continue;
            };

            let (left, right) =
                if new_on_left { (term.clone(), other) } else { (other, term.clone()) };

            let relation = if equality {
                Relation::Equal(left, right)
            } else {
                Relation::Subtype { sub: left, sup: right }
            };

            self.push(Work::Constraint(Constraint {
                relation,
                origin,
                qualified: false,
                subject: Some(variable),
            }));
        }

        Ok(())
    }

    fn incorporate_qualifier_bound(
        &mut self,
        variable: VariableID,
        hierarchy: HierarchyID,
        kind: BoundKind,
        term: QualifierTerm,
        origin: Origin,
    ) -> Result<(), Error> {
        let Some(bounds) =
            self.variables.get(variable)?.qualifier_bounds_in(hierarchy)
        else {
            return Ok(());
        };

        let others = bounds
            .iter()
            .filter(|(other_kind, other, _)| *other_kind != kind || **other != term)
            .map(|(kind, term, _)| (kind, *term))
            .collect::<Vec<_>>();

        let known = (kind != BoundKind::Equal && term.is_known()).then(|| {
            bounds
                .get(kind)
                .keys()
                .filter_map(|x| x.as_known().copied())
                .collect::<Vec<_>>()
        });

        for (other_kind, other) in others {
            let Some((equality, new_on_left)) = pair(kind, other_kind) else {
                continue;
            };

            let (left, right) =
                if new_on_left { (term, other) } else { (other, term) };

            let relation = if equality {
                QualifierRelation::Equal(left, right)
            } else {
                QualifierRelation::Subtype { sub: left, sup: right }
            };

            self.push(Work::Qualifier(QualifierConstraint {
                hierarchy,
                relation,
                origin,
                subject: Some(variable),
            }));
        }

        if let Some(elements) = known {
            let registry = self.environment.registry();
            let combined = if kind == BoundKind::Upper {
                registry.glb(hierarchy, elements.iter().copied())
            } else {
                registry.lub(hierarchy, elements.iter().copied())
            };

            if combined.is_none() {
                self.conflict(
                    Some(variable),
                    IncomparableQualifiersConflict { hierarchy, kind, elements }
                        .into(),
                )?;
            }
        }

        Ok(())
    }
}
