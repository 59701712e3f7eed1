//! Contains the reduction of constraints into bounds.

use tyqual_qualifier::{Element, HierarchyID, Qualifier};
use tyqual_term::{
    instantiation::Instantiation,
    r#type::{self, Argument, Type, Wildcard},
    variable::{Use, VariableID},
};

use crate::{
    constraint::{
        Constraint, Origin, QualifierConstraint, QualifierRelation,
        QualifierTerm, Relation,
    },
    error::{
        Conflict, InvariantViolation, QualifierConflict, StructuralConflict,
    },
    incorporation::Work,
    session::Session,
    use_of_variable::UseOfVariable,
    variable::BoundKind,
};

/// The qualifier of one side of a relation in one hierarchy.
enum Side<'a> {
    /// A proper type carrying the element.
    Known(Element),

    /// A variable use written with the element.
    Explicit(Element),

    /// A variable use without an explicit qualifier in the hierarchy.
    Variable(&'a Use),
}

fn side(ty: &Type, hierarchy: HierarchyID) -> Option<Side<'_>> {
    match ty {
        Type::Inference(use_of) => Some(
            use_of
                .qualifiers()
                .get(hierarchy)
                .map_or(Side::Variable(use_of), Side::Explicit),
        ),
        ty => ty.qualifiers().get(hierarchy).map(Side::Known),
    }
}

impl Session<'_> {
    /// Reduces one constraint, recording bounds and queueing the
    /// sub-constraints it decomposes into.
    pub(crate) fn reduce(
        &mut self,
        constraint: &Constraint,
    ) -> Result<(), InvariantViolation> {
        let relation = match &constraint.relation {
            Relation::Subtype { sub, sup } => Relation::Subtype {
                sub: sub.substitute_instantiations(&self.variables),
                sup: sup.substitute_instantiations(&self.variables),
            },
            Relation::Equal(first, second) => Relation::Equal(
                first.substitute_instantiations(&self.variables),
                second.substitute_instantiations(&self.variables),
            ),
            Relation::Contains { outer, inner } => Relation::Contains {
                outer: outer.substitute_instantiations(&self.variables),
                inner: inner.substitute_instantiations(&self.variables),
            },
        };

        match &relation {
            Relation::Subtype { sub, sup } => {
                log::trace!(
                    "{}: reducing {} <: {}",
                    self.id(),
                    self.environment.display(sub),
                    self.environment.display(sup)
                );

                self.reduce_subtype(constraint, sub, sup)
            }
            Relation::Equal(first, second) => {
                log::trace!(
                    "{}: reducing {} = {}",
                    self.id(),
                    self.environment.display(first),
                    self.environment.display(second)
                );

                self.reduce_equal(constraint, first, second)
            }
            Relation::Contains { outer, inner } => {
                log::trace!(
                    "{}: reducing {} contains {}",
                    self.id(),
                    self.environment.display(outer),
                    self.environment.display(inner)
                );

                self.reduce_contains(constraint, outer, inner)
            }
        }
    }

    /// Records a structural conflict on the subject of the constraint, or on
    /// every variable the constraint mentions when it has no subject.
    fn fail(
        &mut self,
        constraint: &Constraint,
        relation: Relation,
    ) -> Result<(), InvariantViolation> {
        let conflict = Conflict::from(StructuralConflict {
            relation,
            origin: constraint.origin,
        });

        if constraint.subject.is_some() {
            return self.conflict(constraint.subject, conflict);
        }

        let variables = constraint.relation.inference_variables();
        if variables.is_empty() {
            return self.conflict(None, conflict);
        }

        for variable in variables {
            self.conflict(Some(variable), conflict.clone())?;
        }

        Ok(())
    }

    /// Records a structural bound through the use and queues the new bounds
    /// for incorporation.
    pub(crate) fn bound_through(
        &mut self,
        use_of: &Use,
        origin: Origin,
        kind: BoundKind,
        term: &Type,
    ) -> Result<(), InvariantViolation> {
        let added = use_of.add_bound(
            &mut self.variables,
            self.environment.registry(),
            origin,
            kind,
            term,
        )?;

        for (kind, term) in added {
            log::trace!(
                "{}: {:?} gets {kind} bound {}",
                self.id(),
                use_of.variable(),
                self.environment.display(&term)
            );

            self.push(Work::Bound {
                variable: use_of.variable(),
                kind,
                term,
                origin,
            });
        }

        Ok(())
    }

    /// Records a qualifier bound through the use and queues it for
    /// incorporation when it is new.
    fn qualifier_bound_through(
        &mut self,
        use_of: &Use,
        hierarchy: HierarchyID,
        kind: BoundKind,
        term: QualifierTerm,
        origin: Origin,
    ) -> Result<(), InvariantViolation> {
        if use_of.add_qualifier_bound(
            &mut self.variables,
            hierarchy,
            kind,
            term,
            origin,
        )? {
            self.push(Work::QualifierBound {
                variable: use_of.variable(),
                hierarchy,
                kind,
                term,
                origin,
            });
        }

        Ok(())
    }

    /// Records a qualifier bound directly on the variable.
    pub(crate) fn qualifier_bound(
        &mut self,
        variable: VariableID,
        hierarchy: HierarchyID,
        kind: BoundKind,
        term: QualifierTerm,
        origin: Origin,
    ) -> Result<(), InvariantViolation> {
        if self
            .variables
            .get_mut(variable)?
            .add_qualifier_bound(hierarchy, kind, term, origin)
        {
            self.push(Work::QualifierBound {
                variable,
                hierarchy,
                kind,
                term,
                origin,
            });
        }

        Ok(())
    }

    /// Reduces the outermost qualifiers of `first` and `second` in every
    /// hierarchy; `first` is the lower side unless `equal` is set.
    ///
    /// Hierarchies are independent: a use written with a qualifier in one
    /// hierarchy still takes part in the others. A side that is explicit in
    /// the hierarchy constrains the other side only when that side is a
    /// variable; against a known qualifier nothing is checked.
    fn reduce_qualifiers(
        &mut self,
        constraint: &Constraint,
        first: &Type,
        second: &Type,
        equal: bool,
    ) -> Result<(), InvariantViolation> {
        let hierarchies =
            self.environment.registry().ids().collect::<Vec<_>>();
        let origin = constraint.origin;
        let (first_kind, second_kind) = if equal {
            (BoundKind::Equal, BoundKind::Equal)
        } else {
            (BoundKind::Upper, BoundKind::Lower)
        };

        for hierarchy in hierarchies {
            let (Some(left), Some(right)) =
                (side(first, hierarchy), side(second, hierarchy))
            else {
                continue;
            };

            match (left, right) {
                (Side::Known(sub), Side::Known(sup)) => {
                    let relation = if equal {
                        QualifierRelation::Equal(
                            QualifierTerm::Known(sub),
                            QualifierTerm::Known(sup),
                        )
                    } else {
                        QualifierRelation::Subtype {
                            sub: QualifierTerm::Known(sub),
                            sup: QualifierTerm::Known(sup),
                        }
                    };

                    self.reduce_qualifier_constraint(&QualifierConstraint {
                        hierarchy,
                        relation,
                        origin,
                        subject: constraint.subject,
                    })?;
                }

                (Side::Known(_) | Side::Explicit(_), Side::Explicit(_))
                | (Side::Explicit(_), Side::Known(_)) => {}

                (
                    Side::Variable(left),
                    Side::Known(element) | Side::Explicit(element),
                ) => {
                    self.qualifier_bound_through(
                        left,
                        hierarchy,
                        first_kind,
                        QualifierTerm::Known(element),
                        origin,
                    )?;
                }

                (
                    Side::Known(element) | Side::Explicit(element),
                    Side::Variable(right),
                ) => {
                    self.qualifier_bound_through(
                        right,
                        hierarchy,
                        second_kind,
                        QualifierTerm::Known(element),
                        origin,
                    )?;
                }

                (Side::Variable(left), Side::Variable(right)) => {
                    if left.variable() == right.variable() {
                        continue;
                    }

                    self.qualifier_bound_through(
                        left,
                        hierarchy,
                        first_kind,
                        QualifierTerm::Of(right.variable()),
                        origin,
                    )?;
                    self.qualifier_bound_through(
                        right,
                        hierarchy,
                        second_kind,
                        QualifierTerm::Of(left.variable()),
                        origin,
                    )?;
                }
            }
        }

        Ok(())
    }

    /// The term with a resolved variable replaced by the qualifier of its
    /// instantiation.
    pub(crate) fn resolve_qualifier_term(
        &self,
        term: QualifierTerm,
        hierarchy: HierarchyID,
    ) -> QualifierTerm {
        let QualifierTerm::Of(variable) = term else {
            return term;
        };

        self.variables
            .get(variable)
            .ok()
            .and_then(|x| x.instantiation().as_ref())
            .and_then(|x| x.qualifiers().get(hierarchy))
            .map_or(term, QualifierTerm::Known)
    }

    /// Reduces a relation between qualifier terms of one hierarchy.
    pub(crate) fn reduce_qualifier_constraint(
        &mut self,
        constraint: &QualifierConstraint,
    ) -> Result<(), InvariantViolation> {
        let hierarchy = constraint.hierarchy;
        let (first, second, equal) = match constraint.relation {
            QualifierRelation::Subtype { sub, sup } => (sub, sup, false),
            QualifierRelation::Equal(first, second) => (first, second, true),
        };
        let first = self.resolve_qualifier_term(first, hierarchy);
        let second = self.resolve_qualifier_term(second, hierarchy);

        let (first_kind, second_kind) = if equal {
            (BoundKind::Equal, BoundKind::Equal)
        } else {
            (BoundKind::Upper, BoundKind::Lower)
        };

        match (first, second) {
            (QualifierTerm::Known(first), QualifierTerm::Known(second)) => {
                let holds = if equal {
                    first == second
                } else {
                    self.environment.registry().is_subtype(
                        Qualifier::new(hierarchy, first),
                        Qualifier::new(hierarchy, second),
                    )
                };

                if !holds {
                    self.conflict(
                        constraint.subject,
                        QualifierConflict {
                            hierarchy,
                            relation: if equal {
                                QualifierRelation::Equal(
                                    QualifierTerm::Known(first),
                                    QualifierTerm::Known(second),
                                )
                            } else {
                                QualifierRelation::Subtype {
                                    sub: QualifierTerm::Known(first),
                                    sup: QualifierTerm::Known(second),
                                }
                            },
                            origin: constraint.origin,
                        }
                        .into(),
                    )?;
                }
            }

            (QualifierTerm::Of(variable), other @ QualifierTerm::Known(_)) => {
                self.qualifier_bound(
                    variable,
                    hierarchy,
                    first_kind,
                    other,
                    constraint.origin,
                )?;
            }

            (other @ QualifierTerm::Known(_), QualifierTerm::Of(variable)) => {
                self.qualifier_bound(
                    variable,
                    hierarchy,
                    second_kind,
                    other,
                    constraint.origin,
                )?;
            }

            (QualifierTerm::Of(left), QualifierTerm::Of(right)) => {
                if left == right {
                    return Ok(());
                }

                self.qualifier_bound(
                    left,
                    hierarchy,
                    first_kind,
                    QualifierTerm::Of(right),
                    constraint.origin,
                )?;
                self.qualifier_bound(
                    right,
                    hierarchy,
                    second_kind,
                    QualifierTerm::Of(left),
                    constraint.origin,
                )?;
            }
        }

        Ok(())
    }

    fn reduce_subtype(
        &mut self,
        constraint: &Constraint,
        sub: &Type,
        sup: &Type,
    ) -> Result<(), InvariantViolation> {
        if constraint.qualified {
            self.reduce_qualifiers(constraint, sub, sup, false)?;
        }

        let origin = constraint.origin;
        let environment = self.environment;

        match (sub, sup) {
            (Type::Inference(left), Type::Inference(right)) => {
                if left.variable() != right.variable() {
                    self.bound_through(left, origin, BoundKind::Upper, sup)?;
                    self.bound_through(right, origin, BoundKind::Lower, sub)?;
                }
            }

            (Type::Inference(left), _) => {
                self.bound_through(left, origin, BoundKind::Upper, sup)?;
            }

            (_, Type::Inference(right)) => {
                self.bound_through(right, origin, BoundKind::Lower, sub)?;
            }

            _ if sub.is_proper() && sup.is_proper() => {
                // outermost qualifiers were reduced above when they count
                if !environment.is_subtype(
                    &sub.without_qualifiers(),
                    &sup.without_qualifiers(),
                    true,
                ) {
                    self.fail(constraint, Relation::Subtype {
                        sub: sub.clone(),
                        sup: sup.clone(),
                    })?;
                }
            }

            (Type::Class(class), _) if class.has_wildcard_arguments() => {
                let captured = Type::Class(self.capture(class, origin)?);

                self.push(Work::Constraint(constraint.derive(
                    Relation::Subtype { sub: captured, sup: sup.clone() },
                )));
            }

            (_, Type::Class(target)) => {
                let arguments = match sub {
                    Type::Class(class) => environment.as_super(class, target.id),
                    Type::Parameter(parameter) => environment
                        .declared_bounds(parameter.id)
                        .iter()
                        .filter_map(Type::as_class)
                        .find_map(|x| environment.as_super(x, target.id)),
                    Type::Array(_) if environment.is_object(sup) => {
                        Some(Vec::new())
                    }
                    Type::Array(_) | Type::Inference(_) => None,
                };

                match arguments {
                    Some(arguments)
                        if arguments.is_empty() || target.arguments.is_empty() => {}

                    Some(arguments) if arguments.len() == target.arguments.len() => {
                        for (outer, inner) in
                            target.arguments.iter().zip(arguments)
                        {
                            self.push(Work::Constraint(constraint.nested(
                                Relation::Contains { outer: outer.clone(), inner },
                            )));
                        }
                    }

                    _ => self.fail(constraint, Relation::Subtype {
                        sub: sub.clone(),
                        sup: sup.clone(),
                    })?,
                }
            }

            (Type::Array(sub_array), Type::Array(sup_array)) => {
                self.push(Work::Constraint(constraint.nested(
                    Relation::Subtype {
                        sub: sub_array.element.as_ref().clone(),
                        sup: sup_array.element.as_ref().clone(),
                    },
                )));
            }

            _ => self.fail(constraint, Relation::Subtype {
                sub: sub.clone(),
                sup: sup.clone(),
            })?,
        }

        Ok(())
    }

    fn reduce_equal(
        &mut self,
        constraint: &Constraint,
        first: &Type,
        second: &Type,
    ) -> Result<(), InvariantViolation> {
        if constraint.qualified {
            self.reduce_qualifiers(constraint, first, second, true)?;
        }

        let origin = constraint.origin;

        match (first, second) {
            (Type::Inference(left), Type::Inference(right)) => {
                if left.variable() != right.variable() {
                    self.bound_through(left, origin, BoundKind::Equal, second)?;
                    self.bound_through(right, origin, BoundKind::Equal, first)?;
                }
            }

            (Type::Inference(left), _) => {
                self.bound_through(left, origin, BoundKind::Equal, second)?;
            }

            (_, Type::Inference(right)) => {
                self.bound_through(right, origin, BoundKind::Equal, first)?;
            }

            _ if first.is_proper() && second.is_proper() => {
                if !self.environment.equals(
                    &first.without_qualifiers(),
                    &second.without_qualifiers(),
                    true,
                ) {
                    self.fail(
                        constraint,
                        Relation::Equal(first.clone(), second.clone()),
                    )?;
                }
            }

            (Type::Class(left), Type::Class(right))
                if left.id == right.id
                    && left.arguments.len() == right.arguments.len() =>
            {
                for (left, right) in left.arguments.iter().zip(&right.arguments) {
                    if let Some(relation) = argument_equality(left, right) {
                        self.push(Work::Constraint(constraint.nested(relation)));
                    } else if !matches!(
                        (left, right),
                        (
                            Argument::Wildcard(Wildcard::Unbounded),
                            Argument::Wildcard(Wildcard::Unbounded)
                        )
                    ) {
                        self.fail(
                            constraint,
                            Relation::Equal(first.clone(), second.clone()),
                        )?;
                    }
                }
            }

            (Type::Array(left), Type::Array(right)) => {
                self.push(Work::Constraint(constraint.nested(Relation::Equal(
                    left.element.as_ref().clone(),
                    right.element.as_ref().clone(),
                ))));
            }

            _ => self.fail(
                constraint,
                Relation::Equal(first.clone(), second.clone()),
            )?,
        }

        Ok(())
    }

    fn reduce_contains(
        &mut self,
        constraint: &Constraint,
        outer: &Argument,
        inner: &Argument,
    ) -> Result<(), InvariantViolation> {
        let object = self.environment.table().object_type();

        let relation = match (outer, inner) {
            (Argument::Type(outer), Argument::Type(inner)) => {
                Some(Relation::Equal(inner.clone(), outer.clone()))
            }

            (Argument::Wildcard(Wildcard::Unbounded), _) => return Ok(()),

            (Argument::Wildcard(Wildcard::Extends(bound)), inner) => {
                Some(Relation::Subtype {
                    sub: match inner {
                        Argument::Type(inner) => inner.clone(),
                        Argument::Wildcard(Wildcard::Extends(inner)) => {
                            inner.as_ref().clone()
                        }
                        Argument::Wildcard(
                            Wildcard::Unbounded | Wildcard::Super(_),
                        ) => object,
                    },
                    sup: bound.as_ref().clone(),
                })
            }

            (Argument::Wildcard(Wildcard::Super(bound)), inner) => match inner {
                Argument::Type(inner) => Some(Relation::Subtype {
                    sub: bound.as_ref().clone(),
                    sup: inner.clone(),
                }),
                Argument::Wildcard(Wildcard::Super(inner)) => {
                    Some(Relation::Subtype {
                        sub: bound.as_ref().clone(),
                        sup: inner.as_ref().clone(),
                    })
                }
                Argument::Wildcard(
                    Wildcard::Unbounded | Wildcard::Extends(_),
                ) => None,
            },

            (Argument::Type(_), Argument::Wildcard(_)) => None,
        };

        match relation {
            Some(relation) => {
                self.push(Work::Constraint(constraint.derive(relation)));
                Ok(())
            }
            None => self.fail(constraint, Relation::Contains {
                outer: outer.clone(),
                inner: inner.clone(),
            }),
        }
    }

    /// Replaces every wildcard argument of the class by a fresh capture
    /// variable bounded by the wildcard's bound and the declared bounds of
    /// the corresponding type parameter.
    fn capture(
        &mut self,
        class: &r#type::Class,
        origin: Origin,
    ) -> Result<r#type::Class, InvariantViolation> {
        let environment = self.environment;
        let mut captures = Vec::new();
        let mut arguments = Vec::with_capacity(class.arguments.len());

        for (index, argument) in class.arguments.iter().enumerate() {
            let Argument::Wildcard(wildcard) = argument else {
                arguments.push(argument.clone());
                continue;
            };

            let variable = self.fresh_capture(class.id, index);
            captures.push((variable, index, wildcard));
            arguments.push(Argument::Type(Type::Inference(Use::unqualified(
                variable,
            ))));
        }

        let captured = r#type::Class {
            id: class.id,
            arguments,
            qualifiers: class.qualifiers.clone(),
        };

        let declaration = environment.table().class(class.id);
        let instantiation = declaration.and_then(|x| {
            Instantiation::from_arguments(x, &captured.arguments).ok()
        });

        for (variable, index, wildcard) in captures {
            let use_of = Use::unqualified(variable);
            let declared = declaration
                .and_then(|x| x.parameters().get(index).copied())
                .map_or_else(
                    || vec![environment.table().object_type()],
                    |x| environment.declared_bounds(x),
                );

            for bound in declared {
                let bound = instantiation
                    .as_ref()
                    .map_or_else(
                        || bound.clone(),
                        |x| x.instantiate(&bound, environment.registry()),
                    );

                self.bound_through(&use_of, origin, BoundKind::Upper, &bound)?;
            }

            match wildcard {
                Wildcard::Unbounded => {}
                Wildcard::Extends(bound) => {
                    self.bound_through(&use_of, origin, BoundKind::Upper, bound)?;
                }
                Wildcard::Super(bound) => {
                    self.bound_through(&use_of, origin, BoundKind::Lower, bound)?;
                }
            }
        }

        Ok(captured)
    }
}

fn argument_equality(first: &Argument, second: &Argument) -> Option<Relation> {
    match (first, second) {
        (Argument::Type(first), Argument::Type(second)) => {
            Some(Relation::Equal(first.clone(), second.clone()))
        }
        (
            Argument::Wildcard(Wildcard::Extends(first)),
            Argument::Wildcard(Wildcard::Extends(second)),
        )
        | (
            Argument::Wildcard(Wildcard::Super(first)),
            Argument::Wildcard(Wildcard::Super(second)),
        ) => Some(Relation::Equal(
            first.as_ref().clone(),
            second.as_ref().clone(),
        )),
        _ => None,
    }
}
