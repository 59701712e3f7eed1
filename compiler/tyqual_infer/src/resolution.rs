//! Contains the resolver choosing the instantiation of every variable.
//!
//! Each [`Session::step`] resolves one group of variables: every unresolved
//! variable whose bounds mention no other unresolved variable, or, when no
//! such variable exists, the sink strongly connected component of the
//! dependency graph that contains the smallest variable. Inside such a
//! component, members with a proper bound go first so that the others can
//! build on their instantiations. After the group is instantiated the new
//! equal bounds are incorporated, so an instantiation that contradicts other
//! bounds is reported before the next step.

use std::collections::{BTreeMap, BTreeSet};

use enum_as_inner::EnumAsInner;
use tyqual_qualifier::{
    HierarchyID, Qualifier, Qualifiers, UnknownHierarchyError,
};
use tyqual_term::{r#type::Type, variable::VariableID};
use tyqual_type_system::AmbiguousBoundError;

use crate::{
    constraint::{Origin, QualifierTerm},
    error::{Ambiguity, AmbiguousError, Error, InvariantViolation},
    incorporation::Work,
    session::Session,
    variable::BoundKind,
};

/// The outcome of one resolution step.
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum Progress {
    /// The variables resolved in this step.
    Resolved(BTreeSet<VariableID>),

    /// Every variable of the session is resolved.
    Completed,
}

/// Tarjan's strongly connected components over the unresolved variables.
struct Tarjan<'a> {
    graph: &'a BTreeMap<VariableID, BTreeSet<VariableID>>,
    index: usize,
    indices: BTreeMap<VariableID, usize>,
    lowlinks: BTreeMap<VariableID, usize>,
    stack: Vec<VariableID>,
    on_stack: BTreeSet<VariableID>,
    components: Vec<BTreeSet<VariableID>>,
}

impl<'a> Tarjan<'a> {
    fn new(graph: &'a BTreeMap<VariableID, BTreeSet<VariableID>>) -> Self {
        Self {
            graph,
            index: 0,
            indices: BTreeMap::new(),
            lowlinks: BTreeMap::new(),
            stack: Vec::new(),
            on_stack: BTreeSet::new(),
            components: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<BTreeSet<VariableID>> {
        for &vertex in self.graph.keys() {
            if !self.indices.contains_key(&vertex) {
                self.connect(vertex);
            }
        }

        self.components
    }

    fn connect(&mut self, vertex: VariableID) {
        self.indices.insert(vertex, self.index);
        self.lowlinks.insert(vertex, self.index);
        self.index += 1;
        self.stack.push(vertex);
        self.on_stack.insert(vertex);

        let graph = self.graph;
        for &next in graph.get(&vertex).into_iter().flatten() {
            if !self.indices.contains_key(&next) {
                self.connect(next);

                let lowlink = self.lowlinks[&vertex].min(self.lowlinks[&next]);
                self.lowlinks.insert(vertex, lowlink);
            } else if self.on_stack.contains(&next) {
                let lowlink = self.lowlinks[&vertex].min(self.indices[&next]);
                self.lowlinks.insert(vertex, lowlink);
            }
        }

        if self.lowlinks[&vertex] != self.indices[&vertex] {
            return;
        }

        let mut component = BTreeSet::new();
        while let Some(member) = self.stack.pop() {
            self.on_stack.remove(&member);
            component.insert(member);

            if member == vertex {
                break;
            }
        }

        self.components.push(component);
    }
}

/// The component without dependencies outside itself that contains the
/// smallest variable.
fn sink_component(
    graph: &BTreeMap<VariableID, BTreeSet<VariableID>>,
) -> BTreeSet<VariableID> {
    Tarjan::new(graph)
        .run()
        .into_iter()
        .filter(|component| {
            component.iter().all(|x| {
                graph.get(x).is_none_or(|x| x.is_subset(component))
            })
        })
        .min_by_key(|x| x.first().copied())
        .unwrap_or_default()
}

impl Session<'_> {
    /// Closes the bound sets and resolves one group of variables.
    ///
    /// The session can be abandoned between any two steps.
    ///
    /// # Errors
    ///
    /// - [`Error::Unsatisfiable`] if some bound set has no instantiation.
    /// - [`Error::Ambiguous`] if some bound set has incomparable minimal
    ///   instantiations.
    /// - [`Error::Overflow`] if the session processed too much work.
    /// - [`Error::Invariant`] on foreign variables.
    pub fn step(&mut self) -> Result<Progress, Error> {
        self.close()?;
        if let Some(error) = self.unsatisfiable() {
            return Err(error.into());
        }

        let unresolved = self
            .variables
            .iter()
            .filter(|x| !x.is_resolved())
            .map(|x| x.id())
            .collect::<BTreeSet<_>>();

        if unresolved.is_empty() {
            return Ok(Progress::Completed);
        }

        let graph = self
            .variables
            .iter()
            .filter(|x| unresolved.contains(&x.id()))
            .map(|x| {
                (
                    x.id(),
                    x.dependencies()
                        .intersection(&unresolved)
                        .copied()
                        .collect::<BTreeSet<_>>(),
                )
            })
            .collect::<BTreeMap<_, _>>();

        let ready = graph
            .iter()
            .filter(|(_, dependencies)| dependencies.is_empty())
            .map(|(id, _)| *id)
            .collect::<BTreeSet<_>>();

        let (group, cyclic) = if ready.is_empty() {
            (sink_component(&graph), true)
        } else {
            (ready, false)
        };

        log::debug!(
            "{}: resolving {group:?}{}",
            self.id(),
            if cyclic { " as a cycle" } else { "" }
        );

        if cyclic {
            let mut pending = group.clone();
            while let Some(variable) = self.next_in_cycle(&pending)? {
                pending.remove(&variable);
                self.resolve(variable, true)?;
            }
        } else {
            for &variable in &group {
                self.resolve(variable, false)?;
            }
        }

        self.close()?;
        if let Some(error) = self.unsatisfiable() {
            return Err(error.into());
        }

        Ok(Progress::Resolved(group))
    }

    /// Steps until every variable is resolved and returns the
    /// instantiations.
    ///
    /// # Errors
    ///
    /// See [`Self::step`].
    pub fn solve(&mut self) -> Result<BTreeMap<VariableID, Type>, Error> {
        while self.step()? != Progress::Completed {}

        Ok(self.instantiations())
    }

    /// The next member of a cycle to resolve: the first one with a bound
    /// that is proper under the instantiations chosen so far, otherwise the
    /// smallest one.
    fn next_in_cycle(
        &self,
        pending: &BTreeSet<VariableID>,
    ) -> Result<Option<VariableID>, InvariantViolation> {
        for &variable in pending {
            let seeded = self
                .variables
                .get(variable)?
                .bounds()
                .iter()
                .any(|(_, x, _)| {
                    x.substitute_instantiations(&self.variables).is_proper()
                });

            if seeded {
                return Ok(Some(variable));
            }
        }

        Ok(pending.first().copied())
    }

    /// The bounds of the kind that are proper once the current
    /// instantiations are substituted.
    fn proper_bounds(
        &self,
        variable: VariableID,
        kind: BoundKind,
    ) -> Result<Vec<Type>, InvariantViolation> {
        Ok(self
            .variables
            .get(variable)?
            .bounds()
            .get(kind)
            .keys()
            .map(|x| x.substitute_instantiations(&self.variables))
            .filter(Type::is_proper)
            .map(|x| x.without_qualifiers())
            .collect())
    }

    /// Returns `true` if some bound of the kind is proper without building
    /// on a low-confidence instantiation.
    fn confident(
        &self,
        variable: VariableID,
        kind: BoundKind,
    ) -> Result<bool, InvariantViolation> {
        let low_confidence = |x: &VariableID| {
            self.variables.get(*x).is_ok_and(|x| x.low_confidence())
        };

        Ok(self.variables.get(variable)?.bounds().get(kind).keys().any(|x| {
            let substituted = x.substitute_instantiations(&self.variables);

            substituted.is_proper()
                && !x.inference_variables().iter().any(low_confidence)
        }))
    }

    fn ambiguous(
        &self,
        variable: VariableID,
        ambiguity: Ambiguity,
    ) -> Result<AmbiguousError, InvariantViolation> {
        Ok(AmbiguousError {
            variable,
            parameter: self.variables.get(variable)?.parameter(),
            ambiguity,
        })
    }

    /// The unchecked exception root, if the variable only appears in throws
    /// positions bounded by exception roots.
    fn throws_fallback(
        &self,
        variable: VariableID,
        upper: &[Type],
    ) -> Result<Option<Type>, InvariantViolation> {
        if !self.config.throws_fallback
            || !self.variables.get(variable)?.has_throws()
        {
            return Ok(None);
        }

        let table = self.environment.table();
        let well_known = table.well_known();
        let roots = [
            Some(well_known.object()),
            well_known.throwable(),
            well_known.exception(),
        ];

        let only_roots = upper.iter().all(|x| {
            x.as_class().is_some_and(|x| roots.contains(&Some(x.id)))
        });

        Ok(well_known
            .runtime_exception()
            .filter(|_| only_roots)
            .map(|x| Type::class(x, [])))
    }

    /// Chooses the instantiation of the variable without its outermost
    /// qualifiers; the flag tells whether a proper bound that doesn't build
    /// on a low-confidence instantiation seeded it.
    fn resolve_structure(
        &self,
        variable: VariableID,
    ) -> Result<(Type, bool), Error> {
        let environment = self.environment;
        let from_bound_error = |error: AmbiguousBoundError| {
            self.ambiguous(variable, Ambiguity::Type(error.candidates))
        };

        if let Some(equal) =
            self.proper_bounds(variable, BoundKind::Equal)?.into_iter().next()
        {
            return Ok((equal, self.confident(variable, BoundKind::Equal)?));
        }

        let lower = self.proper_bounds(variable, BoundKind::Lower)?;
        if !lower.is_empty() {
            return match environment.lub(&lower, self.config.lub_depth) {
                Ok(lub) => Ok((
                    lub.without_qualifiers(),
                    self.confident(variable, BoundKind::Lower)?,
                )),
                Err(error) => Err(from_bound_error(error)?.into()),
            };
        }

        let upper = self.proper_bounds(variable, BoundKind::Upper)?;
        if let Some(fallback) = self.throws_fallback(variable, &upper)? {
            log::debug!(
                "{}: {variable:?} falls back to {}",
                self.id(),
                environment.display(&fallback)
            );

            return Ok((fallback, true));
        }

        if !upper.is_empty() {
            return match environment.glb(&upper) {
                Ok(glb) => Ok((
                    glb.without_qualifiers(),
                    self.confident(variable, BoundKind::Upper)?,
                )),
                Err(error) => Err(from_bound_error(error)?.into()),
            };
        }

        Ok((environment.table().object_type(), false))
    }

    /// Chooses the qualifier of the variable in the hierarchy.
    fn resolve_qualifier(
        &self,
        variable: VariableID,
        hierarchy: HierarchyID,
    ) -> Result<Qualifier, Error> {
        let registry = self.environment.registry();
        let default = registry
            .default_of(hierarchy)
            .ok_or(InvariantViolation::from(UnknownHierarchyError(hierarchy)))?
            .element;

        let Some(bounds) =
            self.variables.get(variable)?.qualifier_bounds_in(hierarchy)
        else {
            return Ok(Qualifier::new(hierarchy, default));
        };

        let known = |kind| {
            bounds
                .get(kind)
                .keys()
                .filter_map(|x| {
                    self.resolve_qualifier_term(*x, hierarchy)
                        .as_known()
                        .copied()
                })
                .collect::<Vec<_>>()
        };

        let equal = known(BoundKind::Equal);
        let lower = known(BoundKind::Lower);
        let upper = known(BoundKind::Upper);

        let element = match equal.first() {
            Some(element) => Some(*element),
            None if !lower.is_empty() => {
                registry.lub(hierarchy, lower.iter().copied())
            }
            None if !upper.is_empty() => {
                registry.glb(hierarchy, upper.iter().copied())
            }
            None => Some(default),
        };

        match element {
            Some(element) => Ok(Qualifier::new(hierarchy, element)),
            None => Err(self
                .ambiguous(variable, Ambiguity::Qualifier {
                    hierarchy,
                    elements: if lower.is_empty() { upper } else { lower },
                })?
                .into()),
        }
    }

    /// Instantiates the variable and records the instantiation as an equal
    /// bound.
    fn resolve(&mut self, variable: VariableID, cyclic: bool) -> Result<(), Error> {
        let (structure, seeded) = self.resolve_structure(variable)?;

        let qualifiers = self
            .environment
            .registry()
            .ids()
            .map(|x| self.resolve_qualifier(variable, x))
            .collect::<Result<Qualifiers, _>>()?;

        let instantiation = structure
            .with_qualifiers_overridden(&qualifiers, self.environment.registry());
        let low_confidence = cyclic && !seeded;

        log::debug!(
            "{}: {variable:?} := {}{}",
            self.id(),
            self.environment.display(&instantiation),
            if low_confidence { " (low confidence)" } else { "" }
        );

        let target = self.variables.get_mut(variable)?;
        if !target.instantiate(instantiation.clone(), low_confidence) {
            return Ok(());
        }

        if target.add_bound(
            BoundKind::Equal,
            instantiation.clone(),
            Origin::Resolution,
        ) {
            self.push(Work::Bound {
                variable,
                kind: BoundKind::Equal,
                term: instantiation,
                origin: Origin::Resolution,
            });
        }

        for qualifier in qualifiers.iter() {
            self.qualifier_bound(
                variable,
                qualifier.hierarchy,
                BoundKind::Equal,
                QualifierTerm::Known(qualifier.element),
                Origin::Resolution,
            )?;
        }

        Ok(())
    }
}
