//! Contains the definition of [`Session`].

use std::collections::{BTreeMap, VecDeque};

use tyqual_qualifier::Qualifiers;
use tyqual_term::{
    r#type::Type,
    table::{ClassID, TypeParameterID},
    variable::{SessionID, Use, VariableID},
};
use tyqual_type_system::Environment;

use crate::{
    config::Config,
    constraint::Constraint,
    error::{Conflict, InvariantViolation, UnsatisfiableError},
    incorporation::{State, Work},
    variable::{Variable, VariableKind, Variables},
};

/// The inference of one call site.
///
/// A session owns its variables; nothing it holds is shared with other
/// sessions, so independent sessions may run on different threads while
/// sharing one read-only [`Environment`]. A session can be abandoned between
/// any two [`step`](Self::step) calls.
#[derive(Debug)]
pub struct Session<'a> {
    pub(crate) environment: &'a Environment,
    pub(crate) config: Config,
    pub(crate) variables: Variables,
    pub(crate) work: VecDeque<Work>,
    pub(crate) state: State,
    pub(crate) processed: usize,
    pub(crate) unattached: Vec<Conflict>,
}

impl<'a> Session<'a> {
    /// Creates a new session without variables.
    #[must_use]
    pub fn new(environment: &'a Environment, config: Config) -> Self {
        Self {
            environment,
            config,
            variables: Variables::new(SessionID::fresh()),
            work: VecDeque::new(),
            state: State::Closed,
            processed: 0,
            unattached: Vec::new(),
        }
    }

    /// The unique id of the session.
    #[must_use]
    pub fn id(&self) -> SessionID { self.variables.session() }

    /// The environment the session infers in.
    #[must_use]
    pub const fn environment(&self) -> &'a Environment { self.environment }

    /// The configuration of the session.
    #[must_use]
    pub const fn config(&self) -> &Config { &self.config }

    /// The current closure state of the bound sets.
    #[must_use]
    pub const fn state(&self) -> State { self.state }

    /// The variables of the session.
    #[must_use]
    pub const fn variables(&self) -> &Variables { &self.variables }

    /// Creates a fresh variable standing for the declared type parameter.
    pub fn fresh_variable(&mut self, parameter: TypeParameterID) -> VariableID {
        let variable = self.variables.insert(VariableKind::Parameter(parameter));
        log::trace!("{}: fresh variable {variable:?}", self.id());

        variable
    }

    pub(crate) fn fresh_capture(
        &mut self,
        class: ClassID,
        index: usize,
    ) -> VariableID {
        let variable =
            self.variables.insert(VariableKind::Capture { class, index });
        log::trace!("{}: capture variable {variable:?}", self.id());

        variable
    }

    /// Creates a use of the variable carrying the given explicit qualifiers.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] if the variable is not of this session
    /// or a qualifier belongs to a hierarchy the environment doesn't know.
    pub fn use_of(
        &self,
        variable: VariableID,
        explicit: Qualifiers,
    ) -> Result<Use, InvariantViolation> {
        self.variables.check(variable)?;
        self.environment.registry().check(explicit.hierarchies())?;

        Ok(Use::new(variable, explicit, self.environment.registry()))
    }

    /// Gets the variable.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] if the variable is not of this session.
    pub fn variable(
        &self,
        variable: VariableID,
    ) -> Result<&Variable, InvariantViolation> {
        self.variables.get(variable)
    }

    /// Submits a constraint. It is reduced when the session closes its bound
    /// sets.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] if the constraint mentions a variable
    /// that is not of this session or a qualifier hierarchy the environment
    /// doesn't know.
    pub fn add_constraint(
        &mut self,
        constraint: Constraint,
    ) -> Result<(), InvariantViolation> {
        for variable in constraint.relation.inference_variables() {
            self.variables.check(variable)?;
        }

        self.environment
            .registry()
            .check(constraint.relation.hierarchies())?;

        self.push(Work::Constraint(constraint));
        Ok(())
    }

    /// Marks the variable as used in a throws clause.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] if the variable is not of this session.
    pub fn set_throws(
        &mut self,
        variable: VariableID,
    ) -> Result<(), InvariantViolation> {
        self.variables.get_mut(variable)?.set_throws();
        Ok(())
    }

    /// The instantiations of every resolved variable.
    #[must_use]
    pub fn instantiations(&self) -> BTreeMap<VariableID, Type> {
        self.variables
            .iter()
            .filter_map(|x| Some((x.id(), x.instantiation().clone()?)))
            .collect()
    }

    /// The conflicts between proper types that concern no variable.
    #[must_use]
    pub fn unattached_conflicts(&self) -> &[Conflict] { &self.unattached }

    pub(crate) fn push(&mut self, work: Work) {
        self.work.push_back(work);
        self.state = State::Unclosed;
    }

    /// Attaches the conflict to the subject variable, or to the session when
    /// there is none.
    pub(crate) fn conflict(
        &mut self,
        subject: Option<VariableID>,
        conflict: Conflict,
    ) -> Result<(), InvariantViolation> {
        log::debug!("{}: conflict for {subject:?}: {conflict:?}", self.id());

        match subject {
            Some(variable) => self.variables.get_mut(variable)?.add_conflict(conflict),
            None => {
                if !self.unattached.contains(&conflict) {
                    self.unattached.push(conflict);
                }
            }
        }

        Ok(())
    }

    /// Collects every conflict recorded so far.
    pub(crate) fn unsatisfiable(&self) -> Option<UnsatisfiableError> {
        let variables = self
            .variables
            .iter()
            .filter(|x| !x.conflicts().is_empty())
            .map(|x| (x.id(), x.conflicts().clone()))
            .collect::<BTreeMap<_, _>>();

        if variables.is_empty() && self.unattached.is_empty() {
            return None;
        }

        Some(UnsatisfiableError {
            parameters: self
                .variables
                .iter()
                .filter(|x| variables.contains_key(&x.id()))
                .filter_map(Variable::parameter)
                .collect(),
            variables,
            unattached: self.unattached.clone(),
        })
    }
}
