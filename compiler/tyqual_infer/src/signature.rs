//! Contains [`infer`], inferring the type arguments of one call of a generic
//! operation.

use std::collections::{BTreeMap, BTreeSet};

use tyqual_qualifier::Registry;
use tyqual_term::{
    r#type::Type,
    table::TypeParameterID,
    variable::{Use, VariableID},
    visitor,
};
use tyqual_type_system::Environment;

use crate::{
    config::Config,
    constraint::{Constraint, Origin},
    error::{Error, InvariantViolation},
    session::Session,
};

/// The signature of a generic operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_new::new)]
pub struct Signature {
    /// The type parameters to infer.
    pub type_parameters: Vec<TypeParameterID>,

    /// The formal parameter types.
    pub parameters: Vec<Type>,

    /// The return type.
    pub return_type: Type,

    /// The types of the throws clause.
    pub throws: Vec<Type>,
}

/// The call site of a generic operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_new::new)]
pub struct Call {
    /// The types of the argument expressions, one per formal parameter.
    pub arguments: Vec<Type>,

    /// The type the call's result flows into, if any.
    pub target: Option<Type>,
}

/// The inferred type arguments of a call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solution {
    /// The instantiation of every type parameter of the signature.
    pub instantiations: BTreeMap<TypeParameterID, Type>,

    /// The type parameters whose instantiation was defaulted inside a
    /// dependency cycle without any proper bound.
    pub low_confidence: BTreeSet<TypeParameterID>,
}

/// Replaces the occurrences of the inferred type parameters by uses of their
/// variables.
fn with_variables(
    ty: &Type,
    variables: &BTreeMap<TypeParameterID, VariableID>,
    registry: &Registry,
) -> Type {
    visitor::transform(ty, &mut |ty: &Type| {
        let parameter = ty.as_parameter()?;
        let variable = variables.get(&parameter.id)?;

        Some(Type::Inference(Use::from_occurrence(parameter, *variable, registry)))
    })
}

/// Infers the type arguments of the call.
///
/// # Errors
///
/// - [`Error::Invariant`] if the call doesn't supply one argument per formal
///   parameter.
/// - See [`Session::step`] for the other errors.
pub fn infer(
    environment: &Environment,
    config: Config,
    signature: &Signature,
    call: &Call,
) -> Result<Solution, Error> {
    if signature.parameters.len() != call.arguments.len() {
        return Err(InvariantViolation::ArgumentCount {
            expected: signature.parameters.len(),
            found: call.arguments.len(),
        }
        .into());
    }

    let registry = environment.registry();
    let mut session = Session::new(environment, config);
    let variables = signature
        .type_parameters
        .iter()
        .map(|&x| (x, session.fresh_variable(x)))
        .collect::<BTreeMap<_, _>>();

    log::debug!(
        "{}: inferring {} type parameter(s) of a call with {} argument(s)",
        session.id(),
        variables.len(),
        call.arguments.len()
    );

    for (index, (argument, parameter)) in
        call.arguments.iter().zip(&signature.parameters).enumerate()
    {
        session.add_constraint(Constraint::subtype(
            argument.clone(),
            with_variables(parameter, &variables, registry),
            Origin::Argument(index),
        ))?;
    }

    if let Some(target) = &call.target {
        session.add_constraint(Constraint::subtype(
            with_variables(&signature.return_type, &variables, registry),
            target.clone(),
            Origin::Target,
        ))?;
    }

    for (&parameter, &variable) in &variables {
        for bound in environment.declared_bounds(parameter) {
            if environment.is_object(&bound) {
                continue;
            }

            session.add_constraint(Constraint::subtype(
                Type::Inference(Use::unqualified(variable)),
                with_variables(&bound, &variables, registry),
                Origin::DeclaredBound(parameter),
            ))?;
        }
    }

    let throwable = environment.table().well_known().throwable();
    for thrown in &signature.throws {
        let thrown = with_variables(thrown, &variables, registry);
        let Type::Inference(use_of) = &thrown else {
            continue;
        };

        session.set_throws(use_of.variable())?;

        if let Some(throwable) = throwable {
            session.add_constraint(Constraint::subtype(
                thrown.clone(),
                Type::class(throwable, []),
                Origin::Throws,
            ))?;
        }
    }

    session.solve()?;

    let mut solution = Solution::default();
    for (parameter, variable) in variables {
        let variable = session.variable(variable)?;

        if let Some(instantiation) = variable.instantiation() {
            solution.instantiations.insert(parameter, instantiation.clone());
        }

        if variable.low_confidence() {
            solution.low_confidence.insert(parameter);
        }
    }

    Ok(solution)
}

#[cfg(test)]
mod test;
