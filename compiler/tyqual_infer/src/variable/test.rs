use tyqual_arena::ID;
use tyqual_qualifier::{Element, HierarchyID};
use tyqual_term::{
    r#type::Type,
    variable::{SessionID, Use, VariableID},
};

use crate::{
    constraint::{Origin, QualifierTerm},
    error::InvariantViolation,
    variable::{BoundKind, BoundSet, VariableKind, Variables},
};

fn variables() -> (Variables, VariableID, VariableID) {
    let mut variables = Variables::new(SessionID::fresh());
    let alpha = variables.insert(VariableKind::Parameter(ID::new(0)));
    let beta = variables.insert(VariableKind::Parameter(ID::new(1)));

    (variables, alpha, beta)
}

#[test]
fn bounds_are_recorded_once() {
    let mut bounds = BoundSet::default();

    assert!(bounds.insert(BoundKind::Upper, 1, Origin::Argument(0)));
    assert!(!bounds.insert(BoundKind::Upper, 1, Origin::Target));
    assert!(bounds.insert(BoundKind::Lower, 1, Origin::Target));

    assert_eq!(bounds.len(), 2);
    assert_eq!(bounds.upper().get(&1), Some(&Origin::Argument(0)));
    assert!(bounds.contains(BoundKind::Lower, &1));
    assert!(!bounds.contains(BoundKind::Equal, &1));
}

#[test]
fn bounds_iterate_by_kind() {
    let mut bounds = BoundSet::default();
    bounds.insert(BoundKind::Equal, 3, Origin::Explicit);
    bounds.insert(BoundKind::Lower, 2, Origin::Explicit);
    bounds.insert(BoundKind::Upper, 5, Origin::Explicit);
    bounds.insert(BoundKind::Upper, 1, Origin::Explicit);

    let order = bounds.iter().map(|(kind, x, _)| (kind, *x)).collect::<Vec<_>>();

    assert_eq!(order, vec![
        (BoundKind::Upper, 1),
        (BoundKind::Upper, 5),
        (BoundKind::Lower, 2),
        (BoundKind::Equal, 3),
    ]);
}

#[test]
fn growing_set_contains_the_previous_one() {
    let mut bounds = BoundSet::default();
    bounds.insert(BoundKind::Upper, 1, Origin::Explicit);
    let before = bounds.clone();

    bounds.insert(BoundKind::Lower, 2, Origin::Explicit);

    assert!(before.is_subset_of(&bounds));
    assert!(!bounds.is_subset_of(&before));
}

#[test]
fn own_qualifier_is_never_a_bound() {
    let (mut variables, alpha, beta) = variables();
    let hierarchy = HierarchyID::new(0);
    let variable = variables.get_mut(alpha).unwrap();

    assert!(!variable.add_qualifier_bound(
        hierarchy,
        BoundKind::Upper,
        QualifierTerm::Of(alpha),
        Origin::Explicit,
    ));
    assert!(variable.add_qualifier_bound(
        hierarchy,
        BoundKind::Upper,
        QualifierTerm::Of(beta),
        Origin::Explicit,
    ));
    assert!(variable.add_qualifier_bound(
        hierarchy,
        BoundKind::Lower,
        QualifierTerm::Known(Element(0)),
        Origin::Explicit,
    ));

    assert_eq!(variable.qualifier_bounds_in(hierarchy).unwrap().len(), 2);
    assert!(variable.qualifier_bounds_in(HierarchyID::new(1)).is_none());
}

#[test]
fn dependencies_exclude_the_variable_itself() {
    let (mut variables, alpha, beta) = variables();
    let variable = variables.get_mut(alpha).unwrap();

    variable.add_bound(
        BoundKind::Upper,
        Type::Inference(Use::unqualified(alpha)),
        Origin::Explicit,
    );
    assert!(variable.dependencies().is_empty());

    variable.add_bound(
        BoundKind::Lower,
        Type::Inference(Use::unqualified(beta)),
        Origin::Explicit,
    );
    assert_eq!(variable.dependencies().into_iter().collect::<Vec<_>>(), vec![
        beta
    ]);
}

#[test]
fn instantiation_is_set_once() {
    let (mut variables, alpha, _) = variables();
    let variable = variables.get_mut(alpha).unwrap();
    let first = Type::parameter(ID::new(7));
    let second = Type::parameter(ID::new(8));

    assert!(variable.instantiate(first.clone(), false));
    assert!(!variable.instantiate(second, true));

    assert_eq!(variable.instantiation().as_ref(), Some(&first));
    assert!(!variable.low_confidence());
}

#[test]
fn variables_of_other_sessions_are_rejected() {
    let (variables, alpha, _) = variables();
    let (other, foreign, _) = self::variables();

    assert!(variables.check(alpha).is_ok());
    assert!(matches!(
        variables.check(foreign),
        Err(InvariantViolation::ForeignVariable(_))
    ));
    assert_eq!(
        other.get(VariableID::new(other.session(), 5)).err(),
        Some(InvariantViolation::UnknownVariable(VariableID::new(
            other.session(),
            5
        )))
    );
}
