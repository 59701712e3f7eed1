use tyqual_qualifier::{FiniteHierarchy, Qualifier, Registry};
use tyqual_term::{
    r#type::{self, Argument, Type, Wildcard},
    table::Table,
    variable::{SessionID, Use, VariableID},
};

use crate::{test::Fixture, Environment};

#[test]
fn classes_follow_declared_supertypes() {
    let fixture = Fixture::new();
    let environment = &fixture.environment;
    let integer = fixture.ty(fixture.integer);
    let number = fixture.ty(fixture.number);
    let string = fixture.ty(fixture.string);
    let object = environment.table().object_type();

    assert!(environment.is_subtype(&integer, &number, false));
    assert!(environment.is_subtype(&integer, &object, false));
    assert!(!environment.is_subtype(&number, &integer, false));
    assert!(!environment.is_subtype(&string, &number, false));
    assert!(environment.is_subtype(
        &integer,
        &fixture.generic(fixture.comparable, Argument::Type(integer.clone())),
        false
    ));
    assert!(!environment.is_subtype(
        &string,
        &fixture.generic(fixture.comparable, Argument::Type(integer)),
        false
    ));
}

#[test]
fn type_arguments_are_invariant_unless_wildcard() {
    let fixture = Fixture::new();
    let environment = &fixture.environment;
    let integer = fixture.ty(fixture.integer);
    let number = fixture.ty(fixture.number);

    let array_list_of_integer =
        fixture.generic(fixture.array_list, Argument::Type(integer.clone()));
    let list_of_integer = fixture.generic(fixture.list, Argument::Type(integer));
    let list_of_number = fixture.generic(fixture.list, Argument::Type(number.clone()));
    let list_of_extends_number =
        fixture.generic(fixture.list, fixture.extends(number.clone()));
    let list_of_super_number = fixture.generic(
        fixture.list,
        Argument::Wildcard(Wildcard::Super(Box::new(number))),
    );

    assert!(environment.is_subtype(&array_list_of_integer, &list_of_integer, false));
    assert!(!environment.is_subtype(&array_list_of_integer, &list_of_number, false));
    assert!(environment.is_subtype(
        &array_list_of_integer,
        &list_of_extends_number,
        false
    ));
    assert!(!environment.is_subtype(
        &array_list_of_integer,
        &list_of_super_number,
        false
    ));
    assert!(environment.is_subtype(&list_of_number, &list_of_super_number, false));
}

#[test]
fn arrays_are_covariant() {
    let fixture = Fixture::new();
    let environment = &fixture.environment;
    let integers = Type::array(fixture.ty(fixture.integer));
    let numbers = Type::array(fixture.ty(fixture.number));

    assert!(environment.is_subtype(&integers, &numbers, false));
    assert!(!environment.is_subtype(&numbers, &integers, false));
    assert!(environment.is_subtype(
        &integers,
        &environment.table().object_type(),
        false
    ));
    assert!(!environment.is_subtype(&integers, &fixture.ty(fixture.number), false));
}

#[test]
fn parameters_are_bounded_by_declaration() {
    let fixture = Fixture::new();
    let environment = &fixture.environment;
    let parameter = Type::parameter(fixture.bounded);

    assert!(environment.is_subtype(&parameter, &fixture.ty(fixture.number), false));
    assert!(environment.is_subtype(&parameter, &parameter, false));
    assert!(!environment.is_subtype(&fixture.ty(fixture.integer), &parameter, false));
}

#[test]
fn qualifiers_are_checked_when_qualified() {
    let fixture = Fixture::new();
    let environment = &fixture.environment;
    let nullable_integer =
        fixture.qualified(fixture.ty(fixture.integer), fixture.nullable);
    let non_null_number = fixture.qualified(fixture.ty(fixture.number), fixture.non_null);

    assert!(!environment.is_subtype(&nullable_integer, &non_null_number, true));
    assert!(environment.is_subtype(&nullable_integer, &non_null_number, false));
    assert!(environment.is_subtype(
        &fixture.qualified(fixture.ty(fixture.integer), fixture.non_null),
        &fixture.qualified(fixture.ty(fixture.number), fixture.nullable),
        true
    ));
}

#[test]
fn as_super_substitutes_arguments() {
    let fixture = Fixture::new();
    let string = fixture.ty(fixture.string);
    let array_list = fixture
        .generic(fixture.array_list, Argument::Type(string.clone()))
        .into_class()
        .unwrap();

    assert_eq!(
        fixture.environment.as_super(&array_list, fixture.list),
        Some(vec![Argument::Type(string)])
    );
    assert_eq!(fixture.environment.as_super(&array_list, fixture.number), None);

    let raw = Type::class(fixture.array_list, []).into_class().unwrap();
    assert_eq!(fixture.environment.as_super(&raw, fixture.list), Some(Vec::new()));
}

#[test]
fn wildcards_propagate_through_as_super() {
    let fixture = Fixture::new();
    let argument = fixture.extends(fixture.ty(fixture.number));
    let array_list = fixture
        .generic(fixture.array_list, argument.clone())
        .into_class()
        .unwrap();

    assert_eq!(
        fixture.environment.as_super(&array_list, fixture.list),
        Some(vec![argument])
    );
}

#[test]
fn supertype_occurrence_qualifiers_reach_variable_uses() {
    let mut registry = Registry::new();
    let mut nullness = FiniteHierarchy::builder("nullness");
    let nullable = nullness.element("Nullable");
    let non_null = nullness.element("NonNull");
    nullness.subtype(non_null, nullable).default_qualifier(non_null);
    let nullness = registry.register(nullness.build().unwrap());
    let nullable = Qualifier::new(nullness, nullable);

    let mut table = Table::new();
    let b = table.add_type_parameter("B", Vec::new());
    let bar = table.add_class("Bar", vec![b], Vec::new()).unwrap();
    let t = table.add_type_parameter("T", Vec::new());
    let foo = table
        .add_class("Foo", vec![t], vec![r#type::Class::new(bar, vec![
            Argument::Type(Type::parameter(t).with_qualifier(nullable, &registry)),
        ])])
        .unwrap();
    let environment = Environment::new(table, registry);

    let alpha = VariableID::new(SessionID::fresh(), 0);
    let foo_of_alpha = r#type::Class::new(foo, vec![Argument::Type(
        Type::Inference(Use::unqualified(alpha)),
    )]);

    let arguments = environment.as_super(&foo_of_alpha, bar).unwrap();
    let [Argument::Type(Type::Inference(use_of))] = arguments.as_slice() else {
        panic!("expected a single use argument, got {arguments:?}");
    };

    assert_eq!(use_of.variable(), alpha);
    assert!(use_of.is_explicit_in(nullness));
    assert_eq!(use_of.qualifiers().get(nullness), Some(nullable.element));
}
