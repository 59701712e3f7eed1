use std::collections::BTreeMap;

use proptest::prelude::*;
use tyqual_qualifier::{FiniteHierarchy, Qualifier, Qualifiers, Registry};

use crate::{
    instantiation::Instantiation,
    r#type::{Argument, Type, Wildcard},
    table::{ClassID, Table},
    variable::{SessionID, Use, VariableID},
};

struct Fixture {
    table: Table,
    registry: Registry,
    list: ClassID,
    string: ClassID,
    nullable: Qualifier,
    non_null: Qualifier,
}

fn fixture() -> Fixture {
    let mut registry = Registry::new();
    let mut nullness = FiniteHierarchy::builder("nullness");
    let nullable = nullness.element("Nullable");
    let non_null = nullness.element("NonNull");
    nullness.subtype(non_null, nullable).default_qualifier(non_null);
    let nullness = registry.register(nullness.build().unwrap());

    let mut table = Table::new();
    let element = table.add_type_parameter("E", Vec::new());
    let list = table.add_class("List", vec![element], Vec::new()).unwrap();
    let string = table.add_class("String", Vec::new(), Vec::new()).unwrap();

    Fixture {
        table,
        registry,
        list,
        string,
        nullable: Qualifier::new(nullness, nullable),
        non_null: Qualifier::new(nullness, non_null),
    }
}

#[test]
fn proper_types() {
    let fixture = fixture();
    let session = SessionID::fresh();
    let alpha = VariableID::new(session, 0);

    let string = Type::class(fixture.string, []);
    let list_of_string =
        Type::class(fixture.list, [Argument::Type(string.clone())]);
    let list_of_alpha = Type::class(fixture.list, [Argument::Type(
        Type::Inference(Use::unqualified(alpha)),
    )]);
    let list_of_extends_alpha = Type::class(fixture.list, [Argument::Wildcard(
        Wildcard::Extends(Box::new(Type::Inference(Use::unqualified(alpha)))),
    )]);

    assert!(string.is_proper());
    assert!(list_of_string.is_proper());
    assert!(Type::array(string).is_proper());
    assert!(!list_of_alpha.is_proper());
    assert!(!list_of_extends_alpha.is_proper());
    assert!(!Type::array(list_of_alpha.clone()).is_proper());
    assert!(list_of_alpha.mentions(alpha));
    assert!(!list_of_alpha.mentions(VariableID::new(session, 1)));
}

#[test]
fn session_ids_are_unique() {
    let first = SessionID::fresh();
    let second = SessionID::fresh();

    assert_ne!(first, second);
    assert_ne!(VariableID::new(first, 0), VariableID::new(second, 0));
}

#[test]
fn explicit_use_records_tops_and_bottoms() {
    let fixture = fixture();
    let alpha = VariableID::new(SessionID::fresh(), 0);

    let use_of = Use::new(
        alpha,
        std::iter::once(fixture.non_null).collect(),
        &fixture.registry,
    );

    assert!(use_of.has_explicit_qualifier());
    assert!(use_of.is_explicit_in(fixture.non_null.hierarchy));
    assert_eq!(
        use_of.tops().get(fixture.nullable.hierarchy),
        Some(fixture.nullable.element)
    );
    assert_eq!(
        use_of.bottoms().get(fixture.non_null.hierarchy),
        Some(fixture.non_null.element)
    );
    assert!(!Use::unqualified(alpha).has_explicit_qualifier());
}

#[test]
fn substitution_keeps_unresolved_uses() {
    let fixture = fixture();
    let session = SessionID::fresh();
    let alpha = VariableID::new(session, 0);
    let beta = VariableID::new(session, 1);

    let ty = Type::class(fixture.list, [Argument::Type(Type::array(
        Type::Inference(Use::unqualified(alpha)),
    ))]);
    let untouched = Type::Inference(Use::unqualified(beta));

    let instantiations = BTreeMap::from([(
        alpha,
        Type::class(fixture.string, [])
            .with_qualifier(fixture.nullable, &fixture.registry),
    )]);

    let substituted = ty.substitute_instantiations(&instantiations);

    assert!(substituted.is_proper());
    assert_eq!(untouched.substitute_instantiations(&instantiations), untouched);
}

#[test]
fn occurrence_qualifiers_override_argument() {
    let fixture = fixture();
    let class = fixture.table.class(fixture.list).unwrap();
    let parameter = class.parameters()[0];

    let argument = Type::class(fixture.string, [])
        .with_qualifier(fixture.nullable, &fixture.registry);
    let instantiation =
        Instantiation::from_arguments(class, &[Argument::Type(argument)])
            .unwrap();

    let occurrence = Type::parameter(parameter)
        .with_qualifier(fixture.non_null, &fixture.registry);
    let instantiated = instantiation.instantiate(&occurrence, &fixture.registry);

    assert_eq!(
        instantiated.qualifiers().get(fixture.non_null.hierarchy),
        Some(fixture.non_null.element)
    );
    assert_eq!(instantiated.without_qualifiers(), Type::class(fixture.string, []));
}

#[test]
fn occurrence_qualifiers_become_explicit_on_a_use() {
    let fixture = fixture();
    let class = fixture.table.class(fixture.list).unwrap();
    let parameter = class.parameters()[0];
    let alpha = VariableID::new(SessionID::fresh(), 0);

    let instantiation = Instantiation::from_arguments(class, &[
        Argument::Type(Type::Inference(Use::unqualified(alpha))),
    ])
    .unwrap();

    let occurrence = Type::parameter(parameter)
        .with_qualifier(fixture.nullable, &fixture.registry);
    let Type::Inference(use_of) =
        instantiation.instantiate(&occurrence, &fixture.registry)
    else {
        panic!("expected a use of the variable");
    };

    assert_eq!(use_of.variable(), alpha);
    assert!(use_of.is_explicit_in(fixture.nullable.hierarchy));
    assert_eq!(
        use_of.qualifiers().get(fixture.nullable.hierarchy),
        Some(fixture.nullable.element)
    );
    assert_eq!(
        use_of.bottoms().get(fixture.nullable.hierarchy),
        Some(fixture.non_null.element)
    );
}

#[test]
fn wildcard_propagates_only_at_argument_position() {
    let fixture = fixture();
    let class = fixture.table.class(fixture.list).unwrap();
    let parameter = class.parameters()[0];
    let string = Type::class(fixture.string, []);

    let instantiation = Instantiation::from_arguments(class, &[
        Argument::Wildcard(Wildcard::Extends(Box::new(string.clone()))),
    ])
    .unwrap();

    let direct = Type::class(fixture.list, [Argument::Type(Type::parameter(
        parameter,
    ))]);
    let nested = Type::array(Type::parameter(parameter));

    assert_eq!(
        instantiation.instantiate(&direct, &fixture.registry),
        Type::class(fixture.list, [Argument::Wildcard(Wildcard::Extends(
            Box::new(string.clone())
        ))])
    );
    assert_eq!(instantiation.instantiate(&nested, &fixture.registry), Type::array(string));
}

#[test]
fn mismatched_argument_count() {
    let fixture = fixture();
    let class = fixture.table.class(fixture.list).unwrap();

    let error = Instantiation::from_arguments(class, &[]).unwrap_err();

    assert_eq!(error.expected, 1);
    assert_eq!(error.found, 0);
}

#[test]
fn duplicated_class_is_rejected() {
    let mut fixture = fixture();

    assert!(fixture.table.add_class("String", Vec::new(), Vec::new()).is_err());
    assert_eq!(fixture.table.find_class("List"), Some(fixture.list));
}

fn arbitrary_type(
    list: ClassID,
    string: ClassID,
    session: SessionID,
) -> impl Strategy<Value = Type> {
    let leaf = prop_oneof![
        Just(Type::class(string, [])),
        (0..4_usize).prop_map(move |x| {
            Type::Inference(Use::unqualified(VariableID::new(session, x)))
        }),
    ];

    leaf.prop_recursive(4, 16, 2, move |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::array),
            inner.clone().prop_map(move |x| Type::class(list, [Argument::Type(x)])),
            inner.prop_map(move |x| Type::class(list, [Argument::Wildcard(
                Wildcard::Super(Box::new(x))
            )])),
        ]
    })
}

proptest! {
    #[test]
    fn substitution_is_idempotent(
        (ty, resolved) in {
            let fixture = fixture();
            let session = SessionID::fresh();
            (
                arbitrary_type(fixture.list, fixture.string, session),
                proptest::collection::btree_set(0..4_usize, 0..4)
                    .prop_map(move |x| (session, x)),
            )
        }
    ) {
        let fixture = fixture();
        let (session, resolved) = resolved;
        let instantiations = resolved
            .into_iter()
            .map(|x| (VariableID::new(session, x), Type::class(fixture.string, [])))
            .collect::<BTreeMap<_, _>>();

        let once = ty.substitute_instantiations(&instantiations);
        let twice = once.substitute_instantiations(&instantiations);

        prop_assert_eq!(&once, &twice);
        prop_assert!(
            once.inference_variables()
                .iter()
                .all(|x| !instantiations.contains_key(x))
        );
    }
}

#[test]
fn qualifiers_override_keeps_other_hierarchies() {
    let fixture = fixture();
    let mut qualifiers = Qualifiers::new();
    qualifiers.insert(fixture.nullable);

    let ty = Type::class(fixture.string, [])
        .with_qualifiers_overridden(&qualifiers, &fixture.registry);

    assert_eq!(ty.qualifiers(), &qualifiers);
    assert!(ty.without_qualifiers().qualifiers().is_empty());
}
