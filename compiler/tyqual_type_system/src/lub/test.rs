use proptest::prelude::*;
use tyqual_term::r#type::{Argument, Type, Wildcard};

use crate::test::Fixture;

#[test]
fn lub_of_related_classes_is_the_supertype() {
    let fixture = Fixture::new();
    let integer = fixture.ty(fixture.integer);
    let number = fixture.ty(fixture.number);

    assert_eq!(
        fixture.environment.lub(&[integer.clone(), number.clone()], 2),
        Ok(number)
    );
    assert_eq!(fixture.environment.lub(&[integer.clone()], 2), Ok(integer));
}

#[test]
fn lub_drops_outermost_qualifiers() {
    let fixture = Fixture::new();
    let string = fixture.ty(fixture.string);

    assert_eq!(
        fixture.environment.lub(
            &[
                fixture.qualified(string.clone(), fixture.nullable),
                fixture.qualified(string.clone(), fixture.non_null),
            ],
            2
        ),
        Ok(string)
    );
}

#[test]
fn lub_generalizes_differing_arguments() {
    let fixture = Fixture::new();
    let integer = fixture.ty(fixture.integer);
    let string = fixture.ty(fixture.string);

    // Comparable<Integer> and Comparable<String>
    let lub = fixture.environment.lub(&[integer, string], 1).unwrap();

    assert_eq!(
        lub,
        fixture.generic(fixture.comparable, fixture.extends(Type::class(
            fixture.comparable,
            [Argument::Wildcard(Wildcard::Unbounded)]
        )))
    );
}

#[test]
fn lub_stops_at_depth() {
    let fixture = Fixture::new();
    let integer = fixture.ty(fixture.integer);
    let string = fixture.ty(fixture.string);

    assert_eq!(
        fixture.environment.lub(&[integer, string], 0),
        Ok(fixture
            .generic(fixture.comparable, Argument::Wildcard(Wildcard::Unbounded)))
    );
}

#[test]
fn lub_of_arrays_is_an_array() {
    let fixture = Fixture::new();

    assert_eq!(
        fixture.environment.lub(
            &[
                Type::array(fixture.ty(fixture.integer)),
                Type::array(fixture.ty(fixture.number)),
            ],
            2
        ),
        Ok(Type::array(fixture.ty(fixture.number)))
    );
    assert_eq!(
        fixture.environment.lub(
            &[Type::array(fixture.ty(fixture.integer)), fixture.ty(fixture.number)],
            2
        ),
        Ok(fixture.environment.table().object_type())
    );
}

#[test]
fn multiple_minimal_candidates_are_ambiguous() {
    let fixture = Fixture::new();

    let error = fixture
        .environment
        .lub(&[fixture.ty(fixture.first), fixture.ty(fixture.second)], 2)
        .unwrap_err();

    assert_eq!(error.candidates, vec![
        fixture.ty(fixture.left),
        fixture.ty(fixture.right)
    ]);
}

#[test]
fn glb_picks_the_common_subtype() {
    let fixture = Fixture::new();
    let integer = fixture.ty(fixture.integer);
    let number = fixture.ty(fixture.number);
    let object = fixture.environment.table().object_type();

    assert_eq!(
        fixture.environment.glb(&[object, number, integer.clone()]),
        Ok(integer)
    );
    assert!(fixture
        .environment
        .glb(&[fixture.ty(fixture.string), fixture.ty(fixture.number)])
        .is_err());
}

proptest! {
    #[test]
    fn lub_is_an_upper_bound(
        selection in proptest::collection::vec(0..5_usize, 1..5)
    ) {
        let fixture = Fixture::new();
        let pool = [
            fixture.ty(fixture.integer),
            fixture.ty(fixture.number),
            fixture.ty(fixture.string),
            fixture.environment.table().object_type(),
            fixture.generic(
                fixture.comparable,
                Argument::Type(fixture.ty(fixture.string)),
            ),
        ];
        let types = selection.iter().map(|x| pool[*x].clone()).collect::<Vec<_>>();

        let lub = fixture.environment.lub(&types, 2).unwrap();

        for ty in &types {
            prop_assert!(fixture.environment.is_subtype(ty, &lub, false));
        }
    }
}
