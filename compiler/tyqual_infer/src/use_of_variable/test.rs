use proptest::prelude::*;
use tyqual_qualifier::Qualifiers;
use tyqual_term::{
    r#type::Type,
    variable::{SessionID, Use},
};

use crate::{
    constraint::{Origin, QualifierTerm},
    test::Fixture,
    use_of_variable::UseOfVariable,
    variable::{BoundKind, VariableKind, Variables},
};

struct Uses {
    fixture: Fixture,
    variables: Variables,
    plain: Use,
    explicit: Use,
}

/// One variable used once without annotation and once as `@NonNull T`.
fn uses() -> Uses {
    let fixture = Fixture::new();
    let mut variables = Variables::new(SessionID::fresh());
    let alpha = variables.insert(VariableKind::Parameter(fixture.t));

    let plain = Use::unqualified(alpha);
    let explicit = Use::new(
        alpha,
        std::iter::once(fixture.non_null).collect(),
        fixture.environment.registry(),
    );

    Uses { fixture, variables, plain, explicit }
}

impl Uses {
    fn add(
        &mut self,
        use_of: &Use,
        kind: BoundKind,
        bound: &Type,
    ) -> Vec<(BoundKind, Type)> {
        use_of
            .add_bound(
                &mut self.variables,
                self.fixture.environment.registry(),
                Origin::Explicit,
                kind,
                bound,
            )
            .unwrap()
    }

    fn foo(&self) -> Type {
        let fixture = &self.fixture;
        fixture.qualified(fixture.ty(fixture.foo), fixture.non_null)
    }
}

#[test]
fn unannotated_use_records_the_bound_unchanged() {
    let mut uses = uses();
    let foo = uses.foo();
    let plain = uses.plain.clone();

    assert_eq!(uses.add(&plain, BoundKind::Lower, &foo), vec![(
        BoundKind::Lower,
        foo.clone()
    )]);
    assert_eq!(uses.add(&plain, BoundKind::Lower, &foo), Vec::new());
}

#[test]
fn lower_bound_gets_the_top() {
    let mut uses = uses();
    let foo = uses.foo();
    let explicit = uses.explicit.clone();
    let expected = uses.fixture.qualified(foo.clone(), uses.fixture.nullable);

    assert_eq!(uses.add(&explicit, BoundKind::Lower, &foo), vec![(
        BoundKind::Lower,
        expected
    )]);
}

#[test]
fn upper_bound_gets_the_bottom() {
    let mut uses = uses();
    let fixture = &uses.fixture;
    let foo = fixture.qualified(fixture.ty(fixture.foo), fixture.nullable);
    let expected = fixture.qualified(foo.clone(), fixture.non_null);
    let explicit = uses.explicit.clone();

    assert_eq!(uses.add(&explicit, BoundKind::Upper, &foo), vec![(
        BoundKind::Upper,
        expected
    )]);
}

#[test]
fn equal_bound_is_recorded_in_both_directions() {
    let mut uses = uses();
    let foo = uses.foo();
    let explicit = uses.explicit.clone();
    let top = uses.fixture.qualified(foo.clone(), uses.fixture.nullable);
    let bottom = uses.fixture.qualified(foo.clone(), uses.fixture.non_null);

    assert_eq!(uses.add(&explicit, BoundKind::Equal, &foo), vec![
        (BoundKind::Upper, bottom),
        (BoundKind::Lower, top),
    ]);

    let variable = uses.variables.get(explicit.variable()).unwrap();
    assert!(variable.bounds().equal().is_empty());
}

#[test]
fn equal_bound_to_a_variable_is_kept_exact() {
    let mut uses = uses();
    let beta = uses.variables.insert(VariableKind::Parameter(uses.fixture.u));
    let other = Type::Inference(Use::unqualified(beta));
    let explicit = uses.explicit.clone();

    assert_eq!(uses.add(&explicit, BoundKind::Equal, &other), vec![(
        BoundKind::Equal,
        other.clone()
    )]);
}

#[test]
fn explicit_hierarchy_records_no_qualifier_bound() {
    let mut uses = uses();
    let fixture = &uses.fixture;
    let (nullness, crossed) = (fixture.nullness, fixture.crossed);
    let term = QualifierTerm::Known(fixture.nullable.element);
    let low = QualifierTerm::Known(fixture.low1.element);
    let explicit = uses.explicit.clone();

    let recorded = |uses: &mut Uses, hierarchy, term| {
        explicit
            .add_qualifier_bound(
                &mut uses.variables,
                hierarchy,
                BoundKind::Lower,
                term,
                Origin::Explicit,
            )
            .unwrap()
    };

    assert!(!recorded(&mut uses, nullness, term));
    assert!(recorded(&mut uses, crossed, low));

    let variable = uses.variables.get(explicit.variable()).unwrap();
    assert!(variable.qualifier_bounds_in(nullness).is_none());
    assert_eq!(variable.qualifier_bounds_in(crossed).unwrap().len(), 1);
}

proptest! {
    #[test]
    fn explicit_bounds_never_change_other_uses(
        bounds in proptest::collection::vec(
            (0..3usize, 0..2usize, any::<bool>()),
            0..12,
        )
    ) {
        let mut uses = uses();
        let explicit = uses.explicit.clone();
        let plain_qualifiers = uses.plain.qualifiers().clone();
        let explicit_qualifiers = explicit.qualifiers().clone();

        for (kind, class, nullable) in bounds {
            let fixture = &uses.fixture;
            let kind = [BoundKind::Upper, BoundKind::Lower, BoundKind::Equal][kind];
            let class = [fixture.foo, fixture.string][class];
            let qualifier =
                if nullable { fixture.nullable } else { fixture.non_null };
            let bound = fixture.qualified(fixture.ty(class), qualifier);

            uses.add(&explicit, kind, &bound);
            let _ = explicit.add_qualifier_bound(
                &mut uses.variables,
                uses.fixture.nullness,
                kind,
                QualifierTerm::Known(qualifier.element),
                Origin::Explicit,
            );
        }

        prop_assert_eq!(uses.plain.qualifiers(), &plain_qualifiers);
        prop_assert_eq!(uses.plain.qualifiers(), &Qualifiers::new());
        prop_assert_eq!(explicit.qualifiers(), &explicit_qualifiers);

        let variable = uses.variables.get(explicit.variable()).unwrap();
        prop_assert!(variable.qualifier_bounds_in(uses.fixture.nullness).is_none());
    }
}
