use tyqual_term::r#type::Type;

use crate::{
    error::{Error, InvariantViolation},
    infer,
    test::{init_logger, Fixture},
    Call, Config, Signature,
};

/// The return type of signatures whose result is never used.
fn unit(fixture: &Fixture) -> Type { fixture.environment.table().object_type() }

#[test]
fn argument_seeds_the_parameter() {
    init_logger();
    let fixture = Fixture::new();
    let t = Type::parameter(fixture.t);

    // <T> List<T> singleton(T)
    let signature = Signature::new(
        vec![fixture.t],
        vec![t.clone()],
        fixture.generic(fixture.list, t),
        Vec::new(),
    );
    let call = Call::new(vec![fixture.ty(fixture.integer)], None);

    let solution =
        infer(&fixture.environment, Config::default(), &signature, &call)
            .unwrap();

    assert_eq!(
        solution.instantiations[&fixture.t],
        fixture.defaulted(fixture.ty(fixture.integer))
    );
    assert!(solution.low_confidence.is_empty());
}

#[test]
fn target_type_seeds_the_parameter() {
    init_logger();
    let fixture = Fixture::new();

    // <T> List<T> empty()
    let signature = Signature::new(
        vec![fixture.t],
        Vec::new(),
        fixture.generic(fixture.list, Type::parameter(fixture.t)),
        Vec::new(),
    );
    let call = Call::new(
        Vec::new(),
        Some(fixture.generic(fixture.list, fixture.ty(fixture.string))),
    );

    let solution =
        infer(&fixture.environment, Config::default(), &signature, &call)
            .unwrap();

    assert_eq!(
        solution.instantiations[&fixture.t],
        fixture.defaulted(fixture.ty(fixture.string))
    );
}

#[test]
fn declared_bound_is_an_upper_bound() {
    init_logger();
    let fixture = Fixture::new();

    // <N extends Number> void make()
    let signature =
        Signature::new(vec![fixture.n], Vec::new(), unit(&fixture), Vec::new());

    let solution = infer(
        &fixture.environment,
        Config::default(),
        &signature,
        &Call::new(Vec::new(), None),
    )
    .unwrap();

    assert_eq!(
        solution.instantiations[&fixture.n],
        fixture.defaulted(fixture.ty(fixture.number))
    );
}

#[test]
fn argument_outside_the_declared_bound_is_unsatisfiable() {
    init_logger();
    let fixture = Fixture::new();
    let n = Type::parameter(fixture.n);

    // <N extends Number> void take(N)
    let signature =
        Signature::new(vec![fixture.n], vec![n], unit(&fixture), Vec::new());
    let call = Call::new(vec![fixture.ty(fixture.string)], None);

    let Err(Error::Unsatisfiable(error)) =
        infer(&fixture.environment, Config::default(), &signature, &call)
    else {
        panic!("String is not a Number");
    };

    assert!(error.parameters.contains(&fixture.n));
}

#[test]
fn thrown_parameter_falls_back_to_unchecked_exceptions() {
    init_logger();
    let fixture = Fixture::new();

    // <X extends Throwable> void run() throws X
    let signature = Signature::new(
        vec![fixture.x],
        Vec::new(),
        unit(&fixture),
        vec![Type::parameter(fixture.x)],
    );
    let call = Call::new(Vec::new(), None);

    let solution =
        infer(&fixture.environment, Config::default(), &signature, &call)
            .unwrap();
    assert_eq!(
        solution.instantiations[&fixture.x],
        fixture.defaulted(fixture.ty(fixture.runtime_exception))
    );

    let config = Config { throws_fallback: false, ..Config::default() };
    let solution =
        infer(&fixture.environment, config, &signature, &call).unwrap();
    assert_eq!(
        solution.instantiations[&fixture.x],
        fixture.defaulted(fixture.ty(fixture.throwable))
    );
}

#[test]
fn wildcard_argument_is_captured() {
    init_logger();
    let fixture = Fixture::new();
    let t = Type::parameter(fixture.t);

    // <T> T head(List<T>)
    let signature = Signature::new(
        vec![fixture.t],
        vec![fixture.generic(fixture.list, t.clone())],
        t,
        Vec::new(),
    );
    let call = Call::new(
        vec![fixture.extends(fixture.list, fixture.ty(fixture.integer))],
        None,
    );

    let solution =
        infer(&fixture.environment, Config::default(), &signature, &call)
            .unwrap();

    assert_eq!(solution.instantiations.len(), 1);
    assert_eq!(
        solution.instantiations[&fixture.t],
        fixture.defaulted(fixture.ty(fixture.integer))
    );
    assert!(solution.low_confidence.is_empty());
}

#[test]
fn explicit_parameter_qualifier_stays_local() {
    init_logger();
    let fixture = Fixture::new();
    let t = Type::parameter(fixture.t);

    // <T> T choose(@NonNull T, T)
    let signature = Signature::new(
        vec![fixture.t],
        vec![fixture.qualified(t.clone(), fixture.non_null), t.clone()],
        t,
        Vec::new(),
    );
    let string = fixture.ty(fixture.string);
    let call = Call::new(
        vec![
            fixture.qualified(string.clone(), fixture.nullable),
            fixture.qualified(string.clone(), fixture.non_null),
        ],
        None,
    );

    let solution =
        infer(&fixture.environment, Config::default(), &signature, &call)
            .unwrap();

    assert_eq!(
        solution.instantiations[&fixture.t],
        fixture.defaulted(fixture.qualified(string, fixture.non_null))
    );
}

#[test]
fn target_qualifier_reaches_the_parameter() {
    init_logger();
    let fixture = Fixture::new();
    let t = Type::parameter(fixture.t);

    // <T> T id(T) used as `@Nullable Foo x = id(foo)`
    let signature = Signature::new(vec![fixture.t], vec![t.clone()], t, Vec::new());
    let foo = fixture.ty(fixture.foo);
    let call = Call::new(
        vec![fixture.qualified(foo.clone(), fixture.non_null)],
        Some(fixture.qualified(foo.clone(), fixture.nullable)),
    );

    let solution =
        infer(&fixture.environment, Config::default(), &signature, &call)
            .unwrap();

    assert_eq!(
        solution.instantiations[&fixture.t],
        fixture.defaulted(fixture.qualified(foo, fixture.non_null))
    );
}

#[test]
fn argument_count_must_match() {
    let fixture = Fixture::new();
    let t = Type::parameter(fixture.t);
    let signature = Signature::new(vec![fixture.t], vec![t.clone()], t, Vec::new());

    assert_eq!(
        infer(
            &fixture.environment,
            Config::default(),
            &signature,
            &Call::new(Vec::new(), None),
        ),
        Err(Error::Invariant(InvariantViolation::ArgumentCount {
            expected: 1,
            found: 0
        }))
    );
}
