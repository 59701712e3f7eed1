use crate::Config;

#[test]
fn missing_keys_take_defaults() {
    let config = Config::from_toml("lub_depth = 4").unwrap();

    assert_eq!(config, Config { lub_depth: 4, ..Config::default() });
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(Config::from_toml("max_depth = 4").is_err());
}

#[test]
fn rendered_config_parses_back() {
    let config = Config { max_steps: 12, lub_depth: 0, throws_fallback: false };

    let source = config.to_toml().unwrap();

    assert_eq!(Config::from_toml(&source).unwrap(), config);
}

#[test]
fn step_limit_counts_work_items() {
    let config = Config::from_toml("max_steps = 3").unwrap();

    assert_eq!(config.max_steps, 3);
    assert!(Config::from_toml("max_rounds = 3").is_err());
}
