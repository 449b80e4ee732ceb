use declargs::{Cli, FieldSchema, SpecError, StructSchema, TypeExpr, Value};

#[test]
fn missing_values_report_the_arity() {
    let schema = StructSchema::new("Config").field(FieldSchema::new(
        "pair",
        TypeExpr::Tuple(vec![TypeExpr::Int, TypeExpr::Str]),
    ));
    let err = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--pair", "1"])
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert_eq!(
        err.unwrap_stderr(),
        "--pair requires 2 values INT STR, got 1"
    );
}

#[test]
fn sequences_reject_ragged_groups() {
    let schema = StructSchema::new("Config").field(FieldSchema::new(
        "pairs",
        TypeExpr::list(TypeExpr::Tuple(vec![TypeExpr::Int, TypeExpr::Int])),
    ));
    let err = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--pairs", "1", "2", "3"])
        .unwrap_err()
        .unwrap_stderr();
    assert!(err.contains("couldn't parse --pairs"), "{}", err);
}

#[test]
fn help_exits_with_code_zero() {
    let schema =
        StructSchema::new("Config").field(FieldSchema::new("x", TypeExpr::Int).default(Value::Int(0)));
    let err = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--help"])
        .unwrap_err();
    assert_eq!(err.exit_code(), 0);
}

#[test]
fn parse_errors_exit_with_code_two() {
    let schema = StructSchema::new("Config").field(FieldSchema::new("x", TypeExpr::Int));
    let err = Cli::new(schema).prog("prog").run_inner(&[]).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn recursive_schemas_are_rejected() {
    // build a linear chain deeper than the cycle threshold out of one
    // repeated schema name
    fn nest(depth: usize) -> StructSchema {
        let mut schema =
            StructSchema::new("Leaf").field(FieldSchema::new("x", TypeExpr::Int).default(Value::Int(0)));
        for _ in 0..depth {
            schema = StructSchema::new("Nested").field(FieldSchema::new("inner", schema.into_type()));
        }
        schema
    }

    // shallow nesting of a repeated type is fine
    assert!(Cli::new(nest(20)).prog("prog").build_spec().is_ok());

    // past the threshold the repeated type is treated as recursive
    let err = Cli::new(nest(200)).prog("prog").build_spec().unwrap_err();
    assert!(matches!(err, SpecError::NestingTooDeep(_)));
}

#[test]
fn union_defaults_must_match_some_branch() {
    let a = StructSchema::new("A").field(FieldSchema::new("x", TypeExpr::Int).default(Value::Int(0)));
    let b = StructSchema::new("B").field(FieldSchema::new("y", TypeExpr::Int).default(Value::Int(0)));
    let union = TypeExpr::Union(vec![a.into_type(), b.into_type()]);
    let root = StructSchema::new("Root").field(
        FieldSchema::new("cmd", union).default(Value::record("Z", [("q", Value::Int(1))])),
    );

    let err = Cli::new(root).prog("prog").build_spec().unwrap_err();
    assert!(matches!(err, SpecError::UnmatchedSubcommandDefault { .. }));
}

#[test]
fn console_failures_are_returned_not_printed() {
    // run_inner never prints; console_outputs only affects `run`
    let schema = StructSchema::new("Config").field(FieldSchema::new("x", TypeExpr::Int));
    let err = Cli::new(schema)
        .prog("prog")
        .console_outputs(false)
        .run_inner(&[])
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
}
