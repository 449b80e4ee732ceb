use declargs::{Cli, FieldSchema, Marker, StructSchema, TypeExpr, Value};

fn schema_a() -> StructSchema {
    StructSchema::new("A").field(FieldSchema::new("x", TypeExpr::Int).default(Value::Int(0)))
}

fn schema_b() -> StructSchema {
    StructSchema::new("B")
        .field(FieldSchema::new("y", TypeExpr::Str).default(Value::Str(String::new())))
}

#[test]
fn cascaded_arguments_parse_after_the_subcommand() {
    let union = TypeExpr::Union(vec![schema_a().into_type(), schema_b().into_type()]);
    let root = StructSchema::new("Root")
        .field(FieldSchema::new("flag", TypeExpr::Str))
        .field(FieldSchema::new("cmd", union));

    let cli = Cli::new(root)
        .prog("prog")
        .config(&[Marker::CascadeSubcommandArgs]);

    // the root's --flag is accepted after the subcommand token
    let parsed = cli
        .run_inner(&["cmd:a", "--flag", "v", "--cmd.x", "1"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record(
            "Root",
            [
                ("flag", Value::Str("v".to_string())),
                ("cmd", Value::record("A", [("x", Value::Int(1))])),
            ]
        )
    );

    // before the subcommand it is not recognized there, so the leaf still
    // reports it missing
    let err = cli
        .run_inner(&["--flag", "v", "cmd:a"])
        .unwrap_err()
        .unwrap_stderr();
    assert!(err.contains("--flag"), "{}", err);
    assert!(err.contains("required"), "{}", err);
}

#[test]
fn cascaded_required_arguments_force_subparsers_required() {
    let union = TypeExpr::Union(vec![schema_a().into_type(), schema_b().into_type()]);
    let root = StructSchema::new("Root")
        .field(FieldSchema::new("flag", TypeExpr::Str))
        .field(
            FieldSchema::new("cmd", union)
                .default(Value::record("A", [("x", Value::Int(0))])),
        );

    // without cascade the subcommand default would make it optional; the
    // required cascaded argument forces every leaf to be required
    let err = Cli::new(root)
        .prog("prog")
        .config(&[Marker::CascadeSubcommandArgs])
        .run_inner(&[])
        .unwrap_err()
        .unwrap_stderr();
    assert!(err.contains("missing subcommand"), "{}", err);
}

#[test]
fn cascaded_leaves_enforce_inherited_required_arguments() {
    let union = TypeExpr::Union(vec![schema_a().into_type(), schema_b().into_type()]);
    let root = StructSchema::new("Root")
        .field(FieldSchema::new("flag", TypeExpr::Str))
        .field(FieldSchema::new("cmd", union));

    let err = Cli::new(root)
        .prog("prog")
        .config(&[Marker::CascadeSubcommandArgs])
        .run_inner(&["cmd:a"])
        .unwrap_err()
        .unwrap_stderr();
    assert!(err.contains("--flag"), "{}", err);
}

#[test]
fn optional_groups_are_all_or_nothing() {
    let child = StructSchema::new("Child")
        .field(FieldSchema::new("a", TypeExpr::Int))
        .field(FieldSchema::new("b", TypeExpr::Int).default(Value::Int(10)));
    // the default instance carries no value for `a`
    let default_child = Value::record("Child", [("b", Value::Int(2))]);
    let root = StructSchema::new("Root")
        .field(FieldSchema::new("child", child.into_type()).default(default_child.clone()));

    // nothing supplied: the whole default instance stands in
    let parsed = Cli::new(root.clone()).prog("prog").run_inner(&[]).unwrap();
    assert_eq!(
        parsed,
        Value::record("Root", [("child", default_child)])
    );

    // any member supplied: required members of the group must follow
    let err = Cli::new(root.clone())
        .prog("prog")
        .run_inner(&["--child.b", "5"])
        .unwrap_err()
        .unwrap_stderr();
    assert!(err.contains("--child.a"), "{}", err);

    let parsed = Cli::new(root)
        .prog("prog")
        .run_inner(&["--child.a", "4"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record(
            "Root",
            [("child", Value::record("Child", [("a", Value::Int(4)), ("b", Value::Int(2))]))]
        )
    );
}

#[test]
fn optional_group_help_hints() {
    let child = StructSchema::new("Child")
        .field(FieldSchema::new("a", TypeExpr::Int))
        .field(FieldSchema::new("b", TypeExpr::Int).default(Value::Int(10)));
    // an opaque default instance: no field values can be extracted from it
    let default_child = Value::record("Child", Vec::<(String, Value)>::new());
    let root = StructSchema::new("Root")
        .field(FieldSchema::new("child", child.into_type()).default(default_child));

    let help = Cli::new(root)
        .prog("prog")
        .run_inner(&["--help"])
        .unwrap_err()
        .unwrap_stdout();
    assert!(help.contains("(optional)"), "{}", help);
    assert!(help.contains("(default if used: 10)"), "{}", help);
}

#[test]
fn flag_conversion_can_be_disabled() {
    let root = StructSchema::new("Root").field(
        FieldSchema::new("loud", TypeExpr::Bool.annotated([Marker::FlagConversionOff]))
            .default(Value::Bool(false)),
    );

    // no pair is generated; the flag takes an explicit token
    let parsed = Cli::new(root.clone())
        .prog("prog")
        .run_inner(&["--loud", "True"])
        .unwrap();
    assert_eq!(parsed.as_struct().unwrap().get("loud"), Some(&Value::Bool(true)));

    let err = Cli::new(root)
        .prog("prog")
        .run_inner(&["--no-loud"])
        .unwrap_err()
        .unwrap_stderr();
    assert!(err.contains("unrecognized options"), "{}", err);
}

#[test]
fn pair_creation_can_be_disabled() {
    let root = StructSchema::new("Root").field(
        FieldSchema::new("loud", TypeExpr::Bool.annotated([Marker::FlagCreatePairsOff]))
            .default(Value::Bool(false)),
    );

    let parsed = Cli::new(root.clone())
        .prog("prog")
        .run_inner(&["--loud"])
        .unwrap();
    assert_eq!(parsed.as_struct().unwrap().get("loud"), Some(&Value::Bool(true)));

    let err = Cli::new(root)
        .prog("prog")
        .run_inner(&["--no-loud"])
        .unwrap_err()
        .unwrap_stderr();
    assert!(err.contains("unrecognized options"), "{}", err);
}

#[test]
fn arg_prefixes_can_be_omitted() {
    let inner = StructSchema::new("Inner")
        .field(FieldSchema::new("x", TypeExpr::Int).default(Value::Int(1)));
    let root = StructSchema::new("Root").field(FieldSchema::new(
        "inner",
        inner.into_type().annotated([Marker::OmitArgPrefixes]),
    ));

    let parsed = Cli::new(root)
        .prog("prog")
        .run_inner(&["--x", "5"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("Root", [("inner", Value::record("Inner", [("x", Value::Int(5))]))])
    );
}

#[test]
fn positional_required_args_marker() {
    let root = StructSchema::new("Root")
        .field(FieldSchema::new("src", TypeExpr::Str))
        .field(FieldSchema::new("n", TypeExpr::Int).default(Value::Int(1)));

    let parsed = Cli::new(root)
        .prog("prog")
        .config(&[Marker::PositionalRequiredArgs])
        .run_inner(&["input.txt", "--n", "3"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record(
            "Root",
            [
                ("src", Value::Str("input.txt".to_string())),
                ("n", Value::Int(3)),
            ]
        )
    );
}

#[test]
fn suppress_fixed_hides_only_fixed_arguments() {
    let root = StructSchema::new("Root")
        .field(
            FieldSchema::new("pinned", TypeExpr::Int.annotated([Marker::Fixed]))
                .default(Value::Int(5)),
        )
        .field(FieldSchema::new("shown", TypeExpr::Int).default(Value::Int(0)));

    let help = Cli::new(root)
        .prog("prog")
        .config(&[Marker::SuppressFixed])
        .run_inner(&["--help"])
        .unwrap_err()
        .unwrap_stdout();
    assert!(!help.contains("pinned"), "{}", help);
    assert!(help.contains("--shown"), "{}", help);
}

#[test]
fn append_hint_shows_existing_default() {
    let root = StructSchema::new("Root").field(
        FieldSchema::new(
            "xs",
            TypeExpr::list(TypeExpr::Int).annotated([Marker::UseAppendAction]),
        )
        .default(Value::List(vec![Value::Int(1), Value::Int(2)])),
    );

    let help = Cli::new(root)
        .prog("prog")
        .run_inner(&["--help"])
        .unwrap_err()
        .unwrap_stdout();
    assert!(help.contains("(repeatable, appends to: 1 2)"), "{}", help);
}
