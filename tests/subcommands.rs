use declargs::{
    Cli, ConfItem, FieldSchema, Marker, StructSchema, SubcommandConf, TypeExpr, Value,
};

fn schema_a() -> StructSchema {
    StructSchema::new("A").field(FieldSchema::new("x", TypeExpr::Int).default(Value::Int(0)))
}

fn schema_b() -> StructSchema {
    StructSchema::new("B")
        .field(FieldSchema::new("y", TypeExpr::Str).default(Value::Str(String::new())))
}

#[test]
fn union_root_dispatches_on_bare_tokens() {
    let union = TypeExpr::Union(vec![schema_a().into_type(), schema_b().into_type()]);
    let default = Value::record("A", [("x", Value::Int(3))]);

    let parsed = Cli::new(union.clone())
        .prog("prog")
        .default(default.clone())
        .run_inner(&["b", "--y", "hi"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("B", [("y", Value::Str("hi".to_string()))])
    );

    // no tokens at all: the registered default passes through wholesale
    let parsed = Cli::new(union.clone())
        .prog("prog")
        .default(default.clone())
        .run_inner(&[])
        .unwrap();
    assert_eq!(parsed, default);

    // selecting the default branch re-parses it from its own defaults
    let parsed = Cli::new(union)
        .prog("prog")
        .default(default)
        .run_inner(&["a"])
        .unwrap();
    assert_eq!(parsed, Value::record("A", [("x", Value::Int(3))]));
}

#[test]
fn nested_subcommands_are_namespaced() {
    let union = TypeExpr::Union(vec![schema_a().into_type(), schema_b().into_type()]);
    let root = StructSchema::new("Root").field(FieldSchema::new("cmd", union));

    let parsed = Cli::new(root.clone())
        .prog("prog")
        .run_inner(&["cmd:a", "--cmd.x", "7"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("Root", [("cmd", Value::record("A", [("x", Value::Int(7))]))])
    );

    let err = Cli::new(root).prog("prog").run_inner(&[]).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert_eq!(
        err.unwrap_stderr(),
        "missing subcommand for prog (choose from {cmd:a,cmd:b})"
    );
}

#[test]
fn subcommand_prefixes_can_be_omitted() {
    let union = TypeExpr::Union(vec![schema_a().into_type(), schema_b().into_type()])
        .annotated([Marker::OmitSubcommandPrefixes]);
    let root = StructSchema::new("Root").field(FieldSchema::new("cmd", union));

    let parsed = Cli::new(root)
        .prog("prog")
        .run_inner(&["a", "--x", "7"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("Root", [("cmd", Value::record("A", [("x", Value::Int(7))]))])
    );
}

#[test]
fn configured_names_and_descriptions_win() {
    let a = schema_a()
        .into_type()
        .with_conf(ConfItem::Subcommand(
            SubcommandConf::new().name("alpha").description("The alpha branch."),
        ));
    let union = TypeExpr::Union(vec![a, schema_b().into_type()]);
    let root = StructSchema::new("Root").field(FieldSchema::new("cmd", union));

    let parsed = Cli::new(root.clone())
        .prog("prog")
        .run_inner(&["alpha", "--cmd.x", "1"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("Root", [("cmd", Value::record("A", [("x", Value::Int(1))]))])
    );

    let help = Cli::new(root)
        .prog("prog")
        .run_inner(&["--help"])
        .unwrap_err()
        .unwrap_stdout();
    assert!(help.contains("alpha"), "{}", help);
    assert!(help.contains("The alpha branch."), "{}", help);
}

#[test]
fn camel_case_names_are_delimited() {
    let config = StructSchema::new("TrainConfig")
        .field(FieldSchema::new("lr", TypeExpr::Float).default(Value::Float(0.1)));
    let union = TypeExpr::Union(vec![config.into_type(), schema_b().into_type()]);

    let parsed = Cli::new(union.clone())
        .prog("prog")
        .run_inner(&["train-config"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("TrainConfig", [("lr", Value::Float(0.1))])
    );

    let parsed = Cli::new(union)
        .prog("prog")
        .use_underscores(true)
        .run_inner(&["train_config"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("TrainConfig", [("lr", Value::Float(0.1))])
    );
}

#[test]
fn alias_breadcrumbs_seed_subcommand_names() {
    let aliased = schema_a().into_type().aliased("FastPath");
    let union = TypeExpr::Union(vec![aliased, schema_b().into_type()]);

    let parsed = Cli::new(union)
        .prog("prog")
        .run_inner(&["fast-path"])
        .unwrap();
    assert_eq!(parsed, Value::record("A", [("x", Value::Int(0))]));
}

#[test]
fn optional_unions_accept_a_none_branch() {
    let union = TypeExpr::Union(vec![TypeExpr::NoneType, schema_a().into_type()]);
    let parsed = Cli::new(union.clone())
        .prog("prog")
        .default(Value::None)
        .run_inner(&["None"])
        .unwrap();
    assert_eq!(parsed, Value::None);

    let parsed = Cli::new(union)
        .prog("prog")
        .default(Value::None)
        .run_inner(&["a", "--x", "2"])
        .unwrap();
    assert_eq!(parsed, Value::record("A", [("x", Value::Int(2))]));
}

#[test]
fn defaults_with_required_holes_are_dropped() {
    // the C default carries no value for its nested union, leaving a
    // required subparser inside the default branch; the default cannot be
    // honoured and the outer subparser stays required
    let inner = TypeExpr::Union(vec![schema_a().into_type(), schema_b().into_type()]);
    let c = StructSchema::new("C").field(FieldSchema::new("inner", inner));
    let union = TypeExpr::Union(vec![c.into_type(), schema_b().into_type()]);
    let root = StructSchema::new("Root").field(
        FieldSchema::new("cmd", union)
            .default(Value::record("C", Vec::<(String, Value)>::new())),
    );

    let err = Cli::new(root).prog("prog").run_inner(&[]).unwrap_err();
    assert!(err.unwrap_stderr().contains("missing subcommand"));
}

#[test]
fn avoid_subcommands_collapses_onto_the_default_branch() {
    let union = TypeExpr::Union(vec![schema_a().into_type(), schema_b().into_type()])
        .annotated([Marker::AvoidSubcommands]);
    let root = StructSchema::new("Root").field(
        FieldSchema::new("cmd", union).default(Value::record("A", [("x", Value::Int(3))])),
    );

    let parsed = Cli::new(root.clone())
        .prog("prog")
        .run_inner(&["--cmd.x", "9"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("Root", [("cmd", Value::record("A", [("x", Value::Int(9))]))])
    );

    let parsed = Cli::new(root).prog("prog").run_inner(&[]).unwrap();
    assert_eq!(
        parsed,
        Value::record("Root", [("cmd", Value::record("A", [("x", Value::Int(3))]))])
    );
}

#[test]
fn star_positionals_stop_at_subcommand_boundaries() {
    let union = TypeExpr::Union(vec![schema_a().into_type(), schema_b().into_type()]);
    let root = StructSchema::new("Root")
        .field(
            FieldSchema::new(
                "xs",
                TypeExpr::list(TypeExpr::Str).annotated([Marker::Positional]),
            )
            .default(Value::List(Vec::new())),
        )
        .field(FieldSchema::new("cmd", union));

    let parsed = Cli::new(root)
        .prog("prog")
        .run_inner(&["one", "two", "cmd:a"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record(
            "Root",
            [
                (
                    "xs",
                    Value::List(vec![
                        Value::Str("one".to_string()),
                        Value::Str("two".to_string()),
                    ])
                ),
                ("cmd", Value::record("A", [("x", Value::Int(0))])),
            ]
        )
    );
}

#[test]
fn colliding_names_keep_the_last_registration() {
    // make the duplicate-name warning visible when running with --nocapture
    let _ = tracing_subscriber::fmt().try_init();

    let first = schema_a()
        .into_type()
        .with_conf(ConfItem::Subcommand(SubcommandConf::new().name("same")));
    let second = schema_b()
        .into_type()
        .with_conf(ConfItem::Subcommand(SubcommandConf::new().name("same")));
    let union = TypeExpr::Union(vec![first, second]);

    let parsed = Cli::new(union)
        .prog("prog")
        .run_inner(&["same"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("B", [("y", Value::Str(String::new()))])
    );
}

#[test]
fn subcommand_help_renders_branch_arguments() {
    let union = TypeExpr::Union(vec![schema_a().into_type(), schema_b().into_type()]);
    let root = StructSchema::new("Root").field(FieldSchema::new("cmd", union));

    let help = Cli::new(root)
        .prog("prog")
        .run_inner(&["cmd:a", "--help"])
        .unwrap_err()
        .unwrap_stdout();
    assert!(help.starts_with("Usage: prog cmd:a"), "{}", help);
    assert!(help.contains("--cmd.x"), "{}", help);
}
