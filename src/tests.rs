use crate::*;

fn record(name: &str) -> StructSchema {
    StructSchema::new(name)
}

#[test]
fn simple_record_with_default() {
    let schema = record("Config")
        .field(FieldSchema::new("name", TypeExpr::Str))
        .field(FieldSchema::new("loud", TypeExpr::Bool).default(Value::Bool(false)));

    let parsed = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&["--name", "Alice"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("Config", [
            ("name", Value::Str("Alice".to_string())),
            ("loud", Value::Bool(false)),
        ])
    );

    let parsed = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--name", "Bob", "--loud"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("Config", [
            ("name", Value::Str("Bob".to_string())),
            ("loud", Value::Bool(true)),
        ])
    );
}

#[test]
fn boolean_pair_negative_form() {
    let schema = record("Config")
        .field(FieldSchema::new("loud", TypeExpr::Bool).default(Value::Bool(true)));
    let parsed = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--no-loud"])
        .unwrap();
    assert_eq!(parsed.as_struct().unwrap().get("loud"), Some(&Value::Bool(false)));
}

#[test]
fn simple_help_output() {
    let schema = record("Config")
        .field(FieldSchema::new("name", TypeExpr::Str).help("Experiment name."))
        .field(FieldSchema::new("loud", TypeExpr::Bool).default(Value::Bool(false)));

    let help = Cli::new(schema)
        .prog("app")
        .run_inner(&["--help"])
        .unwrap_err()
        .unwrap_stdout();

    let expected = "\
Usage: app --name STR [--loud]

Available options:
    --name STR         Experiment name. (required)
    --loud, --no-loud  (default: False)
    -h, --help         Prints help information
";
    assert_eq!(expected, help);
}

#[test]
fn help_is_not_intercepted_when_disabled() {
    let schema = record("Config")
        .field(FieldSchema::new("x", TypeExpr::Int).default(Value::Int(0)));
    let err = Cli::new(schema)
        .prog("prog")
        .add_help(false)
        .run_inner(&["--help"])
        .unwrap_err()
        .unwrap_stderr();
    assert!(err.contains("unrecognized options"), "{}", err);
    assert!(err.contains("--help"), "{}", err);
}

#[test]
fn integer_sequences() {
    let schema = record("Config").field(FieldSchema::new("xs", TypeExpr::list(TypeExpr::Int)));
    let parsed = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--xs", "1", "2", "3"])
        .unwrap();
    assert_eq!(
        parsed.as_struct().unwrap().get("xs"),
        Some(&Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
    );
}

#[test]
fn empty_argv_yields_empty_collection_for_star_positionals() {
    let schema = record("Config").field(FieldSchema::new(
        "xs",
        TypeExpr::list(TypeExpr::Int).annotated([Marker::Positional]),
    ));
    let parsed = Cli::new(schema).prog("prog").run_inner(&[]).unwrap();
    assert_eq!(
        parsed.as_struct().unwrap().get("xs"),
        Some(&Value::List(Vec::new()))
    );
}

#[test]
fn counters_accumulate_and_group() {
    let verbose = TypeExpr::Int
        .annotated([Marker::UseCounterAction])
        .with_conf(ConfItem::Arg(ArgConf::new().alias("-v")));
    let schema = record("Config")
        .field(FieldSchema::new("verbose", verbose).default(Value::Int(0)));

    let parsed = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&["-v", "-v", "-v"])
        .unwrap();
    assert_eq!(parsed.as_struct().unwrap().get("verbose"), Some(&Value::Int(3)));

    let parsed = Cli::new(schema).prog("prog").run_inner(&["-vvv"]).unwrap();
    assert_eq!(parsed.as_struct().unwrap().get("verbose"), Some(&Value::Int(3)));
}

#[test]
fn mutex_groups() {
    let group = MutexGroupConfig::new(true);
    let schema = record("Config")
        .field(
            FieldSchema::new(
                "a",
                TypeExpr::Int
                    .optional()
                    .with_conf(ConfItem::Mutex(group.clone())),
            )
            .default(Value::None),
        )
        .field(
            FieldSchema::new(
                "b",
                TypeExpr::Int
                    .optional()
                    .with_conf(ConfItem::Mutex(group.clone())),
            )
            .default(Value::None),
        );

    let err = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&[])
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.clone().unwrap_stderr().contains("required"));

    let parsed = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&["--a", "1"])
        .unwrap();
    assert_eq!(parsed.as_struct().unwrap().get("a"), Some(&Value::Int(1)));

    let parsed = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&["--b", "1"])
        .unwrap();
    assert_eq!(parsed.as_struct().unwrap().get("b"), Some(&Value::Int(1)));

    let err = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--a", "1", "--b", "2"])
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert_eq!(
        err.unwrap_stderr(),
        "--b cannot be used at the same time as --a"
    );
}

#[test]
fn equals_form_and_empty_value() {
    let schema = record("Config")
        .field(FieldSchema::new("name", TypeExpr::Str))
        .field(FieldSchema::new("n", TypeExpr::Int).default(Value::Int(1)));

    let parsed = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&["--name=x", "--n=4"])
        .unwrap();
    assert_eq!(
        parsed.as_struct().unwrap().get("name"),
        Some(&Value::Str("x".to_string()))
    );
    assert_eq!(parsed.as_struct().unwrap().get("n"), Some(&Value::Int(4)));

    // `--name=` carries an explicit empty token
    let parsed = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--name="])
        .unwrap();
    assert_eq!(
        parsed.as_struct().unwrap().get("name"),
        Some(&Value::Str(String::new()))
    );
}

#[test]
fn nested_records_flatten_into_dotted_flags() {
    let inner = record("Inner").field(FieldSchema::new("x", TypeExpr::Int).default(Value::Int(1)));
    let schema = record("Outer")
        .field(FieldSchema::new("inner", inner.into_type()))
        .field(FieldSchema::new("flag", TypeExpr::Bool).default(Value::Bool(false)));

    let parsed = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--inner.x", "5"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("Outer", [
            ("inner", Value::record("Inner", [("x", Value::Int(5))])),
            ("flag", Value::Bool(false)),
        ])
    );
}

#[test]
fn nested_boolean_pairs_insert_no_after_last_dot() {
    let inner = record("Inner")
        .field(FieldSchema::new("flag", TypeExpr::Bool).default(Value::Bool(true)));
    let schema = record("Outer").field(FieldSchema::new("inner", inner.into_type()));

    let parsed = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--inner.no-flag"])
        .unwrap();
    assert_eq!(
        parsed.as_struct().unwrap().get("inner").unwrap().as_struct().unwrap().get("flag"),
        Some(&Value::Bool(false))
    );
}

#[test]
fn both_delimiter_spellings_accepted() {
    let schema = record("Config")
        .field(FieldSchema::new("my_flag", TypeExpr::Bool).default(Value::Bool(false)));

    let hyphen = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&["--my-flag"])
        .unwrap();
    let underscore = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&["--my_flag"])
        .unwrap();
    assert_eq!(hyphen, underscore);

    // display follows the configured delimiter
    let help = Cli::new(schema)
        .prog("prog")
        .use_underscores(true)
        .run_inner(&["--help"])
        .unwrap_err()
        .unwrap_stdout();
    assert!(help.contains("--my_flag"), "{}", help);
}

#[test]
fn unknown_options_get_suggestions() {
    let schema = record("Config").field(FieldSchema::new("name", TypeExpr::Str));
    let err = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--name", "x", "--nmae", "y"])
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
    let message = err.unwrap_stderr();
    assert!(message.contains("unrecognized options"), "{}", message);
    assert!(message.contains("--nmae (in prog)"), "{}", message);
    assert!(message.contains("perhaps you meant `--name`"), "{}", message);
}

#[test]
fn unknowns_returned_when_requested() {
    let schema = record("Config").field(FieldSchema::new("name", TypeExpr::Str));
    let (parsed, unknown) = Cli::new(schema)
        .prog("prog")
        .run_inner_with_unknowns(&["--name", "x", "--bogus"])
        .unwrap();
    assert_eq!(
        parsed.as_struct().unwrap().get("name"),
        Some(&Value::Str("x".to_string()))
    );
    assert_eq!(unknown, vec!["--bogus".to_string()]);
}

#[test]
fn return_unknowns_is_a_superset_of_strict_parsing() {
    let schema = record("Config").field(FieldSchema::new("x", TypeExpr::Int).default(Value::Int(7)));
    let strict = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&["--x", "3"])
        .unwrap();
    let (loose, unknown) = Cli::new(schema)
        .prog("prog")
        .run_inner_with_unknowns(&["--x", "3"])
        .unwrap();
    assert_eq!(strict, loose);
    assert!(unknown.is_empty());
}

#[test]
fn required_option_errors_name_the_flag() {
    let schema = record("Config").field(FieldSchema::new("name", TypeExpr::Str));
    let err = Cli::new(schema).prog("prog").run_inner(&[]).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert_eq!(
        err.unwrap_stderr(),
        "the following options are required:\n  --name (in prog)"
    );
}

#[test]
fn instantiation_failures_name_the_argument() {
    let schema = record("Config").field(FieldSchema::new("x", TypeExpr::Int));
    let err = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--x", "abc"])
        .unwrap_err();
    assert_eq!(
        err.unwrap_stderr(),
        "couldn't parse --x: \"abc\" is not an integer"
    );
}

#[test]
fn enum_choices_are_enforced() {
    let color = EnumSchema::new("Color", [("RED", Value::Int(1)), ("GREEN", Value::Int(2))]);
    let schema = record("Config").field(FieldSchema::new("color", TypeExpr::Enum(color)));

    let parsed = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&["--color", "RED"])
        .unwrap();
    match parsed.as_struct().unwrap().get("color") {
        Some(Value::Variant(v)) => assert_eq!(v.name(), "RED"),
        other => panic!("expected a variant, got {:?}", other),
    }

    let err = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--color", "BLUE"])
        .unwrap_err();
    assert_eq!(
        err.unwrap_stderr(),
        "invalid choice \"BLUE\" for --color (choose from {RED,GREEN})"
    );
}

#[test]
fn enum_members_matched_by_value_when_marked() {
    let color = EnumSchema::new(
        "Color",
        [
            ("RED", Value::Int(1)),
            ("GREEN", Value::Int(2)),
            ("CRIMSON", Value::Int(1)), // alias of RED
        ],
    );
    let schema = record("Config").field(FieldSchema::new(
        "color",
        TypeExpr::Enum(color).annotated([Marker::EnumChoicesFromValues]),
    ));
    let parsed = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--color", "1"])
        .unwrap();
    match parsed.as_struct().unwrap().get("color") {
        Some(Value::Variant(v)) => assert_eq!(v.name(), "RED"),
        other => panic!("expected a variant, got {:?}", other),
    }
}

#[test]
fn optional_scalars_accept_explicit_none() {
    let schema = record("Config")
        .field(FieldSchema::new("x", TypeExpr::Int.optional()).default(Value::None));

    let parsed = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&["--x", "None"])
        .unwrap();
    assert_eq!(parsed.as_struct().unwrap().get("x"), Some(&Value::None));

    let parsed = Cli::new(schema).prog("prog").run_inner(&["--x", "5"]).unwrap();
    assert_eq!(parsed.as_struct().unwrap().get("x"), Some(&Value::Int(5)));
}

#[test]
fn fixed_tuples_and_maps() {
    let schema = record("Config")
        .field(FieldSchema::new(
            "pair",
            TypeExpr::Tuple(vec![TypeExpr::Int, TypeExpr::Str]),
        ))
        .field(
            FieldSchema::new("env", TypeExpr::map(TypeExpr::Str, TypeExpr::Int))
                .default(Value::Map(Vec::new())),
        );

    let parsed = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--pair", "1", "one", "--env", "a", "1", "b", "2"])
        .unwrap();
    assert_eq!(
        parsed.as_struct().unwrap().get("pair"),
        Some(&Value::Tuple(vec![Value::Int(1), Value::Str("one".to_string())]))
    );
    assert_eq!(
        parsed.as_struct().unwrap().get("env"),
        Some(&Value::Map(vec![
            (Value::Str("a".to_string()), Value::Int(1)),
            (Value::Str("b".to_string()), Value::Int(2)),
        ]))
    );
}

#[test]
fn variable_arity_unions_backtrack() {
    let element = TypeExpr::Union(vec![
        TypeExpr::Int,
        TypeExpr::Tuple(vec![TypeExpr::Int, TypeExpr::Int]),
    ]);
    let schema = record("Config").field(FieldSchema::new("xs", TypeExpr::list(element)));

    let parsed = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--xs", "1", "2", "3"])
        .unwrap();
    assert_eq!(
        parsed.as_struct().unwrap().get("xs"),
        Some(&Value::List(vec![
            Value::Tuple(vec![Value::Int(1), Value::Int(2)]),
            Value::Int(3),
        ]))
    );
}

#[test]
fn append_action_accumulates_occurrences() {
    let schema = record("Config").field(
        FieldSchema::new(
            "xs",
            TypeExpr::list(TypeExpr::Int).annotated([Marker::UseAppendAction]),
        )
        .default(Value::List(Vec::new())),
    );
    let parsed = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--xs", "1", "--xs", "2", "3"])
        .unwrap();
    assert_eq!(
        parsed.as_struct().unwrap().get("xs"),
        Some(&Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
    );
}

#[test]
fn dates_parse_iso_forms() {
    let schema = record("Config").field(FieldSchema::new("day", TypeExpr::Date));
    let parsed = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--day", "2021-02-28"])
        .unwrap();
    assert_eq!(
        parsed.as_struct().unwrap().get("day"),
        Some(&Value::Date(Date::new(2021, 2, 28).unwrap()))
    );
}

#[test]
fn positional_fields_consume_in_order() {
    let schema = record("Config")
        .field(FieldSchema::new(
            "src",
            TypeExpr::Str.annotated([Marker::Positional]),
        ))
        .field(FieldSchema::new(
            "dst",
            TypeExpr::Str.annotated([Marker::Positional]),
        ));
    let parsed = Cli::new(schema)
        .prog("prog")
        .run_inner(&["a.txt", "b.txt"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("Config", [
            ("src", Value::Str("a.txt".to_string())),
            ("dst", Value::Str("b.txt".to_string())),
        ])
    );
}

#[test]
fn fixed_arguments_are_pinned_to_their_default() {
    let schema = record("Config")
        .field(FieldSchema::new("x", TypeExpr::Int.annotated([Marker::Fixed])).default(Value::Int(5)))
        .field(FieldSchema::new("y", TypeExpr::Int).default(Value::Int(0)));

    let parsed = Cli::new(schema.clone()).prog("prog").run_inner(&[]).unwrap();
    assert_eq!(parsed.as_struct().unwrap().get("x"), Some(&Value::Int(5)));

    // a fixed argument has no flag to set
    let err = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--x", "3"])
        .unwrap_err();
    assert!(err.unwrap_stderr().contains("unrecognized options"));
}

#[test]
fn suppressed_arguments_disappear_from_help() {
    let schema = record("Config")
        .field(FieldSchema::new("visible", TypeExpr::Int).default(Value::Int(0)))
        .field(
            FieldSchema::new("hidden", TypeExpr::Int.annotated([Marker::Suppress]))
                .default(Value::Int(0)),
        );
    let help = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--help"])
        .unwrap_err()
        .unwrap_stdout();
    assert!(help.contains("--visible"), "{}", help);
    assert!(!help.contains("--hidden"), "{}", help);
}

#[test]
fn typed_dicts_omit_unset_keys() {
    let schema = StructSchema::new("Options")
        .kind(StructKind::TypedDict { total: false })
        .field(FieldSchema::new("a", TypeExpr::Int))
        .field(FieldSchema::new("b", TypeExpr::Int));

    let parsed = Cli::new(schema.clone()).prog("prog").run_inner(&[]).unwrap();
    assert_eq!(parsed, Value::Map(Vec::new()));

    let parsed = Cli::new(schema).prog("prog").run_inner(&["--a", "3"]).unwrap();
    assert_eq!(
        parsed,
        Value::Map(vec![(Value::Str("a".to_string()), Value::Int(3))])
    );
}

#[test]
fn initial_value_fills_unsupplied_fields() {
    let schema = record("Config")
        .field(FieldSchema::new("x", TypeExpr::Int))
        .field(FieldSchema::new("y", TypeExpr::Int));
    let base = Value::record("Config", [("x", Value::Int(1)), ("y", Value::Int(2))]);

    // nothing supplied: the initial value passes through wholesale
    let parsed = Cli::new(schema.clone())
        .prog("prog")
        .default(base.clone())
        .run_inner(&[])
        .unwrap();
    assert_eq!(parsed, base);

    // overrides merge on top of it
    let parsed = Cli::new(schema)
        .prog("prog")
        .default(base)
        .run_inner(&["--y", "5"])
        .unwrap();
    assert_eq!(
        parsed,
        Value::record("Config", [("x", Value::Int(1)), ("y", Value::Int(5))])
    );
}

#[test]
fn primitive_roundtrips_through_printers() {
    let registry = Registry::new();
    let cases = [
        (TypeExpr::Int, Value::Int(-42)),
        (TypeExpr::Str, Value::Str("hello".to_string())),
        (TypeExpr::Bool, Value::Bool(true)),
        (
            TypeExpr::list(TypeExpr::Int),
            Value::List(vec![Value::Int(1), Value::Int(2)]),
        ),
        (
            TypeExpr::Tuple(vec![TypeExpr::Int, TypeExpr::Str]),
            Value::Tuple(vec![Value::Int(3), Value::Str("x".to_string())]),
        ),
    ];
    for (ty, value) in cases {
        let spec = registry
            .get_primitive_spec(&PrimitiveTypeInfo {
                norm: normalize(&ty, MarkerSet::EMPTY),
                field_name: "x".to_string(),
            })
            .unwrap();
        assert!(spec.is_instance(&value));
        let tokens = spec.print(&value).unwrap();
        assert_eq!(spec.instantiate(&tokens).unwrap(), value, "{:?}", ty);
    }
}

#[test]
fn choice_specs_reject_everything_outside_choices() {
    let registry = Registry::new();
    let spec = registry
        .get_primitive_spec(&PrimitiveTypeInfo {
            norm: normalize(&TypeExpr::Bool, MarkerSet::EMPTY),
            field_name: "x".to_string(),
        })
        .unwrap();
    for bad in ["true", "false", "yes", ""] {
        assert!(spec.instantiate(&[bad.to_string()]).is_err(), "{:?}", bad);
    }
}

#[test]
fn schema_errors_surface_before_parsing() {
    // a default that cannot inhabit the declared type
    let schema = record("Config")
        .field(FieldSchema::new("x", TypeExpr::Int).default(Value::Str("oops".to_string())));
    let err = Cli::new(schema).prog("prog").build_spec().unwrap_err();
    assert!(matches!(err, SpecError::InvalidDefault { .. }));

    // a type no rule accepts
    let schema = record("Config").field(FieldSchema::new("x", TypeExpr::Any));
    let err = Cli::new(schema).prog("prog").build_spec().unwrap_err();
    assert!(matches!(err, SpecError::UnsupportedTypeAnnotation(_)));

    // aliases must look like flags
    let schema = record("Config").field(FieldSchema::new(
        "x",
        TypeExpr::Int.with_conf(ConfItem::Arg(ArgConf::new().alias("v"))),
    ));
    let err = Cli::new(schema).prog("prog").build_spec().unwrap_err();
    assert!(matches!(err, SpecError::BadAlias { .. }));
}

#[test]
fn aliases_are_accepted_and_shown() {
    let schema = record("Config").field(
        FieldSchema::new(
            "output",
            TypeExpr::Str.with_conf(ConfItem::Arg(ArgConf::new().alias("-o"))),
        )
        .default(Value::Str("out".to_string())),
    );

    let parsed = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&["-o", "dir"])
        .unwrap();
    assert_eq!(
        parsed.as_struct().unwrap().get("output"),
        Some(&Value::Str("dir".to_string()))
    );

    let help = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--help"])
        .unwrap_err()
        .unwrap_stdout();
    assert!(help.contains("-o, --output"), "{}", help);
}

#[test]
fn literal_fields_compare_as_strings() {
    let schema = record("Config").field(FieldSchema::new(
        "mode",
        TypeExpr::Literal(vec![
            Value::Str("fast".to_string()),
            Value::Str("slow".to_string()),
            Value::Int(3),
        ]),
    ));
    let parsed = Cli::new(schema.clone())
        .prog("prog")
        .run_inner(&["--mode", "3"])
        .unwrap();
    assert_eq!(parsed.as_struct().unwrap().get("mode"), Some(&Value::Int(3)));

    let err = Cli::new(schema)
        .prog("prog")
        .run_inner(&["--mode", "medium"])
        .unwrap_err();
    assert!(err.unwrap_stderr().contains("invalid choice"));
}
