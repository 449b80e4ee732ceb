use declargs::{Cli, FieldSchema, Marker, StructSchema, TypeExpr, Value};

fn schema() -> StructSchema {
    let a = StructSchema::new("A").field(FieldSchema::new("x", TypeExpr::Int).default(Value::Int(0)));
    let b = StructSchema::new("B").field(FieldSchema::new("y", TypeExpr::Str).default(Value::Str(String::new())));
    StructSchema::new("Root")
        .field(FieldSchema::new("name", TypeExpr::Str).help("A name."))
        .field(FieldSchema::new("loud", TypeExpr::Bool).default(Value::Bool(false)))
        .field(
            FieldSchema::new("log_file", TypeExpr::Str)
                .default(Value::Str("out.log".to_string())),
        )
        .field(FieldSchema::new(
            "cmd",
            TypeExpr::Union(vec![a.into_type(), b.into_type()]),
        ))
}

#[test]
fn completion_tree_shape() {
    let spec = Cli::new(schema()).prog("app").completion_spec().unwrap();
    let json = serde_json::to_value(&spec).unwrap();

    assert_eq!(json["prog"], "app");

    let options = json["options"].as_array().unwrap();
    let by_flag = |flag: &str| {
        options
            .iter()
            .find(|o| {
                o["flags"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .any(|f| f == flag)
            })
            .unwrap_or_else(|| panic!("no option for {}", flag))
    };

    let name = by_flag("--name");
    assert_eq!(name["type"], "value");
    assert_eq!(name["nargs"], "1");
    assert_eq!(name["description"], "A name. (required)");

    let loud = by_flag("--loud");
    assert_eq!(loud["type"], "boolean");
    assert!(loud["flags"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "--no-loud"));

    // the `_file` suffix promotes path completion
    let log = by_flag("--log-file");
    assert_eq!(log["type"], "path");

    let subcommands = json["subcommands"].as_object().unwrap();
    assert!(subcommands.contains_key("cmd:a"));
    assert!(subcommands.contains_key("cmd:b"));
    let a = &subcommands["cmd:a"];
    assert!(a["options"]
        .as_array()
        .unwrap()
        .iter()
        .any(|o| o["flags"].as_array().unwrap().iter().any(|f| f == "--cmd.x")));
}

#[test]
fn choice_options_carry_their_choices() {
    let schema = StructSchema::new("Config").field(FieldSchema::new(
        "mode",
        TypeExpr::Literal(vec![
            Value::Str("fast".to_string()),
            Value::Str("slow".to_string()),
        ]),
    ));
    let spec = Cli::new(schema).prog("app").completion_spec().unwrap();
    let json = serde_json::to_value(&spec).unwrap();
    let mode = &json["options"].as_array().unwrap()[0];
    assert_eq!(mode["type"], "choice");
    assert_eq!(
        mode["choices"],
        serde_json::json!(["fast", "slow"])
    );
}

#[test]
fn cascaded_options_are_marked_at_the_leaves() {
    let a = StructSchema::new("A").field(FieldSchema::new("x", TypeExpr::Int).default(Value::Int(0)));
    let b = StructSchema::new("B").field(FieldSchema::new("y", TypeExpr::Int).default(Value::Int(0)));
    let root = StructSchema::new("Root")
        .field(FieldSchema::new("flag", TypeExpr::Str).default(Value::Str(String::new())))
        .field(FieldSchema::new(
            "cmd",
            TypeExpr::Union(vec![a.into_type(), b.into_type()]),
        ));

    let spec = Cli::new(root)
        .prog("app")
        .config(&[Marker::CascadeSubcommandArgs])
        .completion_spec()
        .unwrap();
    let json = serde_json::to_value(&spec).unwrap();

    // the root holds no options of its own
    assert!(json["options"].as_array().unwrap().is_empty());

    // the leaves inherit --flag with the cascade bit set
    let leaf = &json["subcommands"]["cmd:a"];
    let flag = leaf["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["flags"].as_array().unwrap().iter().any(|f| f == "--flag"))
        .unwrap();
    assert_eq!(flag["cascade"], true);
}

#[test]
fn frontier_groups_list_parallel_subparser_groups() {
    let a = StructSchema::new("A").field(FieldSchema::new("x", TypeExpr::Int).default(Value::Int(0)));
    let b = StructSchema::new("B").field(FieldSchema::new("y", TypeExpr::Int).default(Value::Int(0)));
    let root = StructSchema::new("Root")
        .field(FieldSchema::new(
            "first",
            TypeExpr::Union(vec![a.clone().into_type(), b.clone().into_type()]),
        ))
        .field(FieldSchema::new(
            "second",
            TypeExpr::Union(vec![a.into_type(), b.into_type()]),
        ));

    let spec = Cli::new(root).prog("app").completion_spec().unwrap();
    let json = serde_json::to_value(&spec).unwrap();
    let groups = json["frontier_groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert!(groups[0].as_array().unwrap().iter().any(|n| n == "first:a"));
    assert!(groups[1].as_array().unwrap().iter().any(|n| n == "second:a"));
}

#[test]
fn completion_spec_writes_to_disk() {
    let dir = std::env::temp_dir().join("declargs-completion-test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("spec.json");
    Cli::new(schema())
        .prog("app")
        .write_completion_spec(&path)
        .unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["prog"], "app");
    std::fs::remove_file(&path).ok();
}
