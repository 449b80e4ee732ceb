//! Built-in struct constructor rules.
//!
//! A struct spec decomposes a type into named fields and knows how to
//! reassemble parsed field values into an instance. Rules are tried
//! newest-first; each either claims the type or passes.

use std::rc::Rc;

use crate::registry::{Registry, StructRuleFn, StructTypeInfo};
use crate::schema::{infer_type, CallMode, StructKind, TypeExpr};
use crate::value::{FieldDefault, Value};

/// One field of a decomposed struct.
#[derive(Debug, Clone)]
pub struct StructFieldSpec {
    pub name: String,
    pub ty: TypeExpr,
    pub default: FieldDefault,
    pub help: Option<String>,
    /// Name used in the constructor call when it differs from `name`.
    pub call_name: Option<String>,
    pub mode: CallMode,
}

impl StructFieldSpec {
    pub(crate) fn call_name(&self) -> &str {
        self.call_name.as_deref().unwrap_or(&self.name)
    }
}

/// Values collected for one constructor call.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keyword: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.keyword
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }
}

type InstantiateFn = Rc<dyn Fn(CallArgs) -> Result<Value, String>>;

/// How to build an instance from multiple command line arguments.
#[derive(Clone)]
pub struct StructSpec {
    pub name: String,
    pub doc: Option<String>,
    pub fields: Vec<StructFieldSpec>,
    instantiate: InstantiateFn,
}

impl StructSpec {
    pub fn new(
        name: impl Into<String>,
        doc: Option<String>,
        fields: Vec<StructFieldSpec>,
        instantiate: impl Fn(CallArgs) -> Result<Value, String> + 'static,
    ) -> Self {
        StructSpec {
            name: name.into(),
            doc,
            fields,
            instantiate: Rc::new(instantiate),
        }
    }

    pub fn instantiate(&self, args: CallArgs) -> Result<Value, String> {
        (self.instantiate)(args)
    }
}

impl std::fmt::Debug for StructSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructSpec")
            .field("name", &self.name)
            .field("fields", &self.fields.len())
            .finish()
    }
}

/// The default rule set, in registration order; lookup walks it in reverse.
pub(crate) fn builtin_rules() -> Vec<StructRuleFn> {
    vec![
        record_rule,
        typed_dict_rule,
        named_tuple_rule,
        dict_with_default_rule,
        sequence_with_default_rule,
        tuple_with_struct_rule,
    ]
}

/// Default for one declared field: attribute lookup on the incoming default,
/// then the field's own declared default, then missing. A propagating
/// `Missing` parent overrides everything.
fn resolve_field_default(
    parent: &FieldDefault,
    parent_lookup: impl Fn(&str) -> Option<Value>,
    name: &str,
    declared: &FieldDefault,
    fallback: FieldDefault,
) -> FieldDefault {
    if matches!(parent, FieldDefault::Missing) {
        return FieldDefault::Missing;
    }
    if let FieldDefault::Value(_) = parent {
        if let Some(value) = parent_lookup(name) {
            return FieldDefault::Value(value);
        }
    }
    match declared {
        FieldDefault::Value(v) => FieldDefault::Value(v.clone()),
        FieldDefault::ExcludeFromCall => FieldDefault::ExcludeFromCall,
        FieldDefault::Missing => FieldDefault::Missing,
        FieldDefault::MissingNonprop => fallback,
    }
}

fn record_like_fields(info: &StructTypeInfo, schema: &Rc<crate::schema::StructSchema>) -> Vec<StructFieldSpec> {
    let default = info.default.clone();
    schema
        .fields
        .iter()
        .map(|field| {
            let resolved = resolve_field_default(
                &default,
                |name| {
                    default
                        .as_value()
                        .and_then(Value::as_struct)
                        .and_then(|sv| sv.get(name).cloned())
                },
                &field.name,
                &field.default,
                FieldDefault::MissingNonprop,
            );
            StructFieldSpec {
                name: field.name.clone(),
                ty: field.ty.clone(),
                default: resolved,
                help: field.help.clone(),
                call_name: field.call_name.clone(),
                mode: field.mode,
            }
        })
        .collect()
}

fn record_rule(info: &StructTypeInfo, _registry: &Registry) -> Option<StructSpec> {
    let schema = match &info.norm.ty {
        TypeExpr::Struct(schema) if matches!(schema.kind, StructKind::Record) => schema.clone(),
        _ => return None,
    };
    let fields = record_like_fields(info, &schema);
    let ctor = schema.clone();
    Some(StructSpec::new(
        schema.name.clone(),
        schema.doc.clone(),
        fields,
        move |args| {
            let mut out = Vec::with_capacity(ctor.fields.len());
            let mut positional = args.positional.iter();
            for field in &ctor.fields {
                let call_name = field.call_name.as_deref().unwrap_or(&field.name);
                let value = match field.mode {
                    CallMode::Keyword | CallMode::UnpackKwargs => args.get(call_name).cloned(),
                    CallMode::Positional | CallMode::UnpackArgs => positional.next().cloned(),
                };
                match value {
                    Some(value) => out.push((field.name.clone(), value)),
                    None => {
                        return Err(format!(
                            "missing argument `{}` for {}",
                            call_name, ctor.name
                        ))
                    }
                }
            }
            Ok(Value::record(&ctor.name, out))
        },
    ))
}

fn named_tuple_rule(info: &StructTypeInfo, _registry: &Registry) -> Option<StructSpec> {
    let schema = match &info.norm.ty {
        TypeExpr::Struct(schema) if matches!(schema.kind, StructKind::NamedTuple) => schema.clone(),
        _ => return None,
    };
    // identical field shape to a record; only the declaration flavor differs
    let fields = record_like_fields(info, &schema);
    let ctor = schema.clone();
    Some(StructSpec::new(
        schema.name.clone(),
        schema.doc.clone(),
        fields,
        move |args| {
            let mut out = Vec::with_capacity(ctor.fields.len());
            for field in &ctor.fields {
                let call_name = field.call_name.as_deref().unwrap_or(&field.name);
                match args.get(call_name) {
                    Some(value) => out.push((field.name.clone(), value.clone())),
                    None => {
                        return Err(format!(
                            "missing argument `{}` for {}",
                            call_name, ctor.name
                        ))
                    }
                }
            }
            Ok(Value::record(&ctor.name, out))
        },
    ))
}

fn typed_dict_rule(info: &StructTypeInfo, _registry: &Registry) -> Option<StructSpec> {
    let (schema, total) = match &info.norm.ty {
        TypeExpr::Struct(schema) => match schema.kind {
            StructKind::TypedDict { total } => (schema.clone(), total),
            _ => return None,
        },
        _ => return None,
    };
    let default = info.default.clone();
    let fields = schema
        .fields
        .iter()
        .map(|field| {
            // unset optional keys disappear from the constructed dict
            let fallback = if !total || field.not_required {
                FieldDefault::ExcludeFromCall
            } else {
                FieldDefault::MissingNonprop
            };
            let resolved = resolve_field_default(
                &default,
                |name| match default.as_value() {
                    Some(Value::Map(pairs)) => pairs.iter().find_map(|(k, v)| {
                        (k.as_str() == Some(name)).then(|| v.clone())
                    }),
                    _ => None,
                },
                &field.name,
                &field.default,
                fallback,
            );
            StructFieldSpec {
                name: field.name.clone(),
                ty: field.ty.clone(),
                default: resolved,
                help: field.help.clone(),
                call_name: field.call_name.clone(),
                mode: field.mode,
            }
        })
        .collect();
    let ctor = schema.clone();
    Some(StructSpec::new(
        schema.name.clone(),
        schema.doc.clone(),
        fields,
        move |args| {
            let mut out = Vec::new();
            for field in &ctor.fields {
                let call_name = field.call_name.as_deref().unwrap_or(&field.name);
                if let Some(value) = args.get(call_name) {
                    out.push((Value::Str(field.name.clone()), value.clone()));
                }
            }
            Ok(Value::Map(out))
        },
    ))
}

fn dict_with_default_rule(info: &StructTypeInfo, _registry: &Registry) -> Option<StructSpec> {
    let value_ty = match &info.norm.ty {
        TypeExpr::Map(_, v) => (**v).clone(),
        _ => return None,
    };
    let pairs = match info.default.as_value() {
        Some(Value::Map(pairs)) if !pairs.is_empty() => pairs.clone(),
        _ => return None,
    };

    let fields = pairs
        .iter()
        .map(|(key, value)| {
            let ty = match &value_ty {
                TypeExpr::Any => infer_type(value),
                declared => declared.clone(),
            };
            StructFieldSpec {
                name: key.to_string(),
                ty,
                default: FieldDefault::Value(value.clone()),
                help: None,
                call_name: None,
                mode: CallMode::Keyword,
            }
        })
        .collect();

    let keys: Vec<Value> = pairs.iter().map(|(k, _)| k.clone()).collect();
    Some(StructSpec::new(
        "dict",
        None,
        fields,
        move |args| {
            let mut out = Vec::with_capacity(keys.len());
            for key in &keys {
                let name = key.to_string();
                match args.get(&name) {
                    Some(value) => out.push((key.clone(), value.clone())),
                    None => return Err(format!("missing argument `{}` for dict", name)),
                }
            }
            Ok(Value::Map(out))
        },
    ))
}

fn struct_element(registry: &Registry, info: &StructTypeInfo, ty: &TypeExpr, value: Option<&Value>) -> bool {
    let norm = info.norm.normalize_child(ty);
    let probe = StructTypeInfo {
        norm,
        default: match value {
            Some(v) => FieldDefault::Value(v.clone()),
            None => FieldDefault::MissingNonprop,
        },
        path: info.path.clone(),
    };
    registry.get_struct_spec(&probe).is_some()
}

fn sequence_with_default_rule(info: &StructTypeInfo, registry: &Registry) -> Option<StructSpec> {
    let element_ty = match &info.norm.ty {
        TypeExpr::List(e) | TypeExpr::VarTuple(e) => (**e).clone(),
        _ => return None,
    };
    let elements = match info.default.as_value() {
        Some(Value::List(xs)) | Some(Value::Tuple(xs)) if !xs.is_empty() => xs.clone(),
        _ => return None,
    };
    // only applies when the elements decompose into structs themselves
    if !elements
        .iter()
        .any(|x| struct_element(registry, info, &element_ty, Some(x)))
    {
        return None;
    }

    let fields: Vec<StructFieldSpec> = elements
        .iter()
        .enumerate()
        .map(|(ix, element)| {
            let ty = match &element_ty {
                TypeExpr::Any => infer_type(element),
                declared => declared.clone(),
            };
            StructFieldSpec {
                name: ix.to_string(),
                ty,
                default: FieldDefault::Value(element.clone()),
                help: None,
                call_name: None,
                mode: CallMode::Keyword,
            }
        })
        .collect();

    let as_tuple = matches!(info.norm.ty, TypeExpr::VarTuple(_));
    let count = fields.len();
    Some(StructSpec::new(
        if as_tuple { "tuple" } else { "list" },
        None,
        fields,
        move |args| {
            let mut out = Vec::with_capacity(count);
            for ix in 0..count {
                match args.get(&ix.to_string()) {
                    Some(value) => out.push(value.clone()),
                    None => return Err(format!("missing element {}", ix)),
                }
            }
            if as_tuple {
                Ok(Value::Tuple(out))
            } else {
                Ok(Value::List(out))
            }
        },
    ))
}

fn tuple_with_struct_rule(info: &StructTypeInfo, registry: &Registry) -> Option<StructSpec> {
    let members = match &info.norm.ty {
        TypeExpr::Tuple(members) => members.clone(),
        _ => return None,
    };
    if !members
        .iter()
        .any(|m| struct_element(registry, info, m, None))
    {
        return None;
    }

    let defaults: Vec<FieldDefault> = match info.default.as_value() {
        Some(Value::Tuple(xs)) if xs.len() == members.len() => {
            xs.iter().map(|x| FieldDefault::Value(x.clone())).collect()
        }
        _ if matches!(info.default, FieldDefault::Missing) => {
            vec![FieldDefault::Missing; members.len()]
        }
        _ => vec![FieldDefault::MissingNonprop; members.len()],
    };

    let fields: Vec<StructFieldSpec> = members
        .iter()
        .zip(defaults)
        .enumerate()
        .map(|(ix, (ty, default))| StructFieldSpec {
            name: ix.to_string(),
            ty: ty.clone(),
            default,
            help: None,
            call_name: None,
            mode: CallMode::Keyword,
        })
        .collect();

    let count = fields.len();
    Some(StructSpec::new("tuple", None, fields, move |args| {
        let mut out = Vec::with_capacity(count);
        for ix in 0..count {
            match args.get(&ix.to_string()) {
                Some(value) => out.push(value.clone()),
                None => return Err(format!("missing element {}", ix)),
            }
        }
        Ok(Value::Tuple(out))
    }))
}
