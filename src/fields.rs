//! Field resolution: from a struct spec and a parent default to an ordered
//! list of fully-determined fields.
//!
//! After this pass there is no remaining ambiguity about names, defaults or
//! types: defaults are composed with the parent's (sentinel rules applied),
//! loose types are narrowed against observed defaults, per-field
//! configuration is merged, and optional-group membership is tagged.

use std::rc::Rc;

use tracing::warn;

use crate::error::SpecError;
use crate::markers::Marker;
use crate::normalize::NormalizedType;
use crate::schema::{
    infer_type, type_accepts, ArgConf, CallMode, ConfItem, MutexGroupConfig, TypeExpr,
};
use crate::strukt::StructSpec;
use crate::value::{FieldDefault, Value};

/// Helptext, either ready or deferred until help is actually rendered.
#[derive(Clone)]
pub enum Helptext {
    Inline(Option<String>),
    Thunk(Rc<dyn Fn() -> Option<String>>),
}

impl Helptext {
    pub fn resolve(&self) -> Option<String> {
        match self {
            Helptext::Inline(text) => text.clone(),
            Helptext::Thunk(thunk) => thunk(),
        }
    }
}

impl std::fmt::Debug for Helptext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Helptext::Inline(text) => f.debug_tuple("Inline").field(text).finish(),
            Helptext::Thunk(_) => f.write_str("Thunk(..)"),
        }
    }
}

/// One fully-resolved field, ready for the parser spec builder.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Internal name; joins into destination keys.
    pub intern_name: String,
    /// CLI-facing name; joins into flag names.
    pub extern_name: String,
    pub norm: NormalizedType,
    pub default: FieldDefault,
    pub help: Helptext,
    pub conf: ArgConf,
    pub mutex: Option<Rc<MutexGroupConfig>>,
    pub call_mode: CallMode,
    /// False when configuration opted out of path prefixing.
    pub prefix_name: bool,
}

impl FieldDefinition {
    pub(crate) fn in_optional_group(&self) -> bool {
        self.norm.has(Marker::OptionalGroup)
    }
}

/// Resolve every field of `spec` against `parent_default`.
pub(crate) fn resolve_fields(
    spec: &StructSpec,
    parent_norm: &NormalizedType,
    parent_default: &FieldDefault,
    path: &str,
) -> Result<Vec<FieldDefinition>, SpecError> {
    let mut out = Vec::with_capacity(spec.fields.len());
    for field in &spec.fields {
        let field_path = if path.is_empty() {
            field.name.clone()
        } else {
            format!("{}.{}", path, field.name)
        };
        let mut norm = parent_norm.normalize_child(&field.ty);
        let default = field.default.clone();

        narrow(&mut norm, &default, &field_path)?;

        // all-or-nothing group: the parent supplied a whole-instance default
        // that carries no value for this field
        if let FieldDefault::Value(parent_value) = parent_default {
            let extractable = match parent_value {
                Value::Struct(sv) => sv.get(&field.name).is_some(),
                Value::Map(pairs) => pairs
                    .iter()
                    .any(|(k, _)| k.as_str() == Some(field.name.as_str())),
                _ => false,
            };
            if !extractable {
                norm.markers = norm.markers.with(Marker::OptionalGroup);
            }
        }
        match field.mode {
            CallMode::UnpackArgs => norm.markers = norm.markers.with(Marker::UnpackArgsCall),
            CallMode::UnpackKwargs => norm.markers = norm.markers.with(Marker::UnpackKwargsCall),
            CallMode::Keyword | CallMode::Positional => {}
        }

        let (conf, mutex) = merge_conf(&norm.conf);
        let extern_name = conf.name.clone().unwrap_or_else(|| field.name.clone());
        let prefix_name =
            conf.prefix_name.unwrap_or(true) && !norm.has(Marker::OmitArgPrefixes);

        let help = {
            let conf_help = conf.help.clone();
            let field_help = field.help.clone();
            let comments_off = norm.has(Marker::HelptextFromCommentsOff);
            Helptext::Thunk(Rc::new(move || {
                // schema-declared docs can be switched off; explicit
                // configuration text cannot
                conf_help.clone().or_else(|| {
                    if comments_off {
                        None
                    } else {
                        field_help.clone()
                    }
                })
            }))
        };

        out.push(FieldDefinition {
            intern_name: field.name.clone(),
            extern_name,
            norm,
            default,
            help,
            conf,
            mutex,
            call_mode: field.mode,
            prefix_name,
        });
    }
    Ok(out)
}

/// Narrow a declared type against its default, and reject defaults that
/// cannot inhabit the declared type at all.
fn narrow(
    norm: &mut NormalizedType,
    default: &FieldDefault,
    path: &str,
) -> Result<(), SpecError> {
    let value = match default {
        FieldDefault::Value(v) => v.clone(),
        _ => return Ok(()),
    };

    match &norm.ty {
        TypeExpr::Any => {
            norm.ty = infer_type(&value);
            return Ok(());
        }
        TypeExpr::Union(options) => {
            if !options.iter().any(|t| type_accepts(t, &value)) {
                let observed = infer_type(&value);
                if observed == TypeExpr::Any {
                    return Err(SpecError::InvalidDefault {
                        field: path.to_string(),
                        message: format!(
                            "default {} matches no option of {}",
                            value,
                            norm.ty.describe()
                        ),
                    });
                }
                warn!(
                    field = path,
                    observed = %observed.describe(),
                    "default type is not among the union options; extending the union"
                );
                let mut extended = options.clone();
                extended.push(observed);
                norm.ty = TypeExpr::Union(extended);
            }
            return Ok(());
        }
        _ => {}
    }

    // collections narrow their element type to what the default contains
    narrow_elements(&mut norm.ty, &value);

    if !type_accepts(&norm.ty, &value) {
        return Err(SpecError::InvalidDefault {
            field: path.to_string(),
            message: format!("default {} is not a {}", value, norm.ty.describe()),
        });
    }
    Ok(())
}

fn narrow_elements(ty: &mut TypeExpr, value: &Value) {
    match (ty, value) {
        (TypeExpr::List(e) | TypeExpr::Deque(e), Value::List(xs))
        | (TypeExpr::VarTuple(e), Value::Tuple(xs))
        | (TypeExpr::Set(e), Value::Set(xs)) => {
            if matches!(**e, TypeExpr::Any) && !xs.is_empty() {
                **e = crate::schema::union_of_observed(xs);
            }
        }
        (TypeExpr::Map(k, v), Value::Map(pairs)) if !pairs.is_empty() => {
            if matches!(**k, TypeExpr::Any) {
                let keys: Vec<Value> = pairs.iter().map(|(key, _)| key.clone()).collect();
                **k = crate::schema::union_of_observed(&keys);
            }
            if matches!(**v, TypeExpr::Any) {
                let vals: Vec<Value> = pairs.iter().map(|(_, val)| val.clone()).collect();
                **v = crate::schema::union_of_observed(&vals);
            }
        }
        _ => {}
    }
}

/// Merge configuration entries; on each attribute the entry closest to the
/// leaf (last in normalization order) wins.
fn merge_conf(items: &[ConfItem]) -> (ArgConf, Option<Rc<MutexGroupConfig>>) {
    let mut conf = ArgConf::default();
    let mut mutex = None;
    for item in items {
        match item {
            ConfItem::Arg(arg) => conf.merge(arg),
            ConfItem::Subcommand(_) => {}
            ConfItem::Mutex(group) => mutex = Some(group.clone()),
        }
    }
    (conf, mutex)
}
