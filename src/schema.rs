//! Declared types as data.
//!
//! The parser is driven by a [`TypeExpr`] tree instead of reflected type
//! annotations: records with typed fields, tagged unions, sequences, maps,
//! literals, optionals and primitives. Annotation wrappers attach
//! [`Marker`]s and per-field configuration to any node.

use std::rc::Rc;

use crate::markers::{Marker, MarkerSet};
use crate::value::{FieldDefault, Value};

/// A declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Matches anything; narrowed from defaults during field resolution.
    Any,
    /// The unit type, spelled `None` on the command line.
    NoneType,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    Path,
    Date,
    Time,
    DateTime,
    Enum(Rc<EnumSchema>),
    /// A fixed set of allowed values.
    Literal(Vec<Value>),
    Union(Vec<TypeExpr>),
    /// Fixed-length tuple.
    Tuple(Vec<TypeExpr>),
    /// Variable-length tuple of one element type.
    VarTuple(Box<TypeExpr>),
    List(Box<TypeExpr>),
    Set(Box<TypeExpr>),
    Deque(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Struct(Rc<StructSchema>),
    /// One layer of annotation: markers and configuration metadata.
    Annotated(Box<AnnotatedType>),
    /// A named wrapper around another type; the name seeds subcommand names.
    Alias(Rc<AliasType>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedType {
    pub inner: TypeExpr,
    pub markers: MarkerSet,
    pub conf: Vec<ConfItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasType {
    pub name: String,
    pub inner: TypeExpr,
}

/// A declared enumeration. A member whose value repeats an earlier member's
/// value is an alias and is skipped when matching by value.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub name: String,
    pub members: Vec<(String, Value)>,
}

impl EnumSchema {
    pub fn new<S, I, N>(name: S, members: I) -> Rc<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (N, Value)>,
        N: Into<String>,
    {
        Rc::new(EnumSchema {
            name: name.into(),
            members: members.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        })
    }

    /// True when the member at `index` has the same value as an earlier one.
    pub(crate) fn is_alias(&self, index: usize) -> bool {
        let value = &self.members[index].1;
        self.members[..index].iter().any(|(_, v)| v == value)
    }
}

/// How a resolved field is passed to its constructor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CallMode {
    Keyword,
    Positional,
    UnpackArgs,
    UnpackKwargs,
}

/// What flavor of record a [`StructSchema`] declares.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StructKind {
    /// A record instantiated into a [`Value::Struct`].
    Record,
    /// A tuple with named fields; instantiated into a [`Value::Struct`].
    NamedTuple,
    /// A keyword-typed dictionary; instantiated into a [`Value::Map`] with
    /// string keys. When `total` is false every field may be omitted.
    TypedDict { total: bool },
}

/// A record declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct StructSchema {
    pub name: String,
    pub kind: StructKind,
    pub doc: Option<String>,
    pub fields: Vec<FieldSchema>,
}

/// One declared field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub ty: TypeExpr,
    pub default: FieldDefault,
    pub help: Option<String>,
    /// Name used in the constructor call when it differs from `name`.
    pub call_name: Option<String>,
    pub mode: CallMode,
    /// `TypedDict` fields marked not-required may be omitted from the
    /// constructed map entirely.
    pub not_required: bool,
}

impl FieldSchema {
    pub fn new<S: Into<String>>(name: S, ty: TypeExpr) -> Self {
        FieldSchema {
            name: name.into(),
            ty,
            default: FieldDefault::MissingNonprop,
            help: None,
            call_name: None,
            mode: CallMode::Keyword,
            not_required: false,
        }
    }

    #[must_use]
    pub fn default<V: Into<FieldDefault>>(mut self, default: V) -> Self {
        self.default = default.into();
        self
    }

    #[must_use]
    pub fn help<S: Into<String>>(mut self, help: S) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn call_name<S: Into<String>>(mut self, name: S) -> Self {
        self.call_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: CallMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn not_required(mut self) -> Self {
        self.not_required = true;
        self
    }
}

impl StructSchema {
    pub fn new<S: Into<String>>(name: S) -> Self {
        StructSchema {
            name: name.into(),
            kind: StructKind::Record,
            doc: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: StructKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn doc<S: Into<String>>(mut self, doc: S) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn into_type(self) -> TypeExpr {
        TypeExpr::Struct(Rc::new(self))
    }
}

impl From<StructSchema> for TypeExpr {
    fn from(s: StructSchema) -> Self {
        s.into_type()
    }
}

/// Per-field configuration attached through an annotation wrapper.
///
/// When several entries target the same field the one closest to the leaf
/// wins, attribute by attribute.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgConf {
    pub name: Option<String>,
    pub metavar: Option<String>,
    pub help: Option<String>,
    pub aliases: Vec<String>,
    pub prefix_name: Option<bool>,
}

impl ArgConf {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn metavar<S: Into<String>>(mut self, metavar: S) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    #[must_use]
    pub fn help<S: Into<String>>(mut self, help: S) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn alias<S: Into<String>>(mut self, alias: S) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn prefix_name(mut self, prefix: bool) -> Self {
        self.prefix_name = Some(prefix);
        self
    }

    /// Overwrite the non-empty attributes of `self` with those of `other`.
    pub(crate) fn merge(&mut self, other: &ArgConf) {
        if other.name.is_some() {
            self.name.clone_from(&other.name);
        }
        if other.metavar.is_some() {
            self.metavar.clone_from(&other.metavar);
        }
        if other.help.is_some() {
            self.help.clone_from(&other.help);
        }
        if !other.aliases.is_empty() {
            self.aliases.clone_from(&other.aliases);
        }
        if other.prefix_name.is_some() {
            self.prefix_name = other.prefix_name;
        }
    }
}

/// Configuration for one branch of a tagged union.
#[derive(Debug, Clone, PartialEq)]
pub struct SubcommandConf {
    pub name: Option<String>,
    pub default: Option<Value>,
    pub description: Option<String>,
    pub prefix_name: bool,
}

impl SubcommandConf {
    pub fn new() -> Self {
        SubcommandConf {
            name: None,
            default: None,
            description: None,
            prefix_name: true,
        }
    }

    #[must_use]
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn prefix_name(mut self, prefix: bool) -> Self {
        self.prefix_name = prefix;
        self
    }
}

impl Default for SubcommandConf {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments sharing one group are mutually exclusive; when `required`,
/// exactly one of them must appear. Handles compare by identity.
#[derive(Debug)]
pub struct MutexGroupConfig {
    pub required: bool,
    pub title: Option<String>,
}

impl MutexGroupConfig {
    pub fn new(required: bool) -> Rc<Self> {
        Rc::new(MutexGroupConfig {
            required,
            title: None,
        })
    }

    pub fn titled<S: Into<String>>(required: bool, title: S) -> Rc<Self> {
        Rc::new(MutexGroupConfig {
            required,
            title: Some(title.into()),
        })
    }
}

/// Non-marker metadata carried by an annotation wrapper.
#[derive(Debug, Clone)]
pub enum ConfItem {
    Arg(ArgConf),
    Subcommand(SubcommandConf),
    Mutex(Rc<MutexGroupConfig>),
}

impl PartialEq for ConfItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConfItem::Arg(a), ConfItem::Arg(b)) => a == b,
            (ConfItem::Subcommand(a), ConfItem::Subcommand(b)) => a == b,
            (ConfItem::Mutex(a), ConfItem::Mutex(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl TypeExpr {
    /// Wrap in an annotation layer carrying markers.
    #[must_use]
    pub fn annotated<I: IntoIterator<Item = Marker>>(self, markers: I) -> TypeExpr {
        TypeExpr::Annotated(Box::new(AnnotatedType {
            inner: self,
            markers: markers.into_iter().collect(),
            conf: Vec::new(),
        }))
    }

    /// Wrap in an annotation layer carrying configuration metadata. Each
    /// call adds a layer; the innermost layer wins when entries merge.
    #[must_use]
    pub fn with_conf(self, conf: ConfItem) -> TypeExpr {
        TypeExpr::Annotated(Box::new(AnnotatedType {
            inner: self,
            markers: MarkerSet::EMPTY,
            conf: vec![conf],
        }))
    }

    /// Give the type a name; the name seeds auto-generated subcommand names.
    #[must_use]
    pub fn aliased<S: Into<String>>(self, name: S) -> TypeExpr {
        TypeExpr::Alias(Rc::new(AliasType {
            name: name.into(),
            inner: self,
        }))
    }

    /// `Optional[T]`, expressed as a union with the unit type.
    #[must_use]
    pub fn optional(self) -> TypeExpr {
        TypeExpr::Union(vec![TypeExpr::NoneType, self])
    }

    #[must_use]
    pub fn list(element: TypeExpr) -> TypeExpr {
        TypeExpr::List(Box::new(element))
    }

    #[must_use]
    pub fn set(element: TypeExpr) -> TypeExpr {
        TypeExpr::Set(Box::new(element))
    }

    #[must_use]
    pub fn var_tuple(element: TypeExpr) -> TypeExpr {
        TypeExpr::VarTuple(Box::new(element))
    }

    #[must_use]
    pub fn map(key: TypeExpr, value: TypeExpr) -> TypeExpr {
        TypeExpr::Map(Box::new(key), Box::new(value))
    }

    /// A short display name used in error messages.
    pub fn describe(&self) -> String {
        match self {
            TypeExpr::Any => "Any".to_string(),
            TypeExpr::NoneType => "None".to_string(),
            TypeExpr::Bool => "bool".to_string(),
            TypeExpr::Int => "int".to_string(),
            TypeExpr::Float => "float".to_string(),
            TypeExpr::Str => "str".to_string(),
            TypeExpr::Bytes => "bytes".to_string(),
            TypeExpr::Path => "Path".to_string(),
            TypeExpr::Date => "date".to_string(),
            TypeExpr::Time => "time".to_string(),
            TypeExpr::DateTime => "datetime".to_string(),
            TypeExpr::Enum(e) => e.name.clone(),
            TypeExpr::Literal(vals) => {
                let parts: Vec<String> = vals.iter().map(|v| v.to_string()).collect();
                format!("Literal[{}]", parts.join(", "))
            }
            TypeExpr::Union(opts) => {
                let parts: Vec<String> = opts.iter().map(TypeExpr::describe).collect();
                parts.join(" | ")
            }
            TypeExpr::Tuple(ts) => {
                let parts: Vec<String> = ts.iter().map(TypeExpr::describe).collect();
                format!("tuple[{}]", parts.join(", "))
            }
            TypeExpr::VarTuple(t) => format!("tuple[{}, ...]", t.describe()),
            TypeExpr::List(t) => format!("list[{}]", t.describe()),
            TypeExpr::Set(t) => format!("set[{}]", t.describe()),
            TypeExpr::Deque(t) => format!("deque[{}]", t.describe()),
            TypeExpr::Map(k, v) => format!("dict[{}, {}]", k.describe(), v.describe()),
            TypeExpr::Struct(s) => s.name.clone(),
            TypeExpr::Annotated(a) => a.inner.describe(),
            TypeExpr::Alias(a) => a.name.clone(),
        }
    }
}

/// Structural check: does `value` inhabit `ty`?
pub(crate) fn type_accepts(ty: &TypeExpr, value: &Value) -> bool {
    match ty {
        TypeExpr::Any => true,
        TypeExpr::NoneType => matches!(value, Value::None),
        TypeExpr::Bool => matches!(value, Value::Bool(_)),
        TypeExpr::Int => matches!(value, Value::Int(_)),
        // integer defaults are acceptable for float fields
        TypeExpr::Float => matches!(value, Value::Float(_) | Value::Int(_)),
        TypeExpr::Str => matches!(value, Value::Str(_)),
        TypeExpr::Bytes => matches!(value, Value::Bytes(_)),
        TypeExpr::Path => matches!(value, Value::Path(_)),
        TypeExpr::Date => matches!(value, Value::Date(_)),
        TypeExpr::Time => matches!(value, Value::Time(_)),
        TypeExpr::DateTime => matches!(value, Value::DateTime(_)),
        TypeExpr::Enum(e) => match value {
            Value::Variant(v) => v.decl.name == e.name,
            _ => false,
        },
        TypeExpr::Literal(vals) => vals.contains(value),
        TypeExpr::Union(opts) => opts.iter().any(|t| type_accepts(t, value)),
        TypeExpr::Tuple(ts) => match value {
            Value::Tuple(xs) => {
                xs.len() == ts.len() && ts.iter().zip(xs).all(|(t, x)| type_accepts(t, x))
            }
            _ => false,
        },
        TypeExpr::VarTuple(t) => match value {
            Value::Tuple(xs) => xs.iter().all(|x| type_accepts(t, x)),
            _ => false,
        },
        TypeExpr::List(t) | TypeExpr::Deque(t) => match value {
            Value::List(xs) => xs.iter().all(|x| type_accepts(t, x)),
            _ => false,
        },
        TypeExpr::Set(t) => match value {
            Value::Set(xs) => xs.iter().all(|x| type_accepts(t, x)),
            _ => false,
        },
        TypeExpr::Map(k, v) => match value {
            Value::Map(pairs) => pairs
                .iter()
                .all(|(key, val)| type_accepts(k, key) && type_accepts(v, val)),
            _ => false,
        },
        TypeExpr::Struct(schema) => match value {
            Value::Struct(sv) => {
                sv.name == schema.name
                    && sv.fields.iter().all(|(n, v)| {
                        schema
                            .fields
                            .iter()
                            .find(|f| &f.name == n)
                            .is_some_and(|f| type_accepts(&f.ty, v))
                    })
            }
            _ => false,
        },
        TypeExpr::Annotated(a) => type_accepts(&a.inner, value),
        TypeExpr::Alias(a) => type_accepts(&a.inner, value),
    }
}

/// Best-effort type of a runtime value, used to narrow `Any` and loose
/// container elements against observed defaults.
pub(crate) fn infer_type(value: &Value) -> TypeExpr {
    match value {
        Value::None => TypeExpr::NoneType,
        Value::Bool(_) => TypeExpr::Bool,
        Value::Int(_) => TypeExpr::Int,
        Value::Float(_) => TypeExpr::Float,
        Value::Str(_) => TypeExpr::Str,
        Value::Bytes(_) => TypeExpr::Bytes,
        Value::Path(_) => TypeExpr::Path,
        Value::Date(_) => TypeExpr::Date,
        Value::Time(_) => TypeExpr::Time,
        Value::DateTime(_) => TypeExpr::DateTime,
        Value::Variant(v) => TypeExpr::Enum(v.decl.clone()),
        Value::List(xs) => TypeExpr::List(Box::new(union_of_observed(xs))),
        Value::Set(xs) => TypeExpr::Set(Box::new(union_of_observed(xs))),
        Value::Tuple(xs) => TypeExpr::Tuple(xs.iter().map(infer_type).collect()),
        Value::Map(pairs) => {
            let keys: Vec<Value> = pairs.iter().map(|(k, _)| k.clone()).collect();
            let vals: Vec<Value> = pairs.iter().map(|(_, v)| v.clone()).collect();
            TypeExpr::Map(
                Box::new(union_of_observed(&keys)),
                Box::new(union_of_observed(&vals)),
            )
        }
        // a bare instance does not carry its schema; stay loose
        Value::Struct(_) => TypeExpr::Any,
    }
}

/// Union of the inferred element types, deduplicated; `Any` when empty.
pub(crate) fn union_of_observed(values: &[Value]) -> TypeExpr {
    let mut seen: Vec<TypeExpr> = Vec::new();
    for value in values {
        let ty = infer_type(value);
        if !seen.contains(&ty) {
            seen.push(ty);
        }
    }
    match seen.len() {
        0 => TypeExpr::Any,
        1 => seen.pop().unwrap_or(TypeExpr::Any),
        _ => TypeExpr::Union(seen),
    }
}
