//! Runtime values produced by instantiators.
//!
//! Every primitive and struct constructor ultimately yields a [`Value`].
//! Equality is structural except for enum members, which compare by enum name
//! and member name.

use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::isodate;
use crate::schema::EnumSchema;

/// A parsed runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The unit value, spelled `None` on the command line.
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Path(PathBuf),
    Date(isodate::Date),
    Time(isodate::Time),
    DateTime(isodate::DateTime),
    /// A member of a declared enum.
    Variant(Variant),
    List(Vec<Value>),
    /// An ordered set; duplicates are removed on construction.
    Set(Vec<Value>),
    Tuple(Vec<Value>),
    /// An insertion-ordered mapping.
    Map(Vec<(Value, Value)>),
    /// An instance of a record schema.
    Struct(Rc<StructValue>),
}

/// A reference to one member of an [`EnumSchema`].
#[derive(Clone)]
pub struct Variant {
    pub decl: Rc<EnumSchema>,
    pub index: usize,
}

impl Variant {
    pub fn name(&self) -> &str {
        &self.decl.members[self.index].0
    }

    pub fn value(&self) -> &Value {
        &self.decl.members[self.index].1
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        self.decl.name == other.decl.name && self.name() == other.name()
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.decl.name, self.name())
    }
}

/// An instance of a record: the schema name plus one value per field, in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub name: String,
    pub fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }
}

impl Value {
    /// Build a record instance.
    pub fn record<I, S>(name: &str, fields: I) -> Value
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Struct(Rc::new(StructValue {
            name: name.to_string(),
            fields: fields.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }))
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(sv) => Some(sv),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}
impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Command-line spelling of a value, matching what the instantiators accept:
/// booleans are `True`/`False`, the unit value is `None`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Value::Path(p) => f.write_str(&p.display().to_string()),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::Variant(v) => f.write_str(v.name()),
            Value::List(xs) | Value::Set(xs) | Value::Tuple(xs) => {
                for (ix, x) in xs.iter().enumerate() {
                    if ix > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", x)?;
                }
                Ok(())
            }
            Value::Map(pairs) => {
                for (ix, (k, v)) in pairs.iter().enumerate() {
                    if ix > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{} {}", k, v)?;
                }
                Ok(())
            }
            Value::Struct(sv) => {
                write!(f, "{}(", sv.name)?;
                for (ix, (n, v)) in sv.fields.iter().enumerate() {
                    if ix > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", n, v)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A field default, or one of the three sentinel singletons.
///
/// Sentinel comparison is by discriminant only; `Value` defaults compare
/// structurally. `Missing` propagates to children during field resolution,
/// `MissingNonprop` does not, and `ExcludeFromCall` omits the field from the
/// constructor call entirely when no value was supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    Missing,
    MissingNonprop,
    ExcludeFromCall,
    Value(Value),
}

impl FieldDefault {
    /// True for either missing sentinel.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldDefault::Missing | FieldDefault::MissingNonprop)
    }

    /// True for any of the three sentinels.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, FieldDefault::Value(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldDefault::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for FieldDefault {
    fn from(v: Value) -> Self {
        FieldDefault::Value(v)
    }
}
