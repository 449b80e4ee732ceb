//! Built-in primitive constructor rules.
//!
//! A primitive spec describes how one leaf type is parsed from string
//! tokens: how many tokens it wants, what the help metavar looks like, an
//! optional fixed choice set, and the instantiator itself. Composite rules
//! (tuples, sequences, maps, unions, literals) build on the specs of their
//! inner types, falling back to the backtracking parser when inner arities
//! are ambiguous.

use std::path::PathBuf;
use std::rc::Rc;

use crate::backtrack::parse_with_backtracking;
use crate::markers::Marker;
use crate::names::{join_union_metavars, multi_metavar_from_single};
use crate::registry::{PrimitiveRuleFn, PrimitiveTypeInfo, Registry};
use crate::schema::TypeExpr;
use crate::value::Value;

/// Token arity of a primitive spec.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Nargs {
    Fixed(usize),
    /// Any number of tokens; resolved greedily, longest first.
    Star,
}

/// Special consumption behaviour for an argument.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Action {
    /// The argument may be repeated; values accumulate.
    Append,
    /// The argument's value is its number of occurrences.
    Count,
    /// Zero-arity flag storing `true`.
    StoreTrue,
    /// Zero-arity flag storing `false`.
    StoreFalse,
    /// A `--flag`/`--no-flag` pair.
    BooleanOptional,
}

/// Shell-completion hint carried through to the completion spec.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum CompletionHint {
    #[default]
    Default,
    /// Complete filesystem paths.
    Path,
}

type Instantiator = Rc<dyn Fn(&[String]) -> Result<Value, String>>;
type Predicate = Rc<dyn Fn(&Value) -> bool>;
type Printer = Rc<dyn Fn(&Value) -> Option<Vec<String>>>;

/// How to turn string tokens into one value, and back.
///
/// Guarantees: `instantiate(print(v))` reproduces `v` whenever the instance
/// predicate holds for `v`, and every token accepted by `instantiate` appears
/// in `choices` when a choice set is present.
#[derive(Clone)]
pub struct PrimitiveSpec {
    pub nargs: Nargs,
    pub metavar: String,
    pub choices: Option<Vec<String>>,
    pub action: Option<Action>,
    pub completion: CompletionHint,
    instantiator: Instantiator,
    predicate: Predicate,
    printer: Printer,
}

impl std::fmt::Debug for PrimitiveSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimitiveSpec")
            .field("nargs", &self.nargs)
            .field("metavar", &self.metavar)
            .field("choices", &self.choices)
            .field("action", &self.action)
            .finish()
    }
}

impl PrimitiveSpec {
    pub fn new(
        nargs: Nargs,
        metavar: impl Into<String>,
        instantiator: impl Fn(&[String]) -> Result<Value, String> + 'static,
        predicate: impl Fn(&Value) -> bool + 'static,
        printer: impl Fn(&Value) -> Option<Vec<String>> + 'static,
    ) -> Self {
        PrimitiveSpec {
            nargs,
            metavar: metavar.into(),
            choices: None,
            action: None,
            completion: CompletionHint::Default,
            instantiator: Rc::new(instantiator),
            predicate: Rc::new(predicate),
            printer: Rc::new(printer),
        }
    }

    /// A one-token spec.
    pub fn scalar(
        metavar: impl Into<String>,
        instantiator: impl Fn(&[String]) -> Result<Value, String> + 'static,
        predicate: impl Fn(&Value) -> bool + 'static,
        printer: impl Fn(&Value) -> Option<Vec<String>> + 'static,
    ) -> Self {
        PrimitiveSpec::new(Nargs::Fixed(1), metavar, instantiator, predicate, printer)
    }

    #[must_use]
    pub fn with_choices(mut self, choices: Vec<String>) -> Self {
        self.choices = Some(choices);
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn with_completion(mut self, completion: CompletionHint) -> Self {
        self.completion = completion;
        self
    }

    /// Run the instantiator after arity and choice checks.
    pub fn instantiate(&self, tokens: &[String]) -> Result<Value, String> {
        if let Nargs::Fixed(k) = self.nargs {
            if tokens.len() != k {
                return Err(format!(
                    "expected {} value{}, got {}",
                    k,
                    if k == 1 { "" } else { "s" },
                    tokens.len()
                ));
            }
        }
        if let Some(choices) = &self.choices {
            for token in tokens {
                if !choices.contains(token) {
                    return Err(format!(
                        "invalid choice {:?} (choose from {{{}}})",
                        token,
                        choices.join(",")
                    ));
                }
            }
        }
        (self.instantiator)(tokens)
    }

    pub fn is_instance(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }

    /// Tokens that would reproduce `value`, when the value is printable.
    pub fn print(&self, value: &Value) -> Option<Vec<String>> {
        (self.printer)(value)
    }
}

/// The default rule set, in registration order; lookup walks it in reverse.
pub(crate) fn builtin_rules() -> Vec<PrimitiveRuleFn> {
    vec![
        basics_rule,
        bool_rule,
        none_rule,
        path_rule,
        enum_rule,
        datetime_rule,
        tuple_rule,
        sequence_rule,
        dict_rule,
        literal_rule,
        union_rule,
    ]
}

fn child_spec(
    info: &PrimitiveTypeInfo,
    registry: &Registry,
    child: &TypeExpr,
) -> Option<PrimitiveSpec> {
    let norm = info.norm.normalize_child(child);
    registry
        .get_primitive_spec(&PrimitiveTypeInfo {
            norm,
            field_name: info.field_name.clone(),
        })
        .ok()
}

fn basics_rule(info: &PrimitiveTypeInfo, _registry: &Registry) -> Option<PrimitiveSpec> {
    match info.norm.ty {
        TypeExpr::Int => Some(PrimitiveSpec::scalar(
            "INT",
            |tokens| {
                tokens[0]
                    .parse()
                    .map(Value::Int)
                    .map_err(|_| format!("{:?} is not an integer", tokens[0]))
            },
            |v| matches!(v, Value::Int(_)),
            |v| match v {
                Value::Int(i) => Some(vec![i.to_string()]),
                _ => None,
            },
        )),
        TypeExpr::Float => Some(PrimitiveSpec::scalar(
            "FLOAT",
            |tokens| {
                tokens[0]
                    .parse()
                    .map(Value::Float)
                    .map_err(|_| format!("{:?} is not a float", tokens[0]))
            },
            |v| matches!(v, Value::Float(_) | Value::Int(_)),
            |v| match v {
                Value::Float(x) => Some(vec![x.to_string()]),
                Value::Int(i) => Some(vec![i.to_string()]),
                _ => None,
            },
        )),
        TypeExpr::Str => Some(PrimitiveSpec::scalar(
            "STR",
            |tokens| Ok(Value::Str(tokens[0].clone())),
            |v| matches!(v, Value::Str(_)),
            |v| match v {
                Value::Str(s) => Some(vec![s.clone()]),
                _ => None,
            },
        )),
        TypeExpr::Bytes => Some(PrimitiveSpec::scalar(
            "BYTES",
            |tokens| Ok(Value::Bytes(tokens[0].clone().into_bytes())),
            |v| matches!(v, Value::Bytes(_)),
            |v| match v {
                Value::Bytes(b) => String::from_utf8(b.clone()).ok().map(|s| vec![s]),
                _ => None,
            },
        )),
        _ => None,
    }
}

fn bool_rule(info: &PrimitiveTypeInfo, _registry: &Registry) -> Option<PrimitiveSpec> {
    match info.norm.ty {
        TypeExpr::Bool => Some(
            PrimitiveSpec::scalar(
                "{True,False}",
                |tokens| match tokens[0].as_str() {
                    "True" => Ok(Value::Bool(true)),
                    "False" => Ok(Value::Bool(false)),
                    other => Err(format!("{:?} is not one of True, False", other)),
                },
                |v| matches!(v, Value::Bool(_)),
                |v| match v {
                    Value::Bool(b) => Some(vec![if *b { "True" } else { "False" }.to_string()]),
                    _ => None,
                },
            )
            .with_choices(vec!["True".to_string(), "False".to_string()]),
        ),
        _ => None,
    }
}

fn none_rule(info: &PrimitiveTypeInfo, _registry: &Registry) -> Option<PrimitiveSpec> {
    match info.norm.ty {
        TypeExpr::NoneType => Some(
            PrimitiveSpec::scalar(
                "{None}",
                |_tokens| Ok(Value::None),
                |v| matches!(v, Value::None),
                |v| match v {
                    Value::None => Some(vec!["None".to_string()]),
                    _ => None,
                },
            )
            .with_choices(vec!["None".to_string()]),
        ),
        _ => None,
    }
}

fn path_rule(info: &PrimitiveTypeInfo, _registry: &Registry) -> Option<PrimitiveSpec> {
    match info.norm.ty {
        TypeExpr::Path => Some(
            PrimitiveSpec::scalar(
                "PATH",
                |tokens| Ok(Value::Path(PathBuf::from(&tokens[0]))),
                |v| matches!(v, Value::Path(_)),
                |v| match v {
                    Value::Path(p) => Some(vec![p.display().to_string()]),
                    _ => None,
                },
            )
            .with_completion(CompletionHint::Path),
        ),
        _ => None,
    }
}

fn enum_rule(info: &PrimitiveTypeInfo, _registry: &Registry) -> Option<PrimitiveSpec> {
    let decl = match &info.norm.ty {
        TypeExpr::Enum(decl) => decl.clone(),
        _ => return None,
    };
    let by_value = info.norm.has(Marker::EnumChoicesFromValues);

    // one token per member; aliases are skipped when matching by value so
    // the first declaration wins
    let mut choices = Vec::new();
    let mut lookup: Vec<(String, usize)> = Vec::new();
    for (ix, (name, value)) in decl.members.iter().enumerate() {
        if by_value {
            if decl.is_alias(ix) {
                continue;
            }
            let token = value.to_string();
            choices.push(token.clone());
            lookup.push((token, ix));
        } else {
            choices.push(name.clone());
            lookup.push((name.clone(), ix));
        }
    }
    let metavar = format!("{{{}}}", choices.join(","));

    let decl_inst = decl.clone();
    let lookup_inst = lookup;
    let decl_pred = decl.clone();
    let decl_print = decl;
    Some(
        PrimitiveSpec::scalar(
            metavar,
            move |tokens| {
                let token = &tokens[0];
                match lookup_inst.iter().find(|(t, _)| t == token) {
                    Some((_, ix)) => Ok(Value::Variant(crate::value::Variant {
                        decl: decl_inst.clone(),
                        index: *ix,
                    })),
                    None => Err(format!("{:?} is not a member of {}", token, decl_inst.name)),
                }
            },
            move |v| match v {
                Value::Variant(variant) => variant.decl.name == decl_pred.name,
                _ => false,
            },
            move |v| match v {
                Value::Variant(variant) if variant.decl.name == decl_print.name => {
                    if by_value {
                        Some(vec![variant.value().to_string()])
                    } else {
                        Some(vec![variant.name().to_string()])
                    }
                }
                _ => None,
            },
        )
        .with_choices(choices),
    )
}

fn datetime_rule(info: &PrimitiveTypeInfo, _registry: &Registry) -> Option<PrimitiveSpec> {
    match info.norm.ty {
        TypeExpr::Date => Some(PrimitiveSpec::scalar(
            "YYYY-MM-DD",
            |tokens| tokens[0].parse().map(Value::Date),
            |v| matches!(v, Value::Date(_)),
            |v| match v {
                Value::Date(d) => Some(vec![d.to_string()]),
                _ => None,
            },
        )),
        TypeExpr::Time => Some(PrimitiveSpec::scalar(
            "HH:MM:SS",
            |tokens| tokens[0].parse().map(Value::Time),
            |v| matches!(v, Value::Time(_)),
            |v| match v {
                Value::Time(t) => Some(vec![t.to_string()]),
                _ => None,
            },
        )),
        TypeExpr::DateTime => Some(PrimitiveSpec::scalar(
            "YYYY-MM-DD[THH:MM:SS]",
            |tokens| tokens[0].parse().map(Value::DateTime),
            |v| matches!(v, Value::DateTime(_)),
            |v| match v {
                Value::DateTime(dt) => Some(vec![dt.to_string()]),
                _ => None,
            },
        )),
        _ => None,
    }
}

fn tuple_rule(info: &PrimitiveTypeInfo, registry: &Registry) -> Option<PrimitiveSpec> {
    let members = match &info.norm.ty {
        TypeExpr::Tuple(members) => members.clone(),
        _ => return None,
    };
    let specs: Vec<PrimitiveSpec> = members
        .iter()
        .map(|m| child_spec(info, registry, m))
        .collect::<Option<_>>()?;

    let fixed_total: Option<usize> = specs.iter().try_fold(0usize, |acc, s| match s.nargs {
        Nargs::Fixed(k) => Some(acc + k),
        Nargs::Star => None,
    });
    let nargs = match fixed_total {
        Some(total) => Nargs::Fixed(total),
        None => Nargs::Star,
    };
    let metavar = specs
        .iter()
        .map(|s| s.metavar.clone())
        .collect::<Vec<_>>()
        .join(" ");
    let choices = union_choices(&specs);

    let inst_specs = specs.clone();
    let pred_specs = specs.clone();
    let print_specs = specs;
    let mut spec = PrimitiveSpec::new(
        nargs,
        metavar,
        move |tokens| {
            if fixed_total.is_some() {
                // unambiguous partition, slice by each member's arity
                let mut out = Vec::with_capacity(inst_specs.len());
                let mut rest = tokens;
                for inner in &inst_specs {
                    let k = match inner.nargs {
                        Nargs::Fixed(k) => k,
                        Nargs::Star => unreachable!("fixed_total implies fixed members"),
                    };
                    let (head, tail) = rest.split_at(k);
                    out.push(inner.instantiate(head)?);
                    rest = tail;
                }
                Ok(Value::Tuple(out))
            } else {
                parse_with_backtracking(tokens, &inst_specs, false)
                    .map(Value::Tuple)
                    .ok_or_else(|| format!("could not partition {:?}", tokens))
            }
        },
        move |v| match v {
            Value::Tuple(xs) => {
                xs.len() == pred_specs.len()
                    && pred_specs.iter().zip(xs).all(|(s, x)| s.is_instance(x))
            }
            _ => false,
        },
        move |v| match v {
            Value::Tuple(xs) if xs.len() == print_specs.len() => {
                let mut out = Vec::new();
                for (inner, x) in print_specs.iter().zip(xs) {
                    out.extend(inner.print(x)?);
                }
                Some(out)
            }
            _ => None,
        },
    );
    spec.choices = choices;
    Some(spec)
}

/// A container value from parsed elements, honouring the container kind.
fn collect_container(ty: &TypeExpr, elements: Vec<Value>) -> Value {
    match ty {
        TypeExpr::Set(_) => {
            let mut out: Vec<Value> = Vec::with_capacity(elements.len());
            for element in elements {
                if !out.contains(&element) {
                    out.push(element);
                }
            }
            Value::Set(out)
        }
        TypeExpr::VarTuple(_) => Value::Tuple(elements),
        _ => Value::List(elements),
    }
}

fn sequence_rule(info: &PrimitiveTypeInfo, registry: &Registry) -> Option<PrimitiveSpec> {
    let element = match &info.norm.ty {
        TypeExpr::List(e) | TypeExpr::Set(e) | TypeExpr::Deque(e) | TypeExpr::VarTuple(e) => {
            (**e).clone()
        }
        _ => return None,
    };
    let append = info.norm.has(Marker::UseAppendAction);

    // the container consumed the marker; elements must not inherit it
    let base = if append {
        info.norm.without_marker(Marker::UseAppendAction)
    } else {
        info.norm.clone()
    };
    let inner = registry
        .get_primitive_spec(&PrimitiveTypeInfo {
            norm: base.normalize_child(&element),
            field_name: info.field_name.clone(),
        })
        .ok()?;

    let metavar = multi_metavar_from_single(&inner.metavar);
    let container_ty = info.norm.ty.clone();
    let pred_ty = info.norm.ty.clone();
    let inner_inst = inner.clone();
    let inner_pred = inner.clone();
    let inner_print = inner.clone();

    let mut spec = PrimitiveSpec::new(
        Nargs::Star,
        metavar,
        move |tokens| {
            let elements = match inner_inst.nargs {
                Nargs::Fixed(k) => {
                    if k == 0 || tokens.len() % k != 0 {
                        return Err(format!(
                            "expected a multiple of {} values, got {}",
                            k,
                            tokens.len()
                        ));
                    }
                    tokens
                        .chunks(k)
                        .map(|chunk| inner_inst.instantiate(chunk))
                        .collect::<Result<Vec<_>, _>>()?
                }
                Nargs::Star => {
                    parse_with_backtracking(tokens, std::slice::from_ref(&inner_inst), true)
                        .ok_or_else(|| format!("could not partition {:?}", tokens))?
                }
            };
            Ok(collect_container(&container_ty, elements))
        },
        move |v| match (&pred_ty, v) {
            (TypeExpr::Set(_), Value::Set(xs)) => xs.iter().all(|x| inner_pred.is_instance(x)),
            (TypeExpr::VarTuple(_), Value::Tuple(xs)) => {
                xs.iter().all(|x| inner_pred.is_instance(x))
            }
            (TypeExpr::List(_) | TypeExpr::Deque(_), Value::List(xs)) => {
                xs.iter().all(|x| inner_pred.is_instance(x))
            }
            _ => false,
        },
        move |v| match v {
            Value::List(xs) | Value::Set(xs) | Value::Tuple(xs) => {
                let mut out = Vec::new();
                for x in xs {
                    out.extend(inner_print.print(x)?);
                }
                Some(out)
            }
            _ => None,
        },
    );
    spec.choices = inner.choices.clone();
    if append {
        spec.action = Some(Action::Append);
    }
    Some(spec)
}

fn dict_rule(info: &PrimitiveTypeInfo, registry: &Registry) -> Option<PrimitiveSpec> {
    let (key_ty, val_ty) = match &info.norm.ty {
        TypeExpr::Map(k, v) => ((**k).clone(), (**v).clone()),
        _ => return None,
    };
    let append = info.norm.has(Marker::UseAppendAction);
    let base = if append {
        info.norm.without_marker(Marker::UseAppendAction)
    } else {
        info.norm.clone()
    };
    let fetch = |ty: &TypeExpr| {
        registry
            .get_primitive_spec(&PrimitiveTypeInfo {
                norm: base.normalize_child(ty),
                field_name: info.field_name.clone(),
            })
            .ok()
    };
    let key_spec = fetch(&key_ty)?;
    let val_spec = fetch(&val_ty)?;

    let metavar = format!(
        "{0} {1} [{0} {1} ...]",
        key_spec.metavar, val_spec.metavar
    );

    let pair = [key_spec.clone(), val_spec.clone()];
    let pair_pred = pair.clone();
    let pair_print = pair.clone();
    let mut spec = PrimitiveSpec::new(
        Nargs::Star,
        metavar,
        move |tokens| {
            let fixed = match (pair[0].nargs, pair[1].nargs) {
                (Nargs::Fixed(a), Nargs::Fixed(b)) => Some((a, b)),
                _ => None,
            };
            let flat = match fixed {
                Some((a, b)) => {
                    let stride = a + b;
                    if stride == 0 || tokens.len() % stride != 0 {
                        return Err(format!(
                            "expected key/value groups of {} values, got {}",
                            stride,
                            tokens.len()
                        ));
                    }
                    let mut flat = Vec::new();
                    for chunk in tokens.chunks(stride) {
                        flat.push(pair[0].instantiate(&chunk[..a])?);
                        flat.push(pair[1].instantiate(&chunk[a..])?);
                    }
                    flat
                }
                None => parse_with_backtracking(tokens, &pair, true)
                    .ok_or_else(|| format!("could not partition {:?}", tokens))?,
            };
            let mut out: Vec<(Value, Value)> = Vec::with_capacity(flat.len() / 2);
            for kv in flat.chunks(2) {
                let (k, v) = (kv[0].clone(), kv[1].clone());
                // later occurrences of a key overwrite earlier ones
                match out.iter_mut().find(|(ek, _)| *ek == k) {
                    Some(entry) => entry.1 = v,
                    None => out.push((k, v)),
                }
            }
            Ok(Value::Map(out))
        },
        move |v| match v {
            Value::Map(pairs) => pairs
                .iter()
                .all(|(k, v)| pair_pred[0].is_instance(k) && pair_pred[1].is_instance(v)),
            _ => false,
        },
        move |v| match v {
            Value::Map(pairs) => {
                let mut out = Vec::new();
                for (k, v) in pairs {
                    out.extend(pair_print[0].print(k)?);
                    out.extend(pair_print[1].print(v)?);
                }
                Some(out)
            }
            _ => None,
        },
    );
    if append {
        spec.action = Some(Action::Append);
    }
    Some(spec)
}

fn literal_rule(info: &PrimitiveTypeInfo, _registry: &Registry) -> Option<PrimitiveSpec> {
    let values = match &info.norm.ty {
        TypeExpr::Literal(values) => values.clone(),
        _ => return None,
    };
    let by_value = info.norm.has(Marker::EnumChoicesFromValues);

    // compare as strings: member names for enum values, values otherwise
    let token_of = move |v: &Value| -> String {
        match v {
            Value::Variant(variant) if by_value => variant.value().to_string(),
            other => other.to_string(),
        }
    };
    let tokens: Vec<String> = values.iter().map(&token_of).collect();
    let metavar = format!("{{{}}}", tokens.join(","));

    let pairs: Vec<(String, Value)> = tokens.iter().cloned().zip(values.iter().cloned()).collect();
    let pairs_inst = pairs.clone();
    let values_pred = values;
    let pairs_print = pairs;
    Some(
        PrimitiveSpec::scalar(
            metavar,
            move |toks| {
                let token = &toks[0];
                pairs_inst
                    .iter()
                    .find(|(t, _)| t == token)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| format!("{:?} is not a valid literal", token))
            },
            move |v| values_pred.contains(v),
            move |v| {
                pairs_print
                    .iter()
                    .find(|(_, pv)| pv == v)
                    .map(|(t, _)| vec![t.clone()])
            },
        )
        .with_choices(tokens),
    )
}

fn union_rule(info: &PrimitiveTypeInfo, registry: &Registry) -> Option<PrimitiveSpec> {
    let mut options = match &info.norm.ty {
        TypeExpr::Union(options) => options.clone(),
        _ => return None,
    };
    // the unit type moves to the front so Optional[X] parses an explicit None
    if let Some(pos) = options.iter().position(|t| matches!(t, TypeExpr::NoneType)) {
        if pos != 0 {
            let none = options.remove(pos);
            options.insert(0, none);
        }
    }

    let specs: Vec<PrimitiveSpec> = options
        .iter()
        .map(|o| child_spec(info, registry, o))
        .collect::<Option<_>>()?;

    let nargs = match specs.split_first() {
        Some((first, rest)) if rest.iter().all(|s| s.nargs == first.nargs) => first.nargs,
        _ => Nargs::Star,
    };
    let metavar = join_union_metavars(
        &specs.iter().map(|s| s.metavar.clone()).collect::<Vec<_>>(),
    );
    let choices = union_choices(&specs);

    let inst_specs = specs.clone();
    let pred_specs = specs.clone();
    let print_specs = specs;
    let mut spec = PrimitiveSpec::new(
        nargs,
        metavar,
        move |tokens| {
            let mut failures = Vec::new();
            for inner in &inst_specs {
                let arity_ok = match inner.nargs {
                    Nargs::Fixed(k) => k == tokens.len(),
                    Nargs::Star => true,
                };
                if !arity_ok {
                    continue;
                }
                match inner.instantiate(tokens) {
                    Ok(value) => return Ok(value),
                    Err(err) => failures.push(err),
                }
            }
            Err(if failures.is_empty() {
                format!("no option accepts {} values", tokens.len())
            } else {
                failures.join("; ")
            })
        },
        move |v| pred_specs.iter().any(|s| s.is_instance(v)),
        move |v| {
            print_specs
                .iter()
                .find(|s| s.is_instance(v))
                .and_then(|s| s.print(v))
        },
    );
    spec.choices = choices;
    Some(spec)
}

/// Union of choice sets when every spec has one, `None` otherwise.
fn union_choices(specs: &[PrimitiveSpec]) -> Option<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for spec in specs {
        for choice in spec.choices.as_ref()? {
            if !out.contains(choice) {
                out.push(choice.clone());
            }
        }
    }
    Some(out)
}
