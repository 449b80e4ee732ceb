//! Post-order instantiation: the parsed-value map walks back through the
//! parser tree and every node's constructor is called with its resolved
//! children.

use crate::driver::{Parsed, ValuesMap};
use crate::error::ParseError;
use crate::parser::{Arg, ChildParser, ParserSpec, SubparserSpec};
use crate::schema::CallMode;
use crate::strukt::CallArgs;
use crate::value::{FieldDefault, Value};

/// Instantiate the value a parser describes from the driver's output.
pub(crate) fn instantiate(spec: &ParserSpec, values: &ValuesMap) -> Result<Value, ParseError> {
    let mut call = CallArgs::default();

    // constructor arguments must arrive in declaration order; look up each
    // field among args, nested records and subparsers as we go
    for field in &spec.constructor.fields {
        if let Some(arg) = spec
            .args
            .iter()
            .find(|a| a.def.field.intern_name == field.name)
        {
            if let Some(value) = leaf_value(arg, values)? {
                push(&mut call, field.mode, field.call_name(), value)?;
            }
            continue;
        }
        if let Some(child) = spec.children.get(&field.name) {
            if let Some(value) = child_value(child, values)? {
                push(&mut call, field.mode, field.call_name(), value)?;
            }
            continue;
        }
        if let Some(sub) = spec.subparsers.get(&field.name) {
            let value = subparser_value(sub, values)?;
            push(&mut call, field.mode, field.call_name(), value)?;
            continue;
        }
        // fields with no argument surface (suppressed-and-fixed) fall back
        // to their defaults inside the constructor
        if let FieldDefault::Value(value) = &field.default {
            push(&mut call, field.mode, field.call_name(), value.clone())?;
        }
    }

    spec.constructor
        .instantiate(call)
        .map_err(|message| ParseError::Instantiation {
            flag: display_name(spec),
            message,
        })
}

fn display_name(spec: &ParserSpec) -> String {
    if spec.intern_prefix.is_empty() {
        spec.constructor.name.clone()
    } else {
        spec.intern_prefix.clone()
    }
}

fn push(
    call: &mut CallArgs,
    mode: CallMode,
    name: &str,
    value: Value,
) -> Result<(), ParseError> {
    match mode {
        CallMode::Keyword => call.keyword.push((name.to_string(), value)),
        CallMode::Positional => call.positional.push(value),
        CallMode::UnpackArgs => match value {
            Value::List(xs) | Value::Tuple(xs) => call.positional.extend(xs),
            other => call.positional.push(other),
        },
        CallMode::UnpackKwargs => match value {
            Value::Map(pairs) => {
                for (key, val) in pairs {
                    call.keyword.push((key.to_string(), val));
                }
            }
            other => {
                return Err(ParseError::Instantiation {
                    flag: name.to_string(),
                    message: format!("cannot splice {} as keyword arguments", other),
                })
            }
        },
    }
    Ok(())
}

/// The value of one leaf argument, or `None` when it is excluded from the
/// call entirely.
fn leaf_value(arg: &Arg, values: &ValuesMap) -> Result<Option<Value>, ParseError> {
    let field_default = &arg.def.field.default;
    let raw = values.get(&arg.lowered.dest);

    let parsed = match raw {
        None => {
            // unsupplied; substitute the field default
            return match field_default {
                FieldDefault::Value(value) => Ok(Some(value.clone())),
                FieldDefault::ExcludeFromCall => Ok(None),
                FieldDefault::Missing | FieldDefault::MissingNonprop => {
                    // counters and boolean pairs synthesise their own default
                    match &arg.lowered.default {
                        FieldDefault::Value(value) => Ok(Some(value.clone())),
                        _ => Err(ParseError::Instantiation {
                            flag: arg.lowered.name_or_flag.clone(),
                            message: "no value was supplied".to_string(),
                        }),
                    }
                }
            };
        }
        Some(parsed) => parsed,
    };

    match parsed {
        Parsed::Flag(b) => Ok(Some(Value::Bool(*b))),
        Parsed::Count(n) => Ok(Some(Value::Int(*n))),
        Parsed::Subcommand(_) => Err(ParseError::Instantiation {
            flag: arg.lowered.name_or_flag.clone(),
            message: "subcommand token recorded for a leaf argument".to_string(),
        }),
        Parsed::Tokens(chunk) => {
            // an optional positional that matched no token falls back
            if chunk.is_empty() && arg.lowered.nargs == Some(crate::arguments::ArgNargs::Opt) {
                return match field_default {
                    FieldDefault::Value(value) => Ok(Some(value.clone())),
                    _ => Ok(None),
                };
            }
            let spec = arg.lowered.spec.as_ref().ok_or_else(|| {
                ParseError::Instantiation {
                    flag: arg.lowered.name_or_flag.clone(),
                    message: "fixed argument cannot consume values".to_string(),
                }
            })?;
            spec.instantiate(chunk)
                .map(Some)
                .map_err(|message| ParseError::Instantiation {
                    flag: arg.lowered.name_or_flag.clone(),
                    message,
                })
        }
        Parsed::Appended(groups) => {
            let spec = arg.lowered.spec.as_ref().ok_or_else(|| {
                ParseError::Instantiation {
                    flag: arg.lowered.name_or_flag.clone(),
                    message: "append action without an instantiator".to_string(),
                }
            })?;
            let flat: Vec<String> = groups.iter().flatten().cloned().collect();
            let parsed = spec
                .instantiate(&flat)
                .map_err(|message| ParseError::Instantiation {
                    flag: arg.lowered.name_or_flag.clone(),
                    message,
                })?;
            Ok(Some(append_to_default(field_default, parsed)))
        }
    }
}

/// Appending arguments accumulate on top of their default contents.
fn append_to_default(default: &FieldDefault, parsed: Value) -> Value {
    match (default.as_value(), parsed) {
        (Some(Value::List(base)), Value::List(new)) => {
            let mut out = base.clone();
            out.extend(new);
            Value::List(out)
        }
        (Some(Value::Tuple(base)), Value::Tuple(new)) => {
            let mut out = base.clone();
            out.extend(new);
            Value::Tuple(out)
        }
        (Some(Value::Set(base)), Value::Set(new)) => {
            let mut out = base.clone();
            for item in new {
                if !out.contains(&item) {
                    out.push(item);
                }
            }
            Value::Set(out)
        }
        (Some(Value::Map(base)), Value::Map(new)) => {
            let mut out = base.clone();
            for (key, val) in new {
                match out.iter_mut().find(|(k, _)| *k == key) {
                    Some(entry) => entry.1 = val,
                    None => out.push((key, val)),
                }
            }
            Value::Map(out)
        }
        (_, parsed) => parsed,
    }
}

/// A nested record's value; `None` when an unset optional key is omitted.
fn child_value(child: &ChildParser, values: &ValuesMap) -> Result<Option<Value>, ParseError> {
    let supplied = subtree_supplied(&child.spec, values);
    if !supplied {
        // all-or-nothing: the whole-instance default stands in for the group
        if let Some(default) = &child.group_default {
            return Ok(Some(default.clone()));
        }
        if child.exclude_unset {
            return Ok(None);
        }
    }
    instantiate(&child.spec, values).map(Some)
}

fn subparser_value(sub: &SubparserSpec, values: &ValuesMap) -> Result<Value, ParseError> {
    match values.get(&sub.dest) {
        Some(Parsed::Subcommand(token)) => match sub.options.get(token) {
            Some(option) => instantiate(option, values),
            None => Err(ParseError::Instantiation {
                flag: sub.dest.clone(),
                message: format!("unknown subcommand {:?}", token),
            }),
        },
        // no selection: the registered default instance passes through
        _ => match &sub.default_instance {
            Some(value) => Ok(value.clone()),
            None => match &sub.default_name {
                Some(name) => match sub.options.get(name) {
                    Some(option) => instantiate(option, values),
                    None => Err(ParseError::Instantiation {
                        flag: sub.dest.clone(),
                        message: "default subcommand disappeared".to_string(),
                    }),
                },
                None => Err(ParseError::Instantiation {
                    flag: sub.dest.clone(),
                    message: "no subcommand was selected".to_string(),
                }),
            },
        },
    }
}

/// Did the command line touch anything below this parser?
fn subtree_supplied(spec: &ParserSpec, values: &ValuesMap) -> bool {
    spec.collect_args()
        .iter()
        .any(|arg| values.contains_key(&arg.lowered.dest))
        || spec
            .subparser_groups()
            .iter()
            .any(|sub| values.contains_key(&sub.dest))
}
