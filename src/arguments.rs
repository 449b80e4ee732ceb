//! From a resolved field to a command line argument.
//!
//! A fixed pipeline of rewrite rules runs over each argument definition, each
//! rule refining the working [`LoweredArgument`]: defaults, boolean flag
//! conversion, primitive lookup, default stringification, counters, helptext,
//! names and destinations, and positional special cases, in that order.

use std::rc::Rc;

use crate::error::SpecError;
use crate::fields::{FieldDefinition, Helptext};
use crate::markers::Marker;
use crate::names::make_field_name;
use crate::primitive::{Action, CompletionHint, Nargs, PrimitiveSpec};
use crate::registry::{PrimitiveTypeInfo, Registry};
use crate::schema::{MutexGroupConfig, TypeExpr};
use crate::value::{FieldDefault, Value};

/// One argument, before lowering: the field plus its position in the tree.
#[derive(Debug, Clone)]
pub struct ArgumentDefinition {
    pub field: FieldDefinition,
    pub intern_prefix: String,
    pub extern_prefix: String,
    /// The portion of the external prefix contributed by enclosing
    /// subcommands; stripped when prefixes are omitted.
    pub subcommand_prefix: String,
}

/// Arity as the parse driver sees it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ArgNargs {
    Fixed(usize),
    /// Zero or more value tokens.
    Star,
    /// One or more value tokens.
    Plus,
    /// At most one value token.
    Opt,
}

/// The fully-lowered description of one command line argument.
#[derive(Clone)]
pub struct LoweredArgument {
    /// `--flag` form, or the bare name for positionals.
    pub name_or_flag: String,
    /// Destination key in the parsed-value map.
    pub dest: String,
    pub aliases: Vec<String>,
    pub default: FieldDefault,
    /// Stringified default, consistent with what the instantiator consumes.
    pub default_tokens: Option<Vec<String>>,
    pub required: bool,
    pub action: Option<Action>,
    pub nargs: Option<ArgNargs>,
    pub choices: Option<Vec<String>>,
    pub metavar: Option<String>,
    /// Composed lazily; `None` means hidden from help.
    pub help: Option<Helptext>,
    pub spec: Option<PrimitiveSpec>,
    pub completion: CompletionHint,
    pub is_positional: bool,
    pub in_optional_group: bool,
    /// Destination prefix of the parser owning the optional group.
    pub group_prefix: String,
    pub mutex: Option<Rc<MutexGroupConfig>>,
}

impl std::fmt::Debug for LoweredArgument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoweredArgument")
            .field("name_or_flag", &self.name_or_flag)
            .field("dest", &self.dest)
            .field("required", &self.required)
            .field("action", &self.action)
            .field("nargs", &self.nargs)
            .finish()
    }
}

impl LoweredArgument {
    pub(crate) fn is_fixed(&self) -> bool {
        self.spec.is_none() && self.action.is_none()
    }

    /// The `--no-` counterpart of a boolean pair; the segment lands after the
    /// last `.` so nested flags read `--a.b.no-flag`.
    pub(crate) fn negated_flag(&self) -> Option<String> {
        if self.action != Some(Action::BooleanOptional) {
            return None;
        }
        let bare = self.name_or_flag.trim_start_matches('-');
        Some(match bare.rfind('.') {
            Some(dot) => format!("--{}.no-{}", &bare[..dot], &bare[dot + 1..]),
            None => format!("--no-{}", bare),
        })
    }
}

impl ArgumentDefinition {
    /// Run the lowering pipeline.
    pub(crate) fn lower(&self, registry: &Registry) -> Result<LoweredArgument, SpecError> {
        let field = &self.field;
        // positional-only call parameters surface positionally too
        let is_positional = field.norm.has(Marker::Positional)
            || field.call_mode == crate::schema::CallMode::Positional
            || (field.norm.has(Marker::PositionalRequiredArgs)
                && field.default.is_missing()
                && !field.in_optional_group());

        let mut lowered = LoweredArgument {
            name_or_flag: String::new(),
            dest: String::new(),
            aliases: Vec::new(),
            default: FieldDefault::MissingNonprop,
            default_tokens: None,
            required: false,
            action: None,
            nargs: None,
            choices: None,
            metavar: None,
            help: None,
            spec: None,
            completion: CompletionHint::Default,
            is_positional,
            in_optional_group: field.in_optional_group(),
            group_prefix: self.intern_prefix.clone(),
            mutex: field.mutex.clone(),
        };

        self.rule_handle_defaults(&mut lowered);
        let done = self.rule_handle_boolean_flags(&mut lowered);
        if !done {
            self.rule_recursive_instantiator_from_type(&mut lowered, registry)?;
        }
        self.rule_convert_defaults_to_strings(&mut lowered);
        self.rule_counters(&mut lowered);
        self.rule_generate_helptext(&mut lowered);
        self.rule_set_name_or_flag_and_dest(&mut lowered)?;
        self.rule_positional_special_handling(&mut lowered);
        Ok(lowered)
    }

    fn rule_handle_defaults(&self, lowered: &mut LoweredArgument) {
        let default = &self.field.default;
        if default.is_missing() && !self.field.in_optional_group() {
            lowered.required = true;
        } else {
            lowered.default = default.clone();
        }
    }

    /// Boolean fields with a concrete default become `--flag`/`--no-flag`
    /// pairs; with pair creation off, only the inverting form is generated.
    fn rule_handle_boolean_flags(&self, lowered: &mut LoweredArgument) -> bool {
        let field = &self.field;
        if !matches!(field.norm.ty, TypeExpr::Bool)
            || field.norm.has(Marker::FlagConversionOff)
            || field.norm.has(Marker::Fixed)
            || field.norm.has(Marker::Positional)
        {
            return false;
        }
        let concrete = match lowered.default.as_value() {
            Some(Value::Bool(b)) => *b,
            _ => return false,
        };
        lowered.action = Some(if field.norm.has(Marker::FlagCreatePairsOff) {
            if concrete {
                Action::StoreFalse
            } else {
                Action::StoreTrue
            }
        } else {
            Action::BooleanOptional
        });
        lowered.nargs = None;
        true
    }

    fn rule_recursive_instantiator_from_type(
        &self,
        lowered: &mut LoweredArgument,
        registry: &Registry,
    ) -> Result<(), SpecError> {
        let field = &self.field;
        if field.norm.has(Marker::Fixed) {
            lowered.metavar = Some("{fixed}".to_string());
            lowered.spec = None;
            lowered.required = false;
            lowered.default = FieldDefault::MissingNonprop;
            return Ok(());
        }
        let spec = registry.get_primitive_spec(&PrimitiveTypeInfo {
            norm: field.norm.clone(),
            field_name: field.intern_name.clone(),
        })?;
        lowered.nargs = Some(match spec.nargs {
            Nargs::Fixed(k) => ArgNargs::Fixed(k),
            Nargs::Star => ArgNargs::Star,
        });
        lowered.choices = spec.choices.clone();
        lowered.metavar = Some(
            field
                .conf
                .metavar
                .clone()
                .unwrap_or_else(|| spec.metavar.clone()),
        );
        lowered.action = spec.action;
        lowered.completion = if spec.completion == CompletionHint::Default
            && has_path_suffix(&field.intern_name)
        {
            CompletionHint::Path
        } else {
            spec.completion
        };
        lowered.spec = Some(spec);
        Ok(())
    }

    /// Defaults shown in help must be the token sequence the instantiator
    /// would consume.
    fn rule_convert_defaults_to_strings(&self, lowered: &mut LoweredArgument) {
        if let (Some(spec), Some(value)) = (&lowered.spec, lowered.default.as_value()) {
            lowered.default_tokens = spec.print(value);
        }
    }

    fn rule_counters(&self, lowered: &mut LoweredArgument) {
        let field = &self.field;
        if field.norm.has(Marker::UseCounterAction)
            && matches!(field.norm.ty, TypeExpr::Int)
            && !lowered.is_positional
        {
            lowered.action = Some(Action::Count);
            lowered.nargs = None;
            lowered.metavar = None;
            lowered.required = false;
            lowered.default = FieldDefault::Value(Value::Int(0));
            lowered.default_tokens = None;
        }
    }

    fn rule_generate_helptext(&self, lowered: &mut LoweredArgument) {
        let field = &self.field;
        if field.norm.has(Marker::Suppress)
            || (field.norm.has(Marker::SuppressFixed) && lowered.is_fixed())
        {
            lowered.help = None;
            return;
        }

        let primary = field.help.clone();
        let positional_name = if lowered.is_positional {
            Some(make_field_name(&[
                self.extern_prefix.as_str(),
                field.intern_name.as_str(),
            ]))
        } else {
            None
        };
        let hint = self.default_hint(lowered);
        lowered.help = Some(Helptext::Thunk(Rc::new(move || {
            let mut parts = Vec::new();
            match primary.resolve() {
                Some(text) if !text.is_empty() => parts.push(text),
                _ => {
                    if let Some(name) = &positional_name {
                        parts.push(name.clone());
                    }
                }
            }
            if let Some(hint) = &hint {
                parts.push(hint.clone());
            }
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        })));
    }

    /// One of the seven default-value hints.
    fn default_hint(&self, lowered: &LoweredArgument) -> Option<String> {
        if lowered.required {
            return Some("(required)".to_string());
        }
        let label = || -> String {
            match &lowered.default_tokens {
                Some(tokens) => tokens.join(" "),
                None => match self.field.default.as_value() {
                    Some(value) => value.to_string(),
                    None => "None".to_string(),
                },
            }
        };
        let default_empty = match &lowered.default {
            FieldDefault::Value(Value::List(xs))
            | FieldDefault::Value(Value::Set(xs))
            | FieldDefault::Value(Value::Tuple(xs)) => xs.is_empty(),
            FieldDefault::Value(_) => false,
            _ => true,
        };
        Some(if lowered.is_fixed() && lowered.action.is_none() {
            format!("(fixed to: {})", label())
        } else if lowered.action == Some(Action::Count) {
            "(repeatable)".to_string()
        } else if lowered.action == Some(Action::Append) && default_empty {
            "(repeatable)".to_string()
        } else if lowered.action == Some(Action::Append) {
            format!("(repeatable, appends to: {})", label())
        } else if matches!(self.field.default, FieldDefault::ExcludeFromCall) {
            "(unset by default)".to_string()
        } else if self.field.in_optional_group() && lowered.default.is_sentinel() {
            "(optional)".to_string()
        } else if self.field.in_optional_group() {
            format!("(default if used: {})", label())
        } else {
            format!("(default: {})", label())
        })
    }

    fn rule_set_name_or_flag_and_dest(
        &self,
        lowered: &mut LoweredArgument,
    ) -> Result<(), SpecError> {
        let field = &self.field;
        let mut name_or_flag = if field.prefix_name {
            make_field_name(&[self.extern_prefix.as_str(), field.extern_name.as_str()])
        } else {
            make_field_name(&[field.extern_name.as_str()])
        };
        if !lowered.is_positional {
            name_or_flag = format!("--{}", name_or_flag);
        }

        if field.norm.has(Marker::OmitSubcommandPrefixes)
            && field.prefix_name
            && !lowered.is_positional
            && !self.subcommand_prefix.is_empty()
        {
            // the stored prefix is raw; the flag name is delimiter-converted
            let strip = format!(
                "--{}.",
                make_field_name(&[self.subcommand_prefix.as_str()])
            );
            if let Some(rest) = name_or_flag.strip_prefix(&strip) {
                name_or_flag = format!("--{}", rest);
            }
        }

        for alias in &field.conf.aliases {
            if !alias.starts_with('-') {
                return Err(SpecError::BadAlias {
                    field: field.intern_name.clone(),
                    alias: alias.clone(),
                });
            }
            lowered.aliases.push(alias.clone());
        }

        lowered.name_or_flag = name_or_flag;
        lowered.dest = make_field_name(&[
            self.intern_prefix.as_str(),
            field.intern_name.as_str(),
        ]);
        Ok(())
    }

    /// Positionals drop the `--` prefix and remap arity: a single optional
    /// value becomes `?`, variable counts become `*`, required fixed counts
    /// stay as they are.
    fn rule_positional_special_handling(&self, lowered: &mut LoweredArgument) {
        if !lowered.is_positional {
            return;
        }
        match lowered.nargs {
            Some(ArgNargs::Fixed(1)) if !lowered.required => lowered.nargs = Some(ArgNargs::Opt),
            Some(ArgNargs::Plus | ArgNargs::Star) => lowered.nargs = Some(ArgNargs::Star),
            _ => {}
        }
    }
}

fn has_path_suffix(name: &str) -> bool {
    name.ends_with("_dir")
        || name.ends_with("_file")
        || name.ends_with("_path")
        || name.ends_with("-dir")
        || name.ends_with("-file")
        || name.ends_with("-path")
}
