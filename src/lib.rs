#![doc = include_str!("../README.md")]

mod arguments;
mod backtrack;
mod calling;
mod complete;
mod driver;
mod error;
mod fields;
mod help;
mod isodate;
mod markers;
mod names;
mod normalize;
mod parser;
mod primitive;
mod registry;
mod schema;
mod strukt;
mod value;
mod youmean;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::rc::Rc;

pub use crate::arguments::{ArgNargs, ArgumentDefinition, LoweredArgument};
pub use crate::complete::{CompletionKind, CompletionOption, CompletionSpec};
pub use crate::error::{ParseFailure, SpecError};
pub use crate::fields::{FieldDefinition, Helptext};
pub use crate::isodate::{Date, DateTime, Time};
pub use crate::markers::{Marker, MarkerSet};
pub use crate::normalize::{normalize, NormalizedType};
pub use crate::parser::{ParserSpec, SubparserSpec};
pub use crate::primitive::{Action, CompletionHint, Nargs, PrimitiveSpec};
pub use crate::registry::{
    ConstructorRule, PrimitiveTypeInfo, Registry, RegistryGuard, StructTypeInfo,
};
pub use crate::schema::{
    AliasType, AnnotatedType, ArgConf, CallMode, ConfItem, EnumSchema, FieldSchema,
    MutexGroupConfig, StructKind, StructSchema, SubcommandConf, TypeExpr,
};
pub use crate::strukt::{CallArgs, StructFieldSpec, StructSpec};
pub use crate::value::{FieldDefault, StructValue, Value, Variant};

use crate::driver::DriverError;
use crate::names::Delimiter;
use crate::parser::ParserBuilder;
use crate::youmean::suggest;

/// A configured command line interface for one schema.
///
/// Build one with [`Cli::new`], adjust it with the with-style setters, then
/// run it against an argument vector:
///
/// ```
/// use declargs::{Cli, FieldSchema, StructSchema, TypeExpr, Value};
///
/// let schema = StructSchema::new("Config")
///     .field(FieldSchema::new("name", TypeExpr::Str))
///     .field(FieldSchema::new("loud", TypeExpr::Bool).default(Value::Bool(false)));
///
/// let value = Cli::new(schema)
///     .prog("app")
///     .run_inner(&["--name", "Alice"])
///     .unwrap();
/// assert_eq!(value.as_struct().unwrap().get("name"), Some(&Value::Str("Alice".into())));
/// ```
#[derive(Clone)]
pub struct Cli {
    schema: TypeExpr,
    prog: Option<String>,
    description: Option<String>,
    default: Option<Value>,
    use_underscores: bool,
    console_outputs: bool,
    add_help: bool,
    config: MarkerSet,
    registry: Option<Rc<Registry>>,
}

impl Cli {
    pub fn new(schema: impl Into<TypeExpr>) -> Self {
        Cli {
            schema: schema.into(),
            prog: None,
            description: None,
            default: None,
            use_underscores: false,
            console_outputs: true,
            add_help: true,
            config: MarkerSet::EMPTY,
            registry: None,
        }
    }

    /// Program name shown in usage lines and error locations.
    #[must_use]
    pub fn prog(mut self, prog: impl Into<String>) -> Self {
        self.prog = Some(prog.into());
        self
    }

    /// Description shown at the top of help output.
    #[must_use]
    pub fn descr(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// An initial value; parsed arguments override its fields.
    #[must_use]
    pub fn default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Display flags with `_` instead of `-`. Both spellings are accepted on
    /// input regardless.
    #[must_use]
    pub fn use_underscores(mut self, yes: bool) -> Self {
        self.use_underscores = yes;
        self
    }

    /// When false, [`Cli::run`] prints nothing on help or error.
    #[must_use]
    pub fn console_outputs(mut self, yes: bool) -> Self {
        self.console_outputs = yes;
        self
    }

    /// When false, `-h`/`--help` are not intercepted and surface as unknown
    /// options.
    #[must_use]
    pub fn add_help(mut self, yes: bool) -> Self {
        self.add_help = yes;
        self
    }

    /// Markers applied to the whole schema.
    #[must_use]
    pub fn config(mut self, markers: &[Marker]) -> Self {
        self.config = markers.iter().collect();
        self
    }

    /// Use an explicit registry instead of the thread-active one.
    #[must_use]
    pub fn registry(mut self, registry: Rc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    fn delimiter(&self) -> Delimiter {
        if self.use_underscores {
            Delimiter::Underscore
        } else {
            Delimiter::Hyphen
        }
    }

    fn active_registry(&self) -> Rc<Registry> {
        self.registry.clone().unwrap_or_else(Registry::active)
    }

    fn prog_name(&self) -> String {
        self.prog.clone().unwrap_or_else(|| {
            std::env::args()
                .next()
                .as_deref()
                .and_then(|p| Path::new(p).file_name()?.to_str().map(str::to_string))
                .unwrap_or_else(|| "prog".to_string())
        })
    }

    /// Build the parser tree without parsing anything. Schema problems
    /// surface here, before any command line token is looked at.
    pub fn build_spec(&self) -> Result<ParserSpec, SpecError> {
        let _delimiter = names::set_delimiter(self.delimiter());
        let registry = self.active_registry();
        let _registry = registry.enter();
        let default = match &self.default {
            Some(value) => FieldDefault::Value(value.clone()),
            None => FieldDefault::MissingNonprop,
        };
        ParserBuilder::new(registry.as_ref()).build_root(
            &self.schema,
            self.config,
            &default,
            self.description.clone(),
        )
    }

    /// Parse an argument vector into a value.
    ///
    /// `Err` carries either rendered help (exit code 0) or a rendered parse
    /// error (exit code 2); unknown options are an error here.
    pub fn run_inner(&self, args: &[&str]) -> Result<Value, ParseFailure> {
        let (value, unknown) = self.run_with_unknowns(args, false)?;
        debug_assert!(unknown.is_empty());
        Ok(value)
    }

    /// Like [`Cli::run_inner`], but unknown tokens are returned instead of
    /// producing an error.
    pub fn run_inner_with_unknowns(
        &self,
        args: &[&str],
    ) -> Result<(Value, Vec<String>), ParseFailure> {
        self.run_with_unknowns(args, true)
    }

    fn run_with_unknowns(
        &self,
        args: &[&str],
        return_unknown: bool,
    ) -> Result<(Value, Vec<String>), ParseFailure> {
        let _delimiter = names::set_delimiter(self.delimiter());
        let registry = self.active_registry();
        let _registry = registry.enter();

        let default = match &self.default {
            Some(value) => FieldDefault::Value(value.clone()),
            None => FieldDefault::MissingNonprop,
        };
        let spec = ParserBuilder::new(registry.as_ref())
            .build_root(&self.schema, self.config, &default, self.description.clone())
            .map_err(|err| ParseFailure::Stderr(err.to_string()))?;

        let prog = self.prog_name();
        let tokens: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let output = match driver::run(&spec, tokens, &prog, self.add_help) {
            Ok(output) => output,
            Err(DriverError::Help(text)) => return Err(ParseFailure::Stdout(text)),
            Err(DriverError::Parse(err)) => return Err(ParseFailure::Stderr(err.render())),
        };

        let unknown = if return_unknown {
            output.unknown.iter().map(|(t, _)| t.clone()).collect()
        } else if output.unknown.is_empty() {
            Vec::new()
        } else {
            let flags = collect_flags(&spec);
            let commands = collect_commands(&spec);
            let unknowns = output
                .unknown
                .iter()
                .map(|(token, prog)| error::UnknownArg {
                    token: token.clone(),
                    prog: prog.clone(),
                    suggestions: suggest(
                        token,
                        flags.iter().map(String::as_str),
                        commands.iter().map(String::as_str),
                    ),
                })
                .collect();
            return Err(ParseFailure::Stderr(
                error::ParseError::Unrecognized(unknowns).render(),
            ));
        };

        // nothing supplied at all falls back to the initial value wholesale
        if output.values.is_empty() {
            if let Some(default) = &self.default {
                return Ok((default.clone(), unknown));
            }
        }

        let value = calling::instantiate(&spec, &output.values)
            .map_err(|err| ParseFailure::Stderr(err.render()))?;
        Ok((value, unknown))
    }

    /// Parse the process arguments, printing and exiting on help or failure.
    pub fn run(&self) -> Value {
        let argv: Vec<String> = std::env::args().skip(1).collect();
        let args: Vec<&str> = argv.iter().map(String::as_str).collect();
        match self.run_inner(&args) {
            Ok(value) => value,
            Err(failure) => {
                if self.console_outputs {
                    failure.print_message();
                }
                std::process::exit(failure.exit_code());
            }
        }
    }

    /// The completion-spec tree for this schema.
    pub fn completion_spec(&self) -> Result<CompletionSpec, SpecError> {
        let _delimiter = names::set_delimiter(self.delimiter());
        let spec = self.build_spec()?;
        Ok(complete::completion_spec(&spec, &self.prog_name()))
    }

    /// Write the completion-spec tree to `path` as JSON.
    pub fn write_completion_spec(&self, path: &Path) -> Result<(), SpecError> {
        let spec = self.completion_spec()?;
        complete::write_completion_spec(&spec, path)?;
        Ok(())
    }
}

/// Parse `args` against `schema` with default settings.
pub fn cli(schema: impl Into<TypeExpr>, args: &[&str]) -> Result<Value, ParseFailure> {
    Cli::new(schema).run_inner(args)
}

fn collect_flags(spec: &ParserSpec) -> Vec<String> {
    let mut out = Vec::new();
    for arg in spec.collect_args() {
        if !arg.lowered.is_positional && !arg.lowered.is_fixed() {
            out.push(arg.lowered.name_or_flag.clone());
            out.extend(arg.lowered.aliases.iter().cloned());
        }
    }
    for sub in spec.subparser_groups() {
        for option in sub.options.values() {
            out.extend(collect_flags(option));
        }
    }
    out
}

fn collect_commands(spec: &ParserSpec) -> Vec<String> {
    let mut out: Vec<String> = spec
        .subcommand_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    for sub in spec.subparser_groups() {
        for option in sub.options.values() {
            out.extend(collect_commands(option));
        }
    }
    out
}
