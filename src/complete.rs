//! Shell-completion spec generation.
//!
//! Produces the JSON-serializable tree a completion emitter consumes: one
//! node per subcommand level with its options, nested subcommands, and the
//! mutually-exclusive frontier groups when several independent subparser
//! groups live at the same level. Rendering the tree into shell syntax
//! happens elsewhere.

use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use crate::arguments::ArgNargs;
use crate::parser::{Arg, ParserSpec};
use crate::primitive::{Action, CompletionHint};

#[derive(Debug, Clone, Serialize)]
pub struct CompletionSpec {
    pub prog: String,
    pub options: Vec<CompletionOption>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub subcommands: IndexMap<String, CompletionSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frontier_groups: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionOption {
    pub flags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: CompletionKind,
    /// True for arguments inherited from a cascading ancestor.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cascade: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nargs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    /// Zero-arity switch.
    Flag,
    /// Takes free-form value tokens.
    Value,
    /// Takes tokens from a fixed set.
    Choice,
    /// A `--flag`/`--no-flag` pair.
    Boolean,
    /// Completes filesystem paths.
    Path,
}

/// Build the completion tree for a parser.
pub(crate) fn completion_spec(spec: &ParserSpec, prog: &str) -> CompletionSpec {
    build(spec, &[], prog)
}

fn build(spec: &ParserSpec, inherited: &[&Arg], prog: &str) -> CompletionSpec {
    let own: Vec<&Arg> = if spec.cascaded {
        Vec::new()
    } else {
        spec.collect_args()
    };
    let groups = spec.subparser_groups();

    let mut options: Vec<CompletionOption> = Vec::new();
    if groups.is_empty() {
        options.extend(inherited.iter().copied().map(|arg| option_entry(arg, true)));
    }
    options.extend(own.iter().copied().map(|arg| option_entry(arg, false)));
    options.retain(|o| !o.flags.is_empty());

    let pass_down: Vec<&Arg> = if spec.cascaded {
        inherited
            .iter()
            .copied()
            .chain(spec.collect_args())
            .collect()
    } else {
        inherited.to_vec()
    };

    let mut subcommands = IndexMap::new();
    for group in &groups {
        for (name, option) in &group.options {
            subcommands.insert(
                name.clone(),
                build(option, &pass_down, &format!("{} {}", prog, name)),
            );
        }
    }

    let frontier_groups = if groups.len() > 1 {
        groups
            .iter()
            .map(|g| g.options.keys().cloned().collect())
            .collect()
    } else {
        Vec::new()
    };

    CompletionSpec {
        prog: prog.to_string(),
        options,
        subcommands,
        frontier_groups,
    }
}

fn option_entry(arg: &Arg, cascade: bool) -> CompletionOption {
    let lowered = &arg.lowered;
    if lowered.is_fixed() || lowered.is_positional {
        return CompletionOption {
            flags: Vec::new(),
            description: None,
            kind: CompletionKind::Value,
            cascade,
            nargs: None,
            choices: None,
        };
    }

    let mut flags: Vec<String> = lowered.aliases.clone();
    flags.push(lowered.name_or_flag.clone());
    if let Some(negated) = lowered.negated_flag() {
        flags.push(negated);
    }

    let kind = match lowered.action {
        Some(Action::BooleanOptional) => CompletionKind::Boolean,
        Some(Action::Count | Action::StoreTrue | Action::StoreFalse) => CompletionKind::Flag,
        _ if lowered.completion == CompletionHint::Path => CompletionKind::Path,
        _ if lowered.choices.is_some() => CompletionKind::Choice,
        _ => CompletionKind::Value,
    };

    let nargs = match lowered.nargs {
        Some(ArgNargs::Fixed(k)) => Some(k.to_string()),
        Some(ArgNargs::Star) => Some("*".to_string()),
        Some(ArgNargs::Plus) => Some("+".to_string()),
        Some(ArgNargs::Opt) => Some("?".to_string()),
        None => None,
    };

    CompletionOption {
        flags,
        description: lowered.help.as_ref().and_then(|h| h.resolve()),
        kind,
        cascade,
        nargs,
        choices: lowered.choices.clone(),
    }
}

/// Serialize the tree and write it to `path`.
pub(crate) fn write_completion_spec(spec: &CompletionSpec, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(spec).map_err(std::io::Error::other)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")
}
