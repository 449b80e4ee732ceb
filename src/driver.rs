//! Argument consumption.
//!
//! A single-threaded walk over the argv deque: flags, `--flag=value`
//! splitting, repeated short counters, boolean pairs, positionals and
//! subcommand dispatch, followed by the post-loop bookkeeping for required
//! arguments, mutex groups, optional groups and missing subcommands.

use std::collections::VecDeque;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::arguments::ArgNargs;
use crate::error::ParseError;
use crate::names::swap_delimiters;
use crate::parser::{Arg, ParserSpec};
use crate::primitive::Action;
use crate::schema::MutexGroupConfig;

/// What landed in one destination slot.
#[derive(Debug, Clone)]
pub(crate) enum Parsed {
    Tokens(Vec<String>),
    /// One token group per occurrence of an appending argument.
    Appended(Vec<Vec<String>>),
    Flag(bool),
    Count(i64),
    Subcommand(String),
}

pub(crate) type ValuesMap = IndexMap<String, Parsed>;

/// Parse-time termination: help requested or a rendered error.
pub(crate) enum DriverError {
    Help(String),
    Parse(ParseError),
}

pub(crate) struct DriverOutput {
    pub(crate) values: ValuesMap,
    pub(crate) unknown: Vec<(String, String)>,
}

pub(crate) fn run(
    spec: &ParserSpec,
    tokens: Vec<String>,
    prog: &str,
    add_help: bool,
) -> Result<DriverOutput, DriverError> {
    let mut state = DriverState {
        add_help,
        values: IndexMap::new(),
        unknown: Vec::new(),
        mutex_observed: Vec::new(),
    };
    parse_level(
        spec,
        &[],
        tokens.into(),
        prog.to_string(),
        &mut state,
    )?;
    Ok(DriverOutput {
        values: state.values,
        unknown: state.unknown,
    })
}

struct DriverState {
    add_help: bool,
    values: ValuesMap,
    unknown: Vec<(String, String)>,
    /// Group handle, destination of the argument seen, token as typed.
    mutex_observed: Vec<(Rc<MutexGroupConfig>, String, String)>,
}

/// One level's lookup tables.
struct Tables<'a> {
    /// Hyphen-normalized flag spelling to the argument and, for boolean
    /// pairs, the value the spelling sets.
    flags: Vec<(String, &'a Arg, Option<bool>)>,
    positionals: Vec<&'a Arg>,
}

impl<'a> Tables<'a> {
    fn build(args: &[&'a Arg]) -> Self {
        let mut flags = Vec::new();
        let mut positionals = Vec::new();
        for arg in args {
            if arg.lowered.is_positional {
                positionals.push(*arg);
                continue;
            }
            if arg.lowered.is_fixed() {
                continue;
            }
            let pair = arg.lowered.action == Some(Action::BooleanOptional);
            let base = if pair { Some(true) } else { None };
            flags.push((swap_delimiters(&arg.lowered.name_or_flag), *arg, base));
            for alias in &arg.lowered.aliases {
                flags.push((swap_delimiters(alias), *arg, base));
            }
            if let Some(negated) = arg.lowered.negated_flag() {
                flags.push((swap_delimiters(&negated), *arg, Some(false)));
            }
        }
        Tables { flags, positionals }
    }

    fn lookup(&self, token: &str) -> Option<(&'a Arg, Option<bool>)> {
        let normalized = swap_delimiters(token);
        self.flags
            .iter()
            .find(|(name, _, _)| *name == normalized)
            .map(|(_, arg, value)| (*arg, *value))
    }
}

fn parse_level(
    spec: &ParserSpec,
    inherited: &[&Arg],
    mut tokens: VecDeque<String>,
    prog: String,
    state: &mut DriverState,
) -> Result<(), DriverError> {
    let own: Vec<&Arg> = if spec.cascaded {
        Vec::new()
    } else {
        spec.collect_args()
    };
    let at_leaf = spec.subparser_groups().is_empty();
    let mut table_args: Vec<&Arg> = Vec::new();
    if at_leaf {
        table_args.extend(inherited.iter().copied());
    }
    table_args.extend(own.iter().copied());

    let tables = Tables::build(&table_args);
    let subcommands: Vec<String> = spec
        .subcommand_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut next_positional = 0usize;

    while let Some(token) = tokens.pop_front() {
        // help short-circuits everything else
        if state.add_help && (token == "-h" || token == "--help") {
            return Err(DriverError::Help(crate::help::render(
                spec,
                &table_args,
                &prog,
            )));
        }

        if let Some((arg, pair_value)) = tables.lookup(&token) {
            check_mutex(state, arg, &token)?;
            if let Some(value) = pair_value {
                state
                    .values
                    .insert(arg.lowered.dest.clone(), Parsed::Flag(value));
                continue;
            }
            match arg.lowered.action {
                Some(Action::StoreTrue) => {
                    state
                        .values
                        .insert(arg.lowered.dest.clone(), Parsed::Flag(true));
                }
                Some(Action::StoreFalse) => {
                    state
                        .values
                        .insert(arg.lowered.dest.clone(), Parsed::Flag(false));
                }
                Some(Action::Count) => {
                    bump_count(&mut state.values, &arg.lowered.dest, 1);
                }
                Some(Action::Append) => {
                    let chunk = consume_value(arg, &mut tokens, &tables, &subcommands)?;
                    match state.values.get_mut(&arg.lowered.dest) {
                        Some(Parsed::Appended(groups)) => groups.push(chunk),
                        _ => {
                            state
                                .values
                                .insert(arg.lowered.dest.clone(), Parsed::Appended(vec![chunk]));
                        }
                    }
                }
                _ => {
                    let chunk = consume_value(arg, &mut tokens, &tables, &subcommands)?;
                    state
                        .values
                        .insert(arg.lowered.dest.clone(), Parsed::Tokens(chunk));
                }
            }
            continue;
        }

        // repeated short counter: -vvv bumps -v three times
        if let Some((arg, repeat)) = match_counter_run(&tables, &token) {
            check_mutex(state, arg, &token)?;
            bump_count(&mut state.values, &arg.lowered.dest, repeat);
            continue;
        }

        // --key=value splits and both halves go back on the head
        if token.starts_with("--") {
            if let Some((key, value)) = token.split_once('=') {
                tokens.push_front(value.to_string());
                tokens.push_front(key.to_string());
                continue;
            }
        }

        // subcommand dispatch ends this level's loop
        if let Some((group_dest, option)) = find_subcommand(spec, &token) {
            state
                .values
                .insert(group_dest, Parsed::Subcommand(token.clone()));
            let pass_down: Vec<&Arg> = if spec.cascaded {
                inherited.iter().copied().chain(own.iter().copied()).collect()
            } else {
                inherited.to_vec()
            };
            let rest = std::mem::take(&mut tokens);
            parse_level(option, &pass_down, rest, format!("{} {}", prog, token), state)?;
            break;
        }

        if let Some(arg) = tables.positionals.get(next_positional).copied() {
            tokens.push_front(token);
            let chunk = consume_value(arg, &mut tokens, &tables, &subcommands)?;
            state
                .values
                .insert(arg.lowered.dest.clone(), Parsed::Tokens(chunk));
            next_positional += 1;
            continue;
        }

        state.unknown.push((token, prog.clone()));
    }

    // unmatched variable-count positionals still yield an empty collection
    for arg in &tables.positionals {
        if arg.lowered.required
            && arg.lowered.nargs == Some(ArgNargs::Star)
            && !state.values.contains_key(&arg.lowered.dest)
        {
            state
                .values
                .insert(arg.lowered.dest.clone(), Parsed::Tokens(Vec::new()));
        }
    }

    // no selection: fall back to the group default or fail
    for group in spec.subparser_groups() {
        if state.values.contains_key(&group.dest) {
            continue;
        }
        if group.required {
            return Err(DriverError::Parse(ParseError::MissingSubcommand {
                prog: prog.clone(),
                choices: group.options.keys().cloned().collect(),
            }));
        }
    }

    check_required(&table_args, state, &prog)?;
    check_optional_groups(&table_args, state, &prog)?;
    Ok(())
}

fn bump_count(values: &mut ValuesMap, dest: &str, by: i64) {
    match values.get_mut(dest) {
        Some(Parsed::Count(n)) => *n += by,
        _ => {
            values.insert(dest.to_string(), Parsed::Count(by));
        }
    }
}

fn check_mutex(state: &mut DriverState, arg: &Arg, token: &str) -> Result<(), DriverError> {
    let group = match &arg.lowered.mutex {
        Some(group) => group.clone(),
        None => return Ok(()),
    };
    // repeating one argument is fine; a second member of the group is not
    if let Some((_, _, winner)) = state
        .mutex_observed
        .iter()
        .find(|(g, dest, _)| Rc::ptr_eq(g, &group) && *dest != arg.lowered.dest)
    {
        return Err(DriverError::Parse(ParseError::MutexViolation {
            winner: winner.clone(),
            loser: token.to_string(),
            title: group.title.clone(),
        }));
    }
    state
        .mutex_observed
        .push((group, arg.lowered.dest.clone(), token.to_string()));
    Ok(())
}

/// `-vvv` style: one dash, one repeated letter, where `-v` is a counter.
fn match_counter_run<'a>(tables: &Tables<'a>, token: &str) -> Option<(&'a Arg, i64)> {
    let body = token.strip_prefix('-')?;
    if body.len() < 2 || body.starts_with('-') {
        return None;
    }
    let mut chars = body.chars();
    let first = chars.next()?;
    if !chars.all(|c| c == first) {
        return None;
    }
    let (arg, _) = tables.lookup(&format!("-{}", first))?;
    if arg.lowered.action != Some(Action::Count) {
        return None;
    }
    Some((arg, body.chars().count() as i64))
}

fn find_subcommand<'a>(spec: &'a ParserSpec, token: &str) -> Option<(String, &'a ParserSpec)> {
    for group in spec.subparser_groups() {
        if let Some(option) = group.options.get(token) {
            return Some((group.dest.clone(), option));
        }
    }
    None
}

/// Pop one argument's worth of value tokens off the head of the deque.
fn consume_value(
    arg: &Arg,
    tokens: &mut VecDeque<String>,
    tables: &Tables<'_>,
    subcommands: &[String],
) -> Result<Vec<String>, DriverError> {
    let nargs = arg.lowered.nargs.unwrap_or(ArgNargs::Fixed(1));
    let mut chunk = Vec::new();
    match nargs {
        ArgNargs::Fixed(k) => {
            for _ in 0..k {
                match tokens.pop_front() {
                    Some(token) => chunk.push(token),
                    None => {
                        return Err(DriverError::Parse(ParseError::MissingValue {
                            flag: arg.lowered.name_or_flag.clone(),
                            metavar: arg.lowered.metavar.clone().unwrap_or_default(),
                            expected: k,
                            got: chunk.len(),
                        }))
                    }
                }
            }
        }
        ArgNargs::Star | ArgNargs::Plus | ArgNargs::Opt => {
            let limit = if nargs == ArgNargs::Opt { 1 } else { usize::MAX };
            while chunk.len() < limit {
                let stop = match tokens.front() {
                    None => true,
                    Some(head) => {
                        head.starts_with("--")
                            || tables.lookup(head).is_some()
                            || subcommands.iter().any(|s| s == head)
                    }
                };
                if stop {
                    break;
                }
                chunk.push(tokens.pop_front().expect("peeked above"));
            }
            if nargs == ArgNargs::Plus && chunk.is_empty() {
                return Err(DriverError::Parse(ParseError::MissingValue {
                    flag: arg.lowered.name_or_flag.clone(),
                    metavar: arg.lowered.metavar.clone().unwrap_or_default(),
                    expected: 1,
                    got: 0,
                }));
            }
        }
    }
    if let Some(choices) = &arg.lowered.choices {
        for token in &chunk {
            if !choices.contains(token) {
                return Err(DriverError::Parse(ParseError::InvalidChoice {
                    flag: arg.lowered.name_or_flag.clone(),
                    token: token.clone(),
                    choices: choices.clone(),
                }));
            }
        }
    }
    Ok(chunk)
}

fn check_required(
    table_args: &[&Arg],
    state: &DriverState,
    prog: &str,
) -> Result<(), DriverError> {
    let mut missing: Vec<String> = Vec::new();
    for arg in table_args {
        if arg.lowered.required && !state.values.contains_key(&arg.lowered.dest) {
            missing.push(arg.lowered.name_or_flag.clone());
        }
    }

    // required mutex groups need exactly one member; none seen is an error
    let mut seen_groups: Vec<Rc<MutexGroupConfig>> = Vec::new();
    for arg in table_args {
        if let Some(group) = &arg.lowered.mutex {
            if group.required
                && !seen_groups.iter().any(|g| Rc::ptr_eq(g, group))
                && !state
                    .mutex_observed
                    .iter()
                    .any(|(g, _, _)| Rc::ptr_eq(g, group))
            {
                seen_groups.push(group.clone());
                let members: Vec<String> = table_args
                    .iter()
                    .filter(|a| {
                        a.lowered
                            .mutex
                            .as_ref()
                            .is_some_and(|g| Rc::ptr_eq(g, group))
                    })
                    .map(|a| a.lowered.name_or_flag.clone())
                    .collect();
                missing.push(format!("{{{}}}", members.join(" | ")));
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DriverError::Parse(ParseError::RequiredOptions(vec![(
            prog.to_string(),
            missing,
        )])))
    }
}

/// Optional groups are all-or-nothing: once any member is supplied, every
/// member without a default must be supplied too.
fn check_optional_groups(
    table_args: &[&Arg],
    state: &DriverState,
    prog: &str,
) -> Result<(), DriverError> {
    let mut prefixes: Vec<&str> = Vec::new();
    for arg in table_args {
        if arg.lowered.in_optional_group && !prefixes.contains(&arg.lowered.group_prefix.as_str())
        {
            prefixes.push(&arg.lowered.group_prefix);
        }
    }

    let mut missing: Vec<String> = Vec::new();
    for prefix in prefixes {
        let in_subtree = |a: &Arg| {
            prefix.is_empty()
                || a.lowered.group_prefix == prefix
                || a.lowered
                    .group_prefix
                    .starts_with(&format!("{}.", prefix))
        };
        let engaged = table_args
            .iter()
            .any(|a| in_subtree(a) && state.values.contains_key(&a.lowered.dest));
        if !engaged {
            continue;
        }
        for member in table_args {
            if member.lowered.group_prefix == prefix
                && member.lowered.in_optional_group
                && member.lowered.default.is_missing()
                && !member.lowered.is_fixed()
                && !state.values.contains_key(&member.lowered.dest)
            {
                missing.push(member.lowered.name_or_flag.clone());
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DriverError::Parse(ParseError::RequiredOptions(vec![(
            prog.to_string(),
            missing,
        )])))
    }
}
