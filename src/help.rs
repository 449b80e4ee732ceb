//! Help message generation.
//!
//! Renders the logical structure only: a description, a usage line, and
//! aligned sections for positional items, options and subcommands. Helptext
//! thunks are evaluated here and nowhere else.

use crate::arguments::ArgNargs;
use crate::parser::{Arg, ParserSpec};
use crate::primitive::Action;

const TABSTOP: usize = 4;

/// Render help for one parser level. `table_args` is what the driver
/// actually accepts here, inherited cascaded arguments included.
pub(crate) fn render(spec: &ParserSpec, table_args: &[&Arg], prog: &str) -> String {
    let mut out = String::new();

    if let Some(description) = &spec.description {
        out.push_str(description);
        out.push_str("\n\n");
    }

    out.push_str("Usage: ");
    out.push_str(prog);
    for arg in table_args.iter().copied() {
        if arg.lowered.help.is_none() || arg.lowered.is_fixed() {
            continue;
        }
        out.push(' ');
        out.push_str(&usage_item(arg));
    }
    if !spec.subparser_groups().is_empty() {
        out.push_str(" COMMAND ...");
    }
    out.push('\n');

    let mut positionals: Vec<(String, Option<String>)> = Vec::new();
    let mut options: Vec<(String, Option<String>)> = Vec::new();
    for arg in table_args.iter().copied() {
        let help = match &arg.lowered.help {
            Some(help) => help.resolve(),
            None => continue,
        };
        if arg.lowered.is_fixed() && help.is_none() {
            continue;
        }
        if arg.lowered.is_positional {
            let metavar = arg.lowered.metavar.clone().unwrap_or_default();
            positionals.push((metavar, help));
        } else {
            options.push((option_column(arg), help));
        }
    }
    options.push(("-h, --help".to_string(), Some("Prints help information".to_string())));

    let mut commands: Vec<(String, Option<String>)> = Vec::new();
    for group in spec.subparser_groups() {
        for (name, option) in &group.options {
            let description = option
                .description
                .as_deref()
                .and_then(|d| d.lines().next())
                .map(str::to_string);
            commands.push((name.clone(), description));
        }
    }

    if !positionals.is_empty() {
        out.push('\n');
        out.push_str("Available positional items:\n");
        render_section(&mut out, &positionals);
    }

    out.push('\n');
    out.push_str("Available options:\n");
    render_section(&mut out, &options);

    if !commands.is_empty() {
        out.push('\n');
        out.push_str("Available commands:\n");
        render_section(&mut out, &commands);
    }

    out
}

fn usage_item(arg: &Arg) -> String {
    let lowered = &arg.lowered;
    if lowered.is_positional {
        let metavar = lowered.metavar.clone().unwrap_or_default();
        return match lowered.nargs {
            Some(ArgNargs::Opt) => format!("[{}]", metavar),
            _ if lowered.required => metavar,
            _ => format!("[{}]", metavar),
        };
    }
    let body = match (lowered.action, &lowered.metavar) {
        (Some(Action::BooleanOptional | Action::StoreTrue | Action::StoreFalse), _)
        | (Some(Action::Count), _) => lowered.name_or_flag.clone(),
        (_, Some(metavar)) => format!("{} {}", lowered.name_or_flag, metavar),
        (_, None) => lowered.name_or_flag.clone(),
    };
    if lowered.required {
        body
    } else {
        format!("[{}]", body)
    }
}

fn option_column(arg: &Arg) -> String {
    let lowered = &arg.lowered;
    let mut names: Vec<String> = lowered.aliases.clone();
    names.push(lowered.name_or_flag.clone());
    if let Some(negated) = lowered.negated_flag() {
        names.push(negated);
    }
    let joined = names.join(", ");
    match (&lowered.action, &lowered.metavar) {
        (Some(Action::BooleanOptional | Action::StoreTrue | Action::StoreFalse | Action::Count), _) => {
            joined
        }
        (_, Some(metavar)) => format!("{} {}", joined, metavar),
        (_, None) => joined,
    }
}

fn render_section(out: &mut String, rows: &[(String, Option<String>)]) {
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
    for (left, help) in rows {
        match help {
            Some(help) => {
                let mut lines = help.lines();
                let first = lines.next().unwrap_or("");
                out.push_str(&format!(
                    "{:indent$}{:width$}  {}\n",
                    "",
                    left,
                    first,
                    indent = TABSTOP,
                    width = width
                ));
                for line in lines {
                    out.push_str(&format!(
                        "{:indent$}{:width$}  {}\n",
                        "",
                        "",
                        line,
                        indent = TABSTOP,
                        width = width
                    ));
                }
            }
            None => {
                out.push_str(&format!("{:indent$}{}\n", "", left, indent = TABSTOP));
            }
        }
    }
}
