//! Field-name and subcommand-name plumbing.
//!
//! The active delimiter decides whether `field_a` surfaces as `--field-a` or
//! `--field_a`. It is scoped state: each top-level invocation installs its
//! delimiter and restores the previous one on the way out, unwinds included.

use std::cell::Cell;

/// Synthetic field name used when a non-struct schema is wrapped in a
/// single-field record; filtered out of every displayed name and path.
pub(crate) const DUMMY_FIELD: &str = "__declargs_dummy_field__";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Delimiter {
    Hyphen,
    Underscore,
}

impl Delimiter {
    pub(crate) fn as_char(self) -> char {
        match self {
            Delimiter::Hyphen => '-',
            Delimiter::Underscore => '_',
        }
    }
}

thread_local! {
    static DELIMITER: Cell<Delimiter> = const { Cell::new(Delimiter::Hyphen) };
}

pub(crate) fn get_delimiter() -> Delimiter {
    DELIMITER.with(Cell::get)
}

/// Installs `delimiter` until the guard drops.
pub(crate) struct DelimiterGuard {
    prev: Delimiter,
}

pub(crate) fn set_delimiter(delimiter: Delimiter) -> DelimiterGuard {
    let prev = DELIMITER.with(|d| d.replace(delimiter));
    DelimiterGuard { prev }
}

impl Drop for DelimiterGuard {
    fn drop(&mut self) {
        DELIMITER.with(|d| d.set(self.prev));
    }
}

/// Rewrite one dotted-path segment to the active delimiter, leaving leading
/// underscores alone.
pub(crate) fn replace_delimiter_in_part(part: &str) -> String {
    match get_delimiter() {
        Delimiter::Hyphen => {
            let stripped = part.trim_start_matches('_');
            let lead = &part[..part.len() - stripped.len()];
            format!("{}{}", lead, stripped.replace('_', "-"))
        }
        Delimiter::Underscore => part.replace('-', "_"),
    }
}

/// Join parts of a field name for display. Nesting levels join with `.`,
/// words inside a part with the active delimiter.
///
/// `["parent_1", "child"]` becomes `parent-1.child` under a hyphen delimiter.
pub(crate) fn make_field_name<S: AsRef<str>>(parts: &[S]) -> String {
    let joined = parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".");
    joined
        .split('.')
        .filter(|part| !part.is_empty() && *part != DUMMY_FIELD)
        .map(replace_delimiter_in_part)
        .collect::<Vec<_>>()
        .join(".")
}

/// Both delimiter spellings of a flag are accepted on input; normalize to the
/// hyphen form for table lookups, leaving leading dashes and the dotted
/// structure alone.
pub(crate) fn swap_delimiters(name: &str) -> String {
    let stripped = name.trim_start_matches('-');
    let lead = &name[..name.len() - stripped.len()];
    let swapped = stripped
        .split('.')
        .map(|part| {
            let inner = part.trim_start_matches('_');
            let ilead = &part[..part.len() - inner.len()];
            format!("{}{}", ilead, inner.replace('_', "-"))
        })
        .collect::<Vec<_>>()
        .join(".");
    format!("{}{}", lead, swapped)
}

/// `SomeClassName` to `some-class-name` (or `some_class_name`), inserting the
/// active delimiter at lower-to-upper and digit-to-upper transitions.
pub(crate) fn delimited_from_camel_case(name: &str) -> String {
    let delimiter = get_delimiter().as_char();
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (ix, c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && ix > 0 {
            let prev = chars[ix - 1];
            let next_lower = chars.get(ix + 1).is_some_and(|n| n.is_ascii_lowercase());
            if (prev.is_ascii_lowercase() || prev.is_ascii_digit() || next_lower)
                && !out.ends_with(delimiter)
            {
                out.push(delimiter);
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Namespace a generated subcommand name under its parent prefix.
pub(crate) fn prefixed_subcommand_name(prefix: &str, suffix: &str, use_prefix: bool) -> String {
    if prefix.is_empty() || !use_prefix {
        return suffix.to_string();
    }
    let parts: Vec<&str> = suffix.split('.').collect();
    format!("{}:{}", prefix, make_field_name(&parts))
}

/// `T` to `[T [T ...]]`; long metavars are elided.
pub(crate) fn multi_metavar_from_single(single: &str) -> String {
    if single.len() >= 32 {
        format!("[{} [...]]", single)
    } else {
        format!("[{} [{} ...]]", single, single)
    }
}

/// Metavar generation for unions: brace-sets merge, anything containing a
/// space gets wrapped in braces, the rest joins with `|`.
///
/// `{0,1,2}` and `{3,4}` merge into `{0,1,2,3,4}`; `STR` and `INT INT`
/// become `STR|{INT INT}`.
pub(crate) fn join_union_metavars<S: AsRef<str>>(metavars: &[S]) -> String {
    let mut merged: Vec<String> = Vec::new();
    for metavar in metavars {
        let curr = metavar.as_ref();
        match merged.last_mut() {
            Some(prev)
                if prev.starts_with('{')
                    && prev.ends_with('}')
                    && curr.starts_with('{')
                    && curr.ends_with('}') =>
            {
                prev.pop();
                prev.push(',');
                prev.push_str(&curr[1..]);
            }
            _ => merged.push(curr.to_string()),
        }
    }
    for metavar in &mut merged {
        if metavar.contains(' ') && !(metavar.starts_with('{') && metavar.ends_with('}')) {
            *metavar = format!("{{{}}}", metavar);
        }
    }
    merged.join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_conversion() {
        assert_eq!(
            delimited_from_camel_case("HttpServer2Config"),
            "http-server2-config"
        );
        assert_eq!(delimited_from_camel_case("ABCWord"), "abc-word");
        assert_eq!(delimited_from_camel_case("Simple"), "simple");
        let _guard = set_delimiter(Delimiter::Underscore);
        assert_eq!(delimited_from_camel_case("TrainConfig"), "train_config");
    }

    #[test]
    fn field_name_joining() {
        assert_eq!(make_field_name(&["parent_1", "child"]), "parent-1.child");
        assert_eq!(
            make_field_name(&["parents", "1", "_child_node"]),
            "parents.1._child-node"
        );
        let _guard = set_delimiter(Delimiter::Underscore);
        assert_eq!(make_field_name(&["parent-1", "child"]), "parent_1.child");
    }

    #[test]
    fn union_metavar_merging() {
        assert_eq!(join_union_metavars(&["NONE", "INT"]), "NONE|INT");
        assert_eq!(join_union_metavars(&["{0,1,2}", "{3,4}"]), "{0,1,2,3,4}");
        assert_eq!(
            join_union_metavars(&["{0,1}", "{3,4}", "STR"]),
            "{0,1,3,4}|STR"
        );
        assert_eq!(join_union_metavars(&["STR", "INT INT"]), "STR|{INT INT}");
    }

    #[test]
    fn delimiter_guard_restores_on_drop() {
        assert_eq!(get_delimiter(), Delimiter::Hyphen);
        {
            let _guard = set_delimiter(Delimiter::Underscore);
            assert_eq!(get_delimiter(), Delimiter::Underscore);
        }
        assert_eq!(get_delimiter(), Delimiter::Hyphen);
    }
}
