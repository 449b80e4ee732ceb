//! Error types for the two failure domains: schema problems detected while
//! building parser specs, and user input problems detected while parsing.

use crate::youmean::Suggestion;

/// A problem with the schema itself, reported to the caller before any
/// command line token is looked at.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// No primitive rule accepts the type and it is not a struct.
    #[error("unsupported type annotation: {0}")]
    UnsupportedTypeAnnotation(String),

    /// A default value incompatible with its declared type.
    #[error("invalid default for `{field}`: {message}")]
    InvalidDefault { field: String, message: String },

    /// A subparser default that matches none of the union branches.
    #[error("could not match default for `{field}` to any subcommand in {{{choices}}}")]
    UnmatchedSubcommandDefault { field: String, choices: String },

    /// Schema nesting exceeded the cycle-detection threshold.
    #[error("type nesting too deep at `{0}`; recursive schemas are not supported")]
    NestingTooDeep(String),

    /// An alias that does not start with `-`.
    #[error("alias `{alias}` for `{field}` must start with `-`")]
    BadAlias { field: String, alias: String },

    /// Failed to write a completion spec.
    #[error("could not write completion spec: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a parse stopped. Rendered once at the end of the run.
#[derive(Debug, Clone)]
pub(crate) enum ParseError {
    /// Tokens that matched nothing, with the subcommand each belongs to and
    /// ranked suggestions.
    Unrecognized(Vec<UnknownArg>),

    /// Required arguments that never showed up, grouped by subcommand.
    RequiredOptions(Vec<(String, Vec<String>)>),

    /// A required subparser with no token and no default.
    MissingSubcommand { prog: String, choices: Vec<String> },

    /// Two arguments from one mutually-exclusive group.
    MutexViolation {
        winner: String,
        loser: String,
        title: Option<String>,
    },

    /// A token outside an argument's fixed choices.
    InvalidChoice {
        flag: String,
        token: String,
        choices: Vec<String>,
    },

    /// An argument that wanted more value tokens than were left.
    MissingValue {
        flag: String,
        metavar: String,
        expected: usize,
        got: usize,
    },

    /// A primitive instantiator or constructor rejected collected tokens.
    Instantiation { flag: String, message: String },
}

/// One unrecognized token and where it was seen.
#[derive(Debug, Clone)]
pub(crate) struct UnknownArg {
    pub(crate) token: String,
    pub(crate) prog: String,
    pub(crate) suggestions: Vec<Suggestion>,
}

impl ParseError {
    pub(crate) fn render(&self) -> String {
        match self {
            ParseError::Unrecognized(unknowns) => {
                let mut out = String::from("unrecognized options:");
                for unknown in unknowns {
                    out.push_str(&format!("\n  {} (in {})", unknown.token, unknown.prog));
                    for suggestion in &unknown.suggestions {
                        out.push_str(&format!("\n    perhaps you meant {}", suggestion));
                    }
                }
                out
            }
            ParseError::RequiredOptions(groups) => {
                let mut out = String::from("the following options are required:");
                for (prog, flags) in groups {
                    out.push_str(&format!("\n  {} (in {})", flags.join(", "), prog));
                }
                out
            }
            ParseError::MissingSubcommand { prog, choices } => {
                format!(
                    "missing subcommand for {} (choose from {{{}}})",
                    prog,
                    choices.join(",")
                )
            }
            ParseError::MutexViolation {
                winner,
                loser,
                title,
            } => match title {
                Some(title) => format!(
                    "{} cannot be used at the same time as {} (group `{}` accepts at most one)",
                    loser, winner, title
                ),
                None => format!("{} cannot be used at the same time as {}", loser, winner),
            },
            ParseError::InvalidChoice {
                flag,
                token,
                choices,
            } => format!(
                "invalid choice {:?} for {} (choose from {{{}}})",
                token,
                flag,
                choices.join(",")
            ),
            ParseError::MissingValue {
                flag,
                metavar,
                expected,
                got,
            } => format!(
                "{} requires {} value{} {}, got {}",
                flag,
                expected,
                if *expected == 1 { "" } else { "s" },
                metavar,
                got
            ),
            ParseError::Instantiation { flag, message } => {
                format!("couldn't parse {}: {}", flag, message)
            }
        }
    }
}

/// Unsuccessful command line parsing outcome, use it for unit tests.
///
/// `Stdout` holds help output and exits with code 0; `Stderr` holds a
/// genuine parsing error and exits with code 2.
#[derive(Clone, Debug)]
pub enum ParseFailure {
    /// Print this to stdout and exit with success code.
    Stdout(String),
    /// Print this to stderr and exit with failure code.
    Stderr(String),
}

impl ParseFailure {
    /// Returns the contained `stderr` value - for unit tests
    ///
    /// # Panics
    ///
    /// Panics if failure contains `stdout`
    #[allow(clippy::must_use_candidate)]
    #[track_caller]
    pub fn unwrap_stderr(self) -> String {
        match self {
            Self::Stderr(err) => err,
            Self::Stdout(..) => panic!("not an stderr: {:?}", self),
        }
    }

    /// Returns the contained `stdout` value - for unit tests
    ///
    /// # Panics
    ///
    /// Panics if failure contains `stderr`
    #[allow(clippy::must_use_candidate)]
    #[track_caller]
    pub fn unwrap_stdout(self) -> String {
        match self {
            Self::Stdout(out) => out,
            Self::Stderr(..) => panic!("not an stdout: {:?}", self),
        }
    }

    /// Returns the exit code for the failure
    #[allow(clippy::must_use_candidate)]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Stdout(..) => 0,
            Self::Stderr(..) => 2,
        }
    }

    /// Prints the message to `stdout` or `stderr` as appropriate.
    pub fn print_message(&self) {
        match self {
            ParseFailure::Stdout(msg) => println!("{}", msg),
            ParseFailure::Stderr(msg) => eprintln!("{}{}", error_prefix(), msg),
        }
    }
}

#[cfg(feature = "color")]
fn error_prefix() -> String {
    use owo_colors::OwoColorize;
    "Error: "
        .if_supports_color(owo_colors::Stream::Stderr, |s| s.bold())
        .to_string()
}

#[cfg(not(feature = "color"))]
fn error_prefix() -> &'static str {
    "Error: "
}
