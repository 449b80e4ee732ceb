//! Looks for potential typos in unrecognized tokens.

use std::fmt;

/// A candidate correction for an unknown token.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Suggestion {
    Flag(String),
    Command(String),
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suggestion::Flag(name) => write!(f, "`{}`", name),
            Suggestion::Command(name) => write!(f, "command `{}`", name),
        }
    }
}

const MAX_SUGGESTIONS: usize = 3;

/// Rank known flags and subcommand names against an unknown token.
///
/// Substring containment counts as a strong match; otherwise close
/// Levenshtein distance (scaled against token length) qualifies. At most
/// [`MAX_SUGGESTIONS`] survive, best first.
pub(crate) fn suggest<'a, F, C>(token: &str, flags: F, commands: C) -> Vec<Suggestion>
where
    F: Iterator<Item = &'a str>,
    C: Iterator<Item = &'a str>,
{
    let bare = token.trim_start_matches('-');
    if bare.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, Suggestion)> = Vec::new();
    for (candidate, is_flag) in flags
        .map(|f| (f, true))
        .chain(commands.map(|c| (c, false)))
    {
        let candidate_bare = candidate.trim_start_matches('-');
        let distance = if candidate_bare.contains(bare) || bare.contains(candidate_bare) {
            0
        } else {
            levenshtein(bare, candidate_bare)
        };
        let cutoff = bare.chars().count().max(3) / 2 + 1;
        if distance <= cutoff {
            let suggestion = if is_flag {
                Suggestion::Flag(candidate.to_string())
            } else {
                Suggestion::Command(candidate.to_string())
            };
            scored.push((distance, suggestion));
        }
    }

    scored.sort_by_key(|(distance, _)| *distance);
    scored.dedup_by(|a, b| a.1 == b.1);
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, s)| s)
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let mut result = 0;
    let mut cache = a.chars().enumerate().map(|i| i.0 + 1).collect::<Vec<_>>();
    let mut distance_a;
    let mut distance_b;

    for (index_b, code_b) in b.chars().enumerate() {
        result = index_b;
        distance_a = index_b;

        for (index_a, code_a) in a.chars().enumerate() {
            distance_b = if code_a == code_b {
                distance_a
            } else {
                distance_a + 1
            };

            distance_a = cache[index_a];

            result = if distance_a > result {
                if distance_b > result {
                    result + 1
                } else {
                    distance_b
                }
            } else if distance_b > distance_a {
                distance_a + 1
            } else {
                distance_b
            };

            cache[index_a] = result;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_flags_are_suggested() {
        let flags = ["--flag", "--other"];
        let got = suggest("--flga", flags.iter().copied(), std::iter::empty());
        assert_eq!(got, vec![Suggestion::Flag("--flag".to_string())]);
    }

    #[test]
    fn substrings_rank_first() {
        let flags = ["--verbose", "--version"];
        let got = suggest("--verb", flags.iter().copied(), std::iter::empty());
        assert_eq!(got[0], Suggestion::Flag("--verbose".to_string()));
    }

    #[test]
    fn distant_tokens_stay_silent() {
        let flags = ["--flag"];
        let got = suggest(
            "--completely-unrelated",
            flags.iter().copied(),
            std::iter::empty(),
        );
        assert!(got.is_empty());
    }

    #[test]
    fn commands_are_suggested() {
        let commands = ["checkout", "commit"];
        let got = suggest("comit", std::iter::empty(), commands.iter().copied());
        assert_eq!(got[0], Suggestion::Command("commit".to_string()));
    }

    #[test]
    fn levenshtein_distance() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flag", "flag"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
    }
}
