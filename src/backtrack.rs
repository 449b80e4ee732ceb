//! Backtracking parser for variable-length argument sequences.
//!
//! Composition creates ambiguity whenever an inner primitive admits more than
//! one arity, for example a union of a scalar and a pair. This resolves it
//! with a depth-first search over per-spec arity choices, longest first, kept
//! iterative with an explicit stack so long inputs cannot overflow the call
//! stack.

use crate::primitive::{Nargs, PrimitiveSpec};
use crate::value::Value;

struct State {
    spec_idx: usize,
    arg_idx: usize,
    /// The value parsed on the edge leading into this state, if any.
    value: Option<Value>,
    /// Arena link used to reconstruct the accepted path.
    parent: Option<usize>,
    nargs_option_idx: usize,
}

/// Parse `args` against `specs`.
///
/// In repeating mode the spec sequence is applied cyclically over all
/// remaining input and success requires complete cycles; used for sequences
/// and maps. In one-shot mode each spec is consumed in order exactly once;
/// used for fixed-length tuples with union members.
///
/// Returns the parsed values, or `None` when no valid parse exists.
pub(crate) fn parse_with_backtracking(
    args: &[String],
    specs: &[PrimitiveSpec],
    repeating: bool,
) -> Option<Vec<Value>> {
    debug_assert!(!specs.is_empty(), "at least one spec is required");

    let mut arena = vec![State {
        spec_idx: 0,
        arg_idx: 0,
        value: None,
        parent: None,
        nargs_option_idx: 0,
    }];
    let mut stack = vec![0usize];

    let reconstruct = |arena: &[State], mut ix: usize| -> Vec<Value> {
        let mut result = Vec::new();
        loop {
            let state = &arena[ix];
            match state.parent {
                Some(parent) => {
                    if let Some(value) = &state.value {
                        result.push(value.clone());
                    }
                    ix = parent;
                }
                None => break,
            }
        }
        result.reverse();
        result
    };

    while let Some(state_ix) = stack.pop() {
        let (spec_idx, arg_idx, nargs_option_idx) = {
            let state = &arena[state_ix];
            (state.spec_idx, state.arg_idx, state.nargs_option_idx)
        };

        let spec = if repeating {
            // success when all args are consumed at a cycle boundary
            if arg_idx == args.len() {
                if specs.len() > 1 && spec_idx % specs.len() != 0 {
                    continue;
                }
                return Some(reconstruct(&arena, state_ix));
            }
            &specs[spec_idx % specs.len()]
        } else {
            if spec_idx == specs.len() {
                if arg_idx == args.len() {
                    return Some(reconstruct(&arena, state_ix));
                }
                continue;
            }
            if arg_idx == args.len() {
                continue;
            }
            &specs[spec_idx]
        };

        // candidate arities for this spec, longest first for Star
        let nargs_option = match spec.nargs {
            Nargs::Fixed(k) => {
                if nargs_option_idx >= 1 {
                    continue;
                }
                k
            }
            Nargs::Star => {
                let remaining = args.len() - arg_idx;
                if nargs_option_idx > remaining {
                    continue;
                }
                remaining - nargs_option_idx
            }
        };

        // re-queue this state for the next arity before trying this one
        let has_next = match spec.nargs {
            Nargs::Fixed(_) => false,
            Nargs::Star => nargs_option_idx < args.len() - arg_idx,
        };
        if has_next {
            arena.push(State {
                spec_idx,
                arg_idx,
                value: arena[state_ix].value.clone(),
                parent: arena[state_ix].parent,
                nargs_option_idx: nargs_option_idx + 1,
            });
            stack.push(arena.len() - 1);
        }

        if arg_idx + nargs_option > args.len() {
            continue;
        }

        let candidate = &args[arg_idx..arg_idx + nargs_option];
        if let Some(choices) = &spec.choices {
            if candidate.iter().any(|arg| !choices.contains(arg)) {
                continue;
            }
        }

        if let Ok(value) = spec.instantiate(candidate) {
            arena.push(State {
                spec_idx: spec_idx + 1,
                arg_idx: arg_idx + nargs_option,
                value: Some(value),
                parent: Some(state_ix),
                nargs_option_idx: 0,
            });
            stack.push(arena.len() - 1);
        }
    }

    None
}
