//! Step-to-token mapping
//!
//! Each pedagogical step executes a contiguous slice of the trace. This module
//! decides where those slices begin and end:
//! - [`MappingStrategy::Strict`]: step `i` executes token `i`
//! - [`MappingStrategy::Flexible`]: a proportional baseline nudged by what
//!   the step says it does (call, return, start, `console.log`)
//! - [`MappingStrategy::Custom`]: the caller picks each step's target token
//! - [`equal_split`]: plain proportional chunks, used by the event-loop view
//!
//! # Range invariants
//!
//! Ranges are half-open, contiguous, non-overlapping and non-decreasing. For
//! the flexible and custom strategies the last range always ends at the last
//! token, so together they cover the whole trace. Strict mapping does not:
//! with fewer steps than tokens the tail of the trace is never replayed.

use crate::level::{Level, StepKind, Token};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Serializable strategy selector (config files, CLI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Strict,
    #[default]
    Flexible,
}

/// Caller-supplied target picker: `(step index, tokens, level) → token index`.
/// `'f` bounds whatever the picker borrows.
pub type TargetFn<'f> = dyn Fn(usize, &[Token], &Level) -> usize + 'f;

/// How steps are assigned their token ranges
#[derive(Clone, Copy)]
pub enum MappingStrategy<'a> {
    Strict,
    Flexible,
    Custom(&'a TargetFn<'a>),
}

impl fmt::Debug for MappingStrategy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingStrategy::Strict => f.write_str("Strict"),
            MappingStrategy::Flexible => f.write_str("Flexible"),
            MappingStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<StrategyKind> for MappingStrategy<'static> {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Strict => MappingStrategy::Strict,
            StrategyKind::Flexible => MappingStrategy::Flexible,
        }
    }
}

/// Tokens executed by one step: `start..end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRange {
    pub step: usize,
    pub start: usize,
    pub end: usize,
}

impl StepRange {
    /// Last token executed by this step, `None` before the first token
    pub fn target(&self) -> Option<usize> {
        self.end.checked_sub(1)
    }

    pub fn positions(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

/// Assign every step of `level` a token range
pub fn map_steps(level: &Level, strategy: MappingStrategy<'_>) -> Vec<StepRange> {
    let token_count = level.tokens.len();
    let step_count = level.steps.len();

    if token_count == 0 || step_count == 0 {
        tracing::debug!(token_count, step_count, "nothing to map");
        return Vec::new();
    }

    let ranges = match strategy {
        MappingStrategy::Strict => strict_ranges(token_count, step_count),
        MappingStrategy::Flexible => clamped_ranges(token_count, step_count, |i| {
            flexible_target(level, i)
        }),
        MappingStrategy::Custom(target) => clamped_ranges(token_count, step_count, |i| {
            target(i, level.tokens.as_slice(), level)
        }),
    };

    tracing::debug!(?strategy, token_count, step_count, "mapped steps to tokens");
    ranges
}

/// Split `token_count` tokens into `step_count` proportional chunks
pub fn equal_split(token_count: usize, step_count: usize) -> Vec<StepRange> {
    if token_count == 0 || step_count == 0 {
        return Vec::new();
    }

    (0..step_count)
        .map(|i| StepRange {
            step: i,
            start: i * token_count / step_count,
            end: (i + 1) * token_count / step_count,
        })
        .collect()
}

fn strict_ranges(token_count: usize, step_count: usize) -> Vec<StepRange> {
    (0..step_count)
        .map(|i| StepRange {
            step: i,
            start: i.min(token_count),
            end: (i + 1).min(token_count),
        })
        .collect()
}

/// Turn raw per-step targets into monotonic ranges covering every token
fn clamped_ranges<F>(token_count: usize, step_count: usize, mut target_of: F) -> Vec<StepRange>
where
    F: FnMut(usize) -> usize,
{
    let last_token = token_count - 1;
    let mut ranges = Vec::with_capacity(step_count);
    let mut prev_end = 0;

    for i in 0..step_count {
        let target = target_of(i).min(last_token);
        let end = if i + 1 == step_count {
            token_count
        } else {
            (target + 1).max(prev_end)
        };

        ranges.push(StepRange {
            step: i,
            start: prev_end,
            end,
        });
        prev_end = end;
    }

    ranges
}

/// Target token for step `i` under the flexible heuristics
fn flexible_target(level: &Level, i: usize) -> usize {
    let tokens = &level.tokens;
    let baseline = i * tokens.len() / level.steps.len();

    let found = match level.steps[i].effective_kind() {
        Some(StepKind::Start) => Some(0),
        Some(StepKind::Call) => (baseline..tokens.len()).find(|&j| !tokens[j].is_return()),
        Some(StepKind::Return) => (baseline..tokens.len()).find(|&j| tokens[j].is_return()),
        Some(StepKind::Log) => tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_console_log())
            .nth(i / 2)
            .map(|(j, _)| j),
        Some(StepKind::Expression) | None => None,
    };

    found.unwrap_or(baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{Step, StepKind};

    fn assert_partition(ranges: &[StepRange], token_count: usize) {
        let mut expected_start = 0;
        for range in ranges {
            assert_eq!(range.start, expected_start, "gap or overlap at {:?}", range);
            assert!(range.end >= range.start);
            expected_start = range.end;
        }
        assert_eq!(expected_start, token_count);
    }

    #[test]
    fn test_strict_one_token_per_step() {
        let level = Level::with_step_count(&["a", "b", "c"], 3);
        let ranges = map_steps(&level, MappingStrategy::Strict);
        let targets: Vec<_> = ranges.iter().map(|r| r.target()).collect();
        assert_eq!(targets, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_strict_leaves_tail_unreplayed() {
        let level = Level::with_step_count(&["a", "b", "c", "d"], 2);
        let ranges = map_steps(&level, MappingStrategy::Strict);
        assert_eq!(ranges.last().map(|r| r.end), Some(2));
    }

    #[test]
    fn test_strict_surplus_steps_are_empty() {
        let level = Level::with_step_count(&["a"], 3);
        let ranges = map_steps(&level, MappingStrategy::Strict);
        assert!(!ranges[0].is_empty());
        assert!(ranges[1].is_empty());
        assert!(ranges[2].is_empty());
    }

    #[test]
    fn test_flexible_without_hints_is_proportional() {
        let level = Level::with_step_count(&["a", "b", "c", "d", "e", "f"], 3);
        let ranges = map_steps(&level, MappingStrategy::Flexible);
        assert_eq!(ranges[0].positions(), 0..1);
        assert_eq!(ranges[1].positions(), 1..3);
        assert_eq!(ranges[2].positions(), 3..6);
        assert_partition(&ranges, 6);
    }

    #[test]
    fn test_flexible_call_and_return_hints() {
        let tokens = ["<global>", "a", "b", "log", "b-return", "a-return", "<global>-return"];
        let level = Level::new(&tokens, &["start", "a is called", "b returns", "done"]);
        let ranges = map_steps(&level, MappingStrategy::Flexible);

        assert_eq!(ranges[0].target(), Some(0));
        assert_eq!(ranges[1].target(), Some(1));
        // baseline 3 is "log"; the next return token is "b-return" at 4
        assert_eq!(ranges[2].target(), Some(4));
        assert_partition(&ranges, tokens.len());
    }

    #[test]
    fn test_flexible_console_log_picks_kth_occurrence() {
        let tokens = ["<global>", "console.log", "f", "console.log", "f-return", "<global>-return"];
        let mut level = Level::with_step_count(&tokens, 4);
        level.steps[2] = Step::new(2, "").with_kind(StepKind::Log);
        let ranges = map_steps(&level, MappingStrategy::Flexible);
        // k = 2 / 2 = 1 → second console.log at index 3
        assert_eq!(ranges[2].target(), Some(3));
        assert_partition(&ranges, tokens.len());
    }

    #[test]
    fn test_flexible_clamps_backwards_targets() {
        let tokens = ["<global>", "a", "a-return", "b", "b-return", "<global>-return"];
        let level = Level::new(&tokens, &["", "", "", "start again", ""]);
        let ranges = map_steps(&level, MappingStrategy::Flexible);
        // "start" asks for token 0, but earlier steps already consumed 0..3
        assert!(ranges[3].is_empty());
        assert_eq!(ranges[3].start, 3);
        assert_partition(&ranges, tokens.len());
    }

    #[test]
    fn test_custom_strategy_is_clamped() {
        let tokens = ["a", "b", "c", "d"];
        let level = Level::with_step_count(&tokens, 3);
        let backwards = |step: usize, _: &[Token], _: &Level| if step == 1 { 0 } else { step * 10 };
        let ranges = map_steps(&level, MappingStrategy::Custom(&backwards));

        assert_eq!(ranges[0].positions(), 0..1);
        assert!(ranges[1].is_empty());
        assert_eq!(ranges[2].positions(), 1..4);
        assert_partition(&ranges, tokens.len());
    }

    #[test]
    fn test_custom_strategy_borrows_caller_data() {
        let level = Level::with_step_count(&["a", "b", "c", "d"], 3);
        let targets = vec![0, 2, 2];
        let pick = |step: usize, _: &[Token], _: &Level| targets[step];
        let ranges = map_steps(&level, MappingStrategy::Custom(&pick));

        assert_eq!(ranges[0].positions(), 0..1);
        assert_eq!(ranges[1].positions(), 1..3);
        assert_eq!(ranges[2].positions(), 3..4);
    }

    #[test]
    fn test_empty_inputs_yield_no_ranges() {
        let no_tokens = Level::with_step_count::<&str>(&[], 3);
        assert!(map_steps(&no_tokens, MappingStrategy::Flexible).is_empty());

        let no_steps = Level::with_step_count(&["a"], 0);
        assert!(map_steps(&no_steps, MappingStrategy::Strict).is_empty());
        assert!(equal_split(0, 4).is_empty());
    }

    #[test]
    fn test_equal_split_partitions() {
        let ranges = equal_split(7, 3);
        assert_eq!(ranges[0].positions(), 0..2);
        assert_eq!(ranges[1].positions(), 2..4);
        assert_eq!(ranges[2].positions(), 4..7);
        assert_partition(&ranges, 7);

        let sparse = equal_split(2, 4);
        assert_partition(&sparse, 2);
        assert_eq!(sparse.iter().filter(|r| r.is_empty()).count(), 2);
    }
}
