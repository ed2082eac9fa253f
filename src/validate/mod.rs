//! Answer validation
//!
//! At each checkpoint the learner submits the stack they believe is correct.
//! - Call-stack answers are compared by display name, in order.
//! - Event-loop answers are checked with an [`EventLoopCheck`]. The default,
//!   [`EventLoopCheck::Structural`], only requires every queue to be present;
//!   content equality is available as [`EventLoopCheck::Exact`] and must be
//!   asked for explicitly.

use crate::config::ReplayConfig;
use crate::errors::{Result, StackplayError};
use crate::frame::{frame_names, QueueClass, StackFrame};
use crate::level::Level;
use crate::mapper::MappingStrategy;
use crate::replay::{callstack_for_level, replay_event_loop};
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Submitted call stacks keyed by step
pub type CallstackAnswers = BTreeMap<usize, Vec<String>>;

/// Submitted event-loop states keyed by step
pub type EventLoopAnswers = BTreeMap<usize, QueueSubmission>;

/// Result of checking one call-stack checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub step: usize,
    pub passed: bool,
    pub expected: Vec<String>,
    pub submitted: Option<Vec<String>>,
    /// First index where the lists differ (length mismatch counts)
    pub first_mismatch: Option<usize>,
}

/// Compare a submitted stack with the expected one, bottom first
pub fn check_callstack(step: usize, submitted: &[String], expected: &[StackFrame]) -> Verdict {
    let expected = frame_names(expected);
    let first_mismatch = first_difference(submitted, &expected);

    Verdict {
        step,
        passed: first_mismatch.is_none(),
        expected,
        submitted: Some(submitted.to_vec()),
        first_mismatch,
    }
}

fn first_difference(submitted: &[String], expected: &[String]) -> Option<usize> {
    let common = submitted.len().min(expected.len());
    (0..common)
        .find(|&i| submitted[i] != expected[i])
        .or((submitted.len() != expected.len()).then_some(common))
}

/// Verdicts for every checkpoint of a level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelReport {
    pub verdicts: Vec<Verdict>,
}

impl LevelReport {
    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(|v| v.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter().filter(|v| !v.passed)
    }
}

/// Check every checkpoint of `level` against `answers`.
///
/// The expected stack is the level's authored snapshot when it has one and
/// the replayed (or interpolated) stack otherwise. A checkpoint without an
/// answer fails. Checkpoints past the last step are skipped.
pub fn check_level(
    level: &Level,
    strategy: MappingStrategy<'_>,
    config: &ReplayConfig,
    answers: &CallstackAnswers,
) -> LevelReport {
    let replayed = callstack_for_level(level, strategy, config);

    let verdicts = level
        .checkpoints
        .iter()
        .filter_map(|&step| {
            let expected = level
                .expected_at(step)
                .or_else(|| replayed.get(step).map(Vec::as_slice))?;

            Some(match answers.get(&step) {
                Some(submitted) => check_callstack(step, submitted, expected),
                None => Verdict {
                    step,
                    passed: false,
                    expected: frame_names(expected),
                    submitted: None,
                    first_mismatch: Some(0),
                },
            })
        })
        .collect();

    let report = LevelReport { verdicts };
    tracing::debug!(
        checkpoints = report.verdicts.len(),
        passed = report.passed(),
        "checked call stack answers"
    );
    report
}

/// How strictly event-loop answers are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLoopCheck {
    /// Every queue must be present; contents are not compared
    #[default]
    Structural,
    /// Every queue must match exactly, in order
    Exact,
}

/// A learner's event-loop answer. Absent queues are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSubmission {
    pub callstack: Option<Vec<String>>,
    pub microtask: Option<Vec<String>>,
    pub macrotask: Option<Vec<String>>,
}

impl QueueSubmission {
    pub fn queue(&self, class: QueueClass) -> Option<&[String]> {
        match class {
            QueueClass::Callstack => self.callstack.as_deref(),
            QueueClass::Microtask => self.microtask.as_deref(),
            QueueClass::Macrotask => self.macrotask.as_deref(),
        }
    }
}

/// Result of checking one event-loop checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLoopVerdict {
    pub step: usize,
    pub passed: bool,
    pub missing: Vec<QueueClass>,
    pub mismatched: Vec<QueueClass>,
}

const QUEUES: [QueueClass; 3] = [
    QueueClass::Callstack,
    QueueClass::Microtask,
    QueueClass::Macrotask,
];

pub fn check_event_loop(
    step: usize,
    submission: &QueueSubmission,
    expected: &Snapshot,
    check: EventLoopCheck,
) -> EventLoopVerdict {
    let missing: Vec<QueueClass> = QUEUES
        .into_iter()
        .filter(|&class| submission.queue(class).is_none())
        .collect();

    let mismatched: Vec<QueueClass> = match check {
        EventLoopCheck::Structural => Vec::new(),
        EventLoopCheck::Exact => QUEUES
            .into_iter()
            .filter(|&class| {
                submission
                    .queue(class)
                    .is_some_and(|names| names != expected.names(class).as_slice())
            })
            .collect(),
    };

    EventLoopVerdict {
        step,
        passed: missing.is_empty() && mismatched.is_empty(),
        missing,
        mismatched,
    }
}

/// Check every checkpoint of `level` against event-loop answers.
/// A checkpoint without an answer fails with all queues missing.
pub fn check_event_loop_level(
    level: &Level,
    config: &ReplayConfig,
    answers: &EventLoopAnswers,
    check: EventLoopCheck,
) -> Vec<EventLoopVerdict> {
    let steps = replay_event_loop(level, config);
    let empty = QueueSubmission::default();

    level
        .checkpoints
        .iter()
        .filter_map(|&step| {
            let expected = &steps.get(step)?.after;
            let submission = answers.get(&step).unwrap_or(&empty);
            Some(check_event_loop(step, submission, expected, check))
        })
        .collect()
}

pub fn load_callstack_answers(path: &Path) -> Result<CallstackAnswers> {
    let text = fs::read_to_string(path).map_err(|e| StackplayError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| StackplayError::json("answers", e))
}

pub fn load_event_loop_answers(path: &Path) -> Result<EventLoopAnswers> {
    let text = fs::read_to_string(path).map_err(|e| StackplayError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| StackplayError::json("answers", e))
}
