//! Level descriptors
//!
//! A level is static, hand-authored data:
//! - [`token`]: the execution trace, one classified [`Token`] per entry
//! - [`Step`]: the pedagogical steps the learner walks through
//! - checkpoints and the expected call stack at each of them
//!
//! Levels are usually loaded from JSON through [`LevelDescriptor`]. Expected
//! frames may be written as bare names (`"<global>"`) or as full
//! [`StackFrame`] objects; bare names are expanded with the configured colors.

pub mod token;

use crate::config::ReplayConfig;
use crate::errors::{Result, StackplayError};
use crate::frame::{FrameBuilder, StackFrame};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
pub use token::Token;

/// Structured step tag. When present it replaces the description heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Start,
    Call,
    Return,
    Log,
    Expression,
}

impl StepKind {
    /// Guess a step kind from free text.
    ///
    /// Precedence: `console.log`, start, return/end, call. Words are matched
    /// case-insensitively and whole (so "pending" is not "end").
    pub fn from_description(description: &str) -> Option<StepKind> {
        let lower = description.to_lowercase();
        if lower.contains("console.log") {
            return Some(StepKind::Log);
        }

        let words = words(&lower);
        let any = |pred: fn(&str) -> bool| words.iter().any(|w| pred(w));

        if any(|w| w.starts_with("start")) {
            Some(StepKind::Start)
        } else if any(is_return_word) {
            Some(StepKind::Return)
        } else if any(|w| w.starts_with("call")) {
            Some(StepKind::Call)
        } else {
            None
        }
    }
}

fn words(lower: &str) -> Vec<&str> {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

fn is_return_word(word: &str) -> bool {
    word.starts_with("return") || matches!(word, "end" | "ends" | "ended")
}

/// A pedagogical step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Position in the level; reassigned on load
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "currentLine", alias = "sourceLine")]
    pub source_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<StepKind>,
}

impl Step {
    pub fn new(index: usize, description: impl Into<String>) -> Self {
        Step {
            index,
            description: description.into(),
            source_line: None,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: StepKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.source_line = Some(line);
        self
    }

    /// The explicit tag, or the description heuristic as a fallback
    pub fn effective_kind(&self) -> Option<StepKind> {
        self.kind.or_else(|| StepKind::from_description(&self.description))
    }

    /// Whether this step shows the state after a function returned.
    ///
    /// An explicit tag decides. Otherwise any return or end word counts, even
    /// when the description also mentions `console.log` or a start.
    pub fn is_return_step(&self) -> bool {
        match self.kind {
            Some(kind) => kind == StepKind::Return,
            None => words(&self.description.to_lowercase())
                .into_iter()
                .any(is_return_word),
        }
    }
}

/// An expected frame as authored: a bare name or a full frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameSpec {
    Name(String),
    Frame(StackFrame),
}

/// Serialized form of a level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelDescriptor {
    pub tokens: Vec<Token>,
    pub steps: Vec<Step>,
    pub checkpoints: BTreeSet<usize>,
    pub expected_snapshots: BTreeMap<usize, Vec<FrameSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ReplayConfig>,
}

impl LevelDescriptor {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| StackplayError::json("level", e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| StackplayError::io(path, e))?;
        Self::from_json(&text)
    }

    /// Resolve into a [`Level`], expanding bare expected names with `config`
    pub fn into_level(self, config: &ReplayConfig) -> Level {
        let builder = FrameBuilder::new(&config.colors, config.frame_height);

        let expected_snapshots = self
            .expected_snapshots
            .into_iter()
            .map(|(step, specs)| {
                let frames = specs
                    .into_iter()
                    .enumerate()
                    .map(|(index, spec)| match spec {
                        FrameSpec::Name(name) => builder.named(&name, step, index),
                        FrameSpec::Frame(frame) => frame,
                    })
                    .collect();
                (step, frames)
            })
            .collect();

        let mut level = Level {
            tokens: self.tokens,
            steps: self.steps,
            checkpoints: self.checkpoints,
            expected_snapshots,
        };
        level.reindex_steps();
        level
    }
}

/// A replayable level
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level {
    pub tokens: Vec<Token>,
    pub steps: Vec<Step>,
    pub checkpoints: BTreeSet<usize>,
    pub expected_snapshots: BTreeMap<usize, Vec<StackFrame>>,
}

impl Level {
    /// A level from raw token strings and step descriptions
    pub fn new<S: AsRef<str>, D: AsRef<str>>(tokens: &[S], descriptions: &[D]) -> Self {
        let steps = descriptions
            .iter()
            .enumerate()
            .map(|(i, d)| Step::new(i, d.as_ref()))
            .collect();

        Level {
            tokens: token::parse_tokens(tokens),
            steps,
            checkpoints: BTreeSet::new(),
            expected_snapshots: BTreeMap::new(),
        }
    }

    /// A level with `count` undescribed steps
    pub fn with_step_count<S: AsRef<str>>(tokens: &[S], count: usize) -> Self {
        let descriptions = vec![""; count];
        Self::new(tokens, &descriptions)
    }

    /// Register a checkpoint and its expected call stack
    pub fn with_checkpoint(mut self, step: usize, frames: Vec<StackFrame>) -> Self {
        self.checkpoints.insert(step);
        self.expected_snapshots.insert(step, frames);
        self
    }

    /// Load and resolve a level file. An embedded `config` wins over `fallback`.
    pub fn load(path: &Path, fallback: &ReplayConfig) -> Result<(Level, ReplayConfig)> {
        let mut descriptor = LevelDescriptor::load(path)?;
        let config = descriptor.config.take().unwrap_or_else(|| fallback.clone());
        let level = descriptor.into_level(&config);
        Ok((level, config))
    }

    pub fn has_trace(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Expected call stack at a checkpoint, if the level provides one
    pub fn expected_at(&self, step: usize) -> Option<&[StackFrame]> {
        if !self.checkpoints.contains(&step) {
            return None;
        }
        self.expected_snapshots.get(&step).map(Vec::as_slice)
    }

    fn reindex_steps(&mut self) {
        for (i, step) in self.steps.iter_mut().enumerate() {
            step.index = i;
        }
    }
}
