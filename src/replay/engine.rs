// Replay engine: folds a trace into per-step snapshots

use super::state::{Cursor, Effect, ReplayState, Rules};
use crate::config::ReplayConfig;
use crate::frame::{FrameBuilder, FrameFactory, QueueEntry};
use crate::level::Token;
use crate::mapper::StepRange;
use crate::snapshot::{ReplayStep, Snapshot};

/// How state is carried between steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    /// Every step replays its whole prefix from an empty state.
    /// O(steps × tokens); identical prefixes give identical snapshots.
    Full,
    /// Each step continues from the previous step's state. O(tokens).
    Incremental,
}

/// A configured replay engine. Holds no replay state of its own.
#[derive(Debug, Clone, Copy)]
pub struct Replayer<'a> {
    mode: ReplayMode,
    rules: Rules<'a>,
}

impl<'a> Replayer<'a> {
    pub fn new(config: &'a ReplayConfig, mode: ReplayMode) -> Self {
        Replayer {
            mode,
            rules: Rules {
                builder: FrameBuilder::new(&config.colors, config.frame_height),
                include_console_log: config.include_console_log,
                route_async: true,
                time_step: config.time_step,
            },
        }
    }

    /// Route async tokens to the task queues (`true`, the default) or push
    /// them as ordinary frames (`false`, the call-stack-only view)
    pub fn route_async(mut self, route: bool) -> Self {
        self.rules.route_async = route;
        self
    }

    pub fn with_factory(mut self, factory: &'a dyn FrameFactory) -> Self {
        self.rules.builder = self.rules.builder.with_factory(factory);
        self
    }

    pub fn mode(&self) -> ReplayMode {
        self.mode
    }

    /// Replay `tokens`, one [`ReplayStep`] per range
    pub fn run(&self, tokens: &[Token], ranges: &[StepRange]) -> Vec<ReplayStep> {
        tracing::debug!(
            mode = ?self.mode,
            tokens = tokens.len(),
            steps = ranges.len(),
            "replaying trace"
        );

        match self.mode {
            ReplayMode::Full => self.run_full(tokens, ranges),
            ReplayMode::Incremental => self.run_incremental(tokens, ranges),
        }
    }

    fn run_full(&self, tokens: &[Token], ranges: &[StepRange]) -> Vec<ReplayStep> {
        let mut steps: Vec<ReplayStep> = Vec::with_capacity(ranges.len());

        for range in ranges {
            let end = range.end.min(tokens.len());
            let mut state = ReplayState::new();
            let mut executed = Vec::new();

            for (position, token) in tokens[..end].iter().enumerate() {
                let at = Cursor {
                    step: range.step,
                    position,
                };
                let (next, effect) = state.apply(token, at, &self.rules);
                state = next;
                if position >= range.start {
                    collect(&mut executed, effect);
                }
                if state.is_halted() {
                    break;
                }
            }

            let before = match steps.last() {
                Some(prev) => prev.after.clone(),
                None => Snapshot {
                    step: range.step,
                    ..Snapshot::default()
                },
            };

            steps.push(ReplayStep {
                step: range.step,
                range: *range,
                before,
                after: state.snapshot(range.step),
                executed,
                logical_time: state.logical_time(),
            });
        }

        steps
    }

    fn run_incremental(&self, tokens: &[Token], ranges: &[StepRange]) -> Vec<ReplayStep> {
        let mut state = ReplayState::new();
        let mut steps = Vec::with_capacity(ranges.len());

        for range in ranges {
            let before = state.snapshot(range.step);
            let mut executed = Vec::new();

            let end = range.end.min(tokens.len());
            for position in range.start.min(end)..end {
                let at = Cursor {
                    step: range.step,
                    position,
                };
                let (next, effect) = state.apply(&tokens[position], at, &self.rules);
                state = next;
                collect(&mut executed, effect);
            }

            steps.push(ReplayStep {
                step: range.step,
                range: *range,
                before,
                after: state.snapshot(range.step),
                executed,
                logical_time: state.logical_time(),
            });
        }

        steps
    }
}

fn collect(executed: &mut Vec<QueueEntry>, effect: Effect) {
    match effect {
        Effect::Pushed(entry) | Effect::Enqueued(entry) | Effect::Popped(entry) => {
            executed.push(entry)
        }
        Effect::Unmatched | Effect::Ignored | Effect::Halted => {}
    }
}
