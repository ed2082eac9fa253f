//! Trace replay
//!
//! This module turns a level's token trace into snapshots:
//! - [`state`]: the replay state value and its `(state, token) → state'`
//!   transition
//! - [`engine`]: the [`Replayer`], which folds tokens into per-step
//!   [`ReplayStep`]s in one of two [`ReplayMode`]s
//!
//! # Two views over one engine
//!
//! The call-stack view ([`replay_callstack`]) maps steps with a
//! [`MappingStrategy`] and replays every step from scratch
//! ([`ReplayMode::Full`]). Async tokens are plain frames there.
//!
//! The event-loop view ([`replay_event_loop`]) splits the trace evenly across
//! steps and carries state forward ([`ReplayMode::Incremental`]), routing
//! async tokens to the microtask and macrotask queues.
//!
//! Neither view can fail. Empty traces or empty step lists produce empty
//! results.

pub mod engine;
pub mod state;

pub use engine::{ReplayMode, Replayer};
pub use state::{Effect, ReplayState};

use crate::config::ReplayConfig;
use crate::frame::{FrameFactory, StackFrame};
use crate::interpolate::interpolate;
use crate::level::Level;
use crate::mapper::{equal_split, map_steps, MappingStrategy};
use crate::snapshot::{EventLoopStep, ReplayStep};

/// Full call-stack replay, one [`ReplayStep`] per step
pub fn replay_callstack_steps(
    level: &Level,
    strategy: MappingStrategy<'_>,
    config: &ReplayConfig,
    factory: Option<&dyn FrameFactory>,
) -> Vec<ReplayStep> {
    let ranges = map_steps(level, strategy);
    let mut replayer = Replayer::new(config, ReplayMode::Full).route_async(false);
    if let Some(factory) = factory {
        replayer = replayer.with_factory(factory);
    }
    replayer.run(&level.tokens, &ranges)
}

/// Call stack at every step
pub fn replay_callstack(
    level: &Level,
    strategy: MappingStrategy<'_>,
    config: &ReplayConfig,
) -> Vec<Vec<StackFrame>> {
    replay_callstack_steps(level, strategy, config, None)
        .iter()
        .map(|step| step.after.stack_frames())
        .collect()
}

/// Event-loop replay: all three queues, carried forward across steps
pub fn replay_event_loop(level: &Level, config: &ReplayConfig) -> Vec<EventLoopStep> {
    replay_event_loop_with(level, config, None)
}

pub fn replay_event_loop_with(
    level: &Level,
    config: &ReplayConfig,
    factory: Option<&dyn FrameFactory>,
) -> Vec<EventLoopStep> {
    let ranges = equal_split(level.tokens.len(), level.steps.len());
    let mut replayer = Replayer::new(config, ReplayMode::Incremental);
    if let Some(factory) = factory {
        replayer = replayer.with_factory(factory);
    }
    replayer.run(&level.tokens, &ranges)
}

/// Call stack at every step, from the trace when there is one and from the
/// checkpoints otherwise
pub fn callstack_for_level(
    level: &Level,
    strategy: MappingStrategy<'_>,
    config: &ReplayConfig,
) -> Vec<Vec<StackFrame>> {
    if level.has_trace() {
        replay_callstack(level, strategy, config)
    } else {
        tracing::debug!(
            checkpoints = level.checkpoints.len(),
            "no trace, interpolating from checkpoints"
        );
        interpolate(level, config)
    }
}
