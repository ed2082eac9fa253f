//! Checkpoint interpolation
//!
//! Some levels carry no trace, only the expected call stack at a handful of
//! checkpoints. [`interpolate`] fills in the steps between them so the
//! visualizer still has a stack for every step.

use crate::config::ReplayConfig;
use crate::frame::{FrameBuilder, StackFrame};
use crate::level::token::GLOBAL_NAME;
use crate::level::Level;
use std::collections::BTreeMap;

/// Call stack at every step, derived from checkpoint snapshots.
///
/// - a checkpoint step shows its expected stack
/// - any other step inherits the nearest earlier checkpoint, unless it is a
///   return step and a later checkpoint exists, in which case it already
///   shows that later (post-return) stack
/// - before the first checkpoint, the stack is a lone `<global>` frame
pub fn interpolate(level: &Level, config: &ReplayConfig) -> Vec<Vec<StackFrame>> {
    let step_count = level.steps.len();

    // Only checkpoints that have a snapshot and fall inside the level count
    let anchors: BTreeMap<usize, &Vec<StackFrame>> = level
        .checkpoints
        .iter()
        .filter(|&&step| step < step_count)
        .filter_map(|&step| level.expected_snapshots.get(&step).map(|s| (step, s)))
        .collect();

    let builder = FrameBuilder::new(&config.colors, config.frame_height);

    (0..step_count)
        .map(|i| {
            if let Some(frames) = anchors.get(&i) {
                return (*frames).clone();
            }

            if level.steps[i].is_return_step() {
                if let Some((_, later)) = anchors.range(i + 1..).next() {
                    return (*later).clone();
                }
            }

            match anchors.range(..i).next_back() {
                Some((_, earlier)) => (*earlier).clone(),
                None => vec![builder.named(GLOBAL_NAME, i, 0)],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::frame_names;

    fn frames(names: &[&str]) -> Vec<StackFrame> {
        let config = ReplayConfig::default();
        let builder = FrameBuilder::new(&config.colors, config.frame_height);
        names
            .iter()
            .enumerate()
            .map(|(i, n)| builder.named(n, 0, i))
            .collect()
    }

    fn names_per_step(snapshots: &[Vec<StackFrame>]) -> Vec<Vec<String>> {
        snapshots.iter().map(|s| frame_names(s)).collect()
    }

    #[test]
    fn test_inherit_and_preview() {
        let mut level =
            Level::new::<&str, &str>(&[], &["start", "func1 call", "func1 returns", "end"])
                .with_checkpoint(0, frames(&["<global>"]))
                .with_checkpoint(3, frames(&[]));
        level.checkpoints.insert(1); // checkpoint with no snapshot is ignored

        let snapshots = names_per_step(&interpolate(&level, &ReplayConfig::default()));
        assert_eq!(snapshots[0], vec!["<global>"]);
        assert_eq!(snapshots[1], snapshots[0]);
        // return step previews the later checkpoint
        assert!(snapshots[2].is_empty());
        assert!(snapshots[3].is_empty());
    }

    #[test]
    fn test_default_before_first_checkpoint() {
        let level = Level::new::<&str, &str>(&[], &["intro", "call f", "later"])
            .with_checkpoint(2, frames(&["<global>", "f"]));

        let snapshots = interpolate(&level, &ReplayConfig::default());
        assert_eq!(frame_names(&snapshots[0]), vec!["<global>"]);
        assert!(snapshots[0][0].is_global_context);
        assert_eq!(frame_names(&snapshots[1]), vec!["<global>"]);
        assert_eq!(frame_names(&snapshots[2]), vec!["<global>", "f"]);
    }

    #[test]
    fn test_return_mentioned_alongside_console_log_previews() {
        let level = Level::new::<&str, &str>(
            &[],
            &["start", "func1 call", "console.log prints, then func1 returns", "end"],
        )
        .with_checkpoint(0, frames(&["<global>", "func1"]))
        .with_checkpoint(3, frames(&["<global>"]));

        let snapshots = names_per_step(&interpolate(&level, &ReplayConfig::default()));
        assert_eq!(snapshots[1], vec!["<global>", "func1"]);
        assert_eq!(snapshots[2], vec!["<global>"]);
    }

    #[test]
    fn test_return_without_later_checkpoint_inherits() {
        let level = Level::new::<&str, &str>(&[], &["start", "f returns"])
            .with_checkpoint(0, frames(&["<global>", "f"]));

        let snapshots = interpolate(&level, &ReplayConfig::default());
        assert_eq!(frame_names(&snapshots[1]), vec!["<global>", "f"]);
    }

    #[test]
    fn test_no_steps_no_snapshots() {
        let level = Level::default().with_checkpoint(0, frames(&["<global>"]));
        assert!(interpolate(&level, &ReplayConfig::default()).is_empty());
    }
}
