//! Frame and queue entry model
//!
//! This module provides the values that fill a snapshot:
//! - [`StackFrame`]: what the visualizer draws for one call or task
//! - [`QueueEntry`]: a frame placed in one of the three runtime queues
//! - [`FrameBuilder`]: turns a name into a frame using the color table,
//!   optionally passing the result through a caller-supplied [`FrameFactory`]
//!
//! # Identity
//!
//! Frame ids are synthesized from `(name, step, position)` and are not stable
//! across steps. Two snapshots are compared by the ordered list of display
//! names only.

pub mod color;

use crate::level::token::{match_key, GLOBAL_NAME};
use color::{Color, ColorTable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default visual height of a frame
pub const DEFAULT_FRAME_HEIGHT: u32 = 40;

/// Which runtime queue an entry lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueClass {
    Callstack,
    Microtask,
    Macrotask,
}

impl fmt::Display for QueueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueClass::Callstack => f.write_str("callstack"),
            QueueClass::Microtask => f.write_str("microtask"),
            QueueClass::Macrotask => f.write_str("macrotask"),
        }
    }
}

/// One drawable frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub id: String,
    pub display_name: String,
    pub color: Color,
    pub height: u32,
    pub is_global_context: bool,
}

/// A frame together with its queue placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    #[serde(flatten)]
    pub frame: StackFrame,
    pub queue_class: QueueClass,
    pub logical_timestamp: u64,
    pub source_position: usize,
    /// Return-matching key derived from the token, immune to factory overrides
    #[serde(skip)]
    pub(crate) key: String,
}

impl QueueEntry {
    pub fn display_name(&self) -> &str {
        &self.frame.display_name
    }

    /// Whether a `-return` for `name` closes this entry
    pub fn matches_return(&self, name: &str) -> bool {
        self.key == match_key(name)
    }
}

/// Everything known about a frame at the moment it is created
#[derive(Debug, Clone, Copy)]
pub struct FrameSeed<'a> {
    pub name: &'a str,
    pub step: usize,
    pub position: usize,
    pub queue: QueueClass,
}

/// Caller hook that adjusts display fields of freshly built frames.
///
/// The factory only sees and returns the [`StackFrame`]; queue placement and
/// return matching are decided by the engine before the factory runs.
pub trait FrameFactory {
    fn build(&self, seed: &FrameSeed<'_>, frame: StackFrame) -> StackFrame;
}

impl<F> FrameFactory for F
where
    F: Fn(&FrameSeed<'_>, StackFrame) -> StackFrame,
{
    fn build(&self, seed: &FrameSeed<'_>, frame: StackFrame) -> StackFrame {
        self(seed, frame)
    }
}

/// Builds frames with consistent ids, colors and heights
#[derive(Clone, Copy)]
pub struct FrameBuilder<'a> {
    colors: &'a ColorTable,
    height: u32,
    factory: Option<&'a dyn FrameFactory>,
}

impl fmt::Debug for FrameBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuilder")
            .field("height", &self.height)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

impl<'a> FrameBuilder<'a> {
    pub fn new(colors: &'a ColorTable, height: u32) -> Self {
        FrameBuilder {
            colors,
            height,
            factory: None,
        }
    }

    pub fn with_factory(mut self, factory: &'a dyn FrameFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Build the frame for a seed, applying the factory if one is set
    pub fn frame(&self, seed: &FrameSeed<'_>) -> StackFrame {
        let frame = StackFrame {
            id: format!("{}-{}-{}", seed.name, seed.step, seed.position),
            display_name: seed.name.to_string(),
            color: self.colors.color_for(seed.name),
            height: self.height,
            is_global_context: seed.name == GLOBAL_NAME,
        };

        match self.factory {
            Some(factory) => factory.build(seed, frame),
            None => frame,
        }
    }

    /// Build a queue entry stamped with its logical time
    pub fn entry(&self, seed: &FrameSeed<'_>, logical_timestamp: u64) -> QueueEntry {
        QueueEntry {
            frame: self.frame(seed),
            queue_class: seed.queue,
            logical_timestamp,
            source_position: seed.position,
            key: match_key(seed.name).to_string(),
        }
    }

    /// Frame for a bare name outside of any replay (expected snapshots,
    /// interpolation defaults). `index` is the frame's slot in its list.
    pub fn named(&self, name: &str, step: usize, index: usize) -> StackFrame {
        let name = if name == "main" { GLOBAL_NAME } else { name };
        self.frame(&FrameSeed {
            name,
            step,
            position: index,
            queue: QueueClass::Callstack,
        })
    }
}

/// Display names of a frame list, in order
pub fn frame_names(frames: &[StackFrame]) -> Vec<String> {
    frames.iter().map(|f| f.display_name.clone()).collect()
}
