//! # Introduction
//!
//! stackplay replays hand-authored execution traces of small JavaScript
//! programs and produces the call stack, microtask queue and macrotask queue
//! at every teaching step. The snapshots feed a visualizer and the checker
//! that grades a learner's predicted stack at checkpoints.
//!
//! No JavaScript is parsed or executed: the trace is the source of truth.
//!
//! ## Replay pipeline
//!
//! ```text
//! Level JSON → Tokens + Steps → Step ranges → Replay → Snapshots → Validation
//!                                     └── (no tokens) → Interpolation ──┘
//! ```
//!
//! 1. [`level`]: level descriptors and the closed token vocabulary.
//! 2. [`mapper`]: assigns each step a contiguous range of tokens.
//! 3. [`replay`]: folds tokens into [`snapshot::ReplayStep`]s, either from
//!    scratch per step (call-stack view) or incrementally (event-loop view).
//! 4. [`interpolate`]: call stacks for levels that only have checkpoints.
//! 5. [`validate`]: compares learner answers with the replayed ground truth.
//! 6. [`snapshot`]: snapshot types and a bounded, navigable [`snapshot::Timeline`].
//! 7. [`frame`]: frames, queue entries, and the name → color table.
//!
//! ## Example
//!
//! ```
//! use stackplay::config::ReplayConfig;
//! use stackplay::level::Level;
//! use stackplay::mapper::MappingStrategy;
//! use stackplay::replay::replay_callstack;
//!
//! let tokens = ["<global>", "func1", "func1-return", "<global>-return"];
//! let level = Level::with_step_count(&tokens, 4);
//! let stacks = replay_callstack(&level, MappingStrategy::Flexible, &ReplayConfig::default());
//!
//! assert_eq!(stacks[1].len(), 2);
//! assert!(stacks[3].is_empty());
//! ```

pub mod config;
pub mod errors;
pub mod frame;
pub mod interpolate;
pub mod level;
pub mod mapper;
pub mod replay;
pub mod snapshot;
pub mod validate;
