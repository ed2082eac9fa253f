//! Replay configuration
//!
//! Every field has a default, so an empty JSON object (or no config at all)
//! gives the standard behavior. A level file may embed a `config` object and
//! the CLI can load a standalone one with `--config`.

use crate::errors::{Result, StackplayError};
use crate::frame::color::ColorTable;
use crate::frame::DEFAULT_FRAME_HEIGHT;
use crate::mapper::StrategyKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Logical time added per processed token
pub const DEFAULT_TIME_STEP: u64 = 100;

/// Timeline memory budget (64 MiB)
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReplayConfig {
    /// Push `console.log` onto the call stack instead of skipping it
    pub include_console_log: bool,
    pub time_step: u64,
    pub frame_height: u32,
    /// Step-to-token strategy for the call-stack view
    pub strategy: StrategyKind,
    pub snapshot_memory_limit: usize,
    pub colors: ColorTable,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            include_console_log: false,
            time_step: DEFAULT_TIME_STEP,
            frame_height: DEFAULT_FRAME_HEIGHT,
            strategy: StrategyKind::Flexible,
            snapshot_memory_limit: DEFAULT_SNAPSHOT_LIMIT,
            colors: ColorTable::default(),
        }
    }
}

impl ReplayConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| StackplayError::json("config", e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| StackplayError::io(path, e))?;
        Self::from_json(&text)
    }
}
