// Snapshot types and timeline navigation

use crate::errors::{Result, StackplayError};
use crate::frame::{QueueClass, QueueEntry, StackFrame};
use crate::mapper::StepRange;
use serde::{Deserialize, Serialize};

/// Observable runtime state at one step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub callstack: Vec<QueueEntry>,
    pub microtask: Vec<QueueEntry>,
    pub macrotask: Vec<QueueEntry>,
    pub step: usize,
    pub logical_time: u64,
}

impl Snapshot {
    pub fn queue(&self, class: QueueClass) -> &[QueueEntry] {
        match class {
            QueueClass::Callstack => &self.callstack,
            QueueClass::Microtask => &self.microtask,
            QueueClass::Macrotask => &self.macrotask,
        }
    }

    /// Display names of one queue, bottom/head first
    pub fn names(&self, class: QueueClass) -> Vec<String> {
        self.queue(class)
            .iter()
            .map(|e| e.display_name().to_string())
            .collect()
    }

    /// Call stack frames without queue metadata
    pub fn stack_frames(&self) -> Vec<StackFrame> {
        self.callstack.iter().map(|e| e.frame.clone()).collect()
    }

    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        // Rough estimate: 100 bytes per entry plus the struct itself
        let entries = self.callstack.len() + self.microtask.len() + self.macrotask.len();
        entries * 100 + std::mem::size_of::<Snapshot>()
    }
}

/// One replayed step: the state before and after it, and what it did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStep {
    pub step: usize,
    pub range: StepRange,
    pub before: Snapshot,
    pub after: Snapshot,
    /// Entries pushed, enqueued or popped by this step's tokens, in order
    pub executed: Vec<QueueEntry>,
    pub logical_time: u64,
}

/// Event-loop view of a replayed step
pub type EventLoopStep = ReplayStep;

impl ReplayStep {
    pub fn estimated_size(&self) -> usize {
        self.before.estimated_size() + self.after.estimated_size() + self.executed.len() * 100
    }
}

/// Replay history with a memory budget and a cursor for stepping through it
#[derive(Debug)]
pub struct Timeline {
    steps: Vec<ReplayStep>,
    max_memory: usize,
    current_memory: usize,
    position: usize,
}

impl Timeline {
    pub fn new(max_memory: usize) -> Self {
        Timeline {
            steps: Vec::new(),
            max_memory,
            current_memory: 0,
            position: 0,
        }
    }

    /// Build a timeline from a finished replay
    pub fn from_steps(steps: Vec<ReplayStep>, max_memory: usize) -> Result<Self> {
        let mut timeline = Timeline::new(max_memory);
        for step in steps {
            timeline.push(step)?;
        }
        Ok(timeline)
    }

    /// Add a step to history
    pub fn push(&mut self, step: ReplayStep) -> Result<()> {
        let size = step.estimated_size();

        if self.current_memory + size > self.max_memory {
            return Err(StackplayError::SnapshotLimitExceeded {
                current: self.current_memory,
                requested: size,
                limit: self.max_memory,
            });
        }

        self.current_memory += size;
        self.steps.push(step);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&ReplayStep> {
        self.steps.get(index)
    }

    /// Step under the cursor
    pub fn current(&self) -> Option<&ReplayStep> {
        self.steps.get(self.position)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }

    pub fn step_forward(&mut self) -> Result<&ReplayStep> {
        if self.position + 1 >= self.steps.len() {
            return Err(StackplayError::HistoryBoundary("Already at the last step"));
        }
        self.position += 1;
        Ok(&self.steps[self.position])
    }

    pub fn step_backward(&mut self) -> Result<&ReplayStep> {
        if self.position == 0 {
            return Err(StackplayError::HistoryBoundary("Already at the first step"));
        }
        self.position -= 1;
        Ok(&self.steps[self.position])
    }

    /// Jump to an arbitrary step
    pub fn seek(&mut self, index: usize) -> Result<&ReplayStep> {
        if index >= self.steps.len() {
            return Err(StackplayError::StepOutOfRange {
                step: index,
                len: self.steps.len(),
            });
        }
        self.position = index;
        Ok(&self.steps[index])
    }

    pub fn rewind_to_start(&mut self) {
        self.position = 0;
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReplayStep> {
        self.steps.iter()
    }

    /// Every recorded step, in order
    pub fn steps(&self) -> &[ReplayStep] {
        &self.steps
    }
}
