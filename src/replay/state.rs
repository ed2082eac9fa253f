//! Replay state and the token transition
//!
//! [`ReplayState`] is a plain value: the call stack, both task queues, the
//! logical clock and the halt flag. [`ReplayState::apply`] consumes a state
//! and one token and returns the next state plus the [`Effect`] the token had.
//! Nothing else mutates replay state, so a replay is a fold over the trace.

use crate::frame::{FrameBuilder, FrameSeed, QueueClass, QueueEntry};
use crate::level::token::{Token, TokenKind};
use crate::snapshot::Snapshot;
use std::collections::VecDeque;

/// What a single token did to the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// A frame was pushed onto the call stack
    Pushed(QueueEntry),
    /// An entry was appended to the microtask or macrotask queue
    Enqueued(QueueEntry),
    /// A `-return` removed this entry from the call stack
    Popped(QueueEntry),
    /// A `-return` with nothing to close
    Unmatched,
    /// A token that has no visible effect (skipped `console.log`, or any
    /// token after the halt sentinel)
    Ignored,
    /// The halt sentinel itself
    Halted,
}

impl Effect {
    /// The entry this effect touched, if any
    pub fn entry(&self) -> Option<&QueueEntry> {
        match self {
            Effect::Pushed(entry) | Effect::Enqueued(entry) | Effect::Popped(entry) => Some(entry),
            Effect::Unmatched | Effect::Ignored | Effect::Halted => None,
        }
    }
}

/// Rules that shape a transition
#[derive(Debug, Clone, Copy)]
pub struct Rules<'a> {
    pub builder: FrameBuilder<'a>,
    /// Push `console.log` instead of skipping it
    pub include_console_log: bool,
    /// Send async tokens to their queue; otherwise they are pushed as frames
    pub route_async: bool,
    /// Logical time added per processed token
    pub time_step: u64,
}

/// Where a token is being applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub step: usize,
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayState {
    callstack: Vec<QueueEntry>,
    microtask: VecDeque<QueueEntry>,
    macrotask: VecDeque<QueueEntry>,
    logical_time: u64,
    halted: bool,
}

impl ReplayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn logical_time(&self) -> u64 {
        self.logical_time
    }

    pub fn callstack(&self) -> &[QueueEntry] {
        &self.callstack
    }

    pub fn microtask(&self) -> &VecDeque<QueueEntry> {
        &self.microtask
    }

    pub fn macrotask(&self) -> &VecDeque<QueueEntry> {
        &self.macrotask
    }

    /// Apply one token
    pub fn apply(mut self, token: &Token, at: Cursor, rules: &Rules<'_>) -> (Self, Effect) {
        if self.halted {
            return (self, Effect::Ignored);
        }

        let name = match token.kind() {
            TokenKind::Halt => {
                tracing::debug!(position = at.position, "halt sentinel reached");
                self.halted = true;
                return (self, Effect::Halted);
            }
            TokenKind::Return(base) => {
                self.logical_time += rules.time_step;
                let nearest = self.callstack.iter().rposition(|e| e.matches_return(base));
                let effect = match nearest {
                    Some(index) => Effect::Popped(self.callstack.remove(index)),
                    None => {
                        tracing::debug!(position = at.position, token = %token, "unmatched return");
                        Effect::Unmatched
                    }
                };
                return (self, effect);
            }
            TokenKind::ConsoleLog if !rules.include_console_log => {
                self.logical_time += rules.time_step;
                return (self, Effect::Ignored);
            }
            _ => match token.frame_name() {
                Some(name) => name,
                None => return (self, Effect::Ignored),
            },
        };

        let queue = match token.kind() {
            TokenKind::Async(source) if rules.route_async => source.queue_class(),
            _ => QueueClass::Callstack,
        };

        self.logical_time += rules.time_step;
        let seed = FrameSeed {
            name,
            step: at.step,
            position: at.position,
            queue,
        };
        let entry = rules.builder.entry(&seed, self.logical_time);

        let effect = match queue {
            QueueClass::Callstack => {
                self.callstack.push(entry.clone());
                Effect::Pushed(entry)
            }
            QueueClass::Microtask => {
                self.microtask.push_back(entry.clone());
                Effect::Enqueued(entry)
            }
            QueueClass::Macrotask => {
                self.macrotask.push_back(entry.clone());
                Effect::Enqueued(entry)
            }
        };

        tracing::trace!(position = at.position, token = %token, effect = ?effect, "applied token");
        (self, effect)
    }

    /// Remove the head of a task queue. The call stack is never dequeued.
    pub fn dequeue(mut self, class: QueueClass) -> (Self, Option<QueueEntry>) {
        let entry = match class {
            QueueClass::Microtask => self.microtask.pop_front(),
            QueueClass::Macrotask => self.macrotask.pop_front(),
            QueueClass::Callstack => None,
        };
        (self, entry)
    }

    /// Observable copy of the state, labelled with `step`
    pub fn snapshot(&self, step: usize) -> Snapshot {
        Snapshot {
            callstack: self.callstack.clone(),
            microtask: self.microtask.iter().cloned().collect(),
            macrotask: self.macrotask.iter().cloned().collect(),
            step,
            logical_time: self.logical_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::color::ColorTable;
    use crate::frame::DEFAULT_FRAME_HEIGHT;

    fn run(tokens: &[&str], route_async: bool, include_console_log: bool) -> ReplayState {
        let colors = ColorTable::default();
        let rules = Rules {
            builder: FrameBuilder::new(&colors, DEFAULT_FRAME_HEIGHT),
            include_console_log,
            route_async,
            time_step: 10,
        };

        tokens
            .iter()
            .enumerate()
            .fold(ReplayState::new(), |state, (position, raw)| {
                let at = Cursor { step: 0, position };
                state.apply(&Token::parse(raw), at, &rules).0
            })
    }

    fn stack_names(state: &ReplayState) -> Vec<&str> {
        state.callstack().iter().map(|e| e.display_name()).collect()
    }

    #[test]
    fn test_return_pops_nearest_match() {
        let state = run(&["<global>", "f", "g", "f", "f-return"], true, false);
        assert_eq!(stack_names(&state), vec!["<global>", "f", "g"]);
    }

    #[test]
    fn test_return_matches_base_name_and_main() {
        let state = run(&["main", "factorial(3)", "factorial(2)", "factorial-return"], true, false);
        assert_eq!(stack_names(&state), vec!["<global>", "factorial(3)"]);

        let state = run(&["main", "main-return"], true, false);
        assert!(state.callstack().is_empty());
    }

    #[test]
    fn test_unmatched_return_is_noop() {
        let colors = ColorTable::default();
        let rules = Rules {
            builder: FrameBuilder::new(&colors, DEFAULT_FRAME_HEIGHT),
            include_console_log: false,
            route_async: true,
            time_step: 10,
        };
        let at = Cursor { step: 0, position: 0 };
        let (state, effect) = ReplayState::new().apply(&Token::parse("ghost-return"), at, &rules);
        assert_eq!(effect, Effect::Unmatched);
        assert!(state.callstack().is_empty());
        assert_eq!(state.logical_time(), 10);
    }

    #[test]
    fn test_console_log_flag() {
        let skipped = run(&["<global>", "console.log"], true, false);
        assert_eq!(stack_names(&skipped), vec!["<global>"]);

        let pushed = run(&["<global>", "console.log"], true, true);
        assert_eq!(stack_names(&pushed), vec!["<global>", "console.log"]);
    }

    #[test]
    fn test_async_routing() {
        let routed = run(
            &["<global>", "setTimeout", "Promise.then", "queueMicrotask", "setInterval"],
            true,
            false,
        );
        assert_eq!(stack_names(&routed), vec!["<global>"]);
        let micro: Vec<_> = routed.microtask().iter().map(|e| e.display_name()).collect();
        let macro_: Vec<_> = routed.macrotask().iter().map(|e| e.display_name()).collect();
        assert_eq!(micro, vec!["Promise.then", "queueMicrotask"]);
        assert_eq!(macro_, vec!["setTimeout", "setInterval"]);

        let flat = run(&["<global>", "setTimeout"], false, false);
        assert_eq!(stack_names(&flat), vec!["<global>", "setTimeout"]);
        assert!(flat.macrotask().is_empty());
    }

    #[test]
    fn test_halt_stops_everything_after() {
        let state = run(&["<global>", "f", "", "g", "f-return"], true, false);
        assert!(state.is_halted());
        assert_eq!(stack_names(&state), vec!["<global>", "f"]);
        assert_eq!(state.logical_time(), 20);
    }

    #[test]
    fn test_dequeue_is_head_first() {
        let state = run(&["setTimeout", "setInterval"], true, false);
        let (state, head) = state.dequeue(QueueClass::Macrotask);
        assert_eq!(head.map(|e| e.display_name().to_string()), Some("setTimeout".to_string()));
        let (state, none) = state.dequeue(QueueClass::Callstack);
        assert!(none.is_none());
        assert_eq!(state.macrotask().len(), 1);
    }
}
