// Integration tests for the event-loop view

use stackplay::config::ReplayConfig;
use stackplay::frame::QueueClass;
use stackplay::level::Level;
use stackplay::replay::replay_event_loop;
use stackplay::snapshot::{Snapshot, Timeline};
use stackplay::validate::{
    check_event_loop_level, EventLoopAnswers, EventLoopCheck, QueueSubmission,
};
use std::path::Path;

fn load(name: &str) -> (Level, ReplayConfig) {
    let path = Path::new("levels").join(name);
    Level::load(&path, &ReplayConfig::default()).expect("Failed to load level")
}

fn queue(snapshot: &Snapshot, class: QueueClass) -> Vec<String> {
    snapshot.names(class)
}

#[test]
fn test_set_timeout_goes_to_macrotask() {
    let level = Level::with_step_count(&["<global>", "setTimeout", "<global>-return"], 3);
    let steps = replay_event_loop(&level, &ReplayConfig::default());

    assert_eq!(steps.len(), 3);
    assert_eq!(queue(&steps[1].after, QueueClass::Macrotask), vec!["setTimeout"]);
    assert_eq!(queue(&steps[1].after, QueueClass::Callstack), vec!["<global>"]);
    assert!(steps[2].after.callstack.is_empty());
    // The scheduled timer stays queued after the script returns
    assert_eq!(queue(&steps[2].after, QueueClass::Macrotask), vec!["setTimeout"]);
}

#[test]
fn test_timers_level() {
    let (level, config) = load("timers.json");
    assert_eq!(config.time_step, 10);
    let steps = replay_event_loop(&level, &config);

    assert_eq!(queue(&steps[1].after, QueueClass::Callstack), vec!["<global>"]);
    assert_eq!(queue(&steps[3].after, QueueClass::Microtask), vec!["Promise.then"]);
    assert_eq!(queue(&steps[3].after, QueueClass::Macrotask), vec!["setTimeout"]);
    assert!(steps[5].after.callstack.is_empty());
    assert_eq!(steps[5].logical_time, 60);

    // Halt sentinel at token 6: token 7 never runs
    assert!(steps[7].after.callstack.is_empty());
    assert!(steps[7].executed.is_empty());
    assert_eq!(steps[7].logical_time, 60);
}

#[test]
fn test_queues_are_fifo() {
    let level = Level::with_step_count(
        &[
            "<global>",
            "setTimeout(a)",
            "Promise.resolve",
            "setInterval",
            "queueMicrotask",
            "requestAnimationFrame",
        ],
        2,
    );
    let steps = replay_event_loop(&level, &ReplayConfig::default());
    let last = &steps[1].after;

    assert_eq!(
        queue(last, QueueClass::Macrotask),
        vec!["setTimeout(a)", "setInterval", "requestAnimationFrame"]
    );
    assert_eq!(queue(last, QueueClass::Microtask), vec!["Promise.resolve", "queueMicrotask"]);

    let stamps: Vec<u64> = last.macrotask.iter().map(|e| e.logical_timestamp).collect();
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    assert!(last.macrotask.iter().all(|e| e.queue_class == QueueClass::Macrotask));
}

#[test]
fn test_before_after_and_executed() {
    let level = Level::with_step_count(&["<global>", "f", "setTimeout", "f-return"], 2);
    let steps = replay_event_loop(&level, &ReplayConfig::default());

    assert!(steps[0].before.callstack.is_empty());
    assert_eq!(queue(&steps[1].before, QueueClass::Callstack), vec!["<global>", "f"]);
    assert_eq!(queue(&steps[1].after, QueueClass::Callstack), vec!["<global>"]);

    let executed: Vec<_> = steps[1]
        .executed
        .iter()
        .map(|e| (e.display_name().to_string(), e.queue_class))
        .collect();
    assert_eq!(
        executed,
        vec![
            ("setTimeout".to_string(), QueueClass::Macrotask),
            ("f".to_string(), QueueClass::Callstack),
        ]
    );
    assert_eq!(executed.len(), 2);
    assert_eq!(steps[1].executed[0].source_position, 2);
}

#[test]
fn test_more_steps_than_tokens() {
    let level = Level::with_step_count(&["<global>", "<global>-return"], 4);
    let steps = replay_event_loop(&level, &ReplayConfig::default());

    assert_eq!(steps.len(), 4);
    let empty_steps = steps.iter().filter(|s| s.range.is_empty()).count();
    assert_eq!(empty_steps, 2);
    assert!(steps[3].after.callstack.is_empty());
}

#[test]
fn test_empty_inputs() {
    let no_tokens = Level::with_step_count::<&str>(&[], 3);
    assert!(replay_event_loop(&no_tokens, &ReplayConfig::default()).is_empty());

    let no_steps = Level::with_step_count(&["<global>"], 0);
    assert!(replay_event_loop(&no_steps, &ReplayConfig::default()).is_empty());
}

#[test]
fn test_independent_runs_do_not_share_state() {
    let level = Level::with_step_count(&["<global>", "setTimeout"], 2);
    let config = ReplayConfig::default();
    let first = replay_event_loop(&level, &config);
    let second = replay_event_loop(&level, &config);
    assert_eq!(first, second);
    assert_eq!(second[0].before, Snapshot::default());
}

#[test]
fn test_timeline_navigation_over_replay() {
    let (level, config) = load("timers.json");
    let steps = replay_event_loop(&level, &config);
    let mut timeline = Timeline::from_steps(steps, config.snapshot_memory_limit).expect("timeline");

    assert_eq!(timeline.len(), 8);
    assert_eq!(timeline.seek(3).expect("seek").step, 3);
    assert_eq!(timeline.step_backward().expect("back").step, 2);
    assert_eq!(timeline.step_forward().expect("forward").step, 3);

    let too_small = Timeline::from_steps(replay_event_loop(&level, &config), 16);
    assert!(too_small.is_err());
}

#[test]
fn test_event_loop_answers_structural_and_exact() {
    let (level, config) = load("timers.json");

    let mut answers = EventLoopAnswers::new();
    answers.insert(
        2,
        QueueSubmission {
            callstack: Some(vec!["<global>".to_string()]),
            microtask: Some(Vec::new()),
            macrotask: Some(vec!["setTimeout".to_string()]),
        },
    );
    // Wrong contents, but every queue present
    answers.insert(
        3,
        QueueSubmission {
            callstack: Some(Vec::new()),
            microtask: Some(Vec::new()),
            macrotask: Some(Vec::new()),
        },
    );
    // Step 5 missing its microtask queue
    answers.insert(
        5,
        QueueSubmission {
            callstack: Some(Vec::new()),
            microtask: None,
            macrotask: Some(vec!["setTimeout".to_string()]),
        },
    );

    let structural = check_event_loop_level(&level, &config, &answers, EventLoopCheck::Structural);
    let passed: Vec<bool> = structural.iter().map(|v| v.passed).collect();
    assert_eq!(passed, vec![true, true, false]);

    let exact = check_event_loop_level(&level, &config, &answers, EventLoopCheck::Exact);
    let passed: Vec<bool> = exact.iter().map(|v| v.passed).collect();
    assert_eq!(passed, vec![true, false, false]);
    assert_eq!(
        exact[1].mismatched,
        vec![QueueClass::Callstack, QueueClass::Microtask, QueueClass::Macrotask]
    );
}
