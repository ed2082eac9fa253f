//! Text and JSON output for the CLI
//!
//! Frames are printed in their own colors using crossterm styling; queue
//! contents read left to right, bottom (or head) first.

use anyhow::Result;
use crossterm::style::{Color as TermColor, Stylize};
use stackplay::frame::color::Color;
use stackplay::frame::{QueueClass, QueueEntry, StackFrame};
use stackplay::level::Level;
use stackplay::snapshot::ReplayStep;
use stackplay::validate::{EventLoopVerdict, LevelReport};

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

fn styled_frames<'a>(frames: impl Iterator<Item = &'a StackFrame>) -> String {
    let parts: Vec<String> = frames
        .map(|f| format!("{}", f.display_name.as_str().with(term_color(f.color))))
        .collect();
    if parts.is_empty() {
        "(empty)".dark_grey().to_string()
    } else {
        parts.join(" | ")
    }
}

fn styled_entries(entries: &[QueueEntry]) -> String {
    styled_frames(entries.iter().map(|e| &e.frame))
}

fn step_header(level: &Level, step: usize) -> String {
    let description = level
        .steps
        .get(step)
        .map(|s| s.description.as_str())
        .unwrap_or("");
    let checkpoint = if level.checkpoints.contains(&step) {
        " [checkpoint]"
    } else {
        ""
    };
    format!("Step {}{}: {}", step, checkpoint, description)
}

/// Print call stacks produced without a trace
pub fn print_stacks(
    level: &Level,
    stacks: &[Vec<StackFrame>],
    only: Option<usize>,
    json: bool,
) -> Result<()> {
    let selected: Vec<(usize, &Vec<StackFrame>)> = match only {
        Some(step) => match stacks.get(step) {
            Some(frames) => vec![(step, frames)],
            None => anyhow::bail!("Step {} out of range (0..{})", step, stacks.len()),
        },
        None => stacks.iter().enumerate().collect(),
    };

    if json {
        let frames: Vec<&Vec<StackFrame>> = selected.iter().map(|(_, f)| *f).collect();
        println!("{}", serde_json::to_string_pretty(&frames)?);
        return Ok(());
    }

    for (step, frames) in selected {
        println!("{}", step_header(level, step).bold());
        println!("  callstack: {}", styled_frames(frames.iter()));
    }
    Ok(())
}

/// Print replayed steps
pub fn print_steps(level: &Level, steps: &[ReplayStep], queues: bool, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(steps)?);
        return Ok(());
    }

    for step in steps {
        println!(
            "{}  {}",
            step_header(level, step.step).bold(),
            format!("t={} tokens {}..{}", step.logical_time, step.range.start, step.range.end)
                .dark_grey()
        );
        println!("  callstack: {}", styled_entries(&step.after.callstack));
        if queues {
            println!(
                "  {}: {}",
                QueueClass::Microtask,
                styled_entries(&step.after.microtask)
            );
            println!(
                "  {}: {}",
                QueueClass::Macrotask,
                styled_entries(&step.after.macrotask)
            );
        }
        if !step.executed.is_empty() {
            println!("  executed:  {}", styled_entries(&step.executed));
        }
    }
    Ok(())
}

pub fn print_report(report: &LevelReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for verdict in &report.verdicts {
        if verdict.passed {
            println!("{} step {}", "PASS".green().bold(), verdict.step);
            continue;
        }
        println!("{} step {}", "FAIL".red().bold(), verdict.step);
        println!("  expected:  {}", verdict.expected.join(" | "));
        match &verdict.submitted {
            Some(submitted) => println!("  submitted: {}", submitted.join(" | ")),
            None => println!("  submitted: (no answer)"),
        }
        if let Some(index) = verdict.first_mismatch {
            println!("  first difference at position {}", index);
        }
    }
    Ok(())
}

pub fn print_event_loop_verdicts(verdicts: &[EventLoopVerdict], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(verdicts)?);
        return Ok(());
    }

    for verdict in verdicts {
        let status = if verdict.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!("{} step {}", status, verdict.step);
        for class in &verdict.missing {
            println!("  missing queue: {}", class);
        }
        for class in &verdict.mismatched {
            println!("  wrong contents: {}", class);
        }
    }
    Ok(())
}
