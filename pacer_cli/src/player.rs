//! Terminal presentation shell for a running session.
//!
//! Renders session events as lines on stdout, rings the terminal bell for
//! cues, and turns typed commands into session actions. In auto mode the
//! player drives itself: it starts every set and moves on after every
//! exercise.

use pacer_core::cues::{announcement_for, SpeechAnnouncer};
use pacer_core::recorder::FinalizeOutcome;
use pacer_core::view::{footer_timer, format_clock, minutes_left, overall_progress};
use pacer_core::*;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Rings the terminal bell; the terminal has no pitch control
pub struct TerminalBell;

impl CueSink for TerminalBell {
    fn play(&mut self, tone: Tone) -> Result<()> {
        let mut stderr = io::stderr();
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        tracing::trace!("Bell for {} Hz {:?}", tone.frequency_hz, tone.waveform);
        Ok(())
    }
}

/// Prints announcements instead of speaking them
pub struct PrintAnnouncer;

impl SpeechAnnouncer for PrintAnnouncer {
    fn announce(&mut self, text: &str) -> Result<()> {
        println!("  » {}", text);
        Ok(())
    }
}

pub struct PlayOptions {
    pub auto: bool,
    pub save_partial: bool,
    pub announce: bool,
}

/// Typed command
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Act(Action),
    Status,
    Quit,
    Help,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim().to_lowercase();
    match line.as_str() {
        "" => Input::Act(Action::Start),
        "p" => Input::Act(Action::TogglePause),
        "n" => Input::Act(Action::NextExercise),
        "r" => Input::Act(Action::RepeatSet),
        "s" => Input::Status,
        "q" => Input::Quit,
        other => match other.strip_prefix("set ").map(|n| n.trim().parse::<u32>()) {
            Some(Ok(set)) => Input::Act(Action::SelectSet { set }),
            _ => Input::Help,
        },
    }
}

/// Shell-side cursor, advanced from events so output matches event order
struct Cursor {
    index: usize,
    set: u32,
}

/// Play `sequence` to the end (or until the user quits)
pub async fn play(
    sequence: WorkoutBlockSequence,
    options: PlayOptions,
    cues: CueEmitter,
    recorder: SessionRecorder,
    tick: TickConfig,
) -> Result<()> {
    let mut handle = spawn_session(
        SessionMachine::new(sequence.clone()),
        cues,
        recorder.clone(),
        tick,
    );
    let mut events = handle
        .take_events()
        .ok_or_else(|| Error::Other("Session events already taken".into()))?;
    let mut announcer = PrintAnnouncer;
    let mut cursor = Cursor { index: 0, set: 1 };

    print_exercise_header(&sequence, 0);
    if options.auto {
        handle.act(Action::Start).await?;
    } else {
        print_help();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut reading = !options.auto;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                render_event(&event, &sequence, &mut cursor, &mut announcer, options.announce);
                if options.auto {
                    drive(&handle, &event).await;
                }
            }
            line = lines.next_line(), if reading => match line {
                Ok(Some(line)) => match parse_input(&line) {
                    Input::Act(action) => {
                        if let Err(e) = handle.act(action).await {
                            println!("  ! {}", e);
                        }
                    }
                    Input::Status => print_status(&handle.snapshot()),
                    Input::Quit => {
                        reading = false;
                        let _ = handle.abort().await;
                    }
                    Input::Help => print_help(),
                },
                Ok(None) | Err(_) => {
                    // stdin closed; nobody left to drive the session
                    reading = false;
                    let _ = handle.abort().await;
                }
            },
        }
    }

    match handle.wait().await? {
        SessionOutcome::Finished(outcome) => print_summary(&outcome),
        SessionOutcome::Aborted(abandoned) => {
            if options.save_partial {
                let outcome = recorder.finalize(
                    &abandoned.sequence,
                    abandoned.reached_index,
                    abandoned.elapsed_total_seconds,
                );
                print_summary(&outcome);
            } else {
                println!(
                    "\nSession abandoned after {}; nothing saved.",
                    format_clock(abandoned.elapsed_total_seconds)
                );
            }
        }
    }
    Ok(())
}

async fn drive(handle: &SessionHandle, event: &SessionEvent) {
    let action = match event {
        SessionEvent::PhaseChanged {
            to: PhaseKind::Ready,
            ..
        } => Action::Start,
        SessionEvent::PhaseChanged {
            to: PhaseKind::ExerciseComplete,
            ..
        } => Action::NextExercise,
        _ => return,
    };
    if let Err(e) = handle.act(action).await {
        tracing::warn!("Auto mode could not {:?}: {}", action, e);
    }
}

fn render_event(
    event: &SessionEvent,
    sequence: &WorkoutBlockSequence,
    cursor: &mut Cursor,
    announcer: &mut dyn SpeechAnnouncer,
    announce: bool,
) {
    let Some(exercise) = sequence.get(cursor.index) else {
        return;
    };

    match event {
        SessionEvent::PhaseChanged { to, .. } => match to {
            PhaseKind::Countdown if announce => {
                if let Err(e) = announcer.announce(&announcement_for(exercise, cursor.set)) {
                    tracing::warn!("Announcement failed: {}", e);
                }
            }
            PhaseKind::Working => println!("  ▶ Set {} of {}", cursor.set, exercise.sets_total),
            PhaseKind::Resting => println!("  ⏸ Rest {}s", exercise.rest_after_seconds),
            PhaseKind::ExerciseComplete => println!("  ✓ {} complete", exercise.name),
            _ => {}
        },
        SessionEvent::SetAdvanced { set } => cursor.set = *set,
        SessionEvent::ExerciseAdvanced { index } => {
            cursor.index = *index;
            cursor.set = 1;
            print_exercise_header(sequence, *index);
        }
        SessionEvent::PauseToggled { paused } => {
            println!("  {}", if *paused { "Paused" } else { "Resumed" })
        }
        SessionEvent::Cue { .. } | SessionEvent::Finished { .. } => {}
    }
}

fn print_exercise_header(sequence: &WorkoutBlockSequence, index: usize) {
    let Some(exercise) = sequence.get(index) else {
        return;
    };
    println!();
    println!(
        "── {} · {} ({}/{}) ──",
        exercise.block.label(),
        exercise.name,
        index + 1,
        sequence.len()
    );
    println!(
        "  {} × {} · {}",
        exercise.sets_total, exercise.reps_label, exercise.equipment_label
    );
    let instructions = pacer_core::plan::describe_exercise(exercise, None);
    println!("  {}", instructions);
}

fn print_status(snapshot: &SessionSnapshot) {
    let state = &snapshot.state;
    let timer = footer_timer(snapshot)
        .map(|t| format!(" · timer {:02}s ({}%)", t.seconds, t.percent))
        .unwrap_or_default();
    println!(
        "  {} elapsed · {} min left · {}% · {:?}{}{}",
        format_clock(state.elapsed_total_seconds),
        minutes_left(snapshot),
        overall_progress(snapshot),
        state.phase.kind(),
        timer,
        if state.is_paused { " · paused" } else { "" }
    );
}

fn print_help() {
    println!("─────────────────────────────────────────");
    println!("  Enter    start set");
    println!("  p        pause / resume");
    println!("  r        repeat timed set");
    println!("  n        next exercise");
    println!("  set N    jump to set N");
    println!("  s        status");
    println!("  q        quit");
}

fn print_summary(outcome: &FinalizeOutcome) {
    let record = outcome.record();
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  SESSION COMPLETE");
    println!("╰─────────────────────────────────────────╯");
    println!("  {}", record.plan_name);
    println!(
        "  {} min · {} kcal · {} exercises",
        record.duration_minutes,
        record.calories_burned,
        record.completed_exercises.len()
    );
    match outcome {
        FinalizeOutcome::Saved(_) => println!("\n✓ Session saved"),
        FinalizeOutcome::Unsaved { error, .. } => println!("\n⚠ Session not saved: {}", error),
    }
}
