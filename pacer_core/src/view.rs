//! Display values derived from a session snapshot.

use crate::session::{SessionSnapshot, COUNTDOWN_SECONDS};
use crate::{Phase, RepSpec, WorkProgress};

/// Footer timer: seconds to show and how far the current timer has run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FooterTimer {
    pub seconds: u32,
    /// 0..=100
    pub percent: u8,
}

/// Footer timer for the current phase
///
/// `None` when there is no timer to show: rep-based work (the pacer replaces
/// it), a rep-based exercise waiting to start, and the finished session.
pub fn footer_timer(snapshot: &SessionSnapshot) -> Option<FooterTimer> {
    let exercise = &snapshot.exercise;
    let timer = |remaining: u32, total: u32| FooterTimer {
        seconds: remaining,
        percent: percent_done(remaining, total),
    };

    match snapshot.state.phase {
        Phase::Countdown { remaining } => Some(timer(remaining, COUNTDOWN_SECONDS)),
        Phase::Working(WorkProgress::Timed { remaining }) => match exercise.rep_spec {
            RepSpec::Duration { seconds } => Some(timer(remaining, seconds)),
            RepSpec::Reps { .. } => None,
        },
        Phase::Working(WorkProgress::Reps(_)) => None,
        Phase::Resting { remaining } => Some(timer(remaining, exercise.rest_after_seconds)),
        Phase::Ready => match exercise.rep_spec {
            RepSpec::Duration { seconds } => Some(FooterTimer {
                seconds,
                percent: 0,
            }),
            RepSpec::Reps { .. } => None,
        },
        Phase::ExerciseComplete => Some(FooterTimer {
            seconds: 0,
            percent: 100,
        }),
        Phase::Finished => None,
    }
}

fn percent_done(remaining: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = u64::from(total.saturating_sub(remaining)) * 100 / u64::from(total);
    done.min(100) as u8
}

/// Elapsed time against the plan estimate, capped at 100
pub fn overall_progress(snapshot: &SessionSnapshot) -> u8 {
    let total = u64::from(snapshot.estimated_minutes) * 60;
    if total == 0 {
        return 0;
    }
    (snapshot.state.elapsed_total_seconds * 100 / total).min(100) as u8
}

/// Whole minutes left of the plan estimate, rounded up, never negative
pub fn minutes_left(snapshot: &SessionSnapshot) -> u64 {
    let total = u64::from(snapshot.estimated_minutes) * 60;
    total
        .saturating_sub(snapshot.state.elapsed_total_seconds)
        .div_ceil(60)
}

/// `MM:SS`; minutes keep counting past 99
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
