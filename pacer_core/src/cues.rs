//! Audio cues for session phase events.
//!
//! The session machine reports cue events; `CueEmitter` turns each into a
//! short tone and hands it to a `CueSink`. Cues are fire-and-forget: a sink
//! failure is logged and never reaches the session.

use crate::{Exercise, RepSpec, Result};
use serde::{Deserialize, Serialize};

/// Phase event that has an audible cue
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CueEvent {
    /// Countdown ticked 3 -> 2 or 2 -> 1
    CountdownTick,
    /// Countdown reached zero; work starts
    CountdownZero,
    /// Last seconds of a timed set
    WorkWarning,
    /// A work or rest phase ended
    PhaseComplete,
    /// Last seconds of rest
    RestWarning,
    /// Pacer switched from lift to lower
    RepTurn,
    /// Pacer started the next rep
    NextRep,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Square,
}

/// A single beep
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    pub waveform: Waveform,
}

impl Tone {
    const fn new(frequency_hz: u32, duration_ms: u32, waveform: Waveform) -> Self {
        Self {
            frequency_hz,
            duration_ms,
            waveform,
        }
    }
}

impl CueEvent {
    /// Tone played for this event
    pub fn tone(&self) -> Tone {
        use Waveform::*;
        match self {
            CueEvent::CountdownTick => Tone::new(880, 100, Sine),
            CueEvent::CountdownZero => Tone::new(1200, 200, Square),
            CueEvent::WorkWarning => Tone::new(1000, 100, Sine),
            CueEvent::PhaseComplete => Tone::new(1200, 200, Square),
            CueEvent::RestWarning => Tone::new(880, 100, Sine),
            CueEvent::RepTurn => Tone::new(660, 100, Sine),
            CueEvent::NextRep => Tone::new(880, 100, Square),
        }
    }
}

/// Audio output
pub trait CueSink: Send {
    fn play(&mut self, tone: Tone) -> Result<()>;
}

/// Maps cue events to tones and plays them, honoring mute
pub struct CueEmitter {
    sink: Box<dyn CueSink>,
    muted: bool,
}

impl CueEmitter {
    pub fn new(sink: Box<dyn CueSink>, muted: bool) -> Self {
        Self { sink, muted }
    }

    /// Emitter that never plays anything
    pub fn silent() -> Self {
        Self::new(Box::new(NullSink), true)
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Play the tone for `event` unless muted
    pub fn on_phase_event(&mut self, event: CueEvent) {
        if self.muted {
            return;
        }
        let tone = event.tone();
        if let Err(e) = self.sink.play(tone) {
            tracing::warn!("Failed to play {:?} cue: {}", event, e);
        }
    }
}

struct NullSink;

impl CueSink for NullSink {
    fn play(&mut self, _tone: Tone) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Spoken Announcements
// ============================================================================

/// Text-to-speech output for set announcements
pub trait SpeechAnnouncer: Send {
    fn announce(&mut self, text: &str) -> Result<()>;
}

/// Phrase spoken when a set begins
pub fn announcement_for(exercise: &Exercise, set: u32) -> String {
    let work = match exercise.rep_spec {
        RepSpec::Reps { count } => format!("{} reps", count),
        RepSpec::Duration { seconds } => format!("{} seconds", seconds),
    };
    format!(
        "{}. Set {} of {}. {}.",
        exercise.name, set, exercise.sets_total, work
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockKind, Error};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        played: Arc<Mutex<Vec<Tone>>>,
    }

    impl CueSink for RecordingSink {
        fn play(&mut self, tone: Tone) -> Result<()> {
            self.played.lock().unwrap().push(tone);
            Ok(())
        }
    }

    struct BrokenSink;

    impl CueSink for BrokenSink {
        fn play(&mut self, _tone: Tone) -> Result<()> {
            Err(Error::Other("no audio device".into()))
        }
    }

    #[test]
    fn test_tone_table() {
        assert_eq!(
            CueEvent::CountdownZero.tone(),
            Tone::new(1200, 200, Waveform::Square)
        );
        assert_eq!(
            CueEvent::WorkWarning.tone(),
            Tone::new(1000, 100, Waveform::Sine)
        );
        assert_eq!(CueEvent::RepTurn.tone().frequency_hz, 660);
        assert_eq!(CueEvent::NextRep.tone().waveform, Waveform::Square);
    }

    #[test]
    fn test_emitter_plays_until_muted() {
        let sink = RecordingSink::default();
        let mut emitter = CueEmitter::new(Box::new(sink.clone()), false);

        emitter.on_phase_event(CueEvent::CountdownTick);
        emitter.set_muted(true);
        emitter.on_phase_event(CueEvent::CountdownTick);

        let played = sink.played.lock().unwrap();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].frequency_hz, 880);
    }

    #[test]
    fn test_sink_failure_is_swallowed() {
        let mut emitter = CueEmitter::new(Box::new(BrokenSink), false);
        emitter.on_phase_event(CueEvent::PhaseComplete);
        assert!(!emitter.is_muted());
    }

    #[test]
    fn test_announcement_text() {
        let exercise = Exercise {
            name: "Goblet Squat".into(),
            block: BlockKind::Training,
            sets_total: 3,
            rep_spec: RepSpec::Reps { count: 12 },
            rest_after_seconds: 30,
            equipment_label: "Kettlebell".into(),
            instructions: String::new(),
            image_ref: None,
            reps_label: "12 reps".into(),
        };
        assert_eq!(
            announcement_for(&exercise, 2),
            "Goblet Squat. Set 2 of 3. 12 reps."
        );
    }
}
