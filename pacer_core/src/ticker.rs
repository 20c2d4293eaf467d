//! Tick engine.
//!
//! One tokio task owns the `SessionMachine` and is its only writer. It
//! multiplexes a periodic interval (one engine second per tick) with user
//! commands, plays cues for the events each step produces, and publishes a
//! fresh snapshot after every step. Finishing the session finalizes the
//! record; aborting or dropping the handle tears the task down, after which
//! no further tick fires.

use crate::cues::CueEmitter;
use crate::recorder::{build_record, FinalizeOutcome, SessionRecorder};
use crate::session::{AbandonedSession, Action, SessionEvent, SessionMachine, SessionSnapshot};
use crate::{Error, Result};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Tick period; one tick is one engine second
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickConfig {
    pub period: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
        }
    }
}

/// How a session task ended
#[derive(Debug)]
pub enum SessionOutcome {
    Finished(FinalizeOutcome),
    Aborted(AbandonedSession),
}

enum Command {
    Act {
        action: Action,
        reply: oneshot::Sender<Result<Vec<SessionEvent>>>,
    },
    Abort,
}

/// Handle to a running session task
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    events: Option<mpsc::UnboundedReceiver<SessionEvent>>,
    task: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    /// Apply a user action, returning the events it caused
    pub async fn act(&self, action: Action) -> Result<Vec<SessionEvent>> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Act { action, reply })
            .await
            .map_err(|_| Error::SessionClosed)?;
        response.await.map_err(|_| Error::SessionClosed)?
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Every event the session produces, ticks and actions alike
    ///
    /// Only the first call gets the receiver.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.events.take()
    }

    /// Ask the task to tear down without finishing
    pub async fn abort(&self) -> Result<()> {
        self.commands
            .send(Command::Abort)
            .await
            .map_err(|_| Error::SessionClosed)
    }

    /// Wait for the task to end
    pub async fn wait(self) -> Result<SessionOutcome> {
        let SessionHandle { commands, task, .. } = self;
        // keep the channel open until the task decides to stop
        let outcome = task.await;
        drop(commands);
        outcome.map_err(|e| Error::Other(format!("Session task failed: {}", e)))
    }
}

/// Spawn the session task on the current tokio runtime
pub fn spawn_session(
    machine: SessionMachine,
    cues: CueEmitter,
    recorder: SessionRecorder,
    config: TickConfig,
) -> SessionHandle {
    let (commands, command_rx) = mpsc::channel(16);
    let (snapshot_tx, snapshots) = watch::channel(machine.snapshot());
    let (event_tx, events) = mpsc::unbounded_channel();

    tracing::info!(
        "Spawning session for {:?} ({} exercises, tick {:?})",
        machine.sequence().plan().plan_name,
        machine.sequence().len(),
        config.period
    );

    let task = tokio::spawn(run_session(
        machine,
        SessionIo {
            cues,
            recorder,
            commands: command_rx,
            snapshots: snapshot_tx,
            events: event_tx,
        },
        config,
    ));

    SessionHandle {
        commands,
        snapshots,
        events: Some(events),
        task,
    }
}

struct SessionIo {
    cues: CueEmitter,
    recorder: SessionRecorder,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<SessionSnapshot>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

async fn run_session(
    mut machine: SessionMachine,
    mut io: SessionIo,
    config: TickConfig,
) -> SessionOutcome {
    let mut interval = tokio::time::interval(config.period);
    // the first tick completes immediately
    interval.tick().await;

    loop {
        let (produced, reply) = tokio::select! {
            biased;
            command = io.commands.recv() => match command {
                Some(Command::Act { action, reply }) => match machine.apply(action) {
                    Ok(events) => {
                        // a new phase gets a full first second
                        if events
                            .iter()
                            .any(|e| matches!(e, SessionEvent::PhaseChanged { .. }))
                        {
                            interval.reset();
                        }
                        (events.clone(), Some((reply, Ok(events))))
                    }
                    Err(e) => {
                        tracing::debug!("Rejected {:?}: {}", action, e);
                        (Vec::new(), Some((reply, Err(e))))
                    }
                },
                Some(Command::Abort) | None => {
                    return SessionOutcome::Aborted(machine.abandon());
                }
            },
            _ = interval.tick() => (machine.tick(), None),
        };

        let mut finished = None;
        for event in &produced {
            match event {
                SessionEvent::Cue { cue } => io.cues.on_phase_event(*cue),
                SessionEvent::Finished {
                    reached_index,
                    elapsed_total_seconds,
                } => finished = Some((*reached_index, *elapsed_total_seconds)),
                _ => {}
            }
        }

        io.snapshots.send_replace(machine.snapshot());
        for event in produced {
            // the shell may not listen
            let _ = io.events.send(event);
        }
        // reply last, so the caller observes the snapshot and events it caused
        if let Some((reply, result)) = reply {
            let _ = reply.send(result);
        }

        if let Some((reached_index, elapsed)) = finished {
            let outcome = finalize(&machine, io.recorder.clone(), reached_index, elapsed).await;
            return SessionOutcome::Finished(outcome);
        }
    }
}

async fn finalize(
    machine: &SessionMachine,
    recorder: SessionRecorder,
    reached_index: usize,
    elapsed: u64,
) -> FinalizeOutcome {
    let sequence = machine.sequence().clone();
    let joined = tokio::task::spawn_blocking(move || {
        recorder.finalize(&sequence, reached_index, elapsed)
    })
    .await;

    match joined {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("Session save task failed: {}", e);
            FinalizeOutcome::Unsaved {
                record: build_record(machine.sequence(), reached_index, elapsed),
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{build_sequence, BlockPolicy};
    use crate::cues::{CueEvent, CueSink, Tone};
    use crate::plan::{GeneratedExercise, GeneratedPlan, PlanSource};
    use crate::recorder::SessionStore;
    use crate::{Phase, SessionRecord, WorkProgress};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<Vec<SessionRecord>>,
    }

    impl SessionStore for MemoryStore {
        fn save_session(&self, record: &SessionRecord) -> Result<SessionRecord> {
            self.saved.lock().unwrap().push(record.clone());
            Ok(record.clone())
        }
    }

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

    fn machine(reps: &str, sets: i64) -> SessionMachine {
        let source = PlanSource::Generated(GeneratedPlan {
            estimated_time: 10,
            estimated_calories: 90,
            training: vec![GeneratedExercise {
                name: "Plank".into(),
                reps: reps.into(),
                sets,
                instructions: String::new(),
                image_url: String::new(),
                equipment: None,
                rest_after: Some(10),
            }],
            ..Default::default()
        });
        let policy = BlockPolicy {
            min_generated_sets: 1,
            default_rest_seconds: 10,
        };
        SessionMachine::new(build_sequence(&source, &policy).unwrap())
    }

    fn spawn(machine: SessionMachine, store: Arc<MemoryStore>, sink: RecordingSink) -> SessionHandle {
        spawn_session(
            machine,
            CueEmitter::new(Box::new(sink), false),
            SessionRecorder::new(store),
            TickConfig::default(),
        )
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_runs_on_interval() {
        let sink = RecordingSink::default();
        let handle = spawn(machine("20 seconds", 1), Arc::default(), sink.clone());

        handle.act(Action::Start).await.unwrap();
        assert_eq!(handle.snapshot().state.phase, Phase::Countdown { remaining: 3 });

        sleep_ms(3500).await;
        assert_eq!(
            handle.snapshot().state.phase,
            Phase::Working(WorkProgress::Timed { remaining: 20 })
        );

        let played = sink.played.lock().unwrap().clone();
        assert_eq!(played.len(), 3);
        assert_eq!(played[2], CueEvent::CountdownZero.tone());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_start_gets_full_countdown_seconds() {
        let handle = spawn(machine("20 seconds", 1), Arc::default(), RecordingSink::default());

        sleep_ms(950).await;
        handle.act(Action::Start).await.unwrap();

        sleep_ms(2500).await;
        assert_eq!(handle.snapshot().state.phase, Phase::Countdown { remaining: 1 });

        sleep_ms(600).await;
        assert_eq!(
            handle.snapshot().state.phase,
            Phase::Working(WorkProgress::Timed { remaining: 20 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_the_clock() {
        let handle = spawn(machine("20 seconds", 1), Arc::default(), RecordingSink::default());

        handle.act(Action::Start).await.unwrap();
        sleep_ms(1500).await;
        handle.act(Action::TogglePause).await.unwrap();

        sleep_ms(10_000).await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state.phase, Phase::Countdown { remaining: 2 });
        assert_eq!(snapshot.state.elapsed_total_seconds, 1);

        handle.act(Action::TogglePause).await.unwrap();
        sleep_ms(1000).await;
        assert_eq!(handle.snapshot().state.phase, Phase::Countdown { remaining: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_action_is_returned() {
        let handle = spawn(machine("20 seconds", 1), Arc::default(), RecordingSink::default());
        assert!(matches!(
            handle.act(Action::SelectSet { set: 4 }).await,
            Err(Error::SetOutOfRange { .. })
        ));
        assert!(handle.act(Action::Start).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_finishing_saves_once() {
        let store = Arc::new(MemoryStore::default());
        let mut handle = spawn(machine("12 reps", 2), store.clone(), RecordingSink::default());
        let mut events = handle.take_events().unwrap();

        sleep_ms(4200).await;
        handle.act(Action::NextExercise).await.unwrap();

        match handle.wait().await.unwrap() {
            SessionOutcome::Finished(outcome) => {
                assert!(outcome.is_saved());
                assert_eq!(outcome.record().plan_name, "AI Daily Workout");
                assert_eq!(outcome.record().calories_burned, 90);
            }
            other => panic!("expected finished session, got {:?}", other),
        }
        assert_eq!(store.saved.lock().unwrap().len(), 1);

        let mut finished = 0;
        while let Some(event) = events.recv().await {
            if matches!(event, SessionEvent::Finished { .. }) {
                finished += 1;
            }
        }
        assert_eq!(finished, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_tears_down_without_saving() {
        let store = Arc::new(MemoryStore::default());
        let handle = spawn(machine("20 seconds", 1), store.clone(), RecordingSink::default());
        let mut snapshots = handle.subscribe();

        handle.act(Action::Start).await.unwrap();
        sleep_ms(2500).await;
        handle.abort().await.unwrap();

        match handle.wait().await.unwrap() {
            SessionOutcome::Aborted(abandoned) => {
                assert_eq!(abandoned.reached_index, 0);
                assert_eq!(abandoned.elapsed_total_seconds, 2);
            }
            other => panic!("expected aborted session, got {:?}", other),
        }
        assert!(store.saved.lock().unwrap().is_empty());

        let last = snapshots.borrow_and_update().clone();
        sleep_ms(5000).await;
        assert!(!snapshots.has_changed().unwrap_or(false));
        assert_eq!(last.state.elapsed_total_seconds, 2);
    }
}
