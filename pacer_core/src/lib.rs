#![forbid(unsafe_code)]

//! Core domain model and session engine for the Pacer workout player.
//!
//! This crate provides:
//! - Plan documents (user-authored and generated) and the block model
//! - The session state machine and its tick engine
//! - Audio cue and speech capabilities
//! - Session recording and the JSONL data service
//! - Built-in catalog, configuration and history

pub mod types;
pub mod error;
pub mod plan;
pub mod blocks;
pub mod session;
pub mod ticker;
pub mod cues;
pub mod recorder;
pub mod store;
pub mod history;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod view;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use plan::{
    accept_generated_plan, generate_sequence, parse_generated_plan, GeneratedExercise,
    GeneratedPlan, PlanGenerator, PlanSource, UserPlan,
};
pub use blocks::{build_sequence, BlockPolicy, WorkoutBlockSequence};
pub use session::{Action, SessionEvent, SessionMachine, SessionSnapshot};
pub use ticker::{spawn_session, SessionHandle, SessionOutcome, TickConfig};
pub use cues::{CueEmitter, CueEvent, CueSink, SpeechAnnouncer, Tone, Waveform};
pub use recorder::{FinalizeOutcome, SessionRecorder, SessionStore};
pub use store::JsonlSessionStore;
pub use history::{find_in_window, load_history, TimeWindow};
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
