//! Trajscope core
//!
//! Rebuilds play sessions from directories of recorded Procgen episodes and
//! infers, per episode, whether the level was completed and how far the player
//! progressed. Rendering and export live in the CLI crate; this crate only
//! produces structured outcomes.

pub mod collector;
pub mod config;
pub mod error;
pub mod order;
pub mod outcome;
pub mod pipeline;
pub mod record;
pub mod session;
pub mod session_info;

pub use collector::{TrajectoryFile, collect_trajectory_files};
pub use config::{AnalyzerConfig, DEFAULT_REWARD_THRESHOLDS, SATURATED_PROGRESS};
pub use error::{ErrorKind, Result, TrajError};
pub use order::{FIRST_INDEX_TOKEN, order_sequence};
pub use outcome::{
    CarryOverError, Completion, EpisodeOutcome, ProgressSource, UndeterminedReason,
    resolve_episode, resolve_outcomes,
};
pub use pipeline::{EpisodeReport, OutcomeTally, SessionReport, analyze_root, analyze_session};
pub use record::{EpisodeRecord, JsonRecordReader, RecordReader, StepInfo, load_episodes};
pub use session::{SESSION_DIR_FORMAT, Session, group_sessions, parse_session_timestamp};
pub use session_info::{SESSION_INFO_FILE, SessionInfo};
