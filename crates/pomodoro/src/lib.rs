//! pomodoro - Terminal interval timer
//!
//! Alternates work and break phases, drawing a live two-line countdown with a
//! progress bar and sounding an alert at each boundary:
//! - Work phases of 25 minutes
//! - Short 5 minute breaks, acknowledged before the next work phase
//! - A 15 minute long break after every fourth work phase
//!
//! Components, leaves first: [`alert`] (bell/tone), [`render`] (status
//! lines), [`timer`] (deadline loop), [`cycle`] (phase sequencing).

pub mod alert;
pub mod clock;
pub mod config;
pub mod cycle;
pub mod error;
pub mod render;
pub mod timer;

pub use alert::{AlertSpec, Alerter, BellMode};
pub use clock::{CancelToken, Clock, SystemClock};
pub use config::Config;
pub use cycle::{LinePrompt, Phase, Sequencer, Stopped};
pub use error::{PomodoroError, Result};
pub use render::StatusRenderer;
pub use timer::{Outcome, Timer};
