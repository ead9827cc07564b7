//! Error types for the pomodoro timer

use thiserror::Error;

/// Errors surfaced by the timer library
#[derive(Error, Debug)]
pub enum PomodoroError {
    #[error("Invalid bell mode '{0}' (expected off, tone, ascii or auto)")]
    InvalidBellMode(String),

    #[error("Standard input closed while waiting for acknowledgment")]
    InputClosed,

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PomodoroError>;
