//! Work/break sequencing
//!
//! WORK -> SHORT BREAK -> (acknowledge) -> WORK ... with every fourth break
//! long and unacknowledged. The cycle only ends when a phase is interrupted.

use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::{debug, info};

use crate::alert::AlertSpec;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{PomodoroError, Result};
use crate::render::dim;
use crate::timer::{Outcome, Timer};

/// One kind of timed interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    /// Header shown above the countdown
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "WORK",
            Phase::ShortBreak => "SHORT BREAK",
            Phase::LongBreak => "LONG BREAK",
        }
    }

    pub fn duration(&self, config: &Config) -> Duration {
        match self {
            Phase::Work => config.work,
            Phase::ShortBreak => config.short_break,
            Phase::LongBreak => config.long_break,
        }
    }

    pub fn alert(&self, config: &Config) -> AlertSpec {
        match self {
            Phase::Work => config.work_alert,
            Phase::ShortBreak => config.short_break_alert,
            Phase::LongBreak => config.long_break_alert,
        }
    }

    /// Break that follows the `completed`th work phase
    pub fn break_after(completed: u64, long_every: u64) -> Self {
        if completed % long_every.max(1) == 0 {
            Phase::LongBreak
        } else {
            Phase::ShortBreak
        }
    }
}

/// Something that can time a phase
pub trait PhaseRunner {
    fn run_phase(
        &mut self,
        phase: Phase,
        duration: Duration,
        alert: &AlertSpec,
    ) -> Result<Outcome>;
}

impl<C: Clock, W: Write> PhaseRunner for Timer<C, W> {
    fn run_phase(
        &mut self,
        phase: Phase,
        duration: Duration,
        alert: &AlertSpec,
    ) -> Result<Outcome> {
        self.run(duration, phase.label(), alert)
    }
}

/// Blocks until the user is ready for the next work phase
pub trait Acknowledge {
    fn acknowledge(&mut self) -> Result<()>;
}

/// Prompt on `out` and wait for a line on `input`
pub struct LinePrompt<R: BufRead, W: Write> {
    input: R,
    out: W,
    prompt: String,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, out: W, color: bool) -> Self {
        Self {
            input,
            out,
            prompt: dim(color, "Press enter to continue..."),
        }
    }
}

impl<R: BufRead, W: Write> Acknowledge for LinePrompt<R, W> {
    fn acknowledge(&mut self) -> Result<()> {
        write!(self.out, "{}", self.prompt)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PomodoroError::InputClosed);
        }
        Ok(())
    }
}

/// Why the cycle stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stopped {
    Interrupted,
}

/// Drives the endless work/break cycle
pub struct Sequencer {
    config: Config,
    completed: u64,
}

impl Sequencer {
    /// Create a sequencer with no work phases completed
    pub fn new(config: Config) -> Self {
        Self {
            config,
            completed: 0,
        }
    }

    /// Number of work phases finished so far
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Run cycles until a phase is interrupted
    pub fn run<P, A>(&mut self, runner: &mut P, ack: &mut A) -> Result<Stopped>
    where
        P: PhaseRunner + ?Sized,
        A: Acknowledge + ?Sized,
    {
        loop {
            if self.run_phase(runner, Phase::Work)? == Outcome::Cancelled {
                return Ok(Stopped::Interrupted);
            }
            self.completed += 1;
            info!(completed = self.completed, "Work phase done");

            let next = Phase::break_after(self.completed, self.config.long_break_every);
            if self.run_phase(runner, next)? == Outcome::Cancelled {
                return Ok(Stopped::Interrupted);
            }

            if next == Phase::ShortBreak {
                debug!("Waiting for acknowledgment");
                ack.acknowledge()?;
            }
        }
    }

    fn run_phase<P: PhaseRunner + ?Sized>(&self, runner: &mut P, phase: Phase) -> Result<Outcome> {
        runner.run_phase(
            phase,
            phase.duration(&self.config),
            &phase.alert(&self.config),
        )
    }
}
