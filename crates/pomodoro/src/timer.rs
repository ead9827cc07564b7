//! Countdown loop for a single phase
//!
//! The loop waits on a deadline taken from a monotonic clock. Each tick
//! sleeps until the next whole second since the phase started, so the
//! displayed countdown does not drift when a redraw runs late.

use crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{Clear, ClearType},
};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

use crate::alert::{AlertSpec, Alerter};
use crate::clock::{CancelToken, Clock, Wake};
use crate::error::Result;
use crate::render::{Frame, StatusRenderer};

const ONE_SECOND: Duration = Duration::from_secs(1);

/// How a phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The deadline was reached and the alert fired
    Completed,
    /// The user interrupted; no alert fired
    Cancelled,
}

/// One timed interval in progress
#[derive(Debug, Clone)]
pub struct TimerSession {
    pub label: String,
    pub total: Duration,
    /// Monotonic start time
    pub start: Duration,
}

impl TimerSession {
    pub fn new(label: impl Into<String>, total: Duration, start: Duration) -> Self {
        Self {
            label: label.into(),
            total,
            start,
        }
    }

    pub fn end(&self) -> Duration {
        self.start + self.total
    }

    /// Time left at `now`, zero once the deadline has passed
    pub fn remaining(&self, now: Duration) -> Duration {
        self.end().saturating_sub(now)
    }

    /// Time spent at `now`, never more than the total
    pub fn elapsed(&self, now: Duration) -> Duration {
        self.total - self.remaining(now)
    }

    pub fn is_over(&self, now: Duration) -> bool {
        now >= self.end()
    }
}

/// Delay until the next whole second after `start`, clamped to `[0, 1s]`
pub fn next_tick_delay(start: Duration, elapsed: Duration, now: Duration) -> Duration {
    let target = start + Duration::from_secs(elapsed.as_secs() + 1);
    target.saturating_sub(now).min(ONE_SECOND)
}

/// Format a wall-clock time as `HH:MM AM`
pub fn format_clock(time: chrono::NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

/// Runs phases against a clock, rendering to `out`
pub struct Timer<C: Clock, W: Write> {
    clock: C,
    out: W,
    renderer: StatusRenderer,
    alerter: Alerter,
    cancel: CancelToken,
}

impl<C: Clock, W: Write> Timer<C, W> {
    /// Create a timer writing to `out` and sleeping on `clock`
    pub fn new(
        clock: C,
        out: W,
        renderer: StatusRenderer,
        alerter: Alerter,
        cancel: CancelToken,
    ) -> Self {
        Self {
            clock,
            out,
            renderer,
            alerter,
            cancel,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Count down `duration`, then alert.
    ///
    /// Returns [`Outcome::Cancelled`] as soon as the cancel token fires.
    pub fn run(&mut self, duration: Duration, label: &str, alert: &AlertSpec) -> Result<Outcome> {
        if self.cancel.is_cancelled() {
            return self.interrupted(label);
        }

        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        writeln!(self.out, "--- {} ---", label)?;
        self.out.flush()?;

        let wake = {
            let _armed = self.cancel.arm();
            let session = TimerSession::new(label, duration, self.clock.now());
            info!(
                phase = label,
                seconds = duration.as_secs_f64(),
                "Phase started"
            );
            self.count_down(&session)?
        };

        // An interrupt can land between the deadline check and disarming.
        if wake == Wake::Cancelled || self.cancel.is_cancelled() {
            return self.interrupted(label);
        }

        writeln!(self.out, "\nTime is up!")?;
        self.out.flush()?;
        info!(phase = label, "Phase complete");

        self.alerter.alert(&mut self.out, &self.clock, &self.cancel, alert);
        Ok(Outcome::Completed)
    }

    fn interrupted(&mut self, label: &str) -> Result<Outcome> {
        writeln!(self.out, "\nInterrupted by user.")?;
        self.out.flush()?;
        info!(phase = label, "Phase interrupted");
        Ok(Outcome::Cancelled)
    }

    fn count_down(&mut self, session: &TimerSession) -> Result<Wake> {
        self.renderer.reset();
        let mut ticks = 0u64;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(Wake::Cancelled);
            }

            let now = self.clock.now();
            if session.is_over(now) {
                debug!(ticks, "Deadline reached");
                return Ok(Wake::Elapsed);
            }

            let remaining = session.remaining(now);
            let elapsed = session.elapsed(now);
            let frame = Frame {
                total: session.total,
                elapsed,
                clock: format_clock(self.clock.time_of_day()),
                minutes_remaining: remaining.as_secs() / 60,
                seconds_remaining: remaining.as_secs() % 60,
            };
            self.renderer.render(&mut self.out, &frame)?;
            ticks += 1;

            let delay = next_tick_delay(session.start, elapsed, self.clock.now());
            if self.clock.sleep(delay, &self.cancel) == Wake::Cancelled {
                return Ok(Wake::Cancelled);
            }
        }
    }
}
