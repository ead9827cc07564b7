//! End-of-phase alerts
//!
//! The bell mode is resolved once into an [`Alerter`] capability. Tonal
//! beeps go through a platform command; any failure drops back to the
//! terminal bell. Alerting is best effort and never returns an error.

use serde::Serialize;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::clock::{CancelToken, Clock, Wake};
use crate::error::PomodoroError;

const BELL: &[u8] = b"\x07";

/// Requested alert style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BellMode {
    /// No alert at all
    Off,
    /// Tonal beep where the platform has one
    Tone,
    /// Terminal bell character
    Ascii,
    /// Tone if available, bell otherwise
    Auto,
}

impl BellMode {
    /// Tone on Windows, the terminal bell everywhere else
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            BellMode::Tone
        } else {
            BellMode::Ascii
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BellMode::Off => "off",
            BellMode::Tone => "tone",
            BellMode::Ascii => "ascii",
            BellMode::Auto => "auto",
        }
    }
}

impl FromStr for BellMode {
    type Err = PomodoroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(BellMode::Off),
            "tone" => Ok(BellMode::Tone),
            "ascii" => Ok(BellMode::Ascii),
            "auto" => Ok(BellMode::Auto),
            _ => Err(PomodoroError::InvalidBellMode(s.to_string())),
        }
    }
}

/// Parameters of one alert sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlertSpec {
    /// Number of pulses
    pub repeat: u32,
    pub frequency_hz: u32,
    pub duration_ms: u32,
    /// Pause after each pulse in seconds; negative values count as zero
    pub gap: f64,
}

impl AlertSpec {
    /// Build an alert from its repeat count, tone and gap in seconds
    pub fn new(repeat: u32, frequency_hz: u32, duration_ms: u32, gap: f64) -> Self {
        Self {
            repeat,
            frequency_hz,
            duration_ms,
            gap,
        }
    }

    /// Gap between pulses, clamped to zero
    pub fn gap_duration(&self) -> Duration {
        Duration::from_secs_f64(self.gap.max(0.0))
    }
}

impl Default for AlertSpec {
    fn default() -> Self {
        Self::new(2, 1000, 250, 0.07)
    }
}

/// A facility able to play a tone of a given pitch and length
pub trait Tone {
    fn play(&self, frequency_hz: u32, duration_ms: u32) -> io::Result<()>;
}

/// Tonal beep driven by a platform command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTone {
    /// `[console]::beep` through PowerShell (Windows)
    PowerShell,
    /// The `beep` utility (Linux)
    BeepUtility,
}

impl CommandTone {
    /// Find the tonal facility for the current platform, if any
    pub fn detect() -> Option<Self> {
        #[cfg(windows)]
        {
            return Some(Self::PowerShell);
        }

        #[cfg(target_os = "linux")]
        {
            if Self::command_exists("beep") {
                return Some(Self::BeepUtility);
            }
            return None;
        }

        #[cfg(not(any(windows, target_os = "linux")))]
        {
            None
        }
    }

    #[cfg(target_os = "linux")]
    fn command_exists(cmd: &str) -> bool {
        Command::new("which")
            .arg(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::PowerShell => "powershell",
            Self::BeepUtility => "beep",
        }
    }
}

impl Tone for CommandTone {
    fn play(&self, frequency_hz: u32, duration_ms: u32) -> io::Result<()> {
        let mut cmd = match self {
            Self::PowerShell => {
                let mut cmd = Command::new("powershell.exe");
                cmd.args([
                    "-NoProfile",
                    "-Command",
                    &format!("[console]::beep({}, {})", frequency_hz, duration_ms),
                ]);
                cmd
            }
            Self::BeepUtility => {
                let mut cmd = Command::new("beep");
                cmd.args([
                    "-f",
                    &frequency_hz.to_string(),
                    "-l",
                    &duration_ms.to_string(),
                ]);
                cmd
            }
        };

        let status = cmd.stdout(Stdio::null()).stderr(Stdio::null()).status()?;
        if !status.success() {
            return Err(io::Error::other(format!(
                "{} exited with status: {}",
                self.name(),
                status
            )));
        }
        Ok(())
    }
}

/// Alert capability selected once at startup
pub enum Alerter {
    /// Tonal beep, falling back to the bell on failure
    Tonal(Box<dyn Tone>),
    /// Terminal bell character
    AsciiBell,
    /// Nothing is emitted
    Silent,
}

impl Alerter {
    /// Resolve a bell mode against what the platform offers
    pub fn select(mode: BellMode) -> Self {
        let alerter = match mode {
            BellMode::Off => Alerter::Silent,
            BellMode::Ascii => Alerter::AsciiBell,
            BellMode::Tone | BellMode::Auto => match CommandTone::detect() {
                Some(tone) => Alerter::Tonal(Box::new(tone)),
                None => Alerter::AsciiBell,
            },
        };
        debug!(
            mode = mode.as_str(),
            alerter = alerter.name(),
            "Selected alerter"
        );
        alerter
    }

    /// Which kind of alerter was selected
    pub fn name(&self) -> &'static str {
        match self {
            Alerter::Tonal(_) => "tonal",
            Alerter::AsciiBell => "ascii-bell",
            Alerter::Silent => "silent",
        }
    }

    /// Fire `spec.repeat` pulses, each followed by the configured gap.
    pub fn alert<W, C>(&self, out: &mut W, clock: &C, cancel: &CancelToken, spec: &AlertSpec)
    where
        W: Write + ?Sized,
        C: Clock + ?Sized,
    {
        let gap = spec.gap_duration();
        for _ in 0..spec.repeat {
            self.pulse(out, spec);
            if clock.sleep(gap, cancel) == Wake::Cancelled {
                debug!("Alert cut short by interrupt");
                break;
            }
        }
    }

    fn pulse<W: Write + ?Sized>(&self, out: &mut W, spec: &AlertSpec) {
        match self {
            Alerter::Silent => {}
            Alerter::AsciiBell => ring_bell(out),
            Alerter::Tonal(tone) => {
                if let Err(e) = tone.play(spec.frequency_hz, spec.duration_ms) {
                    debug!("Tone failed, falling back to bell: {}", e);
                    ring_bell(out);
                }
            }
        }
    }
}

fn ring_bell<W: Write + ?Sized>(out: &mut W) {
    if let Err(e) = out.write_all(BELL).and_then(|_| out.flush()) {
        warn!("Could not write terminal bell: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ManualClock;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeTone {
        fail: bool,
        plays: Rc<Cell<u32>>,
    }

    impl Tone for FakeTone {
        fn play(&self, _frequency_hz: u32, _duration_ms: u32) -> io::Result<()> {
            self.plays.set(self.plays.get() + 1);
            if self.fail {
                Err(io::Error::other("no speaker"))
            } else {
                Ok(())
            }
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    fn run(alerter: &Alerter, spec: &AlertSpec) -> (Vec<u8>, ManualClock) {
        let clock = ManualClock::new(Duration::from_millis(10));
        let mut out = Vec::new();
        alerter.alert(&mut out, &clock, &CancelToken::new(), spec);
        (out, clock)
    }

    #[test]
    fn test_bell_mode_parse() {
        assert_eq!("off".parse::<BellMode>().unwrap(), BellMode::Off);
        assert_eq!("TONE".parse::<BellMode>().unwrap(), BellMode::Tone);
        assert_eq!(" ascii ".parse::<BellMode>().unwrap(), BellMode::Ascii);
        assert_eq!("auto".parse::<BellMode>().unwrap(), BellMode::Auto);
        assert!(matches!(
            "loud".parse::<BellMode>(),
            Err(PomodoroError::InvalidBellMode(_))
        ));
    }

    #[test]
    fn test_select_off_and_ascii() {
        assert!(matches!(Alerter::select(BellMode::Off), Alerter::Silent));
        assert!(matches!(
            Alerter::select(BellMode::Ascii),
            Alerter::AsciiBell
        ));
    }

    #[test]
    fn test_ascii_bell_repeats_with_gaps() {
        let (out, clock) = run(&Alerter::AsciiBell, &AlertSpec::new(3, 1000, 200, 0.05));
        assert_eq!(out, b"\x07\x07\x07");
        let sleeps = clock.sleeps.borrow();
        assert_eq!(sleeps.len(), 3);
        assert!(sleeps.iter().all(|d| *d == Duration::from_millis(50)));
    }

    #[test]
    fn test_silent_emits_nothing() {
        let (out, _) = run(&Alerter::Silent, &AlertSpec::new(2, 1000, 200, 0.05));
        assert!(out.is_empty());
    }

    #[test]
    fn test_zero_repeat_does_nothing() {
        let (out, clock) = run(&Alerter::AsciiBell, &AlertSpec::new(0, 1000, 200, 0.05));
        assert!(out.is_empty());
        assert!(clock.sleeps.borrow().is_empty());
    }

    #[test]
    fn test_negative_gap_clamped() {
        let (_, clock) = run(&Alerter::AsciiBell, &AlertSpec::new(1, 1000, 200, -1.5));
        assert_eq!(clock.sleeps.borrow()[0], Duration::ZERO);
    }

    #[test]
    fn test_tonal_success_writes_no_bell() {
        let plays = Rc::new(Cell::new(0));
        let alerter = Alerter::Tonal(Box::new(FakeTone {
            fail: false,
            plays: Rc::clone(&plays),
        }));
        let (out, _) = run(&alerter, &AlertSpec::new(2, 800, 400, 0.0));
        assert!(out.is_empty());
        assert_eq!(plays.get(), 2);
    }

    #[test]
    fn test_tonal_failure_falls_back_to_bell() {
        let plays = Rc::new(Cell::new(0));
        let alerter = Alerter::Tonal(Box::new(FakeTone {
            fail: true,
            plays: Rc::clone(&plays),
        }));
        let (out, _) = run(&alerter, &AlertSpec::new(2, 800, 400, 0.0));
        assert_eq!(plays.get(), 2);
        assert_eq!(out, b"\x07\x07");
    }

    #[test]
    fn test_cancel_stops_remaining_pulses() {
        let clock = ManualClock::new(Duration::from_millis(10)).cancel_after(1);
        let mut out = Vec::new();
        let spec = AlertSpec::new(3, 800, 400, 0.05);
        Alerter::AsciiBell.alert(&mut out, &clock, &CancelToken::new(), &spec);
        assert_eq!(out, b"\x07");
        assert_eq!(clock.sleeps.borrow().len(), 1);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let clock = ManualClock::new(Duration::from_millis(10));
        let mut out = BrokenPipe;
        let spec = AlertSpec::default();
        Alerter::AsciiBell.alert(&mut out, &clock, &CancelToken::new(), &spec);
        assert_eq!(clock.sleeps.borrow().len(), 2);
    }
}
