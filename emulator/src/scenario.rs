//! Scenario scripts for the emulator.
//!
//! A script lists wake episodes and what the simulated hardware does during
//! each of them:
//!
//! ```text
//! power-on                     # first episode after full power loss
//! sync fail                    # the time source stays silent next wake
//! wake external after 100s     # sleep 100 s, then wake on the trigger
//! sample 18.0 45               # one sensing iteration: temperature, humidity
//! fail                         # one sensing iteration with a failed read
//! ```
//!
//! The trigger pin reads low while an episode still has queued samples and
//! high once they run out. A `power-on` after the first episode also blanks
//! the RTC, so that episode always falls back to the default time.

use std::fmt;

use coldstart_core::wake::WakeCause;
use winnow::ascii::{dec_uint, float, space1};
use winnow::combinator::{alt, preceded, separated_pair, terminated};
use winnow::prelude::*;
use winnow::token::take_while;

/// One parsed script line.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    PowerOn,
    Wake { cause: WakeCause, after_secs: u32 },
    Sync(bool),
    Sample { temperature: f32, humidity: f32 },
    Fail,
}

/// Sensor behaviour for one sensing iteration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SensorStep {
    Reading { temperature: f32, humidity: f32 },
    Failure,
}

/// Everything the simulated board does in one wake episode.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeScript {
    pub cause: WakeCause,
    /// Simulated seconds spent asleep before this wake.
    pub slept_secs: u32,
    /// Backup domain lost before this episode.
    pub power_loss: bool,
    pub sync_ok: bool,
    pub steps: Vec<SensorStep>,
}

/// A parsed scenario: the episodes in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scenario {
    pub episodes: Vec<EpisodeScript>,
}

/// A script line that could not be used.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScenarioError {
    pub line: usize,
    pub kind: ScenarioErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScenarioErrorKind {
    /// The line does not match any directive; `column` is 1-based.
    Syntax { column: usize, text: String },
    /// A `sample` or `fail` line appeared before the first wake.
    StepBeforeWake,
    /// The script never wakes the board.
    Empty,
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ScenarioErrorKind::Syntax { column, text } => write!(
                f,
                "line {}:{column}: unrecognized directive `{text}`",
                self.line
            ),
            ScenarioErrorKind::StepBeforeWake => write!(
                f,
                "line {}: sensing step before any `power-on` or `wake`",
                self.line
            ),
            ScenarioErrorKind::Empty => f.write_str("scenario contains no episodes"),
        }
    }
}

impl std::error::Error for ScenarioError {}

impl Scenario {
    /// Parses a whole script.
    ///
    /// # Errors
    ///
    /// Returns the first line that does not parse, with its line number.
    pub fn parse(source: &str) -> Result<Self, ScenarioError> {
        let mut scenario = Scenario::default();
        let mut sync_ok = true;

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let text = raw.split_once('#').map_or(raw, |(code, _)| code).trim();
            if text.is_empty() {
                continue;
            }

            let parsed = directive.parse(text).map_err(|err| ScenarioError {
                line,
                kind: ScenarioErrorKind::Syntax {
                    column: err.offset() + 1,
                    text: text.to_owned(),
                },
            })?;

            match parsed {
                Directive::PowerOn => {
                    scenario.begin_episode(WakeCause::PowerOn, 0, true, sync_ok);
                    sync_ok = true;
                }
                Directive::Wake { cause, after_secs } => {
                    scenario.begin_episode(cause, after_secs, false, sync_ok);
                    sync_ok = true;
                }
                Directive::Sync(ok) => sync_ok = ok,
                Directive::Sample {
                    temperature,
                    humidity,
                } => scenario.push_step(
                    line,
                    SensorStep::Reading {
                        temperature,
                        humidity,
                    },
                )?,
                Directive::Fail => scenario.push_step(line, SensorStep::Failure)?,
            }
        }

        if scenario.episodes.is_empty() {
            return Err(ScenarioError {
                line: 0,
                kind: ScenarioErrorKind::Empty,
            });
        }
        Ok(scenario)
    }

    fn begin_episode(&mut self, cause: WakeCause, slept_secs: u32, power_loss: bool, sync_ok: bool) {
        self.episodes.push(EpisodeScript {
            cause,
            slept_secs,
            power_loss,
            sync_ok,
            steps: Vec::new(),
        });
    }

    fn push_step(&mut self, line: usize, step: SensorStep) -> Result<(), ScenarioError> {
        let episode = self.episodes.last_mut().ok_or(ScenarioError {
            line,
            kind: ScenarioErrorKind::StepBeforeWake,
        })?;
        episode.steps.push(step);
        Ok(())
    }
}

fn directive(input: &mut &str) -> ModalResult<Directive> {
    alt((
        wake,
        sync,
        sample,
        "power-on".value(Directive::PowerOn),
        "fail".value(Directive::Fail),
    ))
    .parse_next(input)
}

fn wake(input: &mut &str) -> ModalResult<Directive> {
    preceded(
        ("wake", space1),
        separated_pair(
            wake_cause,
            (space1, "after", space1),
            terminated(dec_uint, "s"),
        ),
    )
    .map(|(cause, after_secs)| Directive::Wake { cause, after_secs })
    .parse_next(input)
}

fn wake_cause(input: &mut &str) -> ModalResult<WakeCause> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-')
        .verify_map(WakeCause::from_tag)
        .parse_next(input)
}

fn sync(input: &mut &str) -> ModalResult<Directive> {
    preceded(("sync", space1), alt(("ok".value(true), "fail".value(false))))
        .map(Directive::Sync)
        .parse_next(input)
}

fn sample(input: &mut &str) -> ModalResult<Directive> {
    preceded(("sample", space1), separated_pair(float, space1, float))
        .map(|(temperature, humidity)| Directive::Sample {
            temperature,
            humidity,
        })
        .parse_next(input)
}
