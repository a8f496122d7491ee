//! Replay a recorded trace of lifecycle and touch steps through a guarded
//! activity, for tuning the block and throttle windows.
//!
//! Trace format (TOML):
//!
//! ```toml
//! [[step]]
//! kind = "create"
//! at_ms = 0
//! task_root = true
//!
//! [[step]]
//! kind = "touch"
//! at_ms = 120
//! flags = 1
//!
//! [[step]]
//! kind = "touch"
//! at_ms = 150
//! partially_obscured = true
//! ```
//!
//! A touch gives either raw `flags` or the obstruction booleans, not both.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::activity::{CreateOutcome, GuardSettings, GuardedActivity, HostRequest, RecordingHost};
use crate::clock::{ManualClock, Timestamp};
use crate::error::TraceError;
use crate::event::{ApiLevel, TouchEvent};
use crate::launch::{LaunchClassifier, LaunchIntent};
use crate::overlay::{RejectReason, TouchDecision};

#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    /// Overrides the configured API level for this trace.
    pub api_level: Option<u32>,
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Step {
    Create {
        at_ms: Timestamp,
        #[serde(default)]
        task_root: bool,
        intent: Option<LaunchIntent>,
    },
    Touch {
        at_ms: Timestamp,
        flags: Option<u32>,
        #[serde(default)]
        fully_obscured: bool,
        #[serde(default)]
        partially_obscured: bool,
    },
}

impl Step {
    pub fn at_ms(&self) -> Timestamp {
        match self {
            Step::Create { at_ms, .. } | Step::Touch { at_ms, .. } => *at_ms,
        }
    }
}

struct TraceLaunch<'a> {
    task_root: bool,
    intent: Option<&'a LaunchIntent>,
}

impl LaunchClassifier for TraceLaunch<'_> {
    fn is_task_root(&self) -> bool {
        self.task_root
    }

    fn launch_intent(&self) -> Option<&LaunchIntent> {
        self.intent
    }
}

impl Trace {
    pub fn from_toml(content: &str) -> Result<Self, TraceError> {
        let trace: Trace = toml::from_str(content)?;
        trace.validate()?;
        Ok(trace)
    }

    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let content = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trace = Self::from_toml(&content)?;
        log::debug!("Loaded trace {} ({} steps)", path.display(), trace.steps.len());
        Ok(trace)
    }

    fn validate(&self) -> Result<(), TraceError> {
        if self.steps.is_empty() {
            return Err(TraceError::Empty);
        }
        let mut previous_ms = 0;
        let mut seen_create = false;
        for (index, step) in self.steps.iter().enumerate() {
            let at_ms = step.at_ms();
            if at_ms < previous_ms {
                return Err(TraceError::NonMonotonic {
                    index,
                    at_ms,
                    previous_ms,
                });
            }
            previous_ms = at_ms;

            match step {
                Step::Create { .. } => {
                    if seen_create {
                        return Err(TraceError::DuplicateCreate { index });
                    }
                    seen_create = true;
                }
                Step::Touch {
                    flags: Some(_),
                    fully_obscured,
                    partially_obscured,
                    ..
                } if *fully_obscured || *partially_obscured => {
                    return Err(TraceError::AmbiguousTouch { index });
                }
                Step::Touch { .. } => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    Created(CreateOutcome),
    Touch {
        decision: TouchDecision,
        reason: Option<RejectReason>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub at_ms: Timestamp,
    pub result: StepResult,
    /// Host requests issued while handling this step.
    pub requests: Vec<HostRequest>,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:8}ms  ", self.at_ms)?;
        match &self.result {
            StepResult::Created(CreateOutcome::Ready) => write!(f, "create   ready")?,
            StepResult::Created(CreateOutcome::Terminated) => write!(f, "create   terminated")?,
            StepResult::Touch { decision, reason } => {
                let decision = match decision {
                    TouchDecision::Deliver => "deliver",
                    TouchDecision::Reject => "reject",
                };
                write!(f, "touch    {}", decision)?;
                match reason {
                    Some(RejectReason::ActiveBlock) => write!(f, " (block window)")?,
                    Some(RejectReason::Obscured) => write!(f, " (obscured)")?,
                    Some(RejectReason::Unavailable) => write!(f, " (guard unavailable)")?,
                    Some(RejectReason::NotCreated) => write!(f, " (not created)")?,
                    Some(RejectReason::Terminated) => write!(f, " (terminated)")?,
                    None => {}
                }
            }
        }
        for request in &self.requests {
            write!(f, "  -> {}", request)?;
        }
        Ok(())
    }
}

pub fn replay(trace: &Trace, mut settings: GuardSettings) -> Vec<StepReport> {
    if let Some(level) = trace.api_level {
        settings.api_level = ApiLevel(level);
    }
    let api = settings.api_level;
    let clock = ManualClock::new(0);
    let mut activity = GuardedActivity::with_clock(RecordingHost::new(), &clock, settings);
    let mut reports = Vec::with_capacity(trace.steps.len());

    for step in &trace.steps {
        clock.set(step.at_ms());
        let result = match step {
            Step::Create {
                task_root, intent, ..
            } => {
                let launch = TraceLaunch {
                    task_root: *task_root,
                    intent: intent.as_ref(),
                };
                StepResult::Created(activity.on_create(&launch))
            }
            Step::Touch {
                flags,
                fully_obscured,
                partially_obscured,
                ..
            } => {
                let event = match flags {
                    Some(flags) => TouchEvent::from_motion_flags(*flags, api),
                    None => TouchEvent {
                        fully_obscured: *fully_obscured,
                        partially_obscured: *partially_obscured,
                    },
                };
                let outcome = activity.dispatch_touch_detailed(&event);
                StepResult::Touch {
                    decision: outcome.decision,
                    reason: outcome.reason,
                }
            }
        };
        reports.push(StepReport {
            at_ms: step.at_ms(),
            result,
            requests: activity.host_mut().drain(),
        });
    }

    reports
}
