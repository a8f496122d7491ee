//! Wire both guards into an activity lifecycle: relaunch check on create,
//! overlay guard on every touch.

use std::fmt;

use crate::clock::{Clock, MonotonicClock};
use crate::event::{ApiLevel, TouchClassifier};
use crate::launch::{self, LaunchClassifier};
use crate::overlay::{OverlayGuard, RejectReason, ThrottleConfig, TouchDecision, TouchOutcome};

pub const DEFAULT_WARNING_MESSAGE: &str = "Screen overlay detected. Tap blocked for your security.";

/// Requests the guard makes of the UI framework.
pub trait ActivityHost {
    fn finish(&mut self);
    /// Keep window contents out of screenshots and screen recording.
    fn set_secure_window(&mut self);
    fn set_filter_touches_when_obscured(&mut self, enabled: bool);
    fn show_warning(&mut self, message: &str);
}

#[derive(Debug, Clone)]
pub struct GuardSettings {
    pub throttle: ThrottleConfig,
    pub api_level: ApiLevel,
    pub warning_message: String,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            throttle: ThrottleConfig::default(),
            api_level: ApiLevel::default(),
            warning_message: DEFAULT_WARNING_MESSAGE.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The instance was finished; nothing else was set up.
    Terminated,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Constructed,
    Ready,
    Terminated,
}

pub struct GuardedActivity<H: ActivityHost, C: Clock = MonotonicClock> {
    host: H,
    clock: C,
    overlay: OverlayGuard,
    warning_message: String,
    lifecycle: Lifecycle,
}

impl<H: ActivityHost> GuardedActivity<H> {
    pub fn new(host: H, settings: GuardSettings) -> Self {
        Self::with_clock(host, MonotonicClock::new(), settings)
    }
}

impl<H: ActivityHost, C: Clock> GuardedActivity<H, C> {
    pub fn with_clock(host: H, clock: C, settings: GuardSettings) -> Self {
        Self {
            host,
            clock,
            overlay: OverlayGuard::new(settings.throttle, settings.api_level),
            warning_message: settings.warning_message,
            lifecycle: Lifecycle::Constructed,
        }
    }

    /// Must run before anything else touches the window.
    pub fn on_create(&mut self, launch: &impl LaunchClassifier) -> CreateOutcome {
        if self.lifecycle != Lifecycle::Constructed {
            log::warn!("on_create called twice, ignoring");
            return self.create_outcome();
        }

        if launch::evaluate(launch) {
            self.host.finish();
            self.lifecycle = Lifecycle::Terminated;
            return CreateOutcome::Terminated;
        }

        self.host.set_secure_window();
        self.host.set_filter_touches_when_obscured(true);
        self.lifecycle = Lifecycle::Ready;
        log::info!(
            "Activity ready (block {}ms, warning throttle {}ms, {})",
            self.overlay.config().block_duration_ms,
            self.overlay.config().warning_throttle_ms,
            self.overlay.api_level()
        );
        CreateOutcome::Ready
    }

    /// Returns whether the host should continue normal dispatch.
    pub fn dispatch_touch(&mut self, event: &impl TouchClassifier) -> TouchDecision {
        self.dispatch_touch_detailed(event).decision
    }

    pub fn dispatch_touch_detailed(&mut self, event: &impl TouchClassifier) -> TouchOutcome {
        let now = self.clock.now_ms();
        match self.lifecycle {
            Lifecycle::Ready => {}
            Lifecycle::Constructed => {
                log::debug!("Touch at {}ms before create, rejecting", now);
                return TouchOutcome::reject(RejectReason::NotCreated, false);
            }
            Lifecycle::Terminated => {
                log::debug!("Touch at {}ms after termination, rejecting", now);
                return TouchOutcome::reject(RejectReason::Terminated, false);
            }
        }

        let outcome = self.overlay.on_touch(event, now);
        if outcome.warn {
            self.host.show_warning(&self.warning_message);
        }
        outcome
    }

    pub fn is_terminated(&self) -> bool {
        self.lifecycle == Lifecycle::Terminated
    }

    pub fn overlay(&self) -> &OverlayGuard {
        &self.overlay
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    fn create_outcome(&self) -> CreateOutcome {
        match self.lifecycle {
            Lifecycle::Terminated => CreateOutcome::Terminated,
            _ => CreateOutcome::Ready,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    Finish,
    SecureWindow,
    FilterTouchesWhenObscured(bool),
    Warning(String),
}

impl fmt::Display for HostRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostRequest::Finish => write!(f, "finish"),
            HostRequest::SecureWindow => write!(f, "set-secure-window"),
            HostRequest::FilterTouchesWhenObscured(on) => {
                write!(f, "filter-touches-when-obscured={}", on)
            }
            HostRequest::Warning(msg) => write!(f, "warning \"{}\"", msg),
        }
    }
}

/// Host that records every request instead of acting on it.
#[derive(Debug, Default)]
pub struct RecordingHost {
    requests: Vec<HostRequest>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> &[HostRequest] {
        &self.requests
    }

    /// Hand back requests recorded since the last drain.
    pub fn drain(&mut self) -> Vec<HostRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn warning_count(&self) -> usize {
        self.requests
            .iter()
            .filter(|r| matches!(r, HostRequest::Warning(_)))
            .count()
    }
}

impl ActivityHost for RecordingHost {
    fn finish(&mut self) {
        self.requests.push(HostRequest::Finish);
    }

    fn set_secure_window(&mut self) {
        self.requests.push(HostRequest::SecureWindow);
    }

    fn set_filter_touches_when_obscured(&mut self, enabled: bool) {
        self.requests.push(HostRequest::FilterTouchesWhenObscured(enabled));
    }

    fn show_warning(&mut self, message: &str) {
        self.requests.push(HostRequest::Warning(message.to_string()));
    }
}

impl<H: ActivityHost + ?Sized> ActivityHost for &mut H {
    fn finish(&mut self) {
        (**self).finish();
    }

    fn set_secure_window(&mut self) {
        (**self).set_secure_window();
    }

    fn set_filter_touches_when_obscured(&mut self, enabled: bool) {
        (**self).set_filter_touches_when_obscured(enabled);
    }

    fn show_warning(&mut self, message: &str) {
        (**self).show_warning(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::event::TouchEvent;
    use crate::launch::LaunchIntent;

    struct Launch {
        task_root: bool,
        intent: Option<LaunchIntent>,
    }

    impl LaunchClassifier for Launch {
        fn is_task_root(&self) -> bool {
            self.task_root
        }

        fn launch_intent(&self) -> Option<&LaunchIntent> {
            self.intent.as_ref()
        }
    }

    fn root_launch() -> Launch {
        Launch {
            task_root: true,
            intent: Some(LaunchIntent::main_launcher()),
        }
    }

    fn activity() -> GuardedActivity<RecordingHost, ManualClock> {
        GuardedActivity::with_clock(RecordingHost::new(), ManualClock::new(0), GuardSettings::default())
    }

    #[test]
    fn test_hijacked_launch_finishes_without_setup() {
        let mut act = activity();
        let hijack = Launch {
            task_root: false,
            intent: Some(LaunchIntent::main_launcher()),
        };
        assert_eq!(act.on_create(&hijack), CreateOutcome::Terminated);
        assert!(act.is_terminated());
        assert_eq!(act.host().requests(), &[HostRequest::Finish]);

        let out = act.dispatch_touch_detailed(&TouchEvent::clean());
        assert_eq!(out.decision, TouchDecision::Reject);
        assert_eq!(out.reason, Some(RejectReason::Terminated));
        assert_eq!(act.host().requests(), &[HostRequest::Finish]);
    }

    #[test]
    fn test_touch_before_create_is_rejected() {
        let mut act = activity();
        let out = act.dispatch_touch_detailed(&TouchEvent::clean());
        assert_eq!(out.decision, TouchDecision::Reject);
        assert_eq!(out.reason, Some(RejectReason::NotCreated));
        assert!(!out.warn);
        assert!(act.host().requests().is_empty());
        assert_eq!(act.overlay().state().block_until, 0);

        act.on_create(&root_launch());
        act.host_mut().drain();
        assert_eq!(act.dispatch_touch(&TouchEvent::clean()), TouchDecision::Deliver);
        assert!(act.host().requests().is_empty());
    }

    #[test]
    fn test_successful_create_requests_window_protection_once() {
        let mut act = activity();
        assert_eq!(act.on_create(&root_launch()), CreateOutcome::Ready);
        assert_eq!(act.on_create(&root_launch()), CreateOutcome::Ready);
        assert_eq!(
            act.host().requests(),
            &[HostRequest::SecureWindow, HostRequest::FilterTouchesWhenObscured(true)]
        );
    }

    #[test]
    fn test_touch_dispatch_shows_throttled_warning() {
        let mut act = activity();
        act.on_create(&root_launch());
        act.host_mut().drain();

        assert_eq!(act.dispatch_touch(&TouchEvent::clean()), TouchDecision::Deliver);
        assert_eq!(act.dispatch_touch(&TouchEvent::obscured()), TouchDecision::Reject);
        act.clock().set(500);
        assert_eq!(act.dispatch_touch(&TouchEvent::obscured()), TouchDecision::Reject);
        act.clock().set(1000);
        assert_eq!(act.dispatch_touch(&TouchEvent::clean()), TouchDecision::Reject);
        act.clock().set(2100);
        assert_eq!(act.dispatch_touch(&TouchEvent::clean()), TouchDecision::Deliver);
        assert_eq!(act.dispatch_touch(&TouchEvent::obscured()), TouchDecision::Reject);

        let warning = HostRequest::Warning(DEFAULT_WARNING_MESSAGE.into());
        assert_eq!(act.host().requests(), &[warning.clone(), warning]);
    }

    #[test]
    fn test_custom_warning_message() {
        let settings = GuardSettings {
            warning_message: "Overlay!".into(),
            ..GuardSettings::default()
        };
        let mut host = RecordingHost::new();
        {
            let mut act = GuardedActivity::with_clock(&mut host, ManualClock::new(0), settings);
            act.on_create(&root_launch());
            act.dispatch_touch(&TouchEvent::obscured());
        }
        assert_eq!(host.warning_count(), 1);
        assert_eq!(host.requests().last(), Some(&HostRequest::Warning("Overlay!".into())));
    }
}
