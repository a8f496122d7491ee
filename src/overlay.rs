//! Overlay (tapjacking) guard: reject touches delivered while another window
//! covers ours, and keep rejecting for a short block window afterwards.
//!
//! Rejection happens on every suspicious touch. The user-visible warning is
//! rate limited separately so a sustained overlay attack does not flood toasts.

use std::sync::{Arc, Mutex};

use crate::clock::Timestamp;
use crate::event::{ApiLevel, TouchClassifier};

pub const DEFAULT_BLOCK_DURATION_MS: u64 = 1500;
pub const DEFAULT_WARNING_THROTTLE_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// How long all touches stay rejected after an obstruction.
    pub block_duration_ms: u64,
    /// Minimum gap between two warnings.
    pub warning_throttle_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            block_duration_ms: DEFAULT_BLOCK_DURATION_MS,
            warning_throttle_ms: DEFAULT_WARNING_THROTTLE_MS,
        }
    }
}

/// Per-activity counters. Never shared between instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardState {
    /// When the last warning was shown. None until the first one.
    pub last_warning_at: Option<Timestamp>,
    /// Every touch before this instant is rejected.
    pub block_until: Timestamp,
}

impl GuardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blocked(&self, now: Timestamp) -> bool {
        now < self.block_until
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchDecision {
    Deliver,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Still inside the block window of an earlier obstruction.
    ActiveBlock,
    /// This touch itself was obscured.
    Obscured,
    /// Shared guard lock was poisoned.
    Unavailable,
    /// The activity has not finished creation yet.
    NotCreated,
    /// The activity finished itself on create.
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchOutcome {
    pub decision: TouchDecision,
    pub reason: Option<RejectReason>,
    /// The host should show the overlay warning.
    pub warn: bool,
}

impl TouchOutcome {
    fn deliver() -> Self {
        Self {
            decision: TouchDecision::Deliver,
            reason: None,
            warn: false,
        }
    }

    pub(crate) fn reject(reason: RejectReason, warn: bool) -> Self {
        Self {
            decision: TouchDecision::Reject,
            reason: Some(reason),
            warn,
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.decision == TouchDecision::Reject
    }
}

/// `fully || (api supports partial && partially)`.
pub fn is_obscured(event: &impl TouchClassifier, api: ApiLevel) -> bool {
    event.is_fully_obscured() || (api.supports_partial_obstruction() && event.is_partially_obscured())
}

/// Classify one touch and update `state`. Total over its inputs.
pub fn on_touch(
    event: &impl TouchClassifier,
    now: Timestamp,
    state: &mut GuardState,
    config: &ThrottleConfig,
    api: ApiLevel,
) -> TouchOutcome {
    if state.is_blocked(now) {
        let warn = take_warning(state, now, config);
        return TouchOutcome::reject(RejectReason::ActiveBlock, warn);
    }

    if is_obscured(event, api) {
        // max() keeps block_until non-decreasing even if the clock stepped back.
        state.block_until = state
            .block_until
            .max(now.saturating_add(config.block_duration_ms));
        let warn = take_warning(state, now, config);
        log::info!(
            "Obscured touch at {}ms, blocking input until {}ms",
            now,
            state.block_until
        );
        return TouchOutcome::reject(RejectReason::Obscured, warn);
    }

    TouchOutcome::deliver()
}

fn take_warning(state: &mut GuardState, now: Timestamp, config: &ThrottleConfig) -> bool {
    let due = match state.last_warning_at {
        None => true,
        Some(last) => now.saturating_sub(last) >= config.warning_throttle_ms && now >= last,
    };
    if due {
        state.last_warning_at = Some(now);
    }
    due
}

/// Overlay guard bound to one activity's config and platform level.
#[derive(Debug, Clone)]
pub struct OverlayGuard {
    state: GuardState,
    config: ThrottleConfig,
    api: ApiLevel,
    rejected: u64,
}

impl OverlayGuard {
    pub fn new(config: ThrottleConfig, api: ApiLevel) -> Self {
        Self {
            state: GuardState::new(),
            config,
            api,
            rejected: 0,
        }
    }

    pub fn on_touch(&mut self, event: &impl TouchClassifier, now: Timestamp) -> TouchOutcome {
        let outcome = on_touch(event, now, &mut self.state, &self.config, self.api);
        if outcome.is_rejected() {
            self.rejected += 1;
            if self.rejected.is_multiple_of(100) {
                log::debug!("Touches rejected so far: {}", self.rejected);
            }
        }
        outcome
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    pub fn api_level(&self) -> ApiLevel {
        self.api
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }
}

/// For hosts that may deliver touches from more than one thread.
pub type SharedOverlayGuard = Arc<Mutex<OverlayGuard>>;

pub fn shared(guard: OverlayGuard) -> SharedOverlayGuard {
    Arc::new(Mutex::new(guard))
}

/// Serialized `on_touch`. A poisoned lock rejects without a warning.
pub fn on_touch_shared(
    guard: &SharedOverlayGuard,
    event: &impl TouchClassifier,
    now: Timestamp,
) -> TouchOutcome {
    let Ok(mut guard) = guard.lock() else {
        log::error!("Overlay guard lock poisoned, rejecting touch");
        return TouchOutcome::reject(RejectReason::Unavailable, false);
    };
    guard.on_touch(event, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TouchEvent;

    const MODERN: ApiLevel = ApiLevel(34);
    const LEGACY: ApiLevel = ApiLevel(28);

    fn guard() -> OverlayGuard {
        OverlayGuard::new(ThrottleConfig::default(), MODERN)
    }

    #[test]
    fn test_block_window_scenario() {
        let mut g = guard();
        assert_eq!(g.on_touch(&TouchEvent::clean(), 0).decision, TouchDecision::Deliver);

        let out = g.on_touch(&TouchEvent::obscured(), 0);
        assert_eq!(out.decision, TouchDecision::Reject);
        assert_eq!(out.reason, Some(RejectReason::Obscured));
        assert_eq!(g.state().block_until, 1500);

        let out = g.on_touch(&TouchEvent::clean(), 1000);
        assert_eq!(out.decision, TouchDecision::Reject);
        assert_eq!(out.reason, Some(RejectReason::ActiveBlock));

        assert_eq!(g.on_touch(&TouchEvent::clean(), 1600).decision, TouchDecision::Deliver);
        assert_eq!(g.rejected_count(), 2);
    }

    #[test]
    fn test_warning_throttle_scenario() {
        let mut g = guard();

        let out = g.on_touch(&TouchEvent::obscured(), 0);
        assert!(out.warn);
        assert_eq!(g.state().last_warning_at, Some(0));

        let out = g.on_touch(&TouchEvent::obscured(), 500);
        assert!(out.is_rejected());
        assert!(!out.warn);
        assert_eq!(g.state().last_warning_at, Some(0));

        let out = g.on_touch(&TouchEvent::obscured(), 2100);
        assert!(out.is_rejected());
        assert!(out.warn);
        assert_eq!(g.state().last_warning_at, Some(2100));
    }

    #[test]
    fn test_active_block_ignores_flags() {
        let mut state = GuardState {
            last_warning_at: None,
            block_until: 5000,
        };
        let config = ThrottleConfig::default();
        for now in [0, 1, 2500, 4999] {
            for ev in [TouchEvent::clean(), TouchEvent::obscured(), TouchEvent::partially_obscured()] {
                let out = on_touch(&ev, now, &mut state, &config, MODERN);
                assert_eq!(out.reason, Some(RejectReason::ActiveBlock));
            }
        }
        assert_eq!(state.block_until, 5000);
    }

    #[test]
    fn test_full_obstruction_sets_block_on_any_level() {
        for api in [ApiLevel(21), LEGACY, MODERN] {
            let mut state = GuardState::new();
            let out = on_touch(&TouchEvent::obscured(), 700, &mut state, &ThrottleConfig::default(), api);
            assert!(out.is_rejected());
            assert_eq!(state.block_until, 700 + DEFAULT_BLOCK_DURATION_MS);
        }
    }

    #[test]
    fn test_partial_obstruction_ignored_on_legacy_level() {
        let mut state = GuardState::new();
        let config = ThrottleConfig::default();
        let out = on_touch(&TouchEvent::partially_obscured(), 10, &mut state, &config, LEGACY);
        assert_eq!(out.decision, TouchDecision::Deliver);
        assert_eq!(state, GuardState::new());

        let out = on_touch(&TouchEvent::partially_obscured(), 10, &mut state, &config, MODERN);
        assert_eq!(out.reason, Some(RejectReason::Obscured));
    }

    #[test]
    fn test_at_most_one_warning_per_throttle_window() {
        let config = ThrottleConfig {
            block_duration_ms: 300,
            warning_throttle_ms: 1000,
        };
        let mut g = OverlayGuard::new(config, MODERN);
        let mut warned_at = Vec::new();
        for now in (0..10_000).step_by(70) {
            let ev = if now % 3 == 0 { TouchEvent::obscured() } else { TouchEvent::clean() };
            if g.on_touch(&ev, now).warn {
                warned_at.push(now);
            }
        }
        assert!(!warned_at.is_empty());
        for pair in warned_at.windows(2) {
            assert!(pair[1] - pair[0] >= config.warning_throttle_ms);
        }
    }

    #[test]
    fn test_block_only_rejection_still_warns_after_throttle() {
        let config = ThrottleConfig {
            block_duration_ms: 5000,
            warning_throttle_ms: 2000,
        };
        let mut g = OverlayGuard::new(config, MODERN);
        assert!(g.on_touch(&TouchEvent::obscured(), 0).warn);
        assert!(!g.on_touch(&TouchEvent::clean(), 1999).warn);
        let out = g.on_touch(&TouchEvent::clean(), 2000);
        assert_eq!(out.reason, Some(RejectReason::ActiveBlock));
        assert!(out.warn);
    }

    #[test]
    fn test_clock_stepping_back_never_lowers_block() {
        let mut state = GuardState {
            last_warning_at: Some(9000),
            block_until: 1000,
        };
        let config = ThrottleConfig::default();
        let out = on_touch(&TouchEvent::obscured(), 0, &mut state, &config, MODERN);
        assert_eq!(out.reason, Some(RejectReason::ActiveBlock));
        assert!(!out.warn);
        assert_eq!(state.block_until, 1000);
    }

    #[test]
    fn test_block_saturates_at_max_timestamp() {
        let mut state = GuardState::new();
        on_touch(&TouchEvent::obscured(), u64::MAX - 10, &mut state, &ThrottleConfig::default(), MODERN);
        assert_eq!(state.block_until, u64::MAX);
    }

    #[test]
    fn test_shared_guard_poisoned_lock_rejects() {
        let shared_guard = shared(guard());
        assert_eq!(
            on_touch_shared(&shared_guard, &TouchEvent::clean(), 0).decision,
            TouchDecision::Deliver
        );

        let poisoner = Arc::clone(&shared_guard);
        let _ = std::thread::spawn(move || {
            let _lock = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        let out = on_touch_shared(&shared_guard, &TouchEvent::clean(), 10);
        assert_eq!(out.reason, Some(RejectReason::Unavailable));
        assert!(!out.warn);
    }
}
