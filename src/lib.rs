//! Input-integrity guard for a mobile host activity.
//!
//! Two guards: the overlay guard rejects touches delivered while another
//! window obscures ours (tapjacking), and the relaunch guard finishes an
//! instance that receives a launcher intent without owning its task
//! (task hijacking). [`activity::GuardedActivity`] wires both into a
//! lifecycle behind the [`activity::ActivityHost`] trait.

pub mod activity;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod launch;
pub mod overlay;
pub mod replay;

pub use activity::{ActivityHost, CreateOutcome, GuardSettings, GuardedActivity};
pub use event::{ApiLevel, TouchClassifier, TouchEvent};
pub use launch::{should_terminate, LaunchClassifier, LaunchIntent};
pub use overlay::{on_touch, GuardState, OverlayGuard, ThrottleConfig, TouchDecision, TouchOutcome};
