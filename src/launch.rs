//! Relaunch (task hijack) guard.
//!
//! A launcher tap re-delivered to an instance that is not the root of its task
//! means the real task is elsewhere; that instance finishes before any setup.

use std::collections::BTreeSet;

use serde::Deserialize;

pub const ACTION_MAIN: &str = "android.intent.action.MAIN";
pub const CATEGORY_LAUNCHER: &str = "android.intent.category.LAUNCHER";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchIntent {
    pub action: Option<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

impl LaunchIntent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            categories: BTreeSet::new(),
        }
    }

    /// The intent a home-screen icon tap produces.
    pub fn main_launcher() -> Self {
        Self::new(ACTION_MAIN).with_category(CATEGORY_LAUNCHER)
    }

    /// Build an intent from loose parts. No action and no categories means no intent.
    pub fn from_parts<I, S>(action: Option<String>, categories: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories: BTreeSet<String> = categories.into_iter().map(Into::into).collect();
        if action.is_none() && categories.is_empty() {
            return None;
        }
        Some(Self { action, categories })
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into());
        self
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn is_main_launcher(&self) -> bool {
        self.action.as_deref() == Some(ACTION_MAIN) && self.has_category(CATEGORY_LAUNCHER)
    }
}

/// What the host knows about the instance being created.
pub trait LaunchClassifier {
    fn is_task_root(&self) -> bool;
    fn launch_intent(&self) -> Option<&LaunchIntent>;
}

pub fn should_terminate(is_task_root: bool, intent: Option<&LaunchIntent>) -> bool {
    if is_task_root {
        return false;
    }
    let Some(intent) = intent else {
        return false;
    };
    intent.is_main_launcher()
}

/// Run the relaunch check against a host classifier.
pub fn evaluate(launch: &impl LaunchClassifier) -> bool {
    let terminate = should_terminate(launch.is_task_root(), launch.launch_intent());
    if terminate {
        log::warn!("Launcher intent delivered to a non-root instance, finishing it");
    } else {
        log::debug!(
            "Relaunch check passed (task_root={}, intent={})",
            launch.is_task_root(),
            launch.launch_intent().is_some()
        );
    }
    terminate
}
