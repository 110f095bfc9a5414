use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a [`super::ChartBinding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Not mounted yet.
    #[default]
    Unmounted,
    /// Mounted by the host, waiting for a resolved drawing surface.
    Deferred,
    /// Owns a live instance.
    Mounted,
    /// Inside a destroy call; never observable between callbacks.
    Destroying,
    /// Unmounted by the host. Terminal.
    TornDown,
}

impl LifecyclePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unmounted => "unmounted",
            Self::Deferred => "deferred",
            Self::Mounted => "mounted",
            Self::Destroying => "destroying",
            Self::TornDown => "torn_down",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an update pass rebuilds the instance instead of merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecreateReason {
    Redraw,
    MountKeyChanged,
    KindChanged,
}

impl RecreateReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Redraw => "redraw",
            Self::MountKeyChanged => "mount_key_changed",
            Self::KindChanged => "kind_changed",
        }
    }
}

impl fmt::Display for RecreateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
