//! Scheduler lifecycle status and its lock-free cell.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Lifecycle state of a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerStatus {
    /// Initial state; no loop task
    Stopped,
    /// Loop task alive and executing cycles
    Running,
    /// Loop task alive, cycles skipped until resumed
    Paused,
    /// Last cycle failed; cooling down before automatic resume
    Error,
}

impl SchedulerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerStatus::Stopped => "stopped",
            SchedulerStatus::Running => "running",
            SchedulerStatus::Paused => "paused",
            SchedulerStatus::Error => "error",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            SchedulerStatus::Stopped => 0,
            SchedulerStatus::Running => 1,
            SchedulerStatus::Paused => 2,
            SchedulerStatus::Error => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SchedulerStatus::Running,
            2 => SchedulerStatus::Paused,
            3 => SchedulerStatus::Error,
            _ => SchedulerStatus::Stopped,
        }
    }
}

impl fmt::Display for SchedulerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic holder for a [`SchedulerStatus`].
///
/// Every transition that depends on the current state goes through
/// `compare_exchange`, never a read followed by a write.
#[derive(Debug)]
pub struct AtomicStatus(AtomicU8);

impl AtomicStatus {
    pub fn new(status: SchedulerStatus) -> Self {
        Self(AtomicU8::new(status.to_u8()))
    }

    pub fn load(&self) -> SchedulerStatus {
        SchedulerStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, status: SchedulerStatus) {
        self.0.store(status.to_u8(), Ordering::Release);
    }

    /// Move from `current` to `new`; on failure returns the state actually observed
    pub fn compare_exchange(
        &self,
        current: SchedulerStatus,
        new: SchedulerStatus,
    ) -> Result<SchedulerStatus, SchedulerStatus> {
        self.0
            .compare_exchange(current.to_u8(), new.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .map(SchedulerStatus::from_u8)
            .map_err(SchedulerStatus::from_u8)
    }

    /// Move to `new` from any state accepted by `allowed`; returns the previous state
    pub fn transition_from(
        &self,
        new: SchedulerStatus,
        allowed: impl Fn(SchedulerStatus) -> bool,
    ) -> Result<SchedulerStatus, SchedulerStatus> {
        let mut current = self.load();
        loop {
            if !allowed(current) {
                return Err(current);
            }
            match self.compare_exchange(current, new) {
                Ok(previous) => return Ok(previous),
                Err(observed) => current = observed,
            }
        }
    }
}

impl Default for AtomicStatus {
    fn default() -> Self {
        Self::new(SchedulerStatus::Stopped)
    }
}
