//! Purpose-keyed timer registry.
//!
//! Every piece of delayed work in the controller owns exactly one slot,
//! addressed by [`TimerPurpose`].  The registry is tick-driven: the host
//! loop calls [`TimerRegistry::poll_next`] (or [`TimerRegistry::poll`]) with
//! the current monotonic time and executes whatever [`TimerAction`]s come
//! back.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  slot         │ armed by                 │ action         │
//! ├───────────────┼──────────────────────────┼────────────────┤
//! │ RunOut        │ onoff → delayed-off      │ FinalizeRunOut │
//! │ FastOff       │ onoff → fast-off         │ Resend(onoff)  │
//! │ RampStep      │ increase/decrease ramp   │ Resend(unit)   │
//! │ AutoStop      │ (reserved)               │ -              │
//! │ PowerReduce   │ (reserved)               │ -              │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Arming never replaces a live timer.  Callers cancel first; an attempt to
//! arm an occupied slot is rejected with [`TimerError::Occupied`].

use core::fmt;

use log::{debug, info};

use crate::hood::TimerAction;

/// Named purpose of a delayed callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimerPurpose {
    RunOut = 0,
    FastOff = 1,
    RampStep = 2,
    /// Declared but never armed by the controller.
    AutoStop = 3,
    /// Declared but never armed by the controller.
    PowerReduce = 4,
}

impl TimerPurpose {
    pub const COUNT: usize = 5;

    pub const ALL: [Self; Self::COUNT] = [
        Self::RunOut,
        Self::FastOff,
        Self::RampStep,
        Self::AutoStop,
        Self::PowerReduce,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::RunOut => "run-out",
            Self::FastOff => "fast-off",
            Self::RampStep => "ramp-step",
            Self::AutoStop => "auto-stop",
            Self::PowerReduce => "power-reduce",
        }
    }
}

impl fmt::Display for TimerPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors from [`TimerRegistry`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The purpose already holds a live timer.
    Occupied(TimerPurpose),
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Occupied(p) => write!(f, "timer '{}' already armed", p),
        }
    }
}

/// A due timer returned from [`TimerRegistry::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub purpose: TimerPurpose,
    pub deadline_ms: u64,
    pub action: TimerAction,
}

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    deadline_ms: u64,
    action: TimerAction,
}

/// One cancelable slot per [`TimerPurpose`].
#[derive(Debug, Default)]
pub struct TimerRegistry {
    slots: [Option<TimerEntry>; TimerPurpose::COUNT],
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to fire `delay_ms` after `now_ms`.
    pub fn arm(
        &mut self,
        purpose: TimerPurpose,
        now_ms: u64,
        delay_ms: u32,
        action: TimerAction,
    ) -> Result<(), TimerError> {
        let slot = &mut self.slots[purpose as usize];
        if slot.is_some() {
            return Err(TimerError::Occupied(purpose));
        }
        let deadline_ms = now_ms.saturating_add(u64::from(delay_ms));
        *slot = Some(TimerEntry {
            deadline_ms,
            action,
        });
        debug!("Timers: armed '{}' for +{}ms ({:?})", purpose, delay_ms, action);
        Ok(())
    }

    /// Cancel the timer for `purpose`.  Returns whether one was pending.
    pub fn cancel(&mut self, purpose: TimerPurpose) -> bool {
        let was_armed = self.slots[purpose as usize].take().is_some();
        if was_armed {
            debug!("Timers: cancelled '{}'", purpose);
        }
        was_armed
    }

    pub fn is_armed(&self, purpose: TimerPurpose) -> bool {
        self.slots[purpose as usize].is_some()
    }

    /// Deadline of the pending timer for `purpose`, if any.
    pub fn deadline(&self, purpose: TimerPurpose) -> Option<u64> {
        self.slots[purpose as usize].map(|e| e.deadline_ms)
    }

    /// Earliest pending deadline across all purposes.
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots.iter().flatten().map(|e| e.deadline_ms).min()
    }

    /// Remove and return every timer due at `now_ms`, earliest first.
    pub fn poll(&mut self, now_ms: u64) -> Vec<FiredTimer> {
        let mut fired: Vec<FiredTimer> = Vec::new();
        for purpose in TimerPurpose::ALL {
            let slot = &mut self.slots[purpose as usize];
            if let Some(entry) = slot {
                if entry.deadline_ms <= now_ms {
                    fired.push(FiredTimer {
                        purpose,
                        deadline_ms: entry.deadline_ms,
                        action: entry.action,
                    });
                    *slot = None;
                }
            }
        }
        fired.sort_by_key(|t| t.deadline_ms);
        for t in &fired {
            info!("Timers: '{}' fired", t.purpose);
        }
        fired
    }

    /// Remove and return the earliest timer due at `now_ms`.
    ///
    /// Lets a caller handle fired timers one at a time, so that work done
    /// for one can still cancel the next.
    pub fn poll_next(&mut self, now_ms: u64) -> Option<FiredTimer> {
        let purpose = TimerPurpose::ALL
            .into_iter()
            .filter_map(|p| self.slots[p as usize].map(|e| (p, e.deadline_ms)))
            .filter(|&(_, deadline)| deadline <= now_ms)
            .min_by_key(|&(_, deadline)| deadline)
            .map(|(p, _)| p)?;
        let entry = self.slots[purpose as usize].take()?;
        info!("Timers: '{}' fired", purpose);
        Some(FiredTimer {
            purpose,
            deadline_ms: entry.deadline_ms,
            action: entry.action,
        })
    }

    /// Number of live timers.
    pub fn armed_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.slots = [None; TimerPurpose::COUNT];
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
