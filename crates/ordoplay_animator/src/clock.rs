// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timer scheduling capability and a simulated clock.
//!
//! Flow machines never sleep. They ask a [`Scheduler`] for a timer and the
//! host delivers the fired handle back to the owning node. [`ManualClock`]
//! is the deterministic host clock used by [`crate::tree::AnimatorTree`] and
//! by tests.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Handle identifying a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

/// Host-provided timer primitive
pub trait Scheduler {
    /// Schedule a timer for `owner` firing after `delay_ms`
    fn schedule_after(&mut self, delay_ms: f64, owner: NodeId) -> TimerHandle;

    /// Cancel a pending timer; unknown handles are ignored
    fn cancel(&mut self, handle: TimerHandle);
}

/// A timer waiting in a [`ManualClock`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTimer {
    /// Timer handle
    pub handle: TimerHandle,
    /// Absolute due time in milliseconds
    pub due: f64,
    /// Node that scheduled it
    pub owner: NodeId,
}

/// Simulated clock advanced explicitly by the host
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: f64,
    next_handle: u64,
    pending: Vec<ScheduledTimer>,
}

impl ManualClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in milliseconds
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Number of pending timers
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether `handle` is still pending
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|t| t.handle == handle)
    }

    /// Pending timers owned by `owner`
    pub fn pending_for(&self, owner: NodeId) -> impl Iterator<Item = &ScheduledTimer> {
        self.pending.iter().filter(move |t| t.owner == owner)
    }

    /// Pop the earliest timer due at or before `until`.
    ///
    /// The clock moves to the timer's due time. Timers due at the same time
    /// pop in scheduling order.
    pub fn pop_due(&mut self, until: f64) -> Option<ScheduledTimer> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.handle.cmp(&b.handle)))
            .map(|(index, _)| index)?;

        let timer = self.pending.remove(index);
        self.now = self.now.max(timer.due);
        Some(timer)
    }

    /// Move the clock forward to `time` without firing anything
    pub fn set_time(&mut self, time: f64) {
        self.now = self.now.max(time);
    }

    /// Advance by `delta_ms`, returning every timer that fell due in order
    pub fn advance(&mut self, delta_ms: f64) -> Vec<ScheduledTimer> {
        let until = self.now + delta_ms;
        let mut fired = Vec::new();
        while let Some(timer) = self.pop_due(until) {
            fired.push(timer);
        }
        self.set_time(until);
        fired
    }
}

impl Scheduler for ManualClock {
    fn schedule_after(&mut self, delay_ms: f64, owner: NodeId) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(ScheduledTimer {
            handle,
            due: self.now + delay_ms.max(0.0),
            owner,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.retain(|t| t.handle != handle);
    }
}
