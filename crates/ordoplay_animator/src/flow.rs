// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-node enter/exit flow state machine.
//!
//! ```text
//!            activate                 enter timer
//!   Exited ───────────▶ Entering ─────────────────▶ Entered
//!     ▲                  │   ▲                          │
//!     │ exit timer       │   │ activate                 │ deactivate
//!     │                  ▼   │                          ▼
//!     └──────────────── Exiting ◀───────────────────────┘
//! ```
//!
//! The machine owns at most one pending timer at any time. Every new signal
//! cancels it before anything else is scheduled.

use crate::clock::{Scheduler, TimerHandle};
use crate::duration::DurationConfig;
use crate::error::{AnimatorError, Result};
use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Lifecycle value of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlowValue {
    /// Not visible
    #[default]
    Exited,
    /// Enter transition running
    Entering,
    /// Fully visible
    Entered,
    /// Exit transition running
    Exiting,
}

impl FlowValue {
    /// Entering or entered
    pub fn is_active(&self) -> bool {
        matches!(self, FlowValue::Entering | FlowValue::Entered)
    }

    /// Entering or exiting
    pub fn is_transitioning(&self) -> bool {
        matches!(self, FlowValue::Entering | FlowValue::Exiting)
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            FlowValue::Exited => "exited",
            FlowValue::Entering => "entering",
            FlowValue::Entered => "entered",
            FlowValue::Exiting => "exiting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    /// Waiting for the node's stagger slot
    Activation,
    /// Waiting for the running transition to finish
    Settle,
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    handle: TimerHandle,
    kind: TimerKind,
}

/// Flow state machine of one node
#[derive(Debug, Clone)]
pub struct FlowStateMachine {
    owner: NodeId,
    value: FlowValue,
    animate: bool,
    pending: Option<PendingTimer>,
}

impl FlowStateMachine {
    /// Create a machine for `owner`.
    ///
    /// Non-animated machines start `Entered` and never schedule timers.
    pub fn new(owner: NodeId, animate: bool) -> Self {
        Self {
            owner,
            value: Self::initial_value(animate),
            animate,
            pending: None,
        }
    }

    fn initial_value(animate: bool) -> FlowValue {
        if animate {
            FlowValue::Exited
        } else {
            FlowValue::Entered
        }
    }

    /// Current value
    #[inline]
    pub fn value(&self) -> FlowValue {
        self.value
    }

    /// Whether transitions are timed
    #[inline]
    pub fn animate(&self) -> bool {
        self.animate
    }

    /// Handle of the pending timer, if any
    pub fn pending_handle(&self) -> Option<TimerHandle> {
        self.pending.map(|p| p.handle)
    }

    /// Whether the machine waits for its stagger slot
    pub fn is_waiting_activation(&self) -> bool {
        matches!(self.pending, Some(PendingTimer { kind: TimerKind::Activation, .. }))
    }

    /// Switch timing on or off.
    ///
    /// Turning it off cancels the pending timer and pins `Entered`.
    pub fn set_animate(&mut self, animate: bool, scheduler: &mut dyn Scheduler) {
        if self.animate == animate {
            return;
        }
        self.animate = animate;
        if !animate {
            self.cancel_pending(scheduler);
            self.set_value(FlowValue::Entered);
        }
    }

    /// Go back to the initial value for `animate`, cancelling any timer
    pub fn reset(&mut self, animate: bool, scheduler: &mut dyn Scheduler) {
        self.cancel_pending(scheduler);
        self.animate = animate;
        self.value = Self::initial_value(animate);
    }

    /// Activation signal.
    ///
    /// With a positive `wait` from `Exited`, an activation timer is scheduled
    /// first and the machine stays `Exited` until it fires.
    pub fn activate(
        &mut self,
        wait: f64,
        duration: &DurationConfig,
        scheduler: &mut dyn Scheduler,
    ) -> FlowValue {
        if !self.animate {
            self.set_value(FlowValue::Entered);
            return self.value;
        }

        match self.value {
            FlowValue::Exited if self.is_waiting_activation() => {}
            FlowValue::Exited if wait > 0.0 => {
                self.schedule(TimerKind::Activation, wait, scheduler);
            }
            FlowValue::Exited | FlowValue::Exiting => self.begin_enter(duration, scheduler),
            FlowValue::Entering | FlowValue::Entered => {}
        }

        self.value
    }

    /// Deactivation signal
    pub fn deactivate(&mut self, duration: &DurationConfig, scheduler: &mut dyn Scheduler) -> FlowValue {
        if !self.animate {
            return self.value;
        }

        match self.value {
            FlowValue::Entering | FlowValue::Entered => {
                self.cancel_pending(scheduler);
                self.set_value(FlowValue::Exiting);
                let exit = Self::checked(duration).exit;
                self.schedule(TimerKind::Settle, exit, scheduler);
            }
            FlowValue::Exited => self.cancel_pending(scheduler),
            FlowValue::Exiting => {}
        }

        self.value
    }

    /// Deliver a fired timer
    pub fn on_timer(
        &mut self,
        handle: TimerHandle,
        duration: &DurationConfig,
        scheduler: &mut dyn Scheduler,
    ) -> Result<FlowValue> {
        let pending = match self.pending {
            Some(pending) if pending.handle == handle => pending,
            _ => return Err(self.inconsistency(handle)),
        };
        self.pending = None;

        match (pending.kind, self.value) {
            (TimerKind::Activation, FlowValue::Exited) => self.begin_enter(duration, scheduler),
            (TimerKind::Settle, FlowValue::Entering) => self.set_value(FlowValue::Entered),
            (TimerKind::Settle, FlowValue::Exiting) => self.set_value(FlowValue::Exited),
            _ => return Err(self.inconsistency(handle)),
        }

        Ok(self.value)
    }

    /// Cancel every timer and go back to the initial value
    pub fn teardown(&mut self, scheduler: &mut dyn Scheduler) {
        self.cancel_pending(scheduler);
        self.value = Self::initial_value(self.animate);
    }

    fn begin_enter(&mut self, duration: &DurationConfig, scheduler: &mut dyn Scheduler) {
        self.cancel_pending(scheduler);
        self.set_value(FlowValue::Entering);
        let duration = Self::checked(duration);
        self.schedule(TimerKind::Settle, duration.delay + duration.enter, scheduler);
    }

    fn checked(duration: &DurationConfig) -> DurationConfig {
        if duration.has_negative_lengths() {
            tracing::warn!(?duration, "Negative duration clamped to zero");
        }
        duration.clamped()
    }

    fn schedule(&mut self, kind: TimerKind, delay_ms: f64, scheduler: &mut dyn Scheduler) {
        debug_assert!(self.pending.is_none(), "flow machine already has a pending timer");
        let handle = scheduler.schedule_after(delay_ms, self.owner);
        tracing::trace!(node = ?self.owner, ?handle, ?kind, delay_ms, "Scheduled flow timer");
        self.pending = Some(PendingTimer { handle, kind });
    }

    fn cancel_pending(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(pending) = self.pending.take() {
            tracing::trace!(node = ?self.owner, handle = ?pending.handle, "Cancelled flow timer");
            scheduler.cancel(pending.handle);
        }
    }

    fn set_value(&mut self, value: FlowValue) {
        if self.value != value {
            tracing::debug!(node = ?self.owner, from = self.value.name(), to = value.name(), "Flow transition");
            self.value = value;
        }
    }

    fn inconsistency(&self, handle: TimerHandle) -> AnimatorError {
        tracing::error!(node = ?self.owner, ?handle, value = self.value.name(), "Unexpected flow timer");
        AnimatorError::SchedulingInconsistency {
            node: self.owner,
            handle,
        }
    }
}
