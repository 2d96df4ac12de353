// SPDX-License-Identifier: MIT OR Apache-2.0
//! Staggered enter/exit flow coordination for `OrdoPlay` UI animators.
//!
//! This crate provides:
//! - Duration inheritance between parent and child animators
//! - Stagger scheduling of children activations
//! - Class/instance settings resolution
//! - A per-node flow state machine (exited, entering, entered, exiting)
//! - An animator tree host driven by a simulated clock
//! - Sound cue capability types
//!
//! ## Architecture
//!
//! ```text
//! AnimatorTree
//!   ├── ManualClock (timers as data)
//!   └── AnimatorNode (per tree position)
//!         ├── merge_settings (class + instance)
//!         ├── DurationConfig::resolve (own + inherited)
//!         └── FlowStateMachine
//! ```
//!
//! Rendering is left to the host, which reads each node's
//! [`AnimatorOutput`] after every change.

pub mod bleep;
pub mod clock;
pub mod duration;
pub mod error;
pub mod flow;
pub mod node;
pub mod settings;
pub mod stagger;
pub mod tree;

pub use bleep::{Bleep, BleepPlayerSettings, BleepSettings, Bleeps, BleepsAudioGroupSettings, BleepsAudioSettings};
pub use clock::{ManualClock, ScheduledTimer, Scheduler, TimerHandle};
pub use duration::{DurationConfig, PartialDuration};
pub use error::{AnimatorError, Result};
pub use flow::{FlowStateMachine, FlowValue};
pub use node::{AnimatorClass, AnimatorContext, AnimatorNode, AnimatorOutput, NodeId};
pub use settings::{merge_settings, NodeSettings, ResolvedSettings};
pub use stagger::{schedule, ActivationEntry, ActivationSchedule, ChildNode, StaggerChild};
pub use tree::AnimatorTree;
