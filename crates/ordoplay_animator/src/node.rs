// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animator node composition.
//!
//! An [`AnimatorNode`] binds one [`FlowStateMachine`] to a position in the
//! tree. On every settings or context change it merges its class and
//! instance settings, resolves its duration against the inherited one and
//! either follows the inherited flow or, as a root, runs on its own.

use crate::clock::{Scheduler, TimerHandle};
use crate::duration::DurationConfig;
use crate::error::{AnimatorError, Result};
use crate::flow::{FlowStateMachine, FlowValue};
use crate::settings::{merge_settings, NodeSettings, ResolvedSettings};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an animator node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Context a parent hands to each of its children
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimatorContext {
    /// Parent's resolved duration
    pub duration: DurationConfig,
    /// Parent's current flow
    pub flow: FlowValue,
    /// Whether the parent starts its own subtree
    pub is_root: bool,
    /// Child's stagger slot relative to the parent's enter instant
    pub activation_delay: f64,
}

impl AnimatorContext {
    /// Context without any stagger slot
    pub fn new(duration: DurationConfig, flow: FlowValue, is_root: bool) -> Self {
        Self {
            duration,
            flow,
            is_root,
            activation_delay: 0.0,
        }
    }

    /// Set the stagger slot of the receiving child
    pub fn with_activation_delay(mut self, delay: f64) -> Self {
        self.activation_delay = delay;
        self
    }
}

/// What a node exposes to its host after each change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatorOutput {
    /// Current flow
    pub flow: FlowValue,
    /// Resolved duration
    pub duration: DurationConfig,
    /// Runs an independent lifecycle
    pub root: bool,
    /// Transparent to stagger scheduling
    pub merge: bool,
    /// Context for the node's children
    pub context_for_children: AnimatorContext,
}

/// A node type: class settings shared by every node created from it
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatorClass {
    /// Type name, used in logs and scene files
    pub name: String,
    settings: NodeSettings,
}

impl AnimatorClass {
    /// Create a new node type
    pub fn new(name: impl Into<String>, settings: NodeSettings) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }

    /// Create a node type, rejecting invalid settings
    pub fn try_new(name: impl Into<String>, settings: NodeSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(name, settings))
    }

    /// Class settings
    pub fn settings(&self) -> &NodeSettings {
        &self.settings
    }

    /// Create an unmounted node of this type
    pub fn create_node(&self) -> AnimatorNode {
        self.create_node_with_id(NodeId::new())
    }

    /// Create an unmounted node with a known ID
    pub fn create_node_with_id(&self, id: NodeId) -> AnimatorNode {
        AnimatorNode::new(id, self.name.clone(), self.settings)
    }
}

impl Default for AnimatorClass {
    fn default() -> Self {
        Self::new("Animator", NodeSettings::default())
    }
}

/// One node of an animator tree
#[derive(Debug, Clone)]
pub struct AnimatorNode {
    id: NodeId,
    class_name: String,
    class_settings: NodeSettings,
    instance_settings: NodeSettings,
    inherited: Option<AnimatorContext>,
    /// Duration used when nothing is inherited
    defaults: DurationConfig,
    settings: ResolvedSettings,
    duration: DurationConfig,
    flow: FlowStateMachine,
    mounted: bool,
}

impl AnimatorNode {
    fn new(id: NodeId, class_name: String, class_settings: NodeSettings) -> Self {
        let settings = merge_settings(Some(&class_settings), None);
        let defaults = DurationConfig::default();
        Self {
            id,
            class_name,
            class_settings,
            instance_settings: NodeSettings::default(),
            inherited: None,
            defaults,
            settings,
            duration: DurationConfig::resolve(&settings.duration, &defaults),
            flow: FlowStateMachine::new(id, settings.animate),
            mounted: false,
        }
    }

    /// Set the duration used when the node has no parent
    pub fn set_defaults(&mut self, defaults: DurationConfig) {
        self.defaults = defaults;
        self.resolve();
    }

    /// Node ID
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Name of the node type
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Last instance settings received
    pub fn instance_settings(&self) -> &NodeSettings {
        &self.instance_settings
    }

    /// Merged settings
    pub fn settings(&self) -> &ResolvedSettings {
        &self.settings
    }

    /// Resolved duration
    #[inline]
    pub fn duration(&self) -> DurationConfig {
        self.duration
    }

    /// Current flow
    #[inline]
    pub fn flow(&self) -> FlowValue {
        self.flow.value()
    }

    /// Pending timer of the node's flow machine
    pub fn pending_timer(&self) -> Option<TimerHandle> {
        self.flow.pending_handle()
    }

    /// Whether the node runs its own lifecycle
    pub fn is_root(&self) -> bool {
        self.settings.root || self.inherited.is_none()
    }

    /// Whether the node joins its parent's stagger pass
    pub fn is_merge(&self) -> bool {
        self.settings.merge
    }

    /// Whether the host has mounted the node
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Context handed to children
    pub fn context_for_children(&self) -> AnimatorContext {
        AnimatorContext::new(self.duration, self.flow.value(), self.is_root())
    }

    /// Snapshot for the host
    pub fn output(&self) -> AnimatorOutput {
        AnimatorOutput {
            flow: self.flow.value(),
            duration: self.duration,
            root: self.settings.root,
            merge: self.settings.merge,
            context_for_children: self.context_for_children(),
        }
    }

    /// Host mounted the node.
    ///
    /// Roots activate themselves, other nodes pick up the inherited flow.
    pub fn on_mount(&mut self, scheduler: &mut dyn Scheduler) -> AnimatorOutput {
        self.mounted = true;
        tracing::debug!(node = ?self.id, class = %self.class_name, root = self.is_root(), "Mounted animator");

        if self.is_root() {
            self.flow.activate(0.0, &self.duration, scheduler);
        } else {
            self.follow_inherited(scheduler);
        }
        self.output()
    }

    /// Host unmounted the node; every pending timer is cancelled
    pub fn on_unmount(&mut self, scheduler: &mut dyn Scheduler) {
        self.flow.teardown(scheduler);
        self.mounted = false;
        tracing::debug!(node = ?self.id, class = %self.class_name, "Unmounted animator");
    }

    /// New instance settings or inherited context
    pub fn on_settings_change(
        &mut self,
        instance: NodeSettings,
        inherited: Option<AnimatorContext>,
        scheduler: &mut dyn Scheduler,
    ) -> Result<AnimatorOutput> {
        self.class_settings.validate()?;
        instance.validate()?;

        self.instance_settings = instance;
        self.inherited = inherited;
        self.resolve();
        if self.mounted {
            self.flow.set_animate(self.settings.animate, scheduler);
        } else {
            // Before mount the starting value comes from the effective settings
            self.flow.reset(self.settings.animate, scheduler);
        }

        if self.mounted && !self.is_root() {
            self.follow_inherited(scheduler);
        }
        Ok(self.output())
    }

    /// A timer scheduled by this node fired
    pub fn on_timer(&mut self, handle: TimerHandle, scheduler: &mut dyn Scheduler) -> Result<AnimatorOutput> {
        if !self.mounted {
            tracing::error!(node = ?self.id, ?handle, "Timer fired for an unmounted animator");
            return Err(AnimatorError::SchedulingInconsistency { node: self.id, handle });
        }
        self.flow.on_timer(handle, &self.duration, scheduler)?;
        Ok(self.output())
    }

    /// Explicit activation, e.g. a user showing a root subtree
    pub fn activate(&mut self, scheduler: &mut dyn Scheduler) -> AnimatorOutput {
        self.flow.activate(0.0, &self.duration, scheduler);
        self.output()
    }

    /// Explicit deactivation
    pub fn deactivate(&mut self, scheduler: &mut dyn Scheduler) -> AnimatorOutput {
        self.flow.deactivate(&self.duration, scheduler);
        self.output()
    }

    fn resolve(&mut self) {
        self.settings = merge_settings(Some(&self.class_settings), Some(&self.instance_settings));
        let base = self.inherited.map(|c| c.duration).unwrap_or(self.defaults);
        self.duration = DurationConfig::resolve(&self.settings.duration, &base);
    }

    fn follow_inherited(&mut self, scheduler: &mut dyn Scheduler) {
        let Some(context) = self.inherited else {
            return;
        };

        if context.flow.is_active() {
            self.flow.activate(context.activation_delay, &self.duration, scheduler);
        } else {
            self.flow.deactivate(&self.duration, scheduler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::duration::PartialDuration;

    fn parent_context(flow: FlowValue) -> AnimatorContext {
        AnimatorContext::new(DurationConfig::new(100.0, 100.0).with_stagger(25.0), flow, true)
    }

    #[test]
    fn test_standalone_node_enters_on_mount() {
        let mut clock = ManualClock::new();
        let mut node = AnimatorClass::default().create_node();
        assert_eq!(node.flow(), FlowValue::Exited);

        node.on_settings_change(NodeSettings::new(), None, &mut clock).unwrap();
        let output = node.on_mount(&mut clock);
        // Runs alone without being flagged root
        assert!(node.is_root());
        assert!(!output.root);
        assert!(output.context_for_children.is_root);
        assert_eq!(output.flow, FlowValue::Entering);
    }

    #[test]
    fn test_instance_animate_true_overrides_class() {
        let mut clock = ManualClock::new();
        let class = AnimatorClass::new("Text", NodeSettings::new().with_animate(false));
        let mut node = class.create_node();
        node.set_defaults(DurationConfig::new(100.0, 100.0));
        assert_eq!(node.flow(), FlowValue::Entered);

        node.on_settings_change(NodeSettings::new().with_animate(true), None, &mut clock).unwrap();
        assert!(node.settings().animate);
        assert_eq!(node.flow(), FlowValue::Exited);

        let output = node.on_mount(&mut clock);
        assert_eq!(output.flow, FlowValue::Entering);
        assert_eq!(clock.pending_count(), 1);

        let timer = clock.advance(100.0)[0];
        node.on_timer(timer.handle, &mut clock).unwrap();
        assert_eq!(node.flow(), FlowValue::Entered);
    }

    #[test]
    fn test_not_animated_node_is_entered() {
        for (class, instance) in [
            (NodeSettings::new().with_animate(false), NodeSettings::new()),
            (NodeSettings::new(), NodeSettings::new().with_animate(false)),
        ] {
            let mut clock = ManualClock::new();
            let mut node = AnimatorClass::new("Text", class).create_node();
            node.on_settings_change(instance, None, &mut clock).unwrap();
            node.on_mount(&mut clock);

            assert!(!node.settings().animate);
            assert_eq!(node.flow(), FlowValue::Entered);
            assert_eq!(clock.pending_count(), 0);
        }
    }

    #[test]
    fn test_duration_from_class_and_instance() {
        let mut clock = ManualClock::new();
        let class = AnimatorClass::new("Frame", NodeSettings::new().with_duration(PartialDuration::enter(300.0).with_exit(300.0)));
        let mut node = class.create_node();

        let instance = NodeSettings::new().with_duration(PartialDuration::enter(600.0).with_exit(600.0));
        let output = node
            .on_settings_change(instance, Some(parent_context(FlowValue::Exited)), &mut clock)
            .unwrap();

        assert_eq!(output.duration.enter, 600.0);
        assert_eq!(output.duration.exit, 600.0);
        // Inherited from the parent context
        assert_eq!(output.duration.stagger, 25.0);
        assert_eq!(output.context_for_children.duration, output.duration);
    }

    #[test]
    fn test_child_follows_inherited_flow() {
        let mut clock = ManualClock::new();
        let mut node = AnimatorClass::default().create_node();

        node.on_settings_change(NodeSettings::new(), Some(parent_context(FlowValue::Exited)), &mut clock).unwrap();
        node.on_mount(&mut clock);
        assert!(!node.is_root());
        assert_eq!(node.flow(), FlowValue::Exited);

        let entering = parent_context(FlowValue::Entering).with_activation_delay(25.0);
        node.on_settings_change(NodeSettings::new(), Some(entering), &mut clock).unwrap();
        assert_eq!(node.flow(), FlowValue::Exited);

        let timer = clock.advance(25.0)[0];
        node.on_timer(timer.handle, &mut clock).unwrap();
        assert_eq!(node.flow(), FlowValue::Entering);
    }

    #[test]
    fn test_root_ignores_inherited_flow() {
        let mut clock = ManualClock::new();
        let mut node = AnimatorClass::new("Panel", NodeSettings::new().with_root(true)).create_node();

        node.on_settings_change(NodeSettings::new(), Some(parent_context(FlowValue::Exited)), &mut clock).unwrap();
        node.on_mount(&mut clock);
        assert!(node.is_root());
        assert_eq!(node.flow(), FlowValue::Entering);

        node.on_settings_change(NodeSettings::new(), Some(parent_context(FlowValue::Exiting)), &mut clock).unwrap();
        assert_eq!(node.flow(), FlowValue::Entering);

        node.deactivate(&mut clock);
        assert_eq!(node.flow(), FlowValue::Exiting);
    }

    #[test]
    fn test_instance_root_false_overrides_class() {
        let mut clock = ManualClock::new();
        let mut node = AnimatorClass::new("Panel", NodeSettings::new().with_root(true).with_merge(true)).create_node();

        let output = node
            .on_settings_change(
                NodeSettings::new().with_root(false).with_merge(false),
                Some(parent_context(FlowValue::Exited)),
                &mut clock,
            )
            .unwrap();
        assert!(!output.root);
        assert!(!output.merge);
    }

    #[test]
    fn test_unmount_cancels_timers() {
        let mut clock = ManualClock::new();
        let mut node = AnimatorClass::default().create_node();
        node.set_defaults(DurationConfig::new(100.0, 100.0));
        node.on_mount(&mut clock);
        assert!(node.pending_timer().is_some());

        node.on_unmount(&mut clock);
        assert!(!node.is_mounted());
        assert_eq!(clock.pending_count(), 0);
        assert_eq!(node.flow(), FlowValue::Exited);
    }

    #[test]
    fn test_invalid_instance_settings_rejected() {
        let mut clock = ManualClock::new();
        let mut node = AnimatorClass::default().create_node();

        let bad = NodeSettings::new().with_duration(PartialDuration::enter(f64::INFINITY));
        let err = node.on_settings_change(bad, None, &mut clock).unwrap_err();
        assert!(matches!(err, AnimatorError::Configuration { ref field, .. } if field == "duration.enter"));

        assert!(AnimatorClass::try_new("Bad", bad).is_err());
    }
}
