// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animator tree: a reference host for animator nodes.
//!
//! The tree owns the nodes, hands every child a fresh [`AnimatorContext`]
//! and delivers timers from its [`ManualClock`]. Flow changes always travel
//! top-down, so a child never reacts before its parent's new flow is set.
//!
//! ## Stagger groups
//!
//! A node that is not `merge` is a group boundary. Its group is the list of
//! its non-root children in order; a `merge` child is listed and its own
//! children are spliced in right after it. A merge node never runs a pass
//! of its own.

use crate::clock::{ManualClock, ScheduledTimer};
use crate::duration::DurationConfig;
use crate::error::{AnimatorError, Result};
use crate::flow::FlowValue;
use crate::node::{AnimatorClass, AnimatorContext, AnimatorNode, AnimatorOutput, NodeId};
use crate::settings::NodeSettings;
use crate::stagger::{self, ActivationSchedule, ChildNode};
use indexmap::IndexMap;

#[derive(Debug, Clone)]
struct TreeEntry {
    node: AnimatorNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Times of one stagger pass, relative to the moment a parent starts entering
struct GroupSlots {
    times: IndexMap<NodeId, f64>,
    start: f64,
}

impl GroupSlots {
    fn delay_of(&self, child: NodeId) -> f64 {
        self.times.get(&child).map_or(0.0, |time| time - self.start)
    }
}

/// Tree of mounted animator nodes driven by a simulated clock
#[derive(Debug, Clone, Default)]
pub struct AnimatorTree {
    nodes: IndexMap<NodeId, TreeEntry>,
    clock: ManualClock,
    /// Duration of top-level nodes before their own settings apply
    defaults: DurationConfig,
}

impl AnimatorTree {
    /// Create an empty tree with zero default durations
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with the given top-level durations
    pub fn with_defaults(defaults: DurationConfig) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    /// Top-level default durations
    pub fn defaults(&self) -> &DurationConfig {
        &self.defaults
    }

    /// Current simulated time in milliseconds
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// The tree's clock
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a node exists
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All node IDs in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get a node
    pub fn node(&self, id: NodeId) -> Option<&AnimatorNode> {
        self.nodes.get(&id).map(|e| &e.node)
    }

    /// Current flow of a node
    pub fn flow(&self, id: NodeId) -> Option<FlowValue> {
        self.node(id).map(AnimatorNode::flow)
    }

    /// Host snapshot of a node
    pub fn output(&self, id: NodeId) -> Option<AnimatorOutput> {
        self.node(id).map(AnimatorNode::output)
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|e| e.parent)
    }

    /// Children of a node in order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Create, resolve and mount a node under `parent`
    pub fn insert(
        &mut self,
        class: &AnimatorClass,
        instance: NodeSettings,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        class.settings().validate()?;
        instance.validate()?;
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(AnimatorError::NodeNotFound(parent));
            }
        }

        // Resolve against the parent first so the node's own slot is computed
        // from its real duration
        let base = match parent {
            Some(parent) => Some(self.node(parent).ok_or(AnimatorError::NodeNotFound(parent))?.context_for_children()),
            None => None,
        };
        let mut node = class.create_node();
        node.set_defaults(self.defaults);
        node.on_settings_change(instance, base, &mut self.clock)?;
        let id = node.id();

        self.nodes.insert(id, TreeEntry { node, parent, children: Vec::new() });
        if let Some(parent) = parent {
            if let Some(entry) = self.nodes.get_mut(&parent) {
                entry.children.push(id);
            }
        }

        let context = self.context_for(id);
        let entry = self.nodes.get_mut(&id).ok_or(AnimatorError::NodeNotFound(id))?;
        entry.node.on_settings_change(instance, context, &mut self.clock)?;
        entry.node.on_mount(&mut self.clock);
        tracing::debug!(node = ?id, class = %class.name, parent = ?parent, "Inserted animator");

        Ok(id)
    }

    /// Unmount a node and its whole subtree.
    ///
    /// Children unmount before their parent. No timer of a removed node
    /// fires afterwards.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if !self.contains(id) {
            return Err(AnimatorError::NodeNotFound(id));
        }

        let mut order = Vec::new();
        self.collect_post_order(id, &mut order);
        for node_id in &order {
            if let Some(mut entry) = self.nodes.shift_remove(node_id) {
                entry.node.on_unmount(&mut self.clock);
                if let Some(parent) = entry.parent {
                    if let Some(parent) = self.nodes.get_mut(&parent) {
                        parent.children.retain(|c| c != node_id);
                    }
                }
            }
        }

        Ok(())
    }

    /// Replace the instance settings of a node
    pub fn update_settings(&mut self, id: NodeId, instance: NodeSettings) -> Result<AnimatorOutput> {
        instance.validate()?;

        let context = self.context_for(id);
        let entry = self.nodes.get_mut(&id).ok_or(AnimatorError::NodeNotFound(id))?;
        entry.node.on_settings_change(instance, context, &mut self.clock)?;

        // Its duration may move siblings in the parent's pass
        match self.parent(id) {
            Some(parent) => self.propagate(parent)?,
            None => self.propagate(id)?,
        }
        self.output(id).ok_or(AnimatorError::NodeNotFound(id))
    }

    /// Explicitly activate a node and update its subtree
    pub fn activate(&mut self, id: NodeId) -> Result<AnimatorOutput> {
        let entry = self.nodes.get_mut(&id).ok_or(AnimatorError::NodeNotFound(id))?;
        let output = entry.node.activate(&mut self.clock);
        self.propagate(id)?;
        Ok(output)
    }

    /// Explicitly deactivate a node and update its subtree
    pub fn deactivate(&mut self, id: NodeId) -> Result<AnimatorOutput> {
        let entry = self.nodes.get_mut(&id).ok_or(AnimatorError::NodeNotFound(id))?;
        let output = entry.node.deactivate(&mut self.clock);
        self.propagate(id)?;
        Ok(output)
    }

    /// Advance the clock, firing every timer that falls due.
    ///
    /// Timers scheduled while advancing fire in the same call when due.
    pub fn advance(&mut self, delta_ms: f64) -> Result<()> {
        let until = self.clock.now() + delta_ms;
        while let Some(timer) = self.clock.pop_due(until) {
            self.fire(timer)?;
        }
        self.clock.set_time(until);
        Ok(())
    }

    /// Stagger pass a node runs over its group.
    ///
    /// Empty for merge nodes, which join their parent's pass instead.
    pub fn children_schedule(&self, id: NodeId) -> Result<ActivationSchedule<NodeId>> {
        if !self.contains(id) {
            return Err(AnimatorError::NodeNotFound(id));
        }
        if self.boundary_of(id) != id {
            return Ok(ActivationSchedule::empty());
        }
        Ok(self.group_schedule(id))
    }

    fn fire(&mut self, timer: ScheduledTimer) -> Result<()> {
        debug_assert!(
            self.nodes.contains_key(&timer.owner),
            "timer {:?} fired for removed animator {:?}",
            timer.handle,
            timer.owner
        );
        let Some(entry) = self.nodes.get_mut(&timer.owner) else {
            tracing::error!(node = ?timer.owner, handle = ?timer.handle, "Timer fired for a removed animator");
            return Err(AnimatorError::SchedulingInconsistency {
                node: timer.owner,
                handle: timer.handle,
            });
        };

        entry.node.on_timer(timer.handle, &mut self.clock)?;
        self.propagate(timer.owner)
    }

    /// Hand fresh contexts to every descendant of `id`, top-down.
    ///
    /// The group pass is computed once per level and only rebuilt when a
    /// child's duration or grouping flags change.
    fn propagate(&mut self, id: NodeId) -> Result<()> {
        let children = self.children(id).to_vec();
        if children.is_empty() {
            return Ok(());
        }

        let base = self.node(id).ok_or(AnimatorError::NodeNotFound(id))?.context_for_children();
        let mut slots = self.slots_under(id);
        for child in children {
            let context = base.with_activation_delay(slots.delay_of(child));
            let entry = self.nodes.get_mut(&child).ok_or(AnimatorError::NodeNotFound(child))?;
            let before = Self::slot_inputs(&entry.node);
            let instance = *entry.node.instance_settings();
            entry.node.on_settings_change(instance, Some(context), &mut self.clock)?;
            if Self::slot_inputs(&entry.node) != before {
                slots = self.slots_under(id);
            }
            self.propagate(child)?;
        }
        Ok(())
    }

    fn slot_inputs(node: &AnimatorNode) -> (DurationConfig, bool, bool) {
        (node.duration(), node.is_root(), node.is_merge())
    }

    fn context_for(&self, id: NodeId) -> Option<AnimatorContext> {
        let parent = self.parent(id)?;
        let context = self.node(parent)?.context_for_children();
        Some(context.with_activation_delay(self.slots_under(parent).delay_of(id)))
    }

    /// Slots of the pass that schedules the children of `parent`
    fn slots_under(&self, parent: NodeId) -> GroupSlots {
        let boundary = self.boundary_of(parent);
        let times: IndexMap<NodeId, f64> = self
            .group_schedule(boundary)
            .times
            .into_iter()
            .map(|entry| (entry.node, entry.time))
            .collect();
        let start = if parent == boundary {
            0.0
        } else {
            times.get(&parent).copied().unwrap_or(0.0)
        };
        GroupSlots { times, start }
    }

    /// Nearest node at or above `id` that runs its own stagger pass
    fn boundary_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        loop {
            let Some(entry) = self.nodes.get(&current) else {
                return current;
            };
            if !entry.node.is_merge() || entry.node.is_root() {
                return current;
            }
            match entry.parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    fn group_schedule(&self, boundary: NodeId) -> ActivationSchedule<NodeId> {
        let Some(entry) = self.nodes.get(&boundary) else {
            return ActivationSchedule::empty();
        };

        let mut members = Vec::new();
        self.collect_group(boundary, &mut members);
        stagger::schedule(&members, &entry.node.duration()).map(|child| child.id)
    }

    fn collect_group(&self, id: NodeId, out: &mut Vec<ChildNode>) {
        for &child in self.children(id) {
            let Some(node) = self.node(child) else {
                continue;
            };
            if node.is_root() {
                continue;
            }
            out.push(ChildNode::new(child, node.duration()));
            if node.is_merge() {
                self.collect_group(child, out);
            }
        }
    }

    fn collect_post_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in self.children(id) {
            self.collect_post_order(child, out);
        }
        out.push(id);
    }
}
