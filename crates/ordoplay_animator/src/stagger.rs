// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stagger scheduling of children activations.

use crate::duration::DurationConfig;
use crate::node::NodeId;

/// Something that can take a slot in a stagger pass
pub trait StaggerChild {
    /// Resolved duration of the child
    fn duration(&self) -> &DurationConfig;
}

/// A child node reference decorated with its resolved duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildNode {
    /// Node being scheduled
    pub id: NodeId,
    /// Its resolved duration
    pub duration: DurationConfig,
}

impl ChildNode {
    /// Create a new child reference
    pub fn new(id: NodeId, duration: DurationConfig) -> Self {
        Self { id, duration }
    }
}

impl StaggerChild for ChildNode {
    fn duration(&self) -> &DurationConfig {
        &self.duration
    }
}

/// Activation time of one child
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationEntry<N> {
    /// The scheduled child
    pub node: N,
    /// Delay from the start of the pass, in milliseconds
    pub time: f64,
}

/// Result of a stagger pass
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationSchedule<N> {
    /// Time until the slowest child has finished entering
    pub duration: f64,
    /// One entry per child, in input order
    pub times: Vec<ActivationEntry<N>>,
}

impl<N> ActivationSchedule<N> {
    /// Schedule with no children
    pub fn empty() -> Self {
        Self {
            duration: 0.0,
            times: Vec::new(),
        }
    }

    /// Re-key the entries, keeping times and order
    pub fn map<M>(self, mut f: impl FnMut(N) -> M) -> ActivationSchedule<M> {
        ActivationSchedule {
            duration: self.duration,
            times: self
                .times
                .into_iter()
                .map(|entry| ActivationEntry {
                    node: f(entry.node),
                    time: entry.time,
                })
                .collect(),
        }
    }

    /// Number of scheduled children
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether nothing was scheduled
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

impl<N: PartialEq> ActivationSchedule<N> {
    /// Activation time of a node, if it is part of the pass
    pub fn time_of(&self, node: &N) -> Option<f64> {
        self.times.iter().find(|e| e.node == *node).map(|e| e.time)
    }
}

/// Compute activation times for `children` under `parent`.
///
/// Children are spaced by `parent.stagger`. A child's `offset` moves the
/// running cursor, so it also shifts every sibling after it. Values are not
/// clamped: negative offsets can yield negative times.
pub fn schedule<'a, T: StaggerChild>(
    children: &'a [T],
    parent: &DurationConfig,
) -> ActivationSchedule<&'a T> {
    if children.is_empty() {
        return ActivationSchedule::empty();
    }

    let mut cursor = 0.0;
    let mut finish = f64::NEG_INFINITY;
    let mut times = Vec::with_capacity(children.len());

    for (index, child) in children.iter().enumerate() {
        let duration = child.duration();
        if index > 0 {
            cursor += parent.stagger;
        }
        cursor += duration.offset;

        finish = finish.max(cursor + duration.enter);
        times.push(ActivationEntry { node: child, time: cursor });
    }

    tracing::trace!(children = children.len(), duration = finish, "Computed stagger pass");

    ActivationSchedule { duration: finish, times }
}
