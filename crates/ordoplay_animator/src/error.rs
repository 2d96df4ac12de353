// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for animator resolution and scheduling.

use crate::clock::TimerHandle;
use crate::node::NodeId;
use thiserror::Error;

/// Animator errors
#[derive(Debug, Error)]
pub enum AnimatorError {
    /// A settings or duration field has an unusable value
    #[error("Invalid configuration for `{field}`: {reason}")]
    Configuration {
        /// Offending field path (e.g. `duration.enter`)
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// A timer fired that its owner was not waiting for
    #[error("Scheduling inconsistency: timer {handle:?} fired for node {node:?} which does not expect it")]
    SchedulingInconsistency {
        /// Node the timer was scheduled for
        node: NodeId,
        /// Handle of the unexpected timer
        handle: TimerHandle,
    },

    /// Node not found in the tree
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Settings could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

impl AnimatorError {
    /// Build a configuration error for a field
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for animator operations
pub type Result<T> = std::result::Result<T, AnimatorError>;
