// SPDX-License-Identifier: MIT OR Apache-2.0
//! Class and instance settings of an animator node.
//!
//! Every node type carries *class* settings fixed when the type is defined,
//! and each use site may pass *instance* settings. Instance values win field
//! by field.

use crate::duration::PartialDuration;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Settings as supplied by a node type or a use site
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Whether transitions are timed at all
    pub animate: Option<bool>,
    /// Duration overrides
    pub duration: Option<PartialDuration>,
    /// Manage an independent lifecycle
    pub root: Option<bool>,
    /// Join the parent's stagger pass instead of running one
    pub merge: Option<bool>,
}

impl NodeSettings {
    /// Settings with nothing set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `animate`
    pub fn with_animate(mut self, animate: bool) -> Self {
        self.animate = Some(animate);
        self
    }

    /// Set duration overrides
    pub fn with_duration(mut self, duration: PartialDuration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set `root`
    pub fn with_root(mut self, root: bool) -> Self {
        self.root = Some(root);
        self
    }

    /// Set `merge`
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = Some(merge);
        self
    }

    /// Check every duration field
    pub fn validate(&self) -> Result<()> {
        match &self.duration {
            Some(duration) => duration.validate(),
            None => Ok(()),
        }
    }

    /// Parse settings from RON
    pub fn from_ron(s: &str) -> Result<Self> {
        let settings: NodeSettings = ron::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Settings after class and instance have been merged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSettings {
    /// Whether transitions are timed
    pub animate: bool,
    /// Duration overrides, still to be resolved against the inherited duration
    pub duration: PartialDuration,
    /// Independent lifecycle
    pub root: bool,
    /// Transparent to stagger scheduling
    pub merge: bool,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        Self {
            animate: true,
            duration: PartialDuration::default(),
            root: false,
            merge: false,
        }
    }
}

/// Merge class and instance settings, instance winning per field.
pub fn merge_settings(
    class: Option<&NodeSettings>,
    instance: Option<&NodeSettings>,
) -> ResolvedSettings {
    let defaults = ResolvedSettings::default();
    let pick = |field: fn(&NodeSettings) -> Option<bool>, fallback: bool| {
        instance
            .and_then(field)
            .or_else(|| class.and_then(field))
            .unwrap_or(fallback)
    };

    let class_duration = class.and_then(|s| s.duration).unwrap_or_default();
    let instance_duration = instance.and_then(|s| s.duration).unwrap_or_default();

    ResolvedSettings {
        animate: pick(|s| s.animate, defaults.animate),
        duration: class_duration.overlay(&instance_duration),
        root: pick(|s| s.root, defaults.root),
        merge: pick(|s| s.merge, defaults.merge),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnimatorError;

    #[test]
    fn test_defaults() {
        let resolved = merge_settings(None, None);
        assert!(resolved.animate);
        assert!(!resolved.root);
        assert!(!resolved.merge);
        assert!(resolved.duration.is_empty());
    }

    #[test]
    fn test_instance_animate_wins() {
        let class = NodeSettings::new().with_animate(true);
        let instance = NodeSettings::new().with_animate(false);
        assert!(!merge_settings(Some(&class), Some(&instance)).animate);

        let class = NodeSettings::new().with_animate(false);
        let instance = NodeSettings::new().with_animate(true);
        assert!(merge_settings(Some(&class), Some(&instance)).animate);
    }

    #[test]
    fn test_class_used_when_instance_unset() {
        let class = NodeSettings::new().with_root(true).with_merge(true).with_animate(false);
        let resolved = merge_settings(Some(&class), Some(&NodeSettings::new()));
        assert!(resolved.root);
        assert!(resolved.merge);
        assert!(!resolved.animate);
    }

    #[test]
    fn test_root_and_merge_instance_priority() {
        let class = NodeSettings::new().with_root(true).with_merge(true);
        let instance = NodeSettings::new().with_root(false).with_merge(false);
        let resolved = merge_settings(Some(&class), Some(&instance));
        assert!(!resolved.root);
        assert!(!resolved.merge);
    }

    #[test]
    fn test_duration_merged_per_field() {
        let class = NodeSettings::new().with_duration(PartialDuration::enter(300.0).with_exit(300.0));
        let instance = NodeSettings::new().with_duration(PartialDuration::enter(600.0).with_delay(50.0));

        let resolved = merge_settings(Some(&class), Some(&instance));
        assert_eq!(resolved.duration.enter, Some(600.0));
        assert_eq!(resolved.duration.exit, Some(300.0));
        assert_eq!(resolved.duration.delay, Some(50.0));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let class = NodeSettings::new().with_animate(false).with_duration(PartialDuration::enter(10.0));
        let instance = NodeSettings::new().with_merge(true);

        let first = merge_settings(Some(&class), Some(&instance));
        let second = merge_settings(Some(&class), Some(&instance));
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_ron() {
        let settings = NodeSettings::from_ron("(animate: Some(false), duration: Some((enter: Some(200.0), delay: Some(50.0))))").unwrap();
        assert_eq!(settings.animate, Some(false));
        assert_eq!(settings.duration.and_then(|d| d.enter), Some(200.0));
        assert_eq!(settings.root, None);

        assert!(matches!(NodeSettings::from_ron("(animate: 3)"), Err(AnimatorError::Parse(_))));
    }
}
