// SPDX-License-Identifier: MIT OR Apache-2.0
//! Duration configuration and inheritance.
//!
//! All values are milliseconds. A node's own [`PartialDuration`] is resolved
//! against the duration it inherits from its parent, so every field of the
//! resulting [`DurationConfig`] is always populated.

use crate::error::{AnimatorError, Result};
use serde::{Deserialize, Serialize};

/// Fully resolved durations of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DurationConfig {
    /// Enter transition length
    pub enter: f64,
    /// Exit transition length
    pub exit: f64,
    /// Spacing between successive children activations
    pub stagger: f64,
    /// Wait added before the enter timer runs
    pub delay: f64,
    /// Shift applied to this node's stagger slot, may be negative
    pub offset: f64,
}

impl DurationConfig {
    /// Create a config with the given enter/exit lengths and zero spacing
    pub fn new(enter: f64, exit: f64) -> Self {
        Self {
            enter,
            exit,
            ..Self::default()
        }
    }

    /// Set the stagger spacing
    pub fn with_stagger(mut self, stagger: f64) -> Self {
        self.stagger = stagger;
        self
    }

    /// Set the enter delay
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    /// Set the slot offset
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Resolve `own` against an inherited config.
    ///
    /// Fields present in `own` win, absent fields come from `inherited`.
    pub fn resolve(own: &PartialDuration, inherited: &DurationConfig) -> DurationConfig {
        DurationConfig {
            enter: own.enter.unwrap_or(inherited.enter),
            exit: own.exit.unwrap_or(inherited.exit),
            stagger: own.stagger.unwrap_or(inherited.stagger),
            delay: own.delay.unwrap_or(inherited.delay),
            offset: own.offset.unwrap_or(inherited.offset),
        }
    }

    /// Copy with negative lengths clamped to zero.
    ///
    /// `offset` is left untouched since it is allowed to be negative.
    pub fn clamped(&self) -> DurationConfig {
        DurationConfig {
            enter: self.enter.max(0.0),
            exit: self.exit.max(0.0),
            stagger: self.stagger.max(0.0),
            delay: self.delay.max(0.0),
            offset: self.offset,
        }
    }

    /// Whether any length field is negative
    pub fn has_negative_lengths(&self) -> bool {
        self.enter < 0.0 || self.exit < 0.0 || self.stagger < 0.0 || self.delay < 0.0
    }
}

/// Duration overrides where every field is optional
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialDuration {
    /// Enter transition length
    pub enter: Option<f64>,
    /// Exit transition length
    pub exit: Option<f64>,
    /// Spacing between successive children activations
    pub stagger: Option<f64>,
    /// Wait added before the enter timer runs
    pub delay: Option<f64>,
    /// Shift applied to this node's stagger slot
    pub offset: Option<f64>,
}

impl PartialDuration {
    /// Overrides with only `enter` set
    pub fn enter(enter: f64) -> Self {
        Self {
            enter: Some(enter),
            ..Self::default()
        }
    }

    /// Set `exit`
    pub fn with_exit(mut self, exit: f64) -> Self {
        self.exit = Some(exit);
        self
    }

    /// Set `stagger`
    pub fn with_stagger(mut self, stagger: f64) -> Self {
        self.stagger = Some(stagger);
        self
    }

    /// Set `delay`
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set `offset`
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Merge `over` on top of `self`, field by field
    pub fn overlay(&self, over: &PartialDuration) -> PartialDuration {
        PartialDuration {
            enter: over.enter.or(self.enter),
            exit: over.exit.or(self.exit),
            stagger: over.stagger.or(self.stagger),
            delay: over.delay.or(self.delay),
            offset: over.offset.or(self.offset),
        }
    }

    /// Reject values that are not finite numbers
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("duration.enter", self.enter),
            ("duration.exit", self.exit),
            ("duration.stagger", self.stagger),
            ("duration.delay", self.delay),
            ("duration.offset", self.offset),
        ];

        for (field, value) in fields {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(AnimatorError::configuration(
                        field,
                        format!("expected a finite number of milliseconds, got {value}"),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        *self == PartialDuration::default()
    }
}

impl From<DurationConfig> for PartialDuration {
    fn from(config: DurationConfig) -> Self {
        Self {
            enter: Some(config.enter),
            exit: Some(config.exit),
            stagger: Some(config.stagger),
            delay: Some(config.delay),
            offset: Some(config.offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_inherited() {
        let inherited = DurationConfig::new(100.0, 150.0).with_stagger(25.0);
        let own = PartialDuration::enter(200.0).with_delay(50.0);

        let resolved = DurationConfig::resolve(&own, &inherited);
        assert_eq!(resolved.enter, 200.0);
        assert_eq!(resolved.delay, 50.0);
        assert_eq!(resolved.exit, 150.0);
        assert_eq!(resolved.stagger, 25.0);
        assert_eq!(resolved.offset, 0.0);
    }

    #[test]
    fn test_resolve_empty_is_inherited() {
        let inherited = DurationConfig::new(10.0, 20.0).with_offset(-5.0);
        assert_eq!(DurationConfig::resolve(&PartialDuration::default(), &inherited), inherited);
    }

    #[test]
    fn test_overlay_prefers_over() {
        let base = PartialDuration::enter(300.0).with_exit(300.0);
        let over = PartialDuration::enter(600.0).with_offset(10.0);

        let merged = base.overlay(&over);
        assert_eq!(merged.enter, Some(600.0));
        assert_eq!(merged.exit, Some(300.0));
        assert_eq!(merged.offset, Some(10.0));
        assert_eq!(merged.stagger, None);
    }

    #[test]
    fn test_validate_names_field() {
        let bad = PartialDuration::enter(100.0).with_stagger(f64::NAN);
        match bad.validate() {
            Err(AnimatorError::Configuration { field, .. }) => assert_eq!(field, "duration.stagger"),
            other => panic!("expected configuration error, got {other:?}"),
        }

        assert!(PartialDuration::enter(-10.0).with_offset(-20.0).validate().is_ok());
    }

    #[test]
    fn test_clamped_keeps_offset() {
        let config = DurationConfig::new(-10.0, 20.0).with_delay(-1.0).with_offset(-30.0);
        assert!(config.has_negative_lengths());

        let clamped = config.clamped();
        assert_eq!(clamped.enter, 0.0);
        assert_eq!(clamped.delay, 0.0);
        assert_eq!(clamped.exit, 20.0);
        assert_eq!(clamped.offset, -30.0);
        assert!(!clamped.has_negative_lengths());
    }
}
