// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sound cue capability.
//!
//! Animators can be paired with short UI sounds ("bleeps"). Decoding and
//! playback belong to the host; this module only fixes the capability set a
//! player must offer and how audio settings are resolved per category.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Capability set of a playable sound
pub trait Bleep {
    /// Start or resume playback
    fn play(&mut self);
    /// Pause playback
    fn pause(&mut self);
    /// Jump to `time` seconds
    fn seek(&mut self, time: f64);
    /// Stop and rewind
    fn stop(&mut self);
    /// Whether the sound is playing
    fn is_playing(&self) -> bool;
    /// Length in seconds
    fn duration(&self) -> f64;
}

/// Audio settings shared by a group of bleeps
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BleepsAudioGroupSettings {
    /// Volume (0.0 to 1.0)
    pub volume: Option<f32>,
    /// Muted
    pub mute: Option<bool>,
    /// Playback rate
    pub rate: Option<f32>,
    /// Load the sound ahead of its first use
    pub preload: Option<bool>,
}

impl BleepsAudioGroupSettings {
    /// Merge `over` on top of `self`, field by field
    pub fn overlay(&self, over: &BleepsAudioGroupSettings) -> BleepsAudioGroupSettings {
        BleepsAudioGroupSettings {
            volume: over.volume.or(self.volume),
            mute: over.mute.or(self.mute),
            rate: over.rate.or(self.rate),
            preload: over.preload.or(self.preload),
        }
    }

    /// Volume to play at, zero when muted
    pub fn effective_volume(&self) -> f32 {
        if self.mute.unwrap_or(false) {
            0.0
        } else {
            self.volume.unwrap_or(1.0).clamp(0.0, 1.0)
        }
    }
}

/// Audio settings for every category of bleeps
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BleepsAudioSettings {
    /// Applied to all bleeps
    pub common: BleepsAudioGroupSettings,
    /// Per-category overrides
    pub categories: IndexMap<String, BleepsAudioGroupSettings>,
}

impl BleepsAudioSettings {
    /// Settings of a category, falling back to the common ones
    pub fn group_settings(&self, category: Option<&str>) -> BleepsAudioGroupSettings {
        match category.and_then(|c| self.categories.get(c)) {
            Some(group) => self.common.overlay(group),
            None => self.common,
        }
    }
}

/// How a sound player is loaded
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BleepPlayerSettings {
    /// Sources in order of preference
    pub src: Vec<String>,
    /// Explicit formats matching `src`
    pub format: Vec<String>,
    /// Loop playback
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Playback rate
    pub rate: Option<f32>,
}

/// Binding of a named bleep to a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BleepSettings {
    /// Player name
    pub player: String,
    /// Category for audio settings
    #[serde(default)]
    pub category: Option<String>,
    /// Whether every user shares the same player instance
    #[serde(default)]
    pub shared: bool,
}

struct BleepEntry {
    settings: BleepSettings,
    bleep: Box<dyn Bleep>,
}

/// Named bleeps available to animators
#[derive(Default)]
pub struct Bleeps {
    entries: IndexMap<String, BleepEntry>,
}

impl Bleeps {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bleep, replacing any previous one with the same name
    pub fn insert(&mut self, name: impl Into<String>, settings: BleepSettings, bleep: Box<dyn Bleep>) {
        self.entries.insert(name.into(), BleepEntry { settings, bleep });
    }

    /// Number of registered bleeps
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a bleep
    pub fn get(&self, name: &str) -> Option<&dyn Bleep> {
        self.entries.get(name).map(|e| e.bleep.as_ref())
    }

    /// Settings of a bleep
    pub fn settings(&self, name: &str) -> Option<&BleepSettings> {
        self.entries.get(name).map(|e| &e.settings)
    }

    /// Audio settings of a bleep's category
    pub fn audio_for(&self, name: &str, audio: &BleepsAudioSettings) -> Option<BleepsAudioGroupSettings> {
        let settings = self.settings(name)?;
        Some(audio.group_settings(settings.category.as_deref()))
    }

    /// Play a bleep from the start; returns false for unknown names
    pub fn play(&mut self, name: &str) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                if entry.bleep.is_playing() {
                    entry.bleep.seek(0.0);
                }
                entry.bleep.play();
                true
            }
            None => {
                tracing::warn!(bleep = name, "Unknown bleep");
                false
            }
        }
    }

    /// Stop a bleep; returns false for unknown names
    pub fn stop(&mut self, name: &str) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.bleep.stop();
                true
            }
            None => false,
        }
    }

    /// Stop every playing bleep
    pub fn stop_all(&mut self) {
        for entry in self.entries.values_mut() {
            if entry.bleep.is_playing() {
                entry.bleep.stop();
            }
        }
    }
}
