// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene files describing an animator tree.
//!
//! Scenes are RON documents holding the top-level default durations, the
//! simulation timing, named classes and the node tree:
//!
//! ```ron
//! Scene(
//!     defaults: (enter: 100.0, exit: 100.0, stagger: 0.0, delay: 0.0, offset: 0.0),
//!     run_ms: 1000.0,
//!     classes: { "Item": (duration: Some((enter: Some(150.0)))) },
//!     root: (name: Some("list"), settings: (duration: Some((stagger: Some(50.0)))), children: [
//!         (class: Some("Item")),
//!     ]),
//! )
//! ```

use indexmap::IndexMap;
use ordoplay_animator::{AnimatorClass, AnimatorError, AnimatorTree, DurationConfig, NodeId, NodeSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Scene errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// Reading the scene file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The scene is not valid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The tree could not be built or driven
    #[error("Animator error: {0}")]
    Animator(#[from] AnimatorError),

    /// Simulation timing is unusable
    #[error("Invalid simulation: {0}")]
    InvalidSimulation(String),
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;

const BUILTIN_SCENE: &str = r#"Scene(
    defaults: (enter: 100.0, exit: 100.0, stagger: 0.0, delay: 0.0, offset: 0.0),
    step_ms: 10.0,
    run_ms: 900.0,
    exit_at_ms: Some(500.0),
    classes: {
        "Frame": (duration: Some((enter: Some(200.0), stagger: Some(50.0)))),
        "Item": (duration: Some((stagger: Some(0.0)))),
        "Label": (animate: Some(false)),
        "Modal": (root: Some(true)),
    },
    root: (
        name: Some("frame"),
        class: Some("Frame"),
        children: [
            (name: Some("title"), class: Some("Item")),
            (name: Some("group"), class: Some("Item"), settings: (merge: Some(true)), children: [
                (name: Some("group.a"), class: Some("Item")),
                (name: Some("group.b"), class: Some("Item"), settings: (duration: Some((offset: Some(30.0))))),
            ]),
            (name: Some("footer"), class: Some("Item")),
            (name: Some("caption"), class: Some("Label")),
            (name: Some("modal"), class: Some("Modal")),
        ],
    ),
)"#;

fn default_step_ms() -> f64 {
    10.0
}

/// A node in a scene file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneNode {
    /// Label used in the timeline output
    pub name: Option<String>,
    /// Class name from the scene's class table
    pub class: Option<String>,
    /// Instance settings
    pub settings: NodeSettings,
    /// Child nodes in order
    pub children: Vec<SceneNode>,
}

/// A complete scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Durations of the top-level node before its own settings
    #[serde(default)]
    pub defaults: DurationConfig,
    /// Simulation step
    #[serde(default = "default_step_ms")]
    pub step_ms: f64,
    /// Total simulated time
    pub run_ms: f64,
    /// When to deactivate the top-level node
    #[serde(default)]
    pub exit_at_ms: Option<f64>,
    /// Class settings by name
    #[serde(default)]
    pub classes: IndexMap<String, NodeSettings>,
    /// Top-level node
    pub root: SceneNode,
}

/// A scene built into a tree
pub struct BuiltScene {
    /// The mounted tree
    pub tree: AnimatorTree,
    /// Top-level node
    pub root: NodeId,
    /// Display label of every node
    pub labels: IndexMap<NodeId, String>,
}

impl Scene {
    /// Parse a scene from RON
    pub fn from_ron(s: &str) -> Result<Self> {
        let scene: Scene = ron::from_str(s)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Load a scene file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        tracing::info!("Loaded scene from {:?}", path);
        Self::from_ron(&contents)
    }

    /// The scene used when no file is given
    pub fn builtin() -> Result<Self> {
        Self::from_ron(BUILTIN_SCENE)
    }

    /// Check simulation timing
    pub fn validate(&self) -> Result<()> {
        if !(self.step_ms.is_finite() && self.step_ms > 0.0) {
            return Err(SceneError::InvalidSimulation(format!("step_ms must be positive, got {}", self.step_ms)));
        }
        if !(self.run_ms.is_finite() && self.run_ms >= 0.0) {
            return Err(SceneError::InvalidSimulation(format!("run_ms must be non-negative, got {}", self.run_ms)));
        }
        Ok(())
    }

    /// Build and mount the node tree
    pub fn build(&self) -> Result<BuiltScene> {
        let mut classes = IndexMap::new();
        for (name, settings) in &self.classes {
            classes.insert(name.clone(), AnimatorClass::try_new(name.clone(), *settings)?);
        }

        let mut tree = AnimatorTree::with_defaults(self.defaults);
        let mut labels = IndexMap::new();
        let root = Self::insert_node(&mut tree, &classes, &self.root, None, "root", &mut labels)?;

        Ok(BuiltScene { tree, root, labels })
    }

    fn insert_node(
        tree: &mut AnimatorTree,
        classes: &IndexMap<String, AnimatorClass>,
        node: &SceneNode,
        parent: Option<NodeId>,
        fallback_label: &str,
        labels: &mut IndexMap<NodeId, String>,
    ) -> Result<NodeId> {
        let class = match &node.class {
            Some(name) => classes.get(name).cloned().ok_or_else(|| {
                AnimatorError::configuration("class", format!("unknown class `{name}`"))
            })?,
            None => AnimatorClass::default(),
        };

        let id = tree.insert(&class, node.settings, parent)?;
        let label = node.name.clone().unwrap_or_else(|| fallback_label.to_string());

        for (index, child) in node.children.iter().enumerate() {
            let child_label = format!("{label}.{index}");
            Self::insert_node(tree, classes, child, Some(id), &child_label, labels)?;
        }
        labels.insert(id, label);

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordoplay_animator::FlowValue;

    #[test]
    fn test_builtin_scene() {
        let scene = Scene::builtin().unwrap();
        assert_eq!(scene.classes.len(), 4);
        assert_eq!(scene.exit_at_ms, Some(500.0));

        let built = scene.build().unwrap();
        assert_eq!(built.tree.len(), 8);
        assert_eq!(built.labels[&built.root], "frame");
        assert_eq!(built.tree.flow(built.root), Some(FlowValue::Entering));
    }

    #[test]
    fn test_unknown_class() {
        let scene = Scene::from_ron(r#"Scene(run_ms: 10.0, root: (class: Some("Missing")))"#).unwrap();
        match scene.build() {
            Err(SceneError::Animator(AnimatorError::Configuration { field, .. })) => assert_eq!(field, "class"),
            other => panic!("expected configuration error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_invalid_step() {
        let result = Scene::from_ron(r#"Scene(step_ms: 0.0, run_ms: 10.0, root: ())"#);
        assert!(matches!(result, Err(SceneError::InvalidSimulation(_))));
    }

    #[test]
    fn test_fallback_labels() {
        let scene = Scene::from_ron(r#"Scene(run_ms: 10.0, root: (children: [(), (children: [()])]))"#).unwrap();
        let built = scene.build().unwrap();
        let labels: Vec<&str> = built.labels.values().map(String::as_str).collect();
        assert_eq!(labels, vec!["root.0", "root.1.0", "root.1", "root"]);
    }
}
