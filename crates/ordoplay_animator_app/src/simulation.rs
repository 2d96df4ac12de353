// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed-step timeline simulation of a scene.

use crate::scene::{BuiltScene, Result, Scene};
use indexmap::IndexMap;
use ordoplay_animator::{AnimatorTree, FlowValue, NodeId};

/// A flow change observed during the simulation
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Simulated time of the step where it was observed
    pub time: f64,
    /// Node label
    pub node: String,
    /// Previous flow
    pub from: FlowValue,
    /// New flow
    pub to: FlowValue,
}

/// Steps a scene's tree and records every flow change
pub struct Simulation {
    tree: AnimatorTree,
    root: NodeId,
    labels: IndexMap<NodeId, String>,
    step_ms: f64,
    run_ms: f64,
    exit_at_ms: Option<f64>,
    flows: IndexMap<NodeId, FlowValue>,
}

impl Simulation {
    /// Build the scene's tree
    pub fn new(scene: &Scene) -> Result<Self> {
        let BuiltScene { tree, root, labels } = scene.build()?;
        Ok(Self {
            tree,
            root,
            labels,
            step_ms: scene.step_ms,
            run_ms: scene.run_ms,
            exit_at_ms: scene.exit_at_ms,
            flows: IndexMap::new(),
        })
    }

    /// The simulated tree
    pub fn tree(&self) -> &AnimatorTree {
        &self.tree
    }

    /// Run to the end and return the timeline
    pub fn run(&mut self) -> Result<Vec<Transition>> {
        let mut timeline = Vec::new();
        self.flows = self.tree.node_ids().map(|id| (id, FlowValue::Exited)).collect();
        self.record(&mut timeline);

        let mut exited = false;
        while self.tree.now() < self.run_ms {
            if let Some(exit_at) = self.exit_at_ms {
                if !exited && self.tree.now() >= exit_at {
                    tracing::info!(time = self.tree.now(), "Deactivating scene");
                    self.tree.deactivate(self.root)?;
                    exited = true;
                    self.record(&mut timeline);
                }
            }

            let mut step = self.step_ms.min(self.run_ms - self.tree.now());
            if let Some(exit_at) = self.exit_at_ms.filter(|_| !exited) {
                // Land exactly on the exit instant
                step = step.min(exit_at - self.tree.now());
            }
            self.tree.advance(step)?;
            self.record(&mut timeline);
        }

        Ok(timeline)
    }

    fn record(&mut self, timeline: &mut Vec<Transition>) {
        let now = self.tree.now();
        for (id, previous) in self.flows.iter_mut() {
            let Some(current) = self.tree.flow(*id) else {
                continue;
            };
            if current != *previous {
                timeline.push(Transition {
                    time: now,
                    node: self.labels.get(id).cloned().unwrap_or_default(),
                    from: *previous,
                    to: current,
                });
                *previous = current;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times_of(timeline: &[Transition], node: &str, to: FlowValue) -> Vec<f64> {
        timeline
            .iter()
            .filter(|t| t.node == node && t.to == to)
            .map(|t| t.time)
            .collect()
    }

    #[test]
    fn test_builtin_timeline() {
        let scene = Scene::builtin().unwrap();
        let mut simulation = Simulation::new(&scene).unwrap();
        let timeline = simulation.run().unwrap();

        assert_eq!(times_of(&timeline, "frame", FlowValue::Entering), vec![0.0]);
        assert_eq!(times_of(&timeline, "frame", FlowValue::Entered), vec![200.0]);
        assert_eq!(times_of(&timeline, "title", FlowValue::Entering), vec![0.0]);
        // Merged group members take slots in the frame's pass
        assert_eq!(times_of(&timeline, "group", FlowValue::Entering), vec![50.0]);
        assert_eq!(times_of(&timeline, "group.a", FlowValue::Entering), vec![100.0]);
        assert_eq!(times_of(&timeline, "group.b", FlowValue::Entering), vec![180.0]);
        assert_eq!(times_of(&timeline, "footer", FlowValue::Entering), vec![230.0]);

        // Not animated and root nodes
        assert!(times_of(&timeline, "caption", FlowValue::Exiting).is_empty());
        assert!(times_of(&timeline, "modal", FlowValue::Exiting).is_empty());

        assert_eq!(times_of(&timeline, "frame", FlowValue::Exiting), vec![500.0]);
        assert_eq!(times_of(&timeline, "footer", FlowValue::Exited), vec![600.0]);
        assert_eq!(simulation.tree().now(), 900.0);
    }

    #[test]
    fn test_exit_between_steps_is_exact() {
        let scene = Scene::from_ron(
            r#"Scene(
                defaults: (enter: 100.0, exit: 100.0, stagger: 0.0, delay: 0.0, offset: 0.0),
                step_ms: 10.0,
                run_ms: 400.0,
                exit_at_ms: Some(205.0),
                root: (name: Some("panel")),
            )"#,
        )
        .unwrap();
        let mut simulation = Simulation::new(&scene).unwrap();
        let timeline = simulation.run().unwrap();

        assert_eq!(times_of(&timeline, "panel", FlowValue::Exiting), vec![205.0]);
        assert_eq!(times_of(&timeline, "panel", FlowValue::Exited), vec![305.0]);
        assert_eq!(simulation.tree().now(), 400.0);
    }
}
