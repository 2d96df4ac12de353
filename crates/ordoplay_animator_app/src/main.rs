// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` Animator - timeline simulator for animator trees
//!
//! Loads a scene (a RON description of an animator tree), runs it on a
//! simulated clock with a fixed step and logs every flow transition.
//!
//! ```text
//! ordoplay_animator [scene.ron]
//! ```
//!
//! Without an argument the built-in demo scene is used.

mod scene;
mod simulation;

use scene::{Scene, SceneError};
use simulation::Simulation;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn run() -> Result<(), SceneError> {
    let scene = match std::env::args_os().nth(1) {
        Some(path) => Scene::load(&PathBuf::from(path))?,
        None => {
            tracing::info!("No scene given, using the built-in scene");
            Scene::builtin()?
        }
    };

    let mut simulation = Simulation::new(&scene)?;
    let timeline = simulation.run()?;

    for transition in &timeline {
        tracing::info!(
            "{:>8.1} ms  {:<16} {} -> {}",
            transition.time,
            transition.node,
            transition.from.name(),
            transition.to.name()
        );
    }
    tracing::info!(
        "Simulated {} ms, {} transitions across {} animators",
        simulation.tree().now(),
        timeline.len(),
        simulation.tree().len()
    );

    Ok(())
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ordoplay_animator_app=info,ordoplay_animator=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OrdoPlay Animator v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        tracing::error!("Simulation failed: {e}");
        std::process::exit(1);
    }
}
