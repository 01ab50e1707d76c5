//! The village scene: layout table, procedural construction, per-frame spin
//! and the flow that shows it.

pub mod builder;
pub mod config;
pub mod layout;
pub mod spin;
pub mod village;

use crate::{flow, scene::config::SceneConfig};

/// Show the scene described by `config` until the window is closed.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    log::info!("Starting with {:?}", config.variant);
    flow::run::<()>(vec![village::constructor(config)])
}
