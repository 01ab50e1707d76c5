//! Render composition and pipeline batching.
//!
//! Flows describe what they want drawn with a [`Render`] value. The render loop
//! flattens every flow's output into one batch of [`Instanced`] draws and
//! submits them with the shared textured pipeline.

use crate::data_structures::model::Model;

/// A model together with the instance buffer it is drawn with.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
    pub id: u32,
}

/// Specifies how a flow should be rendered.
///
/// - `None` renders nothing
/// - `Defaults(Vec<Instanced>)` renders a batch of instanced models
/// - `Composed(Vec<Render>)` recursively renders several renders
pub enum Render<'a> {
    None,
    Defaults(Vec<Instanced<'a>>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    pub(crate) fn set_pipelines(self, basics: &mut Vec<Instanced<'a>>) {
        match self {
            Render::Defaults(mut vec) => basics.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(basics)),
            Render::None => (),
        }
    }

    /// Total number of instances this render would draw.
    pub fn instance_count(&self) -> usize {
        match self {
            Render::None => 0,
            Render::Defaults(vec) => vec.iter().map(|i| i.amount).sum(),
            Render::Composed(renders) => renders.iter().map(Render::instance_count).sum(),
        }
    }
}
