//! Render pipelines owned by the [`crate::context::Context`].

pub mod basic;
pub mod light;

#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        light_bind_group_layout: &wgpu::BindGroupLayout,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            basic: basic::mk_basic_pipeline(
                device,
                format,
                light_bind_group_layout,
                camera_bind_group_layout,
            ),
        }
    }
}
