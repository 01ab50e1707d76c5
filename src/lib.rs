//! hamlet
//!
//! A small village of textured houses, assembled procedurally from a box, a
//! three-sided cylinder and a ground plane, and rendered with GPU instancing
//! on native targets and in the browser.
//!
//! High-level modules
//! - `scene`: layout table, scene builder, spin update and the scene flow
//! - `geometry`: CPU meshes, primitives and merging
//! - `camera`: arc-rotate camera, controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: engine data models (meshes, instances, textures, scene graph)
//! - `flow`: the render loop, the flow trait and per-frame observers
//! - `pipelines`: the textured instanced pipeline and the hemispheric light
//! - `resources`: helpers to load textures/models and create GPU resources
//! - `render`: render composition for batching draws
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod geometry;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Browser entry point. The scene is chosen with the `variant` query
/// parameter, e.g. `?variant=house`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no browser window"))?;
    let search = window.location().search()?;
    let variant = web_sys::UrlSearchParams::new_with_str(&search)?.get("variant");
    let config = scene::config::SceneConfig::from_arg(variant.as_deref())
        .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
    scene::run(config).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
