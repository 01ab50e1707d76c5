//! Loading of textures, meshes and glTF scenes from remote URLs or the
//! local `assets` directory.

use std::io::{BufReader, Cursor};

use anyhow::Context as _;

use crate::{
    data_structures::{
        model::{self, Material},
        scene_graph::{ContainerNode, SceneNode, to_scene_node},
        texture::Texture,
    },
    geometry::{MaterialDesc, MeshData},
    resources::texture::{TextureCache, diffuse_layout, load_binary, load_texture_or_fallback},
};

pub mod mesh;
pub mod texture;

/// Build GPU materials for `descs` from textures already in `cache`.
pub fn load_materials(
    descs: &[MaterialDesc],
    cache: &TextureCache,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> Vec<Material> {
    descs
        .iter()
        .map(|desc| {
            let texture = match cache.get(&desc.diffuse_texture) {
                Some(texture) => texture.clone(),
                None => {
                    log::warn!(
                        "Texture {} of material {} was never loaded.",
                        desc.diffuse_texture,
                        desc.name
                    );
                    Texture::from_colour(device, queue, Texture::FALLBACK_COLOUR, &desc.name)
                }
            };
            Material::new(device, &desc.name, texture, layout)
        })
        .collect()
}

/// Fetch the textures of `meshes` (concurrently, each URL once) and upload
/// every mesh with its materials.
pub async fn load_mesh_models(
    meshes: &[&MeshData],
    cache: &mut TextureCache,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Vec<model::Model> {
    cache
        .load_all(
            meshes
                .iter()
                .flat_map(|mesh| mesh.materials.iter())
                .map(|material| material.diffuse_texture.as_str()),
            device,
            queue,
        )
        .await;
    let layout = diffuse_layout(device);
    meshes
        .iter()
        .map(|mesh| {
            let materials = load_materials(&mesh.materials, cache, device, queue, &layout);
            mesh::upload_mesh(device, mesh, materials)
        })
        .collect()
}

/// Load a glTF or GLB scene as a scene graph.
pub async fn load_model_gltf(
    file_name: &str,
    id: u32,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Box<dyn SceneNode>> {
    let gltf_data = load_binary(file_name).await?;
    let gltf_reader = BufReader::new(Cursor::new(gltf_data));
    let gltf = gltf::Gltf::from_reader(gltf_reader)
        .with_context(|| format!("{} is not a valid glTF file", file_name))?;

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .with_context(|| format!("{} references a missing binary chunk", file_name))?;
                buffer_data.push(blob.into());
            }
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(load_binary(&relative_to(file_name, uri)).await?);
            }
        }
    }

    let layout = diffuse_layout(device);
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let name = material.name().unwrap_or("gltf material").to_string();
        let pbr = material.pbr_metallic_roughness();
        let diffuse_texture = match pbr.base_color_texture().map(|info| info.texture().source().source()) {
            Some(gltf::image::Source::View { view, mime_type }) => {
                let bytes = buffer_data
                    .get(view.buffer().index())
                    .and_then(|buffer| buffer.get(view.offset()..view.offset() + view.length()));
                match bytes.map(|bytes| {
                    Texture::from_bytes(device, queue, bytes, &name, mime_type.split('/').last())
                }) {
                    Some(Ok(texture)) => texture,
                    Some(Err(e)) => {
                        log::warn!("Using fallback texture for {}: {:#}", name, e);
                        Texture::from_colour(device, queue, Texture::FALLBACK_COLOUR, &name)
                    }
                    None => {
                        log::warn!("Image of material {} points outside its buffer", name);
                        Texture::from_colour(device, queue, Texture::FALLBACK_COLOUR, &name)
                    }
                }
            }
            Some(gltf::image::Source::Uri { uri, .. }) => {
                load_texture_or_fallback(&relative_to(file_name, uri), device, queue).await
            }
            None => {
                let colour = pbr.base_color_factor().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
                Texture::from_colour(device, queue, colour, &name)
            }
        };
        materials.push(model::Material::new(device, &name, diffuse_texture, &layout));
    }
    if materials.is_empty() {
        let texture = Texture::from_colour(device, queue, Texture::FALLBACK_COLOUR, "default");
        materials.push(model::Material::new(device, "default", texture, &layout));
    }

    let mut nodes = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            nodes.push(to_scene_node(id, node, &buffer_data, device, &materials));
        }
    }
    log::info!("Loaded {} root nodes from {}", nodes.len(), file_name);

    let mut root_node = ContainerNode::new(1);
    root_node.children = nodes;
    Ok(Box::new(root_node))
}

/// Resolve `uri` against the directory of `file_name` unless it is absolute.
pub fn relative_to(file_name: &str, uri: &str) -> String {
    if texture::is_remote(uri) {
        return uri.to_string();
    }
    match file_name.rsplit_once('/') {
        Some((directory, _)) => format!("{}/{}", directory, uri),
        None => uri.to_string(),
    }
}
