use wgpu::util::DeviceExt;

use crate::{
    data_structures::model::{self, Material},
    geometry::MeshData,
};

/// Upload a CPU mesh as a [`model::Model`].
///
/// All sub-meshes share one vertex and one index buffer and only differ in
/// the index range and material they draw. `materials` must follow the order
/// of `mesh.materials`. A non-identity local transform is baked first.
pub fn upload_mesh(device: &wgpu::Device, mesh: &MeshData, materials: Vec<Material>) -> model::Model {
    let baked;
    let mesh = if mesh.transform.is_identity() {
        mesh
    } else {
        baked = mesh.baked();
        &baked
    };
    if materials.len() != mesh.materials.len() {
        log::warn!(
            "Mesh {} declares {} materials but {} were supplied.",
            mesh.name,
            mesh.materials.len(),
            materials.len()
        );
    }

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Vertex Buffer", mesh.name)),
        contents: bytemuck::cast_slice(&mesh.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Index Buffer", mesh.name)),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    let meshes = mesh
        .sub_meshes
        .iter()
        .filter(|sub_mesh| !sub_mesh.indices.is_empty())
        .map(|sub_mesh| model::Mesh {
            name: format!("{}/{}", mesh.name, sub_mesh.material),
            vertex_buffer: vertex_buffer.clone(),
            index_buffer: index_buffer.clone(),
            elements: sub_mesh.indices.clone(),
            material: sub_mesh.material,
        })
        .collect();

    model::Model { meshes, materials }
}
