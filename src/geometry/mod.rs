//! CPU-side mesh data.
//!
//! Scenes are assembled here before anything touches the GPU: primitives are
//! generated as [`MeshData`], carry their own local transform and materials,
//! and can be merged into one multi-material mesh. The result is uploaded by
//! [`crate::resources::mesh::upload_mesh`].

use std::ops::Range;

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::{instance::Instance, model::ModelVertex};

pub mod primitives;

/// A texture rectangle `[u0, v0] .. [u1, v1]` with the origin in the
/// bottom-left corner of the image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceUv {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl FaceUv {
    /// The whole image.
    pub const FULL: FaceUv = FaceUv::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Self { u0, v0, u1, v1 }
    }

    /// Texture coordinates of the bottom-left, bottom-right, top-right and
    /// top-left corners, converted to wgpu's top-left origin.
    pub fn corners(&self) -> [[f32; 2]; 4] {
        [
            [self.u0, 1.0 - self.v0],
            [self.u1, 1.0 - self.v0],
            [self.u1, 1.0 - self.v1],
            [self.u0, 1.0 - self.v1],
        ]
    }
}

impl From<[f32; 4]> for FaceUv {
    fn from([u0, v0, u1, v1]: [f32; 4]) -> Self {
        Self::new(u0, v0, u1, v1)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialDesc {
    pub name: String,
    /// Remote URL or a path relative to `assets/`.
    pub diffuse_texture: String,
}

impl MaterialDesc {
    pub fn new(name: &str, diffuse_texture: &str) -> Self {
        Self {
            name: name.to_string(),
            diffuse_texture: diffuse_texture.to_string(),
        }
    }
}

/// A contiguous range of indices drawn with one material.
#[derive(Clone, Debug, PartialEq)]
pub struct SubMesh {
    pub material: usize,
    pub indices: Range<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub sub_meshes: Vec<SubMesh>,
    pub materials: Vec<MaterialDesc>,
    /// Local transform, applied when the mesh is merged or baked.
    pub transform: Instance,
}

impl MeshData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            vertices: Vec::new(),
            indices: Vec::new(),
            sub_meshes: Vec::new(),
            materials: Vec::new(),
            transform: Instance::new(),
        }
    }

    /// Assign `material` to every index that is not yet covered by a sub-mesh.
    pub fn with_material(mut self, material: MaterialDesc) -> Self {
        let covered = self
            .sub_meshes
            .iter()
            .map(|sub_mesh| sub_mesh.indices.end)
            .max()
            .unwrap_or(0);
        self.sub_meshes.push(SubMesh {
            material: self.materials.len(),
            indices: covered..self.indices.len() as u32,
        });
        self.materials.push(material);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Append a quad given as bottom-left, bottom-right, top-right, top-left
    /// corners, counter-clockwise when seen from the side `normal` points to.
    pub(crate) fn push_quad(&mut self, corners: [Vector3<f32>; 4], normal: Vector3<f32>, uv: FaceUv) {
        let base = self.vertices.len() as u32;
        for (corner, tex_coords) in corners.iter().zip(uv.corners()) {
            self.vertices.push(ModelVertex {
                position: (*corner).into(),
                tex_coords,
                normal: normal.into(),
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Return a copy whose local transform has been applied to every vertex.
    ///
    /// The copy has an identity transform, so it can be positioned again as a
    /// rigid body.
    pub fn baked(&self) -> MeshData {
        if self.transform.is_identity() {
            return self.clone();
        }
        let model = self.transform.to_matrix();
        let normal_matrix = self.transform.normal_matrix();
        let vertices = self
            .vertices
            .iter()
            .map(|vertex| {
                let position = model * Vector3::from(vertex.position).extend(1.0);
                let normal = (normal_matrix * Vector3::from(vertex.normal)).normalize();
                ModelVertex {
                    position: position.truncate().into(),
                    tex_coords: vertex.tex_coords,
                    normal: normal.into(),
                }
            })
            .collect();
        MeshData {
            vertices,
            transform: Instance::new(),
            ..self.clone()
        }
    }

    /// Merge `meshes` into one mesh named `name`.
    ///
    /// Each source is baked with its own transform first. Every source
    /// sub-mesh survives as a sub-mesh of the result with its material, so a
    /// merged mesh still draws each part with its own texture. The result has
    /// an identity transform and keeps the sources' origin.
    pub fn merge(name: &str, meshes: impl IntoIterator<Item = MeshData>) -> MeshData {
        let mut merged = MeshData::new(name);
        for mesh in meshes {
            let mesh = mesh.baked();
            let vertex_offset = merged.vertices.len() as u32;
            let index_offset = merged.indices.len() as u32;
            let material_offset = merged.materials.len();

            merged.vertices.extend(mesh.vertices);
            merged
                .indices
                .extend(mesh.indices.iter().map(|index| index + vertex_offset));
            merged
                .sub_meshes
                .extend(mesh.sub_meshes.into_iter().map(|sub_mesh| SubMesh {
                    material: sub_mesh.material + material_offset,
                    indices: sub_mesh.indices.start + index_offset
                        ..sub_mesh.indices.end + index_offset,
                }));
            merged.materials.extend(mesh.materials);
        }
        merged
    }

    /// Axis-aligned bounds of the vertices in object space, ignoring the
    /// local transform. `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        let first = Vector3::from(self.vertices.first()?.position);
        Some(self.vertices.iter().fold((first, first), |(min, max), vertex| {
            let p = Vector3::from(vertex.position);
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        }))
    }
}
