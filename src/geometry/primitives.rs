//! Procedural primitives: ground plane, box with per-face UVs, and an
//! n-sided capped cylinder.
//!
//! All primitives are centred on the origin and come without materials;
//! callers attach them with [`MeshData::with_material`].

use std::f32::consts::TAU;

use cgmath::{InnerSpace, Vector3};

use super::{FaceUv, MeshData};
use crate::data_structures::model::ModelVertex;

/// Box faces in the order their UV rectangles are given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxFace {
    Rear,
    Front,
    Right,
    Left,
    Top,
    Bottom,
}

impl BoxFace {
    pub const ALL: [BoxFace; 6] = [
        BoxFace::Rear,
        BoxFace::Front,
        BoxFace::Right,
        BoxFace::Left,
        BoxFace::Top,
        BoxFace::Bottom,
    ];

    pub fn normal(self) -> Vector3<f32> {
        match self {
            BoxFace::Rear => Vector3::unit_z(),
            BoxFace::Front => -Vector3::unit_z(),
            BoxFace::Right => Vector3::unit_x(),
            BoxFace::Left => -Vector3::unit_x(),
            BoxFace::Top => Vector3::unit_y(),
            BoxFace::Bottom => -Vector3::unit_y(),
        }
    }

    /// Image "up" on this face. Side faces are upright.
    fn up(self) -> Vector3<f32> {
        match self {
            BoxFace::Top => -Vector3::unit_z(),
            BoxFace::Bottom => Vector3::unit_z(),
            _ => Vector3::unit_y(),
        }
    }
}

/// Flat ground in the XZ plane, `width` along X and `depth` along Z,
/// facing +Y.
pub fn ground(name: &str, width: f32, depth: f32) -> MeshData {
    let mut mesh = MeshData::new(name);
    let (hw, hd) = (width * 0.5, depth * 0.5);
    mesh.push_quad(
        [
            Vector3::new(-hw, 0.0, hd),
            Vector3::new(hw, 0.0, hd),
            Vector3::new(hw, 0.0, -hd),
            Vector3::new(-hw, 0.0, -hd),
        ],
        Vector3::unit_y(),
        FaceUv::FULL,
    );
    mesh
}

/// Axis-aligned box of the given size with one UV rectangle per face,
/// indexed like [`BoxFace::ALL`].
pub fn cuboid(name: &str, size: Vector3<f32>, face_uv: [FaceUv; 6]) -> MeshData {
    let mut mesh = MeshData::new(name);
    let half = size * 0.5;
    let extent_along = |axis: Vector3<f32>| {
        axis.x.abs() * half.x + axis.y.abs() * half.y + axis.z.abs() * half.z
    };

    for (face, uv) in BoxFace::ALL.into_iter().zip(face_uv) {
        let normal = face.normal();
        let up = face.up();
        let right = up.cross(normal);
        let centre = normal * extent_along(normal);
        let r = right * extent_along(right);
        let u = up * extent_along(up);
        mesh.push_quad(
            [centre - r - u, centre + r - u, centre + r + u, centre - r + u],
            normal,
            uv,
        );
    }
    mesh
}

/// Cylinder along Y with `tessellation` flat sides and capped ends.
///
/// With three sides this is a triangular prism whose first edge lies on +X.
pub fn cylinder(name: &str, diameter: f32, height: f32, tessellation: u32) -> MeshData {
    let mut mesh = MeshData::new(name);
    let sides = tessellation.max(3);
    let radius = diameter * 0.5;
    let half_height = height * 0.5;
    let ring = |i: u32| {
        let angle = i as f32 * TAU / sides as f32;
        Vector3::new(angle.cos() * radius, 0.0, -angle.sin() * radius)
    };
    let top = Vector3::unit_y() * half_height;

    for i in 0..sides {
        let (a, b) = (ring(i), ring(i + 1));
        let normal = (a + b).normalize();
        let uv = FaceUv::new(i as f32 / sides as f32, 0.0, (i + 1) as f32 / sides as f32, 1.0);
        mesh.push_quad([a - top, b - top, b + top, a + top], normal, uv);
    }

    push_cap(&mut mesh, sides, radius, half_height, true);
    push_cap(&mut mesh, sides, radius, -half_height, false);
    mesh
}

fn push_cap(mesh: &mut MeshData, sides: u32, radius: f32, y: f32, facing_up: bool) {
    let normal = if facing_up {
        Vector3::unit_y()
    } else {
        -Vector3::unit_y()
    };
    let centre = mesh.vertex_count() as u32;
    mesh.vertices.push(ModelVertex {
        position: [0.0, y, 0.0],
        tex_coords: [0.5, 0.5],
        normal: normal.into(),
    });
    for i in 0..sides {
        let angle = i as f32 * TAU / sides as f32;
        let (sin, cos) = angle.sin_cos();
        let position = Vector3::new(cos * radius, y, -sin * radius);
        mesh.vertices.push(ModelVertex {
            position: position.into(),
            tex_coords: [0.5 + cos * 0.5, 0.5 + sin * 0.5],
            normal: normal.into(),
        });
    }
    for i in 0..sides {
        let a = centre + 1 + i;
        let b = centre + 1 + (i + 1) % sides;
        if facing_up {
            mesh.indices.extend_from_slice(&[centre, a, b]);
        } else {
            mesh.indices.extend_from_slice(&[centre, b, a]);
        }
    }
}
