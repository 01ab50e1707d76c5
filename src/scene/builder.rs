//! Procedural construction of the ground, the two house prototypes and
//! their placements.
//!
//! Everything here produces CPU [`MeshData`]; nothing talks to the GPU, so a
//! built scene can be inspected and compared directly.

use std::f32::consts::FRAC_PI_2;

use anyhow::{Result, bail};
use cgmath::{Rotation3, Vector3};

use crate::{
    data_structures::instance::Instance,
    geometry::{FaceUv, MaterialDesc, MeshData, primitives},
    scene::layout::{HouseType, PlacementEntry},
};

pub const CUBE_HOUSE_TEXTURE: &str = "https://assets.babylonjs.com/environments/cubehouse.png";
pub const SEMI_HOUSE_TEXTURE: &str = "https://assets.babylonjs.com/environments/semihouse.png";
pub const ROOF_TEXTURE: &str = "https://assets.babylonjs.com/environments/roof.jpg";
pub const FLOOR_TEXTURE: &str = "https://www.babylonjs-playground.com/textures/floor.png";

/// Rear, front, right, left, top and bottom rectangles on the detached
/// house sheet. Top and bottom are never seen and keep the whole image.
pub const DETACHED_FACE_UV: [FaceUv; 6] = [
    FaceUv::new(0.5, 0.0, 0.75, 1.0),
    FaceUv::new(0.0, 0.0, 0.25, 1.0),
    FaceUv::new(0.25, 0.0, 0.5, 1.0),
    FaceUv::new(0.75, 0.0, 1.0, 1.0),
    FaceUv::FULL,
    FaceUv::FULL,
];

/// Rear, front, right, left, top and bottom rectangles on the semi house
/// sheet. Both gable ends share the same strip.
pub const SEMI_FACE_UV: [FaceUv; 6] = [
    FaceUv::new(0.6, 0.0, 1.0, 1.0),
    FaceUv::new(0.0, 0.0, 0.4, 1.0),
    FaceUv::new(0.4, 0.0, 0.6, 1.0),
    FaceUv::new(0.4, 0.0, 0.6, 1.0),
    FaceUv::FULL,
    FaceUv::FULL,
];

const ROOF_DIAMETER: f32 = 1.3;
const ROOF_HEIGHT: f32 = 1.2;
const ROOF_SQUASH: f32 = 0.75;
const ROOF_ELEVATION: f32 = 1.22;

/// A merged house mesh used as the instancing source for one house type.
#[derive(Clone, Debug, PartialEq)]
pub struct HousePrototype {
    pub house_type: HouseType,
    pub mesh: MeshData,
}

/// One placed house. Shares geometry and materials with the prototype of
/// its `house_type` and only carries its own transform.
#[derive(Clone, Debug, PartialEq)]
pub struct HouseInstance {
    pub name: String,
    pub house_type: HouseType,
    pub y_rotation: f32,
    pub position: Vector3<f32>,
}

impl HouseInstance {
    pub fn transform(&self) -> Instance {
        Instance::on_ground(self.y_rotation, self.position.x, self.position.z)
    }
}

/// The built content of a scene: ground, prototypes and placements.
#[derive(Clone, Debug, PartialEq)]
pub struct Dwellings {
    pub ground: MeshData,
    pub prototypes: [HousePrototype; 2],
    pub instances: Vec<HouseInstance>,
}

impl Dwellings {
    pub fn prototype(&self, house_type: HouseType) -> &HousePrototype {
        match house_type {
            HouseType::Detached => &self.prototypes[0],
            HouseType::Semi => &self.prototypes[1],
        }
    }

    pub fn instances_of(&self, house_type: HouseType) -> impl Iterator<Item = &HouseInstance> {
        self.instances
            .iter()
            .filter(move |instance| instance.house_type == house_type)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneBuilder {
    /// Edge length of the square ground plane.
    pub ground_size: f32,
}

impl SceneBuilder {
    pub fn new(ground_size: f32) -> Self {
        Self { ground_size }
    }

    pub fn village() -> Self {
        Self::new(16.0)
    }

    pub fn single_house() -> Self {
        Self::new(10.0)
    }

    pub fn build_ground(&self) -> MeshData {
        primitives::ground("ground", self.ground_size, self.ground_size)
            .with_material(MaterialDesc::new("groundMat", FLOOR_TEXTURE))
    }

    /// The walls of a house, `width` units wide, standing on the ground.
    pub fn build_box(&self, width: u32) -> Result<MeshData> {
        let (texture, face_uv) = match HouseType::from_width(width) {
            Some(HouseType::Detached) => (CUBE_HOUSE_TEXTURE, DETACHED_FACE_UV),
            Some(HouseType::Semi) => (SEMI_HOUSE_TEXTURE, SEMI_FACE_UV),
            None => bail!("houses are 1 or 2 units wide, got {}", width),
        };
        let mut walls = primitives::cuboid("box", Vector3::new(width as f32, 1.0, 1.0), face_uv)
            .with_material(MaterialDesc::new("boxMat", texture));
        walls.transform.position.y = 0.5;
        Ok(walls)
    }

    /// A triangular prism lying along X on top of a box of the same width.
    pub fn build_roof(&self, width: u32) -> Result<MeshData> {
        if HouseType::from_width(width).is_none() {
            bail!("houses are 1 or 2 units wide, got {}", width);
        }
        let mut roof = primitives::cylinder("roof", ROOF_DIAMETER, ROOF_HEIGHT, 3)
            .with_material(MaterialDesc::new("roofMat", ROOF_TEXTURE));
        roof.transform = Instance {
            position: Vector3::new(0.0, ROOF_ELEVATION, 0.0),
            rotation: cgmath::Quaternion::from_angle_z(cgmath::Rad(FRAC_PI_2)),
            scale: Vector3::new(ROOF_SQUASH, width as f32, 1.0),
        };
        Ok(roof)
    }

    /// Walls and roof merged into one two-material mesh with its origin on
    /// the ground below the centre of the house.
    pub fn build_house(&self, width: u32) -> Result<MeshData> {
        let walls = self.build_box(width)?;
        let roof = self.build_roof(width)?;
        Ok(MeshData::merge("house", [walls, roof]))
    }

    /// Build the ground, one prototype per house type and one instance per
    /// entry of `layout`, in table order.
    pub fn build_dwellings(&self, layout: &[PlacementEntry]) -> Result<Dwellings> {
        let ground = self.build_ground();
        let prototypes = [
            self.build_prototype(HouseType::Detached)?,
            self.build_prototype(HouseType::Semi)?,
        ];

        let instances = layout
            .iter()
            .enumerate()
            .map(|(i, entry)| HouseInstance {
                name: format!("house{}", i),
                house_type: entry.house_type,
                y_rotation: entry.y_rotation,
                position: Vector3::new(entry.x, 0.0, entry.z),
            })
            .collect::<Vec<_>>();
        log::debug!(
            "Built {} houses from {} prototypes on a {}x{} ground",
            instances.len(),
            prototypes.len(),
            self.ground_size,
            self.ground_size
        );

        Ok(Dwellings {
            ground,
            prototypes,
            instances,
        })
    }

    fn build_prototype(&self, house_type: HouseType) -> Result<HousePrototype> {
        Ok(HousePrototype {
            house_type,
            mesh: self.build_house(house_type.width())?,
        })
    }
}
