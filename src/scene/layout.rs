//! House types and the hard-coded village layout.

use std::f32::consts::PI;

/// The two house prototypes a placement can refer to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HouseType {
    Detached,
    Semi,
}

impl HouseType {
    pub const ALL: [HouseType; 2] = [HouseType::Detached, HouseType::Semi];

    /// Width of the house along its ridge, in box units.
    pub fn width(self) -> u32 {
        match self {
            HouseType::Detached => 1,
            HouseType::Semi => 2,
        }
    }

    pub fn from_width(width: u32) -> Option<Self> {
        match width {
            1 => Some(HouseType::Detached),
            2 => Some(HouseType::Semi),
            _ => None,
        }
    }
}

/// Where and how one house of the village stands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementEntry {
    pub house_type: HouseType,
    /// Rotation about the vertical axis, in radians.
    pub y_rotation: f32,
    pub x: f32,
    pub z: f32,
}

impl PlacementEntry {
    pub const fn new(house_type: HouseType, y_rotation: f32, x: f32, z: f32) -> Self {
        Self {
            house_type,
            y_rotation,
            x,
            z,
        }
    }
}

use HouseType::{Detached, Semi};

pub const VILLAGE_LAYOUT: [PlacementEntry; 17] = [
    PlacementEntry::new(Detached, -PI / 16.0, -6.8, 2.5),
    PlacementEntry::new(Semi, -PI / 16.0, -4.5, 3.0),
    PlacementEntry::new(Semi, -PI / 16.0, -1.5, 4.0),
    PlacementEntry::new(Semi, -PI / 3.0, 1.5, 6.0),
    PlacementEntry::new(Semi, 15.0 * PI / 16.0, -6.4, -1.5),
    PlacementEntry::new(Detached, 15.0 * PI / 16.0, -4.1, -1.0),
    PlacementEntry::new(Semi, 15.0 * PI / 16.0, -2.1, -0.5),
    PlacementEntry::new(Detached, 5.0 * PI / 4.0, 0.0, -1.0),
    PlacementEntry::new(Detached, PI + PI / 2.5, 0.5, -3.0),
    PlacementEntry::new(Semi, PI + PI / 2.1, 0.75, -5.0),
    PlacementEntry::new(Detached, PI + PI / 2.25, 0.75, -7.0),
    PlacementEntry::new(Semi, PI / 1.9, 4.75, -1.0),
    PlacementEntry::new(Detached, PI / 1.95, 4.5, -3.0),
    PlacementEntry::new(Semi, PI / 1.9, 4.75, -5.0),
    PlacementEntry::new(Detached, PI / 1.9, 4.75, -7.0),
    PlacementEntry::new(Semi, -PI / 3.0, 5.25, 2.0),
    PlacementEntry::new(Detached, -PI / 3.0, 6.0, 4.0),
];

/// A single detached house standing at the origin.
pub const SINGLE_HOUSE_LAYOUT: [PlacementEntry; 1] =
    [PlacementEntry::new(Detached, 0.0, 0.0, 0.0)];
