use std::str::FromStr;

use anyhow::{Error, bail};

use crate::scene::{
    builder::SceneBuilder,
    layout::{PlacementEntry, SINGLE_HOUSE_LAYOUT, VILLAGE_LAYOUT},
    spin::Spin,
};

/// Scene packaged next to the application for [`Variant::Imported`].
pub const DEFAULT_SCENE_FILE: &str = "meshs/scene.glb";

/// Which scene to show.
#[derive(Clone, Debug, PartialEq)]
pub enum Variant {
    /// Seventeen houses on a 16x16 ground.
    Village,
    /// One detached house on a 10x10 ground, turning at 10 rpm.
    SpinningHouse,
    /// A packaged glTF/GLB scene instead of procedural construction.
    Imported { path: String },
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Village
    }
}

impl FromStr for Variant {
    type Err = Error;

    /// Accepts `village`, `house` and `imported` or `imported:<path>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, argument) = match s.split_once(':') {
            Some((name, argument)) => (name, Some(argument)),
            None => (s, None),
        };
        match (name.trim().to_ascii_lowercase().as_str(), argument) {
            ("village", None) => Ok(Variant::Village),
            ("house", None) => Ok(Variant::SpinningHouse),
            ("imported", None) => Ok(Variant::Imported {
                path: DEFAULT_SCENE_FILE.to_string(),
            }),
            ("imported", Some(path)) if !path.is_empty() => Ok(Variant::Imported {
                path: path.to_string(),
            }),
            _ => bail!(
                "unknown scene variant {:?}, expected village, house or imported[:path]",
                s
            ),
        }
    }
}

/// Everything a scene flow needs to know to build itself.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub variant: Variant,
    pub builder: SceneBuilder,
    pub layout: Vec<PlacementEntry>,
    /// Rotation applied to the first house every frame.
    pub spin: Option<Spin>,
}

impl SceneConfig {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Village => Self {
                variant,
                builder: SceneBuilder::village(),
                layout: VILLAGE_LAYOUT.to_vec(),
                spin: None,
            },
            Variant::SpinningHouse => Self {
                variant,
                builder: SceneBuilder::single_house(),
                layout: SINGLE_HOUSE_LAYOUT.to_vec(),
                spin: Some(Spin::new(10.0)),
            },
            Variant::Imported { .. } => Self {
                variant,
                builder: SceneBuilder::village(),
                layout: Vec::new(),
                spin: None,
            },
        }
    }

    /// Parse the variant from the first command-line style argument,
    /// falling back to the village when there is none.
    pub fn from_arg(arg: Option<&str>) -> anyhow::Result<Self> {
        let variant = match arg {
            Some(arg) if !arg.trim().is_empty() => arg.parse()?,
            _ => Variant::default(),
        };
        Ok(Self::for_variant(variant))
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::for_variant(Variant::default())
    }
}
