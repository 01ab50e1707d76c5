//! The scene flow: puts a built village (or an imported scene) on the GPU
//! and keeps the instance buffers in sync with the per-frame updates.

use std::pin::Pin;

use anyhow::Context as _;
use instant::Duration;

use crate::{
    context::{Context, InitContext},
    data_structures::{
        instance::Instance,
        scene_graph::{ModelNode, SceneNode},
    },
    flow::{FlowConstructor, FrameObservers, GraphicsFlow, ObserverHandle},
    render::Render,
    resources::{load_mesh_models, load_model_gltf, texture::TextureCache},
    scene::{
        builder::{Dwellings, HouseInstance},
        config::{SceneConfig, Variant},
        layout::HouseType,
        spin::Spin,
    },
};

const GROUND_ID: u32 = 0;
const IMPORTED_ID: u32 = 1;
const HOUSE_ID: u32 = 2;

/// For every house, the prototype it is drawn with and its slot in that
/// prototype's instance buffer. Slots follow table order per house type.
pub fn assign_slots(instances: &[HouseInstance]) -> Vec<(HouseType, usize)> {
    let mut used = [0usize; HouseType::ALL.len()];
    instances
        .iter()
        .map(|instance| {
            let counter = &mut used[type_index(instance.house_type)];
            let slot = *counter;
            *counter += 1;
            (instance.house_type, slot)
        })
        .collect()
}

fn type_index(house_type: HouseType) -> usize {
    match house_type {
        HouseType::Detached => 0,
        HouseType::Semi => 1,
    }
}

/// The instance slot and current transform of every house of `house_type`,
/// with `slots` as returned by [`assign_slots`].
pub fn slot_transforms<'a>(
    instances: &'a [HouseInstance],
    slots: &'a [(HouseType, usize)],
    house_type: HouseType,
) -> impl Iterator<Item = (usize, Instance)> + 'a {
    instances
        .iter()
        .zip(slots)
        .filter(move |(_, (t, _))| *t == house_type)
        .map(|(house, (_, slot))| (*slot, house.transform()))
}

/// A frame observer that turns house `index` about the vertical axis.
pub fn spin_observer(spin: Spin, index: usize) -> impl FnMut(&mut Dwellings, Duration) + 'static {
    move |dwellings, dt| {
        if let Some(house) = dwellings.instances.get_mut(index) {
            spin.advance(&mut house.y_rotation, dt);
        }
    }
}

struct Village {
    dwellings: Dwellings,
    ground: ModelNode,
    /// One instancing node per house type that has at least one house.
    houses: Vec<(HouseType, ModelNode)>,
    slots: Vec<(HouseType, usize)>,
}

impl Village {
    /// Copy every house's transform into its instance slot and upload.
    fn sync(&mut self, ctx: &Context) {
        let Village {
            dwellings,
            houses,
            slots,
            ..
        } = self;
        for (house_type, node) in houses.iter_mut() {
            let transforms = slot_transforms(&dwellings.instances, slots.as_slice(), *house_type);
            for (slot, transform) in transforms {
                node.set_local_transform(slot, transform);
            }
            node.update_world_transform_all();
            node.write_to_buffers(&ctx.queue, &ctx.device);
        }
    }
}

enum SceneContent {
    Village(Village),
    Imported(Box<dyn SceneNode>),
}

/// Owns everything a scene puts on the GPU for as long as it is shown.
pub struct VillageFlow {
    variant: Variant,
    content: SceneContent,
    observers: FrameObservers<Dwellings>,
    handles: Vec<ObserverHandle>,
    textures: TextureCache,
}

impl VillageFlow {
    pub async fn new(ctx: InitContext, config: SceneConfig) -> anyhow::Result<Self> {
        let InitContext { device, queue } = &ctx;
        let mut observers = FrameObservers::new();
        let mut handles = Vec::new();
        let mut textures = TextureCache::new();

        let content = match &config.variant {
            Variant::Imported { path } => {
                let mut root = load_model_gltf(path, IMPORTED_ID, device, queue)
                    .await
                    .with_context(|| format!("failed to import scene {}", path))?;
                root.update_world_transform_all();
                root.write_to_buffers(queue, device);
                SceneContent::Imported(root)
            }
            Variant::Village | Variant::SpinningHouse => {
                let dwellings = config.builder.build_dwellings(&config.layout)?;
                let slots = assign_slots(&dwellings.instances);

                // Ground first, then the prototypes in `HouseType::ALL` order.
                let used_types: Vec<HouseType> = HouseType::ALL
                    .into_iter()
                    .filter(|t| dwellings.instances_of(*t).next().is_some())
                    .collect();
                let mut meshes = vec![&dwellings.ground];
                meshes.extend(used_types.iter().map(|t| &dwellings.prototype(*t).mesh));
                let mut models = load_mesh_models(&meshes, &mut textures, device, queue)
                    .await
                    .into_iter();

                let ground = ModelNode::from_model(
                    1,
                    GROUND_ID,
                    device,
                    models.next().context("ground model was not uploaded")?,
                );
                let mut houses = Vec::new();
                for (i, house_type) in used_types.into_iter().enumerate() {
                    let model = models
                        .next()
                        .with_context(|| format!("{:?} prototype was not uploaded", house_type))?;
                    let transforms = dwellings
                        .instances_of(house_type)
                        .map(HouseInstance::transform)
                        .collect();
                    houses.push((
                        house_type,
                        ModelNode::with_instances(HOUSE_ID + i as u32, device, model, transforms),
                    ));
                }

                if let Some(spin) = config.spin {
                    if dwellings.instances.is_empty() {
                        log::warn!("Nothing to spin, the layout is empty");
                    } else {
                        handles.push(observers.add(spin_observer(spin, 0)));
                    }
                }

                SceneContent::Village(Village {
                    dwellings,
                    ground,
                    houses,
                    slots,
                })
            }
        };

        log::info!(
            "Scene {:?} ready with {} textures",
            config.variant,
            textures.len()
        );
        Ok(Self {
            variant: config.variant,
            content,
            observers,
            handles,
            textures,
        })
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    /// The CPU side of the village, `None` for an imported scene.
    pub fn dwellings(&self) -> Option<&Dwellings> {
        match &self.content {
            SceneContent::Village(village) => Some(&village.dwellings),
            SceneContent::Imported(_) => None,
        }
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    fn release_observers(&mut self) {
        for handle in self.handles.drain(..) {
            self.observers.remove(handle);
        }
    }
}

impl<S> GraphicsFlow<S> for VillageFlow {
    fn on_init(&mut self, ctx: &mut Context, _state: &mut S) {
        ctx.camera.camera = Default::default();
        log::info!("Showing {:?}", self.variant);
    }

    fn on_update(&mut self, ctx: &Context, _state: &mut S, dt: Duration) {
        let SceneContent::Village(village) = &mut self.content else {
            return;
        };
        if self.observers.is_empty() {
            return;
        }
        self.observers.notify(&mut village.dwellings, dt);
        village.sync(ctx);
    }

    fn on_render(&self) -> Render<'_> {
        match &self.content {
            SceneContent::Village(village) => Render::Composed(
                std::iter::once(Render::Defaults(village.ground.get_render()))
                    .chain(
                        village
                            .houses
                            .iter()
                            .map(|(_, node)| Render::Defaults(node.get_render())),
                    )
                    .collect(),
            ),
            SceneContent::Imported(root) => Render::Defaults(root.get_render()),
        }
    }

    fn on_exit(&mut self, _ctx: &Context, _state: &mut S) {
        self.release_observers();
    }
}

impl Drop for VillageFlow {
    fn drop(&mut self) {
        self.release_observers();
    }
}

/// A flow constructor that builds the scene described by `config`.
pub fn constructor<S: 'static>(config: SceneConfig) -> FlowConstructor<S> {
    Box::new(
        move |ctx: InitContext| -> Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn GraphicsFlow<S>>>>>> {
            Box::pin(async move {
                let flow = VillageFlow::new(ctx, config).await?;
                Ok(Box::new(flow) as Box<dyn GraphicsFlow<S>>)
            })
        },
    )
}
