//! Scene graph and hierarchical scene organization.
//!
//! Every node holds a list of `(local, world)` transform pairs, one per
//! instance. A parent's world transform of instance `i` is combined with the
//! child's local transform of instance `i`, so a tree of nodes behaves like
//! several copies of one rigid object.

use std::ops::Range;

use log::warn;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::{Instance, InstanceRaw},
        model::{self, ModelVertex},
    },
    render::Instanced,
};

/// Convert a glTF node and its children into scene nodes.
///
/// Materials are shared by every mesh of the document, `materials` is indexed
/// with the glTF material index.
pub fn to_scene_node(
    id: u32,
    node: gltf::scene::Node,
    buffers: &[Vec<u8>],
    device: &wgpu::Device,
    materials: &[model::Material],
) -> Box<dyn SceneNode> {
    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => {
            let mesh_name = mesh.name().unwrap_or("unknown_mesh");
            let meshes = mesh
                .primitives()
                .filter_map(|primitive| {
                    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

                    let mut vertices: Vec<ModelVertex> = reader
                        .read_positions()?
                        .map(|position| ModelVertex {
                            position,
                            ..Default::default()
                        })
                        .collect();
                    if let Some(normals) = reader.read_normals() {
                        vertices
                            .iter_mut()
                            .zip(normals)
                            .for_each(|(vertex, normal)| vertex.normal = normal);
                    }
                    if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                        vertices
                            .iter_mut()
                            .zip(tex_coords)
                            .for_each(|(vertex, tex_coords)| vertex.tex_coords = tex_coords);
                    }

                    let indices: Vec<u32> = match reader.read_indices() {
                        Some(indices) => indices.into_u32().collect(),
                        None => (0..vertices.len() as u32).collect(),
                    };
                    if indices.is_empty() {
                        warn!("Skipping primitive without geometry in mesh {}", mesh_name);
                        return None;
                    }

                    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{:?} Vertex Buffer", mesh_name)),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
                    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{:?} Index Buffer", mesh_name)),
                        contents: bytemuck::cast_slice(&indices),
                        usage: wgpu::BufferUsages::INDEX,
                    });

                    Some(model::Mesh {
                        name: mesh_name.to_string(),
                        vertex_buffer,
                        index_buffer,
                        elements: 0..indices.len() as u32,
                        material: primitive.material().index().unwrap_or(0),
                    })
                })
                .collect();
            let model = model::Model {
                meshes,
                materials: materials.to_vec(),
            };
            Box::new(ModelNode::from_model(1, id, device, model))
        }
        None => Box::new(ContainerNode::new(1)),
    };
    let (position, rotation, scale) = node.transform().decomposed();
    let instance = Instance {
        position: position.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    };
    scene_node.set_local_transform(0, instance);
    for child in node.children() {
        scene_node.add_child(to_scene_node(id, child, buffers, device, materials));
    }

    scene_node
}

pub trait SceneNode {
    fn get_world_transforms(&self) -> Vec<Instance>;

    fn get_local_transform(&self, idx: usize) -> Option<Instance>;

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    fn set_local_transform(&mut self, idx: usize, instance: Instance);

    fn set_local_transform_all(&mut self, mutation: &mut dyn FnMut(&mut Instance));

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device);

    /// Combine the instances in `range` with their parents' world transforms
    /// and pass the result down to the children.
    fn update_world_transforms(&mut self, range: Range<usize>, parents_world_transform: &[Instance]);

    fn update_world_transform_all(&mut self);

    /// Append an instance and return the new instance count.
    fn add_instance(&mut self, instance: Instance) -> usize;

    fn instance_count(&self) -> usize;

    fn get_render(&self) -> Vec<Instanced<'_>>;
}

fn propagate(
    instances: &mut [(Instance, Instance)],
    children: &mut [Box<dyn SceneNode>],
    range: Range<usize>,
    parents_world_transform: &[Instance],
) {
    if parents_world_transform.len() > instances.len() {
        warn!(
            "You tried to transform with len {}, but there are only {} instances to transform.",
            parents_world_transform.len(),
            instances.len()
        );
        return;
    }
    let Some(selected) = instances.get_mut(range.clone()) else {
        warn!(
            "You tried to transform range {}..{}, which is out of bounds for parent len {}.",
            range.start,
            range.end,
            instances.len(),
        );
        return;
    };
    let world_transforms = selected
        .iter_mut()
        .zip(parents_world_transform)
        .map(|((local, world), parent)| {
            *world = parent * &*local;
            world.clone()
        })
        .collect::<Vec<_>>();
    for child in children.iter_mut() {
        child.update_world_transforms(range.clone(), &world_transforms);
    }
}

fn identity_parents(amount: usize) -> Vec<Instance> {
    (0..amount).map(|_| Instance::default()).collect()
}

/// A node without geometry that only groups and transforms its children.
pub struct ContainerNode {
    pub children: Vec<Box<dyn SceneNode>>,
    pub instances: Vec<(Instance, Instance)>,
}

impl ContainerNode {
    pub fn new(amount: usize) -> Self {
        Self {
            instances: identity_parents(amount)
                .into_iter()
                .map(|i| (i.clone(), i))
                .collect(),
            children: vec![],
        }
    }
}

impl SceneNode for ContainerNode {
    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn set_local_transform(&mut self, idx: usize, instance: Instance) {
        if let Some((local, _)) = self.instances.get_mut(idx) {
            *local = instance;
        }
    }

    fn set_local_transform_all(&mut self, mutation: &mut dyn FnMut(&mut Instance)) {
        self.instances.iter_mut().for_each(|(local, _)| mutation(local));
    }

    fn get_world_transforms(&self) -> Vec<Instance> {
        self.instances.iter().map(|(_, world)| world).cloned().collect()
    }

    fn update_world_transforms(&mut self, range: Range<usize>, parents_world_transform: &[Instance]) {
        propagate(&mut self.instances, &mut self.children, range, parents_world_transform);
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn get_local_transform(&self, idx: usize) -> Option<Instance> {
        self.instances.get(idx).map(|(local, _)| local).cloned()
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue, device));
    }

    fn add_instance(&mut self, instance: Instance) -> usize {
        self.instances.push((instance.clone(), instance));
        for child in &mut self.children {
            child.add_instance(Instance::default());
        }
        self.instances.len()
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn update_world_transform_all(&mut self) {
        let parents = identity_parents(self.instances.len());
        self.update_world_transforms(0..parents.len(), &parents);
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .collect()
    }
}

/// A GPU model drawn once per instance from its own instance buffer.
pub struct ModelNode {
    children: Vec<Box<dyn SceneNode>>,
    instance_buffer: wgpu::Buffer,
    instances: Vec<(Instance, Instance)>,
    buffer_size_needs_change: bool,
    model: model::Model,
    id: u32,
}

impl ModelNode {
    pub fn from_model(amount: usize, id: u32, device: &wgpu::Device, model: model::Model) -> Self {
        Self::with_instances(id, device, model, identity_parents(amount))
    }

    /// A node whose local (and initial world) transforms are `locals`.
    pub fn with_instances(
        id: u32,
        device: &wgpu::Device,
        model: model::Model,
        locals: Vec<Instance>,
    ) -> Self {
        let instances: Vec<(Instance, Instance)> =
            locals.into_iter().map(|i| (i.clone(), i)).collect();
        let instance_buffer = mk_instance_buffer(device, &instances);

        Self {
            children: vec![],
            instance_buffer,
            instances,
            buffer_size_needs_change: false,
            model,
            id,
        }
    }
}

fn mk_instance_buffer(device: &wgpu::Device, instances: &[(Instance, Instance)]) -> wgpu::Buffer {
    let raw_instances: Vec<InstanceRaw> = instances.iter().map(|(_, world)| world.to_raw()).collect();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Instance Buffer"),
        contents: bytemuck::cast_slice(&raw_instances),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

impl SceneNode for ModelNode {
    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn set_local_transform(&mut self, idx: usize, instance: Instance) {
        if let Some((local, _)) = self.instances.get_mut(idx) {
            *local = instance;
        }
    }

    fn set_local_transform_all(&mut self, mutation: &mut dyn FnMut(&mut Instance)) {
        self.instances.iter_mut().for_each(|(local, _)| mutation(local));
    }

    fn get_world_transforms(&self) -> Vec<Instance> {
        self.instances.iter().map(|(_, world)| world).cloned().collect()
    }

    fn update_world_transforms(&mut self, range: Range<usize>, parents_world_transform: &[Instance]) {
        propagate(&mut self.instances, &mut self.children, range, parents_world_transform);
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn get_local_transform(&self, idx: usize) -> Option<Instance> {
        self.instances.get(idx).map(|(local, _)| local).cloned()
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        if self.buffer_size_needs_change {
            self.instance_buffer = mk_instance_buffer(device, &self.instances);
            self.buffer_size_needs_change = false;
        } else if !self.instances.is_empty() {
            let raw_instances: Vec<InstanceRaw> =
                self.instances.iter().map(|(_, world)| world.to_raw()).collect();
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&raw_instances));
        }
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue, device));
    }

    fn add_instance(&mut self, instance: Instance) -> usize {
        self.instances.push((instance.clone(), instance));
        for child in &mut self.children {
            child.add_instance(Instance::default());
        }
        self.buffer_size_needs_change = true;
        self.instances.len()
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn update_world_transform_all(&mut self) {
        let parents = identity_parents(self.instances.len());
        self.update_world_transforms(0..parents.len(), &parents);
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        let own = (!self.instances.is_empty() && !self.model.meshes.is_empty()).then(|| Instanced {
            instance: &self.instance_buffer,
            model: &self.model,
            amount: self.instances.len(),
            id: self.id,
        });
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .chain(own)
            .collect()
    }
}
