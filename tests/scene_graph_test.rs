use approx::assert_relative_eq;
use cgmath::Vector3;
use hamlet::data_structures::{
    instance::Instance,
    scene_graph::{ContainerNode, SceneNode},
};

fn translated(x: f32, y: f32, z: f32) -> Instance {
    Instance::from(Vector3::new(x, y, z))
}

#[test]
fn world_transforms_compose_down_the_tree() {
    let mut root = ContainerNode::new(1);
    let mut child = ContainerNode::new(1);
    child.set_local_transform(0, translated(0.0, 1.0, 0.0));
    root.add_child(Box::new(child));
    root.set_local_transform(0, Instance::on_ground(0.0, 2.0, 3.0));

    root.update_world_transform_all();

    let world = &root.get_children()[0].get_world_transforms()[0];
    assert_relative_eq!(world.position.x, 2.0);
    assert_relative_eq!(world.position.y, 1.0);
    assert_relative_eq!(world.position.z, 3.0);
}

#[test]
fn parent_rotation_turns_child_offsets() {
    let mut root = ContainerNode::new(1);
    let mut child = ContainerNode::new(1);
    child.set_local_transform(0, translated(1.0, 0.0, 0.0));
    root.add_child(Box::new(child));
    root.set_local_transform(0, Instance::on_ground(std::f32::consts::FRAC_PI_2, 0.0, 0.0));

    root.update_world_transform_all();

    // A quarter turn about Y maps +X onto -Z.
    let world = &root.get_children()[0].get_world_transforms()[0];
    assert_relative_eq!(world.position.x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(world.position.z, -1.0, epsilon = 1e-6);
}

#[test]
fn added_instances_reach_the_children() {
    let mut root = ContainerNode::new(1);
    root.add_child(Box::new(ContainerNode::new(1)));

    assert_eq!(root.add_instance(translated(5.0, 0.0, 0.0)), 2);
    root.update_world_transform_all();

    assert_eq!(root.instance_count(), 2);
    let child_worlds = root.get_children()[0].get_world_transforms();
    assert_eq!(child_worlds.len(), 2);
    assert_relative_eq!(child_worlds[1].position.x, 5.0);
}

#[test]
fn set_local_transform_all_mutates_every_instance() {
    let mut root = ContainerNode::new(3);
    root.set_local_transform_all(&mut |local: &mut Instance| local.position.y += 1.0);

    for idx in 0..3 {
        assert_relative_eq!(root.get_local_transform(idx).unwrap().position.y, 1.0);
    }
    assert!(root.get_local_transform(3).is_none());
}

#[test]
fn containers_draw_nothing_themselves() {
    let root = ContainerNode::new(1);
    assert!(root.get_render().is_empty());
}
