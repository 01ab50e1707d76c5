use std::f32::consts::TAU;

use approx::assert_relative_eq;
use hamlet::{
    data_structures::instance::Instance,
    flow::FrameObservers,
    scene::{
        builder::{Dwellings, SceneBuilder},
        layout::{HouseType, VILLAGE_LAYOUT},
        spin::Spin,
        village::{assign_slots, slot_transforms, spin_observer},
    },
};
use instant::Duration;

#[test]
fn ten_rpm_turns_a_sixth_of_a_revolution_per_second() {
    let spin = Spin::new(10.0);

    assert_relative_eq!(spin.angle(Duration::from_millis(1000)), TAU / 6.0, epsilon = 1e-6);
    assert_relative_eq!(spin.angle(Duration::from_millis(500)), TAU / 12.0, epsilon = 1e-6);
    assert_relative_eq!(spin.angle(Duration::ZERO), 0.0);
}

#[test]
fn rotation_does_not_depend_on_frame_rate() {
    let spin = Spin::new(10.0);
    let mut fast = 0.0;
    let mut slow = 0.0;

    for _ in 0..120 {
        spin.advance(&mut fast, Duration::from_micros(8_333));
    }
    for _ in 0..30 {
        spin.advance(&mut slow, Duration::from_micros(33_333));
    }

    assert_relative_eq!(fast, slow, epsilon = 1e-4);
    assert_relative_eq!(fast, TAU / 6.0, epsilon = 1e-3);
}

#[test]
fn spin_observer_turns_only_its_house() {
    let mut dwellings: Dwellings = SceneBuilder::village()
        .build_dwellings(&VILLAGE_LAYOUT)
        .unwrap();
    let before: Vec<f32> = dwellings.instances.iter().map(|h| h.y_rotation).collect();
    let mut observers = FrameObservers::new();
    observers.add(spin_observer(Spin::new(10.0), 0));

    observers.notify(&mut dwellings, Duration::from_secs(1));

    assert_relative_eq!(
        dwellings.instances[0].y_rotation,
        before[0] + TAU / 6.0,
        epsilon = 1e-6
    );
    for (house, initial) in dwellings.instances.iter().zip(&before).skip(1) {
        assert_relative_eq!(house.y_rotation, *initial);
    }
}

#[test]
fn spin_observer_ignores_missing_houses() {
    let mut dwellings = SceneBuilder::village().build_dwellings(&[]).unwrap();
    let mut observe = spin_observer(Spin::new(10.0), 0);

    observe(&mut dwellings, Duration::from_secs(1));

    assert!(dwellings.instances.is_empty());
}

#[test]
fn spun_house_lands_in_its_own_instance_slot() {
    let mut dwellings = SceneBuilder::village()
        .build_dwellings(&VILLAGE_LAYOUT)
        .unwrap();
    let slots = assign_slots(&dwellings.instances);
    let mut observe = spin_observer(Spin::new(10.0), 0);

    observe(&mut dwellings, Duration::from_millis(500));

    let detached: Vec<_> =
        slot_transforms(&dwellings.instances, &slots, HouseType::Detached).collect();
    let semi: Vec<_> = slot_transforms(&dwellings.instances, &slots, HouseType::Semi).collect();
    assert_eq!(detached.len(), 8);
    assert_eq!(semi.len(), 9);
    assert_eq!(
        detached.iter().map(|(slot, _)| *slot).collect::<Vec<_>>(),
        (0..8).collect::<Vec<_>>()
    );

    let (slot, transform) = &detached[0];
    assert_eq!(*slot, 0);
    assert_eq!(*transform, dwellings.instances[0].transform());
    let expected = Instance::on_ground(
        VILLAGE_LAYOUT[0].y_rotation + TAU / 12.0,
        VILLAGE_LAYOUT[0].x,
        VILLAGE_LAYOUT[0].z,
    );
    assert_relative_eq!(transform.rotation.s, expected.rotation.s, epsilon = 1e-6);
    assert_relative_eq!(transform.rotation.v.y, expected.rotation.v.y, epsilon = 1e-6);

    // The first semi house keeps its table rotation.
    let (_, first_semi) = &semi[0];
    assert_eq!(*first_semi, Instance::on_ground(VILLAGE_LAYOUT[1].y_rotation, -4.5, 3.0));
}
