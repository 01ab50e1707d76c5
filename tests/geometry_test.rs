use approx::assert_relative_eq;
use cgmath::Vector3;
use hamlet::{
    geometry::{FaceUv, MaterialDesc, MeshData, primitives},
    scene::builder::{
        CUBE_HOUSE_TEXTURE, DETACHED_FACE_UV, FLOOR_TEXTURE, ROOF_TEXTURE, SEMI_FACE_UV,
        SEMI_HOUSE_TEXTURE, SceneBuilder,
    },
};

fn face_tex_coords(mesh: &MeshData, face: usize) -> Vec<[f32; 2]> {
    mesh.vertices[face * 4..face * 4 + 4]
        .iter()
        .map(|v| v.tex_coords)
        .collect()
}

#[test]
fn face_uv_corners_flip_v_for_wgpu() {
    let uv = FaceUv::new(0.25, 0.0, 0.5, 1.0);
    assert_eq!(
        uv.corners(),
        [[0.25, 1.0], [0.5, 1.0], [0.5, 0.0], [0.25, 0.0]]
    );
    assert_eq!(FaceUv::from([0.0, 0.0, 1.0, 1.0]), FaceUv::FULL);
}

#[test]
fn detached_box_uses_the_cube_house_sheet() {
    let walls = SceneBuilder::village().build_box(1).unwrap();

    assert_eq!(DETACHED_FACE_UV[0], FaceUv::new(0.5, 0.0, 0.75, 1.0));
    assert_eq!(DETACHED_FACE_UV[1], FaceUv::new(0.0, 0.0, 0.25, 1.0));
    assert_eq!(DETACHED_FACE_UV[2], FaceUv::new(0.25, 0.0, 0.5, 1.0));
    assert_eq!(DETACHED_FACE_UV[3], FaceUv::new(0.75, 0.0, 1.0, 1.0));
    for (face, uv) in DETACHED_FACE_UV.iter().enumerate() {
        assert_eq!(face_tex_coords(&walls, face), uv.corners().to_vec());
    }
    assert_eq!(walls.materials, vec![MaterialDesc::new("boxMat", CUBE_HOUSE_TEXTURE)]);
}

#[test]
fn semi_box_uses_the_semi_house_sheet() {
    let walls = SceneBuilder::village().build_box(2).unwrap();

    assert_eq!(SEMI_FACE_UV[0], FaceUv::new(0.6, 0.0, 1.0, 1.0));
    assert_eq!(SEMI_FACE_UV[1], FaceUv::new(0.0, 0.0, 0.4, 1.0));
    assert_eq!(SEMI_FACE_UV[2], FaceUv::new(0.4, 0.0, 0.6, 1.0));
    assert_eq!(SEMI_FACE_UV[3], FaceUv::new(0.4, 0.0, 0.6, 1.0));
    for (face, uv) in SEMI_FACE_UV.iter().enumerate() {
        assert_eq!(face_tex_coords(&walls, face), uv.corners().to_vec());
    }
    assert_eq!(walls.materials, vec![MaterialDesc::new("boxMat", SEMI_HOUSE_TEXTURE)]);
}

#[test]
fn box_stands_on_the_ground() {
    for width in [1u32, 2] {
        let walls = SceneBuilder::village().build_box(width).unwrap().baked();
        let (min, max) = walls.bounds().unwrap();

        assert_relative_eq!(min.y, 0.0);
        assert_relative_eq!(max.y, 1.0);
        assert_relative_eq!(min.x, -(width as f32) / 2.0);
        assert_relative_eq!(max.x, width as f32 / 2.0);
        assert_relative_eq!(min.z, -0.5);
        assert_relative_eq!(max.z, 0.5);
    }
}

#[test]
fn roof_is_a_prism_lying_on_the_box() {
    for width in [1u32, 2] {
        let roof = SceneBuilder::village().build_roof(width).unwrap();
        assert_eq!(roof.materials, vec![MaterialDesc::new("roofMat", ROOF_TEXTURE)]);

        let (min, max) = roof.baked().bounds().unwrap();
        let half_length = 0.6 * width as f32;
        assert_relative_eq!(min.x, -half_length, epsilon = 1e-5);
        assert_relative_eq!(max.x, half_length, epsilon = 1e-5);
        // Ridge on top, eaves slightly below the top of the walls.
        assert_relative_eq!(max.y, 1.22 + 0.65 * 0.75, epsilon = 1e-5);
        assert_relative_eq!(min.y, 1.22 - 0.325 * 0.75, epsilon = 1e-5);
        assert!(min.y < 1.0 && min.y > 0.9);
    }
}

#[test]
fn baked_normals_stay_unit_length() {
    let roof = SceneBuilder::village().build_roof(2).unwrap().baked();
    for vertex in &roof.vertices {
        let n = Vector3::from(vertex.normal);
        assert_relative_eq!(n.x * n.x + n.y * n.y + n.z * n.z, 1.0, epsilon = 1e-5);
    }
}

#[test]
fn house_merges_walls_and_roof_with_two_materials() {
    let house = SceneBuilder::village().build_house(1).unwrap();

    assert!(house.transform.is_identity());
    assert_eq!(house.materials.len(), 2);
    assert_eq!(house.materials[0].name, "boxMat");
    assert_eq!(house.materials[1].name, "roofMat");
    assert_eq!(house.sub_meshes.len(), 2);
    assert_eq!(house.sub_meshes[0].material, 0);
    assert_eq!(house.sub_meshes[0].indices, 0..36);
    assert_eq!(house.sub_meshes[1].material, 1);
    assert_eq!(house.sub_meshes[1].indices, 36..72);
    assert_eq!(house.vertex_count(), 24 + 20);
    assert!(house.indices.iter().all(|&i| (i as usize) < house.vertex_count()));

    let (min, max) = house.bounds().unwrap();
    assert_relative_eq!(min.y, 0.0);
    assert_relative_eq!(max.y, 1.22 + 0.65 * 0.75, epsilon = 1e-5);
}

#[test]
fn semi_house_is_twice_as_long() {
    let builder = SceneBuilder::village();
    let (detached_min, detached_max) = builder.build_house(1).unwrap().bounds().unwrap();
    let (semi_min, semi_max) = builder.build_house(2).unwrap().bounds().unwrap();

    assert_relative_eq!(
        semi_max.x - semi_min.x,
        2.0 * (detached_max.x - detached_min.x),
        epsilon = 1e-5
    );
    assert_relative_eq!(semi_max.z - semi_min.z, detached_max.z - detached_min.z, epsilon = 1e-5);
}

#[test]
fn unsupported_widths_are_rejected() {
    let builder = SceneBuilder::village();
    assert!(builder.build_box(0).is_err());
    assert!(builder.build_box(3).is_err());
    assert!(builder.build_roof(3).is_err());
    assert!(builder.build_house(3).is_err());
}

#[test]
fn ground_matches_its_builder() {
    for (builder, size) in [(SceneBuilder::village(), 16.0), (SceneBuilder::single_house(), 10.0)] {
        let ground = builder.build_ground();
        let (min, max) = ground.bounds().unwrap();

        assert_relative_eq!(max.x - min.x, size);
        assert_relative_eq!(max.z - min.z, size);
        assert_relative_eq!(min.y, 0.0);
        assert_relative_eq!(max.y, 0.0);
        assert!(ground.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
        assert_eq!(ground.materials, vec![MaterialDesc::new("groundMat", FLOOR_TEXTURE)]);
    }
}

#[test]
fn building_twice_gives_identical_meshes() {
    let builder = SceneBuilder::village();
    assert_eq!(builder.build_house(2).unwrap(), builder.build_house(2).unwrap());
    assert_eq!(builder.build_ground(), builder.build_ground());
}

#[test]
fn merge_offsets_indices_and_materials() {
    let a = primitives::cuboid("a", Vector3::new(1.0, 1.0, 1.0), [FaceUv::FULL; 6])
        .with_material(MaterialDesc::new("a", "a.png"));
    let mut b = primitives::cuboid("b", Vector3::new(1.0, 1.0, 1.0), [FaceUv::FULL; 6])
        .with_material(MaterialDesc::new("b", "b.png"));
    b.transform.position.x = 3.0;

    let merged = MeshData::merge("ab", [a, b]);

    assert_eq!(merged.vertex_count(), 48);
    assert_eq!(merged.indices.len(), 72);
    assert_eq!(merged.indices[36], 24);
    assert_eq!(merged.sub_meshes[1].indices, 36..72);
    assert_eq!(merged.sub_meshes[1].material, 1);
    let (min, max) = merged.bounds().unwrap();
    assert_relative_eq!(min.x, -0.5);
    assert_relative_eq!(max.x, 3.5);
}

#[test]
fn cylinder_with_three_sides_is_a_capped_prism() {
    let prism = primitives::cylinder("prism", 1.3, 1.2, 3);

    assert_eq!(prism.vertex_count(), 3 * 4 + 2 * 4);
    assert_eq!(prism.indices.len(), 3 * 6 + 2 * 3 * 3);
    // First ring vertex on +X.
    assert_relative_eq!(prism.vertices[0].position[0], 0.65);
    assert_relative_eq!(prism.vertices[0].position[2], 0.0);
}
