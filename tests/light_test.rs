use approx::assert_relative_eq;
use hamlet::pipelines::light::LightUniform;

#[test]
fn default_light_shines_from_above_and_the_side() {
    let light = LightUniform::default();
    let d = std::f32::consts::FRAC_1_SQRT_2;

    assert_relative_eq!(light.direction[0], d, epsilon = 1e-6);
    assert_relative_eq!(light.direction[1], d, epsilon = 1e-6);
    assert_relative_eq!(light.direction[2], 0.0);
    assert_eq!(light.sky_colour, [1.0, 1.0, 1.0]);
    assert_eq!(light.ground_colour, [0.0, 0.0, 0.0]);
}

#[test]
fn degenerate_direction_points_up() {
    let light = LightUniform::hemispheric([0.0; 3], [1.0; 3], [0.0; 3]);
    assert_eq!(light.direction, [0.0, 1.0, 0.0]);
}

#[test]
fn uniform_is_padded_to_vec4_rows() {
    assert_eq!(std::mem::size_of::<LightUniform>(), 48);
}
