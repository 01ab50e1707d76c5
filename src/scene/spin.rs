use std::f32::consts::TAU;

use instant::Duration;

/// Constant angular velocity in revolutions per minute.
///
/// The angle per frame is derived from the measured frame time, so the
/// rotation speed does not depend on the frame rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spin {
    pub rpm: f32,
}

impl Spin {
    pub fn new(rpm: f32) -> Self {
        Self { rpm }
    }

    /// Radians to turn for a frame that took `dt`.
    pub fn angle(&self, dt: Duration) -> f32 {
        (self.rpm / 60.0) * TAU * dt.as_secs_f32()
    }

    pub fn advance(&self, y_rotation: &mut f32, dt: Duration) {
        *y_rotation += self.angle(dt);
    }
}
