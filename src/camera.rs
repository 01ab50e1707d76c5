//! Arc-rotate camera, its mouse controller and the projection.
//!
//! The camera orbits a target point at a given radius. `alpha` is the
//! longitudinal angle around the vertical axis and `beta` the latitudinal
//! angle measured from the vertical axis.

use std::f32::consts::PI;

use cgmath::{Matrix4, Point3, Rad, Vector3, perspective};
use winit::event::{MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const BETA_LIMIT: f32 = 0.01;
const MIN_RADIUS: f32 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub alpha: Rad<f32>,
    pub beta: Rad<f32>,
    pub radius: f32,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<A: Into<Rad<f32>>, B: Into<Rad<f32>>>(
        alpha: A,
        beta: B,
        radius: f32,
        target: Point3<f32>,
    ) -> Self {
        let mut camera = Self {
            alpha: alpha.into(),
            beta: beta.into(),
            radius,
            target,
        };
        camera.clamp();
        camera
    }

    pub fn position(&self) -> Point3<f32> {
        let (sin_beta, cos_beta) = self.beta.0.sin_cos();
        let (sin_alpha, cos_alpha) = self.alpha.0.sin_cos();
        self.target
            + Vector3::new(
                self.radius * cos_alpha * sin_beta,
                self.radius * cos_beta,
                self.radius * sin_alpha * sin_beta,
            )
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position(), self.target, Vector3::unit_y())
    }

    fn clamp(&mut self) {
        self.beta = Rad(self.beta.0.clamp(BETA_LIMIT, PI - BETA_LIMIT));
        self.radius = self.radius.max(MIN_RADIUS);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Rad(-PI / 2.0), Rad(PI / 2.5), 15.0, Point3::new(0.0, 0.0, 0.0))
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Collects mouse input between frames and applies it to a [`Camera`].
#[derive(Debug)]
pub struct CameraController {
    rotate_speed: f32,
    zoom_speed: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
        }
    }

    /// Mouse motion while dragging, in pixels. `rotate_speed` is in radians
    /// per pixel.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.rotate_horizontal += dx as f32;
        self.rotate_vertical += dy as f32;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            self.scroll += match delta {
                MouseScrollDelta::LineDelta(_, lines) => *lines,
                MouseScrollDelta::PixelDelta(position) => position.y as f32 / 50.0,
            };
        }
    }

    /// Apply the input gathered since the last call. Rotation follows the
    /// pointer distance, not the frame time.
    pub fn update(&mut self, camera: &mut Camera) {
        camera.alpha -= Rad(self.rotate_horizontal * self.rotate_speed);
        camera.beta -= Rad(self.rotate_vertical * self.rotate_speed);
        camera.radius -= self.scroll * self.zoom_speed * camera.radius * 0.1;
        camera.clamp();

        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
        self.scroll = 0.0;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    /// Push the current camera state to the GPU.
    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

