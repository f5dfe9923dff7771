//! Fixed perspective camera.

use glam::{Mat4, Vec2, Vec3};

/// Perspective camera looking at the origin from +Z.
pub struct Camera {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Viewport width / height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Eye position.
    pub position: Vec3,
}

impl Camera {
    /// 75° fov, clip range 0.1..1000, eye at `(0, 0, 300)`.
    pub fn new(aspect: f32) -> Self {
        Self {
            fov_y: 75.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 300.0),
        }
    }

    /// Update the aspect ratio from a viewport size. Zero-sized viewports are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Clip-space units per view-space unit along X and Y, before the
    /// perspective divide. Used to size sprites in world units.
    pub fn projection_scale(&self) -> Vec2 {
        let proj = self.projection_matrix();
        Vec2::new(proj.x_axis.x, proj.y_axis.y)
    }
}
