//! Per-frame particle motion.
//!
//! Every frame each particle moves by its own velocity plus a slow sine
//! drift, is pushed away from the pointer when it is close, and wraps to the
//! opposite face of the bounding box when it leaves it. The whole cloud also
//! turns very slowly around X and Y.

use glam::{EulerRot, Mat4, Vec2, Vec3};

use crate::options::BackgroundOptions;
use crate::topology::ParticleCloud;

/// Half extents of the wrap box.
pub const WRAP_BOUNDS: Vec3 = Vec3::new(600.0, 500.0, 300.0);

/// World units per NDC unit when projecting the pointer into the scene.
pub const POINTER_SCALE: f32 = 300.0;

/// Pointer repulsion radius in world units.
pub const REPEL_RADIUS: f32 = 150.0;

const TIME_STEP: f32 = 0.005;
const ROTATION_RATE: Vec2 = Vec2::new(0.0001, 0.0002);

/// Animation clock and accumulated cloud rotation.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    time: f32,
    /// Rotation about X (`x`) and Y (`y`) in radians.
    rotation: Vec2,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drift clock. Advances `0.005 * animation_speed` per frame.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    /// Advance one frame.
    ///
    /// `pointer` is the eased pointer position in NDC.
    pub fn step(&mut self, cloud: &mut ParticleCloud, pointer: Vec2, options: &BackgroundOptions) {
        let speed = options.animation_speed;
        self.time += TIME_STEP * speed;
        let t = self.time;

        let mouse = (pointer * POINTER_SCALE).extend(0.0);

        for (i, (position, velocity)) in cloud
            .positions
            .iter_mut()
            .zip(cloud.velocities.iter())
            .enumerate()
        {
            let fi = i as f32;
            let drift = Vec3::new(
                (t + fi * 0.02).sin() * 0.3,
                (t + fi * 0.015).cos() * 0.2,
                (t * 0.5 + fi * 0.01).sin() * 0.1,
            );
            *position += *velocity * speed + drift;

            if options.mouse_interaction {
                repel(position, mouse);
            }

            *position = wrap(*position);
        }

        self.rotation += ROTATION_RATE * speed;
    }

    /// Model matrix for the particle cloud.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, 0.0)
    }
}

/// Push `position` away from `mouse` in the XY plane.
fn repel(position: &mut Vec3, mouse: Vec3) {
    let distance = position.distance(mouse);
    if distance < REPEL_RADIUS {
        let force = (REPEL_RADIUS - distance) / REPEL_RADIUS * 0.5;
        let direction = (*position - mouse).normalize_or_zero();
        position.x += direction.x * force * 0.5;
        position.y += direction.y * force * 0.5;
    }
}

/// Teleport to the opposite face when past a face of the wrap box.
fn wrap(mut p: Vec3) -> Vec3 {
    for axis in 0..3 {
        let bound = WRAP_BOUNDS[axis];
        if p[axis] > bound {
            p[axis] = -bound;
        }
        if p[axis] < -bound {
            p[axis] = bound;
        }
    }
    p
}
