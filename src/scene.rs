//! CPU-side state of the background.
//!
//! A [`Scene`] owns the particle cloud, its connection graph, the animator
//! and the pointer. It knows nothing about windows or GPUs, so the whole
//! frame update can run headless.

use glam::Mat4;

use crate::animate::Animator;
use crate::connections::{build_connections, line_vertices, Connection, LineVertex};
use crate::input::{Pointer, PointerSource};
use crate::options::BackgroundOptions;
use crate::spawn::SpawnContext;
use crate::topology::ParticleCloud;

pub struct Scene {
    options: BackgroundOptions,
    pub cloud: ParticleCloud,
    pub connections: Vec<Connection>,
    pub animator: Animator,
    pub pointer: Pointer,
}

impl Scene {
    /// Generate the cloud and, on desktop, its connections.
    ///
    /// `options` are resolved here; callers may pass raw options.
    pub fn new(options: &BackgroundOptions, ctx: &mut SpawnContext) -> Self {
        let options = options.resolved();
        let mut cloud = ParticleCloud::generate(&options, ctx);

        let connections = if options.draws_connections() {
            build_connections(&mut cloud, &options)
        } else {
            Vec::new()
        };

        tracing::debug!(
            particles = cloud.len(),
            connections = connections.len(),
            mobile = options.is_mobile,
            "topology generated"
        );

        Self {
            options,
            cloud,
            connections,
            animator: Animator::new(),
            pointer: Pointer::new(),
        }
    }

    /// Resolved options in effect.
    pub fn options(&self) -> &BackgroundOptions {
        &self.options
    }

    /// Which events drive the pointer, or `None` when interaction is off.
    pub fn pointer_source(&self) -> Option<PointerSource> {
        match (self.options.mouse_interaction, self.options.is_mobile) {
            (false, _) => None,
            (true, false) => Some(PointerSource::Mouse),
            (true, true) => Some(PointerSource::Touch),
        }
    }

    /// Advance one frame: ease the pointer, then move the particles.
    pub fn frame(&mut self) {
        self.pointer.smooth();
        self.animator
            .step(&mut self.cloud, self.pointer.current(), &self.options);
    }

    /// Model matrix for the particle cloud.
    pub fn model_matrix(&self) -> Mat4 {
        self.animator.model_matrix()
    }

    /// Line geometry at the positions the graph was built from.
    pub fn line_vertices(&self) -> Vec<LineVertex> {
        line_vertices(&self.connections, &self.cloud.positions)
    }
}
