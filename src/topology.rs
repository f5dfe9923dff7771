//! Topology generator.
//!
//! Places particles into angular clusters around the origin and ranks each
//! one as a hub, connector or regular node. The rank drives size, color and
//! later the connection priority.
//!
//! # Layout
//!
//! Particles are split into [`CLUSTER_COUNT`] contiguous index ranges. Each
//! range gets an angle on the unit circle; every particle in it sits at a
//! random distance along that angle plus a random local offset, with a random
//! depth.
//!
//! ```text
//!          cluster 2
//!             ..
//!  cluster 4 .  . cluster 0     radius 200..500, local offset < 120
//!             ..
//!          cluster 6
//! ```

use crate::options::BackgroundOptions;
use crate::spawn::SpawnContext;
use crate::Vec3;
use std::f32::consts::TAU;

/// Number of angular clusters.
pub const CLUSTER_COUNT: u32 = 8;

/// Importance tier of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Top ~20%: large, bright, most links.
    Hub,
    /// Next ~20%: mid-size, bridges hubs and regular nodes.
    Connector,
    /// Everything else.
    Regular,
}

impl NodeKind {
    /// Classify from an importance score in `[0, 1)`.
    pub fn from_importance(importance: f32) -> Self {
        if importance > 0.8 {
            NodeKind::Hub
        } else if importance > 0.6 {
            NodeKind::Connector
        } else {
            NodeKind::Regular
        }
    }

    /// Per-kind ceiling on links this node may start.
    pub fn link_cap(self) -> u32 {
        match self {
            NodeKind::Hub => 4,
            NodeKind::Connector => 3,
            NodeKind::Regular => 2,
        }
    }

    /// Rendered size in world units.
    pub fn size(self, is_mobile: bool) -> f32 {
        match (self, is_mobile) {
            (NodeKind::Hub, false) => 8.0,
            (NodeKind::Hub, true) => 6.0,
            (NodeKind::Connector, false) => 6.0,
            (NodeKind::Connector, true) => 4.0,
            (NodeKind::Regular, false) => 4.0,
            (NodeKind::Regular, true) => 2.0,
        }
    }
}

/// Per-particle topology data.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub index: usize,
    pub kind: NodeKind,
    pub importance: f32,
    pub cluster: u32,
    /// Links touching this node. Filled in by the connection builder.
    pub connections: u32,
}

/// The particle cloud as parallel arrays.
///
/// All vectors have the same length; index `i` in each describes particle `i`.
#[derive(Debug, Clone, Default)]
pub struct ParticleCloud {
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub sizes: Vec<f32>,
    pub nodes: Vec<Node>,
}

impl ParticleCloud {
    /// Generate a cloud of `options.particle_count` particles.
    ///
    /// `options` should already be [resolved](BackgroundOptions::resolved).
    pub fn generate(options: &BackgroundOptions, ctx: &mut SpawnContext) -> Self {
        let count = options.particle_count as usize;
        let per_cluster = options.particle_count as f32 / CLUSTER_COUNT as f32;

        let mut cloud = Self {
            positions: Vec::with_capacity(count),
            velocities: Vec::with_capacity(count),
            colors: Vec::with_capacity(count),
            sizes: Vec::with_capacity(count),
            nodes: Vec::with_capacity(count),
        };

        for i in 0..count {
            let cluster = cluster_for(i, per_cluster);
            let cluster_angle = cluster as f32 / CLUSTER_COUNT as f32 * TAU;
            let cluster_radius = ctx.random_range(200.0, 500.0);

            let local = ctx.random_in_disc(120.0);
            let position = Vec3::new(
                cluster_angle.cos() * cluster_radius + local.x,
                cluster_angle.sin() * cluster_radius + local.y,
                ctx.random_centered(300.0),
            );

            let velocity = Vec3::new(
                ctx.random_centered(0.2),
                ctx.random_centered(0.2),
                ctx.random_centered(0.1),
            );

            let importance = ctx.random();
            let kind = NodeKind::from_importance(importance);

            cloud.positions.push(position);
            cloud.velocities.push(velocity);
            cloud.colors.push(node_color(kind, ctx));
            cloud.sizes.push(kind.size(options.is_mobile));
            cloud.nodes.push(Node {
                index: i,
                kind,
                importance,
                cluster,
                connections: 0,
            });
        }

        cloud
    }

    /// Number of particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the cloud has no particles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Count nodes of the given kind.
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }
}

fn cluster_for(index: usize, per_cluster: f32) -> u32 {
    let cluster = (index as f32 / per_cluster).floor() as u32;
    cluster.min(CLUSTER_COUNT - 1)
}

/// Tinted color for a node kind: hubs near white-cyan, connectors teal,
/// regular nodes soft blue/purple.
fn node_color(kind: NodeKind, ctx: &mut SpawnContext) -> Vec3 {
    match kind {
        NodeKind::Hub => Vec3::new(0.8 + ctx.random() * 0.2, 0.9 + ctx.random() * 0.1, 1.0),
        NodeKind::Connector => Vec3::new(
            0.1 + ctx.random() * 0.2,
            0.7 + ctx.random() * 0.2,
            0.9 + ctx.random() * 0.1,
        ),
        NodeKind::Regular => Vec3::new(
            0.3 + ctx.random() * 0.3,
            0.4 + ctx.random() * 0.3,
            0.8 + ctx.random() * 0.2,
        ),
    }
}
