//! Connection builder.
//!
//! Links nearby particles into a sparse graph. Each particle in index order
//! scores the later, unsaturated particles within `connection_distance` and
//! greedily links the best ones:
//!
//! | factor | multiplier |
//! |--------|-----------|
//! | base | `1 - distance / connection_distance` |
//! | hub–connector or connector–regular pair | `1.5` |
//! | same cluster | `1.2` |
//! | neighbor importance | `importance + 0.5` |
//!
//! A node never ends up with more than `max_connections` links, and it starts
//! at most [`NodeKind::link_cap`] links of its own.

use bytemuck::{Pod, Zeroable};
use std::cmp::Ordering;

use crate::options::BackgroundOptions;
use crate::topology::{NodeKind, ParticleCloud};
use crate::{Vec3, Vec4};

/// Multiplier on priority that becomes the line alpha.
const ALPHA_SCALE: f32 = 0.6;

/// A link between two particles, `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub a: usize,
    pub b: usize,
    pub priority: f32,
    /// RGBA line color; alpha scales with priority.
    pub color: Vec4,
}

/// One end of a line segment, laid out for the line vertex buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

struct Candidate {
    index: usize,
    priority: f32,
}

/// Build the connection graph for `cloud`.
///
/// Resets and then fills in every node's `connections` counter.
pub fn build_connections(cloud: &mut ParticleCloud, options: &BackgroundOptions) -> Vec<Connection> {
    let max = options.max_connections;
    let threshold = options.connection_distance;
    let count = cloud.len();

    for node in &mut cloud.nodes {
        node.connections = 0;
    }

    let mut links = Vec::new();
    let mut candidates = Vec::new();

    for i in 0..count {
        if cloud.nodes[i].connections >= max {
            continue;
        }
        let pos_a = cloud.positions[i];
        let kind_a = cloud.nodes[i].kind;
        let cluster_a = cloud.nodes[i].cluster;

        candidates.clear();
        for j in (i + 1)..count {
            let node_b = &cloud.nodes[j];
            if node_b.connections >= max {
                continue;
            }

            let distance = pos_a.distance(cloud.positions[j]);
            if distance < threshold {
                let mut priority = 1.0 - distance / threshold;
                if pairing_bonus(kind_a, node_b.kind) {
                    priority *= 1.5;
                }
                if cluster_a == node_b.cluster {
                    priority *= 1.2;
                }
                priority *= node_b.importance + 0.5;

                candidates.push(Candidate { index: j, priority });
            }
        }

        // Stable, so equal priorities keep index order
        candidates.sort_by(|x, y| y.priority.partial_cmp(&x.priority).unwrap_or(Ordering::Equal));

        let limit = (max - cloud.nodes[i].connections).min(kind_a.link_cap()) as usize;

        for candidate in candidates.iter().take(limit) {
            let j = candidate.index;
            let kind_b = cloud.nodes[j].kind;

            links.push(Connection {
                a: i,
                b: j,
                priority: candidate.priority,
                color: link_color(kind_a, kind_b).extend(candidate.priority * ALPHA_SCALE),
            });

            cloud.nodes[i].connections += 1;
            cloud.nodes[j].connections += 1;

            if cloud.nodes[j].connections >= max {
                break;
            }
        }
    }

    links
}

/// Two vertices per connection, at the given positions.
pub fn line_vertices(connections: &[Connection], positions: &[Vec3]) -> Vec<LineVertex> {
    connections
        .iter()
        .flat_map(|c| {
            let color = c.color.to_array();
            [
                LineVertex {
                    position: positions[c.a].to_array(),
                    color,
                },
                LineVertex {
                    position: positions[c.b].to_array(),
                    color,
                },
            ]
        })
        .collect()
}

/// Hub–connector and connector–regular pairs, in either order.
fn pairing_bonus(a: NodeKind, b: NodeKind) -> bool {
    matches!(
        (a, b),
        (NodeKind::Hub, NodeKind::Connector)
            | (NodeKind::Connector, NodeKind::Hub)
            | (NodeKind::Connector, NodeKind::Regular)
            | (NodeKind::Regular, NodeKind::Connector)
    )
}

fn link_color(a: NodeKind, b: NodeKind) -> Vec3 {
    if a == NodeKind::Hub || b == NodeKind::Hub {
        Vec3::new(0.2, 0.8, 1.0)
    } else if a == NodeKind::Connector || b == NodeKind::Connector {
        Vec3::new(0.1, 0.7, 0.9)
    } else {
        Vec3::new(0.3, 0.5, 0.8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Node;

    fn cloud_from(points: &[(Vec3, NodeKind, f32, u32)]) -> ParticleCloud {
        let mut cloud = ParticleCloud::default();
        for (i, &(pos, kind, importance, cluster)) in points.iter().enumerate() {
            cloud.positions.push(pos);
            cloud.velocities.push(Vec3::ZERO);
            cloud.colors.push(Vec3::ONE);
            cloud.sizes.push(kind.size(false));
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

    #[test]
    fn test_pairing_bonus_is_symmetric() {
        assert!(pairing_bonus(NodeKind::Hub, NodeKind::Connector));
        assert!(pairing_bonus(NodeKind::Regular, NodeKind::Connector));
        assert!(!pairing_bonus(NodeKind::Hub, NodeKind::Hub));
        assert!(!pairing_bonus(NodeKind::Hub, NodeKind::Regular));
        assert!(!pairing_bonus(NodeKind::Regular, NodeKind::Regular));
    }

    #[test]
    fn test_link_color_precedence() {
        assert_eq!(link_color(NodeKind::Regular, NodeKind::Hub), Vec3::new(0.2, 0.8, 1.0));
        assert_eq!(link_color(NodeKind::Connector, NodeKind::Regular), Vec3::new(0.1, 0.7, 0.9));
        assert_eq!(link_color(NodeKind::Regular, NodeKind::Regular), Vec3::new(0.3, 0.5, 0.8));
    }

    #[test]
    fn test_priority_formula() {
        // Hub at origin, connector 90 units away, same cluster, importance 0.7
        let mut cloud = cloud_from(&[
            (Vec3::ZERO, NodeKind::Hub, 0.9, 0),
            (Vec3::new(90.0, 0.0, 0.0), NodeKind::Connector, 0.7, 0),
        ]);
        let links = build_connections(&mut cloud, &BackgroundOptions::default());

        assert_eq!(links.len(), 1);
        let expected = 0.5 * 1.5 * 1.2 * 1.2;
        assert!((links[0].priority - expected).abs() < 1e-5);
        assert!((links[0].color.w - expected * ALPHA_SCALE).abs() < 1e-5);
    }

    #[test]
    fn test_out_of_range_not_linked() {
        let mut cloud = cloud_from(&[
            (Vec3::ZERO, NodeKind::Hub, 0.9, 0),
            (Vec3::new(180.0, 0.0, 0.0), NodeKind::Hub, 0.9, 0),
        ]);
        let links = build_connections(&mut cloud, &BackgroundOptions::default());
        assert!(links.is_empty());
    }

    #[test]
    fn test_regular_node_starts_at_most_two_links() {
        let mut points = vec![(Vec3::ZERO, NodeKind::Regular, 0.1, 0)];
        for k in 1..6 {
            points.push((Vec3::new(k as f32 * 10.0, 0.0, 0.0), NodeKind::Regular, 0.1, 0));
        }
        let mut cloud = cloud_from(&points);
        let links = build_connections(&mut cloud, &BackgroundOptions::default());

        let from_first = links.iter().filter(|c| c.a == 0).count();
        assert_eq!(from_first, 2);
        // Closest neighbors win
        assert_eq!(links[0].b, 1);
        assert_eq!(links[1].b, 2);
    }

    #[test]
    fn test_stops_when_neighbor_saturates() {
        // Node 2 is already linked to node 0, so the hub's first link fills it
        // up and the hub never reaches node 3
        let mut cloud = cloud_from(&[
            (Vec3::ZERO, NodeKind::Regular, 0.1, 0),
            (Vec3::new(300.0, 0.0, 0.0), NodeKind::Hub, 0.9, 0),
            (Vec3::new(150.0, 0.0, 0.0), NodeKind::Regular, 0.9, 0),
            (Vec3::new(460.0, 0.0, 0.0), NodeKind::Regular, 0.1, 1),
        ]);
        let opts = BackgroundOptions {
            max_connections: 2,
            ..Default::default()
        };
        let links = build_connections(&mut cloud, &opts);

        let pairs: Vec<_> = links.iter().map(|c| (c.a, c.b)).collect();
        assert_eq!(pairs, vec![(0, 2), (1, 2)]);
        assert_eq!(cloud.nodes[2].connections, 2);
        assert_eq!(cloud.nodes[3].connections, 0);
    }

    #[test]
    fn test_line_vertices_pairs() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let links = vec![Connection {
            a: 0,
            b: 2,
            priority: 0.5,
            color: Vec4::new(0.3, 0.5, 0.8, 0.3),
        }];
        let verts = line_vertices(&links, &positions);
        assert_eq!(verts.len(), 2);
        assert_eq!(verts[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(verts[1].position, [0.0, 1.0, 0.0]);
        assert_eq!(verts[0].color, verts[1].color);
    }
}
