//! # topobg - Topology particle background
//!
//! A slowly drifting cloud of particles arranged as a clustered node graph,
//! rendered with wgpu into a transparent window.
//!
//! topobg generates the layout once, links nearby nodes with faint lines and
//! then animates the particles every frame: a gentle drift, repulsion from
//! the pointer and a very slow rotation of the whole cloud.
//!
//! ## Quick Start
//!
//! ```ignore
//! use topobg::prelude::*;
//!
//! fn main() -> Result<(), BackgroundError> {
//!     Background::new(BackgroundOptions {
//!         particle_count: 300,
//!         ..Default::default()
//!     })
//!     .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Nodes
//!
//! Every particle gets a random importance. Above 0.8 it is a **hub**
//! (large, near white-cyan), above 0.6 a **connector** (medium, teal),
//! otherwise a **regular** node (small, soft blue). See [`NodeKind`].
//!
//! ### Connections
//!
//! On desktop, nearby nodes are linked once at startup by a greedy,
//! priority-ranked pass. Lines are a static snapshot: they do not follow the
//! particles as they drift. See [`build_connections`].
//!
//! ### Mobile profile
//!
//! [`BackgroundOptions::mobile`] trades density for speed: fewer particles,
//! no lines, no antialiasing, and touch instead of mouse tracking.
//!
//! ## Headless use
//!
//! [`Scene`] holds all CPU-side state and runs without a window, which is
//! how the tests drive it:
//!
//! ```ignore
//! let mut scene = Scene::new(&BackgroundOptions::default(), &mut SpawnContext::seeded(7));
//! scene.pointer.move_to(400.0, 300.0);
//! scene.frame();
//! ```

pub mod animate;
mod background;
pub mod clock;
pub mod connections;
pub mod error;
pub mod gpu;
pub mod input;
pub mod options;
pub mod scene;
pub mod spawn;
pub mod topology;

pub use animate::Animator;
pub use background::Background;
pub use clock::FrameClock;
pub use connections::{build_connections, Connection, LineVertex};
pub use error::{BackgroundError, ConfigError, GpuError};
pub use glam::{Vec2, Vec3, Vec4};
pub use gpu::check_gpu_support;
pub use input::{Pointer, PointerSource};
pub use options::BackgroundOptions;
pub use scene::Scene;
pub use spawn::SpawnContext;
pub use topology::{Node, NodeKind, ParticleCloud};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use topobg::prelude::*;
/// ```
///
/// This imports:
/// - [`Background`] - the windowed runner
/// - [`BackgroundOptions`] - configuration
/// - [`Scene`] and [`SpawnContext`] - headless state and its RNG
/// - [`BackgroundError`] - the error returned by [`Background::run`]
/// - [`Vec2`], [`Vec3`], [`Vec4`] - glam vector types
pub mod prelude {
    pub use crate::background::Background;
    pub use crate::error::BackgroundError;
    pub use crate::options::BackgroundOptions;
    pub use crate::scene::Scene;
    pub use crate::spawn::SpawnContext;
    pub use crate::{Vec2, Vec3, Vec4};
}
