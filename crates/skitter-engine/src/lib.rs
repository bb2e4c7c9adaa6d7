//! skitter-engine — simulation driver and renderer for the skitter client.
//!
//! Builds on [`skitter_world`] (the entity arena) with a rapier2d physics
//! wrapper, the hostiles' random-impulse behavior, and a fixed-timestep
//! [`Stage`](stage::Stage) loop that keeps sprites synchronized with bodies
//! and processes removals at frame boundaries. The wgpu renderer is gated
//! behind the `renderer` feature so headless builds stay GPU-free.
//!
//! # Quick Start
//!
//! ```
//! use skitter_engine::prelude::*;
//!
//! let mut stage = Stage::new(StageConfig {
//!     seed: Some(1),
//!     ..Default::default()
//! });
//!
//! stage.spawn_wall([400.0, 10.0], [800.0, 20.0]);
//! stage.spawn_hostile_ball([400.0, 300.0], 40.0);
//!
//! stage.advance_frames(60);
//! assert_eq!(stage.frame_count(), 60);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod jitter;
pub mod logging;
pub mod physics;
pub mod render;
pub mod stage;
pub mod units;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the arena crate for convenience.
pub use skitter_world;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Arena types.
    pub use skitter_world::prelude::*;

    // Engine-specific exports.
    pub use crate::config::{ConfigError, GameConfig, WindowConfig};
    pub use crate::jitter::{JitterImpulse, DEFAULT_JITTER_LIMIT};
    pub use crate::physics::{filter_for, BodyTransform, PhysicsWorld, NPC_GROUP, PLAYER_GROUP};
    pub use crate::stage::{Stage, StageConfig};
    pub use crate::units::{meter_to_pixel, pixel_to_meter, PIXELS_PER_METER};
}
