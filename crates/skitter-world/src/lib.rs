//! skitter-world — entity arena and sprite storage for the skitter client.
//!
//! Entities are records in a generational slot arena: a kind tag, an optional
//! key into the world-owned sprite pool, and a removal flag. Removal is
//! queued and processed at frame boundaries rather than scattered across the
//! frame; see [`World::drain_removals`](entity::World::drain_removals).
//!
//! This crate is storage only — no physics, no GPU. The simulation driver
//! and renderer live in `skitter-engine`.
//!
//! # Quick Start
//!
//! ```
//! use skitter_world::prelude::*;
//!
//! let mut world = World::new();
//! let hostile = world.spawn_with_sprite(EntityKind::Hostile, Sprite::new(40.0, 40.0));
//!
//! world.flag_for_removal(hostile).unwrap();
//! assert!(world.is_flagged_for_removal(hostile));
//!
//! // Nothing is destroyed until the frame boundary.
//! assert!(world.is_alive(hostile));
//! let removed = world.drain_removals();
//! assert_eq!(removed.len(), 1);
//! assert!(!world.is_alive(hostile));
//! ```

#![deny(unsafe_code)]

pub mod entity;
pub mod sprite;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by arena operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The entity handle is stale (despawned or never allocated).
    #[error("entity {entity} is stale (despawned or never allocated)")]
    StaleEntity {
        /// The offending handle.
        entity: entity::EntityId,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::entity::{EntityId, EntityKind, EntityRecord, World};
    pub use crate::sprite::{Sprite, SpriteKey, SpritePool};
    pub use crate::WorldError;
}
