//! Fixed-timestep frame loop coordinating entities, physics, and sprites.
//!
//! The [`Stage`] drives the client simulation forward. Each
//! [`advance`](Stage::advance):
//!
//! 1. Behavior phase — every hostile's jitter impulse is applied to its body.
//! 2. Physics phase — rapier steps by the fixed dt.
//! 3. Sprite-sync phase — every body's transform is copied to its sprite
//!    (translation meters→pixels, rotation verbatim).
//! 4. Removal phase — the world's removal queue is drained; bodies are
//!    unregistered and jitter sources dropped. Destruction happens here and
//!    only here.
//!
//! Single-threaded and frame-synchronous: there are no suspension points and
//! no locks. Sim time is computed as `frames * fixed_dt`, never accumulated,
//! so it cannot drift.
//!
//! # Example
//!
//! ```
//! use skitter_engine::stage::{Stage, StageConfig};
//!
//! let mut stage = Stage::new(StageConfig::default());
//! let hostile = stage.spawn_hostile_ball([400.0, 300.0], 40.0);
//!
//! stage.advance_frames(10);
//! assert_eq!(stage.frame_count(), 10);
//!
//! stage.world_mut().flag_for_removal(hostile).unwrap();
//! stage.advance();
//! assert!(!stage.world().is_alive(hostile));
//! ```

use std::collections::BTreeMap;

use skitter_world::entity::{EntityId, EntityKind, World};
use skitter_world::sprite::Sprite;

use crate::jitter::{JitterImpulse, DEFAULT_JITTER_LIMIT};
use crate::physics::PhysicsWorld;
use crate::units::{meter_to_pixel, pixel_to_meter};

// ---------------------------------------------------------------------------
// Sprite tints per kind
// ---------------------------------------------------------------------------

/// Blue for the player: #4488FF.
const TINT_PLAYER: [f32; 4] = [0.267, 0.533, 1.0, 1.0];

/// Orange-red for hostiles: #FF5533.
const TINT_HOSTILE: [f32; 4] = [1.0, 0.333, 0.2, 1.0];

/// Gray for walls: #888888.
const TINT_WALL: [f32; 4] = [0.533, 0.533, 0.533, 1.0];

// ---------------------------------------------------------------------------
// StageConfig
// ---------------------------------------------------------------------------

/// Configuration for the stage loop.
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Fixed time step in seconds per frame. Must be positive and finite.
    pub fixed_dt: f32,
    /// Gravity vector in m/s². Zero for a top-down arena.
    pub gravity: [f32; 2],
    /// Per-axis bound of the hostile jitter impulse.
    pub jitter_limit: f32,
    /// Base RNG seed. When set, each hostile's jitter source is seeded from
    /// this value and the entity id, making runs reproducible. When unset,
    /// sources are entropy-seeded.
    pub seed: Option<u64>,
}

impl Default for StageConfig {
    /// 60 Hz, zero gravity, default jitter, entropy seeding.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            gravity: [0.0, 0.0],
            jitter_limit: DEFAULT_JITTER_LIMIT,
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The frame-synchronous simulation driver.
///
/// Owns the entity arena, the physics world, and the per-hostile jitter
/// sources. Spawn helpers build the entity + body + sprite triple in one
/// call, taking pixel-space geometry (the coordinate system callers see) and
/// converting to meters at the physics boundary.
pub struct Stage {
    world: World,
    physics: PhysicsWorld,
    /// Jitter sources keyed by raw entity id. BTreeMap so the behavior phase
    /// visits hostiles in a fixed order.
    jitters: BTreeMap<u64, JitterImpulse>,
    config: StageConfig,
    frame: u64,
}

impl Stage {
    /// Create an empty stage.
    ///
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite.
    pub fn new(config: StageConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        Self {
            world: World::new(),
            physics: PhysicsWorld::new(config.gravity[0], config.gravity[1]),
            jitters: BTreeMap::new(),
            config,
            frame: 0,
        }
    }

    // -- spawning -----------------------------------------------------------

    /// Spawn a rectangular hostile centered at `center_px`, `size_px` wide
    /// and tall, with a dynamic body and a jitter source.
    pub fn spawn_hostile_box(&mut self, center_px: [f32; 2], size_px: [f32; 2]) -> EntityId {
        let id = self.spawn_with_sprite(EntityKind::Hostile, center_px, size_px, TINT_HOSTILE);
        self.physics.spawn_dynamic_box(
            id,
            [pixel_to_meter(center_px[0]), pixel_to_meter(center_px[1])],
            [
                pixel_to_meter(size_px[0]) / 2.0,
                pixel_to_meter(size_px[1]) / 2.0,
            ],
            EntityKind::Hostile,
        );
        self.attach_jitter(id);
        tracing::debug!(entity = %id, "spawned hostile box");
        id
    }

    /// Spawn a circular hostile centered at `center_px` with the given
    /// diameter, with a dynamic ball body and a jitter source.
    pub fn spawn_hostile_ball(&mut self, center_px: [f32; 2], diameter_px: f32) -> EntityId {
        let id = self.spawn_with_sprite(
            EntityKind::Hostile,
            center_px,
            [diameter_px, diameter_px],
            TINT_HOSTILE,
        );
        self.physics.spawn_dynamic_ball(
            id,
            [pixel_to_meter(center_px[0]), pixel_to_meter(center_px[1])],
            pixel_to_meter(diameter_px) / 2.0,
            EntityKind::Hostile,
        );
        self.attach_jitter(id);
        tracing::debug!(entity = %id, "spawned hostile ball");
        id
    }

    /// Spawn the player as a dynamic rectangular body. No jitter — player
    /// motion comes from outside (input), via impulses on the physics world.
    pub fn spawn_player(&mut self, center_px: [f32; 2], size_px: [f32; 2]) -> EntityId {
        let id = self.spawn_with_sprite(EntityKind::Player, center_px, size_px, TINT_PLAYER);
        self.physics.spawn_dynamic_box(
            id,
            [pixel_to_meter(center_px[0]), pixel_to_meter(center_px[1])],
            [
                pixel_to_meter(size_px[0]) / 2.0,
                pixel_to_meter(size_px[1]) / 2.0,
            ],
            EntityKind::Player,
        );
        tracing::debug!(entity = %id, "spawned player");
        id
    }

    /// Spawn an immovable wall.
    pub fn spawn_wall(&mut self, center_px: [f32; 2], size_px: [f32; 2]) -> EntityId {
        let id = self.spawn_with_sprite(EntityKind::Scenery, center_px, size_px, TINT_WALL);
        self.physics.spawn_static_box(
            id,
            [pixel_to_meter(center_px[0]), pixel_to_meter(center_px[1])],
            [
                pixel_to_meter(size_px[0]) / 2.0,
                pixel_to_meter(size_px[1]) / 2.0,
            ],
        );
        id
    }

    fn spawn_with_sprite(
        &mut self,
        kind: EntityKind,
        center_px: [f32; 2],
        size_px: [f32; 2],
        tint: [f32; 4],
    ) -> EntityId {
        let mut sprite = Sprite::new(size_px[0], size_px[1]).with_tint(tint);
        sprite.x = center_px[0];
        sprite.y = center_px[1];
        self.world.spawn_with_sprite(kind, sprite)
    }

    fn attach_jitter(&mut self, id: EntityId) {
        let jitter = match self.config.seed {
            Some(base) => JitterImpulse::seeded(base ^ id.to_raw()),
            None => JitterImpulse::from_entropy(),
        }
        .with_limit(self.config.jitter_limit);
        self.jitters.insert(id.to_raw(), jitter);
    }

    // -- the frame loop -----------------------------------------------------

    /// Execute one frame: behaviors, physics step, sprite sync, removals.
    pub fn advance(&mut self) {
        // Phase 1: hostile jitter.
        for (&raw_id, jitter) in &mut self.jitters {
            let impulse = jitter.sample();
            self.physics.apply_impulse(EntityId::from_raw(raw_id), impulse);
        }

        // Phase 2: physics.
        self.physics.step(self.config.fixed_dt);

        // Phase 3: sprites track bodies.
        for transform in self.physics.transforms() {
            let Ok(Some(key)) = self.world.sprite(transform.entity) else {
                continue;
            };
            if let Some(sprite) = self.world.sprites_mut().get_mut(key) {
                sprite.x = meter_to_pixel(transform.x);
                sprite.y = meter_to_pixel(transform.y);
                sprite.rotation = transform.rotation;
            }
        }

        // Phase 4: the frame-boundary removal drain.
        let removed = self.world.drain_removals();
        for id in &removed {
            self.physics.remove(*id);
            self.jitters.remove(&id.to_raw());
        }
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), frame = self.frame, "entities removed");
        }

        self.frame += 1;
    }

    /// Run `count` frames in sequence.
    pub fn advance_frames(&mut self, count: u64) {
        for _ in 0..count {
            self.advance();
        }
    }

    // -- accessors ----------------------------------------------------------

    /// Number of frames executed so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Current simulation time in seconds (`frames * fixed_dt`).
    pub fn sim_time(&self) -> f64 {
        self.frame as f64 * self.config.fixed_dt as f64
    }

    /// The fixed time step in seconds per frame.
    pub fn fixed_dt(&self) -> f32 {
        self.config.fixed_dt
    }

    /// Shared access to the entity arena.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the entity arena (spawning extras, flagging
    /// removals, retinting sprites).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Shared access to the physics world.
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Mutable access to the physics world (external impulses, e.g. player
    /// input).
    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    /// Number of hostiles currently carrying a jitter source.
    pub fn hostile_count(&self) -> usize {
        self.jitters.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_stage() -> Stage {
        Stage::new(StageConfig {
            seed: Some(0xC0FFEE),
            ..Default::default()
        })
    }

    #[test]
    fn new_stage_starts_at_frame_zero() {
        let stage = Stage::new(StageConfig::default());
        assert_eq!(stage.frame_count(), 0);
        assert_eq!(stage.sim_time(), 0.0);
        assert_eq!(stage.hostile_count(), 0);
    }

    #[test]
    #[should_panic(expected = "fixed_dt must be positive")]
    fn zero_dt_panics() {
        let _ = Stage::new(StageConfig {
            fixed_dt: 0.0,
            ..Default::default()
        });
    }

    #[test]
    fn spawn_builds_entity_body_sprite_triple() {
        let mut stage = seeded_stage();
        let id = stage.spawn_hostile_ball([200.0, 100.0], 40.0);

        assert!(stage.world().is_alive(id));
        assert!(stage.physics().has_entity(id));
        assert_eq!(stage.hostile_count(), 1);

        let key = stage.world().sprite(id).unwrap().expect("sprite attached");
        let sprite = stage.world().sprites().get(key).unwrap();
        assert_eq!(sprite.x, 200.0);
        assert_eq!(sprite.y, 100.0);
        assert_eq!(sprite.width, 40.0);

        // Body sits at the meter equivalent of the pixel center.
        let pos = stage.physics().position(id).unwrap();
        assert!((pos[0] - 2.0).abs() < 1e-6);
        assert!((pos[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn hostiles_drift_under_jitter() {
        let mut stage = seeded_stage();
        let id = stage.spawn_hostile_ball([400.0, 300.0], 40.0);
        let start = stage.physics().position(id).unwrap();

        stage.advance_frames(120);

        let end = stage.physics().position(id).unwrap();
        assert!(
            start != end,
            "two seconds of jitter should have moved the hostile"
        );
    }

    #[test]
    fn walls_do_not_drift() {
        let mut stage = seeded_stage();
        let wall = stage.spawn_wall([400.0, 10.0], [800.0, 20.0]);
        stage.spawn_hostile_ball([400.0, 300.0], 40.0);

        stage.advance_frames(60);

        let pos = stage.physics().position(wall).unwrap();
        assert!((pos[0] - 4.0).abs() < 1e-6);
        assert!((pos[1] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn sprites_track_bodies_after_advance() {
        let mut stage = seeded_stage();
        let id = stage.spawn_hostile_ball([100.0, 100.0], 30.0);

        stage.advance_frames(30);

        let body = stage.physics().position(id).unwrap();
        let key = stage.world().sprite(id).unwrap().unwrap();
        let sprite = stage.world().sprites().get(key).unwrap();
        assert!((sprite.x - meter_to_pixel(body[0])).abs() < 1e-4);
        assert!((sprite.y - meter_to_pixel(body[1])).abs() < 1e-4);
    }

    #[test]
    fn removal_happens_at_frame_boundary_and_releases_resources() {
        let mut stage = seeded_stage();
        let id = stage.spawn_hostile_box([100.0, 100.0], [40.0, 40.0]);
        let key = stage.world().sprite(id).unwrap().unwrap();

        stage.world_mut().flag_for_removal(id).unwrap();

        // Still present until the next frame boundary.
        assert!(stage.world().is_alive(id));
        assert!(stage.physics().has_entity(id));

        stage.advance();

        assert!(!stage.world().is_alive(id));
        assert!(!stage.physics().has_entity(id));
        assert!(stage.world().sprites().get(key).is_none());
        assert_eq!(stage.hostile_count(), 0);
    }

    #[test]
    fn sim_time_is_computed_not_accumulated() {
        let mut stage = Stage::new(StageConfig {
            fixed_dt: 0.1,
            ..Default::default()
        });
        stage.advance_frames(1000);
        assert_eq!(stage.sim_time(), 1000.0 * 0.1);
    }

    #[test]
    fn per_frame_displacement_bounded_by_jitter_impulse() {
        // With unit-ish mass and limit L, a single frame's velocity change is
        // at most L / mass per axis; displacement is that times dt. Verify the
        // first frame's displacement respects a generous bound.
        let mut stage = seeded_stage();
        let id = stage.spawn_hostile_ball([400.0, 300.0], 40.0);
        let start = stage.physics().position(id).unwrap();

        stage.advance();

        let end = stage.physics().position(id).unwrap();
        let dt = stage.fixed_dt();
        // Ball mass = density * pi * r^2 with r = 0.2 m -> ~0.126 kg.
        let mass = std::f32::consts::PI * 0.2 * 0.2;
        let bound = (DEFAULT_JITTER_LIMIT / mass) * dt * 2.0;
        assert!((end[0] - start[0]).abs() <= bound);
        assert!((end[1] - start[1]).abs() <= bound);
    }

    #[test]
    fn seeded_stages_replay_identically() {
        fn run() -> Vec<[f32; 2]> {
            let mut stage = Stage::new(StageConfig {
                seed: Some(99),
                ..Default::default()
            });
            let a = stage.spawn_hostile_ball([300.0, 300.0], 40.0);
            let b = stage.spawn_hostile_box([500.0, 300.0], [40.0, 40.0]);
            stage.spawn_wall([400.0, 10.0], [800.0, 20.0]);

            stage.advance_frames(120);
            vec![
                stage.physics().position(a).unwrap(),
                stage.physics().position(b).unwrap(),
            ]
        }

        assert_eq!(run(), run(), "same seed must replay the same drift");
    }
}
