//! rapier2d physics integration.
//!
//! The [`PhysicsWorld`] owns a rapier2d simulation and maps arena
//! [`EntityId`]s to rapier body handles in both directions. The stage loop
//! spawns bodies through the typed helpers here, applies hostile impulses,
//! steps the simulation with the fixed dt, and reads transforms back for
//! sprite synchronization.
//!
//! # Units
//!
//! Everything in this module is in physics meters ([`crate::units`] holds the
//! pixel scale). Callers convert at the boundary.
//!
//! # Collision filtering
//!
//! A flat two-category scheme: player bodies carry [`PLAYER_GROUP`], hostile
//! bodies carry [`NPC_GROUP`], and both collide with the union of the two.
//! [`filter_for`] maps a kind tag to its [`InteractionGroups`].
//!
//! # Determinism
//!
//! rapier2d is compiled with `enhanced-determinism`. With a fixed timestep
//! and the sorted transform read-back, identical inputs produce identical
//! simulations on the same platform.

use std::collections::HashMap;

use rapier2d::prelude::*;
use skitter_world::entity::{EntityId, EntityKind};

// ---------------------------------------------------------------------------
// Body material constants
// ---------------------------------------------------------------------------

/// Collider density for all spawned bodies.
const BODY_DENSITY: f32 = 1.0;

/// Collider friction for all spawned bodies.
const BODY_FRICTION: f32 = 0.0;

/// Collider restitution for all dynamic bodies.
const BODY_RESTITUTION: f32 = 1.0;

/// Linear damping applied to ball-shaped hostiles so they coast to rest
/// between impulses instead of accumulating speed forever.
const BALL_LINEAR_DAMPING: f32 = 0.75;

// ---------------------------------------------------------------------------
// Collision groups
// ---------------------------------------------------------------------------

/// Collision category bit for the player entity.
pub const PLAYER_GROUP: Group = Group::GROUP_1;

/// Collision category bit for hostile (NPC) entities.
pub const NPC_GROUP: Group = Group::GROUP_2;

/// The interaction groups for a body of the given kind.
///
/// Both gameplay categories mask against the union, so player-hostile and
/// hostile-hostile pairs collide. Scenery collides with everything.
pub fn filter_for(kind: EntityKind) -> InteractionGroups {
    let both = PLAYER_GROUP | NPC_GROUP;
    match kind {
        EntityKind::Player => InteractionGroups::new(PLAYER_GROUP, both),
        EntityKind::Hostile => InteractionGroups::new(NPC_GROUP, both),
        EntityKind::Scenery => InteractionGroups::all(),
    }
}

// ---------------------------------------------------------------------------
// BodyTransform
// ---------------------------------------------------------------------------

/// A body's pose read back after a step, in meters/radians.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyTransform {
    /// The entity this body belongs to.
    pub entity: EntityId,
    /// Translation X in meters.
    pub x: f32,
    /// Translation Y in meters.
    pub y: f32,
    /// Rotation in radians, counter-clockwise.
    pub rotation: f32,
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Manages rapier2d simulation state keyed by arena entity ids.
///
/// Bodies and colliders are owned by rapier; this wrapper only holds the
/// handle maps. Registration is idempotent and removal of an unknown entity
/// is a no-op, so the stage loop never has to special-case double spawns or
/// late removals.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Maps raw entity id -> rapier body handle.
    entity_to_body: HashMap<u64, RigidBodyHandle>,
    /// Maps rapier body handle -> raw entity id.
    body_to_entity: HashMap<RigidBodyHandle, u64>,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity vector (m/s²).
    pub fn new(gravity_x: f32, gravity_y: f32) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![gravity_x, gravity_y],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            entity_to_body: HashMap::new(),
            body_to_entity: HashMap::new(),
        }
    }

    /// Create a new physics world with zero gravity (top-down arena).
    pub fn new_zero_gravity() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Spawn a dynamic rectangular body for `entity`.
    ///
    /// Cuboid collider with the standard material (density 1.0, friction
    /// 0.0, restitution 1.0) and the two-category filter for `kind`.
    /// If the entity already has a body, this is a no-op.
    pub fn spawn_dynamic_box(
        &mut self,
        entity: EntityId,
        center: [f32; 2],
        half_extents: [f32; 2],
        kind: EntityKind,
    ) {
        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![center[0], center[1]])
            .build();
        let collider = ColliderBuilder::cuboid(half_extents[0], half_extents[1])
            .density(BODY_DENSITY)
            .friction(BODY_FRICTION)
            .restitution(BODY_RESTITUTION)
            .collision_groups(filter_for(kind))
            .build();
        self.insert_body(entity, rb, collider);
    }

    /// Spawn a dynamic ball body for `entity`.
    ///
    /// Rotation is locked and linear damping applied so the body translates
    /// without spinning and bleeds off speed between impulses. Same material
    /// and filter as the box variant.
    pub fn spawn_dynamic_ball(
        &mut self,
        entity: EntityId,
        center: [f32; 2],
        radius: f32,
        kind: EntityKind,
    ) {
        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![center[0], center[1]])
            .lock_rotations()
            .linear_damping(BALL_LINEAR_DAMPING)
            .build();
        let collider = ColliderBuilder::ball(radius)
            .density(BODY_DENSITY)
            .friction(BODY_FRICTION)
            .restitution(BODY_RESTITUTION)
            .collision_groups(filter_for(kind))
            .build();
        self.insert_body(entity, rb, collider);
    }

    /// Spawn an immovable rectangular body for `entity` (walls, props).
    ///
    /// Static bodies collide with everything, so no category filter is set.
    pub fn spawn_static_box(&mut self, entity: EntityId, center: [f32; 2], half_extents: [f32; 2]) {
        let rb = RigidBodyBuilder::fixed()
            .translation(vector![center[0], center[1]])
            .build();
        let collider = ColliderBuilder::cuboid(half_extents[0], half_extents[1])
            .density(BODY_DENSITY)
            .friction(BODY_FRICTION)
            .build();
        self.insert_body(entity, rb, collider);
    }

    fn insert_body(&mut self, entity: EntityId, rb: RigidBody, collider: Collider) {
        let raw_id = entity.to_raw();
        if self.entity_to_body.contains_key(&raw_id) {
            return;
        }
        let body_handle = self.rigid_body_set.insert(rb);
        self.entity_to_body.insert(raw_id, body_handle);
        self.body_to_entity.insert(body_handle, raw_id);
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
    }

    /// Apply a linear impulse at the body's center of mass, waking it.
    ///
    /// No-op if the entity has no registered body.
    pub fn apply_impulse(&mut self, entity: EntityId, impulse: [f32; 2]) {
        if let Some(&handle) = self.entity_to_body.get(&entity.to_raw()) {
            if let Some(rb) = self.rigid_body_set.get_mut(handle) {
                rb.apply_impulse(vector![impulse[0], impulse[1]], true);
            }
        }
    }

    /// Remove the entity's body (and attached colliders) from the simulation.
    ///
    /// No-op if the entity is not registered.
    pub fn remove(&mut self, entity: EntityId) {
        if let Some(body_handle) = self.entity_to_body.remove(&entity.to_raw()) {
            self.body_to_entity.remove(&body_handle);
            self.rigid_body_set.remove(
                body_handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true, // remove attached colliders
            );
        }
    }

    /// Step the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration_params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None, // query pipeline (unused)
            &(),  // physics hooks
            &(),  // event handler (collision events unused)
        );
    }

    /// Read every registered body's pose, sorted by raw entity id.
    ///
    /// Sorting pins the output order regardless of rapier's internal
    /// iteration, which keeps sprite synchronization (and tests comparing
    /// two runs) deterministic.
    pub fn transforms(&self) -> Vec<BodyTransform> {
        let mut out = Vec::with_capacity(self.entity_to_body.len());
        for (&raw_id, &handle) in &self.entity_to_body {
            if let Some(rb) = self.rigid_body_set.get(handle) {
                let trans = rb.translation();
                out.push(BodyTransform {
                    entity: EntityId::from_raw(raw_id),
                    x: trans.x,
                    y: trans.y,
                    rotation: rb.rotation().angle(),
                });
            }
        }
        out.sort_by_key(|t| t.entity.to_raw());
        out
    }

    /// The body's translation in meters, if registered.
    pub fn position(&self, entity: EntityId) -> Option<[f32; 2]> {
        let handle = self.entity_to_body.get(&entity.to_raw())?;
        let rb = self.rigid_body_set.get(*handle)?;
        let trans = rb.translation();
        Some([trans.x, trans.y])
    }

    /// The body's linear velocity in m/s, if registered.
    pub fn velocity(&self, entity: EntityId) -> Option<[f32; 2]> {
        let handle = self.entity_to_body.get(&entity.to_raw())?;
        let rb = self.rigid_body_set.get(*handle)?;
        let vel = rb.linvel();
        Some([vel.x, vel.y])
    }

    /// The rapier handle of the entity's body, if registered.
    ///
    /// Handles go stale after [`remove`](Self::remove); hold the entity id
    /// and re-resolve instead of caching these.
    pub fn body_handle(&self, entity: EntityId) -> Option<RigidBodyHandle> {
        self.entity_to_body.get(&entity.to_raw()).copied()
    }

    /// Whether the entity has a registered body.
    pub fn has_entity(&self, entity: EntityId) -> bool {
        self.entity_to_body.contains_key(&entity.to_raw())
    }

    /// Number of registered bodies.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Iterate over all colliders with their parent entity id, for debug
    /// wireframe extraction. Order is unspecified.
    pub fn colliders(&self) -> impl Iterator<Item = (EntityId, &Collider)> {
        self.collider_set.iter().filter_map(|(_, collider)| {
            let parent = collider.parent()?;
            let raw_id = self.body_to_entity.get(&parent)?;
            Some((EntityId::from_raw(*raw_id), collider))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn eid(index: u32) -> EntityId {
        EntityId::new(index, 0)
    }

    #[test]
    fn new_world_is_empty() {
        let pw = PhysicsWorld::new_zero_gravity();
        assert_eq!(pw.body_count(), 0);
        assert!(pw.transforms().is_empty());
    }

    #[test]
    fn spawn_registers_body() {
        let mut pw = PhysicsWorld::new_zero_gravity();
        pw.spawn_dynamic_ball(eid(0), [1.0, 2.0], 0.2, EntityKind::Hostile);
        assert!(pw.has_entity(eid(0)));
        assert!(pw.body_handle(eid(0)).is_some());
        assert_eq!(pw.body_count(), 1);
        assert_eq!(pw.position(eid(0)), Some([1.0, 2.0]));
    }

    #[test]
    fn spawn_is_idempotent() {
        let mut pw = PhysicsWorld::new_zero_gravity();
        pw.spawn_dynamic_box(eid(0), [0.0, 0.0], [0.5, 0.5], EntityKind::Hostile);
        pw.spawn_dynamic_box(eid(0), [9.0, 9.0], [0.5, 0.5], EntityKind::Hostile);
        assert_eq!(pw.body_count(), 1);
        // First spawn wins.
        assert_eq!(pw.position(eid(0)), Some([0.0, 0.0]));
    }

    #[test]
    fn remove_unregisters_body() {
        let mut pw = PhysicsWorld::new_zero_gravity();
        pw.spawn_dynamic_ball(eid(3), [0.0, 0.0], 0.2, EntityKind::Hostile);
        pw.remove(eid(3));
        assert!(!pw.has_entity(eid(3)));
        assert_eq!(pw.body_count(), 0);
    }

    #[test]
    fn remove_unknown_entity_is_noop() {
        let mut pw = PhysicsWorld::new_zero_gravity();
        pw.remove(eid(42));
        assert_eq!(pw.body_count(), 0);
    }

    #[test]
    fn impulse_moves_dynamic_body() {
        let mut pw = PhysicsWorld::new_zero_gravity();
        pw.spawn_dynamic_ball(eid(0), [0.0, 0.0], 0.2, EntityKind::Hostile);

        pw.apply_impulse(eid(0), [0.5, 0.0]);
        pw.step(DT);

        let pos = pw.position(eid(0)).unwrap();
        assert!(pos[0] > 0.0, "impulse should push body right, got {pos:?}");
        let vel = pw.velocity(eid(0)).unwrap();
        assert!(vel[0] > 0.0);
    }

    #[test]
    fn ball_damping_bleeds_speed() {
        let mut pw = PhysicsWorld::new_zero_gravity();
        pw.spawn_dynamic_ball(eid(0), [0.0, 0.0], 0.2, EntityKind::Hostile);
        pw.apply_impulse(eid(0), [1.0, 0.0]);
        pw.step(DT);
        let early = pw.velocity(eid(0)).unwrap()[0];

        for _ in 0..120 {
            pw.step(DT);
        }
        let late = pw.velocity(eid(0)).unwrap()[0];
        assert!(
            late < early * 0.5,
            "damped ball should slow down: {early} -> {late}"
        );
    }

    #[test]
    fn ball_rotation_stays_locked() {
        let mut pw = PhysicsWorld::new_zero_gravity();
        pw.spawn_dynamic_ball(eid(0), [0.0, 0.5], 0.2, EntityKind::Hostile);
        // A wall to graze against, which would spin an unlocked ball.
        pw.spawn_static_box(eid(1), [0.0, 0.0], [5.0, 0.2]);

        pw.apply_impulse(eid(0), [0.8, -0.3]);
        for _ in 0..120 {
            pw.step(DT);
        }

        let rotation = pw
            .transforms()
            .iter()
            .find(|t| t.entity == eid(0))
            .unwrap()
            .rotation;
        assert_eq!(rotation, 0.0, "locked ball must not rotate");
    }

    #[test]
    fn static_body_does_not_move() {
        let mut pw = PhysicsWorld::new(0.0, -9.81);
        pw.spawn_static_box(eid(0), [2.0, 3.0], [1.0, 1.0]);
        for _ in 0..60 {
            pw.step(DT);
        }
        assert_eq!(pw.position(eid(0)), Some([2.0, 3.0]));
    }

    #[test]
    fn gravity_pulls_dynamic_body_down() {
        let mut pw = PhysicsWorld::new(0.0, -9.81);
        pw.spawn_dynamic_box(eid(0), [0.0, 10.0], [0.3, 0.3], EntityKind::Hostile);
        for _ in 0..60 {
            pw.step(DT);
        }
        let pos = pw.position(eid(0)).unwrap();
        assert!(pos[1] < 10.0, "body should fall, got y={}", pos[1]);
    }

    #[test]
    fn filter_masks_cover_both_categories() {
        let hostile = filter_for(EntityKind::Hostile);
        assert_eq!(hostile.memberships, NPC_GROUP);
        assert_eq!(hostile.filter, PLAYER_GROUP | NPC_GROUP);

        let player = filter_for(EntityKind::Player);
        assert_eq!(player.memberships, PLAYER_GROUP);
        assert_eq!(player.filter, PLAYER_GROUP | NPC_GROUP);

        // Category-mask test in both directions: each category is in the
        // other's mask, so the pairs are collision-enabled.
        assert!(hostile.test(player));
        assert!(player.test(hostile));
    }

    #[test]
    fn two_hostiles_bounce_off_each_other() {
        let mut pw = PhysicsWorld::new_zero_gravity();
        pw.spawn_dynamic_ball(eid(0), [-0.5, 0.0], 0.2, EntityKind::Hostile);
        pw.spawn_dynamic_ball(eid(1), [0.5, 0.0], 0.2, EntityKind::Hostile);

        // Fire them at each other.
        pw.apply_impulse(eid(0), [0.5, 0.0]);
        pw.apply_impulse(eid(1), [-0.5, 0.0]);
        for _ in 0..120 {
            pw.step(DT);
        }

        // If the filter let them pass through, they would have swapped sides.
        let a = pw.position(eid(0)).unwrap();
        let b = pw.position(eid(1)).unwrap();
        assert!(
            a[0] < b[0],
            "hostiles should have collided and separated, got a={a:?} b={b:?}"
        );
    }

    #[test]
    fn transforms_sorted_by_entity_id() {
        let mut pw = PhysicsWorld::new_zero_gravity();
        for index in [5u32, 1, 8, 2] {
            pw.spawn_dynamic_ball(eid(index), [index as f32, 0.0], 0.2, EntityKind::Hostile);
        }
        pw.step(DT);

        let transforms = pw.transforms();
        for pair in transforms.windows(2) {
            assert!(pair[0].entity.to_raw() < pair[1].entity.to_raw());
        }
    }

    #[test]
    fn determinism_two_identical_runs() {
        fn run() -> Vec<BodyTransform> {
            let mut pw = PhysicsWorld::new_zero_gravity();
            pw.spawn_dynamic_ball(eid(0), [0.0, 0.0], 0.2, EntityKind::Hostile);
            pw.spawn_dynamic_box(eid(1), [1.0, 0.0], [0.3, 0.3], EntityKind::Hostile);
            pw.spawn_static_box(eid(2), [0.0, -1.0], [5.0, 0.2]);

            pw.apply_impulse(eid(0), [0.7, 0.2]);
            pw.apply_impulse(eid(1), [-0.4, 0.1]);
            for _ in 0..200 {
                pw.step(DT);
            }
            pw.transforms()
        }

        assert_eq!(run(), run(), "identical runs must produce identical poses");
    }

    #[test]
    fn colliders_iterate_with_parent_entities() {
        let mut pw = PhysicsWorld::new_zero_gravity();
        pw.spawn_dynamic_ball(eid(0), [0.0, 0.0], 0.2, EntityKind::Hostile);
        pw.spawn_static_box(eid(1), [1.0, 1.0], [0.5, 0.5]);

        let mut ids: Vec<u64> = pw.colliders().map(|(id, _)| id.to_raw()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![eid(0).to_raw(), eid(1).to_raw()]);
    }
}
