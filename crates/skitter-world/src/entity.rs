//! Entity identifiers and the entity arena.
//!
//! An [`EntityId`] is a 64-bit handle packing a *generation* counter in the
//! high 32 bits and a slot *index* in the low 32 bits. Generations are bumped
//! whenever an index is recycled, so a handle held across a despawn is
//! detected as stale instead of silently aliasing the new occupant.
//!
//! The [`World`] is a slot arena of entity records. Each record carries the
//! entity's kind tag, an optional key into the world-owned
//! [`SpritePool`](crate::sprite::SpritePool), and a removal flag. Removal is
//! two-phase: [`World::flag_for_removal`] marks intent and enqueues the
//! entity, and [`World::drain_removals`] — called once per frame boundary by
//! the driving loop — despawns everything queued and frees the attached
//! sprites. Nothing is destroyed mid-frame.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sprite::{Sprite, SpriteKey, SpritePool};
use crate::WorldError;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity identifier.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` from an index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation, usable as a map key across subsystems.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// The entity kind tag.
///
/// The collision filter is built on the flat player/hostile category pair;
/// scenery is inert geometry (walls) that collides with both. The tag
/// replaces a subclass hierarchy — behavior that differs per kind lives with
/// the simulation driver, not in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player-controlled entity.
    Player,
    /// A hostile NPC entity.
    Hostile,
    /// Immovable scenery (walls, props).
    Scenery,
}

// ---------------------------------------------------------------------------
// EntityRecord
// ---------------------------------------------------------------------------

/// The per-entity data stored in the arena.
///
/// Physics bodies are not stored here — the physics wrapper keeps its own
/// id-to-handle map, so the record only carries what the arena owns: the kind
/// tag, the sprite key, and the removal flag.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    kind: EntityKind,
    sprite: Option<SpriteKey>,
    flagged: bool,
}

impl EntityRecord {
    /// The entity's kind tag.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Key of the attached sprite, if any.
    pub fn sprite(&self) -> Option<SpriteKey> {
        self.sprite
    }

    /// Whether the entity has been flagged for removal.
    pub fn is_flagged_for_removal(&self) -> bool {
        self.flagged
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

struct Slot {
    generation: u32,
    record: Option<EntityRecord>,
}

/// Slot arena of entity records plus the world-owned sprite pool.
///
/// Indices are recycled FIFO so generations spread across slots instead of
/// concentrating on a hot index. All accessors validate the handle's
/// generation; a stale handle yields [`WorldError::StaleEntity`] rather than
/// touching the slot's new occupant.
pub struct World {
    slots: Vec<Slot>,
    free_indices: VecDeque<u32>,
    removal_queue: Vec<EntityId>,
    sprites: SpritePool,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_indices: VecDeque::new(),
            removal_queue: Vec::new(),
            sprites: SpritePool::new(),
        }
    }

    /// Spawn a new entity of the given kind, with no sprite attached.
    pub fn spawn(&mut self, kind: EntityKind) -> EntityId {
        self.spawn_record(EntityRecord {
            kind,
            sprite: None,
            flagged: false,
        })
    }

    /// Spawn an entity and attach a freshly inserted sprite in one step.
    pub fn spawn_with_sprite(&mut self, kind: EntityKind, sprite: Sprite) -> EntityId {
        let key = self.sprites.insert(sprite);
        self.spawn_record(EntityRecord {
            kind,
            sprite: Some(key),
            flagged: false,
        })
    }

    fn spawn_record(&mut self, record: EntityRecord) -> EntityId {
        if let Some(index) = self.free_indices.pop_front() {
            let slot = &mut self.slots[index as usize];
            slot.record = Some(record);
            EntityId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                record: Some(record),
            });
            EntityId::new(index, 0)
        }
    }

    /// Whether `id` refers to a currently live entity.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.record(id).is_ok()
    }

    /// The kind tag of a live entity.
    pub fn kind(&self, id: EntityId) -> Result<EntityKind, WorldError> {
        Ok(self.record(id)?.kind)
    }

    /// Key of the entity's sprite, if one is attached.
    pub fn sprite(&self, id: EntityId) -> Result<Option<SpriteKey>, WorldError> {
        Ok(self.record(id)?.sprite)
    }

    /// Attach (or replace) the entity's sprite key.
    ///
    /// A previously attached sprite is freed from the pool — the entity owns
    /// its sprite slot exclusively.
    pub fn set_sprite(&mut self, id: EntityId, key: Option<SpriteKey>) -> Result<(), WorldError> {
        let old = {
            let record = self.record_mut(id)?;
            std::mem::replace(&mut record.sprite, key)
        };
        if let Some(old_key) = old {
            if Some(old_key) != key {
                self.sprites.remove(old_key);
            }
        }
        Ok(())
    }

    /// Flag a live entity for removal and enqueue it.
    ///
    /// Idempotent: flagging an already flagged entity does not enqueue it a
    /// second time. Removal intent is final — the entity stays live (and the
    /// flag queryable) until the next [`drain_removals`](Self::drain_removals).
    pub fn flag_for_removal(&mut self, id: EntityId) -> Result<(), WorldError> {
        let record = self.record_mut(id)?;
        if !record.flagged {
            record.flagged = true;
            self.removal_queue.push(id);
        }
        Ok(())
    }

    /// Whether the entity is flagged for removal. Stale handles read `false`.
    pub fn is_flagged_for_removal(&self, id: EntityId) -> bool {
        self.record(id).map(|r| r.flagged).unwrap_or(false)
    }

    /// Process the removal queue: despawn every queued entity and free its
    /// sprite. Returns the despawned ids so the caller can release resources
    /// it holds for them (physics bodies).
    ///
    /// Called once per frame boundary by the driving loop. Each entity is
    /// despawned at most once even if the queue somehow held duplicates.
    pub fn drain_removals(&mut self) -> Vec<EntityId> {
        let queued = std::mem::take(&mut self.removal_queue);
        let mut removed = Vec::with_capacity(queued.len());
        for id in queued {
            if let Some(sprite_key) = self.despawn(id) {
                self.sprites.remove(sprite_key);
            }
            if self.slot_freed(id) {
                removed.push(id);
            }
        }
        removed
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.slots.iter().filter(|s| s.record.is_some()).count()
    }

    /// Iterate over all live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &EntityRecord)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.record
                .as_ref()
                .map(|record| (EntityId::new(index as u32, slot.generation), record))
        })
    }

    /// Shared access to the sprite pool.
    pub fn sprites(&self) -> &SpritePool {
        &self.sprites
    }

    /// Mutable access to the sprite pool.
    pub fn sprites_mut(&mut self) -> &mut SpritePool {
        &mut self.sprites
    }

    // -- internal -----------------------------------------------------------

    fn record(&self, id: EntityId) -> Result<&EntityRecord, WorldError> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.record.as_ref())
            .ok_or(WorldError::StaleEntity { entity: id })
    }

    fn record_mut(&mut self, id: EntityId) -> Result<&mut EntityRecord, WorldError> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.record.as_mut())
            .ok_or(WorldError::StaleEntity { entity: id })
    }

    /// Free the entity's slot, bumping the generation. Returns the sprite key
    /// that was attached, if any. No-op (returns `None`) for stale handles.
    fn despawn(&mut self, id: EntityId) -> Option<SpriteKey> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let record = slot.record.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push_back(id.index());
        record.sprite
    }

    /// Whether the slot the id pointed at has been freed past this id's
    /// generation (i.e. the despawn for `id` happened).
    fn slot_freed(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index() as usize)
            .map(|slot| slot.generation != id.generation() || slot.record.is_none())
            .unwrap_or(false)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::Sprite;

    #[test]
    fn entity_id_packs_and_unpacks() {
        let id = EntityId::new(7, 3);
        assert_eq!(id.index(), 7);
        assert_eq!(id.generation(), 3);
        assert_eq!(EntityId::from_raw(id.to_raw()), id);
        assert_eq!(format!("{id}"), "7v3");
    }

    #[test]
    fn spawn_makes_entity_alive() {
        let mut world = World::new();
        let id = world.spawn(EntityKind::Hostile);
        assert!(world.is_alive(id));
        assert_eq!(world.kind(id).unwrap(), EntityKind::Hostile);
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn removal_flag_round_trips() {
        let mut world = World::new();
        let id = world.spawn(EntityKind::Player);

        assert!(!world.is_flagged_for_removal(id));
        world.flag_for_removal(id).unwrap();
        assert!(world.is_flagged_for_removal(id));

        // Flagged entities stay live until the drain.
        assert!(world.is_alive(id));
    }

    #[test]
    fn flagging_twice_despawns_once() {
        let mut world = World::new();
        let id = world.spawn(EntityKind::Hostile);
        world.flag_for_removal(id).unwrap();
        world.flag_for_removal(id).unwrap();

        let removed = world.drain_removals();
        assert_eq!(removed, vec![id]);
        assert!(!world.is_alive(id));
    }

    #[test]
    fn drain_frees_attached_sprite() {
        let mut world = World::new();
        let id = world.spawn_with_sprite(EntityKind::Hostile, Sprite::new(32.0, 32.0));
        let key = world.sprite(id).unwrap().expect("sprite attached");
        assert!(world.sprites().get(key).is_some());

        world.flag_for_removal(id).unwrap();
        world.drain_removals();

        assert!(world.sprites().get(key).is_none());
        assert_eq!(world.sprites().len(), 0);
    }

    #[test]
    fn recycled_index_bumps_generation() {
        let mut world = World::new();
        let first = world.spawn(EntityKind::Hostile);
        world.flag_for_removal(first).unwrap();
        world.drain_removals();

        let second = world.spawn(EntityKind::Player);
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());

        // The stale handle must not alias the new occupant.
        assert!(!world.is_alive(first));
        assert!(world.kind(first).is_err());
        assert_eq!(world.kind(second).unwrap(), EntityKind::Player);
    }

    #[test]
    fn stale_handle_reads_false_not_panic() {
        let mut world = World::new();
        let id = world.spawn(EntityKind::Hostile);
        world.flag_for_removal(id).unwrap();
        world.drain_removals();

        assert!(!world.is_flagged_for_removal(id));
        assert!(matches!(
            world.flag_for_removal(id),
            Err(WorldError::StaleEntity { .. })
        ));
    }

    #[test]
    fn set_sprite_replaces_and_frees_old() {
        let mut world = World::new();
        let id = world.spawn(EntityKind::Player);

        let first = world.sprites_mut().insert(Sprite::new(16.0, 16.0));
        world.set_sprite(id, Some(first)).unwrap();

        let second = world.sprites_mut().insert(Sprite::new(24.0, 24.0));
        world.set_sprite(id, Some(second)).unwrap();

        assert!(world.sprites().get(first).is_none());
        assert_eq!(world.sprite(id).unwrap(), Some(second));
    }

    #[test]
    fn iter_yields_live_entities_in_slot_order() {
        let mut world = World::new();
        let a = world.spawn(EntityKind::Player);
        let b = world.spawn(EntityKind::Hostile);
        let c = world.spawn(EntityKind::Hostile);

        world.flag_for_removal(b).unwrap();
        world.drain_removals();

        let ids: Vec<EntityId> = world.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn drain_on_empty_queue_is_noop() {
        let mut world = World::new();
        world.spawn(EntityKind::Hostile);
        assert!(world.drain_removals().is_empty());
        assert_eq!(world.entity_count(), 1);
    }
}
