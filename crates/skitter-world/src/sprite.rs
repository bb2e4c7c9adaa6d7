//! Sprites and the world-owned sprite pool.
//!
//! A [`Sprite`] is pure render data in pixel space: center position, size,
//! rotation, and an RGBA tint. Sprites live in the [`SpritePool`], a
//! generational slot arena; entities reference them by [`SpriteKey`] instead
//! of owning them directly, so a despawned entity cannot leave a dangling
//! borrow into render state — a stale key simply reads back `None`.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sprite
// ---------------------------------------------------------------------------

/// A renderable quad in pixel space.
///
/// `x`/`y` are the center of the quad. Rotation is in radians,
/// counter-clockwise. The tint is straight (non-premultiplied) RGBA with each
/// channel in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    /// Center X in pixels.
    pub x: f32,
    /// Center Y in pixels.
    pub y: f32,
    /// Full width in pixels.
    pub width: f32,
    /// Full height in pixels.
    pub height: f32,
    /// Rotation in radians, counter-clockwise.
    pub rotation: f32,
    /// RGBA tint, each channel 0.0..=1.0.
    pub tint: [f32; 4],
}

impl Sprite {
    /// A white sprite of the given size at the origin.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            rotation: 0.0,
            tint: [1.0, 1.0, 1.0, 1.0],
        }
    }

    /// Builder-style tint override.
    pub fn with_tint(mut self, tint: [f32; 4]) -> Self {
        self.tint = tint;
        self
    }
}

// ---------------------------------------------------------------------------
// SpriteKey
// ---------------------------------------------------------------------------

/// Generational key into the [`SpritePool`].
///
/// Same packing as entity ids: `[generation: u32 | index: u32]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteKey(u64);

impl SpriteKey {
    #[inline]
    fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    #[inline]
    fn index(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Debug for SpriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpriteKey({}v{})", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// SpritePool
// ---------------------------------------------------------------------------

struct PoolSlot {
    generation: u32,
    sprite: Option<Sprite>,
}

/// Generational slot arena of sprites.
///
/// Insertion returns a [`SpriteKey`]; removal bumps the slot generation so
/// outstanding keys go stale instead of aliasing a reused slot. Iteration is
/// in slot order, which is stable for a fixed insertion/removal history.
pub struct SpritePool {
    slots: Vec<PoolSlot>,
    free_indices: VecDeque<u32>,
    live: usize,
}

impl SpritePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_indices: VecDeque::new(),
            live: 0,
        }
    }

    /// Insert a sprite, returning its key.
    pub fn insert(&mut self, sprite: Sprite) -> SpriteKey {
        self.live += 1;
        if let Some(index) = self.free_indices.pop_front() {
            let slot = &mut self.slots[index as usize];
            slot.sprite = Some(sprite);
            SpriteKey::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(PoolSlot {
                generation: 0,
                sprite: Some(sprite),
            });
            SpriteKey::new(index, 0)
        }
    }

    /// Remove a sprite, returning it. Stale keys return `None`.
    pub fn remove(&mut self, key: SpriteKey) -> Option<Sprite> {
        let slot = self.slots.get_mut(key.index() as usize)?;
        if slot.generation != key.generation() {
            return None;
        }
        let sprite = slot.sprite.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push_back(key.index());
        self.live -= 1;
        Some(sprite)
    }

    /// Shared access to a sprite. Stale keys return `None`.
    pub fn get(&self, key: SpriteKey) -> Option<&Sprite> {
        self.slots
            .get(key.index() as usize)
            .filter(|slot| slot.generation == key.generation())
            .and_then(|slot| slot.sprite.as_ref())
    }

    /// Mutable access to a sprite. Stale keys return `None`.
    pub fn get_mut(&mut self, key: SpriteKey) -> Option<&mut Sprite> {
        self.slots
            .get_mut(key.index() as usize)
            .filter(|slot| slot.generation == key.generation())
            .and_then(|slot| slot.sprite.as_mut())
    }

    /// Number of live sprites.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the pool holds no sprites.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate over live sprites in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SpriteKey, &Sprite)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.sprite
                .as_ref()
                .map(|sprite| (SpriteKey::new(index as u32, slot.generation), sprite))
        })
    }
}

impl Default for SpritePool {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
