//! Physics wireframe overlay.
//!
//! Turns every collider in the physics world into outline quads — four edge
//! strips for a box, a segment loop for a ball — with positions and extents
//! scaled meters→pixels. Extraction is pure so it tests without a GPU; the
//! renderer just batches the result on top of the frame.

use rapier2d::parry::shape::TypedShape;

use crate::physics::PhysicsWorld;
use crate::units::meter_to_pixel;

use super::renderer::Quad;

/// Outline stroke thickness in pixels.
pub const OUTLINE_THICKNESS: f32 = 2.0;

/// Wireframe color (green, like every physics debug draw ever).
pub const OUTLINE_COLOR: [f32; 4] = [0.2, 1.0, 0.4, 1.0];

/// Segments used to approximate a circle outline.
pub const BALL_SEGMENTS: usize = 24;

/// Wireframe quads for every collider in the world.
///
/// Unsupported shapes are skipped.
pub fn collider_outline_quads(physics: &PhysicsWorld) -> Vec<Quad> {
    let mut quads = Vec::new();
    for (_entity, collider) in physics.colliders() {
        let trans = collider.translation();
        let center = [meter_to_pixel(trans.x), meter_to_pixel(trans.y)];
        let rotation = collider.rotation().angle();

        match collider.shape().as_typed_shape() {
            TypedShape::Cuboid(cuboid) => {
                let half = [
                    meter_to_pixel(cuboid.half_extents.x),
                    meter_to_pixel(cuboid.half_extents.y),
                ];
                quads.extend(box_outline(center, half, rotation));
            }
            TypedShape::Ball(ball) => {
                quads.extend(ball_outline(center, meter_to_pixel(ball.radius)));
            }
            _ => {}
        }
    }
    quads
}

/// Four edge strips tracing a rotated box. Pixel units.
fn box_outline(center: [f32; 2], half_extents: [f32; 2], rotation: f32) -> [Quad; 4] {
    let [hw, hh] = half_extents;
    let t = OUTLINE_THICKNESS;
    let (sin, cos) = rotation.sin_cos();

    // Edge strips in box-local space: offset of the strip center plus the
    // strip size. Horizontal strips overhang by the thickness so corners
    // close.
    let edges: [([f32; 2], [f32; 2]); 4] = [
        ([0.0, hh], [2.0 * hw + t, t]),  // top
        ([0.0, -hh], [2.0 * hw + t, t]), // bottom
        ([-hw, 0.0], [t, 2.0 * hh]),     // left
        ([hw, 0.0], [t, 2.0 * hh]),      // right
    ];

    edges.map(|(offset, size)| Quad {
        x: center[0] + offset[0] * cos - offset[1] * sin,
        y: center[1] + offset[0] * sin + offset[1] * cos,
        width: size[0],
        height: size[1],
        rotation,
        color: OUTLINE_COLOR,
    })
}

/// A loop of [`BALL_SEGMENTS`] thin quads tracing a circle. Pixel units.
fn ball_outline(center: [f32; 2], radius: f32) -> Vec<Quad> {
    let step = std::f32::consts::TAU / BALL_SEGMENTS as f32;
    // Chord length plus a little overlap so the loop has no gaps.
    let segment_len = 2.0 * radius * (step / 2.0).sin() * 1.1;

    (0..BALL_SEGMENTS)
        .map(|i| {
            let angle = i as f32 * step;
            Quad {
                x: center[0] + radius * angle.cos(),
                y: center[1] + radius * angle.sin(),
                width: OUTLINE_THICKNESS,
                height: segment_len,
                rotation: angle,
                color: OUTLINE_COLOR,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
