//! HUD icon row layout.
//!
//! The client shows a horizontal row of key-sequence icons near the top of
//! the screen, centered regardless of how many icons are up. The layout is
//! one formula for odd and even counts alike: icon `i` of `n` sits at
//! `center_x + (i - (n-1)/2) * pitch`, which is symmetric about `center_x`
//! by construction.

use super::renderer::Quad;

/// Rendered edge length of one icon, in pixels.
pub const ICON_SIZE: f32 = 45.0;

/// Center-to-center spacing between icons, in pixels.
pub const ICON_PITCH: f32 = 50.0;

/// Distance from the top edge of the surface to the icon centers, in pixels.
pub const ICON_TOP_MARGIN: f32 = 65.0;

/// One HUD icon. With asset loading out of scope, an icon is a tinted quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudIcon {
    /// RGBA tint, each channel 0.0..=1.0.
    pub tint: [f32; 4],
}

/// Horizontal centers of a row of `count` icons spaced by `pitch`, centered
/// on `center_x`. Returned left to right.
pub fn icon_row_centers(count: usize, pitch: f32, center_x: f32) -> Vec<f32> {
    let half_span = (count as f32 - 1.0) / 2.0;
    (0..count)
        .map(|i| center_x + (i as f32 - half_span) * pitch)
        .collect()
}

/// Build the frame quads for the icon row on a `surface_width` x
/// `surface_height` surface.
pub fn icon_row_quads(icons: &[HudIcon], surface_width: f32, surface_height: f32) -> Vec<Quad> {
    let y = surface_height - ICON_TOP_MARGIN;
    let centers = icon_row_centers(icons.len(), ICON_PITCH, surface_width / 2.0);
    icons
        .iter()
        .zip(centers)
        .map(|(icon, x)| Quad {
            x,
            y,
            width: ICON_SIZE,
            height: ICON_SIZE,
            rotation: 0.0,
            color: icon.tint,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
