//! wgpu 2D renderer for the client.
//!
//! Feature-gated behind `renderer`; without the feature this module compiles
//! to nothing and the engine stays headless. The renderer draws colored
//! quads through a single pipeline: entity sprites, the HUD icon row, the
//! countdown digits, and the physics wireframe overlay all batch into one
//! vertex buffer per frame.
//!
//! Layout math (HUD centering, digit glyphs, collider outlines) is pure and
//! lives in its own modules so it tests without a GPU.

#[cfg(feature = "renderer")]
pub mod app;
#[cfg(feature = "renderer")]
pub mod debug;
#[cfg(feature = "renderer")]
pub mod hud;
#[cfg(feature = "renderer")]
pub mod renderer;
#[cfg(feature = "renderer")]
pub mod text;

#[cfg(feature = "renderer")]
pub use app::run_windowed;
#[cfg(feature = "renderer")]
pub use hud::HudIcon;
#[cfg(feature = "renderer")]
pub use renderer::{Camera2D, GameRenderer, Quad};
