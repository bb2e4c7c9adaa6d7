//! Interactive swarm demo -- steer the player through a box of jittering
//! hostiles.
//!
//! Run with:
//!   cargo run --example swarm_visual --features renderer -p skitter-engine
//!
//! Controls:
//!   Arrow keys or WASD -- nudge the player
//!   X                  -- remove the hostile nearest the player
//!   Escape             -- quit

use std::sync::Arc;

use skitter_engine::prelude::*;
use skitter_engine::render::{GameRenderer, HudIcon};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{WindowAttributes, WindowId};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

/// Impulse per frame of held movement key, in newton-seconds.
const STEER_IMPULSE: f32 = 0.05;

/// The demo counts down from here, one step per second.
const COUNTDOWN_START: u32 = 30;

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

enum RenderState {
    Pending,
    Running { renderer: GameRenderer },
}

struct SwarmApp {
    stage: Stage,
    config: GameConfig,
    render_state: RenderState,
    player: EntityId,
    hostiles: Vec<EntityId>,
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    cull_requested: bool,
}

impl SwarmApp {
    /// The hostile currently nearest the player, if any.
    fn nearest_hostile(&self) -> Option<EntityId> {
        let player_pos = self.stage.physics().position(self.player)?;
        self.hostiles
            .iter()
            .filter(|id| self.stage.world().is_alive(**id))
            .min_by(|a, b| {
                let da = dist_sq(self.stage.physics().position(**a), player_pos);
                let db = dist_sq(self.stage.physics().position(**b), player_pos);
                da.total_cmp(&db)
            })
            .copied()
    }
}

fn dist_sq(pos: Option<[f32; 2]>, to: [f32; 2]) -> f32 {
    match pos {
        Some([x, y]) => {
            let dx = x - to[0];
            let dy = y - to[1];
            dx * dx + dy * dy
        }
        None => f32::MAX,
    }
}

impl ApplicationHandler for SwarmApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if matches!(self.render_state, RenderState::Running { .. }) {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("skitter swarm -- WASD to steer, X to cull, ESC to quit")
            .with_inner_size(winit::dpi::PhysicalSize::new(WIDTH, HEIGHT));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                match pollster::block_on(GameRenderer::new(window.clone())) {
                    Ok(renderer) => {
                        window.request_redraw();
                        self.render_state = RenderState::Running { renderer };
                    }
                    Err(e) => {
                        eprintln!("renderer init failed: {e}");
                        event_loop.exit();
                    }
                }
            }
            Err(e) => {
                eprintln!("window creation failed: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let RenderState::Running { renderer } = &mut self.render_state else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => renderer.resize(size),

            WindowEvent::KeyboardInput { event: key_ev, .. } => {
                let pressed = key_ev.state == ElementState::Pressed;
                match key_ev.physical_key {
                    PhysicalKey::Code(KeyCode::ArrowUp) | PhysicalKey::Code(KeyCode::KeyW) => {
                        self.up = pressed;
                    }
                    PhysicalKey::Code(KeyCode::ArrowDown) | PhysicalKey::Code(KeyCode::KeyS) => {
                        self.down = pressed;
                    }
                    PhysicalKey::Code(KeyCode::ArrowLeft) | PhysicalKey::Code(KeyCode::KeyA) => {
                        self.left = pressed;
                    }
                    PhysicalKey::Code(KeyCode::ArrowRight) | PhysicalKey::Code(KeyCode::KeyD) => {
                        self.right = pressed;
                    }
                    PhysicalKey::Code(KeyCode::KeyX) => {
                        if pressed {
                            self.cull_requested = true;
                        }
                    }
                    PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                    _ => {}
                }
            }

            WindowEvent::RedrawRequested => {
                // -- 1. Steer the player --
                let ix = (self.right as i8 - self.left as i8) as f32 * STEER_IMPULSE;
                let iy = (self.up as i8 - self.down as i8) as f32 * STEER_IMPULSE;
                if ix != 0.0 || iy != 0.0 {
                    self.stage.physics_mut().apply_impulse(self.player, [ix, iy]);
                }

                // -- 2. Cull on request: flag the nearest hostile. It is
                //       actually removed at the next frame boundary.
                if self.cull_requested {
                    self.cull_requested = false;
                    if let Some(victim) = self.nearest_hostile() {
                        let _ = self.stage.world_mut().flag_for_removal(victim);
                    }
                }

                // -- 3. One simulation frame --
                self.stage.advance();

                // -- 4. Render --
                let bg = self.config.background;
                renderer.prepare([bg[0] as f64, bg[1] as f64, bg[2] as f64, bg[3] as f64]);
                renderer.draw_entities(self.stage.world());
                if self.config.debug_physics {
                    renderer.draw_physics_debug(self.stage.physics());
                }

                // One HUD icon per surviving hostile.
                let icons: Vec<HudIcon> = self
                    .hostiles
                    .iter()
                    .filter(|id| self.stage.world().is_alive(**id))
                    .map(|_| HudIcon {
                        tint: [1.0, 0.333, 0.2, 1.0],
                    })
                    .collect();
                renderer.draw_hud_icons(&icons);

                let elapsed = self.stage.sim_time() as u32;
                renderer.draw_countdown(COUNTDOWN_START.saturating_sub(elapsed));

                match renderer.present() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let size = renderer.window().inner_size();
                        renderer.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        eprintln!("GPU out of memory");
                        event_loop.exit();
                    }
                    Err(_) => {}
                }

                renderer.window().request_redraw();
            }

            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Scene setup
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    skitter_engine::logging::init();

    let config = GameConfig {
        seed: Some(0xBEE5),
        debug_physics: true,
        ..Default::default()
    };

    let mut stage = Stage::new(config.stage_config());

    // Arena walls just inside the window edges.
    let (w, h) = (WIDTH as f32, HEIGHT as f32);
    stage.spawn_wall([w / 2.0, 10.0], [w, 20.0]);
    stage.spawn_wall([w / 2.0, h - 10.0], [w, 20.0]);
    stage.spawn_wall([10.0, h / 2.0], [20.0, h]);
    stage.spawn_wall([w - 10.0, h / 2.0], [20.0, h]);

    let player = stage.spawn_player([w / 2.0, h / 2.0], [36.0, 36.0]);

    let mut hostiles = Vec::new();
    for i in 0..4 {
        let x = 160.0 + i as f32 * 160.0;
        hostiles.push(stage.spawn_hostile_ball([x, 150.0], 40.0));
        hostiles.push(stage.spawn_hostile_box([x, 450.0], [40.0, 40.0]));
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = SwarmApp {
        stage,
        config,
        render_state: RenderState::Pending,
        player,
        hostiles,
        up: false,
        down: false,
        left: false,
        right: false,
        cull_requested: false,
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}
