//! Windowed application runner.
//!
//! [`run_windowed`] takes ownership of a [`Stage`] and drives it inside a
//! winit event loop: each `RedrawRequested` advances the simulation one
//! frame, batches the world's sprites (plus the physics overlay when
//! enabled), and presents.
//!
//! winit 0.30 requires window creation inside `ApplicationHandler::resumed`,
//! so the runner is a two-phase state machine: `Pending` before the window
//! exists, `Running` once the window and renderer are up.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{WindowAttributes, WindowId};

use crate::config::GameConfig;
use crate::stage::Stage;

use super::renderer::GameRenderer;

/// Run the stage in a window until it is closed.
///
/// Takes ownership of the stage and blocks on the event loop. Window size,
/// title, background color, and the physics overlay toggle come from the
/// config.
///
/// # Errors
///
/// Returns an error if the event loop cannot be created or if window or
/// renderer initialization fails.
pub fn run_windowed(stage: Stage, config: &GameConfig) -> Result<(), anyhow::Error> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = App {
        state: AppState::Pending { stage },
        config: config.clone(),
        init_failed: false,
    };

    event_loop.run_app(&mut app)?;

    if app.init_failed {
        return Err(anyhow::anyhow!(
            "failed to initialize windowed renderer (see logs for details)"
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Internal state machine
// ---------------------------------------------------------------------------

enum AppState {
    /// Waiting for `resumed` to create the window and renderer.
    Pending { stage: Stage },
    /// Window and renderer are initialized; simulation is running.
    Running {
        stage: Stage,
        renderer: GameRenderer,
    },
    /// Temporary placeholder used during state transitions.
    Transitioning,
}

struct App {
    state: AppState,
    config: GameConfig,
    /// Set when window or renderer creation fails so `run_windowed` can
    /// return an error after the event loop exits.
    init_failed: bool,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let state = std::mem::replace(&mut self.state, AppState::Transitioning);
        match state {
            AppState::Pending { stage } => {
                let attrs = WindowAttributes::default()
                    .with_title(self.config.window.title.clone())
                    .with_inner_size(winit::dpi::PhysicalSize::new(
                        self.config.window.width,
                        self.config.window.height,
                    ));

                match event_loop.create_window(attrs) {
                    Ok(window) => {
                        let window = Arc::new(window);
                        match pollster::block_on(GameRenderer::new(window.clone())) {
                            Ok(renderer) => {
                                tracing::info!(
                                    width = self.config.window.width,
                                    height = self.config.window.height,
                                    "render window created"
                                );
                                // Kick off the first frame even on backends
                                // that skip the initial RedrawRequested.
                                window.request_redraw();
                                self.state = AppState::Running { stage, renderer };
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "renderer init failed -- exiting");
                                self.init_failed = true;
                                self.state = AppState::Pending { stage };
                                event_loop.exit();
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "window creation failed -- exiting");
                        self.init_failed = true;
                        self.state = AppState::Pending { stage };
                        event_loop.exit();
                    }
                }
            }
            running @ AppState::Running { .. } => {
                self.state = running;
            }
            AppState::Transitioning => {
                tracing::warn!("resumed called during state transition");
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let AppState::Running { stage, renderer } = &mut self.state else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!(frames = stage.frame_count(), "window closed -- shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!(
                    width = new_size.width,
                    height = new_size.height,
                    "window resized"
                );
                renderer.resize(new_size);
            }
            WindowEvent::RedrawRequested => {
                stage.advance();

                let bg = self.config.background;
                renderer.prepare([bg[0] as f64, bg[1] as f64, bg[2] as f64, bg[3] as f64]);
                renderer.draw_entities(stage.world());
                if self.config.debug_physics {
                    renderer.draw_physics_debug(stage.physics());
                }

                match renderer.present() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let size = renderer.window().inner_size();
                        renderer.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("GPU out of memory -- exiting");
                        event_loop.exit();
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "surface error during present");
                    }
                }

                renderer.window().request_redraw();
            }
            _ => {}
        }
    }
}
