//! Window lifecycle for the background.
//!
//! [`Background::run`] opens a transparent, undecorated window that covers
//! the primary monitor and stays below other windows, then drives the scene
//! and renderer from winit's event loop until the window closes.
//!
//! ```ignore
//! use topobg::{Background, BackgroundOptions};
//!
//! Background::new(BackgroundOptions::default()).run()?;
//! ```

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId, WindowLevel},
};

use crate::clock::FrameClock;
use crate::error::BackgroundError;
use crate::gpu::{pack_particles, GpuParticle, GpuState};
use crate::input::PointerSource;
use crate::options::{is_mobile_viewport, BackgroundOptions};
use crate::scene::Scene;
use crate::spawn::SpawnContext;

/// Window size used when the primary monitor cannot be queried.
const FALLBACK_SIZE: LogicalSize<u32> = LogicalSize::new(1280, 720);

/// Attributes for a borderless window that sits behind everything else and
/// fills `monitor_size` when it is known.
fn window_attributes(monitor_size: Option<PhysicalSize<u32>>) -> WindowAttributes {
    let attrs = Window::default_attributes()
        .with_title("topobg")
        .with_transparent(true)
        .with_decorations(false)
        .with_window_level(WindowLevel::AlwaysOnBottom);

    match monitor_size {
        Some(size) => attrs
            .with_position(winit::dpi::PhysicalPosition::new(0, 0))
            .with_inner_size(size),
        None => attrs.with_inner_size(FALLBACK_SIZE),
    }
}

/// Entry point for running the background in its own window.
pub struct Background {
    options: BackgroundOptions,
}

impl Background {
    pub fn new(options: BackgroundOptions) -> Self {
        Self { options }
    }

    /// Run until the window is closed. This blocks.
    pub fn run(self) -> Result<(), BackgroundError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self.options);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Which window events are routed where. Present only while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Routing {
    pointer: Option<PointerSource>,
}

struct App {
    options: BackgroundOptions,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    scene: Option<Scene>,
    routing: Option<Routing>,
    clock: FrameClock,
    instances: Vec<GpuParticle>,
    error: Option<BackgroundError>,
    disposed: bool,
}

impl App {
    fn new(options: BackgroundOptions) -> Self {
        Self {
            options,
            window: None,
            gpu_state: None,
            scene: None,
            routing: None,
            clock: FrameClock::new(),
            instances: Vec::new(),
            error: None,
            disposed: false,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), BackgroundError> {
        let monitor_size = event_loop.primary_monitor().map(|m| m.size());
        let window_attrs = window_attributes(monitor_size);

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();

        let mut options = self.options.clone();
        if options.detect_mobile {
            let logical = size.to_logical::<f64>(window.scale_factor());
            if is_mobile_viewport(logical.width) {
                tracing::info!(width = logical.width, "narrow viewport, using mobile profile");
                options.is_mobile = true;
            }
        }

        let mut ctx = SpawnContext::from_seed_option(options.seed);
        let mut scene = Scene::new(&options, &mut ctx);
        scene.pointer.set_window_size(size.width, size.height);

        let gpu_state = pollster::block_on(GpuState::new(
            window.clone(),
            scene.options(),
            scene.cloud.len(),
            &scene.line_vertices(),
        ))?;

        self.routing = Some(Routing {
            pointer: scene.pointer_source(),
        });
        tracing::info!(
            particles = scene.cloud.len(),
            connections = scene.connections.len(),
            pointer = ?scene.pointer_source(),
            "background started"
        );

        self.scene = Some(scene);
        self.gpu_state = Some(gpu_state);
        self.window = Some(window.clone());
        window.request_redraw();
        Ok(())
    }

    /// Release GPU resources and stop routing events. Safe to call repeatedly.
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.routing = None;
        self.gpu_state = None;
        self.scene = None;
        self.window = None;
        self.instances.clear();
        tracing::info!(
            frames = self.clock.frame(),
            running_secs = self.clock.elapsed().as_secs_f32(),
            "background disposed"
        );
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.clock.is_paused() {
            return;
        }
        let (Some(scene), Some(gpu_state)) = (&mut self.scene, &mut self.gpu_state) else {
            return;
        };

        scene.frame();
        pack_particles(&scene.cloud, &mut self.instances);
        gpu_state.upload_particles(&self.instances);

        let mut out_of_memory = false;
        match gpu_state.render(scene.model_matrix()) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost, reconfiguring");
                gpu_state.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => out_of_memory = true,
            Err(e) => tracing::warn!("render error: {:?}", e),
        }

        if out_of_memory {
            tracing::error!("GPU out of memory, shutting down");
            self.dispose();
            event_loop.exit();
            return;
        }

        if self.clock.tick() {
            tracing::debug!(fps = self.clock.fps(), frame = self.clock.frame(), "frame rate");
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.disposed {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("failed to start background: {}", e);
            self.error = Some(e);
            self.dispose();
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(routing) = self.routing else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.dispose();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                let scale_factor = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size, scale_factor);
                }
                if let Some(scene) = &mut self.scene {
                    scene
                        .pointer
                        .set_window_size(physical_size.width, physical_size.height);
                }
            }
            WindowEvent::Occluded(occluded) => {
                if occluded {
                    self.clock.pause();
                } else {
                    self.clock.resume();
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            ref pointer_event => {
                if let (Some(source), Some(scene)) = (routing.pointer, &mut self.scene) {
                    scene.pointer.handle_event(pointer_event, source);
                }
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispose_is_idempotent() {
        let mut app = App::new(BackgroundOptions::default());
        app.routing = Some(Routing {
            pointer: Some(PointerSource::Mouse),
        });
        app.scene = Some(Scene::new(&app.options, &mut SpawnContext::seeded(1)));

        app.dispose();
        assert!(app.disposed);
        assert!(app.routing.is_none());
        assert!(app.scene.is_none());

        app.dispose();
        assert!(app.disposed);
        assert!(app.error.is_none());
    }

    #[test]
    fn test_window_fills_monitor_behind_other_windows() {
        let attrs = window_attributes(Some(PhysicalSize::new(2560, 1440)));
        assert!(attrs.transparent);
        assert!(!attrs.decorations);
        assert_eq!(attrs.window_level, WindowLevel::AlwaysOnBottom);
        assert_eq!(
            attrs.inner_size,
            Some(winit::dpi::Size::Physical(PhysicalSize::new(2560, 1440)))
        );
        assert!(attrs.position.is_some());
    }

    #[test]
    fn test_window_falls_back_without_monitor() {
        let attrs = window_attributes(None);
        assert!(!attrs.decorations);
        assert_eq!(
            attrs.inner_size,
            Some(winit::dpi::Size::Logical(LogicalSize::new(1280.0, 720.0)))
        );
        assert!(attrs.position.is_none());
    }

    #[test]
    fn test_new_app_is_idle() {
        let app = App::new(BackgroundOptions::mobile());
        assert!(app.window.is_none());
        assert!(app.routing.is_none());
        assert!(!app.disposed);
    }
}
