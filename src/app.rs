/// Main application
/// Owns the window, the scene and the renderer, and drives them from winit's event loop
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    OrreryConfig, OrreryResult,
    assets::AssetManager,
    input::{InputAction, InputHandler},
    renderer::{Camera, Renderer},
    simulation::SolarSystem,
};

/// Everything that exists once the window does
struct AppState {
    window: Arc<Window>,
    renderer: Renderer,
    system: SolarSystem,
    camera: Camera,
    input: InputHandler,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &OrreryConfig) -> OrreryResult<Self> {
        let mut assets = AssetManager::new(&config.assets.texture_dir);
        let mut renderer = Renderer::new(Arc::clone(&window), &mut assets).await?;

        let mut system = SolarSystem::build(config)?;
        system.attach(renderer.backend_mut())?;
        renderer.register_textures(&system, &mut assets)?;

        let size = renderer.size();
        let camera = Camera::new(
            &config.camera,
            size.width as f64 / size.height.max(1) as f64,
        );

        Ok(Self {
            window,
            renderer,
            system,
            camera,
            input: InputHandler::new(config.camera.far_step),
        })
    }

    /// Returns false when the application should exit
    fn apply(&mut self, action: InputAction) -> bool {
        match action {
            InputAction::Orbit { dx, dy } => self.camera.orbit(dx, dy),
            InputAction::Pan { dx, dy } => self.camera.pan(dx, dy),
            InputAction::Zoom(steps) => self.camera.zoom(steps),
            InputAction::SetWireframe(on) => self.renderer.set_wireframe(on),
            InputAction::ScaleFar(factor) => self.camera.scale_far(factor),
            InputAction::ResetCamera => self.camera.reset(),
            InputAction::ShowMorePlanets => self.system.show_more_planets(),
            InputAction::ShowFewerPlanets => self.system.show_fewer_planets(),
            InputAction::Quit => return false,
        }
        true
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.renderer.resize(size);
        if size.width > 0 && size.height > 0 {
            self.camera
                .set_aspect_ratio(size.width as f64 / size.height as f64);
        }
    }

    fn frame(&mut self, elapsed: f64) -> OrreryResult<()> {
        self.system.update(elapsed, self.renderer.backend_mut())?;
        self.renderer.render(&self.camera, &self.system)
    }
}

pub struct OrreryApp {
    config: OrreryConfig,
    state: Option<AppState>,
    last_frame_time: Instant,
}

impl OrreryApp {
    pub fn new(config: OrreryConfig) -> Self {
        Self {
            config,
            state: None,
            last_frame_time: Instant::now(),
        }
    }

    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;
        event_loop
            .run_app(&mut self)
            .context("Event loop terminated with an error")?;
        Ok(())
    }
}

impl ApplicationHandler for OrreryApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(AppState::new(window, &self.config)) {
            Ok(state) => {
                log::info!(
                    "Scene ready: {} bodies, {} planets visible",
                    state.system.bodies().len(),
                    state.system.visible_planets()
                );
                self.state = Some(state);
                self.last_frame_time = Instant::now();
            }
            Err(e) => {
                log::error!("Failed to initialize application: {e}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let elapsed = now.duration_since(self.last_frame_time).as_secs_f64();
                self.last_frame_time = now;

                if let Err(e) = state.frame(elapsed) {
                    log::error!("Frame error: {e}");
                }
            }
            other => {
                for action in state.input.handle_event(&other) {
                    if !state.apply(action) {
                        log::info!("Quit requested, shutting down...");
                        event_loop.exit();
                        return;
                    }
                }
            }
        }
    }
}

impl Drop for OrreryApp {
    fn drop(&mut self) {
        if let Some(state) = &self.state {
            log::info!(
                "Shutting down after {} simulation steps",
                state.system.steps()
            );
        }
    }
}
