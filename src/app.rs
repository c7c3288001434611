use std::sync::Arc;

use anyhow::Context;
use glam::Vec2;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::SceneConfig;
use crate::debug::timer::SystemPhase;
use crate::debug::FrameStats;
use crate::net::geometry::interpolate;
use crate::overlay::Overlay;
use crate::render::instance::SceneInstance;
use crate::render::ocean::{boat_layout, pole_points};
use crate::render::GpuState;
use crate::scene::Scene;

/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;
/// Window size on first launch.
const INITIAL_WINDOW_SIZE: (u32, u32) = (1280, 800);
/// Beads in the pole between boat and net.
const POLE_DOTS: usize = 20;
const POLE_DOT_DIAMETER: f32 = 3.0;
/// Room for backdrop, boat, pole and net on top of fish and smoke.
const FIXED_INSTANCES: usize = 3 + POLE_DOTS;

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level application state.
struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    overlay: Option<Overlay>,

    config: SceneConfig,
    scene: Option<Scene>,

    // Fixed timestep
    last_frame_time: Option<Instant>,
    accumulator: f64,
    /// Scene clock in milliseconds; advances one frame duration per tick.
    sim_time: f32,

    // Frame timing
    frame_stats: FrameStats,

    // Screen dimensions
    screen_w: u32,
    screen_h: u32,

    // Reusable instance buffer (avoid per-frame allocation)
    instance_buf: Vec<SceneInstance>,

    /// Startup error from `resumed`, surfaced by `run`.
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: SceneConfig) -> Self {
        let capacity = config.smoke.max_particles + FIXED_INSTANCES + 64;
        Self {
            window: None,
            gpu: None,
            overlay: None,
            config,
            scene: None,
            last_frame_time: None,
            accumulator: 0.0,
            sim_time: 0.0,
            frame_stats: FrameStats::new(),
            screen_w: 0,
            screen_h: 0,
            instance_buf: Vec::with_capacity(capacity),
            fatal: None,
        }
    }

    /// Seconds per simulation tick.
    fn tick_rate(&self) -> f64 {
        self.config.session.frame_duration_ms as f64 / 1000.0
    }

    fn canvas(&self) -> Vec2 {
        Vec2::new(self.screen_w as f32, self.screen_h as f32)
    }

    fn paused(&self) -> bool {
        self.overlay.as_ref().is_some_and(|o| o.paused)
    }

    /// Run fixed-timestep simulation ticks.
    fn run_fixed_update(&mut self, dt: f64) {
        let tick_rate = self.tick_rate();
        self.accumulator += dt;

        if self.accumulator > MAX_ACCUMULATOR {
            self.accumulator = MAX_ACCUMULATOR;
        }

        if self.paused() {
            self.accumulator = 0.0;
            return;
        }

        let canvas = self.canvas();
        let frame_ms = self.config.session.frame_duration_ms;
        let Some(scene) = &mut self.scene else {
            return;
        };

        while self.accumulator >= tick_rate {
            let report = scene.tick(canvas, self.sim_time);
            for event in &report.captures {
                log::trace!("fish {:?} settled in slot {}", event.fish_id, event.slot);
            }

            self.sim_time += frame_ms;
            self.accumulator -= tick_rate;
            self.frame_stats.tick_count += 1;
        }
    }

    /// Interpolation alpha for rendering between ticks.
    fn interpolation_alpha(&self) -> f32 {
        (self.accumulator / self.tick_rate()) as f32
    }

    /// Build the back-to-front instance list for this frame.
    fn build_instances(&mut self) {
        self.instance_buf.clear();
        let alpha = self.interpolation_alpha();
        let Some(scene) = &self.scene else {
            return;
        };

        let canvas = self.canvas();
        let time = scene.time();
        let wave_time = time / self.config.session.frame_duration_ms;
        let net = scene.net_rect(time);
        let net_origin = net.origin();

        self.instance_buf
            .push(SceneInstance::backdrop(canvas.x, canvas.y));

        for fish in scene.free() {
            let pos = if fish.state.is_free() {
                interpolate(fish.prev_pos, fish.pos, alpha)
            } else {
                fish.pos
            };
            self.instance_buf.push(SceneInstance::fish(fish, pos, time));
        }
        for fish in scene.caught() {
            self.instance_buf
                .push(SceneInstance::fish(fish, fish.display_pos(net_origin), time));
        }

        scene
            .particles()
            .build_instances(&mut self.instance_buf, &self.config.smoke);

        let boat = boat_layout(canvas.x, canvas.y, wave_time);
        self.instance_buf.push(SceneInstance::boat(&boat));
        let pole_end = Vec2::new(net.right(), net.y);
        for p in pole_points(boat.mount, pole_end, POLE_DOTS) {
            self.instance_buf
                .push(SceneInstance::dot(p, POLE_DOT_DIAMETER));
        }

        self.instance_buf
            .push(SceneInstance::net(net, self.config.net.vertex_ratio));
    }

    fn reset_scene(&mut self) {
        if let Some(scene) = &mut self.scene {
            scene.reset(self.sim_time);
        }
        self.accumulator = 0.0;
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        match code {
            KeyCode::Escape => {
                log::info!("ESC pressed, exiting");
                event_loop.exit();
            }
            KeyCode::KeyR => self.reset_scene(),
            KeyCode::F12 => {
                if let Some(overlay) = &mut self.overlay {
                    overlay.toggle_debug();
                }
            }
            KeyCode::Space => {
                if let Some(overlay) = &mut self.overlay {
                    overlay.paused = !overlay.paused;
                    log::info!("simulation {}", if overlay.paused { "paused" } else { "resumed" });
                }
            }
            _ => {}
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attrs = WindowAttributes::default()
            .with_title("Net Catch")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                INITIAL_WINDOW_SIZE.0,
                INITIAL_WINDOW_SIZE.1,
            ))
            .with_visible(false);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let size = window.inner_size();
        self.screen_w = size.width;
        self.screen_h = size.height;
        log::info!("Window created: {}x{}", size.width, size.height);

        let gpu = GpuState::new(window.clone())?;
        log::info!("wgpu + scene pipeline initialized");

        let overlay = Overlay::new(&window, &gpu);

        self.scene = Some(Scene::new(
            self.config.clone(),
            self.canvas(),
            fastrand::u64(..),
            self.sim_time,
        ));

        // Continuous game loop
        event_loop.set_control_flow(ControlFlow::Poll);
        window.set_visible(true);

        self.gpu = Some(gpu);
        self.overlay = Some(overlay);
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self) {
        // --- Timing ---
        let now = Instant::now();
        if let Some(last) = self.last_frame_time {
            let dt = now.duration_since(last).as_secs_f64();
            self.frame_stats.record_frame(dt);

            self.frame_stats.timers.begin();
            self.run_fixed_update(dt);
            self.frame_stats.timers.end(SystemPhase::Simulation);
        }
        self.last_frame_time = Some(now);

        // --- Build instance buffer ---
        self.frame_stats.timers.begin();
        self.build_instances();
        self.frame_stats.timers.end(SystemPhase::BuildInstances);

        let wave_time = self.sim_time / self.config.session.frame_duration_ms;
        let (Some(window), Some(gpu), Some(overlay), Some(scene)) =
            (&self.window, &mut self.gpu, &mut self.overlay, &self.scene)
        else {
            return;
        };

        self.frame_stats.timers.begin();
        gpu.upload(&self.instance_buf, wave_time);
        self.frame_stats.timers.end(SystemPhase::GpuUpload);

        self.frame_stats.timers.begin();
        let (primitives, textures_delta, screen_desc, actions) = overlay.run_frame(
            window,
            self.screen_w,
            self.screen_h,
            scene,
            &self.frame_stats,
        );
        self.frame_stats.timers.end(SystemPhase::Overlay);

        if let Some(mode) = actions.present_mode {
            gpu.set_present_mode(mode);
        }

        // --- Render ---
        self.frame_stats.timers.begin();
        if let Some(mut frame) = gpu.begin_frame() {
            gpu.draw_scene(&mut frame.encoder, &frame.view);

            let egui_cmds = overlay.prepare(
                &gpu.device,
                &gpu.queue,
                &mut frame.encoder,
                &primitives,
                &textures_delta,
                &screen_desc,
            );
            {
                let mut pass = GpuState::begin_overlay_pass(&mut frame.encoder, &frame.view);
                overlay.render(&mut pass, &primitives, &screen_desc);
            }

            gpu.finish_frame(frame.encoder, frame.output, egui_cmds);
        }
        overlay.free_textures(&textures_delta);
        self.frame_stats.timers.end(SystemPhase::RenderSubmit);

        if actions.play_again {
            log::info!("play again requested");
            self.reset_scene();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_window(event_loop) {
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(window), Some(overlay)) = (&self.window, &mut self.overlay) {
            if overlay.on_window_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if new_size.width == 0 || new_size.height == 0 {
                    return;
                }
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                    self.screen_w = new_size.width;
                    self.screen_h = new_size.height;
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

/// Entry point: create event loop and run.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
