use winit::window::Window;

use crate::debug::timer::{SystemPhase, PHASE_COUNT};
use crate::debug::FrameStats;
use crate::render::GpuState;
use crate::scene::{Scene, SessionPhase};

const PRESENT_MODES: [wgpu::PresentMode; 3] = [
    wgpu::PresentMode::Mailbox,
    wgpu::PresentMode::Fifo,
    wgpu::PresentMode::Immediate,
];

const PRESENT_MODE_LABELS: [&str; 3] = ["Mailbox", "Fifo (vsync)", "Immediate"];

/// Requests coming back from the UI this frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct OverlayActions {
    pub play_again: bool,
    pub present_mode: Option<wgpu::PresentMode>,
}

/// egui layer drawn on top of the scene: score HUD, game-over window and the
/// F12 debug panel.
pub struct Overlay {
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,

    pub debug_visible: bool,
    pub paused: bool,
    present_mode_index: usize,
}

impl Overlay {
    pub fn new(window: &Window, gpu: &GpuState) -> Self {
        let egui_ctx = egui::Context::default();

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_config.format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        let present_mode_index = PRESENT_MODES
            .iter()
            .position(|m| *m == gpu.surface_config.present_mode)
            .unwrap_or(0);

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
            debug_visible: false,
            paused: false,
            present_mode_index,
        }
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::debug!("debug panel {}", if self.debug_visible { "shown" } else { "hidden" });
    }

    /// Forward a winit event to egui. Returns true if egui consumed it.
    pub fn on_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        response.consumed
    }

    /// Run the egui frame and produce paint output plus any UI requests.
    pub fn run_frame(
        &mut self,
        window: &Window,
        screen_w: u32,
        screen_h: u32,
        scene: &Scene,
        stats: &FrameStats,
    ) -> (
        Vec<egui::epaint::ClippedPrimitive>,
        egui::TexturesDelta,
        egui_wgpu::ScreenDescriptor,
        OverlayActions,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let ui_state = UiSnapshot {
            phase: scene.phase(),
            score: scene.score(),
            remaining_secs: scene.remaining_secs(),
            debug_visible: self.debug_visible,
            fps: stats.fps,
            frame_time_avg: stats.frame_time_avg,
            frame_time_min: stats.frame_time_min,
            frame_time_max: stats.frame_time_max,
            frame_times: stats.frame_times.iter().copied().collect(),
            phase_durations: stats.timers.durations_us,
            free_count: scene.free().len(),
            capturing_count: scene.free().iter().filter(|f| f.state.is_capturing()).count(),
            caught_count: scene.caught().len(),
            particle_count: scene.particles().count(),
            scene_time_ms: scene.time(),
            tick_count: stats.tick_count,
        };

        // Mutable controls, written back after run().
        let mut paused = self.paused;
        let mut present_mode_index = self.present_mode_index;
        let mut play_again = false;

        let ctx = self.egui_ctx.clone();
        let full_output = ctx.run(raw_input, |ctx| {
            draw_ui(ctx, &ui_state, &mut paused, &mut present_mode_index, &mut play_again);
        });

        let mut actions = OverlayActions { play_again, present_mode: None };
        self.paused = paused;
        if present_mode_index != self.present_mode_index {
            actions.present_mode = Some(PRESENT_MODES[present_mode_index]);
        }
        self.present_mode_index = present_mode_index;

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes, pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [screen_w, screen_h],
            pixels_per_point,
        };

        (clipped_primitives, full_output.textures_delta, screen_descriptor, actions)
    }

    /// Upload egui textures and buffers. Call before the overlay render pass.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::epaint::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor)
    }

    /// Render egui into the given render pass.
    pub fn render(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::epaint::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures after present.
    pub fn free_textures(&mut self, textures_delta: &egui::TexturesDelta) {
        for &id in &textures_delta.free {
            self.egui_renderer.free_texture(&id);
        }
    }
}

// ---------------------------------------------------------------------------
// UI snapshot + draw
// ---------------------------------------------------------------------------

struct UiSnapshot {
    phase: SessionPhase,
    score: usize,
    remaining_secs: u32,
    debug_visible: bool,
    fps: f64,
    frame_time_avg: f64,
    frame_time_min: f64,
    frame_time_max: f64,
    frame_times: Vec<f64>,
    phase_durations: [f64; PHASE_COUNT],
    free_count: usize,
    capturing_count: usize,
    caught_count: usize,
    particle_count: usize,
    scene_time_ms: f32,
    tick_count: u64,
}

fn hud_text(text: String, size: f32) -> egui::RichText {
    egui::RichText::new(text)
        .size(size)
        .strong()
        .color(egui::Color32::WHITE)
}

fn draw_ui(
    ctx: &egui::Context,
    s: &UiSnapshot,
    paused: &mut bool,
    present_mode_index: &mut usize,
    play_again: &mut bool,
) {
    draw_hud(ctx, s);
    if let SessionPhase::GameOver { score } = s.phase {
        draw_game_over(ctx, score, play_again);
    }
    if s.debug_visible {
        draw_debug(ctx, s, paused, present_mode_index);
    }
}

fn draw_hud(ctx: &egui::Context, s: &UiSnapshot) {
    let shadow = egui::Frame::NONE
        .fill(egui::Color32::from_rgba_unmultiplied(0, 0, 0, 120))
        .corner_radius(6.0)
        .inner_margin(8.0);

    egui::Area::new(egui::Id::new("hud_score"))
        .anchor(egui::Align2::RIGHT_TOP, [-16.0, 16.0])
        .interactable(false)
        .show(ctx, |ui| {
            shadow.show(ui, |ui| {
                ui.label(hud_text(format!("Fish Caught: {}", s.score), 22.0));
            });
        });

    if matches!(s.phase, SessionPhase::Playing { .. }) {
        egui::Area::new(egui::Id::new("hud_timer"))
            .anchor(egui::Align2::CENTER_TOP, [0.0, 16.0])
            .interactable(false)
            .show(ctx, |ui| {
                shadow.show(ui, |ui| {
                    ui.label(hud_text(format!("Time: {}s", s.remaining_secs), 22.0));
                });
            });
    }
}

fn draw_game_over(ctx: &egui::Context, score: usize, play_again: &mut bool) {
    let frame = egui::Frame::NONE
        .fill(egui::Color32::from_rgba_unmultiplied(10, 40, 70, 235))
        .corner_radius(10.0)
        .inner_margin(24.0);

    egui::Window::new("game_over")
        .title_bar(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .resizable(false)
        .collapsible(false)
        .frame(frame)
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(hud_text("Game Over".to_string(), 32.0));
                ui.add_space(8.0);
                ui.label(hud_text(format!("You caught {score} fish!"), 22.0));
                ui.add_space(16.0);
                if ui
                    .add(egui::Button::new(egui::RichText::new("Play Again").size(20.0)))
                    .clicked()
                {
                    *play_again = true;
                }
            });
        });
}

fn draw_debug(
    ctx: &egui::Context,
    s: &UiSnapshot,
    paused: &mut bool,
    present_mode_index: &mut usize,
) {
    let panel_frame = egui::Frame::NONE
        .fill(egui::Color32::from_rgba_unmultiplied(20, 20, 20, 220))
        .corner_radius(6.0)
        .inner_margin(10.0);

    egui::Window::new("Debug")
        .default_pos([10.0, 10.0])
        .default_width(320.0)
        .resizable(true)
        .frame(panel_frame)
        .show(ctx, |ui| {
            ui.style_mut().visuals.override_text_color = Some(egui::Color32::from_gray(220));

            // --- Performance ---
            ui.heading("Performance");
            ui.label(format!("FPS: {:.1}", s.fps));
            ui.label(format!(
                "Frame: {:.2}ms avg | {:.2} min | {:.2} max",
                s.frame_time_avg * 1000.0,
                s.frame_time_min * 1000.0,
                s.frame_time_max * 1000.0,
            ));
            ui.add_space(4.0);

            // --- Frame time histogram ---
            ui.heading("Frame Time History");
            if !s.frame_times.is_empty() {
                let max_time = s
                    .frame_times
                    .iter()
                    .copied()
                    .fold(0.0f64, f64::max)
                    .max(0.020);

                let (response, painter) =
                    ui.allocate_painter(egui::vec2(300.0, 60.0), egui::Sense::hover());
                let rect = response.rect;

                let bar_width = rect.width() / s.frame_times.len() as f32;
                let target_y = rect.bottom() - (0.01667 / max_time as f32) * rect.height();

                for (i, &t) in s.frame_times.iter().enumerate() {
                    let h = (t / max_time) as f32 * rect.height();
                    let x = rect.left() + i as f32 * bar_width;
                    let color = if t > 0.01667 {
                        egui::Color32::from_rgb(255, 100, 80)
                    } else {
                        egui::Color32::from_rgb(80, 200, 120)
                    };
                    painter.rect_filled(
                        egui::Rect::from_min_max(
                            egui::pos2(x, rect.bottom() - h),
                            egui::pos2(x + bar_width - 1.0, rect.bottom()),
                        ),
                        0.0,
                        color,
                    );
                }

                // 16.67ms target line
                painter.line_segment(
                    [
                        egui::pos2(rect.left(), target_y),
                        egui::pos2(rect.right(), target_y),
                    ],
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(255, 255, 100)),
                );
            }
            ui.add_space(4.0);

            // --- Phase timers ---
            ui.heading("Frame Phases");
            let total: f64 = s.phase_durations.iter().sum::<f64>().max(1.0);
            let max_us = s
                .phase_durations
                .iter()
                .copied()
                .fold(0.0f64, f64::max)
                .max(1.0);

            for phase in SystemPhase::ALL {
                let us = s.phase_durations[phase as usize];
                let pct = us / total * 100.0;
                let bar_frac = (us / max_us) as f32;

                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(format!("{:<12}", phase.label())).monospace());
                    ui.label(
                        egui::RichText::new(format!("{:>5.0}us ({:>2.0}%)", us, pct)).monospace(),
                    );

                    let (response, painter) =
                        ui.allocate_painter(egui::vec2(80.0, 12.0), egui::Sense::hover());
                    let r = response.rect;
                    painter.rect_filled(
                        egui::Rect::from_min_max(
                            r.left_top(),
                            egui::pos2(r.left() + r.width() * bar_frac, r.bottom()),
                        ),
                        2.0,
                        egui::Color32::from_rgb(100, 180, 255),
                    );
                });
            }
            ui.add_space(4.0);

            // --- Scene ---
            ui.heading("Scene");
            ui.label(format!(
                "Free: {} ({} in net) | Caught: {} | Smoke: {}",
                s.free_count, s.capturing_count, s.caught_count, s.particle_count
            ));
            ui.label(format!(
                "Session: {} | t = {:.1}s | ticks: {}",
                phase_label(s.phase),
                s.scene_time_ms / 1000.0,
                s.tick_count
            ));
            ui.add_space(4.0);

            // --- Controls ---
            ui.heading("Controls");
            ui.checkbox(paused, "Pause Simulation");
            ui.horizontal(|ui| {
                ui.label("Present:");
                egui::ComboBox::from_id_salt("present_mode")
                    .selected_text(PRESENT_MODE_LABELS[*present_mode_index])
                    .show_ui(ui, |ui| {
                        for (i, label) in PRESENT_MODE_LABELS.iter().enumerate() {
                            ui.selectable_value(present_mode_index, i, *label);
                        }
                    });
            });
            ui.label("R: Reset | Space: Pause | F12: Toggle | ESC: Quit");
        });
}

fn phase_label(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Playing { .. } => "playing",
        SessionPhase::Detaching { .. } => "detaching",
        SessionPhase::GameOver { .. } => "game over",
    }
}
