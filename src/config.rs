use std::path::Path;

use anyhow::{anyhow, Context};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Everything the simulation core reads. Injected by reference; the core never
/// looks at globals or the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub spawn: SpawnConfig,
    pub fish: FishConfig,
    pub net: NetConfig,
    pub capture: CaptureConfig,
    pub stack: StackConfig,
    pub smoke: SmokeConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Fish placed when a session starts.
    pub initial_count: usize,
    /// Milliseconds between timed spawns.
    pub interval_ms: f32,
    /// Placement retries before the factory accepts an overlapping candidate.
    pub max_attempts: u32,
    /// Spawn a replacement as soon as a free fish leaves the screen.
    pub respawn_on_exit: bool,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            initial_count: 5,
            interval_ms: 1000.0,
            max_attempts: 10,
            respawn_on_exit: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FishConfig {
    /// Fish size as a fraction of canvas width.
    pub size_min_ratio: f32,
    pub size_max_ratio: f32,
    /// Swim speed in pixels per frame.
    pub speed_min: f32,
    pub speed_max: f32,
    pub opacity_min: f32,
    pub opacity_max: f32,
    /// How far past the right edge new fish appear.
    pub spawn_offset: f32,
    /// Vertical spawn band as fractions of canvas height.
    pub spawn_band: [f32; 2],
    /// Minimum spacing between spawns, in multiples of the new fish's size.
    pub min_distance_multiplier: f32,
    pub swim_phase_step: f32,
    pub bob_amplitude: f32,
}

impl Default for FishConfig {
    fn default() -> Self {
        Self {
            size_min_ratio: 0.02,
            size_max_ratio: 0.04,
            speed_min: 2.5,
            speed_max: 4.5,
            opacity_min: 0.6,
            opacity_max: 1.0,
            spawn_offset: 100.0,
            spawn_band: [0.5, 0.9],
            min_distance_multiplier: 2.0,
            swim_phase_step: 0.02,
            bob_amplitude: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    pub x_offset_ratio: f32,
    pub y_ratio: f32,
    pub width_ratio: f32,
    pub height_ratio: f32,
    /// Fraction of the net width, from its left edge, where the parabola vertex sits.
    pub vertex_ratio: f32,
    /// Hover amplitude in pixels.
    pub horizontal_amplitude: f32,
    pub vertical_amplitude: f32,
    /// Hover frequency in radians per millisecond.
    pub horizontal_frequency: f32,
    pub vertical_frequency: f32,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            x_offset_ratio: -0.2,
            y_ratio: 0.55,
            width_ratio: 0.6,
            height_ratio: 0.3,
            vertex_ratio: 0.75,
            horizontal_amplitude: 15.0,
            vertical_amplitude: 8.0,
            horizontal_frequency: 0.005,
            vertical_frequency: 0.008,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// A fish closer than this to its target is caught.
    pub detection_radius: f32,
    /// Approach speed as a fraction of the fish's swim speed.
    pub approach_speed_multiplier: f32,
    /// Below this distance the approach step shrinks with the remaining distance.
    pub ease_distance: f32,
    /// Smallest fraction of the full step the ease-in may scale down to.
    pub ease_floor: f32,
    /// Inset used when a fish is pushed back inside the rectangle.
    pub escape_offset: f32,
    /// Inset used when a fish is pushed back inside the parabola arms.
    pub parabola_margin: f32,
    pub wobble_amplitude: f32,
    pub wobble_frequency: f32,
    pub drift_amplitude: f32,
    pub drift_frequency: f32,
    /// Hard cap on approach length; the fish is snapped to its target after this.
    pub max_approach_frames: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            detection_radius: 25.0,
            approach_speed_multiplier: 0.8,
            ease_distance: 60.0,
            ease_floor: 0.25,
            escape_offset: 5.0,
            parabola_margin: 2.0,
            wobble_amplitude: 0.2,
            wobble_frequency: 0.005,
            drift_amplitude: 0.05,
            drift_frequency: 0.003,
            max_approach_frames: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Hand-placed offsets from the vertex for the first caught fish.
    pub cluster: [Vec2; 4],
    pub spiral_base_radius: f32,
    pub spiral_growth: f32,
    pub spiral_angle_step: f32,
    /// Spiral centre, to the right of the vertex.
    pub spiral_offset_x: f32,
    /// Inset from the parabola arms.
    pub arm_margin: f32,
    /// Inset from the vertex.
    pub vertex_margin: f32,
    /// Inset from the right edge of the net.
    pub right_margin: f32,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            cluster: [
                Vec2::new(25.0, 0.0),
                Vec2::new(35.0, 10.0),
                Vec2::new(45.0, 0.0),
                Vec2::new(45.0, -10.0),
            ],
            spiral_base_radius: 5.0,
            spiral_growth: 2.0,
            spiral_angle_step: 0.8,
            spiral_offset_x: 55.0,
            arm_margin: 15.0,
            vertex_margin: 15.0,
            right_margin: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmokeConfig {
    pub particle_count: usize,
    /// Lifetime in frames.
    pub life_min: f32,
    pub life_max: f32,
    pub size_min: f32,
    pub size_max: f32,
    pub velocity_x_range: f32,
    pub velocity_y_min: f32,
    pub velocity_y_max: f32,
    pub spread: f32,
    pub alpha: f32,
    pub expansion_rate: f32,
    pub wind_effect: f32,
    pub max_particles: usize,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            particle_count: 75,
            life_min: 80.0,
            life_max: 120.0,
            size_min: 3.0,
            size_max: 8.0,
            velocity_x_range: 1.0,
            velocity_y_min: 0.8,
            velocity_y_max: 3.0,
            spread: 15.0,
            alpha: 0.7,
            expansion_rate: 0.02,
            wind_effect: 0.3,
            max_particles: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session length is drawn in whole seconds from this range.
    pub duration_min_secs: u32,
    pub duration_max_secs: u32,
    /// How long the net takes to slide away once time is up.
    pub detach_duration_ms: f32,
    /// Scene time advanced per simulation frame.
    pub frame_duration_ms: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_min_secs: 15,
            duration_max_secs: 20,
            detach_duration_ms: 3000.0,
            frame_duration_ms: 1000.0 / 60.0,
        }
    }
}

fn check_range(name: &str, min: f32, max: f32) -> Result<(), String> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(format!("{name} range must be finite with min <= max"));
    }
    Ok(())
}

fn check_finite(name: &str, value: f32) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("{name} must be finite"));
    }
    Ok(())
}

fn check_non_negative(name: &str, value: f32) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{name} must be finite and >= 0"));
    }
    Ok(())
}

fn check_positive(name: &str, value: f32) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{name} must be finite and > 0"));
    }
    Ok(())
}

impl SceneConfig {
    pub fn validate(&self) -> Result<(), String> {
        let f = &self.fish;
        check_range("fish.size_ratio", f.size_min_ratio, f.size_max_ratio)?;
        check_positive("fish.size_min_ratio", f.size_min_ratio)?;
        check_range("fish.speed", f.speed_min, f.speed_max)?;
        check_positive("fish.speed_min", f.speed_min)?;
        check_range("fish.opacity", f.opacity_min, f.opacity_max)?;
        check_range("fish.spawn_band", f.spawn_band[0], f.spawn_band[1])?;

        let n = &self.net;
        check_positive("net.width_ratio", n.width_ratio)?;
        check_positive("net.height_ratio", n.height_ratio)?;
        if !(n.vertex_ratio > 0.0 && n.vertex_ratio < 1.0) {
            return Err("net.vertex_ratio must lie strictly between 0 and 1".to_string());
        }

        let c = &self.capture;
        check_positive("capture.detection_radius", c.detection_radius)?;
        check_positive("capture.approach_speed_multiplier", c.approach_speed_multiplier)?;
        if !(c.ease_floor > 0.0 && c.ease_floor <= 1.0) {
            return Err("capture.ease_floor must lie in (0, 1]".to_string());
        }
        if c.max_approach_frames == 0 {
            return Err("capture.max_approach_frames must be > 0".to_string());
        }

        let s = &self.stack;
        if s.cluster.iter().any(|o| !o.is_finite()) {
            return Err("stack.cluster offsets must be finite".to_string());
        }
        check_positive("stack.spiral_angle_step", s.spiral_angle_step)?;
        check_non_negative("stack.spiral_base_radius", s.spiral_base_radius)?;
        check_non_negative("stack.spiral_growth", s.spiral_growth)?;
        check_finite("stack.spiral_offset_x", s.spiral_offset_x)?;
        check_non_negative("stack.arm_margin", s.arm_margin)?;
        check_non_negative("stack.vertex_margin", s.vertex_margin)?;
        check_non_negative("stack.right_margin", s.right_margin)?;

        let m = &self.smoke;
        check_range("smoke.life", m.life_min, m.life_max)?;
        check_positive("smoke.life_min", m.life_min)?;
        check_range("smoke.size", m.size_min, m.size_max)?;
        check_range("smoke.velocity_y", m.velocity_y_min, m.velocity_y_max)?;

        let ses = &self.session;
        if ses.duration_min_secs > ses.duration_max_secs {
            return Err("session.duration_min_secs must be <= duration_max_secs".to_string());
        }
        check_positive("session.detach_duration_ms", ses.detach_duration_ms)?;
        check_positive("session.frame_duration_ms", ses.frame_duration_ms)?;
        check_positive("spawn.interval_ms", self.spawn.interval_ms)?;
        Ok(())
    }

    /// Load a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: SceneConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config
            .validate()
            .map_err(|e| anyhow!("invalid config {}: {e}", path.display()))?;
        Ok(config)
    }
}
