pub mod geometry;
pub mod stack;

use glam::Vec2;

use crate::config::NetConfig;
use self::geometry::NetRect;

/// How far (in canvas widths) the net travels while detaching.
const DETACH_TRAVEL: f32 = 1.5;

/// Resting net rectangle: fixed ratios of the canvas, no hover applied.
pub fn base_net_rect(canvas_w: f32, canvas_h: f32, cfg: &NetConfig) -> NetRect {
    NetRect {
        x: canvas_w * cfg.x_offset_ratio,
        y: canvas_h * cfg.y_ratio,
        width: canvas_w * cfg.width_ratio,
        height: canvas_h * cfg.height_ratio,
    }
}

/// Hover displacement at `time` (ms): two independent sinusoids.
pub fn hover_offset(time: f32, cfg: &NetConfig) -> Vec2 {
    Vec2::new(
        cfg.horizontal_amplitude * (time * cfg.horizontal_frequency).sin(),
        cfg.vertical_amplitude * (time * cfg.vertical_frequency).sin(),
    )
}

/// Net bounding rectangle at `time`. Pure: same inputs, same rectangle.
pub fn net_position(canvas_w: f32, canvas_h: f32, time: f32, cfg: &NetConfig) -> NetRect {
    base_net_rect(canvas_w, canvas_h, cfg).translated(hover_offset(time, cfg))
}

/// Leftward slide applied once the session is over. `progress` runs 0..1.
pub fn detach_offset(progress: f32, canvas_w: f32) -> f32 {
    -progress.clamp(0.0, 1.0) * canvas_w * DETACH_TRAVEL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_position_is_pure() {
        let cfg = NetConfig::default();
        let a = net_position(1280.0, 720.0, 12_345.6, &cfg);
        let b = net_position(1280.0, 720.0, 12_345.6, &cfg);
        assert_eq!(a, b);
    }

    #[test]
    fn hover_stays_within_amplitude() {
        let cfg = NetConfig::default();
        let base = base_net_rect(1280.0, 720.0, &cfg);
        let mut t = 0.0f32;
        while t < 60_000.0 {
            let rect = net_position(1280.0, 720.0, t, &cfg);
            assert!((rect.x - base.x).abs() <= cfg.horizontal_amplitude + 1e-3);
            assert!((rect.y - base.y).abs() <= cfg.vertical_amplitude + 1e-3);
            assert_eq!(rect.width, base.width);
            assert_eq!(rect.height, base.height);
            t += 37.0;
        }
    }

    #[test]
    fn hover_components_are_periodic() {
        let cfg = NetConfig::default();
        let period_x = std::f32::consts::TAU / cfg.horizontal_frequency;
        let period_y = std::f32::consts::TAU / cfg.vertical_frequency;
        for t in [0.0f32, 250.0, 1_000.0, 4_321.0] {
            let now = hover_offset(t, &cfg);
            assert!((hover_offset(t + period_x, &cfg).x - now.x).abs() < 1e-2);
            assert!((hover_offset(t + period_y, &cfg).y - now.y).abs() < 1e-2);
        }
    }

    #[test]
    fn detach_slides_left_and_saturates() {
        assert_eq!(detach_offset(0.0, 1000.0), 0.0);
        assert_eq!(detach_offset(0.5, 1000.0), -750.0);
        assert_eq!(detach_offset(3.0, 1000.0), -1500.0);
    }
}
