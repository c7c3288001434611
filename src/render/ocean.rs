use glam::Vec2;

/// Sky takes the top 40% of the canvas; the water starts below it.
pub const SKY_HEIGHT_RATIO: f32 = 0.4;

const BOAT_WIDTH_RATIO: f32 = 0.25;
/// Boat height as a fraction of boat width.
const BOAT_HEIGHT_RATIO: f32 = 0.5;
/// Where the boat's keel sits, as a fraction of canvas height.
const BOAT_Y_RATIO: f32 = 0.42;
const BOAT_HOVER_DAMPING: f32 = 0.15;

/// (amplitude px, spatial frequency, speed per frame)
const WAVE_LAYERS: [(f32, f32, f32); 3] = [
    (40.0, 0.08, 0.015),
    (25.0, 0.12, 0.02),
    (15.0, 0.18, 0.025),
];
const WAVE_DAMPING: f32 = 0.08;

/// How far the pole's midpoint is lifted above the straight line.
const POLE_LIFT: f32 = 10.0;

/// Surface displacement at `x` for `wave_time` (measured in frames).
/// `scene.wgsl` evaluates the same sum for the backdrop.
pub fn wave_height(x: f32, wave_time: f32) -> f32 {
    WAVE_LAYERS
        .iter()
        .map(|&(amp, freq, speed)| amp * (x * freq + wave_time * speed).sin())
        .sum::<f32>()
        * WAVE_DAMPING
}

/// Largest possible `wave_height` magnitude.
pub fn max_wave_height() -> f32 {
    WAVE_LAYERS.iter().map(|l| l.0).sum::<f32>() * WAVE_DAMPING
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoatLayout {
    /// Centre of the hull quad.
    pub center: Vec2,
    pub size: Vec2,
    /// Fixed point the pole hangs from (centre of the keel line).
    pub mount: Vec2,
}

/// Boat placement for a canvas. The hull bobs gently with the wave under its
/// left edge; the pole mount stays put so the net does not jitter.
pub fn boat_layout(canvas_w: f32, canvas_h: f32, wave_time: f32) -> BoatLayout {
    let width = canvas_w * BOAT_WIDTH_RATIO;
    let height = width * BOAT_HEIGHT_RATIO;
    let left = (canvas_w - width) / 2.0;
    let bob = wave_height(left, wave_time) * BOAT_HOVER_DAMPING;
    let keel = canvas_h * BOAT_Y_RATIO;

    BoatLayout {
        center: Vec2::new(canvas_w / 2.0, keel - height / 2.0 + bob),
        size: Vec2::new(width, height),
        mount: Vec2::new(canvas_w / 2.0, keel),
    }
}

/// Sample `count` points along the sagging pole from `from` to `to`
/// (a quadratic curve through a control point just above the midpoint).
pub fn pole_points(from: Vec2, to: Vec2, count: usize) -> impl Iterator<Item = Vec2> {
    let control = (from + to) / 2.0 - Vec2::new(0.0, POLE_LIFT);
    let steps = count.max(2) - 1;
    (0..count).map(move |i| {
        let t = i as f32 / steps as f32;
        let u = 1.0 - t;
        from * (u * u) + control * (2.0 * u * t) + to * (t * t)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waves_stay_within_damped_amplitude() {
        let bound = max_wave_height();
        assert!((bound - 6.4).abs() < 1e-4);
        for i in 0..500 {
            let x = i as f32 * 3.7;
            let h = wave_height(x, i as f32 * 11.0);
            assert!(h.abs() <= bound + 1e-4);
        }
    }

    #[test]
    fn boat_is_centred_above_the_keel_line() {
        let boat = boat_layout(1280.0, 720.0, 0.0);
        assert_eq!(boat.size, Vec2::new(320.0, 160.0));
        assert_eq!(boat.center.x, 640.0);
        assert_eq!(boat.mount, Vec2::new(640.0, 720.0 * 0.42));
        let bob = (boat.center.y + boat.size.y / 2.0 - boat.mount.y).abs();
        assert!(bob <= max_wave_height() * BOAT_HOVER_DAMPING + 1e-3);
    }

    #[test]
    fn pole_runs_from_boat_to_net_and_sags_up() {
        let from = Vec2::new(640.0, 300.0);
        let to = Vec2::new(500.0, 400.0);
        let points: Vec<Vec2> = pole_points(from, to, 9).collect();
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], from);
        assert!(points[8].distance(to) < 1e-3);
        // Midpoint is lifted by half the control offset.
        let mid = points[4];
        assert!((mid.y - (350.0 - POLE_LIFT / 2.0)).abs() < 1e-3);
    }
}
