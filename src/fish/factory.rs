use std::f32::consts::TAU;

use glam::Vec2;

use crate::config::{FishConfig, SceneConfig};
use super::{CaptureState, Fish, IdSequence, Species};

/// Randomized attributes of a fish that has not been admitted yet.
struct Candidate {
    pos: Vec2,
    size: f32,
    speed: f32,
    opacity: f32,
    wave_offset: f32,
    species: Species,
}

fn lerp_range(rng: &mut fastrand::Rng, min: f32, max: f32) -> f32 {
    min + rng.f32() * (max - min)
}

fn roll(canvas_w: f32, canvas_h: f32, cfg: &FishConfig, rng: &mut fastrand::Rng) -> Candidate {
    let band = lerp_range(rng, cfg.spawn_band[0], cfg.spawn_band[1]);
    Candidate {
        pos: Vec2::new(canvas_w + cfg.spawn_offset, canvas_h * band),
        size: canvas_w * lerp_range(rng, cfg.size_min_ratio, cfg.size_max_ratio),
        speed: lerp_range(rng, cfg.speed_min, cfg.speed_max),
        opacity: lerp_range(rng, cfg.opacity_min, cfg.opacity_max),
        wave_offset: rng.f32() * TAU,
        species: Species::random(rng),
    }
}

/// Spawn one fish just past the right edge of the canvas.
///
/// Placement is retried while the candidate sits closer than
/// `size * min_distance_multiplier` to an existing fish. After
/// `max_attempts` the last candidate is taken anyway so spawning never stalls.
/// Returns `None` only when the rolled values are not finite (for example a
/// NaN canvas); such a fish is dropped rather than admitted.
pub fn spawn_fish(
    canvas_w: f32,
    canvas_h: f32,
    existing: &[Fish],
    config: &SceneConfig,
    ids: &mut IdSequence,
    rng: &mut fastrand::Rng,
) -> Option<Fish> {
    let cfg = &config.fish;
    let attempts = config.spawn.max_attempts.max(1);

    let mut candidate = roll(canvas_w, canvas_h, cfg, rng);
    for attempt in 1..attempts {
        let min_distance = candidate.size * cfg.min_distance_multiplier;
        let crowded = existing
            .iter()
            .any(|f| f.pos.distance(candidate.pos) < min_distance);
        if !crowded {
            break;
        }
        log::trace!("spawn attempt {attempt} overlapped, rerolling");
        candidate = roll(canvas_w, canvas_h, cfg, rng);
    }

    let finite = candidate.pos.is_finite()
        && candidate.size.is_finite()
        && candidate.speed.is_finite()
        && candidate.opacity.is_finite();
    if !finite {
        log::warn!("discarding fish with non-finite spawn values: {:?}", candidate.pos);
        return None;
    }

    Some(Fish {
        id: ids.next_id(),
        pos: candidate.pos,
        prev_pos: candidate.pos,
        vel: Vec2::new(-candidate.speed, 0.0),
        speed: candidate.speed,
        size: candidate.size,
        opacity: candidate.opacity,
        swim_phase: 0.0,
        wave_offset: candidate.wave_offset,
        species: candidate.species,
        state: CaptureState::Free,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A plain free fish for tests elsewhere in the crate.
    pub(crate) fn sample_fish(pos: Vec2) -> Fish {
        Fish {
            id: super::super::FishId(0),
            pos,
            prev_pos: pos,
            vel: Vec2::new(-3.0, 0.0),
            speed: 3.0,
            size: 30.0,
            opacity: 1.0,
            swim_phase: 0.0,
            wave_offset: 0.0,
            species: Species::Bass,
            state: CaptureState::Free,
        }
    }

    #[test]
    fn spawns_past_right_edge_within_ranges() {
        let config = SceneConfig::default();
        let mut ids = IdSequence::new();
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..200 {
            let f = spawn_fish(1280.0, 720.0, &[], &config, &mut ids, &mut rng).unwrap();
            assert_eq!(f.pos.x, 1280.0 + config.fish.spawn_offset);
            assert!(f.pos.y >= 720.0 * 0.5 && f.pos.y <= 720.0 * 0.9);
            assert!(f.size >= 1280.0 * 0.02 - 1e-3 && f.size <= 1280.0 * 0.04 + 1e-3);
            assert!(f.speed >= 2.5 && f.speed <= 4.5);
            assert!(f.opacity >= 0.6 && f.opacity <= 1.0);
            assert!(f.is_finite());
            assert!(f.state.is_free());
        }
    }

    #[test]
    fn ids_increase_per_spawn() {
        let config = SceneConfig::default();
        let mut ids = IdSequence::new();
        let mut rng = fastrand::Rng::with_seed(1);
        let a = spawn_fish(800.0, 600.0, &[], &config, &mut ids, &mut rng).unwrap();
        let b = spawn_fish(800.0, 600.0, &[a.clone()], &config, &mut ids, &mut rng).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn crowded_spawn_still_returns_a_fish() {
        let config = SceneConfig::default();
        let mut ids = IdSequence::new();
        let mut rng = fastrand::Rng::with_seed(3);

        // Wall of fish covering every possible spawn point.
        let x = 1000.0 + config.fish.spawn_offset;
        let wall: Vec<Fish> = (0..=170)
            .map(|i| sample_fish(Vec2::new(x, 400.0 + i as f32 * 2.0)))
            .collect();

        let f = spawn_fish(1000.0, 800.0, &wall, &config, &mut ids, &mut rng);
        assert!(f.is_some());
    }

    #[test]
    fn rerolls_away_from_a_crowded_strip() {
        let config = SceneConfig::default();
        let mut ids = IdSequence::new();
        let mut rng = fastrand::Rng::with_seed(11);

        // Occupy the top of a 1000..1800 spawn band; most of it stays open.
        let x = 1000.0 + config.fish.spawn_offset;
        let strip: Vec<Fish> = (0..=40)
            .map(|i| sample_fish(Vec2::new(x, 1000.0 + i as f32 * 2.0)))
            .collect();

        for _ in 0..50 {
            let f = spawn_fish(1000.0, 2000.0, &strip, &config, &mut ids, &mut rng).unwrap();
            let min_distance = f.size * config.fish.min_distance_multiplier;
            assert!(strip.iter().all(|s| s.pos.distance(f.pos) >= min_distance));
        }
    }

    #[test]
    fn non_finite_canvas_is_discarded() {
        let config = SceneConfig::default();
        let mut ids = IdSequence::new();
        let mut rng = fastrand::Rng::with_seed(5);
        assert!(spawn_fish(f32::NAN, 720.0, &[], &config, &mut ids, &mut rng).is_none());
        assert!(spawn_fish(1280.0, f32::INFINITY, &[], &config, &mut ids, &mut rng).is_none());
    }
}
