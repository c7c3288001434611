use glam::Vec2;

use crate::config::SmokeConfig;
use crate::render::instance::{pack_rgba, SceneInstance, SHAPE_SMOKE};

/// Base smoke color before alpha is applied.
const SMOKE_RGB: [u8; 3] = [80, 80, 80];

/// A single smoke puff released at a capture point.
#[derive(Debug, Clone, Copy)]
struct SmokeParticle {
    pos: Vec2,
    vel: Vec2,
    /// Frames lived so far.
    age: f32,
    max_age: f32,
    size: f32,
    initial_size: f32,
    /// Constant sideways push per frame.
    wind: f32,
}

impl SmokeParticle {
    fn is_finite(&self) -> bool {
        self.pos.is_finite()
            && self.vel.is_finite()
            && self.size.is_finite()
            && self.max_age.is_finite()
            && self.wind.is_finite()
    }
}

/// Smoke effect fed by capture events. Owns its particles outright; the scene
/// only spawns, steps and draws through it.
pub struct ParticleSystem {
    particles: Vec<SmokeParticle>,
    pub enabled: bool,
}

impl ParticleSystem {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
            enabled: true,
        }
    }

    /// Release one burst of smoke around `pos`. Particles with non-finite
    /// values are dropped; the burst is truncated at `max_particles`.
    pub fn spawn_smoke(&mut self, pos: Vec2, cfg: &SmokeConfig, rng: &mut fastrand::Rng) {
        if !self.enabled {
            return;
        }
        if !pos.is_finite() {
            log::warn!("skipping smoke burst at non-finite position {pos:?}");
            return;
        }
        for _ in 0..cfg.particle_count {
            if self.particles.len() >= cfg.max_particles {
                break;
            }
            let size = cfg.size_min + rng.f32() * (cfg.size_max - cfg.size_min);
            let particle = SmokeParticle {
                pos: pos
                    + Vec2::new(
                        (rng.f32() - 0.5) * cfg.spread,
                        (rng.f32() - 0.5) * cfg.spread,
                    ),
                vel: Vec2::new(
                    (rng.f32() - 0.5) * cfg.velocity_x_range,
                    -(cfg.velocity_y_min + rng.f32() * (cfg.velocity_y_max - cfg.velocity_y_min)),
                ),
                age: 0.0,
                max_age: cfg.life_min + rng.f32() * (cfg.life_max - cfg.life_min),
                size,
                initial_size: size,
                wind: rng.f32() * cfg.wind_effect,
            };
            if particle.is_finite() && particle.size > 0.0 {
                self.particles.push(particle);
            } else {
                log::warn!("discarding non-finite smoke particle");
            }
        }
    }

    /// Advance every particle one frame: drift, grow, age, remove dead.
    pub fn update(&mut self, cfg: &SmokeConfig) {
        // Update in-place, swap-remove dead ones
        let mut i = 0;
        while i < self.particles.len() {
            let p = &mut self.particles[i];
            p.age += 1.0;
            p.pos.x += p.vel.x + p.wind;
            p.pos.y += p.vel.y;

            let grown = p.initial_size + p.age * cfg.expansion_rate;
            p.size = grown.min(p.initial_size * 3.0);

            if p.age >= p.max_age || !p.pos.is_finite() {
                self.particles.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Append smoke instances to the render buffer.
    pub fn build_instances(&self, buf: &mut Vec<SceneInstance>, cfg: &SmokeConfig) {
        for p in &self.particles {
            let life = (1.0 - p.age / p.max_age).clamp(0.0, 1.0);
            // Quadratic fade, smoother near the end.
            let alpha = life * life * cfg.alpha;
            let [r, g, b] = SMOKE_RGB;
            buf.push(SceneInstance {
                position: p.pos.into(),
                size: [p.size * 2.0, p.size * 2.0],
                color: pack_rgba(r, g, b, alpha),
                shape: SHAPE_SMOKE,
                param: p.age,
            });
        }
    }

    /// Number of active particles.
    pub fn count(&self) -> usize {
        self.particles.len()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_spawns_configured_count_around_origin() {
        let cfg = SmokeConfig::default();
        let mut rng = fastrand::Rng::with_seed(2);
        let mut smoke = ParticleSystem::new(cfg.max_particles);
        smoke.spawn_smoke(Vec2::new(100.0, 100.0), &cfg, &mut rng);

        assert_eq!(smoke.count(), cfg.particle_count);
        for p in &smoke.particles {
            assert!((p.pos.x - 100.0).abs() <= cfg.spread / 2.0);
            assert!((p.pos.y - 100.0).abs() <= cfg.spread / 2.0);
            // Smoke always rises.
            assert!(p.vel.y < 0.0);
        }
    }

    #[test]
    fn particles_grow_but_cap_at_three_times() {
        let cfg = SmokeConfig { expansion_rate: 1.0, ..SmokeConfig::default() };
        let mut rng = fastrand::Rng::with_seed(4);
        let mut smoke = ParticleSystem::new(cfg.max_particles);
        smoke.spawn_smoke(Vec2::ZERO, &cfg, &mut rng);
        for _ in 0..40 {
            smoke.update(&cfg);
        }
        for p in &smoke.particles {
            assert!(p.size <= p.initial_size * 3.0 + 1e-4);
            assert!(p.size > p.initial_size);
        }
    }

    #[test]
    fn all_particles_die_after_max_life() {
        let cfg = SmokeConfig::default();
        let mut rng = fastrand::Rng::with_seed(9);
        let mut smoke = ParticleSystem::new(cfg.max_particles);
        smoke.spawn_smoke(Vec2::new(50.0, 50.0), &cfg, &mut rng);
        for _ in 0..(cfg.life_max as usize + 1) {
            smoke.update(&cfg);
        }
        assert_eq!(smoke.count(), 0);
    }

    #[test]
    fn non_finite_origin_spawns_nothing() {
        let cfg = SmokeConfig::default();
        let mut rng = fastrand::Rng::with_seed(1);
        let mut smoke = ParticleSystem::new(cfg.max_particles);
        smoke.spawn_smoke(Vec2::new(f32::NAN, 0.0), &cfg, &mut rng);
        assert_eq!(smoke.count(), 0);
    }

    #[test]
    fn respects_particle_cap() {
        let cfg = SmokeConfig { max_particles: 100, ..SmokeConfig::default() };
        let mut rng = fastrand::Rng::with_seed(1);
        let mut smoke = ParticleSystem::new(cfg.max_particles);
        smoke.spawn_smoke(Vec2::ZERO, &cfg, &mut rng);
        smoke.spawn_smoke(Vec2::ZERO, &cfg, &mut rng);
        assert_eq!(smoke.count(), 100);
    }

    #[test]
    fn instances_fade_as_particles_age() {
        let cfg = SmokeConfig { particle_count: 1, ..SmokeConfig::default() };
        let mut rng = fastrand::Rng::with_seed(6);
        let mut smoke = ParticleSystem::new(8);
        smoke.spawn_smoke(Vec2::ZERO, &cfg, &mut rng);

        let mut buf = Vec::new();
        smoke.build_instances(&mut buf, &cfg);
        let fresh = buf[0].color & 0xFF;

        for _ in 0..40 {
            smoke.update(&cfg);
        }
        buf.clear();
        smoke.build_instances(&mut buf, &cfg);
        let older = buf[0].color & 0xFF;
        assert!(older < fresh);
        assert_eq!(buf[0].shape, SHAPE_SMOKE);
    }
}
