use glam::Vec2;

use crate::capture::{self, CaptureOutcome};
use crate::config::SceneConfig;
use crate::fish::factory::spawn_fish;
use crate::fish::swim::{is_off_screen, swim};
use crate::fish::{Fish, FishId, IdSequence};
use crate::net::geometry::{NetRect, Parabola};
use crate::net::stack::SlotAllocator;
use crate::net::{detach_offset, net_position};
use crate::particles::ParticleSystem;

/// A fish reached its slot this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureEvent {
    pub fish_id: FishId,
    pub slot: usize,
    /// Final resting position, exactly the stack target.
    pub position: Vec2,
}

/// What happened during one [`Scene::tick`].
#[derive(Debug, Default)]
pub struct FrameReport {
    pub captures: Vec<CaptureEvent>,
    pub spawned: usize,
    pub despawned: usize,
}

/// Session lifecycle. Times are scene milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionPhase {
    /// Fish spawn and can be caught until `ends_at`.
    Playing { ends_at: f32 },
    /// Time is up; the net slides away with its catch.
    Detaching { started: f32, score: usize },
    GameOver { score: usize },
}

/// Owns every collection the frame touches. One `tick` is one frame; nothing
/// else mutates the fish lists.
pub struct Scene {
    config: SceneConfig,
    free: Vec<Fish>,
    caught: Vec<Fish>,
    particles: ParticleSystem,
    ids: IdSequence,
    slots: SlotAllocator,
    rng: fastrand::Rng,
    canvas: Vec2,
    last_spawn: f32,
    phase: SessionPhase,
    time: f32,
}

impl Scene {
    pub fn new(config: SceneConfig, canvas: Vec2, seed: u64, now: f32) -> Self {
        let particles = ParticleSystem::new(config.smoke.max_particles);
        let mut scene = Self {
            config,
            free: Vec::new(),
            caught: Vec::new(),
            particles,
            ids: IdSequence::new(),
            slots: SlotAllocator::new(),
            rng: fastrand::Rng::with_seed(seed),
            canvas,
            last_spawn: now,
            phase: SessionPhase::GameOver { score: 0 },
            time: now,
        };
        scene.start_session(now);
        scene
    }

    /// Drop everything from the previous session and start a fresh one.
    /// Fish ids keep counting up.
    pub fn reset(&mut self, now: f32) {
        log::info!("resetting session ({} fish were caught)", self.caught.len());
        self.free.clear();
        self.caught.clear();
        self.particles.clear();
        self.slots.reset();
        self.start_session(now);
    }

    fn start_session(&mut self, now: f32) {
        let s = &self.config.session;
        let secs = self.rng.u32(s.duration_min_secs..=s.duration_max_secs);
        self.time = now;
        self.last_spawn = now;
        self.phase = SessionPhase::Playing { ends_at: now + secs as f32 * 1000.0 };

        for _ in 0..self.config.spawn.initial_count {
            self.spawn_one();
        }
        log::info!(
            "session started: {secs}s, {} fish in the water",
            self.free.len()
        );
    }

    fn spawn_one(&mut self) -> bool {
        let spawned = spawn_fish(
            self.canvas.x,
            self.canvas.y,
            &self.free,
            &self.config,
            &mut self.ids,
            &mut self.rng,
        );
        match spawned {
            Some(fish) => {
                self.free.push(fish);
                true
            }
            None => false,
        }
    }

    /// Advance the scene by one frame at scene time `now` (ms).
    pub fn tick(&mut self, canvas: Vec2, now: f32) -> FrameReport {
        let mut report = FrameReport::default();
        self.canvas = canvas;
        self.time = now;
        let playing = matches!(self.phase, SessionPhase::Playing { .. });

        // --- Swim ---
        for fish in &mut self.free {
            fish.prev_pos = fish.pos;
            swim(fish, &self.config.fish);
        }

        // --- Despawn / respawn ---
        let before = self.free.len();
        self.free.retain(|f| !is_off_screen(f));
        report.despawned = before - self.free.len();

        if playing {
            if self.config.spawn.respawn_on_exit {
                for _ in 0..report.despawned {
                    report.spawned += self.spawn_one() as usize;
                }
            }
            if now - self.last_spawn >= self.config.spawn.interval_ms {
                self.last_spawn = now;
                report.spawned += self.spawn_one() as usize;
            }
        }

        self.update_phase(now);

        // --- Capture ---
        if matches!(self.phase, SessionPhase::Playing { .. }) {
            self.capture_pass(now, &mut report);
        }

        // --- Effects ---
        for event in &report.captures {
            self.particles
                .spawn_smoke(event.position, &self.config.smoke, &mut self.rng);
        }
        self.particles.update(&self.config.smoke);

        report
    }

    fn capture_pass(&mut self, now: f32, report: &mut FrameReport) {
        let rect = self.net_rect(now);
        let Some(parabola) = Parabola::from_rect(rect, self.config.net.vertex_ratio) else {
            log::trace!("degenerate net {rect:?}, skipping capture");
            return;
        };

        // Reverse order so removals never shift a fish that is still pending.
        for i in (0..self.free.len()).rev() {
            let outcome = capture::process_fish(
                &mut self.free[i],
                i,
                &parabola,
                now,
                &mut self.slots,
                &self.config,
            );
            if let CaptureOutcome::Caught { position, slot } = outcome {
                let fish = self.free.remove(i);
                log::debug!("caught fish {:?} in slot {slot} at {position:?}", fish.id);
                report.captures.push(CaptureEvent { fish_id: fish.id, slot, position });
                self.caught.push(fish);
            }
        }
    }

    fn update_phase(&mut self, now: f32) {
        match self.phase {
            SessionPhase::Playing { ends_at } if now >= ends_at => {
                self.settle_pending(now);
                let score = self.caught.len();
                log::info!("time is up, {score} fish caught");
                self.phase = SessionPhase::Detaching { started: now, score };
            }
            SessionPhase::Detaching { started, score }
                if now - started >= self.config.session.detach_duration_ms =>
            {
                log::info!("game over, final score {score}");
                self.phase = SessionPhase::GameOver { score };
            }
            _ => {}
        }
    }

    /// Fish still approaching when time runs out drop straight into their slots.
    fn settle_pending(&mut self, now: f32) {
        let mut i = 0;
        while i < self.free.len() {
            match capture::settle(&mut self.free[i], now) {
                Some(slot) => {
                    let fish = self.free.remove(i);
                    log::debug!("settled fish {:?} in slot {slot}", fish.id);
                    self.caught.push(fish);
                }
                None => i += 1,
            }
        }
    }

    /// Net rectangle at `now`, including the detach slide.
    pub fn net_rect(&self, now: f32) -> NetRect {
        let rect = net_position(self.canvas.x, self.canvas.y, now, &self.config.net);
        let progress = match self.phase {
            SessionPhase::Playing { .. } => return rect,
            SessionPhase::Detaching { started, .. } => {
                (now - started) / self.config.session.detach_duration_ms
            }
            SessionPhase::GameOver { .. } => 1.0,
        };
        rect.translated(Vec2::new(detach_offset(progress, self.canvas.x), 0.0))
    }

    pub fn score(&self) -> usize {
        match self.phase {
            SessionPhase::Playing { .. } => self.caught.len(),
            SessionPhase::Detaching { score, .. } | SessionPhase::GameOver { score } => score,
        }
    }

    /// Whole seconds left in the session, 0 once it is over.
    pub fn remaining_secs(&self) -> u32 {
        match self.phase {
            SessionPhase::Playing { ends_at } => ((ends_at - self.time) / 1000.0).ceil().max(0.0) as u32,
            _ => 0,
        }
    }

    pub fn free(&self) -> &[Fish] {
        &self.free
    }

    pub fn caught(&self) -> &[Fish] {
        &self.caught
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        &mut self.particles
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn canvas(&self) -> Vec2 {
        self.canvas
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::fish::factory::tests::sample_fish;
    use crate::fish::CaptureState;
    use crate::net::stack::stack_target;

    const W: f32 = 1000.0;
    const H: f32 = 800.0;

    /// Still net covering x in [300, 900], one fish at y = 560, no timed spawns.
    fn still_net_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.net.x_offset_ratio = 0.3;
        config.net.width_ratio = 0.6;
        config.net.horizontal_amplitude = 0.0;
        config.net.vertical_amplitude = 0.0;
        config.fish.spawn_band = [0.7, 0.7];
        config.spawn.initial_count = 1;
        config.spawn.interval_ms = 1.0e9;
        config.session.duration_min_secs = 1000;
        config.session.duration_max_secs = 1000;
        config
    }

    fn frame_ms(scene: &Scene) -> f32 {
        scene.config.session.frame_duration_ms
    }

    #[test]
    fn fish_swims_into_net_and_lands_in_first_slot() {
        let mut scene = Scene::new(still_net_config(), Vec2::new(W, H), 42, 0.0);
        assert_eq!(scene.free().len(), 1);
        let id = scene.free()[0].id;
        assert_eq!(scene.free()[0].pos.x, W + 100.0);

        let mut events = Vec::new();
        for frame in 1..=1000 {
            let now = frame as f32 * frame_ms(&scene);
            events.extend(scene.tick(Vec2::new(W, H), now).captures);
            if !scene.caught().is_empty() {
                break;
            }
        }

        assert_eq!(scene.caught().len(), 1);
        assert!(scene.free().iter().all(|f| f.id != id));

        let rect = scene.net_rect(scene.time());
        let parabola = Parabola::from_rect(rect, scene.config.net.vertex_ratio).unwrap();
        let expected = stack_target(&parabola, 0, &scene.config.stack);
        let fish = &scene.caught()[0];
        assert_eq!(fish.id, id);
        assert_eq!(fish.pos, expected);
        assert!(parabola.contains(fish.pos));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fish_id, id);
        assert_eq!(events[0].slot, 0);
        assert_eq!(events[0].position, expected);
        assert!(scene.particles().count() > 0);
    }

    #[test]
    fn caught_fish_stay_inside_a_hovering_net() {
        let mut config = SceneConfig::default();
        config.session.duration_min_secs = 1000;
        config.session.duration_max_secs = 1000;
        assert!(config.net.horizontal_amplitude > 0.0 && config.net.vertical_amplitude > 0.0);
        let canvas = Vec2::new(1280.0, 720.0);
        let max_frames = config.capture.max_approach_frames;

        let mut total_caught = 0;
        for seed in 0..8 {
            let mut scene = Scene::new(config.clone(), canvas, seed, 0.0);
            let mut entered: HashMap<FishId, u32> = HashMap::new();

            for frame in 1..=3000u32 {
                let now = frame as f32 * frame_ms(&scene);
                let report = scene.tick(canvas, now);

                for fish in scene.free().iter().filter(|f| f.state.is_capturing()) {
                    entered.entry(fish.id).or_insert(frame);
                }
                // Arrived on its own rather than through the frame-cap snap.
                for event in &report.captures {
                    let start = entered.get(&event.fish_id).copied().unwrap_or(frame);
                    assert!(
                        frame - start < max_frames - 1,
                        "seed {seed}: fish {:?} took {} frames",
                        event.fish_id,
                        frame - start
                    );
                }

                let rect = scene.net_rect(now);
                let parabola = Parabola::from_rect(rect, scene.config.net.vertex_ratio).unwrap();
                for fish in scene.caught() {
                    let CaptureState::Caught { slot, .. } = fish.state else {
                        panic!("caught list holds {:?}", fish.state);
                    };
                    let shown = fish.display_pos(rect.origin());
                    assert!(
                        parabola.contains(shown),
                        "seed {seed} frame {frame}: slot {slot} drawn at {shown:?} outside the net"
                    );
                    let expected = stack_target(&parabola, slot, &scene.config.stack);
                    assert!(shown.distance(expected) < 0.01, "slot {slot} drifted from its place");
                }
            }
            total_caught += scene.caught().len();
        }
        assert!(total_caught > 0);
    }

    #[test]
    fn two_fish_entering_together_get_slots_in_processing_order() {
        let mut config = still_net_config();
        config.spawn.initial_count = 0;
        let mut scene = Scene::new(config, Vec2::new(W, H), 1, 0.0);

        let mut a = sample_fish(Vec2::new(850.0, 540.0));
        a.id = FishId(100);
        let mut b = sample_fish(Vec2::new(850.0, 580.0));
        b.id = FishId(101);
        scene.free.push(a);
        scene.free.push(b);

        let now = frame_ms(&scene);
        scene.tick(Vec2::new(W, H), now);

        let rect = scene.net_rect(now);
        let parabola = Parabola::from_rect(rect, scene.config.net.vertex_ratio).unwrap();
        let assigned = |id: FishId| {
            let fish = scene.free().iter().find(|f| f.id == id).unwrap();
            match fish.state {
                CaptureState::Approaching { slot, target, .. } => (slot, target),
                other => panic!("fish {id:?} in unexpected state {other:?}"),
            }
        };

        // Reverse index order: the later fish is processed first.
        let (slot_b, target_b) = assigned(FishId(101));
        let (slot_a, target_a) = assigned(FishId(100));
        assert_eq!(slot_b, 0);
        assert_eq!(slot_a, 1);
        assert_eq!(target_b, stack_target(&parabola, 0, &scene.config.stack));
        assert_eq!(target_a, stack_target(&parabola, 1, &scene.config.stack));
        assert!(parabola.contains(target_a));
        assert!(parabola.contains(target_b));
    }

    #[test]
    fn off_screen_fish_are_replaced() {
        let mut config = still_net_config();
        config.spawn.initial_count = 0;
        let mut scene = Scene::new(config, Vec2::new(W, H), 3, 0.0);
        scene.free.push(sample_fish(Vec2::new(-100.0, 300.0)));

        let report = scene.tick(Vec2::new(W, H), frame_ms(&scene));
        assert_eq!(report.despawned, 1);
        assert_eq!(report.spawned, 1);
        assert_eq!(scene.free().len(), 1);
        assert!(scene.free()[0].pos.x > W);
    }

    #[test]
    fn session_detaches_then_ends() {
        let mut config = still_net_config();
        config.session.duration_min_secs = 1;
        config.session.duration_max_secs = 1;
        config.spawn.initial_count = 0;
        let mut scene = Scene::new(config, Vec2::new(W, H), 5, 0.0);
        assert_eq!(scene.remaining_secs(), 1);

        // A fish mid-approach when the clock runs out still counts.
        scene.free.push(sample_fish(Vec2::new(850.0, 560.0)));
        scene.tick(Vec2::new(W, H), 500.0);
        assert!(scene.free()[0].state.is_capturing());

        let resting = scene.net_rect(500.0);
        scene.tick(Vec2::new(W, H), 1000.0);
        assert!(matches!(scene.phase(), SessionPhase::Detaching { score: 1, .. }));
        assert_eq!(scene.caught().len(), 1);
        assert!(scene.free().is_empty());
        assert_eq!(scene.remaining_secs(), 0);

        let sliding = scene.net_rect(2500.0);
        assert!(sliding.x < resting.x);

        scene.tick(Vec2::new(W, H), 4000.0);
        assert_eq!(scene.phase(), SessionPhase::GameOver { score: 1 });
        assert_eq!(scene.score(), 1);
        assert_eq!(scene.net_rect(4000.0).x, resting.x - W * 1.5);
    }

    #[test]
    fn reset_clears_collections_and_keeps_ids_growing() {
        let mut scene = Scene::new(still_net_config(), Vec2::new(W, H), 8, 0.0);
        let first_id = scene.free()[0].id;
        for frame in 1..=1000 {
            scene.tick(Vec2::new(W, H), frame as f32 * frame_ms(&scene));
            if !scene.caught().is_empty() {
                break;
            }
        }
        assert_eq!(scene.caught().len(), 1);

        scene.reset(20_000.0);
        assert!(scene.caught().is_empty());
        assert_eq!(scene.particles().count(), 0);
        assert_eq!(scene.slots.peek(), 0);
        assert_eq!(scene.free().len(), 1);
        assert!(scene.free()[0].id > first_id);
        assert!(matches!(scene.phase(), SessionPhase::Playing { .. }));
        assert_eq!(scene.score(), 0);
    }

    #[test]
    fn degenerate_canvas_does_not_stall_the_frame() {
        let mut config = SceneConfig::default();
        config.spawn.initial_count = 3;
        let mut scene = Scene::new(config, Vec2::new(f32::NAN, 720.0), 2, 0.0);
        assert!(scene.free().is_empty());
        let report = scene.tick(Vec2::new(f32::NAN, 720.0), 2000.0);
        assert!(report.captures.is_empty());
        assert!(scene.free().is_empty());
    }
}
