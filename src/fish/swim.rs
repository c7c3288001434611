use glam::Vec2;

use crate::config::FishConfig;
use super::Fish;

/// Advance a free fish by one frame: steady leftward swim plus a gentle bob.
/// Fish inside the net are driven by the capture state machine instead.
pub fn swim(fish: &mut Fish, cfg: &FishConfig) {
    if !fish.state.is_free() {
        return;
    }

    let bob = fish.swim_phase.sin() * cfg.bob_amplitude;
    fish.swim_phase += cfg.swim_phase_step;

    fish.vel = Vec2::new(-fish.speed, bob);
    fish.pos += fish.vel;
}

/// True once a free fish has fully left the screen on the left.
pub fn is_off_screen(fish: &Fish) -> bool {
    fish.state.is_free() && fish.pos.x <= -fish.size
}
