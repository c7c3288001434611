use glam::Vec2;

use crate::config::SceneConfig;
use crate::fish::{CaptureState, Fish};
use crate::net::geometry::Parabola;
use crate::net::stack::{stack_target, SlotAllocator};

/// What the orchestrator should do with a fish after one capture step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureOutcome {
    /// Still swimming free; nothing happened.
    Free,
    /// Inside the net, on its way to a slot.
    Capturing,
    /// Reached its slot. Move it to the caught collection.
    Caught { position: Vec2, slot: usize },
}

/// Run one frame of the capture state machine for `fish`.
///
/// `index` is the fish's position in the free list and seeds the cosmetic
/// wobble phase. `time` is scene time in milliseconds.
///
/// Once a fish has left `Free` it is never put back: if the net drifts away
/// from it, the fish is clamped back inside instead.
pub fn process_fish(
    fish: &mut Fish,
    index: usize,
    parabola: &Parabola,
    time: f32,
    slots: &mut SlotAllocator,
    config: &SceneConfig,
) -> CaptureOutcome {
    let cap = &config.capture;

    match fish.state {
        CaptureState::Caught { slot, .. } => {
            return CaptureOutcome::Caught { position: fish.pos, slot };
        }
        CaptureState::Free => {
            if !parabola.contains(fish.pos) {
                return CaptureOutcome::Free;
            }
            fish.state = CaptureState::Entering;
        }
        CaptureState::Entering | CaptureState::Approaching { .. } => {}
    }

    // The net holds on to anything inside it.
    fish.pos = parabola.clamp_inside(fish.pos, cap.escape_offset, cap.parabola_margin);

    if fish.state == CaptureState::Entering {
        let slot = slots.reserve();
        let target = stack_target(parabola, slot, &config.stack);
        fish.state = CaptureState::Approaching {
            target,
            slot,
            frames: 0,
            anchor: parabola.rect.origin(),
        };
    }

    let CaptureState::Approaching { target, slot, frames, anchor } = fish.state else {
        return CaptureOutcome::Capturing;
    };

    let before = fish.pos;
    approach_step(fish, target, cap.approach_speed_multiplier, cap.ease_distance, cap.ease_floor);

    let phase = index as f32;
    fish.pos.y += (time * cap.wobble_frequency + phase).sin() * cap.wobble_amplitude;
    fish.pos.x += (time * cap.drift_frequency + phase).cos() * cap.drift_amplitude;
    fish.vel = fish.pos - before;

    let frames = frames.saturating_add(1);
    let arrived = fish.pos.distance(target) < cap.detection_radius;
    if arrived || frames >= cap.max_approach_frames || !fish.pos.is_finite() {
        if !arrived {
            log::warn!("fish {:?} did not settle after {frames} frames, snapping", fish.id);
        }
        fish.pos = target;
        fish.vel = Vec2::ZERO;
        fish.state = CaptureState::Caught { caught_time: time, slot, net_anchor: anchor };
        return CaptureOutcome::Caught { position: target, slot };
    }

    fish.state = CaptureState::Approaching { target, slot, frames, anchor };
    CaptureOutcome::Capturing
}

/// Move toward `target` at a fraction of swim speed, slowing down over the
/// last `ease_distance` pixels but never below `ease_floor` of the full step.
fn approach_step(fish: &mut Fish, target: Vec2, multiplier: f32, ease_distance: f32, ease_floor: f32) {
    let to_target = target - fish.pos;
    let dist = to_target.length();
    if dist <= f32::EPSILON {
        return;
    }
    let ease = if ease_distance > 0.0 {
        (dist / ease_distance).clamp(ease_floor, 1.0)
    } else {
        1.0
    };
    let step = (fish.speed * multiplier * ease).min(dist);
    fish.pos += to_target / dist * step;
}

/// Pull every fish still on its way into its slot immediately. Used when the
/// session ends so no fish is left mid-approach while the net slides away.
pub fn settle(fish: &mut Fish, time: f32) -> Option<usize> {
    match fish.state {
        CaptureState::Approaching { target, slot, anchor, .. } => {
            fish.pos = target;
            fish.vel = Vec2::ZERO;
            fish.state = CaptureState::Caught { caught_time: time, slot, net_anchor: anchor };
            Some(slot)
        }
        _ => None,
    }
}
