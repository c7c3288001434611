use glam::Vec2;

use crate::config::StackConfig;
use super::geometry::Parabola;

/// Hands out stacking slots. A slot is reserved the moment a fish starts its
/// approach, so two fish entering in the same frame never share a target.
#[derive(Debug, Default)]
pub struct SlotAllocator {
    next: usize,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// The slot the next reservation will receive.
    pub fn peek(&self) -> usize {
        self.next
    }

    pub fn reserve(&mut self) -> usize {
        let slot = self.next;
        self.next += 1;
        slot
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// Resting position for the fish in `slot` inside `parabola`.
///
/// Slots 0..4 use the hand-placed cluster next to the vertex. Later slots walk
/// an outward spiral centred further into the mouth. Every result is pulled
/// inside the arms and the vertex..right-edge band, so the stack never leaves
/// the net however large it grows. The result is always finite: a slot the
/// spiral cannot place falls back to the point nearest the vertex.
pub fn stack_target(parabola: &Parabola, slot: usize, cfg: &StackConfig) -> Vec2 {
    let vertex = parabola.vertex;

    let raw = match cfg.cluster.get(slot) {
        Some(offset) => vertex + *offset,
        None => {
            let n = (slot - cfg.cluster.len()) as f32;
            let radius = cfg.spiral_base_radius + n * cfg.spiral_growth;
            let angle = n * cfg.spiral_angle_step;
            Vec2::new(
                vertex.x + cfg.spiral_offset_x + radius * angle.cos(),
                vertex.y + radius * angle.sin(),
            )
        }
    };

    let target = if raw.is_finite() { keep_in_net(parabola, raw, cfg) } else { raw };
    if target.is_finite() {
        return target;
    }
    log::debug!("slot {slot} has no finite stack position, using the vertex");
    let fallback = keep_in_net(parabola, vertex, cfg);
    if fallback.is_finite() {
        fallback
    } else {
        vertex
    }
}

fn keep_in_net(parabola: &Parabola, p: Vec2, cfg: &StackConfig) -> Vec2 {
    let vertex = parabola.vertex;
    let right = parabola.rect.right();

    let lo = vertex.x + cfg.vertex_margin;
    let hi = right - cfg.right_margin;
    let x = if lo <= hi {
        p.x.clamp(lo, hi)
    } else {
        // Net too small for both margins.
        (vertex.x + right) / 2.0
    };

    let half = parabola.half_span(x).unwrap_or(0.0);
    let y = if half > cfg.arm_margin {
        p.y.clamp(vertex.y - half + cfg.arm_margin, vertex.y + half - cfg.arm_margin)
    } else {
        p.y.clamp(vertex.y - half, vertex.y + half)
    };

    Vec2::new(x, y)
}
