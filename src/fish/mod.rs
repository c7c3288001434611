pub mod factory;
pub mod swim;

use glam::Vec2;

/// Stable fish identity. Assigned once, never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FishId(pub u64);

/// Monotonic id source, owned by the scene rather than held as module state.
#[derive(Debug)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> FishId {
        let id = FishId(self.next);
        self.next += 1;
        id
    }
}

/// Where a fish is in the capture lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureState {
    /// Swimming left, untouched by the net.
    Free,
    /// Crossed into the net this frame; target not assigned yet.
    Entering,
    /// Being guided to its stacking slot.
    Approaching {
        target: Vec2,
        slot: usize,
        /// Frames spent approaching so far.
        frames: u32,
        /// Net origin when `target` was assigned; `target` is relative to it.
        anchor: Vec2,
    },
    /// Resting in the stack. Terminal until the session is reset.
    Caught {
        caught_time: f32,
        slot: usize,
        /// Net origin the slot was computed against; the stack follows the
        /// net from here.
        net_anchor: Vec2,
    },
}

impl CaptureState {
    pub fn is_free(&self) -> bool {
        matches!(self, CaptureState::Free)
    }

    /// Entering or approaching: inside the net but not yet stacked.
    pub fn is_capturing(&self) -> bool {
        matches!(self, CaptureState::Entering | CaptureState::Approaching { .. })
    }

    pub fn is_caught(&self) -> bool {
        matches!(self, CaptureState::Caught { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Species {
    Bass,
    Trout,
    Catfish,
    Pike,
}

impl Species {
    pub const ALL: [Species; 4] = [Species::Bass, Species::Trout, Species::Catfish, Species::Pike];

    /// Body color, RGBA packed as u32.
    pub fn color(self) -> u32 {
        let [r, g, b] = match self {
            Species::Bass => [74, 163, 98],
            Species::Trout => [115, 140, 166],
            Species::Catfish => [140, 100, 60],
            Species::Pike => [64, 89, 115],
        };
        (r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | 0xFF
    }

    pub fn random(rng: &mut fastrand::Rng) -> Self {
        Self::ALL[rng.usize(0..Self::ALL.len())]
    }
}

#[derive(Debug, Clone)]
pub struct Fish {
    pub id: FishId,
    /// Current position in canvas pixels.
    pub pos: Vec2,
    /// Previous tick's position, for render interpolation.
    pub prev_pos: Vec2,
    /// Displacement applied last frame.
    pub vel: Vec2,
    /// Base swim speed in pixels per frame.
    pub speed: f32,
    pub size: f32,
    pub opacity: f32,
    /// Accumulated bobbing phase.
    pub swim_phase: f32,
    /// Per-fish animation offset so the school doesn't wag in sync.
    pub wave_offset: f32,
    pub species: Species,
    pub state: CaptureState,
}

impl Fish {
    /// Where to draw this fish given the current net origin. Caught fish ride
    /// along with the net; everything else is drawn where it is.
    pub fn display_pos(&self, net_origin: Vec2) -> Vec2 {
        match self.state {
            CaptureState::Caught { net_anchor, .. } => self.pos + (net_origin - net_anchor),
            _ => self.pos,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite()
            && self.vel.is_finite()
            && self.speed.is_finite()
            && self.size.is_finite()
            && self.opacity.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let mut ids = IdSequence::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(b > a);
        assert_ne!(a, b);
    }

    #[test]
    fn caught_fish_follow_the_net() {
        let mut fish = factory::tests::sample_fish(Vec2::new(100.0, 50.0));
        assert_eq!(fish.display_pos(Vec2::new(9.0, 9.0)), fish.pos);

        fish.state = CaptureState::Caught {
            caught_time: 0.0,
            slot: 0,
            net_anchor: Vec2::new(10.0, 20.0),
        };
        assert_eq!(fish.display_pos(Vec2::new(13.0, 18.0)), Vec2::new(103.0, 48.0));
    }

    #[test]
    fn state_predicates() {
        assert!(CaptureState::Free.is_free());
        assert!(CaptureState::Entering.is_capturing());
        let approaching = CaptureState::Approaching {
            target: Vec2::ZERO,
            slot: 0,
            frames: 0,
            anchor: Vec2::ZERO,
        };
        assert!(approaching.is_capturing());
        assert!(!approaching.is_caught());
    }
}
