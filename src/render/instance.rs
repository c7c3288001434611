use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::fish::{CaptureState, Fish};
use crate::net::geometry::NetRect;

use super::ocean::{BoatLayout, SKY_HEIGHT_RATIO};

// Shape kinds understood by `scene.wgsl`.
pub const SHAPE_BACKDROP: u32 = 0;
pub const SHAPE_NET: u32 = 1;
pub const SHAPE_BOAT: u32 = 2;
pub const SHAPE_DOT: u32 = 3;
pub const SHAPE_FISH: u32 = 4;
pub const SHAPE_FISH_SOFT: u32 = 5;
pub const SHAPE_SMOKE: u32 = 6;

const NET_STROKE: u32 = 0x654321FF;
const BOAT_HULL: u32 = 0x8B5A2BFF;

/// Edge blur (px) for a fish that is being pulled into the net.
const CAPTURING_BLUR: f32 = 3.0;
/// Caught fish blur grows by this many px per ms since capture...
const CAUGHT_BLUR_RATE: f32 = 0.01;
/// ...up to this many px.
const CAUGHT_BLUR_MAX: f32 = 5.0;
const CAUGHT_SIZE: f32 = 0.8;
const CAUGHT_OPACITY: f32 = 0.9;
/// Fish quad is wider than tall; body plus tail.
const FISH_ASPECT: f32 = 0.6;

/// Per-instance data uploaded to GPU each frame.
/// Stride = 28 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneInstance {
    /// Centre in canvas pixels.
    pub position: [f32; 2],
    /// Full width and height in pixels.
    pub size: [f32; 2],
    /// RGBA color packed as u32 (straight alpha).
    pub color: u32,
    /// One of the `SHAPE_*` constants.
    pub shape: u32,
    /// Shape-specific scalar: vertex ratio for the net, blur for soft fish,
    /// tail phase for fish, horizon ratio for the backdrop.
    pub param: f32,
}

/// Pack 8-bit RGB and a 0..1 alpha into the instance color layout.
pub fn pack_rgba(r: u8, g: u8, b: u8, alpha: f32) -> u32 {
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u32;
    (r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | a
}

/// Scale the alpha channel of a packed color.
pub fn with_alpha(color: u32, alpha: f32) -> u32 {
    let base = (color & 0xFF) as f32;
    let a = (base * alpha.clamp(0.0, 1.0)).round() as u32;
    (color & 0xFFFFFF00) | a
}

impl SceneInstance {
    /// Full-canvas sky and water, drawn first.
    pub fn backdrop(canvas_w: f32, canvas_h: f32) -> Self {
        Self {
            position: [canvas_w / 2.0, canvas_h / 2.0],
            size: [canvas_w, canvas_h],
            color: 0xFFFFFFFF,
            shape: SHAPE_BACKDROP,
            param: SKY_HEIGHT_RATIO,
        }
    }

    /// Net mesh and rim covering `rect`; the shader clips it to the parabola.
    pub fn net(rect: NetRect, vertex_ratio: f32) -> Self {
        Self {
            position: [rect.x + rect.width / 2.0, rect.y + rect.height / 2.0],
            size: [rect.width, rect.height],
            color: NET_STROKE,
            shape: SHAPE_NET,
            param: vertex_ratio,
        }
    }

    pub fn boat(layout: &BoatLayout) -> Self {
        Self {
            position: layout.center.into(),
            size: layout.size.into(),
            color: BOAT_HULL,
            shape: SHAPE_BOAT,
            param: 0.0,
        }
    }

    /// Round dot, used to draw the pole as a bead chain.
    pub fn dot(pos: Vec2, diameter: f32) -> Self {
        Self {
            position: pos.into(),
            size: [diameter, diameter],
            color: NET_STROKE,
            shape: SHAPE_DOT,
            param: 0.0,
        }
    }

    /// Fish at `pos` (already interpolated and net-offset by the caller).
    /// Free fish are crisp, fish inside the net are soft, caught fish shrink
    /// a little and blur more the longer they have been in the stack.
    pub fn fish(fish: &Fish, pos: Vec2, time: f32) -> Self {
        let tail = fish.wave_offset + time * 0.01;
        let (scale, opacity, shape, param) = match fish.state {
            CaptureState::Free => (1.0, fish.opacity, SHAPE_FISH, tail),
            CaptureState::Entering | CaptureState::Approaching { .. } => {
                (1.0, fish.opacity, SHAPE_FISH_SOFT, CAPTURING_BLUR)
            }
            CaptureState::Caught { caught_time, .. } => {
                let blur = ((time - caught_time).max(0.0) * CAUGHT_BLUR_RATE).min(CAUGHT_BLUR_MAX);
                (CAUGHT_SIZE, fish.opacity * CAUGHT_OPACITY, SHAPE_FISH_SOFT, blur)
            }
        };
        let width = fish.size * scale;

        Self {
            position: pos.into(),
            size: [width, width * FISH_ASPECT],
            color: with_alpha(fish.species.color(), opacity),
            shape,
            param,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fish::factory::tests::sample_fish;

    #[test]
    fn instance_stride_is_28_bytes() {
        assert_eq!(std::mem::size_of::<SceneInstance>(), 28);
    }

    #[test]
    fn packs_channels_in_rgba_order() {
        assert_eq!(pack_rgba(0x12, 0x34, 0x56, 1.0), 0x123456FF);
        assert_eq!(pack_rgba(0, 0, 0, 0.0), 0);
        assert_eq!(with_alpha(0x112233FF, 0.5), 0x11223380);
    }

    #[test]
    fn fish_shape_follows_capture_state() {
        let mut fish = sample_fish(Vec2::new(10.0, 20.0));
        let free = SceneInstance::fish(&fish, fish.pos, 0.0);
        assert_eq!(free.shape, SHAPE_FISH);
        assert_eq!(free.size[0], fish.size);

        fish.state = CaptureState::Entering;
        let soft = SceneInstance::fish(&fish, fish.pos, 0.0);
        assert_eq!(soft.shape, SHAPE_FISH_SOFT);
        assert_eq!(soft.param, CAPTURING_BLUR);

        fish.state = CaptureState::Caught { caught_time: 1000.0, slot: 0, net_anchor: Vec2::ZERO };
        let fresh = SceneInstance::fish(&fish, fish.pos, 1000.0);
        let later = SceneInstance::fish(&fish, fish.pos, 1200.0);
        let much_later = SceneInstance::fish(&fish, fish.pos, 90_000.0);
        assert!((fresh.size[0] - fish.size * CAUGHT_SIZE).abs() < 1e-4);
        assert!(later.param > fresh.param);
        assert_eq!(much_later.param, CAUGHT_BLUR_MAX);
        assert!((fresh.color & 0xFF) < (free.color & 0xFF));
    }

    #[test]
    fn net_instance_covers_rect() {
        let rect = NetRect { x: 100.0, y: 50.0, width: 200.0, height: 80.0 };
        let inst = SceneInstance::net(rect, 0.75);
        assert_eq!(inst.position, [200.0, 90.0]);
        assert_eq!(inst.size, [200.0, 80.0]);
        assert_eq!(inst.param, 0.75);
    }
}
