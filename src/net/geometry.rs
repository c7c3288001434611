use glam::Vec2;

/// Axis-aligned bounding rectangle of the net, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NetRect {
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            ..*self
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// The capture zone: a sideways parabola opening toward the rectangle's right
/// edge and passing through both right corners.
///
/// `y = vertex.y ± sqrt(4a (x - vertex.x))` for `vertex.x <= x <= rect.right()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parabola {
    pub rect: NetRect,
    pub vertex: Vec2,
    /// Focal coefficient solved from the top-right corner.
    pub a: f32,
}

impl Parabola {
    /// Derive the parabola for a net rectangle. Returns `None` when the
    /// horizontal span between vertex and right edge is zero or the rectangle
    /// is not finite, so callers never divide by zero.
    pub fn from_rect(rect: NetRect, vertex_ratio: f32) -> Option<Self> {
        if !rect.is_finite() || !vertex_ratio.is_finite() {
            return None;
        }
        let vertex = Vec2::new(rect.x + rect.width * vertex_ratio, rect.y + rect.height / 2.0);
        let corner_x = rect.right() - vertex.x;
        let corner_y = rect.y - vertex.y;
        if corner_x <= f32::EPSILON {
            return None;
        }
        let a = (corner_y * corner_y) / (4.0 * corner_x);
        if !a.is_finite() {
            return None;
        }
        Some(Self { rect, vertex, a })
    }

    /// Distance from the axis to either arm at `x`, or `None` outside the
    /// vertex..right-edge range.
    pub fn half_span(&self, x: f32) -> Option<f32> {
        if !(x >= self.vertex.x && x <= self.rect.right()) {
            return None;
        }
        Some((4.0 * self.a * (x - self.vertex.x)).sqrt())
    }

    /// Upper and lower arm y at `x`.
    pub fn arms(&self, x: f32) -> Option<(f32, f32)> {
        self.half_span(x)
            .map(|h| (self.vertex.y - h, self.vertex.y + h))
    }

    pub fn contains(&self, p: Vec2) -> bool {
        match self.arms(p.x) {
            Some((top, bottom)) => p.y >= top && p.y <= bottom,
            None => false,
        }
    }

    /// Push a point back inside the net. Rectangle edges first (inset by
    /// `edge_inset`), then the x range of the parabola, then both arms at the
    /// clamped x (inset by `arm_margin` where the mouth is wide enough).
    /// The result always satisfies [`Parabola::contains`].
    pub fn clamp_inside(&self, p: Vec2, edge_inset: f32, arm_margin: f32) -> Vec2 {
        if !p.is_finite() {
            return self.vertex;
        }
        let r = &self.rect;
        let mut x = p.x;
        let mut y = p.y;

        if x < r.x {
            x = r.x + edge_inset;
        }
        if x > r.right() {
            x = r.right() - edge_inset;
        }
        if y < r.y {
            y = r.y + edge_inset;
        }
        if y > r.bottom() {
            y = r.bottom() - edge_inset;
        }

        x = x.clamp(self.vertex.x, r.right());

        let half = self.half_span(x).unwrap_or(0.0);
        let top = self.vertex.y - half;
        let bottom = self.vertex.y + half;
        if y < top {
            y = if half > arm_margin { top + arm_margin } else { self.vertex.y };
        }
        if y > bottom {
            y = if half > arm_margin { bottom - arm_margin } else { self.vertex.y };
        }

        Vec2::new(x, y)
    }
}

/// Containment test straight from a rectangle. Degenerate nets contain nothing.
pub fn is_point_inside_parabola(p: Vec2, rect: NetRect, vertex_ratio: f32) -> bool {
    Parabola::from_rect(rect, vertex_ratio).is_some_and(|parabola| parabola.contains(p))
}

/// Blend between the previous and current tick for smooth rendering.
pub fn interpolate(prev: Vec2, current: Vec2, alpha: f32) -> Vec2 {
    Vec2::lerp(prev, current, alpha.clamp(0.0, 1.0))
}
