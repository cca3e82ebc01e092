//! Rectangle math in image pixel space (origin top-left, y down).
//!
//! Everything here is pure. Callers are expected to normalize before
//! clamping; [`clamp_to_bounds`] normalizes anyway so its output is always
//! contained in the image.

use serde::{Deserialize, Serialize};

/// Smallest side length, in image pixels, a box may have.
pub const MIN_SIZE: f32 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector {
    pub dx: f32,
    pub dy: f32,
}

impl Vector {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

impl std::ops::Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

impl std::ops::Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Pixel dimensions of the image being annotated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageSize {
    pub width: f32,
    pub height: f32,
}

impl ImageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Clamps a point into `[0, width] x [0, height]`.
    pub fn clamp_point(&self, p: Point) -> Point {
        Point::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }
}

/// Axis-aligned box. Width and height may be negative while a gesture is in
/// progress; stored boxes are always normalized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero-extent box anchored at `p`.
    pub fn at(p: Point) -> Self {
        Self::new(p.x, p.y, 0.0, 0.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        let r = normalize(*self);
        p.x >= r.x && p.x <= r.right() && p.y >= r.y && p.y <= r.bottom()
    }

    pub fn translated(&self, v: Vector) -> Self {
        Self::new(self.x + v.dx, self.y + v.dy, self.width, self.height)
    }
}

/// Flips the origin of a box with negative width or height so both become
/// non-negative. The covered area is unchanged.
pub fn normalize(rect: BoundingBox) -> BoundingBox {
    BoundingBox {
        x: rect.x.min(rect.x + rect.width),
        y: rect.y.min(rect.y + rect.height),
        width: rect.width.abs(),
        height: rect.height.abs(),
    }
}

/// Fits `rect` inside the image: the origin is shifted first so the size is
/// kept, and the size shrinks only when the box is larger than the image.
pub fn clamp_to_bounds(rect: BoundingBox, bounds: ImageSize) -> BoundingBox {
    let r = normalize(rect);
    let x = r.x.min(bounds.width - r.width).max(0.0);
    let y = r.y.min(bounds.height - r.height).max(0.0);
    BoundingBox {
        x,
        y,
        width: r.width.min(bounds.width - x),
        height: r.height.min(bounds.height - y),
    }
}

/// Exclusive threshold: a side of exactly [`MIN_SIZE`] is too small.
pub fn meets_minimum_size(rect: BoundingBox) -> bool {
    rect.width.abs() > MIN_SIZE && rect.height.abs() > MIN_SIZE
}

/// Intersection over union of two normalized boxes.
///
/// Returns `NaN` when both boxes have zero area, since the union is empty.
pub fn iou(a: BoundingBox, b: BoundingBox) -> f32 {
    let left = a.x.max(b.x);
    let top = a.y.max(b.y);
    let right = a.right().min(b.right());
    let bottom = a.bottom().min(b.bottom());
    let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
    intersection / (a.area() + b.area() - intersection)
}
