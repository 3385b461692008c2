//! Organ geometry for the simplified thyroid model.
//! The gland is an axis-aligned ellipse in canvas pixel coordinates.

use std::f64::consts::PI;

use rand::Rng;
use serde::Serialize;

use crate::error::{SimError, SimResult};

/// A single emission location in canvas pixels.
pub type Point = [f64; 2];

/// Semi-axis of the organ along x, as a fraction of the canvas size.
const SEMI_AXIS_X: f64 = 0.65;
/// Semi-axis of the organ along y, as a fraction of the canvas size.
const SEMI_AXIS_Y: f64 = 0.38;

/// Axis-aligned ellipse with center (cx, cy) and semi-axes (a, b).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrganRegion {
    pub cx: f64,
    pub cy: f64,
    pub a: f64,
    pub b: f64,
}

/// Outline handed to the rendering layer: center plus full width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionOutline {
    pub center: Point,
    pub width: f64,
    pub height: f64,
}

impl OrganRegion {
    pub fn new(cx: f64, cy: f64, a: f64, b: f64) -> SimResult<Self> {
        if !(a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0) {
            return Err(SimError::invalid_region(format!(
                "semi-axes must be positive, got a={a}, b={b}"
            )));
        }
        if !(cx.is_finite() && cy.is_finite()) {
            return Err(SimError::invalid_region(format!(
                "center must be finite, got ({cx}, {cy})"
            )));
        }
        Ok(OrganRegion { cx, cy, a, b })
    }

    /// Default gland shape centered on a square canvas of `size` pixels.
    pub fn for_canvas(size: f64) -> SimResult<Self> {
        let half = size / 2.0;
        Self::new(half, half, SEMI_AXIS_X * size, SEMI_AXIS_Y * size)
    }

    /// Same center, both semi-axes multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> SimResult<Self> {
        Self::new(self.cx, self.cy, self.a * factor, self.b * factor)
    }

    /// Normalized elliptical radius squared; `<= 1` means inside.
    pub fn norm_sq(&self, x: f64, y: f64) -> f64 {
        let dx = (x - self.cx) / self.a;
        let dy = (y - self.cy) / self.b;
        dx * dx + dy * dy
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.norm_sq(x, y) <= 1.0
    }

    pub fn area(&self) -> f64 {
        PI * self.a * self.b
    }

    pub fn outline(&self) -> RegionOutline {
        RegionOutline {
            center: [self.cx, self.cy],
            width: 2.0 * self.a,
            height: 2.0 * self.b,
        }
    }

    /// Point on the boundary at parametric angle `theta`.
    pub fn boundary_point(&self, theta: f64) -> Point {
        [
            self.cx + self.a * theta.cos(),
            self.cy + self.b * theta.sin(),
        ]
    }
}

/// Unnormalized axis-aligned 2D gaussian, 1.0 at (mx, my).
pub fn gaussian(x: f64, y: f64, mx: f64, my: f64, sx: f64, sy: f64) -> f64 {
    let u = (x - mx) / sx;
    let v = (y - my) / sy;
    (-0.5 * (u * u + v * v)).exp()
}

/// Area-uniform points inside the ellipse.
///
/// Polar method: theta ~ U[0, 2pi), r = sqrt(U[0, 1)). The square root
/// compensates for the ring area growing with r, so the density is flat in
/// area instead of piling up at the center.
pub fn uniform_points<R: Rng + ?Sized>(region: &OrganRegion, n: usize, rng: &mut R) -> Vec<Point> {
    let mut points = Vec::with_capacity(n);
    for _ in 0..n {
        let theta = rng.gen::<f64>() * 2.0 * PI;
        let r = rng.gen::<f64>().sqrt();
        points.push([
            region.cx + region.a * r * theta.cos(),
            region.cy + region.b * r * theta.sin(),
        ]);
    }
    points
}
