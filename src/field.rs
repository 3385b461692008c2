//! Uptake intensity over the organ.
//!
//! A field is the two-lobe baseline plus one pathology modulation, masked to
//! zero outside the ellipse and floored to a small positive value inside it.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{SimError, SimResult};
use crate::geometry::{gaussian, OrganRegion, Point};
use crate::pathology::Pathology;

/// Smallest weight any in-region point can carry.
pub const DEFAULT_FLOOR: f64 = 0.001;

const LOBE_OFFSET: f64 = 0.22;
const LOBE_SIGMA_X: f64 = 0.35;
const LOBE_SIGMA_Y: f64 = 0.6;
const LOBE_GAIN: f64 = 0.6;
const BASE_LEVEL: f64 = 0.4;

const NODULE_SIGMA: f64 = 0.18;
const HOT_GAIN: f64 = 1.8;
const COLD_SUPPRESSION: f64 = 0.85;

const GOITER_LEVEL: f64 = 0.9;
const GOITER_NOISE_SD: f64 = 0.05;
const GOITER_BASE_SHARE: f64 = 0.2;

const PATCHY_BASE_SHARE: f64 = 0.6;
const PATCH_COUNT: usize = 7;
const PATCH_GAIN: f64 = 0.9;

/// One gaussian blob; a negative `gain` suppresses uptake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    pub center: Point,
    pub sigma: [f64; 2],
    pub gain: f64,
}

impl Blob {
    fn eval(&self, x: f64, y: f64) -> f64 {
        self.gain * gaussian(x, y, self.center[0], self.center[1], self.sigma[0], self.sigma[1])
    }
}

/// Pathology-specific term combined with the baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum Modulation {
    None,
    /// `base + blob`
    Hot(Blob),
    /// `base * (1 - blob)`
    Cold(Blob),
    /// `level + N(0, noise_sd) + base_share * base`
    Diffuse {
        level: f64,
        noise_sd: f64,
        base_share: f64,
    },
    /// `base_share * base + sum(patches)`
    Patchy { base_share: f64, patches: Vec<Blob> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntensityField {
    region: OrganRegion,
    modulation: Modulation,
    floor: f64,
}

impl IntensityField {
    /// Build the field for `pathology` over `region`.
    ///
    /// `patch_rng` is only consumed by the patchy variant, once, to lay out
    /// its patches; reseeding it reproduces the same layout.
    pub fn build<R: Rng + ?Sized>(region: OrganRegion, pathology: Pathology, patch_rng: &mut R) -> Self {
        let (a, b) = (region.a, region.b);
        let nodule_sigma = [NODULE_SIGMA * a, NODULE_SIGMA * b];
        let modulation = match pathology {
            Pathology::Normal => Modulation::None,
            Pathology::HotNodule => Modulation::Hot(Blob {
                center: [region.cx + 0.22 * a, region.cy + 0.05 * b],
                sigma: nodule_sigma,
                gain: HOT_GAIN,
            }),
            Pathology::ColdNodule => Modulation::Cold(Blob {
                center: [region.cx + 0.22 * a, region.cy - 0.02 * b],
                sigma: nodule_sigma,
                gain: COLD_SUPPRESSION,
            }),
            Pathology::DiffuseGoiter => Modulation::Diffuse {
                level: GOITER_LEVEL,
                noise_sd: GOITER_NOISE_SD,
                base_share: GOITER_BASE_SHARE,
            },
            Pathology::PatchyAutoimmune => Modulation::Patchy {
                base_share: PATCHY_BASE_SHARE,
                patches: random_patches(&region, patch_rng),
            },
        };
        IntensityField {
            region,
            modulation,
            floor: DEFAULT_FLOOR,
        }
    }

    /// Replace the in-region minimum weight.
    pub fn with_floor(mut self, floor: f64) -> SimResult<Self> {
        if !(floor.is_finite() && floor > 0.0) {
            return Err(SimError::config(format!(
                "weight floor must be positive, got {floor}"
            )));
        }
        self.floor = floor;
        Ok(self)
    }

    pub fn region(&self) -> &OrganRegion {
        &self.region
    }

    pub fn modulation(&self) -> &Modulation {
        &self.modulation
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Two gaussian lobes left and right of center plus a constant level.
    pub fn baseline(&self, x: f64, y: f64) -> f64 {
        let r = &self.region;
        let offset = LOBE_OFFSET * r.a;
        let sx = LOBE_SIGMA_X * r.a;
        let sy = LOBE_SIGMA_Y * r.b;
        LOBE_GAIN
            * (gaussian(x, y, r.cx - offset, r.cy, sx, sy)
                + gaussian(x, y, r.cx + offset, r.cy, sx, sy))
            + BASE_LEVEL
    }

    /// Field value before masking and flooring. May be negative for patchy
    /// uptake. `noise` feeds the diffuse variant only.
    pub fn raw<R: Rng + ?Sized>(&self, x: f64, y: f64, noise: &mut R) -> f64 {
        let base = self.baseline(x, y);
        match &self.modulation {
            Modulation::None => base,
            Modulation::Hot(blob) => base + blob.eval(x, y),
            Modulation::Cold(blob) => base * (1.0 - blob.eval(x, y)),
            Modulation::Diffuse {
                level,
                noise_sd,
                base_share,
            } => {
                let z: f64 = noise.sample(StandardNormal);
                level + noise_sd * z + base_share * base
            }
            Modulation::Patchy {
                base_share,
                patches,
            } => base_share * base + patches.iter().map(|p| p.eval(x, y)).sum::<f64>(),
        }
    }

    /// Selection weight: 0 outside the organ, at least `floor` inside.
    pub fn weight<R: Rng + ?Sized>(&self, x: f64, y: f64, noise: &mut R) -> f64 {
        if !self.region.contains(x, y) {
            return 0.0;
        }
        let w = self.raw(x, y, noise);
        // NaN fails the comparison and lands on the floor
        if w > self.floor {
            w
        } else {
            self.floor
        }
    }

    pub fn weights<R: Rng + ?Sized>(&self, points: &[Point], noise: &mut R) -> Vec<f64> {
        points
            .iter()
            .map(|p| self.weight(p[0], p[1], noise))
            .collect()
    }
}

fn random_patches<R: Rng + ?Sized>(region: &OrganRegion, rng: &mut R) -> Vec<Blob> {
    let (a, b) = (region.a, region.b);
    (0..PATCH_COUNT)
        .map(|_| {
            let mx = region.cx + rng.gen_range(-0.28 * a..0.28 * a);
            let my = region.cy + rng.gen_range(-0.2 * b..0.2 * b);
            let sx = rng.gen_range(0.10 * a..0.20 * a);
            let sy = rng.gen_range(0.10 * b..0.20 * b);
            let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
            Blob {
                center: [mx, my],
                sigma: [sx, sy],
                gain: PATCH_GAIN * sign,
            }
        })
        .collect()
}
