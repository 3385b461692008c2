//! Weighted emission sampling without replacement.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::field::IntensityField;
use crate::geometry::{uniform_points, OrganRegion, Point};

/// Candidate pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Candidates generated per requested point.
    pub pool_factor: usize,
    /// Lower bound on the pool, regardless of the requested count.
    pub min_pool: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            pool_factor: 3,
            min_pool: 20_000,
        }
    }
}

impl SamplerConfig {
    pub fn pool_size(&self, n: usize) -> usize {
        n.saturating_mul(self.pool_factor).max(self.min_pool)
    }
}

/// Draw exactly `n` distinct points inside the field's region with density
/// proportional to the field.
///
/// The pool is drawn area-uniformly, weighted by the field and then
/// subsampled without replacement. If every weight is zero the result is
/// `n` plain uniform points. The result is shuffled, so any prefix revealed
/// by the animation is an unbiased subsample of the whole set.
pub fn sample_emissions<R: Rng + ?Sized>(
    field: &IntensityField,
    n: usize,
    config: &SamplerConfig,
    rng: &mut R,
) -> SimResult<Vec<Point>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let pool_size = config.pool_size(n);
    if pool_size < n {
        return Err(SimError::InsufficientCandidates {
            requested: n,
            available: pool_size,
        });
    }

    let region = field.region();
    let candidates = uniform_points(region, pool_size, rng);
    let weights = field.weights(&candidates, rng);
    debug!(requested = n, pool = pool_size, "evaluated candidate weights");

    draw_from_pool(&candidates, &weights, n, region, rng)
}

/// Pick `n` of `candidates` in proportion to `weights`, then shuffle.
/// Falls back to fresh uniform points in `region` when no weight is positive.
fn draw_from_pool<R: Rng + ?Sized>(
    candidates: &[Point],
    weights: &[f64],
    n: usize,
    region: &OrganRegion,
    rng: &mut R,
) -> SimResult<Vec<Point>> {
    if !weights.iter().any(|w| *w > 0.0) {
        debug!("all candidate weights are zero, using uniform points");
        return Ok(uniform_points(region, n, rng));
    }

    let mut picked = index::sample_weighted(rng, candidates.len(), |i| weights[i], n)
        .map_err(|e| SimError::sampling(e.to_string()))?
        .into_vec();
    // selection leaves heavy candidates clustered at the front
    picked.shuffle(rng);
    Ok(picked.into_iter().map(|i| candidates[i]).collect())
}
