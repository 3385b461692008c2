use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::animation::Sequencer;
use crate::error::{SimError, SimResult};
use crate::pathology::Pathology;

/// Everything the UI layer hands to the simulator.
///
/// Missing JSON fields take the defaults below; out-of-range values are
/// pulled back by [`SimulationConfig::clamped`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Canvas edge length in pixels.
    pub size: u32,
    pub pathology: Pathology,
    /// Emissions before the multiplier is applied.
    pub base_count: usize,
    pub multiplier: usize,
    pub steps: usize,
    pub animate: bool,
    pub frame_delay_ms: u64,
    pub point_size: f32,
    pub alpha: f32,
    pub sample_seed: u64,
    pub patch_seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            size: 600,
            pathology: Pathology::Normal,
            base_count: 3_000,
            multiplier: 4,
            steps: 30,
            animate: true,
            frame_delay_ms: 20,
            point_size: 8.0,
            alpha: 0.7,
            sample_seed: 42,
            patch_seed: 123,
        }
    }
}

impl SimulationConfig {
    pub fn from_path(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| SimError::config(format!("read '{}': {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> SimResult<Self> {
        let config: SimulationConfig =
            serde_json::from_str(raw).map_err(|e| SimError::config(e.to_string()))?;
        Ok(config.clamped())
    }

    /// Pull every field into the range the controls allow.
    pub fn clamped(mut self) -> Self {
        self.size = self.size.clamp(200, 1000);
        self.base_count = self.base_count.clamp(100, 20_000);
        self.multiplier = self.multiplier.clamp(1, 16);
        self.steps = self.steps.clamp(1, 100);
        self.frame_delay_ms = self.frame_delay_ms.min(1000);
        self.point_size = if self.point_size.is_finite() {
            self.point_size.clamp(1.0, 20.0)
        } else {
            8.0
        };
        self.alpha = if self.alpha.is_finite() {
            self.alpha.clamp(0.1, 1.0)
        } else {
            0.7
        };
        self
    }

    /// Number of emissions actually sampled.
    pub fn emission_count(&self) -> usize {
        self.base_count.saturating_mul(self.multiplier)
    }

    /// Playback settings; disabled animation draws the final frame only.
    pub fn sequencer(&self) -> Sequencer {
        if self.animate && self.steps > 1 {
            Sequencer::new(self.steps, Duration::from_millis(self.frame_delay_ms))
        } else {
            Sequencer::still()
        }
    }
}
