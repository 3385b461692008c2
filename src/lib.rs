//! Simulated thyroid scintigraphy.
//!
//! Emission events are scattered inside an elliptical gland with a density
//! that follows a pathology-specific uptake field, then revealed frame by
//! frame. Shared by the terminal/PNG binary and the web server.

pub mod animation;
pub mod config;
pub mod console;
pub mod error;
pub mod field;
pub mod geometry;
pub mod pathology;
pub mod render;
pub mod sampler;
pub mod simulation;

pub use animation::{Frame, FrameSink, RevealPlan, Sequencer};
pub use config::SimulationConfig;
pub use error::{SimError, SimResult};
pub use field::IntensityField;
pub use geometry::{OrganRegion, Point, RegionOutline};
pub use pathology::Pathology;
pub use sampler::{sample_emissions, SamplerConfig};
pub use simulation::{generate, generate_with, Scene};
