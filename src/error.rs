/// Convenience result type used across the simulator.
pub type SimResult<T> = Result<T, SimError>;

/// Error taxonomy for geometry, sampling and rendering.
#[derive(thiserror::Error, Debug)]
pub enum SimError {
    /// Organ ellipse with non-positive or non-finite semi-axes.
    #[error("invalid organ region: {0}")]
    InvalidRegion(String),

    /// The candidate pool is smaller than the requested emission count.
    #[error("insufficient candidates: requested {requested} points from a pool of {available}")]
    InsufficientCandidates { requested: usize, available: usize },

    /// The weighted draw rejected the weight vector.
    #[error("sampling error: {0}")]
    Sampling(String),

    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A frame sink failed to draw or persist a frame.
    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    /// Build a [`SimError::InvalidRegion`] value.
    pub fn invalid_region(msg: impl Into<String>) -> Self {
        Self::InvalidRegion(msg.into())
    }

    /// Build a [`SimError::Sampling`] value.
    pub fn sampling(msg: impl Into<String>) -> Self {
        Self::Sampling(msg.into())
    }

    /// Build a [`SimError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`SimError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}
