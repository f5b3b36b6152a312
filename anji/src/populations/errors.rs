use thiserror::Error;

/// Errors that can stop a population from evolving.
#[derive(Debug, Error, PartialEq)]
pub enum EvolutionError {
    #[error("attempted evolution on degenerate population: total fitness is zero")]
    DegeneratePopulation,
}

/// Invalid [`PopulationConfig`](super::PopulationConfig) values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a probability in [0, 1], got {value}")]
    Probability { name: &'static str, value: f32 },
    #[error("distance threshold must be finite and non-negative, got {0}")]
    DistanceThreshold(f32),
}
