use super::ConfigError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// All quantities expressing probabilities
/// must be in the range [0.0, 1.0], which
/// [`validate`](PopulationConfig::validate) checks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Genetic distance threshold, beyond which
    /// genomes are considered as belonging to
    /// different species.
    pub distance_threshold: f32,
    /// Top n of each species which is copied
    /// as-is to the next generation.
    pub elitism: usize,
    /// Top % of each species which can participate
    /// in mating. At least one member always does.
    pub survival_threshold: f32,
    /// Chance that a genome drifted away from its
    /// species' representative is respeciated.
    pub adoption_rate: f32,
    /// Chance that offspring will be the result
    /// of sexual reproduction (as opposed to asexual).
    pub sexual_reproduction_chance: f32,
    /// Chance that genomes from different species
    /// will be selected to mate.
    pub interspecies_mating_chance: f32,
    /// Number of generations without a fitness increase
    /// before a species is considered _stagnated_.
    pub stagnation_threshold: NonZeroUsize,
    /// Offspring allotment penalty for stagnation.
    /// Stagnated species will receive this fraction
    /// fewer offspring.
    pub stagnation_penalty: f32,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use anji::PopulationConfig;
    ///
    /// let config = PopulationConfig {
    ///     stagnation_penalty: 0.5,
    ///     ..PopulationConfig::zero()
    /// };
    /// assert!(config.validate().is_ok());
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::MIN,
            distance_threshold: 0.0,
            elitism: 0,
            survival_threshold: 0.0,
            adoption_rate: 0.0,
            sexual_reproduction_chance: 0.0,
            interspecies_mating_chance: 0.0,
            stagnation_threshold: NonZeroUsize::MIN,
            stagnation_penalty: 0.0,
        }
    }

    /// Checks that every value is within its allowed range.
    ///
    /// # Errors
    /// Returns the first offending value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("survival_threshold", self.survival_threshold),
            ("adoption_rate", self.adoption_rate),
            ("sexual_reproduction_chance", self.sexual_reproduction_chance),
            ("interspecies_mating_chance", self.interspecies_mating_chance),
            ("stagnation_penalty", self.stagnation_penalty),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }
        if !self.distance_threshold.is_finite() || self.distance_threshold < 0.0 {
            return Err(ConfigError::DistanceThreshold(self.distance_threshold));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_values() {
        let config = PopulationConfig {
            adoption_rate: 1.5,
            ..PopulationConfig::zero()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Probability {
                name: "adoption_rate",
                value: 1.5
            })
        );

        let config = PopulationConfig {
            stagnation_penalty: f32::NAN,
            ..PopulationConfig::zero()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Probability {
                name: "stagnation_penalty",
                ..
            })
        ));

        let config = PopulationConfig {
            distance_threshold: -1.0,
            ..PopulationConfig::zero()
        };
        assert_eq!(config.validate(), Err(ConfigError::DistanceThreshold(-1.0)));
    }

    #[test]
    fn zero_is_valid() {
        assert_eq!(PopulationConfig::zero().validate(), Ok(()));
    }
}
