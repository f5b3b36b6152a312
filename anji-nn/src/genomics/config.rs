use super::{ActivationType, ConfigError};

use serde::{Deserialize, Serialize};

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// How a transcriber treats cycles in a chromosome,
/// and which connections mutation may create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecurrencyPolicy {
    /// No cycles may exist. Mutation never creates one,
    /// and transcription rejects chromosomes that contain one.
    Disallowed,
    /// Connections closing a cycle become recurrent, reading
    /// their source's value from the previous step.
    BestGuess,
    /// Every connection is recurrent, making the network
    /// fully synchronous.
    Lazy,
}

impl FromStr for RecurrencyPolicy {
    type Err = ConfigError;

    /// # Examples
    /// ```
    /// use anji_nn::genomics::RecurrencyPolicy;
    ///
    /// assert_eq!("best_guess".parse::<RecurrencyPolicy>().unwrap(), RecurrencyPolicy::BestGuess);
    /// assert!("sometimes".parse::<RecurrencyPolicy>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disallowed" => Ok(Self::Disallowed),
            "best_guess" => Ok(Self::BestGuess),
            "lazy" => Ok(Self::Lazy),
            _ => Err(ConfigError::UnknownRecurrencyPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for RecurrencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disallowed => "disallowed",
            Self::BestGuess => "best_guess",
            Self::Lazy => "lazy",
        })
    }
}

/// Order in which eligible connections are removed
/// by connection removal mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalStrategy {
    /// Smallest weight magnitudes first.
    Small,
    /// Uniformly random among eligible connections.
    Skewed,
}

/// Configuration data for chromosome generation
/// and inter-chromosome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]; [`validate`]
/// reports those that aren't.
///
/// [`validate`]: GeneticConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a chromosome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a chromosome.
    pub output_count: NonZeroUsize,
    /// Activation type of input neurons.
    pub input_activation_type: ActivationType,
    /// Activation type of output neurons.
    pub output_activation_type: ActivationType,
    /// Possible activation types for hidden neurons.
    /// If empty, hidden neurons default to [`Sigmoid`].
    ///
    /// [`Sigmoid`]: crate::genomics::ActivationType::Sigmoid
    pub hidden_activation_types: Vec<ActivationType>,
    /// Chance that a connection between an input-output pair
    /// is created during initial chromosome generation.
    pub initial_connectivity: f32,
    /// Lower bound of connection weights.
    pub weight_min: f64,
    /// Upper bound of connection weights.
    pub weight_max: f64,
    /// Chance of the weight mutation firing on a chromosome.
    pub weight_mutation_rate: f32,
    /// Standard deviation of weight perturbations.
    pub weight_mutation_std_dev: f64,
    /// Chance of a connection addition mutation.
    pub add_connection_mutation_rate: f32,
    /// Chance of a connection-splitting neuron addition mutation.
    pub add_neuron_mutation_rate: f32,
    /// Chance of a neuron addition between arbitrary neurons.
    pub add_neuron_anywhere_mutation_rate: f32,
    /// Standard deviation of the outgoing weight of neurons
    /// added between arbitrary neurons.
    pub add_neuron_anywhere_std_dev: f64,
    /// Chance of a connection removal mutation.
    pub remove_connection_mutation_rate: f32,
    /// Connections with a weight magnitude above this
    /// are never removed by mutation.
    pub remove_connection_max_weight: f64,
    /// Order of connection removal.
    pub remove_connection_strategy: RemovalStrategy,
    /// Maximum number of connections removed per mutation.
    pub max_connections_removed: usize,
    /// Chance of pruning stranded structure after mutation.
    pub prune_mutation_rate: f32,
    /// Maximum number of source neurons tried during
    /// connection addition before giving up.
    pub max_add_connection_attempts: usize,
    /// Whether topology additions follow classic NEAT, where at
    /// most one of connection or neuron addition happens per mutation.
    pub topology_mutation_classic: bool,
    /// Policy governing cycles.
    pub recurrency_policy: RecurrencyPolicy,
    /// Number of network steps per presented input.
    pub recurrent_cycles: NonZeroUsize,
    /// Chance of child mutation during mating.
    pub child_mutation_chance: f32,
    /// Chance that common connection weights are averaged during mating,
    /// instead of copying the weight from a randomly chosen parent.
    pub mate_by_averaging_chance: f32,
    /// Weight of excess genes in genetic distance.
    pub excess_gene_factor: f32,
    /// Weight of disjoint genes in genetic distance.
    pub disjoint_gene_factor: f32,
    /// Weight of the common gene weight average in genetic distance.
    pub common_weight_factor: f32,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, empty, `false` or, in the case of
    /// `NonZeroUsize`s, 1. Activation types are linear, the
    /// removal strategy is `Small` and cycles are disallowed.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::GeneticConfig;
    ///
    /// let cfg1 = GeneticConfig::zero();
    ///
    /// let cfg2 = GeneticConfig {
    ///     // Specify some values here...
    ///     weight_mutation_rate: 1.0,
    ///     child_mutation_chance: 1.0,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// assert!(cfg2.validate().is_ok());
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            input_activation_type: ActivationType::Linear,
            output_activation_type: ActivationType::Linear,
            hidden_activation_types: vec![],
            initial_connectivity: 0.0,
            weight_min: 0.0,
            weight_max: 0.0,
            weight_mutation_rate: 0.0,
            weight_mutation_std_dev: 0.0,
            add_connection_mutation_rate: 0.0,
            add_neuron_mutation_rate: 0.0,
            add_neuron_anywhere_mutation_rate: 0.0,
            add_neuron_anywhere_std_dev: 0.0,
            remove_connection_mutation_rate: 0.0,
            remove_connection_max_weight: 0.0,
            remove_connection_strategy: RemovalStrategy::Small,
            max_connections_removed: 0,
            prune_mutation_rate: 0.0,
            max_add_connection_attempts: 0,
            topology_mutation_classic: false,
            recurrency_policy: RecurrencyPolicy::Disallowed,
            recurrent_cycles: NonZeroUsize::MIN,
            child_mutation_chance: 0.0,
            mate_by_averaging_chance: 0.0,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            common_weight_factor: 0.0,
        }
    }

    /// Checks that the configuration is internally consistent.
    ///
    /// # Errors
    /// Returns the first problem found: a probability outside
    /// [0, 1], inverted weight bounds, a negative or non-finite
    /// standard deviation, or classic topology mutation combined
    /// with a non-zero add-neuron-anywhere rate.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::GeneticConfig;
    ///
    /// let config = GeneticConfig {
    ///     weight_min: 1.0,
    ///     weight_max: -1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("initial_connectivity", self.initial_connectivity),
            ("weight_mutation_rate", self.weight_mutation_rate),
            ("add_connection_mutation_rate", self.add_connection_mutation_rate),
            ("add_neuron_mutation_rate", self.add_neuron_mutation_rate),
            (
                "add_neuron_anywhere_mutation_rate",
                self.add_neuron_anywhere_mutation_rate,
            ),
            (
                "remove_connection_mutation_rate",
                self.remove_connection_mutation_rate,
            ),
            ("prune_mutation_rate", self.prune_mutation_rate),
            ("child_mutation_chance", self.child_mutation_chance),
            ("mate_by_averaging_chance", self.mate_by_averaging_chance),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }
        if !(self.weight_min <= self.weight_max) {
            return Err(ConfigError::WeightBounds {
                min: self.weight_min,
                max: self.weight_max,
            });
        }
        for (name, value) in [
            ("weight_mutation_std_dev", self.weight_mutation_std_dev),
            ("add_neuron_anywhere_std_dev", self.add_neuron_anywhere_std_dev),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::StdDev { name, value });
            }
        }
        if self.topology_mutation_classic && self.add_neuron_anywhere_mutation_rate > 0.0 {
            return Err(ConfigError::Conflict(
                "classic topology mutation cannot add neurons anywhere",
            ));
        }
        Ok(())
    }

    /// Hidden activation types, defaulting to sigmoid.
    pub(crate) fn hidden_activation_choices(&self) -> &[ActivationType] {
        if self.hidden_activation_types.is_empty() {
            &[ActivationType::Sigmoid]
        } else {
            &self.hidden_activation_types
        }
    }

    /// The configured weight bounds.
    pub(crate) fn weight_range(&self) -> WeightRange {
        WeightRange {
            min: self.weight_min,
            max: self.weight_max,
        }
    }
}

/// Inclusive bounds of connection weights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct WeightRange {
    pub min: f64,
    pub max: f64,
}

impl WeightRange {
    /// Clips `weight` into the range.
    pub fn clip(self, weight: f64) -> f64 {
        weight.clamp(self.min, self.max)
    }

    /// Uniform weight within the range.
    pub fn sample(self, rng: &mut impl rand::Rng) -> f64 {
        if self.min < self.max {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probabilities_out_of_range() {
        let config = GeneticConfig {
            weight_mutation_rate: 1.5,
            ..GeneticConfig::zero()
        };
        match config.validate() {
            Err(ConfigError::Probability { name, .. }) => assert_eq!(name, "weight_mutation_rate"),
            other => panic!("unexpected validation result {:?}", other),
        }
    }

    #[test]
    fn negative_std_dev() {
        let config = GeneticConfig {
            weight_mutation_std_dev: -0.1,
            ..GeneticConfig::zero()
        };
        assert!(matches!(config.validate(), Err(ConfigError::StdDev { .. })));

        let config = GeneticConfig {
            add_neuron_anywhere_std_dev: f64::NAN,
            ..GeneticConfig::zero()
        };
        assert!(matches!(config.validate(), Err(ConfigError::StdDev { .. })));
    }

    #[test]
    fn classic_mode_conflict() {
        let config = GeneticConfig {
            topology_mutation_classic: true,
            add_neuron_anywhere_mutation_rate: 0.1,
            ..GeneticConfig::zero()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Conflict(_))));
    }

    #[test]
    fn hidden_activations_default_to_sigmoid() {
        let config = GeneticConfig::zero();
        assert_eq!(config.hidden_activation_choices(), &[ActivationType::Sigmoid]);

        let config = GeneticConfig {
            hidden_activation_types: vec![ActivationType::Tanh, ActivationType::ReLU],
            ..GeneticConfig::zero()
        };
        assert_eq!(config.hidden_activation_choices().len(), 2);
    }

    #[test]
    fn recurrency_policy_names() {
        for policy in [
            RecurrencyPolicy::Disallowed,
            RecurrencyPolicy::BestGuess,
            RecurrencyPolicy::Lazy,
        ] {
            assert_eq!(policy.to_string().parse::<RecurrencyPolicy>().unwrap(), policy);
        }
    }
}
