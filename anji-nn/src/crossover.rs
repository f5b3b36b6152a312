//! Recombination of chromosomes, aligned by innovation number,
//! and the genetic distance used to group them into species.

use crate::genomics::{Chromosome, GeneticConfig, IdRegistry};
use crate::mutation::Mutator;

use anji::Genome;
use rand::Rng;

/// Produces an offspring of `primary` and `secondary`.
///
/// The offspring inherits the primary parent's entire structure,
/// neurons included. Connections present in both parents get their
/// weight averaged with probability [`mate_by_averaging_chance`], or
/// copied from a randomly chosen parent otherwise. Connections found
/// only in the secondary parent are not inherited, so the offspring
/// is as valid as the primary parent.
///
/// [`mate_by_averaging_chance`]: GeneticConfig::mate_by_averaging_chance
///
/// # Examples
/// ```
/// use anji_nn::crossover::reproduce;
/// use anji_nn::genomics::{Chromosome, GeneticConfig};
/// use rand::{rngs::StdRng, SeedableRng};
/// use std::num::NonZeroUsize;
///
/// let config = GeneticConfig {
///     input_count: NonZeroUsize::new(2).unwrap(),
///     output_count: NonZeroUsize::new(1).unwrap(),
///     mate_by_averaging_chance: 1.0,
///     ..GeneticConfig::zero()
/// };
/// let mut rng = StdRng::seed_from_u64(0);
///
/// let mut primary = Chromosome::new(&config, &mut rng);
/// primary.add_connection(3, 0, 2, 1.0).unwrap();
/// let mut secondary = Chromosome::new(&config, &mut rng);
/// secondary.add_connection(3, 0, 2, -0.5).unwrap();
/// secondary.add_connection(4, 1, 2, 2.0).unwrap();
///
/// let child = reproduce(&primary, &secondary, &config, &mut rng);
/// assert_eq!(child.connection(3).unwrap().weight(), 0.25);
/// assert!(child.connection(4).is_none());
/// ```
pub fn reproduce(
    primary: &Chromosome,
    secondary: &Chromosome,
    config: &GeneticConfig,
    rng: &mut impl Rng,
) -> Chromosome {
    let mut child = primary.clone();
    child.fitness = 0.0;

    let common: Vec<_> = secondary
        .connections()
        .filter(|c| primary.connection(c.innovation()).is_some())
        .collect();
    for other in common {
        if let Some(connection) = child.connection_mut(other.innovation()) {
            let weight = if rng.gen::<f32>() < config.mate_by_averaging_chance {
                (connection.weight() + other.weight()) / 2.0
            } else if rng.gen::<bool>() {
                other.weight()
            } else {
                connection.weight()
            };
            connection.set_weight(weight);
        }
    }

    child
}

/// Returns the genetic distance between two chromosomes:
/// the weighted sum of excess connections, disjoint
/// connections, and the mean absolute weight difference
/// of matching connections.
///
/// Excess connections are those with an innovation number
/// beyond the other chromosome's highest; disjoint ones are
/// the remaining unmatched connections.
///
/// # Examples
/// ```
/// use anji_nn::crossover::genetic_distance;
/// use anji_nn::genomics::{Chromosome, GeneticConfig};
/// use rand::{rngs::StdRng, SeedableRng};
/// use std::num::NonZeroUsize;
///
/// let config = GeneticConfig {
///     input_count: NonZeroUsize::new(2).unwrap(),
///     output_count: NonZeroUsize::new(2).unwrap(),
///     excess_gene_factor: 1.0,
///     disjoint_gene_factor: 2.0,
///     common_weight_factor: 0.5,
///     ..GeneticConfig::zero()
/// };
/// let mut rng = StdRng::seed_from_u64(0);
///
/// let mut a = Chromosome::new(&config, &mut rng);
/// a.add_connection(4, 0, 2, 1.0).unwrap();
/// a.add_connection(5, 0, 3, 1.0).unwrap();
/// let mut b = Chromosome::new(&config, &mut rng);
/// b.add_connection(4, 0, 2, 0.0).unwrap();
/// b.add_connection(6, 1, 2, 1.0).unwrap();
/// b.add_connection(7, 1, 3, 1.0).unwrap();
///
/// // 5 is disjoint, 6 and 7 are excess, and 4 differs by 1.0.
/// assert_eq!(genetic_distance(&a, &b, &config), 2.0 * 1.0 + 1.0 * 2.0 + 0.5 * 1.0);
/// ```
pub fn genetic_distance(first: &Chromosome, second: &Chromosome, config: &GeneticConfig) -> f32 {
    let first_ids = first.connection_ids();
    let second_ids = second.connection_ids();
    let first_max = first_ids.iter().copied().max().unwrap_or(0);
    let second_max = second_ids.iter().copied().max().unwrap_or(0);

    let (mut excess, mut disjoint) = (0usize, 0usize);
    for id in first_ids.symmetric_difference(&second_ids) {
        let other_max = if first_ids.contains(id) {
            second_max
        } else {
            first_max
        };
        if *id > other_max {
            excess += 1;
        } else {
            disjoint += 1;
        }
    }

    let (weight_difference, matching) = first
        .connections()
        .filter_map(|c| {
            second
                .connection(c.innovation())
                .map(|other| (c.weight() - other.weight()).abs())
        })
        .fold((0.0, 0usize), |(sum, count), d| (sum + d, count + 1));
    let mean_weight_difference = if matching > 0 {
        (weight_difference / matching as f64) as f32
    } else {
        0.0
    };

    config.excess_gene_factor * excess as f32
        + config.disjoint_gene_factor * disjoint as f32
        + config.common_weight_factor * mean_weight_difference
}

impl Genome for Chromosome {
    type Config = GeneticConfig;
    type InnovationHistory = IdRegistry;

    fn new(config: &GeneticConfig, rng: &mut impl Rng) -> Chromosome {
        Chromosome::new(config, rng)
    }

    fn genetic_distance(first: &Chromosome, second: &Chromosome, config: &GeneticConfig) -> f32 {
        genetic_distance(first, second, config)
    }

    /// Reproduces from the fitter parent, then mutates the
    /// offspring with probability [`child_mutation_chance`].
    ///
    /// [`child_mutation_chance`]: GeneticConfig::child_mutation_chance
    fn mate(
        parent1: &Chromosome,
        parent2: &Chromosome,
        history: &mut IdRegistry,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Chromosome {
        let (primary, secondary) = if parent2.fitness() > parent1.fitness() {
            (parent2, parent1)
        } else {
            (parent1, parent2)
        };
        let mut child = reproduce(primary, secondary, config, rng);
        if rng.gen::<f32>() < config.child_mutation_chance {
            Mutator::from_config(config).mutate(&mut child, history, rng);
        }
        child
    }

    fn set_fitness(&mut self, fitness: f32) {
        Chromosome::set_fitness(self, fitness);
    }

    fn fitness(&self) -> f32 {
        Chromosome::fitness(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ActivationType, NeuronType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    fn config() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 1.0,
            common_weight_factor: 1.0,
            ..GeneticConfig::zero()
        }
    }

    // Hidden structure uses IDs well beyond those a registry hands out.
    fn parents(config: &GeneticConfig) -> (Chromosome, Chromosome) {
        let mut rng = StdRng::seed_from_u64(0);
        let mut primary = Chromosome::new(config, &mut rng);
        primary.add_neuron(1010, ActivationType::Tanh).unwrap();
        primary.add_connection(3, 0, 2, 1.0).unwrap();
        primary.add_connection(1011, 1, 1010, 0.5).unwrap();
        primary.add_connection(1012, 1010, 2, -0.5).unwrap();
        primary.set_fitness(2.0);

        let mut secondary = Chromosome::new(config, &mut rng);
        secondary.add_neuron(1020, ActivationType::Sigmoid).unwrap();
        secondary.add_connection(3, 0, 2, 3.0).unwrap();
        secondary.add_connection(1021, 0, 1020, 1.0).unwrap();
        secondary.add_connection(1022, 1020, 2, 1.0).unwrap();
        secondary.set_fitness(1.0);

        (primary, secondary)
    }

    #[test]
    fn offspring_follows_primary_structure() {
        let config = config();
        let (primary, secondary) = parents(&config);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..20 {
            let child = reproduce(&primary, &secondary, &config, &mut rng);
            assert_eq!(
                child.alleles().iter().map(|a| a.innovation()).collect::<Vec<_>>(),
                primary.alleles().iter().map(|a| a.innovation()).collect::<Vec<_>>(),
            );
            assert_eq!(
                child.neuron(1010).unwrap().activation_type(),
                ActivationType::Tanh
            );
            assert!([1.0, 3.0].contains(&child.connection(3).unwrap().weight()));
            assert_eq!(child.connection(1011).unwrap().weight(), 0.5);
            assert_eq!(child.fitness(), 0.0);
            child.validate().unwrap();
        }
    }

    #[test]
    fn mate_prefers_fitter_parent() {
        let config = config();
        let (primary, secondary) = parents(&config);
        let mut registry = IdRegistry::new(&config);
        let mut rng = StdRng::seed_from_u64(1);

        let child = Genome::mate(&secondary, &primary, &mut registry, &config, &mut rng);
        assert!(child.neuron(1010).is_some());
        assert!(child.neuron(1020).is_none());
    }

    #[test]
    fn mutated_offspring_stay_valid() {
        let config = GeneticConfig {
            weight_min: -1.0,
            weight_max: 1.0,
            child_mutation_chance: 1.0,
            add_connection_mutation_rate: 0.5,
            add_neuron_mutation_rate: 0.5,
            max_add_connection_attempts: 5,
            weight_mutation_rate: 0.5,
            weight_mutation_std_dev: 0.3,
            prune_mutation_rate: 1.0,
            ..config()
        };
        let (mut primary, secondary) = parents(&config);
        let mut registry = IdRegistry::new(&config);
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..30 {
            let child = Genome::mate(&primary, &secondary, &mut registry, &config, &mut rng);
            child.validate().unwrap();
            primary = child;
            primary.set_fitness(2.0);
        }
        assert!(primary.neurons_of_type(NeuronType::Output).count() == 1);
    }

    #[test]
    fn distance_is_symmetric() {
        let config = config();
        let (primary, secondary) = parents(&config);

        let forward = genetic_distance(&primary, &secondary, &config);
        let backward = genetic_distance(&secondary, &primary, &config);
        assert_eq!(forward, backward);
        // 1011 and 1012 are disjoint, 1021 and 1022 excess, and 3 differs by 2.
        assert_eq!(forward, 2.0 + 2.0 + 2.0);
        assert_eq!(genetic_distance(&primary, &primary, &config), 0.0);
    }

    #[test]
    fn distance_without_common_connections() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(0);
        let empty = Chromosome::new(&config, &mut rng);
        let mut other = Chromosome::new(&config, &mut rng);
        other.add_connection(3, 0, 2, 1.0).unwrap();

        assert_eq!(genetic_distance(&empty, &other, &config), 1.0);
        assert_eq!(genetic_distance(&empty, &empty, &config), 0.0);
    }
}
