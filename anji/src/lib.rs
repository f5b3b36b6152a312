//! Generational NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! The evolutionary loop is independent of the genome representation:
//! anything implementing [`Genome`] can be speciated, mated and selected
//! by a [`Population`]. The neural network chromosomes, mutation
//! operators and network transcription live in the `anji-nn` crate.
//!
//! # Example usage: evolving networks that output 0.5
//! ```
//! use anji::{Population, PopulationConfig};
//! use anji_nn::genomics::{ActivationType, Chromosome, GeneticConfig};
//! use anji_nn::networks::{Transcriber, TranscriberError};
//! use std::num::NonZeroUsize;
//!
//! let genetic_config = GeneticConfig {
//!     input_count: NonZeroUsize::new(2).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     output_activation_type: ActivationType::Sigmoid,
//!     hidden_activation_types: vec![ActivationType::Sigmoid],
//!     initial_connectivity: 1.0,
//!     weight_min: -5.0,
//!     weight_max: 5.0,
//!     weight_mutation_rate: 0.8,
//!     weight_mutation_std_dev: 1.0,
//!     add_connection_mutation_rate: 0.05,
//!     add_neuron_mutation_rate: 0.03,
//!     max_add_connection_attempts: 20,
//!     child_mutation_chance: 0.65,
//!     mate_by_averaging_chance: 0.4,
//!     excess_gene_factor: 1.0,
//!     disjoint_gene_factor: 1.0,
//!     common_weight_factor: 0.4,
//!     ..GeneticConfig::zero()
//! };
//! let population_config = PopulationConfig {
//!     size: NonZeroUsize::new(50).unwrap(),
//!     distance_threshold: 3.0,
//!     elitism: 1,
//!     survival_threshold: 0.2,
//!     adoption_rate: 1.0,
//!     sexual_reproduction_chance: 0.6,
//!     interspecies_mating_chance: 0.001,
//!     stagnation_threshold: NonZeroUsize::new(15).unwrap(),
//!     stagnation_penalty: 1.0,
//! };
//! genetic_config.validate().unwrap();
//! population_config.validate().unwrap();
//!
//! let transcriber = Transcriber::from_config(&genetic_config);
//! let mut population = Population::<_, _, Chromosome>::with_seed(population_config, genetic_config, 7);
//! for _ in 0..10 {
//!     population.evaluate_fitness(|chromosome| {
//!         let mut activator = transcriber.activator(chromosome)?;
//!         let error = (activator.next(&[1.0, 0.5])[0] - 0.5).abs() as f32;
//!         Ok::<_, TranscriberError>(1.0 - error)
//!     });
//!     if let Err(e) = population.evolve() {
//!         eprintln!("{}", e);
//!         break;
//!     }
//! }
//! assert!(population.genomes().count() > 0);
//! ```

mod genome;
mod populations;

pub use genome::*;
pub use populations::*;
