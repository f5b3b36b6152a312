//! # ANJI-NN
//! A neural network-based implementation of the [`anji`] crate's `Genome` trait.
//!
//! Provides a [`Chromosome`] type usable in `anji` `Population`s, the
//! [`IdRegistry`] that keeps innovation numbers stable across a run, the
//! [`mutation`] operators and [`crossover`] that evolve chromosomes, and a
//! [`Transcriber`] that compiles a chromosome into an executable, possibly
//! recurrent, [`Network`] driven through an [`Activator`].
//!
//! [`Chromosome`]: crate::genomics::Chromosome
//! [`IdRegistry`]: crate::genomics::IdRegistry
//! [`Transcriber`]: crate::networks::Transcriber
//! [`Network`]: crate::networks::Network
//! [`Activator`]: crate::networks::Activator
//!
//! # Example usage: transcribing and activating a chromosome
//! ```
//! use anji_nn::genomics::{ActivationType, Chromosome, GeneticConfig, RecurrencyPolicy};
//! use anji_nn::networks::Transcriber;
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::num::NonZeroUsize;
//!
//! let config = GeneticConfig {
//!     input_count: NonZeroUsize::new(2).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     output_activation_type: ActivationType::Sigmoid,
//!     ..GeneticConfig::zero()
//! };
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! // An unconnected chromosome: inputs 0 and 1, output 2.
//! let mut chromosome = Chromosome::new(&config, &mut rng);
//! chromosome.add_connection(3, 0, 2, 1.0).unwrap();
//! chromosome.add_connection(4, 1, 2, -1.0).unwrap();
//!
//! let network = Transcriber::new(RecurrencyPolicy::Disallowed)
//!     .transcribe(&chromosome)
//!     .unwrap();
//! let mut activator = anji_nn::networks::Activator::new(network, NonZeroUsize::new(1).unwrap());
//!
//! // Equal inputs cancel out, and the steepened sigmoid of 0 is 0.5.
//! assert_eq!(activator.next(&[0.5, 0.5]), vec![0.5]);
//! ```

pub mod crossover;
pub mod genomics;
pub mod mutation;
pub mod networks;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;
