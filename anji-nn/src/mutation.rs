//! Mutation operators propose structural and parametric
//! changes to chromosomes.
//!
//! Each operator inspects a chromosome and, consulting the
//! [`IdRegistry`] for innovation numbers, proposes a [`Mutation`]:
//! the alleles to remove and the alleles to add. The [`Mutator`]
//! runs every configured operator in a fixed order.

mod add_connection;
mod add_neuron;
mod add_neuron_anywhere;
mod prune;
mod remove_connection;
mod single_topological;
mod weight;

pub use add_connection::AddConnection;
pub use add_neuron::AddNeuron;
pub use add_neuron_anywhere::AddNeuronAnywhere;
pub use prune::Prune;
pub use remove_connection::RemoveConnection;
pub use single_topological::SingleTopological;
pub use weight::Weight;

use crate::genomics::{Allele, Chromosome, GeneticConfig, IdRegistry};
use crate::Innovation;

use log::{debug, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A proposed change to a chromosome.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Mutation {
    /// Alleles to add, after removals.
    pub to_add: Vec<Allele>,
    /// IDs of alleles to remove.
    pub to_remove: Vec<Innovation>,
}

impl Mutation {
    /// Returns whether the mutation changes nothing.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// An operator that proposes mutations of chromosomes.
pub trait MutationOperator {
    /// Name used when logging the operator's activity.
    fn name(&self) -> &'static str;

    /// Per-chromosome probability of the operator firing.
    fn rate(&self) -> f32;

    /// Proposes a mutation of `chromosome`, or `None` if no
    /// suitable change exists. New innovation numbers are
    /// requested from `registry`.
    fn propose(
        &self,
        chromosome: &Chromosome,
        registry: &mut IdRegistry,
        rng: &mut impl Rng,
    ) -> Option<Mutation>;

    /// Fires the operator with probability [`rate`], applying
    /// its proposal. Returns whether the chromosome changed.
    ///
    /// # Panics
    /// Panics if the proposed mutation cannot be applied,
    /// which indicates an error in the operator itself.
    ///
    /// [`rate`]: MutationOperator::rate
    fn mutate(
        &self,
        chromosome: &mut Chromosome,
        registry: &mut IdRegistry,
        rng: &mut impl Rng,
    ) -> bool {
        if rng.gen::<f32>() >= self.rate() {
            return false;
        }
        match self.propose(chromosome, registry, rng) {
            Some(mutation) if !mutation.is_empty() => {
                trace!(
                    "{} mutation: -{:?} +{:?}",
                    self.name(),
                    mutation.to_remove,
                    mutation.to_add.iter().map(Allele::innovation).collect::<Vec<_>>()
                );
                if let Err(e) = chromosome.apply(mutation) {
                    panic!("{} mutation failed: {} in {}", self.name(), e, chromosome);
                }
                true
            }
            _ => {
                debug!("{} mutation found nothing to change", self.name());
                false
            }
        }
    }
}

enum TopologyOperators {
    Classic(SingleTopological),
    Independent {
        add_connection: AddConnection,
        add_neuron: AddNeuron,
        add_neuron_anywhere: AddNeuronAnywhere,
    },
}

/// Runs every mutation operator enabled by a configuration:
/// topology additions, then connection removal, then weight
/// perturbation, then pruning.
pub struct Mutator {
    topology: TopologyOperators,
    remove_connection: RemoveConnection,
    weight: Weight,
    prune: Prune,
}

impl Mutator {
    /// Builds the operators described by `config`. Classic
    /// topology mutation uses a single dispatcher choosing
    /// between connection and neuron addition; otherwise
    /// each addition operator fires independently.
    pub fn from_config(config: &GeneticConfig) -> Mutator {
        let topology = if config.topology_mutation_classic {
            TopologyOperators::Classic(SingleTopological::from_config(config))
        } else {
            TopologyOperators::Independent {
                add_connection: AddConnection::from_config(config),
                add_neuron: AddNeuron::from_config(config),
                add_neuron_anywhere: AddNeuronAnywhere::from_config(config),
            }
        };
        Mutator {
            topology,
            remove_connection: RemoveConnection::from_config(config),
            weight: Weight::from_config(config),
            prune: Prune::from_config(config),
        }
    }

    /// Mutates `chromosome` with every operator in turn.
    /// Returns whether the chromosome changed.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::{Chromosome, GeneticConfig, IdRegistry};
    /// use anji_nn::mutation::Mutator;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     initial_connectivity: 1.0,
    ///     weight_min: -1.0,
    ///     weight_max: 1.0,
    ///     add_neuron_mutation_rate: 1.0,
    ///     prune_mutation_rate: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = StdRng::seed_from_u64(11);
    /// let mut registry = IdRegistry::new(&config);
    /// let mut chromosome = Chromosome::new(&config, &mut rng);
    ///
    /// assert!(Mutator::from_config(&config).mutate(&mut chromosome, &mut registry, &mut rng));
    /// assert_eq!(chromosome.neurons().count(), 4);
    /// chromosome.validate().unwrap();
    /// ```
    pub fn mutate(
        &self,
        chromosome: &mut Chromosome,
        registry: &mut IdRegistry,
        rng: &mut impl Rng,
    ) -> bool {
        let mut changed = match &self.topology {
            TopologyOperators::Classic(single) => single.mutate(chromosome, registry, rng),
            TopologyOperators::Independent {
                add_connection,
                add_neuron,
                add_neuron_anywhere,
            } => {
                let connection_added = add_connection.mutate(chromosome, registry, rng);
                let neuron_added = add_neuron.mutate(chromosome, registry, rng);
                let neuron_inserted = add_neuron_anywhere.mutate(chromosome, registry, rng);
                connection_added || neuron_added || neuron_inserted
            }
        };
        changed |= self.remove_connection.mutate(chromosome, registry, rng);
        changed |= self.weight.mutate(chromosome, registry, rng);
        changed |= self.prune.mutate(chromosome, registry, rng);
        changed
    }
}
