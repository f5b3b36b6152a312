use super::{Mutation, MutationOperator};
use crate::genomics::{
    Chromosome, ConnectionAllele, GeneticConfig, IdRegistry, NeuronType, RecurrencyPolicy,
    WeightRange,
};
use crate::Innovation;

use rand::prelude::{Rng, SliceRandom};

use std::collections::BTreeSet;

/// Adds a connection between two previously unconnected neurons.
///
/// Up to `max_attempts` randomly ordered source neurons are tried.
/// For each, a destination is chosen uniformly among the non-input
/// neurons not yet connected from it. When cycles are disallowed,
/// neurons from which the source is reachable, itself included,
/// are not eligible destinations.
#[derive(Clone, Debug)]
pub struct AddConnection {
    rate: f32,
    max_attempts: usize,
    policy: RecurrencyPolicy,
    weights: WeightRange,
}

impl AddConnection {
    pub fn from_config(config: &GeneticConfig) -> AddConnection {
        AddConnection {
            rate: config.add_connection_mutation_rate,
            max_attempts: config.max_add_connection_attempts,
            policy: config.recurrency_policy,
            weights: config.weight_range(),
        }
    }

    fn candidate_destinations(&self, chromosome: &Chromosome, src: Innovation) -> Vec<Innovation> {
        let ancestors = match self.policy {
            RecurrencyPolicy::Disallowed => chromosome.backward_closure([src]),
            RecurrencyPolicy::BestGuess | RecurrencyPolicy::Lazy => BTreeSet::new(),
        };
        chromosome
            .neurons()
            .filter(|n| n.neuron_type() != NeuronType::Input)
            .map(|n| n.innovation())
            .filter(|dest| !ancestors.contains(dest))
            .filter(|&dest| chromosome.connection_between(src, dest).is_none())
            .collect()
    }
}

impl MutationOperator for AddConnection {
    fn name(&self) -> &'static str {
        "add connection"
    }

    fn rate(&self) -> f32 {
        self.rate
    }

    fn propose(
        &self,
        chromosome: &Chromosome,
        registry: &mut IdRegistry,
        rng: &mut impl Rng,
    ) -> Option<Mutation> {
        let mut sources: Vec<Innovation> = chromosome.neurons().map(|n| n.innovation()).collect();
        sources.shuffle(rng);

        for src in sources.into_iter().take(self.max_attempts) {
            let candidates = self.candidate_destinations(chromosome, src);
            if let Some(&dest) = candidates.choose(rng) {
                let id = registry.connection_id(src, dest);
                let weight = self.weights.sample(rng);
                return Some(Mutation {
                    to_add: vec![ConnectionAllele::new(id, src, dest, weight).into()],
                    to_remove: vec![],
                });
            }
        }
        None
    }
}
