use super::{Mutation, MutationOperator};
use crate::genomics::{Chromosome, ConnectionAllele, GeneticConfig, IdRegistry, RemovalStrategy};

use rand::prelude::{IteratorRandom, Rng};

/// Removes connections with small weight magnitudes.
///
/// Connections whose weight magnitude does not exceed
/// `max_weight` are eligible; at most `max_removed` of them are
/// removed, either smallest first or chosen at random.
#[derive(Clone, Debug)]
pub struct RemoveConnection {
    rate: f32,
    max_weight: f64,
    max_removed: usize,
    strategy: RemovalStrategy,
}

impl RemoveConnection {
    pub fn from_config(config: &GeneticConfig) -> RemoveConnection {
        RemoveConnection {
            rate: config.remove_connection_mutation_rate,
            max_weight: config.remove_connection_max_weight,
            max_removed: config.max_connections_removed,
            strategy: config.remove_connection_strategy,
        }
    }
}

impl MutationOperator for RemoveConnection {
    fn name(&self) -> &'static str {
        "remove connection"
    }

    fn rate(&self) -> f32 {
        self.rate
    }

    fn propose(
        &self,
        chromosome: &Chromosome,
        _registry: &mut IdRegistry,
        rng: &mut impl Rng,
    ) -> Option<Mutation> {
        let eligible = chromosome
            .connections()
            .filter(|c| c.weight().abs() <= self.max_weight);
        let to_remove: Vec<&ConnectionAllele> = match self.strategy {
            RemovalStrategy::Small => {
                let mut eligible: Vec<&ConnectionAllele> = eligible.collect();
                // Stable, so ties stay in innovation order.
                eligible.sort_by(|a, b| a.weight().abs().total_cmp(&b.weight().abs()));
                eligible.truncate(self.max_removed);
                eligible
            }
            RemovalStrategy::Skewed => eligible.choose_multiple(rng, self.max_removed),
        };
        if to_remove.is_empty() {
            None
        } else {
            Some(Mutation {
                to_add: vec![],
                to_remove: to_remove.iter().map(|c| c.innovation()).collect(),
            })
        }
    }
}
