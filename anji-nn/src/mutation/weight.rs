use super::{Mutation, MutationOperator};
use crate::genomics::{Allele, Chromosome, GeneticConfig, IdRegistry, WeightRange};

use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Perturbs every connection weight with normally
/// distributed noise, clipped to the weight bounds.
#[derive(Clone, Debug)]
pub struct Weight {
    rate: f32,
    std_dev: f64,
    weights: WeightRange,
}

impl Weight {
    pub fn from_config(config: &GeneticConfig) -> Weight {
        Weight {
            rate: config.weight_mutation_rate,
            std_dev: config.weight_mutation_std_dev,
            weights: config.weight_range(),
        }
    }
}

impl MutationOperator for Weight {
    fn name(&self) -> &'static str {
        "weight"
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
        let noise = Normal::new(0.0, self.std_dev).ok()?;
        let (to_remove, to_add) = chromosome
            .connections()
            .map(|c| {
                let weight = self.weights.clip(c.weight() + noise.sample(rng));
                (c.innovation(), Allele::from(c.with_weight(weight)))
            })
            .unzip();
        Some(Mutation { to_add, to_remove })
    }
}
