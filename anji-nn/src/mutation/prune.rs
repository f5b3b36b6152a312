use super::{Mutation, MutationOperator};
use crate::genomics::{Chromosome, GeneticConfig, IdRegistry, NeuronType};
use crate::Innovation;

use rand::Rng;

use std::collections::BTreeSet;

/// Removes structure that lies on no input-to-output path:
/// hidden neurons not reachable from an input or not reaching
/// an output, and connections whose source is unreachable from
/// the inputs or whose destination does not reach the outputs.
///
/// Removal never disconnects anything left on a path, so a
/// single application leaves nothing more to prune.
#[derive(Clone, Debug)]
pub struct Prune {
    rate: f32,
}

impl Prune {
    pub fn from_config(config: &GeneticConfig) -> Prune {
        Prune {
            rate: config.prune_mutation_rate,
        }
    }
}

impl MutationOperator for Prune {
    fn name(&self) -> &'static str {
        "prune"
    }

    fn rate(&self) -> f32 {
        self.rate
    }

    fn propose(
        &self,
        chromosome: &Chromosome,
        _registry: &mut IdRegistry,
        _rng: &mut impl Rng,
    ) -> Option<Mutation> {
        let reachable = chromosome.input_reachable();
        let reaching = chromosome.output_reaching();

        let stranded: BTreeSet<Innovation> = chromosome
            .neurons_of_type(NeuronType::Hidden)
            .map(|n| n.innovation())
            .filter(|n| !reachable.contains(n) || !reaching.contains(n))
            .collect();
        // Connections incident to stranded neurons leave with them.
        let to_remove: Vec<Innovation> = chromosome
            .connections()
            .filter(|c| !reachable.contains(&c.src()) || !reaching.contains(&c.dest()))
            .filter(|c| !stranded.contains(&c.src()) && !stranded.contains(&c.dest()))
            .map(|c| c.innovation())
            .chain(stranded.iter().copied())
            .collect();

        if to_remove.is_empty() {
            None
        } else {
            Some(Mutation {
                to_add: vec![],
                to_remove,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::ActivationType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    fn config() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            prune_mutation_rate: 1.0,
            ..GeneticConfig::zero()
        }
    }

    #[test]
    fn removes_everything_off_path() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(0);
        let mut registry = IdRegistry::new(&config);
        // Inputs 0 and 1, output 2.
        let mut chromosome = Chromosome::new(&config, &mut rng);
        for id in [10, 11, 12, 13] {
            chromosome.add_neuron(id, ActivationType::Sigmoid).unwrap();
        }
        for (id, src, dest) in [
            // On path: 0 -> 10 -> 2.
            (20, 0, 10),
            (21, 10, 2),
            // Dead end: 1 -> 11.
            (22, 1, 11),
            // Unreachable: 12 -> 2, and 12 -> 13 -> 12.
            (23, 12, 2),
            (24, 12, 13),
            (25, 13, 12),
            // Output feeding back into a dead end: 2 -> 11.
            (26, 2, 11),
            // Output self loop, kept since the output is on a path.
            (27, 2, 2),
        ] {
            chromosome.add_connection(id, src, dest, 1.0).unwrap();
        }

        let operator = Prune::from_config(&config);
        assert!(operator.mutate(&mut chromosome, &mut registry, &mut rng));

        assert_eq!(
            chromosome.alleles().iter().map(|a| a.innovation()).collect::<Vec<_>>(),
            vec![0, 1, 2, 10, 20, 21, 27]
        );
        chromosome.validate().unwrap();

        // A fixed point is reached in one application.
        assert!(!operator.mutate(&mut chromosome, &mut registry, &mut rng));
    }

    #[test]
    fn keeps_recurrent_paths() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(0);
        let mut registry = IdRegistry::new(&config);
        let mut chromosome = Chromosome::new(&config, &mut rng);
        chromosome.add_neuron(10, ActivationType::Sigmoid).unwrap();
        chromosome.add_connection(20, 0, 10, 1.0).unwrap();
        chromosome.add_connection(21, 10, 2, 1.0).unwrap();
        chromosome.add_connection(22, 2, 10, 1.0).unwrap();
        chromosome.add_connection(23, 10, 10, 1.0).unwrap();

        assert_eq!(
            Prune::from_config(&config).propose(&chromosome, &mut registry, &mut rng),
            None
        );
    }
}
