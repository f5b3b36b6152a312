use super::{AddConnection, AddNeuron, Mutation, MutationOperator};
use crate::genomics::{Chromosome, GeneticConfig, IdRegistry};

use rand::Rng;

/// Classic NEAT topology mutation: at most one of connection
/// addition or neuron addition happens per mutation.
///
/// Fires with probability `pA + pN - pA·pN`, the chance of at least
/// one of the two independent operators firing, and then adds a
/// connection with probability `pA / (pA + pN)` or a neuron otherwise.
#[derive(Clone, Debug)]
pub struct SingleTopological {
    add_connection: AddConnection,
    add_neuron: AddNeuron,
}

impl SingleTopological {
    pub fn from_config(config: &GeneticConfig) -> SingleTopological {
        SingleTopological {
            add_connection: AddConnection::from_config(config),
            add_neuron: AddNeuron::from_config(config),
        }
    }

    fn connection_share(&self) -> f32 {
        let total = self.add_connection.rate() + self.add_neuron.rate();
        if total > 0.0 {
            self.add_connection.rate() / total
        } else {
            0.0
        }
    }
}

impl MutationOperator for SingleTopological {
    fn name(&self) -> &'static str {
        "single topological"
    }

    fn rate(&self) -> f32 {
        let (connection, neuron) = (self.add_connection.rate(), self.add_neuron.rate());
        connection + neuron - connection * neuron
    }

    fn propose(
        &self,
        chromosome: &Chromosome,
        registry: &mut IdRegistry,
        rng: &mut impl Rng,
    ) -> Option<Mutation> {
        if self.rate() <= 0.0 {
            None
        } else if rng.gen::<f32>() < self.connection_share() {
            self.add_connection.propose(chromosome, registry, rng)
        } else {
            self.add_neuron.propose(chromosome, registry, rng)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::NeuronType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    fn config(connection_rate: f32, neuron_rate: f32) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            initial_connectivity: 1.0,
            weight_min: -1.0,
            weight_max: 1.0,
            add_connection_mutation_rate: connection_rate,
            add_neuron_mutation_rate: neuron_rate,
            max_add_connection_attempts: 10,
            topology_mutation_classic: true,
            ..GeneticConfig::zero()
        }
    }

    #[test]
    fn combined_rate() {
        let operator = SingleTopological::from_config(&config(0.5, 0.2));
        assert!((operator.rate() - 0.6).abs() < 1e-6);
        assert!((operator.connection_share() - 0.5 / 0.7).abs() < 1e-6);

        let operator = SingleTopological::from_config(&config(0.0, 0.0));
        assert_eq!(operator.rate(), 0.0);
    }

    #[test]
    fn one_change_per_mutation() {
        let config = config(0.5, 0.5);
        let operator = SingleTopological::from_config(&config);
        let mut rng = StdRng::seed_from_u64(31);
        let mut registry = IdRegistry::new(&config);
        let mut chromosome = Chromosome::new(&config, &mut rng);

        for _ in 0..20 {
            let neurons = chromosome.neurons().count();
            let connections = chromosome.connections().count();
            if operator.mutate(&mut chromosome, &mut registry, &mut rng) {
                let added_neurons = chromosome.neurons().count() - neurons;
                let added_connections = chromosome.connections().count() - connections;
                // Either one connection, or one neuron replacing a connection by two.
                assert!(
                    (added_neurons, added_connections) == (0, 1)
                        || (added_neurons, added_connections) == (1, 1)
                );
            }
        }
        assert!(chromosome.neurons_of_type(NeuronType::Hidden).count() > 0);
    }
}
