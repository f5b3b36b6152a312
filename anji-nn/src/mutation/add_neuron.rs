use super::{Mutation, MutationOperator};
use crate::genomics::{
    ActivationType, Chromosome, ConnectionAllele, GeneticConfig, IdRegistry, NeuronAllele,
    NeuronType,
};

use rand::prelude::{Rng, SliceRandom};

/// Splits a connection in two, inserting a hidden neuron.
///
/// The split connection is removed. The connection into the new
/// neuron has weight 1.0 and the connection out of it keeps the
/// original weight. Connections whose split neuron is already
/// present in the chromosome are not eligible.
#[derive(Clone, Debug)]
pub struct AddNeuron {
    rate: f32,
    activation_types: Vec<ActivationType>,
}

impl AddNeuron {
    pub fn from_config(config: &GeneticConfig) -> AddNeuron {
        AddNeuron {
            rate: config.add_neuron_mutation_rate,
            activation_types: config.hidden_activation_choices().to_vec(),
        }
    }
}

impl MutationOperator for AddNeuron {
    fn name(&self) -> &'static str {
        "add neuron"
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
        let candidates: Vec<&ConnectionAllele> = chromosome
            .connections()
            .filter(|c| {
                registry
                    .known_split_neuron_id(c.innovation())
                    .map_or(true, |n| chromosome.neuron(n).is_none())
            })
            .collect();
        let split = *candidates.choose(rng)?;
        let activation_type = *self.activation_types.choose(rng)?;

        let (src, dest) = split.endpoints();
        let neuron = registry.split_neuron_id(split.innovation());
        let into = registry.connection_id(src, neuron);
        let out_of = registry.connection_id(neuron, dest);

        Some(Mutation {
            to_add: vec![
                NeuronAllele::new(neuron, NeuronType::Hidden, activation_type).into(),
                ConnectionAllele::new(into, src, neuron, 1.0).into(),
                ConnectionAllele::new(out_of, neuron, dest, split.weight()).into(),
            ],
            to_remove: vec![split.innovation()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    fn config() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            initial_connectivity: 1.0,
            weight_min: -1.0,
            weight_max: 1.0,
            add_neuron_mutation_rate: 1.0,
            hidden_activation_types: vec![ActivationType::Tanh],
            ..GeneticConfig::zero()
        }
    }

    #[test]
    fn split_structure() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(8);
        let mut registry = IdRegistry::new(&config);
        let mut chromosome = Chromosome::new(&config, &mut rng);
        let original = chromosome.clone();

        assert!(AddNeuron::from_config(&config).mutate(&mut chromosome, &mut registry, &mut rng));

        let hidden: Vec<&NeuronAllele> = chromosome.neurons_of_type(NeuronType::Hidden).collect();
        assert_eq!(hidden.len(), 1);
        assert_eq!(hidden[0].activation_type(), ActivationType::Tanh);
        let neuron = hidden[0].innovation();

        let (split, _) = registry
            .split_neuron_history()
            .find(|&(_, &n)| n == neuron)
            .unwrap();
        let split = original.connection(*split).unwrap();
        assert!(chromosome.connection(split.innovation()).is_none());

        let into = chromosome.connection_between(split.src(), neuron).unwrap();
        let out_of = chromosome.connection_between(neuron, split.dest()).unwrap();
        assert_eq!(into.weight(), 1.0);
        assert_eq!(out_of.weight(), split.weight());
        chromosome.validate().unwrap();
    }

    #[test]
    fn splits_each_connection_once() {
        let config = config();
        let operator = AddNeuron::from_config(&config);
        let mut rng = StdRng::seed_from_u64(8);
        let mut registry = IdRegistry::new(&config);
        let mut chromosome = Chromosome::new(&config, &mut rng);

        for _ in 0..50 {
            operator.mutate(&mut chromosome, &mut registry, &mut rng);
            chromosome.validate().unwrap();
        }
        // No neuron was ever proposed twice within the chromosome.
        assert_eq!(
            chromosome.neurons_of_type(NeuronType::Hidden).count(),
            registry.split_neuron_history().count()
        );
    }

    #[test]
    fn nothing_to_split() {
        let config = GeneticConfig {
            initial_connectivity: 0.0,
            ..config()
        };
        let mut rng = StdRng::seed_from_u64(8);
        let mut registry = IdRegistry::new(&config);
        let chromosome = Chromosome::new(&config, &mut rng);

        assert_eq!(
            AddNeuron::from_config(&config).propose(&chromosome, &mut registry, &mut rng),
            None
        );
    }
}
