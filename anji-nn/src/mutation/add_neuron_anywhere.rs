use super::{Mutation, MutationOperator};
use crate::genomics::{
    ActivationType, Chromosome, ConnectionAllele, GeneticConfig, IdRegistry, NeuronAllele,
    NeuronType, RecurrencyPolicy, WeightRange,
};
use crate::Innovation;

use rand::prelude::{Rng, SliceRandom};
use rand_distr::{Distribution, Normal};

/// Inserts a hidden neuron between two arbitrary neurons,
/// without removing any connection.
///
/// The source is an input or a neuron reachable from one, and the
/// destination a non-input neuron that reaches an output, so the
/// new neuron always lies on an input-to-output path. When cycles
/// are disallowed, pairs whose destination reaches the source are
/// not eligible. The incoming weight is uniform within bounds and
/// the outgoing weight normally distributed around zero.
#[derive(Clone, Debug)]
pub struct AddNeuronAnywhere {
    rate: f32,
    std_dev: f64,
    policy: RecurrencyPolicy,
    activation_types: Vec<ActivationType>,
    weights: WeightRange,
}

impl AddNeuronAnywhere {
    pub fn from_config(config: &GeneticConfig) -> AddNeuronAnywhere {
        AddNeuronAnywhere {
            rate: config.add_neuron_anywhere_mutation_rate,
            std_dev: config.add_neuron_anywhere_std_dev,
            policy: config.recurrency_policy,
            activation_types: config.hidden_activation_choices().to_vec(),
            weights: config.weight_range(),
        }
    }

    fn candidate_pairs(
        &self,
        chromosome: &Chromosome,
        registry: &IdRegistry,
    ) -> Vec<(Innovation, Innovation)> {
        let sources = chromosome.input_reachable();
        let reaching = chromosome.output_reaching();
        let destinations: Vec<Innovation> = chromosome
            .neurons()
            .filter(|n| n.neuron_type() != NeuronType::Input)
            .map(|n| n.innovation())
            .filter(|n| reaching.contains(n))
            .collect();

        let mut pairs = Vec::new();
        for &dest in &destinations {
            let descendants = match self.policy {
                RecurrencyPolicy::Disallowed => Some(chromosome.forward_closure([dest])),
                RecurrencyPolicy::BestGuess | RecurrencyPolicy::Lazy => None,
            };
            for &src in &sources {
                if descendants.as_ref().map_or(false, |d| d.contains(&src)) {
                    continue;
                }
                let present = registry
                    .known_detached_neuron_id(src, dest)
                    .map_or(false, |n| chromosome.neuron(n).is_some());
                if !present {
                    pairs.push((src, dest));
                }
            }
        }
        pairs
    }
}

impl MutationOperator for AddNeuronAnywhere {
    fn name(&self) -> &'static str {
        "add neuron anywhere"
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
        let &(src, dest) = self.candidate_pairs(chromosome, registry).choose(rng)?;
        let activation_type = *self.activation_types.choose(rng)?;
        let outgoing = Normal::new(0.0, self.std_dev).ok()?;

        let neuron = registry.detached_neuron_id(src, dest);
        let into = registry.connection_id(src, neuron);
        let out_of = registry.connection_id(neuron, dest);
        let in_weight = self.weights.sample(rng);
        let out_weight = self.weights.clip(outgoing.sample(rng));

        Some(Mutation {
            to_add: vec![
                NeuronAllele::new(neuron, NeuronType::Hidden, activation_type).into(),
                ConnectionAllele::new(into, src, neuron, in_weight).into(),
                ConnectionAllele::new(out_of, neuron, dest, out_weight).into(),
            ],
            to_remove: vec![],
        })
    }
}
