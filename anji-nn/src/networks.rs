//! A Network is the executable phenotype of a Chromosome.
//! Neuron alleles become network neurons, and connection
//! alleles incoming connections of their destination neuron.
//!
//! Networks are built by a [`Transcriber`], which decides which
//! connections are recurrent according to its [`RecurrencyPolicy`]
//! and fixes the order in which neurons are evaluated. An
//! [`Activator`] then drives the network a fixed number of steps
//! per presented input.
//!
//! [`RecurrencyPolicy`]: crate::genomics::RecurrencyPolicy
mod activator;
mod transcriber;

pub use activator::Activator;
pub use transcriber::{Transcriber, TranscriberError};

use crate::genomics::ActivationType;
use crate::Innovation;

use std::fmt;

/// Relative cost of reading a forward connection.
const FORWARD_CONNECTION_COST: u64 = 2;
/// Relative cost of caching and reading a recurrent connection.
const RECURRENT_CONNECTION_COST: u64 = 3;
/// Relative cost of adding a bias.
const BIAS_COST: u64 = 1;
/// Relative cost of reading an external input.
const EXTERNAL_INPUT_COST: u64 = 1;

/// A contribution to a neuron's input sum.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Incoming {
    /// Reads the source's value from the current step.
    Forward { source: usize, weight: f64 },
    /// Reads the source's value from the previous step.
    Recurrent {
        source: usize,
        weight: f64,
        cached: f64,
    },
    /// A constant.
    Bias(f64),
    /// An external input, by index.
    External(usize),
}

impl Incoming {
    fn cost(&self) -> u64 {
        match self {
            Self::Forward { .. } => FORWARD_CONNECTION_COST,
            Self::Recurrent { .. } => RECURRENT_CONNECTION_COST,
            Self::Bias(_) => BIAS_COST,
            Self::External(_) => EXTERNAL_INPUT_COST,
        }
    }
}

/// An arbitrarily-structured, possibly recurrent, neural network.
///
/// Neurons are stored inputs first, then outputs, then hidden
/// neurons, each group in innovation order.
#[derive(Clone, Debug)]
pub struct Network {
    input_count: usize,
    output_count: usize,
    neuron_ids: Box<[Innovation]>,
    values: Box<[f64]>,
    activation_types: Box<[ActivationType]>,
    incoming: Box<[Box<[Incoming]>]>,
    evaluation_order: Box<[usize]>,
    inputs: Box<[f64]>,
}

impl Network {
    pub(crate) fn new(
        input_count: usize,
        output_count: usize,
        neuron_ids: Vec<Innovation>,
        activation_types: Vec<ActivationType>,
        incoming: Vec<Vec<Incoming>>,
        evaluation_order: Vec<usize>,
    ) -> Network {
        Network {
            input_count,
            output_count,
            values: vec![0.0; neuron_ids.len()].into(),
            neuron_ids: neuron_ids.into(),
            activation_types: activation_types.into(),
            incoming: incoming.into_iter().map(|v| v.into()).collect(),
            evaluation_order: evaluation_order.into(),
            inputs: vec![0.0; input_count].into(),
        }
    }

    /// Advances the network one step.
    ///
    /// Every recurrent connection first caches its source's value,
    /// then neurons are evaluated in evaluation order. Forward
    /// connections see their source's value from this step, so a
    /// feed-forward network settles in a single step.
    pub fn step(&mut self) {
        let Network {
            values,
            activation_types,
            incoming,
            evaluation_order,
            inputs,
            ..
        } = self;

        for connections in incoming.iter_mut() {
            for connection in connections.iter_mut() {
                if let Incoming::Recurrent { source, cached, .. } = connection {
                    *cached = values[*source];
                }
            }
        }

        for &neuron in evaluation_order.iter() {
            let sum: f64 = incoming[neuron]
                .iter()
                .map(|connection| match connection {
                    Incoming::Forward { source, weight } => weight * values[*source],
                    Incoming::Recurrent { weight, cached, .. } => weight * cached,
                    Incoming::Bias(bias) => *bias,
                    Incoming::External(index) => inputs[*index],
                })
                .fold(0.0, |sum, x| sum + x);
            values[neuron] = activation_types[neuron].apply(sum);
        }
    }

    /// Clears all neuron values, recurrent caches and pending inputs.
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
        self.inputs.iter_mut().for_each(|v| *v = 0.0);
        for connections in self.incoming.iter_mut() {
            for connection in connections.iter_mut() {
                if let Incoming::Recurrent { cached, .. } = connection {
                    *cached = 0.0;
                }
            }
        }
    }

    /// Sets the values presented to the input neurons
    /// on subsequent steps.
    ///
    /// # Panics
    /// Panics if `inputs` does not hold exactly one
    /// value per input neuron.
    pub fn set_inputs(&mut self, inputs: &[f64]) {
        assert_eq!(
            inputs.len(),
            self.input_count,
            "network has {} inputs, {} given",
            self.input_count,
            inputs.len()
        );
        self.inputs.copy_from_slice(inputs);
    }

    /// Returns the current values of the output neurons,
    /// in innovation order.
    pub fn outputs(&self) -> Vec<f64> {
        self.values[self.input_count..self.input_count + self.output_count].to_vec()
    }

    /// Returns the current value of the neuron with the given
    /// innovation number, if present.
    pub fn value_of(&self, neuron: Innovation) -> Option<f64> {
        self.neuron_ids
            .iter()
            .position(|&id| id == neuron)
            .map(|index| self.values[index])
    }

    /// Relative computational cost of one step: the cost of every
    /// activation function plus the cost of every connection,
    /// according to its kind.
    pub fn cost(&self) -> u64 {
        let activations: u64 = self.activation_types.iter().map(|a| a.cost()).sum();
        let connections: u64 = self.incoming.iter().flat_map(|c| c.iter()).map(Incoming::cost).sum();
        activations + connections
    }

    /// Returns the number of input neurons.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Returns the number of output neurons.
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Returns the total number of neurons.
    pub fn neuron_count(&self) -> usize {
        self.neuron_ids.len()
    }

    /// Returns the number of connections transcribed from
    /// connection alleles.
    pub fn connection_count(&self) -> usize {
        self.incoming
            .iter()
            .flat_map(|c| c.iter())
            .filter(|c| matches!(c, Incoming::Forward { .. } | Incoming::Recurrent { .. }))
            .count()
    }

    /// Returns the number of recurrent connections.
    pub fn recurrent_connections(&self) -> usize {
        self.incoming
            .iter()
            .flat_map(|c| c.iter())
            .filter(|c| matches!(c, Incoming::Recurrent { .. }))
            .count()
    }

    /// Source and destination of every recurrent connection.
    #[cfg(test)]
    pub(crate) fn recurrent_edges(&self) -> Vec<(Innovation, Innovation)> {
        let mut edges = Vec::new();
        for (dest, connections) in self.incoming.iter().enumerate() {
            for connection in connections.iter() {
                if let Incoming::Recurrent { source, .. } = connection {
                    edges.push((self.neuron_ids[*source], self.neuron_ids[dest]));
                }
            }
        }
        edges
    }

    /// Returns the innovation numbers of neurons in
    /// the order they are evaluated.
    pub fn evaluation_order(&self) -> Vec<Innovation> {
        self.evaluation_order
            .iter()
            .map(|&index| self.neuron_ids[index])
            .collect()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Network ({} inputs, {} outputs, {} neurons, {} recurrent connections) {{",
            self.input_count,
            self.output_count,
            self.neuron_count(),
            self.recurrent_connections()
        )?;
        for &index in self.evaluation_order.iter() {
            writeln!(
                f,
                "    {} [{}] = {:.4} <- {:?}",
                self.neuron_ids[index],
                self.activation_types[index],
                self.values[index],
                self.incoming[index]
            )?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{Chromosome, GeneticConfig, IdRegistry, RecurrencyPolicy};
    use crate::mutation::Mutator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-4.924273 * x).exp())
    }

    fn fixture() -> Chromosome {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            output_activation_type: ActivationType::Sigmoid,
            ..GeneticConfig::zero()
        };
        // Inputs 0, 1 and 2, output 3.
        let mut chromosome = Chromosome::new(&config, &mut StdRng::seed_from_u64(0));
        chromosome.add_neuron(10, ActivationType::Sigmoid).unwrap();
        chromosome.add_connection(11, 0, 10, 1.0).unwrap();
        chromosome.add_connection(12, 1, 10, -1.0).unwrap();
        chromosome.add_connection(13, 2, 10, -0.5).unwrap();
        chromosome.add_connection(14, 10, 3, 1.0).unwrap();
        chromosome
    }

    #[test]
    fn sigmoid_fixture() {
        let network = Transcriber::new(RecurrencyPolicy::Disallowed)
            .transcribe(&fixture())
            .unwrap();
        let mut activator = Activator::new(network, NonZeroUsize::new(1).unwrap());

        let outputs = activator.next(&[0.5, 0.5, 0.5]);
        assert_eq!(outputs, vec![sigmoid(1.0 * sigmoid(0.5 - 0.5 - 0.25))]);
        assert_eq!(
            activator.network().value_of(10),
            Some(sigmoid(0.5 - 0.5 - 0.25))
        );
    }

    #[test]
    fn reset_is_idempotent() {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            output_activation_type: ActivationType::Tanh,
            initial_connectivity: 1.0,
            weight_min: -2.0,
            weight_max: 2.0,
            add_connection_mutation_rate: 0.8,
            add_neuron_mutation_rate: 0.4,
            max_add_connection_attempts: 10,
            weight_mutation_rate: 0.5,
            weight_mutation_std_dev: 0.5,
            recurrency_policy: RecurrencyPolicy::BestGuess,
            recurrent_cycles: NonZeroUsize::new(3).unwrap(),
            ..GeneticConfig::zero()
        };
        let mut rng = StdRng::seed_from_u64(77);
        let mut registry = IdRegistry::new(&config);
        let mut chromosome = Chromosome::new(&config, &mut rng);
        let mutator = Mutator::from_config(&config);
        for _ in 0..30 {
            mutator.mutate(&mut chromosome, &mut registry, &mut rng);
        }

        let transcriber = Transcriber::from_config(&config);
        let sequence = [[0.1, -0.4], [0.9, 0.3], [-1.0, 0.0], [0.5, 0.5]];

        let mut activator = transcriber.activator(&chromosome).unwrap();
        let first = activator.next_sequence(&sequence);
        activator.reset();
        activator.reset();
        let second = activator.next_sequence(&sequence);
        let mut fresh = transcriber.activator(&chromosome).unwrap();
        let third = fresh.next_sequence(&sequence);

        assert_eq!(first, second);
        assert_eq!(first, third);
        assert!(activator.network().outputs().iter().all(|v| v.is_finite()));

        activator.reset();
        assert!(activator.network().outputs().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn recurrent_connections_lag_one_step() {
        let config = GeneticConfig::zero();
        // Input 0, linear output 1 with a self loop.
        let mut chromosome = Chromosome::new(&config, &mut StdRng::seed_from_u64(0));
        chromosome.add_connection(2, 0, 1, 1.0).unwrap();
        chromosome.add_connection(3, 1, 1, 0.5).unwrap();

        let mut network = Transcriber::new(RecurrencyPolicy::BestGuess)
            .transcribe(&chromosome)
            .unwrap();
        assert_eq!(network.recurrent_connections(), 1);

        network.set_inputs(&[1.0]);
        network.step();
        assert_eq!(network.outputs(), vec![1.0]);
        network.step();
        assert_eq!(network.outputs(), vec![1.5]);
        network.step();
        assert_eq!(network.outputs(), vec![1.75]);
    }

    #[test]
    fn feed_forward_settles_in_one_step() {
        let config = GeneticConfig::zero();
        let mut chromosome = Chromosome::new(&config, &mut StdRng::seed_from_u64(0));
        // 0 -> 20 -> 10 -> 1, with hidden IDs out of path order.
        chromosome.add_neuron(10, ActivationType::Linear).unwrap();
        chromosome.add_neuron(20, ActivationType::Linear).unwrap();
        chromosome.add_connection(30, 0, 20, 2.0).unwrap();
        chromosome.add_connection(31, 20, 10, 3.0).unwrap();
        chromosome.add_connection(32, 10, 1, 0.5).unwrap();

        let mut network = Transcriber::new(RecurrencyPolicy::BestGuess)
            .transcribe(&chromosome)
            .unwrap();
        assert_eq!(network.recurrent_connections(), 0);
        network.set_inputs(&[1.0]);
        network.step();
        assert_eq!(network.outputs(), vec![3.0]);
    }

    #[test]
    fn bias_contributes() {
        let config = GeneticConfig::zero();
        let mut chromosome = Chromosome::new(&config, &mut StdRng::seed_from_u64(0));
        chromosome
            .add_neuron(10, ActivationType::Linear)
            .unwrap()
            .set_bias(Some(0.25));
        chromosome.add_connection(11, 0, 10, 1.0).unwrap();
        chromosome.add_connection(12, 10, 1, 1.0).unwrap();

        let network = Transcriber::new(RecurrencyPolicy::Disallowed)
            .transcribe(&chromosome)
            .unwrap();
        let mut activator = Activator::new(network, NonZeroUsize::new(1).unwrap());
        assert_eq!(activator.next(&[1.0]), vec![1.25]);
    }

    #[test]
    fn cost_counts_activations_and_connections() {
        let network = Transcriber::new(RecurrencyPolicy::Disallowed)
            .transcribe(&fixture())
            .unwrap();
        let activations = 3 * ActivationType::Linear.cost() + 2 * ActivationType::Sigmoid.cost();
        let connections = 3 * EXTERNAL_INPUT_COST + 4 * FORWARD_CONNECTION_COST;
        assert_eq!(network.cost(), activations + connections);
        assert_eq!(network.connection_count(), 4);
        assert_eq!(network.neuron_count(), 5);
    }

    #[test]
    #[should_panic]
    fn input_length_mismatch() {
        let mut network = Transcriber::new(RecurrencyPolicy::Disallowed)
            .transcribe(&fixture())
            .unwrap();
        network.set_inputs(&[1.0]);
    }
}
