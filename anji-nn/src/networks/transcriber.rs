use super::{Activator, Incoming, Network};
use crate::genomics::{Chromosome, GeneticConfig, NeuronType, RecurrencyPolicy};
use crate::Innovation;

use ahash::RandomState;
use thiserror::Error;

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

/// Errors that can occur when transcribing a chromosome.
#[derive(Debug, Error, PartialEq)]
pub enum TranscriberError {
    #[error("connection {connection} references missing neuron {neuron}")]
    UnknownNeuron {
        connection: Innovation,
        neuron: Innovation,
    },
    #[error("connection {connection} targets input neuron {neuron}")]
    InputDestination {
        connection: Innovation,
        neuron: Innovation,
    },
    #[error("connection {connection} closes a cycle, but recurrency is disallowed")]
    Cycle { connection: Innovation },
}

type ConnectionSet = HashSet<Innovation, RandomState>;

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    Unseen,
    Open,
    Done,
}

/// Builds [`Network`]s out of [`Chromosome`]s.
///
/// Neurons are explored depth-first, starting from the inputs
/// and then from every remaining neuron, all in innovation order.
/// A connection leading back to a neuron still being explored,
/// self loops included, closes a cycle. How such connections
/// are treated depends on the [`RecurrencyPolicy`]:
///
/// * `Disallowed`: transcription fails.
/// * `BestGuess`: they become recurrent, and the remaining
/// connections are evaluated in dependency order.
/// * `Lazy`: every connection is recurrent, and neurons are
/// evaluated in innovation order.
#[derive(Clone, Copy, Debug)]
pub struct Transcriber {
    policy: RecurrencyPolicy,
    cycles: NonZeroUsize,
}

impl Transcriber {
    /// Creates a transcriber whose activators
    /// step once per presented input.
    pub fn new(policy: RecurrencyPolicy) -> Transcriber {
        Transcriber {
            policy,
            cycles: NonZeroUsize::MIN,
        }
    }

    /// Creates a transcriber following the configured
    /// recurrency policy and recurrent cycle count.
    pub fn from_config(config: &GeneticConfig) -> Transcriber {
        Transcriber {
            policy: config.recurrency_policy,
            cycles: config.recurrent_cycles,
        }
    }

    /// Returns the transcriber's recurrency policy.
    pub fn policy(&self) -> RecurrencyPolicy {
        self.policy
    }

    /// Transcribes a chromosome into an [`Activator`] running
    /// the configured number of steps per input.
    ///
    /// # Errors
    /// See [`transcribe`](Transcriber::transcribe).
    pub fn activator(&self, chromosome: &Chromosome) -> Result<Activator, TranscriberError> {
        Ok(Activator::new(self.transcribe(chromosome)?, self.cycles))
    }

    /// Transcribes a chromosome into a [`Network`].
    ///
    /// # Errors
    /// Returns an error if a connection references a neuron absent
    /// from the chromosome or targets an input neuron, or if the
    /// chromosome contains a cycle and recurrency is disallowed.
    pub fn transcribe(&self, chromosome: &Chromosome) -> Result<Network, TranscriberError> {
        // Inputs first, then outputs, then hidden neurons.
        let neuron_ids: Vec<Innovation> = [NeuronType::Input, NeuronType::Output, NeuronType::Hidden]
            .iter()
            .flat_map(|&t| chromosome.neurons_of_type(t).map(|n| n.innovation()))
            .collect();
        let index_of: HashMap<Innovation, usize, RandomState> = neuron_ids
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index))
            .collect();
        let input_count = chromosome.neurons_of_type(NeuronType::Input).count();
        let output_count = chromosome.neurons_of_type(NeuronType::Output).count();

        let mut outgoing: Vec<Vec<(Innovation, usize)>> = vec![vec![]; neuron_ids.len()];
        let mut edges = Vec::with_capacity(chromosome.connections().count());
        for connection in chromosome.connections() {
            let lookup = |neuron| {
                index_of
                    .get(&neuron)
                    .copied()
                    .ok_or(TranscriberError::UnknownNeuron {
                        connection: connection.innovation(),
                        neuron,
                    })
            };
            let src = lookup(connection.src())?;
            let dest = lookup(connection.dest())?;
            if dest < input_count {
                return Err(TranscriberError::InputDestination {
                    connection: connection.innovation(),
                    neuron: connection.dest(),
                });
            }
            outgoing[src].push((connection.innovation(), dest));
            edges.push((connection.innovation(), src, dest, connection.weight()));
        }

        let (recurrent, evaluation_order): (ConnectionSet, Vec<usize>) = match self.policy {
            RecurrencyPolicy::Lazy => {
                let recurrent = edges.iter().map(|&(id, ..)| id).collect();
                let order = chromosome
                    .neurons()
                    .map(|n| index_of[&n.innovation()])
                    .collect();
                (recurrent, order)
            }
            RecurrencyPolicy::Disallowed | RecurrencyPolicy::BestGuess => {
                let roots = (0..input_count)
                    .chain(chromosome.neurons().map(|n| index_of[&n.innovation()]));
                let (back_edges, mut postorder) = explore(&outgoing, roots);
                if self.policy == RecurrencyPolicy::Disallowed {
                    if let Some(&connection) = back_edges.first() {
                        return Err(TranscriberError::Cycle { connection });
                    }
                }
                postorder.reverse();
                (back_edges.into_iter().collect(), postorder)
            }
        };

        let mut incoming: Vec<Vec<Incoming>> = neuron_ids
            .iter()
            .enumerate()
            .map(|(index, &id)| {
                let mut contributions = vec![];
                if index < input_count {
                    contributions.push(Incoming::External(index));
                }
                if let Some(bias) = chromosome.neuron(id).and_then(|n| n.bias()) {
                    contributions.push(Incoming::Bias(bias));
                }
                contributions
            })
            .collect();
        // Edges are in innovation order, and so is every neuron's input sum.
        for (id, source, dest, weight) in edges {
            incoming[dest].push(if recurrent.contains(&id) {
                Incoming::Recurrent {
                    source,
                    weight,
                    cached: 0.0,
                }
            } else {
                Incoming::Forward { source, weight }
            });
        }

        let activation_types = neuron_ids
            .iter()
            .filter_map(|id| chromosome.neuron(*id))
            .map(|n| n.activation_type())
            .collect();

        let network = Network::new(
            input_count,
            output_count,
            neuron_ids,
            activation_types,
            incoming,
            evaluation_order,
        );
        log::debug!(
            "transcribed {} neurons and {} connections ({} recurrent) under {} recurrency",
            network.neuron_count(),
            network.connection_count(),
            network.recurrent_connections(),
            self.policy
        );
        Ok(network)
    }
}

/// Iterative depth-first search over `outgoing` from each of `roots`
/// in turn. Returns the connections leading back to a neuron still
/// open, in discovery order, and the neurons in postorder.
fn explore(
    outgoing: &[Vec<(Innovation, usize)>],
    roots: impl Iterator<Item = usize>,
) -> (Vec<Innovation>, Vec<usize>) {
    let mut visits = vec![Visit::Unseen; outgoing.len()];
    let mut back_edges = vec![];
    let mut postorder = Vec::with_capacity(outgoing.len());

    for root in roots {
        if visits[root] != Visit::Unseen {
            continue;
        }
        visits[root] = Visit::Open;
        // Each frame holds a neuron and the position of its next edge.
        let mut stack = vec![(root, 0)];
        while let Some(frame) = stack.last_mut() {
            let (neuron, next) = *frame;
            frame.1 += 1;
            match outgoing[neuron].get(next) {
                Some(&(connection, dest)) => {
                    match visits[dest] {
                        Visit::Unseen => {
                            visits[dest] = Visit::Open;
                            stack.push((dest, 0));
                        }
                        Visit::Open => back_edges.push(connection),
                        Visit::Done => {}
                    }
                }
                None => {
                    visits[neuron] = Visit::Done;
                    postorder.push(neuron);
                    stack.pop();
                }
            }
        }
    }

    (back_edges, postorder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ActivationType, IdRegistry};
    use crate::mutation::Mutator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(policy: RecurrencyPolicy) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            recurrency_policy: policy,
            ..GeneticConfig::zero()
        }
    }

    // Inputs 0 and 1, output 2, and a two neuron cycle 10 <-> 11.
    fn cyclic() -> Chromosome {
        let config = config(RecurrencyPolicy::BestGuess);
        let mut chromosome = Chromosome::new(&config, &mut StdRng::seed_from_u64(0));
        chromosome.add_neuron(10, ActivationType::Linear).unwrap();
        chromosome.add_neuron(11, ActivationType::Linear).unwrap();
        chromosome.add_connection(20, 0, 10, 1.0).unwrap();
        chromosome.add_connection(21, 10, 11, 1.0).unwrap();
        chromosome.add_connection(22, 11, 10, 1.0).unwrap();
        chromosome.add_connection(23, 11, 2, 1.0).unwrap();
        chromosome.add_connection(24, 1, 2, 1.0).unwrap();
        chromosome
    }

    #[test]
    fn disallowed_rejects_cycles() {
        assert_eq!(
            Transcriber::new(RecurrencyPolicy::Disallowed)
                .transcribe(&cyclic())
                .unwrap_err(),
            TranscriberError::Cycle { connection: 22 }
        );

        let config = config(RecurrencyPolicy::Disallowed);
        let mut chromosome = Chromosome::new(&config, &mut StdRng::seed_from_u64(0));
        chromosome.add_connection(3, 2, 2, 1.0).unwrap();
        assert_eq!(
            Transcriber::from_config(&config).transcribe(&chromosome).unwrap_err(),
            TranscriberError::Cycle { connection: 3 }
        );
    }

    #[test]
    fn best_guess_breaks_cycles_once() {
        let network = Transcriber::new(RecurrencyPolicy::BestGuess)
            .transcribe(&cyclic())
            .unwrap();
        assert_eq!(network.recurrent_connections(), 1);
        assert_eq!(network.connection_count(), 5);
        // Connection 22 closes the 10 -> 11 -> 10 loop.
        assert_eq!(network.recurrent_edges(), vec![(11, 10)]);

        let order = network.evaluation_order();
        let position = |id| order.iter().position(|&n| n == id).unwrap();
        assert!(position(0) < position(10));
        assert!(position(10) < position(11));
        assert!(position(11) < position(2));
        assert!(position(1) < position(2));
    }

    #[test]
    fn lazy_makes_everything_recurrent() {
        let network = Transcriber::new(RecurrencyPolicy::Lazy)
            .transcribe(&cyclic())
            .unwrap();
        assert_eq!(network.recurrent_connections(), 5);
        assert_eq!(network.evaluation_order(), vec![0, 1, 2, 10, 11]);

        // The input takes a step to settle, then a step per connection.
        let mut activator = Activator::new(network, NonZeroUsize::new(3).unwrap());
        assert_eq!(activator.next(&[1.0, 0.0]), vec![0.0]);
        assert_eq!(activator.network().value_of(11), Some(1.0));
        // The 10 <-> 11 loop keeps accumulating the signal.
        assert_eq!(activator.next(&[1.0, 0.0]), vec![2.0]);
    }

    #[test]
    fn split_preserves_function() {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            initial_connectivity: 1.0,
            weight_min: -1.0,
            weight_max: 1.0,
            hidden_activation_types: vec![ActivationType::Linear],
            add_neuron_mutation_rate: 1.0,
            ..GeneticConfig::zero()
        };
        let mut rng = StdRng::seed_from_u64(12);
        let mut registry = IdRegistry::new(&config);
        let original = Chromosome::new(&config, &mut rng);
        let mut split = original.clone();
        assert!(Mutator::from_config(&config).mutate(&mut split, &mut registry, &mut rng));
        assert_eq!(split.neurons().count(), original.neurons().count() + 1);

        let transcriber = Transcriber::from_config(&config);
        let mut before = transcriber.activator(&original).unwrap();
        let mut after = transcriber.activator(&split).unwrap();
        for inputs in [[0.25, 0.5], [-1.0, 2.0], [0.0, 0.0]] {
            assert_eq!(before.next(&inputs), after.next(&inputs));
        }
    }

    #[test]
    fn transcription_is_deterministic() {
        let config = GeneticConfig {
            initial_connectivity: 1.0,
            weight_min: -1.0,
            weight_max: 1.0,
            hidden_activation_types: vec![ActivationType::Tanh, ActivationType::Gaussian],
            add_connection_mutation_rate: 0.9,
            add_neuron_mutation_rate: 0.5,
            max_add_connection_attempts: 10,
            ..config(RecurrencyPolicy::BestGuess)
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut registry = IdRegistry::new(&config);
        let mut chromosome = Chromosome::new(&config, &mut rng);
        let mutator = Mutator::from_config(&config);
        for _ in 0..25 {
            mutator.mutate(&mut chromosome, &mut registry, &mut rng);
        }

        let transcriber = Transcriber::from_config(&config);
        let first = transcriber.transcribe(&chromosome).unwrap();
        let second = transcriber.transcribe(&chromosome).unwrap();
        assert_eq!(first.evaluation_order(), second.evaluation_order());
        assert_eq!(first.recurrent_connections(), second.recurrent_connections());
        assert_eq!(first.cost(), second.cost());
        assert_eq!(first.connection_count(), chromosome.connections().count());
        assert_eq!(first.neuron_count(), chromosome.neurons().count());
    }
}
