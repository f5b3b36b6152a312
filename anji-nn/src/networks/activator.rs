use super::Network;

use std::num::NonZeroUsize;

/// Drives a [`Network`] a fixed number of steps
/// for every presented input.
///
/// State persists between inputs, so recurrent networks
/// see a presented sequence as a whole. Call
/// [`reset`](Activator::reset) between unrelated sequences.
#[derive(Clone, Debug)]
pub struct Activator {
    network: Network,
    cycles: NonZeroUsize,
}

impl Activator {
    /// Wraps `network`, stepping it `cycles` times per input.
    pub fn new(network: Network, cycles: NonZeroUsize) -> Activator {
        Activator { network, cycles }
    }

    /// Presents `inputs` to the network and returns
    /// its outputs after the configured number of steps.
    ///
    /// # Panics
    /// Panics if `inputs` does not hold exactly
    /// one value per input neuron.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::{ActivationType, Chromosome, GeneticConfig, RecurrencyPolicy};
    /// use anji_nn::networks::{Activator, Transcriber};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use std::num::NonZeroUsize;
    ///
    /// fn sigmoid(x: f64) -> f64 {
    ///     1.0 / (1.0 + (-4.924273 * x).exp())
    /// }
    ///
    /// // Input 0, sigmoid neuron 2, and linear output 1.
    /// let mut chromosome = Chromosome::new(&GeneticConfig::zero(), &mut StdRng::seed_from_u64(0));
    /// chromosome.add_neuron(2, ActivationType::Sigmoid).unwrap();
    /// chromosome.add_connection(3, 0, 2, 1.0).unwrap();
    /// chromosome.add_connection(4, 2, 1, 2.0).unwrap();
    ///
    /// let network = Transcriber::new(RecurrencyPolicy::Disallowed)
    ///     .transcribe(&chromosome)
    ///     .unwrap();
    /// let mut activator = Activator::new(network, NonZeroUsize::new(1).unwrap());
    /// for input in -20..=20 {
    ///     let input = input as f64 / 10.0;
    ///     assert_eq!(activator.next(&[input]), vec![2.0 * sigmoid(input)]);
    /// }
    /// ```
    pub fn next(&mut self, inputs: &[f64]) -> Vec<f64> {
        self.network.set_inputs(inputs);
        for _ in 0..self.cycles.get() {
            self.network.step();
        }
        self.network.outputs()
    }

    /// Presents each input of `sequence` in turn, returning
    /// the outputs after each of them.
    pub fn next_sequence<I, S>(&mut self, sequence: I) -> Vec<Vec<f64>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[f64]>,
    {
        sequence
            .into_iter()
            .map(|inputs| self.next(inputs.as_ref()))
            .collect()
    }

    /// Clears all network state.
    pub fn reset(&mut self) {
        self.network.reset();
    }

    /// Returns the number of steps run per input.
    pub fn cycles(&self) -> NonZeroUsize {
        self.cycles
    }

    /// Returns the underlying network.
    pub fn network(&self) -> &Network {
        &self.network
    }
}
