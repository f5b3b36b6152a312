use crate::genomics::GeneticConfig;
use crate::Innovation;

use ahash::RandomState;
use anji::InnovationHistory;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::HashMap;

/// An `IdRegistry` keeps track of structural innovations in a
/// run, so that identical mutations made by different chromosomes
/// are assigned the same innovation numbers.
///
/// Neurons and connections draw from a single counter, so their
/// IDs never collide within a chromosome. Connections are keyed
/// by their `(src, dest)` endpoints, neurons created by splitting
/// a connection by that connection's ID, and neurons inserted
/// between arbitrary neurons by the chosen `(src, dest)` pair.
///
/// Entries are never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdRegistry {
    next_innovation: Innovation,
    connections: HashMap<(Innovation, Innovation), Innovation, RandomState>,
    split_neurons: HashMap<Innovation, Innovation, RandomState>,
    detached_neurons: HashMap<(Innovation, Innovation), Innovation, RandomState>,
}

impl InnovationHistory for IdRegistry {
    type Config = GeneticConfig;

    fn new(config: &GeneticConfig) -> IdRegistry {
        Self::new(config)
    }
}

impl IdRegistry {
    /// Creates a new registry for the specified configuration.
    ///
    /// Input neurons are given IDs `0..I` and output neurons
    /// `I..I + O`. The connection from input `i` to output `o`
    /// (by index) is given the ID `I + O + i ⨯ O + o`, whether
    /// or not any chromosome expresses it. Fresh IDs start
    /// right after those.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::{GeneticConfig, IdRegistry};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(3).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let registry = IdRegistry::new(&config);
    ///
    /// // Input 1 to output 2 (neuron 4).
    /// assert_eq!(registry.known_connection_id(1, 4), Some(5 + 1 * 3 + 2));
    /// assert_eq!(registry.next_innovation(), 11);
    /// ```
    pub fn new(config: &GeneticConfig) -> IdRegistry {
        let inputs = config.input_count.get();
        let outputs = config.output_count.get();
        let connections = (0..inputs)
            // Cartesian product of inputs and outputs...
            .flat_map(|i| (0..outputs).map(move |o| (i, o)))
            // ...keyed by neuron IDs.
            .map(|(i, o)| ((i, inputs + o), inputs + outputs + i * outputs + o))
            .collect();
        IdRegistry {
            next_innovation: inputs + outputs + inputs * outputs,
            connections,
            split_neurons: HashMap::default(),
            detached_neurons: HashMap::default(),
        }
    }

    fn allocate(&mut self) -> Innovation {
        let id = self.next_innovation;
        self.next_innovation += 1;
        id
    }

    /// Returns the ID of the connection from `src` to `dest`,
    /// allocating and recording a fresh one if the pair
    /// has never been connected.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::{GeneticConfig, IdRegistry};
    ///
    /// let mut registry = IdRegistry::new(&GeneticConfig::zero());
    ///
    /// let id = registry.connection_id(1, 1);
    /// assert_eq!(registry.connection_id(1, 1), id);
    /// assert_ne!(registry.connection_id(0, 0), id);
    /// ```
    pub fn connection_id(&mut self, src: Innovation, dest: Innovation) -> Innovation {
        if let Some(&id) = self.connections.get(&(src, dest)) {
            return id;
        }
        let id = self.allocate();
        self.connections.insert((src, dest), id);
        id
    }

    /// Returns the ID of the neuron created by splitting
    /// `connection`, allocating and recording a fresh one
    /// if the connection has never been split.
    pub fn split_neuron_id(&mut self, connection: Innovation) -> Innovation {
        if let Some(&id) = self.split_neurons.get(&connection) {
            return id;
        }
        let id = self.allocate();
        self.split_neurons.insert(connection, id);
        id
    }

    /// Returns the ID of the neuron inserted between `src`
    /// and `dest` without splitting a connection, allocating
    /// and recording a fresh one if the pair is new.
    pub fn detached_neuron_id(&mut self, src: Innovation, dest: Innovation) -> Innovation {
        if let Some(&id) = self.detached_neurons.get(&(src, dest)) {
            return id;
        }
        let id = self.allocate();
        self.detached_neurons.insert((src, dest), id);
        id
    }

    /// Returns the ID recorded for a connection from `src`
    /// to `dest`, if any.
    pub fn known_connection_id(&self, src: Innovation, dest: Innovation) -> Option<Innovation> {
        self.connections.get(&(src, dest)).copied()
    }

    /// Returns the ID recorded for the neuron splitting
    /// `connection`, if any.
    pub fn known_split_neuron_id(&self, connection: Innovation) -> Option<Innovation> {
        self.split_neurons.get(&connection).copied()
    }

    /// Returns the ID recorded for a neuron inserted between
    /// `src` and `dest`, if any.
    pub fn known_detached_neuron_id(
        &self,
        src: Innovation,
        dest: Innovation,
    ) -> Option<Innovation> {
        self.detached_neurons.get(&(src, dest)).copied()
    }

    /// Returns the ID the next new innovation will receive.
    pub fn next_innovation(&self) -> Innovation {
        self.next_innovation
    }

    /// Returns an iterator over the complete record of connection
    /// innovations, in the format `((src, dest), connection)`.
    /// No ordering is guaranteed.
    pub fn connection_history(
        &self,
    ) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.connections.iter()
    }

    /// Returns an iterator over the complete record of split
    /// neuron innovations, in the format `(split connection, neuron)`.
    /// No ordering is guaranteed.
    pub fn split_neuron_history(&self) -> impl Iterator<Item = (&Innovation, &Innovation)> {
        self.split_neurons.iter()
    }

    /// Returns an iterator over the complete record of detached
    /// neuron innovations, in the format `((src, dest), neuron)`.
    /// No ordering is guaranteed.
    pub fn detached_neuron_history(
        &self,
    ) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.detached_neurons.iter()
    }
}
