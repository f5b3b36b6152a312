//! Chromosomes are the focus of evolution in NEAT.
//! They are a collection of neuron and connection alleles that can be
//! transcribed into a phenotype (a neural network). Chromosomes can be
//! progressively mutated, thus adding complexity and functionality.

mod config;
mod connections;
mod errors;
mod neurons;
mod registry;

pub use config::{GeneticConfig, RecurrencyPolicy, RemovalStrategy};
pub(crate) use config::WeightRange;
pub use connections::ConnectionAllele;
pub use errors::{AlleleError, ConfigError, ValidationError};
pub use neurons::{ActivationType, NeuronAllele, NeuronType};
pub use registry::IdRegistry;

use crate::mutation::Mutation;
use crate::Innovation;

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// An owned allele of either kind.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Allele {
    Neuron(NeuronAllele),
    Connection(ConnectionAllele),
}

impl Allele {
    /// Returns the allele's innovation number.
    pub fn innovation(&self) -> Innovation {
        match self {
            Self::Neuron(n) => n.innovation(),
            Self::Connection(c) => c.innovation(),
        }
    }
}

impl From<NeuronAllele> for Allele {
    fn from(neuron: NeuronAllele) -> Allele {
        Allele::Neuron(neuron)
    }
}

impl From<ConnectionAllele> for Allele {
    fn from(connection: ConnectionAllele) -> Allele {
        Allele::Connection(connection)
    }
}

/// A borrowed view of an allele of either kind.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AlleleRef<'a> {
    Neuron(&'a NeuronAllele),
    Connection(&'a ConnectionAllele),
}

impl AlleleRef<'_> {
    /// Returns the allele's innovation number.
    pub fn innovation(&self) -> Innovation {
        match self {
            Self::Neuron(n) => n.innovation(),
            Self::Connection(c) => c.innovation(),
        }
    }
}

impl fmt::Display for AlleleRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neuron(n) => n.fmt(f),
            Self::Connection(c) => c.fmt(f),
        }
    }
}

/// A mutable collection of neuron and connection alleles,
/// ordered by innovation number.
///
/// Suports Serde for convenient chromosome saving and loading.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Chromosome {
    neurons: BTreeMap<Innovation, NeuronAllele>,
    connections: BTreeMap<Innovation, ConnectionAllele>,
    pub(crate) fitness: f32,
}

impl Chromosome {
    /// Create a new chromosome with the specified configuration.
    ///
    /// Input neurons are given IDs `0..input_count` and output neurons
    /// the following `output_count` IDs. Each input-output pair is
    /// connected with probability [`initial_connectivity`], using the
    /// ID reserved for it by [`IdRegistry::new`] and a uniformly
    /// random weight within the configured bounds.
    ///
    /// [`initial_connectivity`]: GeneticConfig::initial_connectivity
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::{Chromosome, GeneticConfig, NeuronType};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_connectivity: 1.0,
    ///     weight_min: -5.0,
    ///     weight_max: 5.0,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let chromosome = Chromosome::new(&config, &mut StdRng::seed_from_u64(0));
    ///
    /// // As configured, the chromosome should have 3 inputs + 2 outputs.
    /// assert_eq!(chromosome.neurons_of_type(NeuronType::Input).count(), 3);
    /// assert_eq!(chromosome.neurons_of_type(NeuronType::Output).count(), 2);
    ///
    /// // And with an initial_connectivity of 1, every pair is connected.
    /// assert_eq!(chromosome.connections().count(), 3 * 2);
    /// assert!(chromosome.connections().all(|c| c.weight().abs() <= 5.0));
    /// assert!(chromosome.connections().all(|c| (5..5 + 3 * 2).contains(&c.innovation())));
    /// ```
    pub fn new(config: &GeneticConfig, rng: &mut impl Rng) -> Chromosome {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();

        let mut chromosome = Chromosome {
            neurons: BTreeMap::new(),
            connections: BTreeMap::new(),
            fitness: 0.0,
        };

        for i in 0..input_count {
            chromosome.neurons.insert(
                i,
                NeuronAllele::new(i, NeuronType::Input, config.input_activation_type),
            );
        }
        for o in input_count..input_count + output_count {
            chromosome.neurons.insert(
                o,
                NeuronAllele::new(o, NeuronType::Output, config.output_activation_type),
            );
        }

        if config.initial_connectivity > 0.0 {
            for i in 0..input_count {
                for o in 0..output_count {
                    if rng.gen::<f32>() < config.initial_connectivity {
                        let id = input_count + output_count + i * output_count + o;
                        let weight = config.weight_range().sample(rng);
                        let added = chromosome.add_connection(id, i, input_count + o, weight);
                        debug_assert!(added.is_ok(), "fresh inputs and outputs cannot conflict");
                    }
                }
            }
        }

        chromosome
    }

    /// Add a new hidden neuron to the chromosome.
    /// Returns a reference to the new neuron.
    ///
    /// # Errors
    ///
    /// This function returns an error if an allele with
    /// the same `id` already exists in the chromosome.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::{ActivationType, Chromosome, GeneticConfig, NeuronType};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GeneticConfig::zero();
    /// let mut chromosome = Chromosome::new(&config, &mut StdRng::seed_from_u64(0));
    ///
    /// let neuron = chromosome.add_neuron(42, ActivationType::Tanh).unwrap();
    /// assert_eq!(neuron.neuron_type(), NeuronType::Hidden);
    ///
    /// // IDs are unique within a chromosome.
    /// assert!(chromosome.add_neuron(42, ActivationType::Tanh).is_err());
    /// assert!(chromosome.add_neuron(0, ActivationType::Tanh).is_err());
    /// ```
    pub fn add_neuron(
        &mut self,
        id: Innovation,
        activation_type: ActivationType,
    ) -> Result<&mut NeuronAllele, AlleleError> {
        self.insert_neuron(NeuronAllele::new(id, NeuronType::Hidden, activation_type))
    }

    fn insert_neuron(&mut self, neuron: NeuronAllele) -> Result<&mut NeuronAllele, AlleleError> {
        let id = neuron.innovation();
        if self.contains(id) {
            return Err(AlleleError::DuplicateInnovation(id));
        }
        Ok(self.neurons.entry(id).or_insert(neuron.detached()))
    }

    /// Add a new connection to the chromosome.
    /// Returns a reference to the new connection.
    ///
    /// # Errors
    ///
    /// This function returns an error if an allele with the same
    /// `id` already exists in the chromosome, if either `src` or
    /// `dest` are not neurons of the chromosome, if `src` and `dest`
    /// are already connected, or if `dest` is an input neuron.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::{Chromosome, GeneticConfig};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut chromosome = Chromosome::new(&config, &mut StdRng::seed_from_u64(0));
    ///
    /// let connection = chromosome.add_connection(42, 2, 4, 2.5).unwrap().clone();
    /// assert_eq!(connection.endpoints(), (2, 4));
    /// assert_eq!(connection.weight(), 2.5);
    ///
    /// // Cycles and self loops are legal chromosome material.
    /// chromosome.add_connection(43, 3, 4, -3.0).unwrap();
    /// chromosome.add_connection(44, 4, 3, 1.0).unwrap();
    /// chromosome.add_connection(45, 4, 4, -1.0).unwrap();
    ///
    /// // But connections into inputs, or between already connected neurons, are not.
    /// assert!(chromosome.add_connection(46, 4, 0, 1.0).is_err());
    /// assert!(chromosome.add_connection(47, 2, 4, 1.0).is_err());
    /// ```
    pub fn add_connection(
        &mut self,
        id: Innovation,
        src: Innovation,
        dest: Innovation,
        weight: f64,
    ) -> Result<&mut ConnectionAllele, AlleleError> {
        self.check_connection_viability(id, src, dest)?;
        self.neurons
            .get_mut(&src)
            .ok_or(AlleleError::MissingEndpoint { id, src, dest })?
            .add_output_connection(id)?;
        self.neurons
            .get_mut(&dest)
            .ok_or(AlleleError::MissingEndpoint { id, src, dest })?
            .add_input_connection(id)?;
        Ok(self
            .connections
            .entry(id)
            .or_insert(ConnectionAllele::new(id, src, dest, weight)))
    }

    fn check_connection_viability(
        &self,
        id: Innovation,
        src: Innovation,
        dest: Innovation,
    ) -> Result<(), AlleleError> {
        if self.contains(id) {
            return Err(AlleleError::DuplicateInnovation(id));
        }
        let dest_neuron = match (self.neurons.get(&src), self.neurons.get(&dest)) {
            (Some(_), Some(dest_neuron)) => dest_neuron,
            _ => return Err(AlleleError::MissingEndpoint { id, src, dest }),
        };
        if let Some(existing) = self.connection_between(src, dest) {
            Err(AlleleError::DuplicateEndpoints {
                id,
                existing: existing.innovation(),
                src,
                dest,
            })
        } else if dest_neuron.neuron_type() == NeuronType::Input {
            Err(AlleleError::InputDestination { id, dest })
        } else {
            Ok(())
        }
    }

    /// Removes a connection from the chromosome, returning it.
    ///
    /// # Errors
    /// Returns an error if no connection has the ID.
    pub fn remove_connection(&mut self, id: Innovation) -> Result<ConnectionAllele, AlleleError> {
        let connection = self
            .connections
            .remove(&id)
            .ok_or(AlleleError::Absent(id))?;
        if let Some(src) = self.neurons.get_mut(&connection.src()) {
            src.remove_output_connection(id);
        }
        if let Some(dest) = self.neurons.get_mut(&connection.dest()) {
            dest.remove_input_connection(id);
        }
        Ok(connection)
    }

    /// Removes a hidden neuron and every connection
    /// incident to it, returning the neuron.
    ///
    /// # Errors
    /// Returns an error if no neuron has the ID, or
    /// if it is an input or output neuron.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::{ActivationType, Chromosome, GeneticConfig};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GeneticConfig::zero();
    /// let mut chromosome = Chromosome::new(&config, &mut StdRng::seed_from_u64(0));
    /// chromosome.add_neuron(3, ActivationType::Sigmoid).unwrap();
    /// chromosome.add_connection(4, 0, 3, 1.0).unwrap();
    /// chromosome.add_connection(5, 3, 1, 1.0).unwrap();
    ///
    /// chromosome.remove_neuron(3).unwrap();
    /// assert_eq!(chromosome.connections().count(), 0);
    /// assert!(chromosome.remove_neuron(1).is_err());
    /// ```
    pub fn remove_neuron(&mut self, id: Innovation) -> Result<NeuronAllele, AlleleError> {
        let neuron = self.neurons.get(&id).ok_or(AlleleError::Absent(id))?;
        if neuron.neuron_type() != NeuronType::Hidden {
            return Err(AlleleError::NotHidden(id));
        }
        let incident: Vec<Innovation> = neuron
            .input_connections()
            .chain(neuron.output_connections())
            .collect();
        for connection in incident {
            // Self loops appear twice.
            if self.connections.contains_key(&connection) {
                self.remove_connection(connection)?;
            }
        }
        self.neurons.remove(&id).ok_or(AlleleError::Absent(id))
    }

    fn remove(&mut self, id: Innovation) -> Result<(), AlleleError> {
        if self.connections.contains_key(&id) {
            self.remove_connection(id).map(|_| ())
        } else {
            self.remove_neuron(id).map(|_| ())
        }
    }

    /// Applies a mutation: removals first, then neuron additions,
    /// then connection additions. Removing and re-adding the same
    /// ID replaces the allele.
    ///
    /// The chromosome is left untouched if any step fails.
    ///
    /// # Errors
    /// Returns the first allele error encountered.
    pub fn apply(&mut self, mutation: Mutation) -> Result<(), AlleleError> {
        let mut next = self.clone();
        for id in &mutation.to_remove {
            next.remove(*id)?;
        }
        let (neurons, connections): (Vec<_>, Vec<_>) = mutation
            .to_add
            .into_iter()
            .partition(|a| matches!(a, Allele::Neuron(_)));
        for allele in neurons.into_iter().chain(connections) {
            match allele {
                Allele::Neuron(n) => {
                    next.insert_neuron(n)?;
                }
                Allele::Connection(c) => {
                    next.add_connection(c.innovation(), c.src(), c.dest(), c.weight())?;
                }
            }
        }
        *self = next;
        Ok(())
    }

    fn contains(&self, id: Innovation) -> bool {
        self.neurons.contains_key(&id) || self.connections.contains_key(&id)
    }

    /// Returns every allele, in innovation order.
    pub fn alleles(&self) -> Vec<AlleleRef<'_>> {
        let mut alleles: Vec<AlleleRef> = self
            .neurons
            .values()
            .map(AlleleRef::Neuron)
            .chain(self.connections.values().map(AlleleRef::Connection))
            .collect();
        alleles.sort_unstable_by_key(|a| a.innovation());
        alleles
    }

    /// Returns an iterator over the chromosome's neurons, in innovation order.
    pub fn neurons(&self) -> impl Iterator<Item = &NeuronAllele> {
        self.neurons.values()
    }

    /// Returns an iterator over the chromosome's connections, in innovation order.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionAllele> {
        self.connections.values()
    }

    /// Returns the neuron with the given ID, if present.
    pub fn neuron(&self, id: Innovation) -> Option<&NeuronAllele> {
        self.neurons.get(&id)
    }

    /// Returns the connection with the given ID, if present.
    pub fn connection(&self, id: Innovation) -> Option<&ConnectionAllele> {
        self.connections.get(&id)
    }

    /// Returns an iterator over neurons of the given type, in innovation order.
    pub fn neurons_of_type(&self, neuron_type: NeuronType) -> impl Iterator<Item = &NeuronAllele> {
        self.neurons
            .values()
            .filter(move |n| n.neuron_type() == neuron_type)
    }

    /// Returns the connection from `src` to `dest`, if present.
    pub fn connection_between(&self, src: Innovation, dest: Innovation) -> Option<&ConnectionAllele> {
        self.neurons
            .get(&src)?
            .output_connections()
            .filter_map(|id| self.connections.get(&id))
            .find(|c| c.dest() == dest)
    }

    /// Returns whether a directed path leads from `from` to `to`.
    /// Every present neuron reaches itself.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::{ActivationType, Chromosome, GeneticConfig};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GeneticConfig::zero();
    /// let mut chromosome = Chromosome::new(&config, &mut StdRng::seed_from_u64(0));
    /// chromosome.add_neuron(3, ActivationType::Sigmoid).unwrap();
    /// chromosome.add_connection(4, 0, 3, 1.0).unwrap();
    /// chromosome.add_connection(5, 3, 1, 1.0).unwrap();
    ///
    /// assert!(chromosome.reaches(0, 1));
    /// assert!(!chromosome.reaches(1, 0));
    /// assert!(chromosome.reaches(3, 3));
    /// ```
    pub fn reaches(&self, from: Innovation, to: Innovation) -> bool {
        self.neurons.contains_key(&from) && self.forward_closure([from]).contains(&to)
    }

    /// Neurons reachable by following connections forward from `roots`,
    /// the roots included.
    pub(crate) fn forward_closure(
        &self,
        roots: impl IntoIterator<Item = Innovation>,
    ) -> BTreeSet<Innovation> {
        self.closure(roots, |n| {
            n.output_connections()
                .filter_map(|id| self.connections.get(&id))
                .map(|c| c.dest())
                .collect()
        })
    }

    /// Neurons from which some root is reachable, the roots included.
    pub(crate) fn backward_closure(
        &self,
        roots: impl IntoIterator<Item = Innovation>,
    ) -> BTreeSet<Innovation> {
        self.closure(roots, |n| {
            n.input_connections()
                .filter_map(|id| self.connections.get(&id))
                .map(|c| c.src())
                .collect()
        })
    }

    fn closure(
        &self,
        roots: impl IntoIterator<Item = Innovation>,
        neighbors: impl Fn(&NeuronAllele) -> Vec<Innovation>,
    ) -> BTreeSet<Innovation> {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<Innovation> = roots.into_iter().collect();
        while let Some(id) = stack.pop() {
            if let Some(neuron) = self.neurons.get(&id) {
                if visited.insert(id) {
                    stack.extend(neighbors(neuron));
                }
            }
        }
        visited
    }

    /// Neurons reachable from some input neuron.
    pub(crate) fn input_reachable(&self) -> BTreeSet<Innovation> {
        self.forward_closure(self.neurons_of_type(NeuronType::Input).map(|n| n.innovation()))
    }

    /// Neurons that reach some output neuron.
    pub(crate) fn output_reaching(&self) -> BTreeSet<Innovation> {
        self.backward_closure(self.neurons_of_type(NeuronType::Output).map(|n| n.innovation()))
    }

    /// Checks every structural invariant, including that each
    /// hidden neuron lies on some input-to-output path.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_allowing_stranded()?;
        let reachable = self.input_reachable();
        let reaching = self.output_reaching();
        match self
            .neurons_of_type(NeuronType::Hidden)
            .find(|n| !reachable.contains(&n.innovation()) || !reaching.contains(&n.innovation()))
        {
            Some(stranded) => Err(ValidationError::StrandedNeuron(stranded.innovation())),
            None => Ok(()),
        }
    }

    /// Checks every structural invariant except the absence
    /// of stranded hidden neurons, which mutations may
    /// temporarily introduce.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn validate_allowing_stranded(&self) -> Result<(), ValidationError> {
        let mut endpoints = BTreeMap::new();
        for connection in self.connections.values() {
            let id = connection.innovation();
            for endpoint in [connection.src(), connection.dest()] {
                if !self.neurons.contains_key(&endpoint) {
                    return Err(ValidationError::DanglingConnection {
                        connection: id,
                        neuron: endpoint,
                    });
                }
            }
            let src = &self.neurons[&connection.src()];
            let dest = &self.neurons[&connection.dest()];
            if dest.neuron_type() == NeuronType::Input {
                return Err(ValidationError::InputDestination {
                    connection: id,
                    neuron: dest.innovation(),
                });
            }
            if !src.output_connections().any(|c| c == id) {
                return Err(ValidationError::Bookkeeping {
                    neuron: src.innovation(),
                    connection: id,
                });
            }
            if !dest.input_connections().any(|c| c == id) {
                return Err(ValidationError::Bookkeeping {
                    neuron: dest.innovation(),
                    connection: id,
                });
            }
            if let Some(existing) = endpoints.insert(connection.endpoints(), id) {
                return Err(ValidationError::DuplicateEndpoints(existing, id));
            }
        }
        for neuron in self.neurons.values() {
            let id = neuron.innovation();
            let stray_input = neuron
                .input_connections()
                .map(|c| (c, self.connections.get(&c).map(|c| c.dest())))
                .find(|(_, dest)| *dest != Some(id));
            let stray_output = neuron
                .output_connections()
                .map(|c| (c, self.connections.get(&c).map(|c| c.src())))
                .find(|(_, src)| *src != Some(id));
            if let Some((connection, _)) = stray_input.or(stray_output) {
                return Err(ValidationError::Bookkeeping {
                    neuron: id,
                    connection,
                });
            }
        }
        Ok(())
    }

    /// Returns the chromosome's fitness.
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    /// Sets the chromosome's fitness.
    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    /// Returns the set of innovation numbers of the
    /// chromosome's connections.
    pub(crate) fn connection_ids(&self) -> HashSet<Innovation> {
        self.connections.keys().copied().collect()
    }

    pub(crate) fn connection_mut(&mut self, id: Innovation) -> Option<&mut ConnectionAllele> {
        self.connections.get_mut(&id)
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Chromosome (fitness {}) {{", self.fitness)?;
        for allele in self.alleles() {
            writeln!(f, "    {}", allele)?;
        }
        write!(f, "}}")
    }
}
