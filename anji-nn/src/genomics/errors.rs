use crate::Innovation;

use thiserror::Error;

/// An error type indicating the allele being added
/// to or removed from a chromosome is invalid.
#[derive(Debug, Error, PartialEq)]
pub enum AlleleError {
    /// The allele's ID is already in use.
    #[error("duplicate allele insertion with id {0}")]
    DuplicateInnovation(Innovation),
    /// The connection's endpoints do not exist.
    #[error("connection {id} between nonexistent endpoint(s) {src} -> {dest}")]
    MissingEndpoint {
        id: Innovation,
        src: Innovation,
        dest: Innovation,
    },
    /// Another connection already joins the same endpoints.
    #[error("connection {id} with endpoints {src} -> {dest} shadows connection {existing}")]
    DuplicateEndpoints {
        id: Innovation,
        existing: Innovation,
        src: Innovation,
        dest: Innovation,
    },
    /// The connection's destination is an input neuron.
    #[error("connection {id} targets input neuron {dest}")]
    InputDestination { id: Innovation, dest: Innovation },
    /// No allele with the ID is present.
    #[error("attempted removal of nonexistent allele with id {0}")]
    Absent(Innovation),
    /// Only hidden neurons may be removed.
    #[error("attempted removal of non-hidden neuron {0}")]
    NotHidden(Innovation),
}

/// An error type indicating a chromosome's
/// material breaks a structural invariant.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A connection refers to a neuron that is not present.
    #[error("connection {connection} refers to missing neuron {neuron}")]
    DanglingConnection {
        connection: Innovation,
        neuron: Innovation,
    },
    /// Neuron bookkeeping disagrees with the connection set.
    #[error("neuron {neuron} bookkeeping disagrees with connection {connection}")]
    Bookkeeping {
        neuron: Innovation,
        connection: Innovation,
    },
    /// A connection enters an input neuron.
    #[error("connection {connection} targets input neuron {neuron}")]
    InputDestination {
        connection: Innovation,
        neuron: Innovation,
    },
    /// Two connections share the same endpoints.
    #[error("connections {0} and {1} share endpoints")]
    DuplicateEndpoints(Innovation, Innovation),
    /// A hidden neuron is not on any input-to-output path.
    #[error("hidden neuron {0} is stranded")]
    StrandedNeuron(Innovation),
}

/// An error type indicating an invalid configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A probability outside [0, 1].
    #[error("{name} must be a probability, got {value}")]
    Probability { name: &'static str, value: f32 },
    /// Weight bounds are inverted or not comparable.
    #[error("weight bounds [{min}, {max}] are empty")]
    WeightBounds { min: f64, max: f64 },
    /// A negative or non-finite standard deviation.
    #[error("{name} must be finite and non-negative, got {value}")]
    StdDev { name: &'static str, value: f64 },
    /// Mutually exclusive options were combined.
    #[error("conflicting options: {0}")]
    Conflict(&'static str),
    /// Unrecognized activation function name.
    #[error("unknown activation type {0:?}")]
    UnknownActivationType(String),
    /// Unrecognized recurrency policy name.
    #[error("unknown recurrency policy {0:?}")]
    UnknownRecurrencyPolicy(String),
}
