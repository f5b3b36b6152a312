use super::{AlleleError, ConfigError};
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Slope of the steepened sigmoid.
const SIGMOID_SLOPE: f64 = 4.924273;

/// An ActivationType represents the type
/// of activation function the neuron's network
/// equivalent will use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ActivationType {
    // x
    Linear,
    // 1 / (1 + exp(-4.924273x))
    Sigmoid,
    // tanh(x)
    Tanh,
    // x clamped to [0, 1]
    ClampedLinear,
    // x clamped to [-1, 1]
    SignedClampedLinear,
    // 1 if x > 0, 0 otherwise
    Step,
    // 1 if x > 0, -1 otherwise
    SignedStep,
    // max(x, 0)
    ReLU,
    // exp(-x²)
    Gaussian,
}

impl ActivationType {
    /// Applies the activation function to `input`.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::ActivationType;
    ///
    /// assert_eq!(ActivationType::Linear.apply(-2.5), -2.5);
    /// assert_eq!(ActivationType::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(ActivationType::SignedClampedLinear.apply(3.0), 1.0);
    /// assert_eq!(ActivationType::Step.apply(0.0), 0.0);
    /// ```
    pub fn apply(self, input: f64) -> f64 {
        match self {
            Self::Linear => input,
            Self::Sigmoid => 1.0 / (1.0 + (-SIGMOID_SLOPE * input).exp()),
            Self::Tanh => input.tanh(),
            Self::ClampedLinear => input.clamp(0.0, 1.0),
            Self::SignedClampedLinear => input.clamp(-1.0, 1.0),
            Self::Step => {
                if input > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::SignedStep => {
                if input > 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::ReLU => input.max(0.0),
            Self::Gaussian => (-input.powi(2)).exp(),
        }
    }

    /// Relative computational cost of one application
    /// of the function, used to estimate network cost.
    pub fn cost(self) -> u64 {
        match self {
            Self::Linear => 1,
            Self::ClampedLinear | Self::SignedClampedLinear => 2,
            Self::Step | Self::SignedStep | Self::ReLU => 2,
            Self::Sigmoid | Self::Tanh | Self::Gaussian => 12,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
            Self::ClampedLinear => "clamped-linear",
            Self::SignedClampedLinear => "signed-clamped-linear",
            Self::Step => "step",
            Self::SignedStep => "signed-step",
            Self::ReLU => "relu",
            Self::Gaussian => "gaussian",
        }
    }
}

impl FromStr for ActivationType {
    type Err = ConfigError;

    /// Parses the names used in configuration files.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::ActivationType;
    ///
    /// assert_eq!("sigmoid".parse::<ActivationType>().unwrap(), ActivationType::Sigmoid);
    /// assert_eq!("signed-step".parse::<ActivationType>().unwrap(), ActivationType::SignedStep);
    /// assert!("softmax".parse::<ActivationType>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Linear,
            Self::Sigmoid,
            Self::Tanh,
            Self::ClampedLinear,
            Self::SignedClampedLinear,
            Self::Step,
            Self::SignedStep,
            Self::ReLU,
            Self::Gaussian,
        ]
        .into_iter()
        .find(|a| a.name().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| ConfigError::UnknownActivationType(s.to_string()))
    }
}

impl fmt::Display for ActivationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A NeuronType indicates the function of
/// the neuron's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NeuronType {
    /// Receives one external input value; never the destination of a connection.
    Input,
    /// Hidden neurons.
    Hidden,
    /// Network outputs.
    Output,
}

/// Neuron alleles are the structural elements of chromosomes
/// between which connections are created.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct NeuronAllele {
    id: Innovation,
    neuron_type: NeuronType,
    activation_type: ActivationType,
    bias: Option<f64>,
    inputs: BTreeSet<Innovation>,
    outputs: BTreeSet<Innovation>,
}

impl NeuronAllele {
    /// Generate a new, unconnected neuron with the passed parameters.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::{ActivationType, NeuronAllele, NeuronType};
    ///
    /// let neuron = NeuronAllele::new(5, NeuronType::Hidden, ActivationType::Sigmoid);
    /// assert_eq!(neuron.bias(), None);
    /// ```
    pub fn new(
        id: Innovation,
        neuron_type: NeuronType,
        activation_type: ActivationType,
    ) -> NeuronAllele {
        NeuronAllele {
            id,
            neuron_type,
            activation_type,
            bias: None,
            inputs: BTreeSet::new(),
            outputs: BTreeSet::new(),
        }
    }

    /// Adds the passed innovation number to the neuron's
    /// set of incoming connections.
    ///
    /// # Errors
    /// This function returns an error if the connection is already
    /// among the neuron's inputs.
    pub(super) fn add_input_connection(&mut self, connection: Innovation) -> Result<(), AlleleError> {
        if self.inputs.insert(connection) {
            Ok(())
        } else {
            Err(AlleleError::DuplicateInnovation(connection))
        }
    }

    /// Adds the passed innovation number to the neuron's
    /// set of outgoing connections.
    ///
    /// # Errors
    /// This function returns an error if the connection is already
    /// among the neuron's outputs.
    pub(super) fn add_output_connection(
        &mut self,
        connection: Innovation,
    ) -> Result<(), AlleleError> {
        if self.outputs.insert(connection) {
            Ok(())
        } else {
            Err(AlleleError::DuplicateInnovation(connection))
        }
    }

    pub(super) fn remove_input_connection(&mut self, connection: Innovation) -> bool {
        self.inputs.remove(&connection)
    }

    pub(super) fn remove_output_connection(&mut self, connection: Innovation) -> bool {
        self.outputs.remove(&connection)
    }

    /// Returns the neuron's innovation number.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::{ActivationType, NeuronAllele, NeuronType};
    ///
    /// let neuron = NeuronAllele::new(5, NeuronType::Hidden, ActivationType::Sigmoid);
    ///
    /// assert_eq!(neuron.innovation(), 5);
    /// ```
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns an iterator over the neuron's incoming
    /// connections, in innovation order.
    pub fn input_connections(&self) -> impl Iterator<Item = Innovation> + '_ {
        self.inputs.iter().copied()
    }

    /// Returns an iterator over the neuron's outgoing
    /// connections, in innovation order.
    pub fn output_connections(&self) -> impl Iterator<Item = Innovation> + '_ {
        self.outputs.iter().copied()
    }

    /// Returns the neuron's type.
    pub fn neuron_type(&self) -> NeuronType {
        self.neuron_type
    }

    /// Returns the neuron's activation type.
    pub fn activation_type(&self) -> ActivationType {
        self.activation_type
    }

    /// Returns the neuron's bias, if it has one.
    pub fn bias(&self) -> Option<f64> {
        self.bias
    }

    /// Sets or clears the neuron's bias.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::{ActivationType, NeuronAllele, NeuronType};
    ///
    /// let mut neuron = NeuronAllele::new(5, NeuronType::Hidden, ActivationType::Linear);
    /// neuron.set_bias(Some(-0.5));
    ///
    /// assert_eq!(neuron.bias(), Some(-0.5));
    /// ```
    pub fn set_bias(&mut self, bias: Option<f64>) {
        self.bias = bias;
    }

    /// Returns a copy of the neuron with no connection
    /// bookkeeping, for insertion into another chromosome.
    pub(crate) fn detached(&self) -> NeuronAllele {
        NeuronAllele {
            inputs: BTreeSet::new(),
            outputs: BTreeSet::new(),
            ..self.clone()
        }
    }
}

impl fmt::Display for NeuronAllele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{:?}, {}, IN: {:?}, OUT: {:?}]",
            self.id, self.neuron_type, self.activation_type, self.inputs, self.outputs,
        )?;
        if let Some(bias) = self.bias {
            write!(f, "+{:.3}", bias)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_names_round_trip() {
        for activation in [
            ActivationType::Linear,
            ActivationType::Sigmoid,
            ActivationType::Tanh,
            ActivationType::ClampedLinear,
            ActivationType::SignedClampedLinear,
            ActivationType::Step,
            ActivationType::SignedStep,
            ActivationType::ReLU,
            ActivationType::Gaussian,
        ] {
            assert_eq!(activation.to_string().parse::<ActivationType>().unwrap(), activation);
        }
        assert_eq!(" Tanh ".parse::<ActivationType>().unwrap(), ActivationType::Tanh);
    }

    #[test]
    fn sigmoid_is_steepened() {
        let x = 0.3;
        assert_eq!(
            ActivationType::Sigmoid.apply(x),
            1.0 / (1.0 + (-4.924273 * x).exp())
        );
        assert!(ActivationType::Sigmoid.apply(1.0) > 0.99);
    }

    #[test]
    fn step_functions() {
        assert_eq!(ActivationType::SignedStep.apply(0.0), -1.0);
        assert_eq!(ActivationType::SignedStep.apply(1e-9), 1.0);
        assert_eq!(ActivationType::ClampedLinear.apply(-4.0), 0.0);
        assert_eq!(ActivationType::ReLU.apply(-4.0), 0.0);
        assert_eq!(ActivationType::Gaussian.apply(0.0), 1.0);
    }

    #[test]
    fn connection_bookkeeping() {
        let mut neuron = NeuronAllele::new(5, NeuronType::Hidden, ActivationType::Sigmoid);

        neuron.add_input_connection(9).unwrap();
        assert!(neuron.add_input_connection(9).is_err());
        neuron.add_output_connection(3).unwrap();
        neuron.add_output_connection(1).unwrap();
        assert_eq!(neuron.output_connections().collect::<Vec<_>>(), vec![1, 3]);

        assert!(neuron.remove_input_connection(9));
        assert!(!neuron.remove_input_connection(9));
        assert_eq!(neuron.input_connections().count(), 0);

        let detached = neuron.detached();
        assert_eq!(detached.output_connections().count(), 0);
        assert_eq!(detached.innovation(), 5);
    }
}
