use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Connection alleles join two neuron alleles of a chromosome,
/// and become weighted network connections once transcribed.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConnectionAllele {
    id: Innovation,
    src: Innovation,
    dest: Innovation,
    weight: f64,
}

impl ConnectionAllele {
    /// Returns a new connection with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::ConnectionAllele;
    ///
    /// let connection = ConnectionAllele::new(42, 3, 9, 2.0);
    /// ```
    pub fn new(id: Innovation, src: Innovation, dest: Innovation, weight: f64) -> ConnectionAllele {
        ConnectionAllele {
            id,
            src,
            dest,
            weight,
        }
    }

    /// Returns the connection's innovation number.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::ConnectionAllele;
    ///
    /// let connection = ConnectionAllele::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(connection.innovation(), 42);
    /// ```
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns the ID of the connection's source neuron.
    pub fn src(&self) -> Innovation {
        self.src
    }

    /// Returns the ID of the connection's destination neuron.
    pub fn dest(&self) -> Innovation {
        self.dest
    }

    /// Returns the connection's endpoints as `(src, dest)`.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::ConnectionAllele;
    ///
    /// let connection = ConnectionAllele::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(connection.endpoints(), (3, 9));
    /// ```
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.src, self.dest)
    }

    /// Returns the connection's weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Returns a copy of the connection with a different weight.
    ///
    /// # Examples
    /// ```
    /// use anji_nn::genomics::ConnectionAllele;
    ///
    /// let connection = ConnectionAllele::new(42, 3, 9, 2.0).with_weight(-1.0);
    ///
    /// assert_eq!(connection.weight(), -1.0);
    /// assert_eq!(connection.innovation(), 42);
    /// ```
    pub fn with_weight(&self, weight: f64) -> ConnectionAllele {
        ConnectionAllele {
            weight,
            ..self.clone()
        }
    }

    pub(crate) fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }
}

impl fmt::Display for ConnectionAllele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{:?} -> {:?}, {:.3}]",
            self.id, self.src, self.dest, self.weight
        )
    }
}
