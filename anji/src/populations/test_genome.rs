//! A one-dimensional genome for exercising populations.
use crate::{Genome, InnovationHistory};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Counts matings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Matings(pub usize);

impl InnovationHistory for Matings {
    type Config = f32;

    fn new(_config: &f32) -> Matings {
        Matings(0)
    }
}

/// A point on the real line. Its configuration
/// is the amplitude of mating noise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Point {
    pub value: f32,
    pub fitness: f32,
}

impl Point {
    pub fn at(value: f32, fitness: f32) -> Point {
        Point { value, fitness }
    }
}

impl Genome for Point {
    type Config = f32;
    type InnovationHistory = Matings;

    fn new(_config: &f32, rng: &mut impl Rng) -> Point {
        Point::at(rng.gen_range(-1.0..1.0), 0.0)
    }

    fn genetic_distance(first: &Point, second: &Point, _config: &f32) -> f32 {
        (first.value - second.value).abs()
    }

    fn mate(
        parent1: &Point,
        parent2: &Point,
        history: &mut Matings,
        config: &f32,
        rng: &mut impl Rng,
    ) -> Point {
        history.0 += 1;
        let noise = config * (rng.gen::<f32>() * 2.0 - 1.0);
        Point::at((parent1.value + parent2.value) / 2.0 + noise, 0.0)
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    fn fitness(&self) -> f32 {
        self.fitness
    }
}
