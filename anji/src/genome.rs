use rand::Rng;

/// An interface for genomes that can be evolved by a [`Population`].
///
/// Randomness is always drawn from the generator passed in,
/// so a seeded population evolves reproducibly.
///
/// [`Population`]: crate::Population
pub trait Genome {
    type Config;
    type InnovationHistory: InnovationHistory<Config = Self::Config>;

    /// Returns a randomized genome.
    fn new(config: &Self::Config, rng: &mut impl Rng) -> Self;

    /// Returns the genetic distance between two genomes.
    fn genetic_distance(first: &Self, second: &Self, config: &Self::Config) -> f32;

    /// Combines two genomes and returns a "child" genome.
    /// Both parents may be the same genome, for asexual reproduction.
    fn mate(
        parent1: &Self,
        parent2: &Self,
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut impl Rng,
    ) -> Self;

    /// Sets the genome's fitness value, which is never negative.
    fn set_fitness(&mut self, fitness: f32);

    /// Returns the genome's fitness value.
    fn fitness(&self) -> f32;
}

/// Shared record of genetic innovations across
/// successive generations of genomes.
///
/// What is recorded, and how, is left to the implementor.
pub trait InnovationHistory {
    type Config;

    fn new(config: &Self::Config) -> Self;
}
