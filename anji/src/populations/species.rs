use crate::populations::PopulationConfig;
use crate::Genome;

use serde::{Deserialize, Serialize};

/// Species identifier. Specifies
/// the generation in which the species
/// was born, and the count of other species
/// generated in the _same generation_ before
/// the one identified (i.e, if it was the
/// third species born in generation 5, it
/// will be species [5, 2]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesID(pub usize, pub usize);

/// Species are collections of reproductively
/// compatible (within a certain [genetic distance])
/// genomes. Membership is determined by the genetic
/// distance to a _representative_, the genome
/// that founded the species.
///
/// Species stagnate after [`stagnation_threshold`]
/// generations without improving their best fitness,
/// and are thereafter penalized during reproduction.
///
/// [genetic distance]: PopulationConfig::distance_threshold
/// [`stagnation_threshold`]: PopulationConfig::stagnation_threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species<G> {
    id: SpeciesID,
    pub(super) genomes: Vec<G>,
    representative: G,
    stagnation: usize,
    max_fitness: f32,
}

impl<G: Genome + Clone> Species<G> {
    /// Creates a new species with the specified ID and
    /// representative. The representative is also added
    /// to the species' genome pool.
    ///
    /// # Examples
    /// ```
    /// use anji::{Species, SpeciesID};
    /// use anji_nn::genomics::{Chromosome, GeneticConfig};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let representative = Chromosome::new(&GeneticConfig::zero(), &mut StdRng::seed_from_u64(0));
    /// let species = Species::new(SpeciesID(1, 0), representative.clone());
    ///
    /// assert_eq!(species.id(), SpeciesID(1, 0));
    /// assert_eq!(species.representative(), &representative);
    /// assert_eq!(species.genomes().count(), 1);
    /// ```
    pub fn new(id: SpeciesID, representative: G) -> Species<G> {
        Species {
            id,
            genomes: vec![representative.clone()],
            representative,
            stagnation: 0,
            max_fitness: 0.0,
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the species' representative.
    pub fn representative(&self) -> &G {
        &self.representative
    }

    /// Returns the genetic distance between the species'
    /// representative and `other`.
    pub fn genetic_distance<C>(&self, other: &G, config: &C) -> f32
    where
        G: Genome<Config = C>,
    {
        G::genetic_distance(&self.representative, other, config)
    }

    /// Adds a genome to the species.
    pub fn add_genome(&mut self, genome: G) {
        self.genomes.push(genome);
    }

    /// Updates the species' record of maximum
    /// fitness, to keep track of stagnation.
    pub(super) fn update_fitness(&mut self) {
        let max_fitness = self
            .genomes
            .iter()
            .map(|g| g.fitness())
            .fold(0.0, f32::max);
        if max_fitness > self.max_fitness {
            self.max_fitness = max_fitness;
            self.stagnation = 0;
        } else {
            self.stagnation += 1;
        }
    }

    /// Returns the species' _member-count adjusted_
    /// fitness. I.e., the average of the species'
    /// genome's fitnesses.
    ///
    /// # Examples
    /// ```
    /// use anji::{Genome, Species, SpeciesID};
    /// use anji_nn::genomics::{Chromosome, GeneticConfig};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GeneticConfig::zero();
    /// let mut rng = StdRng::seed_from_u64(0);
    /// let mut species = Species::new(SpeciesID(1, 0), Chromosome::new(&config, &mut rng));
    ///
    /// let mut g1 = Chromosome::new(&config, &mut rng);
    /// let mut g2 = Chromosome::new(&config, &mut rng);
    /// g1.set_fitness(20.0);
    /// g2.set_fitness(30.0);
    /// species.add_genome(g1);
    /// species.add_genome(g2);
    ///
    /// // The species representative + `g1` and `g2`.
    /// assert_eq!(species.adjusted_fitness(), (0.0 + 20.0 + 30.0) / 3.0);
    /// ```
    pub fn adjusted_fitness(&self) -> f32 {
        if self.genomes.is_empty() {
            return 0.0;
        }
        self.genomes.iter().map(|g| g.fitness()).sum::<f32>() / self.genomes.len() as f32
    }

    /// Returns the number of generations the species
    /// has gone without improving its best fitness.
    pub fn time_stagnated(&self) -> usize {
        self.stagnation
    }

    /// Returns an iterator over the species' members.
    pub fn genomes(&self) -> impl Iterator<Item = &G> {
        self.genomes.iter()
    }

    /// Returns the currently best-performing genome,
    /// or `None` if the species has no members.
    pub fn champion(&self) -> Option<&G> {
        self.genomes
            .iter()
            .max_by(|g1, g2| g1.fitness().total_cmp(&g2.fitness()))
    }

    pub(super) fn count_elite(&self, config: &PopulationConfig) -> usize {
        self.genomes.len().min(config.elitism)
    }

    pub(super) fn count_survivors(&self, config: &PopulationConfig) -> usize {
        ((self.genomes.len() as f32 * config.survival_threshold).ceil() as usize)
            .clamp(1, self.genomes.len().max(1))
    }
}
