//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using a genome evaluation function
//! as the source of selective pressure.
mod config;
mod errors;
pub mod logging;
mod offspring_factory;
mod species;
#[cfg(test)]
mod test_genome;

use crate::{Genome, InnovationHistory};
pub use config::PopulationConfig;
pub use errors::{ConfigError, EvolutionError};
use offspring_factory::OffspringFactory;
pub use species::{Species, SpeciesID};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use std::fmt;

fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

/// A population of genomes.
///
/// All randomness used during evolution comes from the
/// population's own generator, so populations created with
/// [`with_seed`](Population::with_seed) evolve reproducibly.
/// The generator is not serialized; deserialized populations
/// are reseeded from entropy.
#[derive(Serialize, Deserialize)]
pub struct Population<C, H, G> {
    species: Vec<Species<G>>,
    history: H,
    generation: usize,
    historical_species_count: usize,
    population_config: PopulationConfig,
    genetic_config: C,
    #[serde(skip, default = "entropy_rng")]
    rng: StdRng,
}

impl<C, H, G> Population<C, H, G>
where
    G: Genome<InnovationHistory = H, Config = C> + Clone,
    H: InnovationHistory<Config = C>,
{
    /// Creates a new population using the passed configurations,
    /// seeded from system entropy.
    ///
    /// The type of `genetic_config` depends on the implementation
    /// of [`Genome`], and is effectively opaque to the population.
    ///
    /// # Examples
    /// ```
    /// use anji::{Population, PopulationConfig};
    /// use anji_nn::genomics::{Chromosome, GeneticConfig};
    ///
    /// let config = PopulationConfig {
    ///     size: std::num::NonZeroUsize::new(10).unwrap(),
    ///     ..PopulationConfig::zero()
    /// };
    /// let population = Population::<_, _, Chromosome>::new(config, GeneticConfig::zero());
    ///
    /// assert_eq!(population.genomes().count(), 10);
    /// assert_eq!(population.generation(), 0);
    /// ```
    pub fn new(population_config: PopulationConfig, genetic_config: C) -> Population<C, H, G> {
        Self::with_rng(population_config, genetic_config, entropy_rng())
    }

    /// Creates a new population whose evolution is
    /// entirely determined by `seed`.
    pub fn with_seed(
        population_config: PopulationConfig,
        genetic_config: C,
        seed: u64,
    ) -> Population<C, H, G> {
        Self::with_rng(population_config, genetic_config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        population_config: PopulationConfig,
        genetic_config: C,
        mut rng: StdRng,
    ) -> Population<C, H, G> {
        let mut s0 = Species::new(SpeciesID(0, 0), G::new(&genetic_config, &mut rng));
        for _ in 1..population_config.size.get() {
            s0.add_genome(G::new(&genetic_config, &mut rng));
        }
        Population {
            species: vec![s0],
            history: H::new(&genetic_config),
            generation: 0,
            historical_species_count: 1,
            population_config,
            genetic_config,
            rng,
        }
    }

    /// Evaluates the fitness of each genome in the
    /// population using the passed evaluator.
    ///
    /// Genomes that cannot be evaluated, or whose fitness
    /// is negative or not finite, get a fitness of 0,
    /// which keeps them from reproducing. Each such case
    /// is logged as a warning.
    ///
    /// # Examples
    /// ```
    /// use anji::{Genome, Population, PopulationConfig};
    /// use anji_nn::genomics::{Chromosome, GeneticConfig, RecurrencyPolicy};
    /// use anji_nn::networks::Transcriber;
    ///
    /// let mut population = Population::<_, _, Chromosome>::with_seed(
    ///     PopulationConfig::zero(),
    ///     GeneticConfig::zero(),
    ///     0,
    /// );
    ///
    /// let transcriber = Transcriber::new(RecurrencyPolicy::Disallowed);
    /// population.evaluate_fitness(|chromosome| {
    ///     let mut activator = transcriber.activator(chromosome)?;
    ///     // Outputs closer to 0 score higher.
    ///     Ok::<_, anji_nn::networks::TranscriberError>(
    ///         1.0 / (1.0 + activator.next(&[1.0])[0].abs() as f32),
    ///     )
    /// });
    /// // An unconnected network always outputs 0.
    /// assert_eq!(population.champion().unwrap().fitness(), 1.0);
    /// ```
    pub fn evaluate_fitness<F, E>(&mut self, mut evaluator: F)
    where
        F: FnMut(&G) -> Result<f32, E>,
        E: fmt::Display,
    {
        for genome in self.species.iter_mut().flat_map(|s| &mut s.genomes) {
            let fitness = match evaluator(genome) {
                Ok(fitness) if fitness.is_finite() && fitness >= 0.0 => fitness,
                Ok(fitness) => {
                    log::warn!("invalid fitness {}, treating genome as non-viable", fitness);
                    0.0
                }
                Err(e) => {
                    log::warn!("genome could not be evaluated: {}", e);
                    0.0
                }
            };
            genome.set_fitness(fitness);
        }
    }

    /// Evolves the population by mating the best performing
    /// genomes of each species, and re-speciating genomes
    /// as appropiate.
    ///
    /// If the [adoption rate] is less than 1, offspring
    /// will have a chance of being kept in their parent's
    /// species without speciation. (See [[Nodine, T., 2010]].)
    ///
    /// # Errors
    /// Returns an error if the population has become degenerate,
    /// i.e. its total fitness is zero. The population is left
    /// unchanged, and may be [`reset`](Population::reset).
    ///
    /// [adoption rate]: PopulationConfig::adoption_rate
    /// [Nodine, T., 2010]: https://citeseerx.ist.psu.edu/viewdoc/download?doi=10.1.1.175.2884&rep=rep1&type=pdf
    pub fn evolve(&mut self) -> Result<(), EvolutionError> {
        let allotted_offspring = self.allot_offspring()?;
        log::info!(
            "generation {}: {} species, best fitness {:.4}",
            self.generation,
            self.species.len(),
            self.genomes().map(|g| g.fitness()).fold(0.0, f32::max)
        );

        self.species.iter_mut().for_each(Species::update_fitness);
        self.generate_offspring(&allotted_offspring);
        self.respeciate_all();
        self.remove_extinct_species();
        self.generation += 1;
        Ok(())
    }

    /// Allots the number of offspring for each species,
    /// based on proportional adjusted species fitness
    /// and stagnation status.
    fn allot_offspring(&self) -> Result<Vec<usize>, EvolutionError> {
        let fitnesses = self.species_fitness_with_stagnation_penalty();
        let fitness_sum: f32 = fitnesses.iter().sum();
        if fitness_sum <= 0.0 || !fitness_sum.is_finite() {
            return Err(EvolutionError::DegeneratePopulation);
        }
        let size = self.population_config.size.get() as f32;
        let shares: Vec<f32> = fitnesses.iter().map(|f| f / fitness_sum * size).collect();
        Ok(round_retain_sum(&shares))
    }

    /// Returns each species' adjusted fitness,
    /// with stagnation penalties applied.
    fn species_fitness_with_stagnation_penalty(&self) -> Vec<f32> {
        self.species
            .iter()
            .map(|s| {
                if s.time_stagnated() >= self.population_config.stagnation_threshold.get() {
                    s.adjusted_fitness() * (1.0 - self.population_config.stagnation_penalty)
                } else {
                    s.adjusted_fitness()
                }
            })
            .collect()
    }

    /// Replaces each species' members with its offspring,
    /// keeping the [species' elite] and mating the
    /// [top performers].
    ///
    /// [species' elite]: PopulationConfig::elitism
    /// [top performers]: PopulationConfig::survival_threshold
    fn generate_offspring(&mut self, allotted_offspring: &[usize]) {
        for species in &mut self.species {
            species
                .genomes
                .sort_by(|g1, g2| g2.fitness().total_cmp(&g1.fitness()));
        }

        let mut species_offspring = OffspringFactory::new(
            &self.species,
            &mut self.history,
            &self.genetic_config,
            &self.population_config,
            &mut self.rng,
        )
        .generate_offspring(allotted_offspring);

        for species in &mut self.species {
            species.genomes = species_offspring.remove(&species.id()).unwrap_or_default();
        }
    }

    /// Reassigns genomes drifted beyond the distance threshold
    /// from their species' representative, each with a chance
    /// given by the [adoption rate].
    ///
    /// [adoption rate]: PopulationConfig::adoption_rate
    fn respeciate_all(&mut self) {
        let mut new_species_count = 0;
        for genome in self.drain_incompatible_genomes_from_species() {
            if self.respeciate(
                genome,
                SpeciesID(self.historical_species_count, new_species_count),
            ) {
                new_species_count += 1;
            }
        }
        if new_species_count > 0 {
            log::debug!("{} new species emerged", new_species_count);
            self.historical_species_count += 1;
        }
    }

    /// Assigns a genome to the first species whose representative
    /// is close enough. Returns whether a new species had to be
    /// created to house the genome.
    fn respeciate(&mut self, genome: G, new_species_id: SpeciesID) -> bool {
        for species in &mut self.species {
            if species.genetic_distance(&genome, &self.genetic_config)
                < self.population_config.distance_threshold
            {
                species.add_genome(genome);
                return false;
            }
        }
        self.species.push(Species::new(new_species_id, genome));
        true
    }

    /// Removes and returns the genomes incompatible with their
    /// species that are to be adopted by another.
    fn drain_incompatible_genomes_from_species(&mut self) -> Vec<G> {
        let Population {
            species,
            population_config,
            genetic_config,
            rng,
            ..
        } = self;

        let mut incompatibles = vec![];
        for species in species.iter_mut() {
            let mut i = 0;
            while i < species.genomes.len() {
                if species.genetic_distance(&species.genomes[i], genetic_config)
                    >= population_config.distance_threshold
                    && rng.gen::<f32>() < population_config.adoption_rate
                {
                    incompatibles.push(species.genomes.swap_remove(i));
                } else {
                    i += 1;
                }
            }
        }
        incompatibles
    }

    /// Removes all extinct (memberless) species.
    fn remove_extinct_species(&mut self) {
        let before = self.species.len();
        self.species.retain(|s| !s.genomes.is_empty());
        if self.species.len() < before {
            log::debug!("{} species went extinct", before - self.species.len());
        }
        self.species.sort_unstable_by_key(|s| s.id());
    }

    /// Resets the population to a new randomized state,
    /// keeping its configuration and generator.
    /// Used primarily in case of population degeneration,
    /// i.e. when all genomes have a fitness score of 0.
    pub fn reset(&mut self) {
        let mut species =
            Species::new(SpeciesID(0, 0), G::new(&self.genetic_config, &mut self.rng));
        for _ in 1..self.population_config.size.get() {
            species.add_genome(G::new(&self.genetic_config, &mut self.rng));
        }
        self.species = vec![species];
        self.history = H::new(&self.genetic_config);
        self.generation = 0;
        self.historical_species_count = 1;
    }

    /// Returns the currently best-performing genome.
    pub fn champion(&self) -> Option<&G> {
        self.genomes()
            .max_by(|g1, g2| g1.fitness().total_cmp(&g2.fitness()))
    }

    /// Returns an iterator over all current genomes.
    pub fn genomes(&self) -> impl Iterator<Item = &G> {
        self.species.iter().flat_map(|s| &s.genomes)
    }

    /// Returns an iterator over all current species.
    pub fn species(&self) -> impl Iterator<Item = &Species<G>> {
        self.species.iter()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's innovation history.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Returns the population's configuration.
    pub fn config(&self) -> &PopulationConfig {
        &self.population_config
    }
}

/// Rounds all values to non-negative whole numbers
/// while preserving their sum, assuming it is also whole.
/// Rounding is done in the manner that minimizes
/// the average error to the original set of values.
fn round_retain_sum(values: &[f32]) -> Vec<usize> {
    let total_sum = values.iter().sum::<f32>().round() as usize;
    let mut truncated: Vec<(usize, usize, f32)> = values
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let u = f.floor();
            (i, u as usize, f - u)
        })
        .collect();
    let truncated_sum: usize = truncated.iter().map(|(_, u, _)| *u).sum();
    let remainder = total_sum.saturating_sub(truncated_sum).min(truncated.len());
    // Largest rounding errors first.
    truncated.sort_by(|a, b| b.2.total_cmp(&a.2));
    for (_, u, _) in &mut truncated[..remainder] {
        *u += 1;
    }
    truncated.sort_by_key(|(i, ..)| *i);
    truncated.into_iter().map(|(_, u, _)| u).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_genome::{Matings, Point};

    use std::num::NonZeroUsize;

    type Points = Population<f32, Matings, Point>;

    fn config() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(30).unwrap(),
            distance_threshold: 0.5,
            elitism: 1,
            survival_threshold: 0.5,
            adoption_rate: 1.0,
            sexual_reproduction_chance: 0.5,
            interspecies_mating_chance: 0.05,
            stagnation_threshold: NonZeroUsize::new(5).unwrap(),
            stagnation_penalty: 0.5,
        }
    }

    // Points closer to 3 are fitter.
    fn evaluate(population: &mut Points) {
        population.evaluate_fitness(|p| Ok::<_, String>(1.0 / (1.0 + (p.value - 3.0).abs())));
    }

    #[test]
    fn round_retain_sum() {
        let v = [5.2, 9.5, 2.8, 1.3, 2.2, 2.7, 6.3, 1.0, 1.0];
        let w = super::round_retain_sum(&v);
        assert_eq!(w.iter().sum::<usize>(), 32);
        assert_eq!(w, [5, 10, 3, 1, 2, 3, 6, 1, 1]);
    }

    #[test]
    fn invalid_fitness_becomes_zero() {
        let mut population = Points::with_seed(config(), 0.1, 0);
        let mut calls = 0;
        population.evaluate_fitness(|_| {
            calls += 1;
            match calls % 4 {
                0 => Err("unviable".to_string()),
                1 => Ok(-1.0),
                2 => Ok(f32::NAN),
                _ => Ok(2.0),
            }
        });
        assert_eq!(calls, 30);
        assert!(population.genomes().all(|g| g.fitness == 0.0 || g.fitness == 2.0));
        assert_eq!(population.genomes().filter(|g| g.fitness == 2.0).count(), 7);
    }

    #[test]
    fn degenerate_population() {
        let mut population = Points::with_seed(config(), 0.1, 0);
        population.evaluate_fitness(|_| Ok::<_, String>(0.0));
        assert_eq!(population.evolve(), Err(EvolutionError::DegeneratePopulation));
        assert_eq!(population.generation(), 0);

        population.reset();
        assert_eq!(population.genomes().count(), 30);
    }

    #[test]
    fn evolution_keeps_size_and_speciates() {
        let mut population = Points::with_seed(config(), 0.3, 5);
        for _ in 0..15 {
            evaluate(&mut population);
            population.evolve().unwrap();
            assert_eq!(population.genomes().count(), 30);
            assert!(population.species().all(|s| s.genomes().count() > 0));
        }
        assert_eq!(population.generation(), 15);
        assert!(population.history().0 > 0);

        let ids: Vec<_> = population.species().map(|s| s.id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn elitism_keeps_the_champion() {
        let config = PopulationConfig {
            distance_threshold: 100.0,
            ..config()
        };
        let mut population = Points::with_seed(config, 0.3, 11);
        evaluate(&mut population);
        let mut best = population.champion().unwrap().fitness;
        for _ in 0..20 {
            population.evolve().unwrap();
            evaluate(&mut population);
            let current = population.champion().unwrap().fitness;
            assert!(current >= best);
            best = current;
        }
        assert_eq!(population.species().count(), 1);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = || {
            let mut population = Points::with_seed(config(), 0.3, 42);
            for _ in 0..5 {
                evaluate(&mut population);
                population.evolve().unwrap();
            }
            population.genomes().cloned().collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn serde_round_trip() {
        let mut population = Points::with_seed(config(), 0.3, 3);
        evaluate(&mut population);
        population.evolve().unwrap();

        let json = serde_json::to_string(&population).unwrap();
        let restored: Points = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.generation(), 1);
        assert_eq!(
            restored.genomes().cloned().collect::<Vec<_>>(),
            population.genomes().cloned().collect::<Vec<_>>()
        );
        assert_eq!(restored.config(), population.config());
    }
}
