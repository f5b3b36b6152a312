use super::{PopulationConfig, Species, SpeciesID};
use crate::Genome;

use ahash::RandomState;
use rand::prelude::{IteratorRandom, Rng, SliceRandom};

use std::collections::HashMap;

pub(super) type OffspringMap<G> = HashMap<SpeciesID, Vec<G>, RandomState>;

/// Generates a population's offspring according
/// to the configuration and the allotted offspring
/// of each species.
///
/// Species members must be sorted by decreasing fitness.
pub(super) struct OffspringFactory<'a, G: Genome, R> {
    species: &'a [Species<G>],
    history: &'a mut G::InnovationHistory,
    genetic_config: &'a G::Config,
    population_config: &'a PopulationConfig,
    rng: &'a mut R,
}

impl<'a, G, R> OffspringFactory<'a, G, R>
where
    G: Genome + Clone,
    R: Rng,
{
    pub(super) fn new(
        species: &'a [Species<G>],
        history: &'a mut G::InnovationHistory,
        genetic_config: &'a G::Config,
        population_config: &'a PopulationConfig,
        rng: &'a mut R,
    ) -> OffspringFactory<'a, G, R> {
        OffspringFactory {
            species,
            history,
            genetic_config,
            population_config,
            rng,
        }
    }

    /// Generates the allotted offspring, keyed by the
    /// species each child is initially assigned to.
    pub(super) fn generate_offspring(&mut self, allotted_offspring: &[usize]) -> OffspringMap<G> {
        let mut offspring_of_species: OffspringMap<G> = self
            .species
            .iter()
            .zip(allotted_offspring)
            .map(|(s, &allotted)| (s.id(), Vec::with_capacity(allotted)))
            .collect();

        for (species_index, &allotted) in allotted_offspring.iter().enumerate() {
            let elite = self.species[species_index]
                .count_elite(self.population_config)
                .min(allotted);

            self.add_species_elite(&mut offspring_of_species, species_index, elite);
            self.add_mated_offspring(allotted - elite, &mut offspring_of_species, species_index);
        }

        offspring_of_species
    }

    /// Copies the top "elite" members of the species
    /// into the offspring.
    fn add_species_elite(
        &mut self,
        offspring: &mut OffspringMap<G>,
        species_index: usize,
        elite: usize,
    ) {
        let species = &self.species[species_index];
        offspring
            .entry(species.id())
            .or_default()
            .extend_from_slice(&species.genomes[..elite]);
    }

    /// Mates members of the species' top performers, possibly
    /// with partners from other species, and assigns each child
    /// to the species of one of its parents.
    fn add_mated_offspring(
        &mut self,
        count: usize,
        offspring: &mut OffspringMap<G>,
        species_index: usize,
    ) {
        let all_species: &'a [Species<G>] = self.species;
        let species = &all_species[species_index];
        let survivors = species.count_survivors(self.population_config);
        let eligible_parents = &species.genomes[..survivors.min(species.genomes.len())];

        for _ in 0..count {
            let parent1 = match eligible_parents.choose(self.rng) {
                Some(parent) => parent,
                None => return,
            };
            let (parent2_species, parent2) = if self.rng.gen::<f32>()
                < self.population_config.sexual_reproduction_chance
            {
                self.choose_second_parent(species)
                    .unwrap_or((species.id(), parent1))
            } else {
                (species.id(), parent1)
            };
            let child_species = if self.rng.gen::<bool>() {
                species.id()
            } else {
                parent2_species
            };
            let child = G::mate(
                parent1,
                parent2,
                self.history,
                self.genetic_config,
                self.rng,
            );
            offspring.entry(child_species).or_default().push(child);
        }
    }

    /// Chooses a partner from the current species,
    /// or with some chance from another one.
    fn choose_second_parent(&mut self, current: &'a Species<G>) -> Option<(SpeciesID, &'a G)> {
        let all_species: &'a [Species<G>] = self.species;
        let source = if all_species.len() > 1
            && self.rng.gen::<f32>() < self.population_config.interspecies_mating_chance
        {
            all_species
                .iter()
                .filter(|s| s.id() != current.id())
                .choose(self.rng)?
        } else {
            current
        };
        source.genomes.choose(self.rng).map(|g| (source.id(), g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::test_genome::{Matings, Point};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn species() -> Vec<Species<Point>> {
        let mut first = Species::new(SpeciesID(0, 0), Point::at(0.0, 4.0));
        first.add_genome(Point::at(0.5, 3.0));
        first.add_genome(Point::at(1.0, 1.0));
        let mut second = Species::new(SpeciesID(1, 0), Point::at(10.0, 2.0));
        second.add_genome(Point::at(11.0, 0.5));
        vec![first, second]
    }

    #[test]
    fn allotment_is_honored() {
        let species = species();
        let config = PopulationConfig {
            elitism: 1,
            survival_threshold: 0.5,
            sexual_reproduction_chance: 1.0,
            ..PopulationConfig::zero()
        };
        let mut history = Matings(0);
        let mut rng = StdRng::seed_from_u64(4);

        let offspring =
            OffspringFactory::new(&species, &mut history, &0.0, &config, &mut rng)
                .generate_offspring(&[5, 2]);

        assert_eq!(offspring.values().map(Vec::len).sum::<usize>(), 7);
        assert_eq!(history.0, 5);
        // Elites come first and keep their fitness.
        assert_eq!(offspring[&SpeciesID(0, 0)][0], Point::at(0.0, 4.0));
        assert_eq!(offspring[&SpeciesID(1, 0)][0], Point::at(10.0, 2.0));
    }

    #[test]
    fn asexual_offspring_copy_their_parent() {
        let species = species();
        let config = PopulationConfig {
            survival_threshold: 0.1,
            ..PopulationConfig::zero()
        };
        let mut history = Matings(0);
        let mut rng = StdRng::seed_from_u64(4);

        let offspring =
            OffspringFactory::new(&species, &mut history, &0.0, &config, &mut rng)
                .generate_offspring(&[3, 0]);

        // Only the best member survives, and noise is disabled.
        assert_eq!(offspring[&SpeciesID(0, 0)], vec![Point::at(0.0, 0.0); 3]);
        assert!(offspring[&SpeciesID(1, 0)].is_empty());
    }
}
