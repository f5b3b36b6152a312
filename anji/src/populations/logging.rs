//! Generational snapshots of a population, for
//! inspecting an evolutionary run after the fact.
use super::{Population, SpeciesID};

use crate::genome::{Genome, InnovationHistory};

use serde::{Deserialize, Serialize};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of a population.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Log<G> {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord<G>,
    pub species_count: usize,
    pub genome_stats: Vec<(String, Option<Stats>)>,
}

impl<G> fmt::Display for Log<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {{")?;
        writeln!(f, "\tgeneration_number: {}", self.generation_number)?;
        writeln!(f, "\tspecies_count: {}", self.species_count)?;
        for (name, stats) in &self.genome_stats {
            match stats {
                Some(stats) => writeln!(f, "\t{}: {}", name, stats)?,
                None => writeln!(f, "\t{}: -", name)?,
            }
        }
        write!(f, "}}")
    }
}

/// Basic statistics over a sequence of values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence,
    /// or `None` if the sequence is empty.
    ///
    /// # Examples
    /// ```
    /// use anji::logging::Stats;
    ///
    /// let stats = Stats::from_values([-2.0, -1.0, 0.5, 1.0, 1.5]).unwrap();
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    ///
    /// assert_eq!(Stats::from_values([0.0; 0]), None);
    /// ```
    pub fn from_values(data: impl IntoIterator<Item = f32>) -> Option<Stats> {
        let mut data: Vec<f32> = data.into_iter().collect();
        if data.is_empty() {
            return None;
        }
        data.sort_unstable_by(f32::total_cmp);

        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Some(Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f32>() / data.len() as f32,
            median,
        })
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max {:.4}, min {:.4}, mean {:.4}, median {:.4}",
            self.maximum, self.minimum, self.mean, self.median
        )
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GenerationMemberRecord<G> {
    /// Species IDs, genomes and stagnation level.
    Species(Vec<(SpeciesID, Vec<G>, usize)>),
    /// Only species IDs, species champions, and stagnation level.
    SpeciesChampions(Vec<(SpeciesID, G, usize)>),
    /// Only population champion.
    PopulationChampion(G),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger<G> {
    reporting_level: ReportingLevel,
    logs: Vec<Log<G>>,
}

impl<G: Genome + Clone> EvolutionLogger<G> {
    /// Returns a logger with the given reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger<G> {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Stores a snapshot of a population.
    ///
    /// The `genome_stat_extractor` provides a way of
    /// obtaining arbitrary statistics on the population,
    /// where each statistic is named by `stat_names`.
    ///
    /// # Examples
    /// ```
    /// use anji::{Population, PopulationConfig};
    /// use anji::logging::{EvolutionLogger, ReportingLevel};
    /// use anji_nn::genomics::{Chromosome, GeneticConfig};
    ///
    /// let mut logger = EvolutionLogger::<Chromosome>::new(ReportingLevel::NoGenomes);
    /// let population = Population::with_seed(PopulationConfig::zero(), GeneticConfig::zero(), 0);
    ///
    /// logger.log(
    ///     &population,
    ///     &|g| [g.fitness(), g.connections().count() as f32],
    ///     ["fitness", "connections"],
    /// );
    /// assert_eq!(logger.iter().count(), 1);
    /// ```
    pub fn log<C, H, GSE, const N: usize>(
        &mut self,
        population: &Population<C, H, G>,
        genome_stat_extractor: &GSE,
        stat_names: [&str; N],
    ) where
        H: InnovationHistory<Config = C>,
        G: Genome<InnovationHistory = H, Config = C>,
        GSE: Fn(&G) -> [f32; N],
    {
        let mut columns = vec![Vec::new(); N];
        for row in population.genomes().map(genome_stat_extractor) {
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        let genome_stats = stat_names
            .iter()
            .map(|name| name.to_string())
            .zip(columns.into_iter().map(Stats::from_values))
            .collect();

        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample: match self.reporting_level {
                ReportingLevel::AllGenomes => GenerationMemberRecord::Species(
                    population
                        .species()
                        .map(|s| (s.id(), s.genomes().cloned().collect(), s.time_stagnated()))
                        .collect(),
                ),
                ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                    population
                        .species()
                        .filter_map(|s| s.champion().map(|c| (s.id(), c.clone(), s.time_stagnated())))
                        .collect(),
                ),
                ReportingLevel::PopulationChampion => match population.champion() {
                    Some(champion) => GenerationMemberRecord::PopulationChampion(champion.clone()),
                    None => GenerationMemberRecord::None,
                },
                ReportingLevel::NoGenomes => GenerationMemberRecord::None,
            },
            species_count: population.species().count(),
            genome_stats,
        })
    }

    /// Iterates over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log<G>> {
        self.logs.iter()
    }

    /// Returns the most recent snapshot.
    pub fn latest(&self) -> Option<&Log<G>> {
        self.logs.last()
    }
}
