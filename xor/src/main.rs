use anji::logging::Stats;
use anji::{Population, PopulationConfig};
use anji_nn::genomics::{
    ActivationType, Chromosome, GeneticConfig, RecurrencyPolicy, RemovalStrategy,
};
use anji_nn::networks::{Transcriber, TranscriberError};

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use std::error::Error;
use std::num::NonZeroUsize;
use std::{env, fs};

/// Outputs this close to the expected value count as exact.
const ERROR_MARGIN: f64 = 0.3;
const MAX_FITNESS: f32 = 16.0;

/// Bias input first, then both operands.
const CASES: [([f64; 3], f64); 4] = [
    ([1.0, 0.0, 0.0], 0.0),
    ([1.0, 0.0, 1.0], 1.0),
    ([1.0, 1.0, 0.0], 1.0),
    ([1.0, 1.0, 1.0], 0.0),
];

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Experiment {
    genetic: GeneticConfig,
    population: PopulationConfig,
    /// Generations per run before giving up.
    generations: usize,
    /// Independent runs, evolved in parallel.
    runs: usize,
    /// Run `i` is seeded with `seed + i`.
    seed: u64,
}

impl Default for Experiment {
    fn default() -> Experiment {
        Experiment {
            genetic: GeneticConfig {
                input_count: NonZeroUsize::new(3).unwrap(),
                output_count: NonZeroUsize::new(1).unwrap(),
                output_activation_type: ActivationType::Sigmoid,
                hidden_activation_types: vec![ActivationType::Sigmoid],
                initial_connectivity: 1.0,
                weight_min: -5.0,
                weight_max: 5.0,
                weight_mutation_rate: 0.8,
                weight_mutation_std_dev: 1.0,
                add_connection_mutation_rate: 0.05,
                add_neuron_mutation_rate: 0.03,
                remove_connection_mutation_rate: 0.01,
                remove_connection_max_weight: 0.5,
                remove_connection_strategy: RemovalStrategy::Small,
                max_connections_removed: 1,
                prune_mutation_rate: 1.0,
                max_add_connection_attempts: 20,
                recurrency_policy: RecurrencyPolicy::Disallowed,
                child_mutation_chance: 0.65,
                mate_by_averaging_chance: 0.4,
                excess_gene_factor: 1.0,
                disjoint_gene_factor: 1.0,
                common_weight_factor: 0.4,
                ..GeneticConfig::zero()
            },
            population: PopulationConfig {
                size: NonZeroUsize::new(150).unwrap(),
                distance_threshold: 3.0,
                elitism: 1,
                survival_threshold: 0.2,
                adoption_rate: 1.0,
                sexual_reproduction_chance: 0.6,
                interspecies_mating_chance: 0.001,
                stagnation_threshold: NonZeroUsize::new(15).unwrap(),
                stagnation_penalty: 1.0,
            },
            generations: 100,
            runs: 20,
            seed: 0,
        }
    }
}

impl Experiment {
    fn load(path: &str) -> Result<Experiment, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        Ok(ron::from_str(&text)?)
    }
}

/// Outcome of a single run.
struct Run {
    solved_at: Option<usize>,
    champion: Option<Chromosome>,
}

fn evaluate_xor(transcriber: &Transcriber, chromosome: &Chromosome) -> Result<f32, TranscriberError> {
    let mut activator = transcriber.activator(chromosome)?;

    let mut error = 0.0;
    for (inputs, expected) in CASES.iter() {
        activator.reset();
        let e = (activator.next(inputs)[0] - expected).abs();
        if e >= ERROR_MARGIN {
            error += e;
        }
    }

    Ok(((4.0 - error) as f32).powi(2))
}

fn run(experiment: &Experiment, seed: u64) -> Run {
    let transcriber = Transcriber::from_config(&experiment.genetic);
    let mut population = Population::<_, _, Chromosome>::with_seed(
        experiment.population.clone(),
        experiment.genetic.clone(),
        seed,
    );

    for _ in 0..experiment.generations {
        population.evaluate_fitness(|c| evaluate_xor(&transcriber, c));
        if let Some(champion) = population.champion() {
            if (champion.fitness() - MAX_FITNESS).abs() < f32::EPSILON {
                info!("run {} solved at generation {}", seed, population.generation());
                return Run {
                    solved_at: Some(population.generation()),
                    champion: Some(champion.clone()),
                };
            }
        }
        if let Err(e) = population.evolve() {
            warn!("run {}: {}, resetting", seed, e);
            population.reset();
        }
    }

    info!("run {} unsolved after {} generations", seed, experiment.generations);
    Run {
        solved_at: None,
        champion: None,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let experiment = match env::args().nth(1) {
        Some(path) => Experiment::load(&path)?,
        None => Experiment::default(),
    };
    experiment.genetic.validate()?;
    experiment.population.validate()?;

    let runs: Vec<Run> = (0..experiment.runs as u64)
        .into_par_iter()
        .map(|i| run(&experiment, experiment.seed + i))
        .collect();

    let solved: Vec<f32> = runs
        .iter()
        .filter_map(|r| r.solved_at.map(|g| g as f32))
        .collect();
    match Stats::from_values(solved.iter().copied()) {
        Some(stats) => println!("Successful run generation counts: {}", stats),
        None => println!("No successful runs"),
    }
    println!(
        "{}% failure rate over {} runs",
        (runs.len() - solved.len()) as f32 * 100.0 / runs.len().max(1) as f32,
        runs.len()
    );

    if let Some(champion) = runs.iter().find_map(|r| r.champion.as_ref()) {
        println!(
            "{}",
            ron::ser::to_string_pretty(champion, ron::ser::PrettyConfig::new())?
        );
    }
    Ok(())
}
