//! Full-run execution loop.
//!
//! [`Engine`] drives an [`Instance`] from initialization to termination:
//! max generations, stagnation of either age counter, or external
//! cancellation. Cancellation is only honored between generations — an
//! operator is never interrupted mid-flight, since a partially mutated
//! chromosome could violate its representation invariant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::config::EngineConfig;
use super::error::ConfigError;
use super::instance::Instance;
use super::types::{Chromosome, Fitness, Problem};

/// Result of a completed run.
///
/// Contains the best solution found, run statistics, and the stable
/// criterion vectors of the terminal population for post-hoc multicriteria
/// ranking.
#[derive(Debug, Clone)]
pub struct RunResult<C: Chromosome> {
    /// The best chromosome found during the entire run.
    pub best: C,

    /// Best fitness value (same as `best.fitness()`).
    pub best_fitness: C::Fitness,

    /// Total number of generations executed.
    pub generations: usize,

    /// Whether the run was terminated by a stagnation limit.
    pub stagnated: bool,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Best fitness after initialization and at the end of each generation.
    pub fitness_history: Vec<f64>,

    /// Criterion vectors of the terminal population, one per chromosome.
    ///
    /// Computed exactly once when the run finalizes, so consumers (e.g. a
    /// multicriteria ranking engine) see stable values.
    pub final_criteria: Vec<Vec<f64>>,
}

/// Executes the generational loop to termination.
///
/// # Usage
///
/// ```ignore
/// let problem = MyProblem::new()?;
/// let config = EngineConfig::default().with_seed(42);
/// let result = Engine::run(problem, &config)?;
/// println!("best fitness: {:?}", result.best_fitness);
/// ```
pub struct Engine;

impl Engine {
    /// Runs the optimization to termination.
    pub fn run<P: Problem>(
        problem: P,
        config: &EngineConfig,
    ) -> Result<RunResult<P::Chromosome>, ConfigError> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs the optimization with an optional cancellation token.
    ///
    /// When the flag flips to `true`, the run stops cleanly before the next
    /// generation and returns the best solution found so far.
    pub fn run_with_cancel<P: Problem>(
        problem: P,
        config: &EngineConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<RunResult<P::Chromosome>, ConfigError> {
        let instance = Instance::new(problem, config.clone())?;
        Ok(Self::run_instance(instance, cancel))
    }

    /// Drives an already-constructed instance to termination.
    ///
    /// Useful when the instance carries a custom report sink or has already
    /// been advanced manually.
    pub fn run_instance<P: Problem>(
        mut instance: Instance<P>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> RunResult<P::Chromosome> {
        let mut fitness_history =
            Vec::with_capacity(instance.config().max_generations + 1);
        fitness_history.push(instance.best_chromosome().fitness().to_f64());

        let mut cancelled = false;
        while !instance.should_stop() {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            instance.advance();
            fitness_history.push(instance.best_chromosome().fitness().to_f64());
        }

        let stagnated =
            !cancelled && instance.current_generation() < instance.config().max_generations;

        let final_criteria = instance
            .population()
            .iter()
            .map(|c| instance.problem().criteria(c))
            .collect();

        let best = instance.best_chromosome().clone();
        RunResult {
            best_fitness: best.fitness(),
            best,
            generations: instance.current_generation(),
            stagnated,
            cancelled,
            fitness_history,
            final_criteria,
        }
    }
}
