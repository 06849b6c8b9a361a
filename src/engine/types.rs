//! Core trait definitions for the engine.
//!
//! The three central traits — [`Fitness`], [`Chromosome`] and [`Problem`] —
//! define the contract between the generic generational loop and
//! domain-specific problem implementations.

use rand::Rng;

use super::error::OperatorError;

/// Marker trait for fitness values.
///
/// Fitness must support comparison and be cheaply copyable.
/// Lower fitness is considered better (minimization).
///
/// Built-in implementations exist for `f64` and `f32`.
/// For maximization problems, negate the fitness or use a wrapper type.
pub trait Fitness: PartialOrd + Copy + Send + Sync + std::fmt::Debug + 'static {
    /// Returns a value representing the worst possible fitness.
    ///
    /// Used for initial/uninitialized chromosomes.
    fn worst() -> Self;

    /// Converts the fitness to `f64` for tolerance comparisons, reporting
    /// and statistics.
    fn to_f64(self) -> f64;
}

impl Fitness for f64 {
    fn worst() -> Self {
        f64::INFINITY
    }

    fn to_f64(self) -> f64 {
        self
    }
}

impl Fitness for f32 {
    fn worst() -> Self {
        f32::INFINITY
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// A candidate solution in the population.
///
/// Chromosomes carry their own cached fitness value. The engine calls
/// [`Problem::evaluate`] to compute fitness, then stores it via
/// [`set_fitness`](Chromosome::set_fitness). Each chromosome is owned by
/// exactly one population slot; crossover produces new chromosomes rather
/// than mutating the parents.
pub trait Chromosome: Clone + Send + Sync {
    /// The fitness type. Must implement [`Fitness`].
    type Fitness: Fitness;

    /// Returns the current cached fitness of this chromosome.
    fn fitness(&self) -> Self::Fitness;

    /// Sets the cached fitness. Called by the engine after evaluation.
    fn set_fitness(&mut self, fitness: Self::Fitness);
}

/// Context handed to every genetic operator invocation.
///
/// Identifies the generation being built and the population slot the
/// offspring is destined for, so a failing operator can construct an
/// [`OperatorError`] at the failure site with full context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpContext {
    /// Generation currently being produced (the first `advance` builds
    /// generation 1).
    pub generation: usize,
    /// Index of the chromosome slot being filled.
    pub chromosome: usize,
}

impl OpContext {
    /// Creates a new operator context.
    pub fn new(generation: usize, chromosome: usize) -> Self {
        Self {
            generation,
            chromosome,
        }
    }

    /// A [`FailureKind::Modify`](super::FailureKind::Modify) failure in this
    /// context.
    pub fn modify_error(self) -> OperatorError {
        OperatorError::modify(self.generation, self.chromosome)
    }

    /// A [`FailureKind::LocalOptimisation`](super::FailureKind::LocalOptimisation)
    /// failure in this context.
    pub fn local_optimisation_error(self) -> OperatorError {
        OperatorError::local_optimisation(self.generation, self.chromosome)
    }
}

/// Defines an optimization problem for the engine.
///
/// This is the main trait that specializations implement to plug their
/// domain-specific logic into the generic loop. It covers:
///
/// 1. **Initialization**: how to create random chromosomes
/// 2. **Evaluation**: how to compute fitness
/// 3. **Crossover**: how to recombine two parents
/// 4. **Mutation**: how to perturb a chromosome
/// 5. **Local search** (optional): how to repair/refine a single chromosome
///
/// # Failure contract
///
/// Crossover, mutation and local search are fallible: an operator that
/// cannot produce a chromosome satisfying the representation invariant must
/// return an [`OperatorError`] instead of an invalid chromosome. The engine
/// treats these failures as recoverable and never aborts the run for them.
pub trait Problem: Send + Sync {
    /// The chromosome (solution) type for this problem.
    type Chromosome: Chromosome;

    /// Creates a random chromosome.
    ///
    /// Called during population initialization. The implementation must
    /// produce a valid (but not necessarily good) solution.
    fn create_chromosome<R: Rng>(&self, rng: &mut R) -> Self::Chromosome;

    /// Evaluates a chromosome and returns its fitness.
    ///
    /// Lower fitness values are considered better (minimization).
    fn evaluate(&self, chromosome: &Self::Chromosome)
        -> <Self::Chromosome as Chromosome>::Fitness;

    /// Produces one or two offspring by recombining two parents.
    ///
    /// Returns a `Vec` of 1 or 2 children; the engine handles sizing. If the
    /// representation-specific recombination cannot produce a valid
    /// chromosome, returns [`OpContext::modify_error`].
    ///
    /// The default implementation clones parent1 (no crossover).
    fn crossover<R: Rng>(
        &self,
        parent1: &Self::Chromosome,
        _parent2: &Self::Chromosome,
        _ctx: OpContext,
        _rng: &mut R,
    ) -> Result<Vec<Self::Chromosome>, OperatorError> {
        Ok(vec![parent1.clone()])
    }

    /// Mutates a chromosome in place.
    ///
    /// On failure the engine restores the unmutated chromosome, so the
    /// implementation does not need to roll back partial changes.
    ///
    /// The default implementation is a no-op.
    fn mutate<R: Rng>(
        &self,
        _chromosome: &mut Self::Chromosome,
        _ctx: OpContext,
        _rng: &mut R,
    ) -> Result<(), OperatorError> {
        Ok(())
    }

    /// Applies representation-specific local search/repair to a chromosome.
    ///
    /// Returns `Ok(true)` if the chromosome was changed. Failure signals
    /// [`OpContext::local_optimisation_error`]; the engine keeps the
    /// unoptimized chromosome in that case.
    ///
    /// The default implementation is a no-op.
    fn local_search<R: Rng>(
        &self,
        _chromosome: &mut Self::Chromosome,
        _ctx: OpContext,
        _rng: &mut R,
    ) -> Result<bool, OperatorError> {
        Ok(false)
    }

    /// Returns the criterion vector of a chromosome for post-hoc
    /// multicriteria ranking.
    ///
    /// The engine computes these exactly once when a run terminates, so the
    /// values handed to a ranking collaborator are stable.
    ///
    /// The default is a single criterion equal to the cached fitness.
    fn criteria(&self, chromosome: &Self::Chromosome) -> Vec<f64> {
        vec![chromosome.fitness().to_f64()]
    }

    /// Called at the end of each generation with the current best fitness.
    ///
    /// Useful for logging or adaptive parameter control. The default
    /// implementation is a no-op.
    fn on_generation(
        &self,
        _generation: usize,
        _best_fitness: <Self::Chromosome as Chromosome>::Fitness,
    ) {
    }
}
