//! Failure taxonomy for the engine.
//!
//! Two disjoint categories:
//!
//! - [`ConfigError`]: fatal, raised at construction time. A run either
//!   starts with a valid configuration or not at all; no partial state
//!   persists past a configuration error.
//! - [`OperatorError`]: recoverable, scoped to one chromosome in one
//!   generation. Operators construct these at the failure site; the engine's
//!   recovery policy (retry up to a budget, then fall back to the unmodified
//!   parent) decides the reaction. An `OperatorError` never propagates past
//!   the engine boundary.

use thiserror::Error;

/// Fatal configuration and problem-setup errors.
///
/// All variants are detected before the first generation executes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The population size must be strictly positive.
    #[error("population_size must be greater than 0")]
    ZeroPopulation,

    /// At least one generation must be allowed.
    #[error("max_generations must be at least 1")]
    ZeroGenerations,

    /// The elite fraction leaves no room for offspring.
    #[error("elite_ratio too high: elites fill entire population")]
    EliteOverflow,

    /// The tolerance used for fitness comparisons must be non-negative.
    #[error("epsilon must be non-negative")]
    NegativeEpsilon,

    /// A grouping problem needs at least one object to partition.
    #[error("grouping problem has no objects")]
    EmptyObjects,

    /// Object ids must be unique within a grouping problem.
    #[error("duplicate object id {0}")]
    DuplicateObjectId(u32),

    /// A partition into zero groups is meaningless.
    #[error("group_count must be at least 1")]
    ZeroGroups,

    /// Connection weights must be non-negative.
    #[error("connection {index} has negative weight {weight}")]
    NegativeWeight { index: usize, weight: f64 },

    /// The grid cannot hold all connectors without overlap.
    #[error("grid has {cells} cells but must place {connectors} connectors")]
    GridTooSmall { cells: usize, connectors: usize },

    /// A connection references a connector the problem does not know.
    #[error("connection {index} references unknown connector {connector}")]
    UnknownConnector { index: usize, connector: usize },
}

/// The kind of a recoverable operator failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Crossover or mutation could not produce a valid chromosome.
    Modify,
    /// Local search could not repair or refine a chromosome.
    LocalOptimisation,
    /// Fallback kind carrying the same context.
    Generic,
}

/// A recoverable per-chromosome operator failure.
///
/// Pure data: carries the kind, the generation it occurred in and the index
/// of the affected chromosome. Rendering is deterministic, e.g.
/// `Modify` in generation 3 for chromosome 7 displays as
/// `"Generation 3 : Modify error for chromosome 7"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorError {
    /// What failed.
    pub kind: FailureKind,
    /// Generation in which the failure occurred.
    pub generation: usize,
    /// Index of the chromosome the operator was working on.
    pub chromosome: usize,
}

impl OperatorError {
    /// Creates a failure record of the given kind.
    pub fn new(kind: FailureKind, generation: usize, chromosome: usize) -> Self {
        Self {
            kind,
            generation,
            chromosome,
        }
    }

    /// Shorthand for a [`FailureKind::Modify`] failure.
    pub fn modify(generation: usize, chromosome: usize) -> Self {
        Self::new(FailureKind::Modify, generation, chromosome)
    }

    /// Shorthand for a [`FailureKind::LocalOptimisation`] failure.
    pub fn local_optimisation(generation: usize, chromosome: usize) -> Self {
        Self::new(FailureKind::LocalOptimisation, generation, chromosome)
    }

    /// Shorthand for a [`FailureKind::Generic`] failure.
    pub fn generic(generation: usize, chromosome: usize) -> Self {
        Self::new(FailureKind::Generic, generation, chromosome)
    }
}

impl std::fmt::Display for OperatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self.kind {
            FailureKind::Modify => "Modify error",
            FailureKind::LocalOptimisation => "Local optimization error",
            FailureKind::Generic => "Error",
        };
        write!(
            f,
            "Generation {} : {} for chromosome {}",
            self.generation, what, self.chromosome
        )
    }
}

impl std::error::Error for OperatorError {}
