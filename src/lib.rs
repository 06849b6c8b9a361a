//! Generational genetic-algorithm engine with two built-in specializations.
//!
//! The crate is split into a generic, representation-agnostic core and two
//! problem-specific layers built on top of it:
//!
//! - **Engine core** ([`engine`]): trait-based abstractions for candidate
//!   solutions ([`engine::Chromosome`]), fitness ordering
//!   ([`engine::Fitness`]) and problem definitions ([`engine::Problem`]),
//!   plus the generational loop itself — selection, crossover, mutation,
//!   optional local search, elitist replacement, stagnation tracking and a
//!   typed operator-failure taxonomy with an explicit recovery policy.
//! - **Grouping** ([`grouping`]): chromosomes are total partitions of a set
//!   of identified objects into disjoint groups, scored by a pluggable
//!   group-composition cost.
//! - **Placement** ([`placement`]): chromosomes are non-overlapping 2D grid
//!   arrangements of connectors linked by weighted connections, scored by
//!   total weighted connection length.
//!
//! # Conventions
//!
//! All fitness values are **minimized** — lower is better. Maximization
//! problems negate their objective. Runs are reproducible for a fixed seed;
//! the engine is single-threaded by design.
//!
//! # Failure model
//!
//! Invalid configuration is fatal and surfaces as [`engine::ConfigError`]
//! before any generation executes. Per-chromosome operator failures
//! ([`engine::OperatorError`]) are recoverable: the engine retries the
//! operator up to a configured budget and then falls back to the unmodified
//! parent, never aborting the run.

pub mod engine;
pub mod geom;
pub mod grouping;
pub mod placement;
