//! Generic genetic-algorithm engine.
//!
//! A representation-agnostic generational GA built on trait-based
//! abstractions. Problems plug in by implementing [`Problem`], which
//! specifies how to create, evaluate, recombine, mutate and (optionally)
//! locally optimize chromosomes.
//!
//! # Core Traits
//!
//! - [`Chromosome`]: a candidate solution with a cached fitness value
//! - [`Fitness`]: ordering over chromosomes (lower is better)
//! - [`Problem`]: problem definition — initialization, evaluation, operators
//!
//! # Key Types
//!
//! - [`EngineConfig`]: loop parameters (population size, rates, stagnation
//!   limits, operator retry budget, tolerance, seed)
//! - [`Instance`]: owns one run's population and its age counters, and
//!   executes single generations via [`Instance::advance`]
//! - [`Engine`]: drives a full run to termination and produces [`RunResult`]
//! - [`OperatorError`]: typed per-chromosome operator failure, consumed by
//!   the engine's retry/fall-back recovery policy
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - De Jong (2006), *Evolutionary Computation: A Unified Approach*

mod config;
mod error;
mod instance;
pub mod random;
pub mod report;
mod runner;
mod selection;
mod types;

pub use config::{EngineConfig, DEFAULT_EPSILON};
pub use error::{ConfigError, FailureKind, OperatorError};
pub use instance::Instance;
pub use report::{BufferSink, NullSink, ReportSink, WriterSink};
pub use runner::{Engine, RunResult};
pub use selection::Selection;
pub use types::{Chromosome, Fitness, OpContext, Problem};
