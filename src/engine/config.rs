//! Engine configuration.
//!
//! [`EngineConfig`] holds all parameters that control the generational loop.

use super::error::ConfigError;
use super::selection::Selection;

/// Default tolerance for floating-point fitness comparisons.
///
/// Two fitness values closer than this are treated as equal, which keeps
/// numerical noise from registering as improvement and driving infinite
/// local-search loops.
pub const DEFAULT_EPSILON: f64 = 0.0001;

/// Configuration for one engine run.
///
/// Controls population size, selection strategy, operator rates, the
/// recovery budget for failing operators, and termination conditions.
/// The population size is fixed for the lifetime of an instance.
///
/// # Builder Pattern
///
/// ```
/// use evopt::engine::{EngineConfig, Selection};
///
/// let config = EngineConfig::default()
///     .with_population_size(50)
///     .with_selection(Selection::Rank)
///     .with_mutation_rate(0.2)
///     .with_seed(42);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Number of chromosomes in the population. Invariant across the run.
    pub population_size: usize,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Selection strategy for choosing parents.
    pub selection: Selection,

    /// Fraction of the population preserved as elites (0.0–1.0).
    ///
    /// At least the global best chromosome is always carried over, so the
    /// effective elite count is never below 1.
    pub elite_ratio: f64,

    /// Probability of applying crossover to a pair of parents (0.0–1.0).
    ///
    /// When crossover is not applied, a clone of one parent is used.
    pub crossover_rate: f64,

    /// Probability of applying mutation to an offspring (0.0–1.0).
    pub mutation_rate: f64,

    /// Probability of applying local search to an offspring (0.0–1.0).
    ///
    /// Set to 0.0 to disable local optimization entirely (the default).
    pub local_search_rate: f64,

    /// Stop when the global best has not improved for this many
    /// generations. 0 disables the check.
    pub age_best_limit: usize,

    /// Stop when the best fitness *within the population* has not improved
    /// for this many generations. 0 disables the check.
    pub age_best_pop_limit: usize,

    /// How many times a failing crossover/mutation/local-search invocation
    /// is retried before the engine falls back to the unmodified parent.
    pub operator_retries: usize,

    /// Tolerance for fitness comparisons.
    ///
    /// An offspring counts as a strict improvement only when it beats the
    /// incumbent by more than `epsilon`.
    pub epsilon: f64,

    /// Random seed for reproducibility. `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            selection: Selection::default(),
            elite_ratio: 0.1,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            local_search_rate: 0.0,
            age_best_limit: 50,
            age_best_pop_limit: 0,
            operator_retries: 3,
            epsilon: DEFAULT_EPSILON,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, sel: Selection) -> Self {
        self.selection = sel;
        self
    }

    /// Sets the elite ratio.
    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the local-search rate (0.0 disables local optimization).
    pub fn with_local_search_rate(mut self, rate: f64) -> Self {
        self.local_search_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the global-best stagnation limit (0 to disable).
    pub fn with_age_best_limit(mut self, limit: usize) -> Self {
        self.age_best_limit = limit;
        self
    }

    /// Sets the in-population stagnation limit (0 to disable).
    pub fn with_age_best_pop_limit(mut self, limit: usize) -> Self {
        self.age_best_pop_limit = limit;
        self
    }

    /// Sets the retry budget for recoverable operator failures.
    pub fn with_operator_retries(mut self, retries: usize) -> Self {
        self.operator_retries = retries;
        self
    }

    /// Sets the fitness-comparison tolerance.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Effective number of elites carried into the next generation.
    ///
    /// At least 1 (the global best is always preserved) and strictly less
    /// than the population size.
    pub fn elite_count(&self) -> usize {
        if self.population_size <= 1 {
            return self.population_size;
        }
        let count = (self.population_size as f64 * self.elite_ratio) as usize;
        count.clamp(1, self.population_size - 1)
    }

    /// Validates the configuration.
    ///
    /// Returns the first violated constraint as a fatal [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::ZeroPopulation);
        }
        if self.max_generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        let elite_count = (self.population_size as f64 * self.elite_ratio) as usize;
        if elite_count >= self.population_size && self.population_size > 1 {
            return Err(ConfigError::EliteOverflow);
        }
        if self.epsilon < 0.0 {
            return Err(ConfigError::NegativeEpsilon);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.max_generations, 500);
        assert_eq!(config.selection, Selection::Tournament(3));
        assert!((config.elite_ratio - 0.1).abs() < 1e-10);
        assert!((config.crossover_rate - 0.9).abs() < 1e-10);
        assert!((config.mutation_rate - 0.1).abs() < 1e-10);
        assert_eq!(config.local_search_rate, 0.0);
        assert_eq!(config.age_best_limit, 50);
        assert_eq!(config.age_best_pop_limit, 0);
        assert_eq!(config.operator_retries, 3);
        assert!((config.epsilon - DEFAULT_EPSILON).abs() < 1e-15);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::default()
            .with_population_size(200)
            .with_max_generations(1000)
            .with_selection(Selection::Rank)
            .with_elite_ratio(0.2)
            .with_crossover_rate(0.8)
            .with_mutation_rate(0.05)
            .with_local_search_rate(0.5)
            .with_age_best_limit(100)
            .with_age_best_pop_limit(30)
            .with_operator_retries(5)
            .with_epsilon(1e-6)
            .with_seed(42);

        assert_eq!(config.population_size, 200);
        assert_eq!(config.max_generations, 1000);
        assert_eq!(config.selection, Selection::Rank);
        assert!((config.elite_ratio - 0.2).abs() < 1e-10);
        assert!((config.crossover_rate - 0.8).abs() < 1e-10);
        assert!((config.mutation_rate - 0.05).abs() < 1e-10);
        assert!((config.local_search_rate - 0.5).abs() < 1e-10);
        assert_eq!(config.age_best_limit, 100);
        assert_eq!(config.age_best_pop_limit, 30);
        assert_eq!(config.operator_retries, 5);
        assert!((config.epsilon - 1e-6).abs() < 1e-15);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_validate_ok() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_population() {
        let config = EngineConfig::default().with_population_size(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPopulation));
    }

    #[test]
    fn test_validate_zero_generations() {
        let config = EngineConfig::default().with_max_generations(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroGenerations));
    }

    #[test]
    fn test_validate_elite_too_high() {
        let config = EngineConfig::default()
            .with_population_size(10)
            .with_elite_ratio(1.0);
        assert_eq!(config.validate(), Err(ConfigError::EliteOverflow));
    }

    #[test]
    fn test_validate_negative_epsilon() {
        let config = EngineConfig::default().with_epsilon(-1.0);
        assert_eq!(config.validate(), Err(ConfigError::NegativeEpsilon));
    }

    #[test]
    fn test_clamp_rates() {
        let config = EngineConfig::default()
            .with_elite_ratio(1.5)
            .with_crossover_rate(-0.5)
            .with_mutation_rate(2.0)
            .with_local_search_rate(3.0);

        assert!((config.elite_ratio - 1.0).abs() < 1e-10);
        assert!((config.crossover_rate - 0.0).abs() < 1e-10);
        assert!((config.mutation_rate - 1.0).abs() < 1e-10);
        assert!((config.local_search_rate - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_elite_count_at_least_one() {
        let config = EngineConfig::default()
            .with_population_size(10)
            .with_elite_ratio(0.0);
        assert_eq!(config.elite_count(), 1);
    }

    #[test]
    fn test_elite_count_below_population() {
        let config = EngineConfig::default()
            .with_population_size(10)
            .with_elite_ratio(0.95);
        assert!(config.elite_count() < 10);
    }
}
