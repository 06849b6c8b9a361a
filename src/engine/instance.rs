//! Population controller for one optimization run.
//!
//! [`Instance`] owns a fixed-size population together with the generation
//! counter and the two stagnation ages. [`Instance::advance`] executes a
//! single generation: selection → reproduction → mutation → optional local
//! search → elitist replacement → counter update. The runner
//! ([`Engine`](super::Engine)) loops `advance` until a termination
//! condition holds.
//!
//! # Failure recovery
//!
//! Crossover, mutation and local search may fail per chromosome
//! ([`OperatorError`](super::OperatorError)). Failures are recoverable: the
//! instance retries the operator up to the configured budget and then falls
//! back to the unmodified parent (crossover), the unmutated child
//! (mutation) or the unoptimized child (local search). A run is never
//! aborted by an operator failure.

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::Rng;

use super::config::EngineConfig;
use super::error::ConfigError;
use super::random::create_rng;
use super::report::{NullSink, ReportSink};
use super::types::{Chromosome, Fitness, OpContext, Problem};

/// Owns the population and counters of a single run.
///
/// The population size is fixed at construction and never changes for the
/// instance's lifetime.
pub struct Instance<P: Problem> {
    problem: P,
    config: EngineConfig,
    rng: StdRng,
    sink: Box<dyn ReportSink>,
    population: Vec<P::Chromosome>,
    best: P::Chromosome,
    generation: usize,
    age_best: usize,
    age_best_pop: usize,
    // Best fitness seen in the previous population, for AgeBestPop tracking.
    pop_best_fitness: f64,
}

impl<P: Problem> Instance<P> {
    /// Creates an instance with a freshly initialized, evaluated population.
    ///
    /// Fails with a [`ConfigError`] if the configuration is invalid; no
    /// generation executes in that case.
    pub fn new(problem: P, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };

        let mut population: Vec<P::Chromosome> = (0..config.population_size)
            .map(|_| problem.create_chromosome(&mut rng))
            .collect();
        for chromosome in &mut population {
            let f = problem.evaluate(chromosome);
            chromosome.set_fitness(f);
        }

        let best = find_best(&population).clone();
        let pop_best_fitness = best.fitness().to_f64();

        Ok(Self {
            problem,
            config,
            rng,
            sink: Box::new(NullSink),
            population,
            best,
            generation: 0,
            age_best: 0,
            age_best_pop: 0,
            pop_best_fitness,
        })
    }

    /// Replaces the report sink (defaults to [`NullSink`]).
    pub fn with_sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The problem this instance optimizes.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// The configuration of this run.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current population. Its length equals the configured population
    /// size for every generation.
    pub fn population(&self) -> &[P::Chromosome] {
        &self.population
    }

    /// Number of generations executed so far.
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    /// The best chromosome found across the whole run.
    pub fn best_chromosome(&self) -> &P::Chromosome {
        &self.best
    }

    /// Generations since the global best last improved.
    pub fn age_of_best(&self) -> usize {
        self.age_best
    }

    /// Generations since the best fitness within the population last
    /// improved. Resets additionally on [`restart`](Self::restart).
    pub fn age_of_best_in_population(&self) -> usize {
        self.age_best_pop
    }

    /// Whether a termination condition holds.
    ///
    /// True when the generation limit is reached or either stagnation age
    /// exceeds its configured limit (limits of 0 are disabled).
    pub fn should_stop(&self) -> bool {
        if self.generation >= self.config.max_generations {
            return true;
        }
        if self.config.age_best_limit > 0 && self.age_best >= self.config.age_best_limit {
            return true;
        }
        self.config.age_best_pop_limit > 0
            && self.age_best_pop >= self.config.age_best_pop_limit
    }

    /// Executes one generation and updates the counters.
    ///
    /// The global best chromosome is always carried into the next
    /// generation (elitist replacement), so best fitness is monotonically
    /// non-increasing across calls.
    pub fn advance(&mut self) {
        let gen = self.generation + 1;

        // Stable sort: insertion order breaks fitness ties, keeping the
        // loop deterministic for a fixed seed.
        self.population.sort_by(|a, b| {
            a.fitness()
                .partial_cmp(&b.fitness())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let elite_count = self.config.elite_count();
        let mut next_gen: Vec<P::Chromosome> = self.population[..elite_count].to_vec();

        while next_gen.len() < self.config.population_size {
            let p1 = self.config.selection.select(&self.population, &mut self.rng);
            let p2 = self.config.selection.select(&self.population, &mut self.rng);

            let ctx = OpContext::new(gen, next_gen.len());
            let children = if self.rng.random_range(0.0..1.0) < self.config.crossover_rate {
                self.recombine(p1, p2, ctx)
            } else {
                vec![self.population[p1].clone()]
            };

            for mut child in children {
                if next_gen.len() >= self.config.population_size {
                    break;
                }
                let ctx = OpContext::new(gen, next_gen.len());

                if self.rng.random_range(0.0..1.0) < self.config.mutation_rate {
                    self.mutate_recovering(&mut child, ctx);
                }
                if self.config.local_search_rate > 0.0
                    && self.rng.random_range(0.0..1.0) < self.config.local_search_rate
                {
                    self.local_search_recovering(&mut child, ctx);
                }

                let f = self.problem.evaluate(&child);
                child.set_fitness(f);
                next_gen.push(child);
            }
        }

        debug_assert_eq!(next_gen.len(), self.config.population_size);
        self.population = next_gen;
        self.generation = gen;

        // Counter update: both ages reset on strict improvement (beyond the
        // tolerance) and increment otherwise.
        let gen_best = find_best(&self.population);
        let gen_best_fitness = gen_best.fitness().to_f64();

        if gen_best_fitness < self.best.fitness().to_f64() - self.config.epsilon {
            self.best = gen_best.clone();
            self.age_best = 0;
        } else {
            self.age_best += 1;
        }

        if gen_best_fitness < self.pop_best_fitness - self.config.epsilon {
            self.age_best_pop = 0;
        } else {
            self.age_best_pop += 1;
        }
        self.pop_best_fitness = gen_best_fitness;

        let best_fitness = self.best.fitness();
        self.sink.line(&format!(
            "generation={} best={} age={}",
            self.generation,
            best_fitness.to_f64(),
            self.age_best
        ));
        debug!(
            "generation {} complete: best={} age_best={} age_best_pop={}",
            self.generation,
            best_fitness.to_f64(),
            self.age_best,
            self.age_best_pop
        );
        self.problem.on_generation(self.generation, best_fitness);
    }

    /// Reinitializes the population, keeping only the global best.
    ///
    /// Resets `age_best_pop` (the population is new) but leaves `age_best`
    /// untouched: the global best and its age are properties of the whole
    /// run, not of one population.
    pub fn restart(&mut self) {
        for slot in self.population.iter_mut().skip(1) {
            let mut fresh = self.problem.create_chromosome(&mut self.rng);
            let f = self.problem.evaluate(&fresh);
            fresh.set_fitness(f);
            *slot = fresh;
        }
        self.population[0] = self.best.clone();

        self.age_best_pop = 0;
        self.pop_best_fitness = find_best(&self.population).fitness().to_f64();
    }

    /// Crossover with retry-then-fall-back recovery.
    fn recombine(
        &mut self,
        p1: usize,
        p2: usize,
        ctx: OpContext,
    ) -> Vec<P::Chromosome> {
        for _ in 0..=self.config.operator_retries {
            match self.problem.crossover(
                &self.population[p1],
                &self.population[p2],
                ctx,
                &mut self.rng,
            ) {
                Ok(children) => return children,
                Err(err) => debug!("recovering: {err}"),
            }
        }
        warn!(
            "crossover retry budget exhausted in generation {}, keeping parent",
            ctx.generation
        );
        vec![self.population[p1].clone()]
    }

    /// Mutation with retry recovery; the child is restored to its unmutated
    /// state before every retry and after final failure.
    fn mutate_recovering(&mut self, child: &mut P::Chromosome, ctx: OpContext) {
        let pristine = child.clone();
        for _ in 0..=self.config.operator_retries {
            match self.problem.mutate(child, ctx, &mut self.rng) {
                Ok(()) => return,
                Err(err) => {
                    debug!("recovering: {err}");
                    *child = pristine.clone();
                }
            }
        }
        warn!(
            "mutation retry budget exhausted in generation {}, keeping unmutated child",
            ctx.generation
        );
    }

    /// Local search with recovery; failure keeps the unoptimized child.
    fn local_search_recovering(&mut self, child: &mut P::Chromosome, ctx: OpContext) {
        let pristine = child.clone();
        match self.problem.local_search(child, ctx, &mut self.rng) {
            Ok(_improved) => {}
            Err(err) => {
                debug!("recovering: {err}");
                *child = pristine;
            }
        }
    }
}

/// The chromosome with the best (lowest) fitness; first wins on ties.
fn find_best<C: Chromosome>(population: &[C]) -> &C {
    population
        .iter()
        .min_by(|a, b| {
            a.fitness()
                .partial_cmp(&b.fitness())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .expect("population must not be empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::OperatorError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Minimize |value|; crossover averages, mutation perturbs.
    #[derive(Clone, Debug)]
    struct Scalar {
        value: f64,
        fitness: f64,
    }

    impl Chromosome for Scalar {
        type Fitness = f64;
        fn fitness(&self) -> f64 {
            self.fitness
        }
        fn set_fitness(&mut self, f: f64) {
            self.fitness = f;
        }
    }

    struct AbsProblem;

    impl Problem for AbsProblem {
        type Chromosome = Scalar;

        fn create_chromosome<R: Rng>(&self, rng: &mut R) -> Scalar {
            Scalar {
                value: rng.random_range(-10.0..10.0),
                fitness: f64::INFINITY,
            }
        }

        fn evaluate(&self, c: &Scalar) -> f64 {
            c.value.abs()
        }

        fn crossover<R: Rng>(
            &self,
            p1: &Scalar,
            p2: &Scalar,
            _ctx: OpContext,
            _rng: &mut R,
        ) -> Result<Vec<Scalar>, OperatorError> {
            Ok(vec![Scalar {
                value: (p1.value + p2.value) / 2.0,
                fitness: f64::INFINITY,
            }])
        }

        fn mutate<R: Rng>(
            &self,
            c: &mut Scalar,
            _ctx: OpContext,
            rng: &mut R,
        ) -> Result<(), OperatorError> {
            c.value += rng.random_range(-0.5..0.5);
            Ok(())
        }
    }

    fn config() -> EngineConfig {
        EngineConfig::default()
            .with_population_size(20)
            .with_max_generations(50)
            .with_age_best_limit(0)
            .with_seed(42)
    }

    #[test]
    fn test_zero_population_is_fatal() {
        let result = Instance::new(AbsProblem, config().with_population_size(0));
        assert!(matches!(result, Err(ConfigError::ZeroPopulation)));
    }

    #[test]
    fn test_population_size_invariant() {
        let mut instance = Instance::new(AbsProblem, config()).unwrap();
        assert_eq!(instance.population().len(), 20);
        for _ in 0..10 {
            instance.advance();
            assert_eq!(instance.population().len(), 20);
        }
    }

    #[test]
    fn test_generation_counter_increments() {
        let mut instance = Instance::new(AbsProblem, config()).unwrap();
        assert_eq!(instance.current_generation(), 0);
        instance.advance();
        assert_eq!(instance.current_generation(), 1);
        instance.advance();
        assert_eq!(instance.current_generation(), 2);
    }

    #[test]
    fn test_best_is_monotone_non_increasing() {
        let mut instance = Instance::new(AbsProblem, config()).unwrap();
        let mut previous = instance.best_chromosome().fitness();
        for _ in 0..20 {
            instance.advance();
            let current = instance.best_chromosome().fitness();
            assert!(current <= previous, "elitism must preserve the best");
            previous = current;
        }
    }

    #[test]
    fn test_age_counters_reset_or_increment() {
        let mut instance = Instance::new(AbsProblem, config()).unwrap();
        for _ in 0..20 {
            let before = instance.best_chromosome().fitness();
            let age_before = instance.age_of_best();
            instance.advance();
            let after = instance.best_chromosome().fitness();
            if after < before - instance.config().epsilon {
                assert_eq!(instance.age_of_best(), 0, "improvement must reset AgeBest");
            } else {
                assert_eq!(
                    instance.age_of_best(),
                    age_before + 1,
                    "no improvement must increment AgeBest"
                );
            }
        }
    }

    #[test]
    fn test_restart_resets_pop_age_only() {
        let mut instance = Instance::new(AbsProblem, config()).unwrap();
        // Drive until some age accumulates.
        for _ in 0..15 {
            instance.advance();
        }
        let age_best = instance.age_of_best();
        instance.restart();
        assert_eq!(instance.age_of_best_in_population(), 0);
        assert_eq!(instance.age_of_best(), age_best);
        assert_eq!(instance.population().len(), 20);
        // The best survives the restart.
        let best = instance.best_chromosome().fitness();
        assert!(instance.population().iter().any(|c| c.fitness() == best));
    }

    #[test]
    fn test_should_stop_on_max_generations() {
        let mut instance =
            Instance::new(AbsProblem, config().with_max_generations(3)).unwrap();
        assert!(!instance.should_stop());
        for _ in 0..3 {
            instance.advance();
        }
        assert!(instance.should_stop());
    }

    #[test]
    fn test_should_stop_on_stagnation() {
        let mut instance = Instance::new(
            AbsProblem,
            config().with_max_generations(1000).with_age_best_limit(5),
        )
        .unwrap();
        let mut advanced = 0;
        while !instance.should_stop() {
            instance.advance();
            advanced += 1;
            assert!(advanced < 1000, "stagnation limit should trigger");
        }
        assert!(
            instance.age_of_best() >= 5 || instance.current_generation() == 1000,
            "stopped for the wrong reason"
        );
    }

    struct SharedSink(std::rc::Rc<std::cell::RefCell<Vec<String>>>);

    impl ReportSink for SharedSink {
        fn line(&mut self, text: &str) {
            self.0.borrow_mut().push(text.to_owned());
        }
    }

    #[test]
    fn test_report_lines_per_generation() {
        let lines = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut instance = Instance::new(AbsProblem, config())
            .unwrap()
            .with_sink(Box::new(SharedSink(lines.clone())));
        instance.advance();
        instance.advance();
        let lines = lines.borrow();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("generation=1 best="));
        assert!(lines[1].starts_with("generation=2 best="));
        assert!(lines[1].contains(" age="));
    }

    #[test]
    fn test_fixed_seed_reproducible() {
        let mut a = Instance::new(AbsProblem, config()).unwrap();
        let mut b = Instance::new(AbsProblem, config()).unwrap();
        for _ in 0..10 {
            a.advance();
            b.advance();
            assert_eq!(
                a.best_chromosome().fitness(),
                b.best_chromosome().fitness()
            );
        }
    }

    // ---- Operator failure recovery ----

    /// Problem whose crossover always fails and whose mutation fails the
    /// first `fail_budget` times.
    struct FlakyProblem {
        mutate_failures: AtomicUsize,
        fail_budget: usize,
    }

    impl Problem for FlakyProblem {
        type Chromosome = Scalar;

        fn create_chromosome<R: Rng>(&self, rng: &mut R) -> Scalar {
            Scalar {
                value: rng.random_range(-10.0..10.0),
                fitness: f64::INFINITY,
            }
        }

        fn evaluate(&self, c: &Scalar) -> f64 {
            c.value.abs()
        }

        fn crossover<R: Rng>(
            &self,
            _p1: &Scalar,
            _p2: &Scalar,
            ctx: OpContext,
            _rng: &mut R,
        ) -> Result<Vec<Scalar>, OperatorError> {
            Err(ctx.modify_error())
        }

        fn mutate<R: Rng>(
            &self,
            c: &mut Scalar,
            ctx: OpContext,
            _rng: &mut R,
        ) -> Result<(), OperatorError> {
            c.value += 100.0; // partial damage, must be rolled back
            if self.mutate_failures.fetch_add(1, Ordering::Relaxed) < self.fail_budget {
                Err(ctx.modify_error())
            } else {
                c.value -= 100.5;
                Ok(())
            }
        }
    }

    #[test]
    fn test_failing_crossover_falls_back_to_parent() {
        let problem = FlakyProblem {
            mutate_failures: AtomicUsize::new(0),
            fail_budget: usize::MAX,
        };
        let mut instance = Instance::new(
            problem,
            config().with_mutation_rate(0.0).with_operator_retries(2),
        )
        .unwrap();
        // Must not panic or shrink the population despite every crossover
        // and mutation failing.
        for _ in 0..5 {
            instance.advance();
            assert_eq!(instance.population().len(), 20);
        }
    }

    #[test]
    fn test_failed_mutation_restores_child() {
        let problem = FlakyProblem {
            mutate_failures: AtomicUsize::new(0),
            fail_budget: usize::MAX,
        };
        let mut instance = Instance::new(
            problem,
            config()
                .with_crossover_rate(0.0)
                .with_mutation_rate(1.0)
                .with_operator_retries(1),
        )
        .unwrap();
        instance.advance();
        // Mutation always fails with +100.0 damage; rollback must keep all
        // values in the initial range.
        assert!(instance.population().iter().all(|c| c.value.abs() <= 10.0));
    }

    #[test]
    fn test_mutation_retry_eventually_succeeds() {
        let problem = FlakyProblem {
            mutate_failures: AtomicUsize::new(0),
            fail_budget: 2,
        };
        let instance = Instance::new(
            problem,
            config()
                .with_crossover_rate(0.0)
                .with_mutation_rate(1.0)
                .with_operator_retries(5),
        )
        .unwrap();
        let mut instance = instance;
        instance.advance();
        assert!(instance.current_generation() == 1);
    }
}
