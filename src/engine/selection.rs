//! Selection strategies.
//!
//! Selection determines which chromosomes are chosen as parents for
//! crossover. Different strategies provide different selection pressure.
//! All strategies are deterministic for a fixed RNG sequence; ties resolve
//! to the earliest candidate so a seeded run is fully reproducible.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Baker (1985), "Adaptive Selection Methods for Genetic Algorithms"

use rand::Rng;

use super::types::{Chromosome, Fitness};

/// Selection strategy for choosing parents.
///
/// All strategies assume **minimization** (lower fitness = better).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    /// Tournament selection: pick `k` chromosomes at random, select the best.
    ///
    /// Higher `k` = stronger selection pressure.
    /// - k=2: light pressure (good for diversity)
    /// - k=3-5: moderate pressure (typical default)
    /// - k>5: strong pressure (risk of premature convergence)
    Tournament(usize),

    /// Fitness-proportionate (roulette wheel) selection.
    ///
    /// Probability of selection is proportional to fitness quality. Since
    /// the engine minimizes, an inverse fitness transformation is applied.
    Roulette,

    /// Rank-based selection using linear ranking.
    ///
    /// Chromosomes are sorted by fitness and selection probability is
    /// proportional to rank position, not raw fitness value. This avoids
    /// the scaling problems of roulette wheel selection.
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

impl Selection {
    /// Select a parent index from the population.
    ///
    /// # Panics
    /// Panics if `population` is empty.
    pub fn select<C: Chromosome, R: Rng>(&self, population: &[C], rng: &mut R) -> usize {
        assert!(!population.is_empty(), "cannot select from empty population");

        match self {
            Selection::Tournament(k) => tournament(population, *k, rng),
            Selection::Roulette => roulette(population, rng),
            Selection::Rank => rank(population, rng),
        }
    }
}

/// Tournament selection: pick k random chromosomes, return the best.
///
/// Strict comparison keeps the earliest-sampled candidate on ties.
fn tournament<C: Chromosome, R: Rng>(population: &[C], k: usize, rng: &mut R) -> usize {
    let k = k.max(1);
    let n = population.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if population[idx].fitness() < population[best_idx].fitness() {
            best_idx = idx;
        }
    }
    best_idx
}

/// Roulette wheel selection using inverse fitness transformation.
///
/// For minimization: `weight_i = max_fitness - fitness_i + epsilon`, so the
/// best (lowest fitness) chromosome gets the highest weight.
fn roulette<C: Chromosome, R: Rng>(population: &[C], rng: &mut R) -> usize {
    let n = population.len();
    if n == 1 {
        return 0;
    }

    let fitnesses: Vec<f64> = population.iter().map(|c| c.fitness().to_f64()).collect();

    let max_fitness = fitnesses.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let epsilon = 1e-10;

    let weights: Vec<f64> = fitnesses
        .iter()
        .map(|&f| {
            let w = max_fitness - f + epsilon;
            if w > 0.0 {
                w
            } else {
                epsilon
            }
        })
        .collect();

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }

    n - 1 // floating-point fallback
}

/// Rank-based selection using linear ranking.
///
/// Chromosomes are sorted by fitness (best first, stable so insertion order
/// breaks ties), then selection probability is proportional to rank.
fn rank<C: Chromosome, R: Rng>(population: &[C], rng: &mut R) -> usize {
    let n = population.len();
    if n == 1 {
        return 0;
    }

    let mut indexed: Vec<(usize, f64)> = population
        .iter()
        .enumerate()
        .map(|(i, c)| (i, c.fitness().to_f64()))
        .collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    // Linear ranking: rank 0 (best) gets weight n, the worst gets weight 1.
    let total: f64 = (n * (n + 1)) as f64 / 2.0;
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;

    for (rank, &(original_idx, _)) in indexed.iter().enumerate() {
        let weight = (n - rank) as f64;
        cumulative += weight;
        if cumulative > threshold {
            return original_idx;
        }
    }

    indexed.last().expect("population has n >= 2 elements").0 // fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::random::create_rng;

    #[derive(Clone)]
    struct TestChrom {
        fit: f64,
    }

    impl Chromosome for TestChrom {
        type Fitness = f64;
        fn fitness(&self) -> f64 {
            self.fit
        }
        fn set_fitness(&mut self, f: f64) {
            self.fit = f;
        }
    }

    fn make_population(fitnesses: &[f64]) -> Vec<TestChrom> {
        fitnesses.iter().map(|&f| TestChrom { fit: f }).collect()
    }

    #[test]
    fn test_tournament_favors_best() {
        let pop = make_population(&[10.0, 5.0, 1.0, 8.0]);
        let mut rng = create_rng(42);

        let mut counts = [0u32; 4];
        let n = 10000;
        for _ in 0..n {
            let idx = Selection::Tournament(4).select(&pop, &mut rng);
            counts[idx] += 1;
        }
        // Index 2 (fitness=1.0) should dominate.
        let best_count = counts[2];
        assert!(
            best_count > 6000,
            "expected best to be selected >60% of the time, got {best_count}/{n}"
        );
    }

    #[test]
    fn test_tournament_size_1_is_random() {
        let pop = make_population(&[10.0, 5.0, 1.0, 8.0]);
        let mut rng = create_rng(42);

        let mut counts = [0u32; 4];
        for _ in 0..10000 {
            let idx = Selection::Tournament(1).select(&pop, &mut rng);
            counts[idx] += 1;
        }
        for &c in &counts {
            assert!(c > 1500, "expected uniform, got counts: {counts:?}");
        }
    }

    #[test]
    fn test_roulette_favors_best() {
        let pop = make_population(&[100.0, 50.0, 1.0, 80.0]);
        let mut rng = create_rng(42);

        let mut counts = [0u32; 4];
        for _ in 0..10000 {
            let idx = Selection::Roulette.select(&pop, &mut rng);
            counts[idx] += 1;
        }
        let best_count = counts[2];
        let worst_count = counts[0];
        assert!(
            best_count > worst_count,
            "best should be selected more often: best={best_count}, worst={worst_count}"
        );
    }

    #[test]
    fn test_rank_favors_best() {
        let pop = make_population(&[100.0, 50.0, 1.0, 80.0]);
        let mut rng = create_rng(42);

        let mut counts = [0u32; 4];
        for _ in 0..10000 {
            let idx = Selection::Rank.select(&pop, &mut rng);
            counts[idx] += 1;
        }
        let best_count = counts[2];
        let worst_count = counts[0];
        assert!(
            best_count > worst_count,
            "best should be selected more: best={best_count}, worst={worst_count}"
        );
    }

    #[test]
    fn test_single_chromosome() {
        let pop = make_population(&[5.0]);
        let mut rng = create_rng(42);

        assert_eq!(Selection::Tournament(3).select(&pop, &mut rng), 0);
        assert_eq!(Selection::Roulette.select(&pop, &mut rng), 0);
        assert_eq!(Selection::Rank.select(&pop, &mut rng), 0);
    }

    #[test]
    fn test_equal_fitness() {
        let pop = make_population(&[5.0, 5.0, 5.0, 5.0]);
        let mut rng = create_rng(42);

        let mut counts = [0u32; 4];
        for _ in 0..10000 {
            let idx = Selection::Tournament(2).select(&pop, &mut rng);
            counts[idx] += 1;
        }
        for &c in &counts {
            assert!(
                c > 1500,
                "expected roughly uniform with equal fitness, got {counts:?}"
            );
        }
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let pop = make_population(&[3.0, 1.0, 2.0, 5.0, 4.0]);
        for sel in [Selection::Tournament(3), Selection::Roulette, Selection::Rank] {
            let mut a = create_rng(7);
            let mut b = create_rng(7);
            for _ in 0..200 {
                assert_eq!(sel.select(&pop, &mut a), sel.select(&pop, &mut b));
            }
        }
    }

    #[test]
    #[should_panic(expected = "cannot select from empty population")]
    fn test_empty_population_panics() {
        let pop: Vec<TestChrom> = vec![];
        let mut rng = create_rng(42);
        Selection::Tournament(3).select(&pop, &mut rng);
    }
}
