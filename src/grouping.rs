//! Grouping specialization: partition identified objects into disjoint groups.
//!
//! A chromosome is a total mapping from object to group. Every operator
//! preserves the partition invariant — each object belongs to exactly one
//! group, every group id is in range — and converts a violation into a
//! `Modify` failure instead of returning an invalid chromosome.
//!
//! The cost function over group compositions is pluggable via [`GroupCost`];
//! the crate ships [`BalanceCost`] as a reference cost that rewards equally
//! sized groups.

use rand::Rng;

use crate::engine::{Chromosome, ConfigError, OpContext, OperatorError, Problem, DEFAULT_EPSILON};

/// An object to be placed into a group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupObject {
    /// Unique identifier.
    pub id: u32,
    /// Human-readable name.
    pub name: String,
}

impl GroupObject {
    /// Creates an object.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A candidate partition: one group id per object.
///
/// The assignment vector is indexed by object position in the problem's
/// object list; the representation makes "every object in exactly one
/// group" structural, and operators additionally validate that every group
/// id is in range.
#[derive(Debug, Clone)]
pub struct GroupingChromosome {
    assignment: Vec<usize>,
    group_count: usize,
    fitness: f64,
}

impl GroupingChromosome {
    fn new(assignment: Vec<usize>, group_count: usize) -> Self {
        Self {
            assignment,
            group_count,
            fitness: f64::INFINITY,
        }
    }

    /// The group id assigned to each object, by object index.
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    /// The group the object at `object_index` belongs to.
    pub fn group_of(&self, object_index: usize) -> usize {
        self.assignment[object_index]
    }

    /// The partition as object-index sets, one per group.
    ///
    /// `groups()[g]` lists the indices of all objects assigned to group `g`;
    /// empty groups yield empty vectors.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.group_count];
        for (object, &group) in self.assignment.iter().enumerate() {
            groups[group].push(object);
        }
        groups
    }

    /// Whether the assignment is a valid total partition.
    fn is_valid(&self, object_count: usize) -> bool {
        self.assignment.len() == object_count
            && self.assignment.iter().all(|&g| g < self.group_count)
    }
}

impl Chromosome for GroupingChromosome {
    type Fitness = f64;

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }
}

/// Cost over a group composition. Lower is better.
pub trait GroupCost: Send + Sync {
    /// Scores a partition given as object-index sets per group.
    fn cost(&self, groups: &[Vec<usize>]) -> f64;
}

/// Adapter turning a closure into a [`GroupCost`].
pub struct CostFn<F>(F);

/// Wraps a closure as a [`GroupCost`].
pub fn cost_fn<F>(f: F) -> CostFn<F>
where
    F: Fn(&[Vec<usize>]) -> f64 + Send + Sync,
{
    CostFn(f)
}

impl<F> GroupCost for CostFn<F>
where
    F: Fn(&[Vec<usize>]) -> f64 + Send + Sync,
{
    fn cost(&self, groups: &[Vec<usize>]) -> f64 {
        (self.0)(groups)
    }
}

/// Reference cost rewarding equally sized groups.
///
/// Sums the squared deviation of every group size from the ideal
/// (object count / group count); minimized by a perfectly balanced
/// partition.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceCost;

impl GroupCost for BalanceCost {
    fn cost(&self, groups: &[Vec<usize>]) -> f64 {
        let total: usize = groups.iter().map(Vec::len).sum();
        let ideal = total as f64 / groups.len() as f64;
        groups
            .iter()
            .map(|g| {
                let d = g.len() as f64 - ideal;
                d * d
            })
            .sum()
    }
}

/// Grouping problem definition: objects, group count, and a cost function.
///
/// The object list is immutable reference data for the duration of a run;
/// only the chromosomes' assignments change.
pub struct GroupingProblem<C: GroupCost> {
    objects: Vec<GroupObject>,
    group_count: usize,
    cost: C,
    epsilon: f64,
}

impl<C: GroupCost> GroupingProblem<C> {
    /// Creates a grouping problem.
    ///
    /// Fails fast with a [`ConfigError`] for an empty object set, duplicate
    /// object ids, or a zero group count.
    pub fn new(
        objects: Vec<GroupObject>,
        group_count: usize,
        cost: C,
    ) -> Result<Self, ConfigError> {
        if objects.is_empty() {
            return Err(ConfigError::EmptyObjects);
        }
        if group_count == 0 {
            return Err(ConfigError::ZeroGroups);
        }
        let mut seen = std::collections::HashSet::new();
        for object in &objects {
            if !seen.insert(object.id) {
                return Err(ConfigError::DuplicateObjectId(object.id));
            }
        }
        Ok(Self {
            objects,
            group_count,
            cost,
            epsilon: DEFAULT_EPSILON,
        })
    }

    /// Sets the improvement tolerance used by local search.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// The objects being partitioned.
    pub fn objects(&self) -> &[GroupObject] {
        &self.objects
    }

    /// Number of groups in every partition.
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    fn cost_of(&self, chromosome: &GroupingChromosome) -> f64 {
        self.cost.cost(&chromosome.groups())
    }
}

impl<C: GroupCost> Problem for GroupingProblem<C> {
    type Chromosome = GroupingChromosome;

    fn create_chromosome<R: Rng>(&self, rng: &mut R) -> GroupingChromosome {
        let assignment = (0..self.objects.len())
            .map(|_| rng.random_range(0..self.group_count))
            .collect();
        GroupingChromosome::new(assignment, self.group_count)
    }

    fn evaluate(&self, chromosome: &GroupingChromosome) -> f64 {
        self.cost_of(chromosome)
    }

    /// Uniform crossover on the assignment vector.
    fn crossover<R: Rng>(
        &self,
        parent1: &GroupingChromosome,
        parent2: &GroupingChromosome,
        ctx: OpContext,
        rng: &mut R,
    ) -> Result<Vec<GroupingChromosome>, OperatorError> {
        if !parent1.is_valid(self.objects.len()) || !parent2.is_valid(self.objects.len()) {
            return Err(ctx.modify_error());
        }

        let n = self.objects.len();
        let mut a1 = Vec::with_capacity(n);
        let mut a2 = Vec::with_capacity(n);
        for i in 0..n {
            if rng.random_bool(0.5) {
                a1.push(parent1.assignment[i]);
                a2.push(parent2.assignment[i]);
            } else {
                a1.push(parent2.assignment[i]);
                a2.push(parent1.assignment[i]);
            }
        }

        let children = vec![
            GroupingChromosome::new(a1, self.group_count),
            GroupingChromosome::new(a2, self.group_count),
        ];
        if children.iter().any(|c| !c.is_valid(n)) {
            return Err(ctx.modify_error());
        }
        Ok(children)
    }

    /// Reassigns one random object to a different random group.
    fn mutate<R: Rng>(
        &self,
        chromosome: &mut GroupingChromosome,
        ctx: OpContext,
        rng: &mut R,
    ) -> Result<(), OperatorError> {
        if !chromosome.is_valid(self.objects.len()) {
            return Err(ctx.modify_error());
        }
        if self.group_count < 2 {
            return Ok(());
        }
        let object = rng.random_range(0..self.objects.len());
        let current = chromosome.assignment[object];
        let mut group = rng.random_range(0..self.group_count - 1);
        if group >= current {
            group += 1;
        }
        chromosome.assignment[object] = group;
        Ok(())
    }

    /// Greedy relocation: one pass over all objects, moving each to the
    /// group that lowers the cost the most (beyond the tolerance).
    fn local_search<R: Rng>(
        &self,
        chromosome: &mut GroupingChromosome,
        ctx: OpContext,
        _rng: &mut R,
    ) -> Result<bool, OperatorError> {
        if !chromosome.is_valid(self.objects.len()) {
            return Err(ctx.local_optimisation_error());
        }

        let mut improved = false;
        let mut current_cost = self.cost_of(chromosome);

        for object in 0..self.objects.len() {
            let original = chromosome.assignment[object];
            let mut best_group = original;
            let mut best_cost = current_cost;

            for group in 0..self.group_count {
                if group == original {
                    continue;
                }
                chromosome.assignment[object] = group;
                let cost = self.cost_of(chromosome);
                if cost < best_cost - self.epsilon {
                    best_cost = cost;
                    best_group = group;
                }
            }

            chromosome.assignment[object] = best_group;
            if best_group != original {
                current_cost = best_cost;
                improved = true;
            }
        }

        Ok(improved)
    }
}
