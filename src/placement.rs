//! Placement specialization: arrange connectors on a 2D grid.
//!
//! A chromosome assigns each connector an integer grid coordinate; no two
//! connectors may share a cell (non-overlap invariant). Fitness is the sum
//! of `weight × distance` over all connections — lower is better, and the
//! cost is invariant under uniform translation of the whole layout.
//!
//! Operators preserve the non-overlap invariant: crossover repairs
//! collisions by relocating to the nearest free cell and signals a `Modify`
//! failure when no valid layout can be produced; local search probes the
//! four unit directions ([`adapt_xy`](crate::geom::adapt_xy)) per connector
//! and accepts moves that improve the cost by more than the tolerance.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::{Chromosome, ConfigError, OpContext, OperatorError, Problem, DEFAULT_EPSILON};
use crate::geom::{Direction, Point};

/// A placeable attachment point.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Connector {
    /// Index-aligned identifier (position in the problem's connector list).
    pub id: usize,
    /// Human-readable name.
    pub name: String,
}

impl Connector {
    /// Creates a connector.
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A weighted link between two connectors, referenced by index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Connection {
    /// Index of the first endpoint.
    pub from: usize,
    /// Index of the second endpoint.
    pub to: usize,
    /// Non-negative connection weight.
    pub weight: f64,
}

impl Connection {
    /// Creates a connection.
    pub fn new(from: usize, to: usize, weight: f64) -> Self {
        Self { from, to, weight }
    }
}

/// The rectangular placement area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    pub width: i32,
    pub height: i32,
}

impl Grid {
    /// Creates a grid.
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Total number of cells.
    pub fn cells(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Whether a point lies within the grid.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }
}

/// Distance metric used by the placement fitness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceMetric {
    /// Straight-line (L2) distance.
    #[default]
    Euclidean,
    /// Axis-aligned (L1) distance.
    Manhattan,
}

impl DistanceMetric {
    /// Distance between two points under this metric.
    pub fn distance(self, a: Point, b: Point) -> f64 {
        match self {
            DistanceMetric::Euclidean => a.euclidean(b),
            DistanceMetric::Manhattan => a.manhattan(b),
        }
    }
}

/// A candidate layout: one grid position per connector.
#[derive(Debug, Clone)]
pub struct PlacementChromosome {
    positions: Vec<Point>,
    fitness: f64,
}

impl PlacementChromosome {
    fn new(positions: Vec<Point>) -> Self {
        Self {
            positions,
            fitness: f64::INFINITY,
        }
    }

    /// The position of each connector, by connector index.
    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    /// The position of the connector at `index`.
    pub fn position_of(&self, index: usize) -> Point {
        self.positions[index]
    }
}

impl Chromosome for PlacementChromosome {
    type Fitness = f64;

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }
}

/// Placement problem definition: connectors, weighted connections, grid.
///
/// Connectors, connections and the grid are immutable reference data for
/// the duration of a run; only the chromosomes' positions change.
pub struct PlacementProblem {
    connectors: Vec<Connector>,
    connections: Vec<Connection>,
    grid: Grid,
    metric: DistanceMetric,
    epsilon: f64,
}

impl PlacementProblem {
    /// Creates a placement problem.
    ///
    /// Fails fast with a [`ConfigError`] if the grid cannot hold all
    /// connectors, a connection weight is negative, or a connection
    /// references an unknown connector.
    pub fn new(
        connectors: Vec<Connector>,
        connections: Vec<Connection>,
        grid: Grid,
    ) -> Result<Self, ConfigError> {
        if grid.cells() < connectors.len() {
            return Err(ConfigError::GridTooSmall {
                cells: grid.cells(),
                connectors: connectors.len(),
            });
        }
        for (index, connection) in connections.iter().enumerate() {
            if connection.weight < 0.0 {
                return Err(ConfigError::NegativeWeight {
                    index,
                    weight: connection.weight,
                });
            }
            for endpoint in [connection.from, connection.to] {
                if endpoint >= connectors.len() {
                    return Err(ConfigError::UnknownConnector {
                        index,
                        connector: endpoint,
                    });
                }
            }
        }
        Ok(Self {
            connectors,
            connections,
            grid,
            metric: DistanceMetric::default(),
            epsilon: DEFAULT_EPSILON,
        })
    }

    /// Sets the distance metric (default: Euclidean).
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Sets the improvement tolerance used by local search.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// The placeable connectors.
    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    /// The weighted connections.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// The placement area.
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Total weighted connection length of a layout.
    ///
    /// Pure function of the positions; translating every position by the
    /// same offset leaves the cost unchanged.
    pub fn weighted_cost(&self, positions: &[Point]) -> f64 {
        self.connections
            .iter()
            .map(|c| c.weight * self.metric.distance(positions[c.from], positions[c.to]))
            .sum()
    }

    /// Whether a layout satisfies the placement invariant: one in-bounds
    /// position per connector, no two connectors on the same cell.
    pub fn is_valid(&self, chromosome: &PlacementChromosome) -> bool {
        if chromosome.positions.len() != self.connectors.len() {
            return false;
        }
        if !chromosome.positions.iter().all(|&p| self.grid.contains(p)) {
            return false;
        }
        let distinct: HashSet<Point> = chromosome.positions.iter().copied().collect();
        distinct.len() == chromosome.positions.len()
    }

    /// The free cell closest to `target` (deterministic scan-order
    /// tie-break), or `None` when the grid is fully occupied.
    fn nearest_free(&self, occupied: &HashSet<Point>, target: Point) -> Option<Point> {
        let mut best: Option<(f64, Point)> = None;
        for x in 0..self.grid.width {
            for y in 0..self.grid.height {
                let candidate = Point::new(x, y);
                if occupied.contains(&candidate) {
                    continue;
                }
                let distance = target.manhattan(candidate);
                if best.map_or(true, |(d, _)| distance < d) {
                    best = Some((distance, candidate));
                }
            }
        }
        best.map(|(_, p)| p)
    }

    /// One-point crossover child: positions from `a` up to `point`, then
    /// from `b`, relocating collisions to the nearest free cell.
    fn build_child(
        &self,
        a: &PlacementChromosome,
        b: &PlacementChromosome,
        point: usize,
        ctx: OpContext,
    ) -> Result<PlacementChromosome, OperatorError> {
        let n = self.connectors.len();
        let mut positions = Vec::with_capacity(n);
        let mut occupied = HashSet::with_capacity(n);

        for i in 0..n {
            let wanted = if i < point {
                a.positions[i]
            } else {
                b.positions[i]
            };
            let position = if self.grid.contains(wanted) && !occupied.contains(&wanted) {
                wanted
            } else {
                self.nearest_free(&occupied, wanted)
                    .ok_or_else(|| ctx.modify_error())?
            };
            occupied.insert(position);
            positions.push(position);
        }

        let child = PlacementChromosome::new(positions);
        if !self.is_valid(&child) {
            return Err(ctx.modify_error());
        }
        Ok(child)
    }
}

impl Problem for PlacementProblem {
    type Chromosome = PlacementChromosome;

    fn create_chromosome<R: Rng>(&self, rng: &mut R) -> PlacementChromosome {
        let mut cells: Vec<Point> = (0..self.grid.width)
            .flat_map(|x| (0..self.grid.height).map(move |y| Point::new(x, y)))
            .collect();
        cells.shuffle(rng);
        cells.truncate(self.connectors.len());
        PlacementChromosome::new(cells)
    }

    fn evaluate(&self, chromosome: &PlacementChromosome) -> f64 {
        self.weighted_cost(&chromosome.positions)
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &PlacementChromosome,
        parent2: &PlacementChromosome,
        ctx: OpContext,
        rng: &mut R,
    ) -> Result<Vec<PlacementChromosome>, OperatorError> {
        if !self.is_valid(parent1) || !self.is_valid(parent2) {
            return Err(ctx.modify_error());
        }
        let n = self.connectors.len();
        if n < 2 {
            return Ok(vec![parent1.clone()]);
        }

        let point = rng.random_range(1..n);
        Ok(vec![
            self.build_child(parent1, parent2, point, ctx)?,
            self.build_child(parent2, parent1, point, ctx)?,
        ])
    }

    /// Moves one random connector to a random free cell; on a full grid,
    /// swaps two connectors instead.
    fn mutate<R: Rng>(
        &self,
        chromosome: &mut PlacementChromosome,
        ctx: OpContext,
        rng: &mut R,
    ) -> Result<(), OperatorError> {
        if !self.is_valid(chromosome) {
            return Err(ctx.modify_error());
        }
        let n = self.connectors.len();
        if n == 0 {
            return Ok(());
        }

        let occupied: HashSet<Point> = chromosome.positions.iter().copied().collect();
        let free: Vec<Point> = (0..self.grid.width)
            .flat_map(|x| (0..self.grid.height).map(move |y| Point::new(x, y)))
            .filter(|p| !occupied.contains(p))
            .collect();

        if free.is_empty() {
            if n >= 2 {
                let i = rng.random_range(0..n);
                let mut j = rng.random_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                chromosome.positions.swap(i, j);
            }
            return Ok(());
        }

        let connector = rng.random_range(0..n);
        chromosome.positions[connector] = free[rng.random_range(0..free.len())];
        Ok(())
    }

    /// Hill climbing over the four unit directions per connector.
    ///
    /// Repeats passes until no move improves the cost by more than the
    /// tolerance; each accepted move lowers the cost by at least `epsilon`
    /// and the cost is bounded below by zero, so the loop terminates.
    fn local_search<R: Rng>(
        &self,
        chromosome: &mut PlacementChromosome,
        ctx: OpContext,
        _rng: &mut R,
    ) -> Result<bool, OperatorError> {
        if !self.is_valid(chromosome) {
            return Err(ctx.local_optimisation_error());
        }

        let mut occupied: HashSet<Point> = chromosome.positions.iter().copied().collect();
        let mut current = self.weighted_cost(&chromosome.positions);
        let mut improved = false;

        loop {
            let mut improved_this_pass = false;

            for connector in 0..chromosome.positions.len() {
                let from = chromosome.positions[connector];
                for direction in Direction::ALL {
                    let to = from.step(direction);
                    if !self.grid.contains(to) || occupied.contains(&to) {
                        continue;
                    }
                    chromosome.positions[connector] = to;
                    let cost = self.weighted_cost(&chromosome.positions);
                    if cost < current - self.epsilon {
                        occupied.remove(&from);
                        occupied.insert(to);
                        current = cost;
                        improved = true;
                        improved_this_pass = true;
                        break; // further gains are picked up on the next pass
                    }
                    chromosome.positions[connector] = from;
                }
            }

            if !improved_this_pass {
                return Ok(improved);
            }
        }
    }
}
