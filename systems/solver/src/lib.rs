#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Backtracking solver that decides whether a Laser Maze level can be won.
//!
//! The solver assigns the level's inventory units to empty cells and
//! rotations one at a time, applying each placement to a single scratch
//! [`Grid`] and retracting it on the way back out. Every partial assignment is
//! checked with the headless simulator.
//!
//! A mirror on a cell that no beam enters cannot change any beam, so the
//! search only branches on cells the current beams cross. Units that are not
//! needed to light the receivers are parked on cells no beam reaches. Every
//! assignment that lights all receivers can be reached this way, which keeps
//! the answer identical to trying every cell for every unit.

use std::{
    collections::HashSet,
    ops::{Deref, DerefMut},
};

use laser_maze_core::{
    Cell, CellCoord, ExternalEmitter, Inventory, LevelDescriptor, Mirror, MirrorKind, PlacedItem,
};
use laser_maze_system_optics::headless::trace_headless;
use laser_maze_world::Grid;

/// Number of solutions after which a default search stops.
pub const DEFAULT_SOLUTION_CAP: usize = 2;

/// Limits applied to a single search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    solution_cap: usize,
    max_evaluations: Option<u64>,
}

impl Config {
    /// Creates a configuration.
    ///
    /// A `solution_cap` of zero is treated as one. `max_evaluations` bounds
    /// the number of boards handed to the simulator; `None` leaves the search
    /// unbounded.
    #[must_use]
    pub const fn new(solution_cap: usize, max_evaluations: Option<u64>) -> Self {
        let solution_cap = if solution_cap == 0 { 1 } else { solution_cap };
        Self {
            solution_cap,
            max_evaluations,
        }
    }

    /// Number of solutions after which the search stops.
    #[must_use]
    pub const fn solution_cap(&self) -> usize {
        self.solution_cap
    }

    /// Upper bound on simulated boards, if any.
    #[must_use]
    pub const fn max_evaluations(&self) -> Option<u64> {
        self.max_evaluations
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SOLUTION_CAP, None)
    }
}

/// One inventory unit assigned to a cell and rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Placement {
    /// Cell receiving the mirror.
    pub cell: CellCoord,
    /// Kind of mirror placed.
    pub kind: MirrorKind,
    /// Rotation of the placed mirror.
    pub rotation: u8,
}

/// Assignment of every inventory unit that lights all receivers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Solution {
    placements: Vec<Placement>,
}

impl Solution {
    /// Placements in the order the search made them, followed by parked units.
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }
}

/// Outcome of a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolveReport {
    solutions: Vec<Solution>,
    evaluations: u64,
    budget_exhausted: bool,
    total_receivers: usize,
    candidate_cells: usize,
    solution_cap: usize,
}

impl SolveReport {
    /// Reports whether at least one solution was found.
    #[must_use]
    pub fn solvable(&self) -> bool {
        !self.solutions.is_empty()
    }

    /// Number of solutions found before the search stopped.
    #[must_use]
    pub fn solution_count(&self) -> usize {
        self.solutions.len()
    }

    /// Solutions in discovery order.
    #[must_use]
    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    /// Number of boards handed to the simulator.
    #[must_use]
    pub const fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Reports whether the evaluation budget cut the search short.
    #[must_use]
    pub const fn budget_exhausted(&self) -> bool {
        self.budget_exhausted
    }

    /// Reports whether the search ran to completion without hitting the
    /// solution cap or the evaluation budget.
    #[must_use]
    pub fn search_completed(&self) -> bool {
        !self.budget_exhausted && self.solutions.len() < self.solution_cap
    }

    /// Receivers that a solution must light.
    #[must_use]
    pub const fn total_receivers(&self) -> usize {
        self.total_receivers
    }

    /// Empty cells of the level before any placement.
    #[must_use]
    pub const fn candidate_cells(&self) -> usize {
        self.candidate_cells
    }
}

/// Stateless search driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct Solver {
    config: Config,
}

impl Solver {
    /// Creates a solver using the provided limits.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Limits applied by the solver.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Searches for assignments of the level's inventory that light every
    /// receiver. The level itself is never modified.
    #[must_use]
    pub fn solve(&self, level: &LevelDescriptor) -> SolveReport {
        let mut grid = Grid::from_level(level);
        let emitters = level.external_emitters();
        let mut pending = level.inventory;

        let mut search = Search {
            emitters: &emitters,
            total_receivers: grid.receivers().len(),
            config: self.config,
            assignment: Vec::with_capacity(pending.units().len()),
            visited: HashSet::new(),
            found: HashSet::new(),
            solutions: Vec::new(),
            evaluations: 0,
            budget_exhausted: false,
        };
        search.descend(&mut grid, &mut pending);

        let report = SolveReport {
            total_receivers: search.total_receivers,
            candidate_cells: grid.empty_cells().len(),
            solutions: search.solutions,
            evaluations: search.evaluations,
            budget_exhausted: search.budget_exhausted,
            solution_cap: self.config.solution_cap,
        };
        log::debug!(
            "solver: {} units over {} cells, {} evaluations, {} solutions{}",
            level.inventory.total(),
            report.candidate_cells,
            report.evaluations,
            report.solution_count(),
            if report.budget_exhausted {
                " (evaluation budget hit)"
            } else {
                ""
            }
        );
        report
    }
}

/// Solves the level with the default limits.
#[must_use]
pub fn solve(level: &LevelDescriptor) -> SolveReport {
    Solver::default().solve(level)
}

/// Embeds a solution into the level as locked, rotatable mirrors and empties
/// the inventory.
#[must_use]
pub fn plant_solution(level: &LevelDescriptor, solution: &Solution) -> LevelDescriptor {
    let mut planted = level.clone();
    planted
        .items
        .extend(solution.placements().iter().map(|placement| {
            PlacedItem::fixed_mirror(placement.cell, placement.kind, placement.rotation, false)
        }));
    planted.inventory = Inventory::default();
    planted
}

struct Search<'a> {
    emitters: &'a [ExternalEmitter],
    total_receivers: usize,
    config: Config,
    assignment: Vec<Placement>,
    visited: HashSet<Vec<Placement>>,
    found: HashSet<Vec<Placement>>,
    solutions: Vec<Solution>,
    evaluations: u64,
    budget_exhausted: bool,
}

impl Search<'_> {
    fn finished(&self) -> bool {
        self.budget_exhausted || self.solutions.len() >= self.config.solution_cap
    }

    /// Simulates the current board, records it when it wins, then tries each
    /// pending kind on each beam-crossed empty cell.
    fn descend(&mut self, grid: &mut Grid, pending: &mut Inventory) {
        if self.finished() || !self.first_visit() {
            return;
        }
        if let Some(limit) = self.config.max_evaluations {
            if self.evaluations >= limit {
                self.budget_exhausted = true;
                return;
            }
        }
        self.evaluations += 1;

        let trace = trace_headless(grid, self.emitters);
        let lit_empty: Vec<CellCoord> = trace
            .lit_cells
            .iter()
            .copied()
            .filter(|cell| grid.get(*cell) == Some(Cell::Empty))
            .collect();

        if trace.active_receivers.len() == self.total_receivers {
            self.record(grid, pending, &lit_empty);
            if self.finished() {
                return;
            }
        }

        for kind in MirrorKind::ALL {
            if !pending.take(kind) {
                continue;
            }
            for &cell in &lit_empty {
                for rotation in 0..kind.rotation_count() {
                    let mut scoped = ScopedPlacement::new(grid, cell, Mirror::new(kind, rotation));
                    self.assignment.push(Placement {
                        cell,
                        kind,
                        rotation,
                    });
                    self.descend(&mut scoped, pending);
                    let _ = self.assignment.pop();
                    if self.finished() {
                        break;
                    }
                }
                if self.finished() {
                    break;
                }
            }
            pending.add(kind);
            if self.finished() {
                return;
            }
        }
    }

    /// Marks the current assignment as explored, reporting whether it was new.
    fn first_visit(&mut self) -> bool {
        let mut key = self.assignment.clone();
        key.sort_unstable();
        self.visited.insert(key)
    }

    /// Stores the current assignment plus the pending units parked on empty
    /// cells no beam enters. Does nothing when there is not enough room or
    /// the same board was already reported.
    fn record(&mut self, grid: &Grid, pending: &Inventory, lit_empty: &[CellCoord]) {
        let units = pending.units();
        let parking: Vec<CellCoord> = grid
            .empty_cells()
            .into_iter()
            .filter(|cell| !lit_empty.contains(cell))
            .take(units.len())
            .collect();
        if parking.len() < units.len() {
            return;
        }

        let mut placements = self.assignment.clone();
        placements.extend(units.into_iter().zip(parking).map(|(kind, cell)| Placement {
            cell,
            kind,
            rotation: 0,
        }));
        let mut key = placements.clone();
        key.sort_unstable();
        if self.found.insert(key) {
            self.solutions.push(Solution { placements });
        }
    }
}

/// Mirror placed on the scratch grid for the lifetime of the guard.
///
/// Dropping the guard restores the cell to empty, so every exit from a search
/// frame retracts its placement.
struct ScopedPlacement<'a> {
    grid: &'a mut Grid,
    cell: CellCoord,
}

impl<'a> ScopedPlacement<'a> {
    fn new(grid: &'a mut Grid, cell: CellCoord, mirror: Mirror) -> Self {
        let _ = grid.set(cell, Cell::Mirror(mirror));
        Self { grid, cell }
    }
}

impl Deref for ScopedPlacement<'_> {
    type Target = Grid;

    fn deref(&self) -> &Grid {
        &*self.grid
    }
}

impl DerefMut for ScopedPlacement<'_> {
    fn deref_mut(&mut self) -> &mut Grid {
        &mut *self.grid
    }
}

impl Drop for ScopedPlacement<'_> {
    fn drop(&mut self) {
        let _ = self.grid.clear(self.cell);
    }
}
